//! Audio Cue Module
//!
//! Hands sound cues from the control loop to a separate playback task. It
//! uses an embassy-sync Signal so requesting a cue never waits: if a cue is
//! still pending when the next one arrives, the newer one replaces it.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::system::devices::{AudioCue, Speaker};

/// Signal for pending sound cues
static AUDIO_CUE: Signal<CriticalSectionRawMutex, AudioCue> = Signal::new();

/// Requests a cue to be played
///
/// Synchronous and fire-and-forget.
pub fn request(cue: AudioCue) {
    AUDIO_CUE.signal(cue);
}

/// Waits for the next cue to play
///
/// Awaited by the playback task only.
pub async fn wait() -> AudioCue {
    AUDIO_CUE.wait().await
}

/// Takes the pending cue, if any, without waiting
#[cfg(test)]
fn try_take() -> Option<AudioCue> {
    AUDIO_CUE.try_take()
}

/// [`Speaker`] that forwards cues to the playback task
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalSpeaker;

impl Speaker for SignalSpeaker {
    fn play(&mut self, cue: AudioCue) {
        request(cue);
    }
}
