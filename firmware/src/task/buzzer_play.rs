//! Sound cue playback
//!
//! Plays the cues the controller requests on a piezo buzzer. A cue that
//! arrives while another is playing waits for it to finish; only the newest
//! waiting cue is kept.

use defmt::debug;
use embassy_rp::pwm::{self, Pwm};
use embassy_time::{Duration, Timer};
use gripper_rover::system::audio;
use gripper_rover::system::devices::AudioCue;

use crate::system::resources::BuzzerResources;

/// One note: frequency in Hz (0 is a rest) and length
type Note = (u32, u64);

/// Rising three note chime
const LINE_FOLLOWING_STARTED: &[Note] = &[(523, 120), (659, 120), (784, 200)];

/// Two short high beeps
const OBSTACLE_FOUND: &[Note] = &[(1047, 80), (0, 60), (1047, 80)];

fn melody(cue: AudioCue) -> &'static [Note] {
    match cue {
        AudioCue::LineFollowingStarted => LINE_FOLLOWING_STARTED,
        AudioCue::ObstacleFound => OBSTACLE_FOUND,
    }
}

#[embassy_executor::task]
pub async fn buzzer_play(r: BuzzerResources) {
    let mut config = pwm::Config::default();
    config.compare_a = 0;
    let mut buzzer = Pwm::new_output_a(r.pwm_slice, r.pin, config.clone());

    loop {
        let cue = audio::wait().await;
        debug!("playing {}", cue);

        for &(freq_hz, millis) in melody(cue) {
            tone(&mut buzzer, &mut config, freq_hz);
            Timer::after(Duration::from_millis(millis)).await;
        }
        tone(&mut buzzer, &mut config, 0);
    }
}

/// Square wave at `freq_hz`, silence for 0
fn tone(buzzer: &mut Pwm<'static>, config: &mut pwm::Config, freq_hz: u32) {
    if freq_hz == 0 {
        config.compare_a = 0;
    } else {
        let clock_freq_hz = embassy_rp::clocks::clk_sys_freq();
        let divider = ((clock_freq_hz / freq_hz) / 65535 + 1) as u8;
        let period = (clock_freq_hz / (freq_hz * divider as u32)) as u16 - 1;
        config.divider = divider.into();
        config.top = period;
        config.compare_a = period / 2;
    }
    buzzer.set_config(config);
}
