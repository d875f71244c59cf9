//! Brick buttons
//!
//! The button tasks signal presses; the handle hands out at most the most
//! recent one per poll.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use gripper_rover::system::devices::{Button, Buttons};
use gripper_rover::system::error::Error;

/// Last press not yet consumed
static BUTTON_PRESS: Signal<CriticalSectionRawMutex, Button> = Signal::new();

pub fn press(button: Button) {
    BUTTON_PRESS.signal(button);
}

/// Waits for the next press, used by the boot menu
pub async fn wait() -> Button {
    BUTTON_PRESS.wait().await
}

/// Drop a press left over from before a mission started
pub fn clear() {
    BUTTON_PRESS.reset();
}

#[derive(Debug, Default)]
pub struct RcButtons;

impl Buttons for RcButtons {
    fn poll(&mut self) -> Result<Option<Button>, Error> {
        Ok(BUTTON_PRESS.try_take())
    }
}
