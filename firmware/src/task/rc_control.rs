//! RC button handling
//!
//! The four receiver outputs stand in for the brick buttons:
//! A is Enter, B is Escape, C is Down and D is Up.

use embassy_rp::gpio::{Input, Level, Pull};
use embassy_time::{Duration, Timer};
use gripper_rover::system::devices::Button;

use crate::driver::buttons;
use crate::system::resources::{RCResourcesA, RCResourcesB, RCResourcesC, RCResourcesD};

/// Button debounce delay (ms)
const DEBOUNCE_DURATION: Duration = Duration::from_millis(30);

/// Button A handler
#[embassy_executor::task]
pub async fn rc_button_a_handle(r: RCResourcesA) {
    let mut btn = Input::new(r.btn_a, Pull::Down);
    handle_button(&mut btn, Button::Enter).await;
}

/// Button B handler
#[embassy_executor::task]
pub async fn rc_button_b_handle(r: RCResourcesB) {
    let mut btn = Input::new(r.btn_b, Pull::Down);
    handle_button(&mut btn, Button::Escape).await;
}

/// Button C handler
#[embassy_executor::task]
pub async fn rc_button_c_handle(r: RCResourcesC) {
    let mut btn = Input::new(r.btn_c, Pull::Down);
    handle_button(&mut btn, Button::Down).await;
}

/// Button D handler
#[embassy_executor::task]
pub async fn rc_button_d_handle(r: RCResourcesD) {
    let mut btn = Input::new(r.btn_d, Pull::Down);
    handle_button(&mut btn, Button::Up).await;
}

/// Reports a press on every debounced rising edge
async fn handle_button(button: &mut Input<'static>, id: Button) {
    loop {
        if debounce(button).await == Level::High {
            buttons::press(id);
        }
    }
}

/// Ensures stable button state
async fn debounce(button: &mut Input<'static>) -> Level {
    loop {
        let st_level = button.get_level();
        button.wait_for_any_edge().await;
        Timer::after(DEBOUNCE_DURATION).await;
        let end_level = button.get_level();
        if st_level != end_level {
            break end_level;
        }
    }
}
