//! Mission orchestration
//!
//! Owns the motors and the status LED, builds the robot once and then loops
//! over a small boot menu:
//! - Up / Down cycle the behavior
//! - Enter runs a mission with the selected behavior
//! - Escape powers everything down and parks the firmware
//!
//! The LED blinks amber while the menu waits for a button.

use defmt::{error, info, warn};
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::{Level, Output, Pull};
use embassy_rp::pwm::{self, InputMode, Pwm};
use embassy_time::{Duration, Timer};
use gripper_rover::mission::{Behavior, Mission};
use gripper_rover::system::audio::SignalSpeaker;
use gripper_rover::system::config::RobotConfig;
use gripper_rover::system::devices::{Button, Devices, LedPattern, StatusIndicator};
use gripper_rover::system::error::DeviceKind;
use gripper_rover::system::robot::Robot;
use gripper_rover::system::state::RobotState;

use crate::driver::buttons::{self, RcButtons};
use crate::driver::display::DefmtDisplay;
use crate::driver::ir_sensor::Ev3IrSensor;
use crate::driver::motor::{BridgeChannel, TachoMotor};
use crate::driver::reflectance::Reflectance;
use crate::driver::status_led::StatusLed;
use crate::system::platform::RoverPlatform;
use crate::system::resources::{MotorDriverResources, MotorEncoderResources, StatusLedResources};

/// Half period of the menu blink
const MENU_BLINK_INTERVAL: Duration = Duration::from_millis(500);

const BEHAVIORS: [Behavior; 3] = [
    Behavior::RemoteControl,
    Behavior::GarbageCollection,
    Behavior::LineFollowing,
];

#[embassy_executor::task]
pub async fn orchestrate(
    driver: MotorDriverResources,
    encoders: MotorEncoderResources,
    led: StatusLedResources,
) {
    // configure pwm for the bridges, 10kHz keeps the motors quiet
    let desired_freq_hz = 10_000;
    let clock_freq_hz = embassy_rp::clocks::clk_sys_freq();
    let divider = ((clock_freq_hz / desired_freq_hz) / 65535 + 1) as u8;
    let period = (clock_freq_hz / (desired_freq_hz * divider as u32)) as u16 - 1;

    let mut pwm_config = pwm::Config::default();
    pwm_config.divider = divider.into();
    pwm_config.top = period;

    // both boards share the standby line, low keeps every output floating
    let mut standby = Output::new(driver.standby_pin, Level::Low);

    let left_fwd = Output::new(driver.left_forward_pin, Level::Low);
    let left_bckw = Output::new(driver.left_backward_pin, Level::Low);
    let left_pwm = Pwm::new_output_a(driver.left_slice, driver.left_pwm_pin, pwm_config.clone());
    let left_bridge = BridgeChannel::new(left_fwd, left_bckw, left_pwm).unwrap();

    let right_fwd = Output::new(driver.right_forward_pin, Level::Low);
    let right_bckw = Output::new(driver.right_backward_pin, Level::Low);
    let right_pwm = Pwm::new_output_b(driver.right_slice, driver.right_pwm_pin, pwm_config.clone());
    let right_bridge = BridgeChannel::new(right_fwd, right_bckw, right_pwm).unwrap();

    let gripper_fwd = Output::new(driver.gripper_forward_pin, Level::Low);
    let gripper_bckw = Output::new(driver.gripper_backward_pin, Level::Low);
    let gripper_pwm = Pwm::new_output_a(driver.gripper_slice, driver.gripper_pwm_pin, pwm_config);
    let gripper_bridge = BridgeChannel::new(gripper_fwd, gripper_bckw, gripper_pwm).unwrap();

    // encoder slices count rising edges on their B input
    let counter_config = pwm::Config::default();
    let left_encoder = Pwm::new_input(
        encoders.left_encoder_slice,
        encoders.left_encoder_pin,
        Pull::None,
        InputMode::RisingEdge,
        counter_config.clone(),
    );
    let right_encoder = Pwm::new_input(
        encoders.right_encoder_slice,
        encoders.right_encoder_pin,
        Pull::None,
        InputMode::RisingEdge,
        counter_config.clone(),
    );
    let gripper_encoder = Pwm::new_input(
        encoders.gripper_encoder_slice,
        encoders.gripper_encoder_pin,
        Pull::None,
        InputMode::RisingEdge,
        counter_config,
    );

    let devices = Devices::<RoverPlatform> {
        left_motor: TachoMotor::new(DeviceKind::LeftMotor, left_bridge, left_encoder),
        right_motor: TachoMotor::new(DeviceKind::RightMotor, right_bridge, right_encoder),
        gripper_motor: TachoMotor::new(DeviceKind::GripperMotor, gripper_bridge, gripper_encoder),
        ir_sensor: Ev3IrSensor::new(),
        reflectance: Reflectance,
        speaker: SignalSpeaker,
        status: StatusLed::new(led),
        buttons: RcButtons,
        display: DefmtDisplay,
    };
    let mut robot = Robot::new(devices);
    let config = RobotConfig::default();
    let mut selected = 0;

    loop {
        info!("selected behavior: {}", BEHAVIORS[selected]);
        match menu_button(&mut robot).await {
            Button::Up => selected = (selected + 1) % BEHAVIORS.len(),
            Button::Down => selected = (selected + BEHAVIORS.len() - 1) % BEHAVIORS.len(),
            Button::Enter => {
                let mission = match Mission::new(BEHAVIORS[selected], config.clone()) {
                    Ok(mission) => mission,
                    Err(e) => {
                        error!("rejected configuration: {}", e);
                        continue;
                    }
                };

                buttons::clear();
                robot.state = RobotState::default();
                standby.set_high();
                if let Err(e) = mission.run(&mut robot).await {
                    error!("mission ended with error: {}", e);
                }
                standby.set_low();
            }
            Button::Escape => break,
            _ => {}
        }
    }

    info!("powering down");
    let devices = &mut robot.devices;
    if let Err(e) = devices.stop_motors() {
        warn!("failed to stop motors: {}", e);
    }
    if let Err(e) = devices.status.set_pattern(LedPattern::Off) {
        warn!("failed to turn off status LED: {}", e);
    }
    standby.set_low();
    core::future::pending::<()>().await;
}

/// Blink amber until a button is pressed
async fn menu_button(robot: &mut Robot<RoverPlatform>) -> Button {
    let mut lit = false;
    loop {
        lit = !lit;
        let pattern = if lit { LedPattern::Amber } else { LedPattern::Off };
        let _ = robot.devices.status.set_pattern(pattern);

        let pressed = select(buttons::wait(), Timer::after(MENU_BLINK_INTERVAL)).await;
        if let Either::First(button) = pressed {
            let _ = robot.devices.status.set_pattern(LedPattern::Off);
            return button;
        }
    }
}
