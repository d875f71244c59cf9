//! Gripper rover firmware entry point
//!
//! Initializes the system, spawns the device tasks and hands the motors to
//! the orchestrator.

#![no_std]
#![no_main]

use crate::task::{
    buzzer_play::buzzer_play,
    ir_link::ir_link,
    orchestrate::orchestrate,
    rc_control::{rc_button_a_handle, rc_button_b_handle, rc_button_c_handle, rc_button_d_handle},
    reflectance_read::reflectance_read,
};
use embassy_executor::Spawner;
use embassy_rp::block::ImageDef;
use embassy_rp::config::Config;
use system::resources::{
    self, AssignedResources, BuzzerResources, IrSensorResources, MotorDriverResources,
    MotorEncoderResources, RCResourcesA, RCResourcesB, RCResourcesC, RCResourcesD,
    ReflectanceResources, StatusLedResources,
};
use {defmt_rtt as _, panic_probe as _};

/// Firmware image type for bootloader
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

/// Device bindings for the mission controller
mod driver;
/// System core modules
mod system;
/// Task implementations
mod task;

/// Firmware entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Config::default());

    // The ADC must exist before the reflectance task takes its first sample
    resources::init_adc(p.ADC);

    let r = split_resources!(p);

    // Sensors and inputs first so the controller finds values on its first pass
    spawner.spawn(ir_link(r.ir_sensor)).unwrap();
    spawner.spawn(reflectance_read(r.reflectance)).unwrap();
    spawner.spawn(buzzer_play(r.buzzer)).unwrap();
    spawner.spawn(rc_button_a_handle(r.rc_a)).unwrap();
    spawner.spawn(rc_button_b_handle(r.rc_b)).unwrap();
    spawner.spawn(rc_button_c_handle(r.rc_c)).unwrap();
    spawner.spawn(rc_button_d_handle(r.rc_d)).unwrap();
    spawner
        .spawn(orchestrate(r.motor_driver, r.motor_encoders, r.status_led))
        .unwrap();
}
