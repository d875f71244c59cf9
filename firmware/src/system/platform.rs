//! Binds the mission controller to the rover's hardware

use gripper_rover::system::audio::SignalSpeaker;
use gripper_rover::system::devices::Platform;

use crate::driver::buttons::RcButtons;
use crate::driver::display::DefmtDisplay;
use crate::driver::ir_sensor::Ev3IrSensor;
use crate::driver::motor::TachoMotor;
use crate::driver::reflectance::Reflectance;
use crate::driver::status_led::StatusLed;

pub struct RoverPlatform;

impl Platform for RoverPlatform {
    type Motor = TachoMotor;
    type IrSensor = Ev3IrSensor;
    type Reflectance = Reflectance;
    type Speaker = SignalSpeaker;
    type Status = StatusLed;
    type Buttons = RcButtons;
    type Display = DefmtDisplay;
}
