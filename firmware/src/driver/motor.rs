//! Tacho motor on a TB6612FNG channel
//!
//! The encoder is a PWM slice in input mode counting rising edges. It cannot
//! tell the direction of rotation, so every counted edge is signed by the
//! direction the motor was last commanded to turn. Counts are folded into the
//! tachometer whenever power changes or the tachometer is read.

use embassy_rp::gpio::Output;
use embassy_rp::pwm::Pwm;
use gripper_rover::system::devices::Motor;
use gripper_rover::system::error::{DeviceKind, Error};
use tb6612fng::DriveCommand;

/// H-bridge channel as wired on the robot
pub type BridgeChannel = tb6612fng::Motor<Output<'static>, Output<'static>, Pwm<'static>>;

pub struct TachoMotor {
    kind: DeviceKind,
    bridge: BridgeChannel,
    encoder: Pwm<'static>,
    power: i8,
    last_count: u16,
    tachometer: i32,
}

impl TachoMotor {
    pub fn new(kind: DeviceKind, bridge: BridgeChannel, encoder: Pwm<'static>) -> Self {
        let last_count = encoder.counter();
        Self {
            kind,
            bridge,
            encoder,
            power: 0,
            last_count,
            tachometer: 0,
        }
    }

    /// Add the edges counted since the last call, signed by the commanded direction
    fn integrate(&mut self) {
        let count = self.encoder.counter();
        let edges = count.wrapping_sub(self.last_count) as i32;
        self.last_count = count;
        self.tachometer += edges * self.power.signum() as i32;
    }

    fn drive(&mut self, command: DriveCommand) -> Result<(), Error> {
        self.bridge.drive(command).map_err(|_| Error::Device(self.kind))
    }
}

impl Motor for TachoMotor {
    fn set_power(&mut self, power: i8) -> Result<(), Error> {
        if power == self.power {
            return Ok(());
        }
        self.integrate();

        let command = match power {
            p if p > 0 => DriveCommand::Forward(p as u8),
            p if p < 0 => DriveCommand::Backward(p.unsigned_abs()),
            _ => DriveCommand::Stop,
        };
        self.drive(command)?;
        self.power = power;
        Ok(())
    }

    fn tachometer(&mut self) -> Result<i32, Error> {
        self.integrate();
        Ok(self.tachometer)
    }

    fn reset_tachometer(&mut self) -> Result<(), Error> {
        self.last_count = self.encoder.counter();
        self.tachometer = 0;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Error> {
        self.integrate();
        self.drive(DriveCommand::Stop)?;
        self.power = 0;
        Ok(())
    }
}
