//! Status output over the debug probe
//!
//! The robot has no screen; snapshots go to the defmt log instead.

use defmt::info;
use gripper_rover::system::devices::StatusDisplay;
use gripper_rover::system::error::Error;
use gripper_rover::system::state::StatusSnapshot;

#[derive(Debug, Default)]
pub struct DefmtDisplay;

impl StatusDisplay for DefmtDisplay {
    fn show(&mut self, snapshot: &StatusSnapshot) -> Result<(), Error> {
        info!("{}", snapshot);
        Ok(())
    }
}
