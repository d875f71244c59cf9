pub mod garbage_collection;
pub mod keyboard;
pub mod line_following;
pub mod remote_decode;
pub mod remote_drive;
pub mod scheduler;
pub mod state_machine;
pub mod status;
