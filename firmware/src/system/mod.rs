pub mod platform;
pub mod resources;
