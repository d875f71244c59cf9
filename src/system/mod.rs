//! Core system components shared by all tasks
pub mod audio;
pub mod config;
pub mod devices;
pub mod error;
pub mod motor;
pub mod robot;
pub mod state;
pub mod steering;
