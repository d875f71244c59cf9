pub mod buzzer_play;
pub mod ir_link;
pub mod orchestrate;
pub mod rc_control;
pub mod reflectance_read;
