pub mod buttons;
pub mod display;
pub mod ev3_uart;
pub mod ir_sensor;
pub mod motor;
pub mod reflectance;
pub mod status_led;
