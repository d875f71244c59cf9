//! Hardware Resource Management
//!
//! Assigns pins and peripherals to the tasks and drivers that own them.
//!
//! # Resource Groups
//! - Motor Driver: two TB6612FNG boards sharing one standby line; board one
//!   drives the tracks, board two the gripper
//! - Motor Encoders: PWM slices in input mode counting encoder edges
//! - IR Sensor: EV3 infrared sensor on UART0
//! - Reflectance: analog light sensor on an ADC pin
//! - Status LED: red/green LED on one PWM slice
//! - Buzzer: piezo buzzer on its own PWM slice
//! - RC Control: four remote control receiver outputs
//!
//! # Shared Resources
//! The ADC is kept behind a mutex so any task can take a reading.

use assign_resources::assign_resources;
use embassy_rp::adc::InterruptHandler as AdcInterruptHandler;
use embassy_rp::adc::{Adc, Async as AdcAsync};
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::{self, ADC, UART0};
use embassy_rp::uart::InterruptHandler as UartInterruptHandler;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;

/// Global ADC instance, `None` until [`init_adc`] ran
static ADC: Mutex<CriticalSectionRawMutex, Option<Adc<'static, AdcAsync>>> = Mutex::new(None);

/// Initializes the ADC peripheral.
///
/// Called once from main before any task is spawned.
pub fn init_adc(adc: ADC) {
    let adc = Adc::new(adc, Irqs, embassy_rp::adc::Config::default());
    critical_section::with(|_| {
        if let Ok(mut slot) = ADC.try_lock() {
            *slot = Some(adc);
        }
    });
}

/// Returns the protected ADC instance.
///
/// Hold the lock only for the duration of a reading.
pub fn get_adc() -> &'static Mutex<CriticalSectionRawMutex, Option<Adc<'static, AdcAsync>>> {
    &ADC
}

assign_resources! {
    /// TB6612FNG motor driver pins and PWM channels
    motor_driver: MotorDriverResources {
        standby_pin: PIN_22,
        // left track, board one channel A
        left_slice: PWM_SLICE6,
        left_pwm_pin: PIN_28,
        left_forward_pin: PIN_21,
        left_backward_pin: PIN_20,
        // right track, board one channel B
        right_slice: PWM_SLICE5,
        right_pwm_pin: PIN_27,
        right_forward_pin: PIN_19,
        right_backward_pin: PIN_18,
        // gripper, board two channel A
        gripper_slice: PWM_SLICE7,
        gripper_pwm_pin: PIN_14,
        gripper_forward_pin: PIN_15,
        gripper_backward_pin: PIN_8,
    },
    /// Motor encoder PWM input channels
    motor_encoders: MotorEncoderResources {
        left_encoder_slice: PWM_SLICE3,
        left_encoder_pin: PIN_7,
        right_encoder_slice: PWM_SLICE4,
        right_encoder_pin: PIN_9,
        gripper_encoder_slice: PWM_SLICE0,
        gripper_encoder_pin: PIN_17,
    },
    /// EV3 infrared sensor UART link
    ir_sensor: IrSensorResources {
        uart: UART0,
        tx_pin: PIN_0,
        rx_pin: PIN_1,
        tx_dma: DMA_CH0,
        rx_dma: DMA_CH1,
    },
    /// Downward facing light sensor
    reflectance: ReflectanceResources {
        sensor_pin: PIN_26,
    },
    /// PWM-controlled red/green status LED
    status_led: StatusLedResources {
        pwm_slice: PWM_SLICE1,
        red_pin: PIN_2,
        green_pin: PIN_3,
    },
    /// Piezo buzzer
    buzzer: BuzzerResources {
        pwm_slice: PWM_SLICE2,
        pin: PIN_4,
    },
    /// Remote control buttons
    rc_a: RCResourcesA {
        btn_a: PIN_16,
    },
    rc_b: RCResourcesB {
        btn_b: PIN_6,
    },
    rc_c: RCResourcesC {
        btn_c: PIN_10,
    },
    rc_d: RCResourcesD {
        btn_d: PIN_11,
    },
}

bind_interrupts!(pub struct Irqs {
    ADC_IRQ_FIFO => AdcInterruptHandler;
    UART0_IRQ => UartInterruptHandler<UART0>;
});
