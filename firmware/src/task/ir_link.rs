//! EV3 infrared sensor link
//!
//! Runs the sensor side of the EV3 UART protocol:
//! 1. At 2400 baud the sensor repeats its self description until the host
//!    acknowledges the closing ACK
//! 2. Both sides switch to the speed the sensor announced
//! 3. The host keeps the link alive with a NACK at least every 100 ms and
//!    selects modes; the sensor streams data messages for the selected mode
//!
//! If data stops arriving the link is marked offline and the handshake starts
//! over.

use defmt::{debug, info, warn};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{self, Uart};
use embassy_time::{with_timeout, Duration, Instant};
use gripper_rover::system::devices::{BeaconLocation, IrMode};

use crate::driver::ev3_uart::{self, Framer, Message, SYS_ACK, SYS_NACK};
use crate::driver::ir_sensor::{self, IrReadings, MODE_REQUEST};
use crate::system::resources::{IrSensorResources, Irqs};

type Link = Uart<'static, UART0, uart::Async>;

/// Speed every EV3 UART sensor starts at
const HANDSHAKE_BAUD: u32 = 2400;

/// Used when the sensor never announced a speed
const DEFAULT_BAUD: u32 = 57_600;

/// Upper bound between two keep-alive messages
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_millis(100);

/// How long one byte read may wait before housekeeping runs
const READ_TIMEOUT: Duration = Duration::from_millis(20);

/// Silence after which the link counts as lost
const SILENCE_LIMIT: Duration = Duration::from_millis(1000);

#[embassy_executor::task]
pub async fn ir_link(r: IrSensorResources) {
    let mut config = uart::Config::default();
    config.baudrate = HANDSHAKE_BAUD;
    let mut link = Uart::new(r.uart, r.tx_pin, r.rx_pin, Irqs, r.tx_dma, r.rx_dma, config);

    loop {
        link.set_baudrate(HANDSHAKE_BAUD);
        let speed = handshake(&mut link).await;
        info!("IR sensor handshake done, switching to {} baud", speed);
        link.set_baudrate(speed);

        session(&mut link).await;

        warn!("IR sensor link lost");
        ir_sensor::update(|readings| *readings = IrReadings::OFFLINE);
    }
}

async fn read_byte(link: &mut Link) -> Option<u8> {
    let mut byte = [0u8; 1];
    match with_timeout(READ_TIMEOUT, link.read(&mut byte)).await {
        Ok(Ok(())) => Some(byte[0]),
        Ok(Err(e)) => {
            debug!("IR sensor read error: {}", e);
            None
        }
        Err(_) => None,
    }
}

/// Wait for the self description to end, returns the announced speed
async fn handshake(link: &mut Link) -> u32 {
    let mut framer = Framer::new();
    let mut speed = DEFAULT_BAUD;

    loop {
        let Some(byte) = read_byte(link).await else {
            continue;
        };
        match framer.push(byte) {
            Some(Message::Speed(announced)) => speed = announced,
            Some(Message::System(SYS_ACK)) => {
                if link.write(&[SYS_ACK]).await.is_ok() {
                    return speed;
                }
                framer.reset();
            }
            _ => {}
        }
    }
}

/// Exchange messages until the sensor goes quiet
async fn session(link: &mut Link) {
    let mut framer = Framer::new();
    let mut last_keep_alive = Instant::now();
    let mut last_data = Instant::now();
    let mut requested: Option<IrMode> = None;
    let mut last_select: Option<Instant> = None;

    ir_sensor::update(|readings| readings.online = true);

    loop {
        if let Some(mode) = MODE_REQUEST.try_take() {
            requested = Some(mode);
        }
        if let Some(mode) = requested {
            let current = ir_sensor::READINGS.lock(|cell| cell.get().mode);
            let due = last_select.map_or(true, |at| at.elapsed() >= KEEP_ALIVE_INTERVAL);
            if current == Some(mode) {
                requested = None;
                last_select = None;
            } else if due {
                // repeated until the sensor reports data in the new mode
                let _ = link
                    .write(&ev3_uart::select_mode(ir_sensor::mode_index(mode)))
                    .await;
                last_select = Some(Instant::now());
            }
        }

        if last_keep_alive.elapsed() >= KEEP_ALIVE_INTERVAL {
            let _ = link.write(&[SYS_NACK]).await;
            last_keep_alive = Instant::now();
        }

        if let Some(byte) = read_byte(link).await {
            if let Some(Message::Data { mode, payload, len }) = framer.push(byte) {
                last_data = Instant::now();
                publish(mode, &payload[..len]);
            }
        }

        if last_data.elapsed() > SILENCE_LIMIT {
            return;
        }
    }
}

fn publish(mode: u8, data: &[u8]) {
    let Some(mode) = ir_sensor::mode_from_index(mode) else {
        return;
    };
    ir_sensor::update(|readings| {
        readings.mode = Some(mode);
        match mode {
            // single byte, 0 (touching) to 100
            IrMode::Proximity => readings.proximity = data[0] as i8,
            // heading and distance per channel, channel 1 first
            IrMode::BeaconSeek if data.len() >= 2 => {
                readings.beacon = BeaconLocation {
                    heading: data[0] as i8,
                    distance: data[1] as i8,
                }
            }
            // button code per channel, channel 1 first
            IrMode::Remote => readings.remote = data[0],
            _ => {}
        }
    });
}
