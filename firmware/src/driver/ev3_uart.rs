//! EV3 UART sensor protocol framing
//!
//! Every message starts with a header byte:
//!
//! ```text
//! bit 7..6  message type: 00 system, 01 command, 10 info, 11 data
//! bit 5..3  payload length code, payload is 1 << code bytes
//! bit 2..0  command or mode
//! ```
//!
//! System messages are the header alone. Info messages carry one extra byte
//! after the header. Everything but system messages ends in a checksum byte
//! chosen so that all bytes of the message XOR to 0xFF.

/// System message: keep-alive sent by the host
pub const SYS_NACK: u8 = 0x02;
/// System message: end of handshake / acknowledge
pub const SYS_ACK: u8 = 0x04;

const TYPE_SYSTEM: u8 = 0b00;
const TYPE_COMMAND: u8 = 0b01;
const TYPE_INFO: u8 = 0b10;
const TYPE_DATA: u8 = 0b11;

const CMD_SPEED: u8 = 0x02;
const CMD_SELECT: u8 = 0x03;

/// Longest payload the protocol allows
pub const MAX_PAYLOAD: usize = 32;

/// A checked message from the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Message {
    System(u8),
    /// Baud rate the sensor will talk at after the handshake
    Speed(u32),
    /// Any other command or info message, not needed by the host
    Other,
    Data {
        mode: u8,
        payload: [u8; MAX_PAYLOAD],
        len: usize,
    },
}

fn message_type(header: u8) -> u8 {
    header >> 6
}

fn payload_len(header: u8) -> usize {
    1 << ((header >> 3) & 0x07).min(5)
}

fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0xFF, |acc, b| acc ^ b)
}

/// Reassembles messages from a byte stream
///
/// A message failing its checksum is dropped and framing restarts with the
/// next byte, which is how the reader finds message boundaries again after
/// joining the stream mid-message.
pub struct Framer {
    buf: [u8; MAX_PAYLOAD + 3],
    pos: usize,
    expected: usize,
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framer {
    pub const fn new() -> Self {
        Self {
            buf: [0; MAX_PAYLOAD + 3],
            pos: 0,
            expected: 0,
        }
    }

    pub fn reset(&mut self) {
        self.pos = 0;
    }

    /// Feed one byte, returns a message once one is complete
    pub fn push(&mut self, byte: u8) -> Option<Message> {
        if self.pos == 0 {
            let header = byte;
            match message_type(header) {
                TYPE_SYSTEM => return Some(Message::System(header)),
                TYPE_INFO => self.expected = 2 + payload_len(header) + 1,
                _ => self.expected = 1 + payload_len(header) + 1,
            }
        }

        self.buf[self.pos] = byte;
        self.pos += 1;
        if self.pos < self.expected {
            return None;
        }

        self.pos = 0;
        let message = &self.buf[..self.expected];
        let (body, check) = message.split_at(self.expected - 1);
        if checksum(body) != check[0] {
            return None;
        }
        Some(decode(body))
    }
}

fn decode(body: &[u8]) -> Message {
    let header = body[0];
    let selector = header & 0x07;
    match message_type(header) {
        TYPE_DATA => {
            let data = &body[1..];
            let mut payload = [0; MAX_PAYLOAD];
            payload[..data.len()].copy_from_slice(data);
            Message::Data {
                mode: selector,
                payload,
                len: data.len(),
            }
        }
        TYPE_COMMAND if selector == CMD_SPEED && body.len() >= 5 => {
            Message::Speed(u32::from_le_bytes([body[1], body[2], body[3], body[4]]))
        }
        _ => Message::Other,
    }
}

/// Command selecting a sensor mode
pub fn select_mode(mode: u8) -> [u8; 3] {
    let header = (TYPE_COMMAND << 6) | CMD_SELECT;
    let payload = mode & 0x07;
    [header, payload, checksum(&[header, payload])]
}
