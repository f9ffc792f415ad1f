//! Construction of the frames exchanged on the sensor bus.
//!
//! Every frame starts with its own length and ends with a little endian
//! [`checksum`](crate::checksum).

use arrayvec::ArrayVec;

use crate::types::{Address, Command, SensorType};
use crate::{checksum, REQUEST_LEN, RESPONSE_LEN};

/// Storage for an outgoing frame, 4 or 6 bytes long.
pub type ResponseFrame = ArrayVec<u8, RESPONSE_LEN>;

/// Second payload byte of a `TYPE` reply, the length of the measurement value.
const VALUE_LEN: u8 = 0x02;

/// Build a receiver request. Sensors never send these, it is here for
/// testing and for simulating a receiver.
pub fn request(command: Command, address: Address) -> [u8; REQUEST_LEN] {
    let header = [REQUEST_LEN as u8, command.with_address(address)];
    let [lo, hi] = checksum(&header).to_le_bytes();
    [header[0], header[1], lo, hi]
}

/// The answer to `DISCOVER`: the request is echoed back.
pub fn discover_response(address: Address) -> ResponseFrame {
    finish(&[REQUEST_LEN as u8, Command::Discover.with_address(address)])
}

/// The answer to `TYPE`.
pub fn type_response(address: Address, sensor_type: SensorType) -> ResponseFrame {
    finish(&[
        RESPONSE_LEN as u8,
        Command::Type.with_address(address),
        *sensor_type,
        VALUE_LEN,
    ])
}

/// The answer to `MEASUREMENT`, `value` goes on the wire little endian.
pub fn measurement_response(address: Address, value: u16) -> ResponseFrame {
    let [lo, hi] = value.to_le_bytes();
    finish(&[
        RESPONSE_LEN as u8,
        Command::Measurement.with_address(address),
        lo,
        hi,
    ])
}

fn finish(body: &[u8]) -> ResponseFrame {
    let mut frame = ResponseFrame::new();
    frame.extend(body.iter().copied());
    frame.extend(checksum(body).to_le_bytes().iter().copied());
    frame
}
