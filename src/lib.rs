//! Sans-io implementation of the sensor side of the FlySky iBUS telemetry protocol.
//!
//! An iBUS receiver polls its sensor port with 4 byte requests. Each request
//! carries a command and a sensor address in `[1, 4]`, and every sensor
//! that is present answers with a short frame:
//!
//! * `DISCOVER` is echoed back if a sensor exists at the address,
//! * `TYPE` is answered with the sensor type tag,
//! * `MEASUREMENT` is answered with the current raw reading.
//!
//! Silence is the answer for "no sensor here", so every protocol error is
//! swallowed by the node and only reported through an optional
//! [`EventSink`].
//!
//! [`Node`] implements the protocol without doing any I/O, while
//! [`SerialNode`] drives a [`Transport`] with a non-blocking `poll()`
//! meant to be called from the main loop.
//!
//! # Example
//! ```
//! use ibus_telemetry::{frame, Command, Node, addr};
//!
//! let mut node = Node::new();
//! node.set_internal_voltage(5.0).unwrap(); // bound to address 1
//!
//! let request = frame::request(Command::Measurement, addr(1));
//! let reply = node.handle_frame(&request).unwrap();
//! assert_eq!(&reply.as_bytes()[..4], &[0x06, 0xA1, 0xF4, 0x01]);
//! node.frame_sent(&reply);
//! assert_eq!(node.response_count(), 1);
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod event;
pub mod frame;
pub mod node;
mod nom_parser;
pub mod sensor_table;
pub mod types;
pub mod units;

pub use event::{Event, EventSink, LogSink};
pub use node::io::{PollStatus, SerialNode, Transport};
pub use node::{Node, Reply};
pub use sensor_table::{Sensor, SensorTable, Upsert};
pub use types::{addr, Address, Command, Error, SensorType};

/// Number of sensor slots, and the highest usable address.
pub const MAX_SENSORS: usize = 4;

/// Length of a receiver request, the only frame shape the receiver sends.
pub const REQUEST_LEN: usize = 4;

/// Length of the `TYPE` and `MEASUREMENT` replies.
pub const RESPONSE_LEN: usize = 6;

/// Bit rate of the sensor bus.
pub const BAUD_RATE: u32 = 115_200;

/// iBUS checksum: `0xFFFF` minus the 16 bit wrapping sum of `data`.
///
/// Requests are checked over their first two bytes only, replies are
/// summed over everything before the checksum.
pub fn checksum(data: &[u8]) -> u16 {
    let sum = data
        .iter()
        .fold(0u16, |sum, &byte| sum.wrapping_add(byte.into()));
    0xFFFF - sum
}
