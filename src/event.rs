//! Diagnostic events emitted by the node.
//!
//! The node never reports protocol errors to the caller, the receiver just
//! gets no answer. When debugging is enabled every decision is handed to an
//! [`EventSink`] instead. [`LogSink`] forwards them to the `log` crate.

use core::fmt;

use crate::frame::ResponseFrame;
use crate::node::Reply;
use crate::types::{Address, Command, SensorType};
use crate::REQUEST_LEN;

/// Something the node saw or did.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Event {
    /// A complete request frame was read from the bus, not yet validated.
    FrameReceived([u8; REQUEST_LEN]),
    /// The length byte of a request wasn't 4.
    InvalidLength(u8),
    /// The request checksum didn't match.
    ChecksumMismatch { expected: u16, received: u16 },
    /// A valid request for an address outside `[1, 4]`.
    AddressOutOfRange(u8),
    /// A valid request with a command nibble we don't know.
    UnknownCommand { command: u8, address: Address },
    /// No sensor is bound to the requested address.
    NoSensor { command: Command, address: Address },
    /// A reply was written to the bus.
    ResponseSent {
        command: Command,
        address: Address,
        frame: ResponseFrame,
    },
    /// A new sensor type was bound to an address.
    SensorAdded {
        sensor_type: SensorType,
        address: Address,
    },
    /// A new sensor type couldn't be added, all slots are in use.
    TableFull { sensor_type: SensorType },
}

impl Event {
    pub(crate) fn response_sent(reply: &Reply) -> Self {
        Self::ResponseSent {
            command: reply.command,
            address: reply.address,
            frame: reply.frame.clone(),
        }
    }
}

struct Hex<'a>(&'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, byte) in self.0.iter().enumerate() {
            if n > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameReceived(frame) => write!(f, "RX: {}", Hex(frame)),
            Self::InvalidLength(length) => {
                write!(f, "dropped frame with length byte 0x{:02X}", length)
            }
            Self::ChecksumMismatch { expected, received } => write!(
                f,
                "dropped frame, checksum 0x{:04X} != 0x{:04X}",
                received, expected
            ),
            Self::AddressOutOfRange(address) => write!(f, "ignored address {}", address),
            Self::UnknownCommand { command, address } => write!(
                f,
                "ignored unknown command 0x{:02X} ADDR:{}",
                command, address
            ),
            Self::NoSensor { command, address } => {
                write!(f, "-> {} ADDR:{} (no sensor)", command, address)
            }
            Self::ResponseSent {
                command,
                address,
                frame,
            } => write!(f, "-> {} ADDR:{} [SENT] TX: {}", command, address, Hex(frame)),
            Self::SensorAdded {
                sensor_type,
                address,
            } => write!(
                f,
                "added sensor type {} at address {}",
                sensor_type, address
            ),
            Self::TableFull { sensor_type } => write!(
                f,
                "no free sensor slot for sensor type {}",
                sensor_type
            ),
        }
    }
}

/// Receiver of diagnostic [`Event`]s.
pub trait EventSink {
    fn event(&mut self, event: &Event);
}

/// Forwards events to the `log` facade, under the `ibus_telemetry::event` target.
#[derive(Debug, Default, Copy, Clone)]
pub struct LogSink;

impl EventSink for LogSink {
    fn event(&mut self, event: &Event) {
        match event {
            Event::TableFull { .. } => log::warn!("{}", event),
            _ => log::debug!("{}", event),
        }
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn event(&mut self, event: &Event) {
        (**self).event(event)
    }
}
