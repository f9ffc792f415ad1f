//! This module defines range-checked types for iBUS addresses, sensor types
//! and commands, meant to simplify correct usage of the API.

use snafu::{ensure, OptionExt, Snafu};

use core::convert::{TryFrom, TryInto};
use core::fmt;
use core::ops::Deref;

use crate::MAX_SENSORS;

/// Error type for this crate
#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum Error {
    /// The value isn't a valid sensor address.
    #[snafu(display("Invalid address"))]
    InvalidAddress,
    /// Every sensor slot is taken by another sensor type.
    #[snafu(display("No free sensor slot for sensor type {}", sensor_type))]
    TableFull {
        /// The sensor type that could not be added.
        sensor_type: SensorType,
    },
}

const fn invalid_address() -> InvalidAddressSnafu {
    InvalidAddressSnafu
}

/// Address is a range-checked [1, 4] integer, the bus address of one
/// virtual sensor. Address `n` always refers to sensor slot `n - 1`.
///
/// ## Example
/// ```
/// use ibus_telemetry::Address;
/// use std::convert::TryInto;
/// let addr = Address::new(2).unwrap();
/// let addr: Address = 2usize.try_into().unwrap();
/// assert_eq!(addr.index(), 1);
/// ```
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash)]
#[repr(transparent)]
pub struct Address(u8);

/// Create a new [`Address`], panics if it is out of range.
pub const fn addr(a: u8) -> Address {
    if a >= 1 && a as usize <= MAX_SENSORS {
        return Address(a);
    }
    panic!("Invalid address.")
}

impl Address {
    /// Create a new address, checking that the address is in \[1, 4\].
    /// # Errors
    /// Returns [`Error::InvalidAddress`] if `address` is out of range.
    pub fn new(address: impl TryInto<u8>) -> Result<Self, Error> {
        let address = address.try_into().ok().with_context(invalid_address)?;
        ensure!(
            address >= 1 && address as usize <= MAX_SENSORS,
            invalid_address()
        );
        Ok(Self(address))
    }

    /// The sensor slot index this address refers to.
    pub const fn index(self) -> usize {
        self.0 as usize - 1
    }

    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u8 + 1)
    }
}

impl Deref for Address {
    type Target = u8;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq<u8> for Address {
    fn eq(&self, other: &u8) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<usize> for Address {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}


/// Protocol tag identifying what quantity a sensor reports.
///
/// The named constants cover the sensors this crate has setters for,
/// the receiver understands many more.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash)]
#[repr(transparent)]
pub struct SensorType(pub u8);

impl SensorType {
    /// Receiver supply voltage, 0.01 V units.
    pub const INTERNAL_VOLTAGE: Self = Self(0x00);
    /// Temperature, 0.1 °C units offset by -40 °C.
    pub const TEMPERATURE: Self = Self(0x01);
    /// Motor speed, RPM.
    pub const RPM: Self = Self(0x02);
    /// External (battery) voltage, 0.01 V units.
    pub const EXTERNAL_VOLTAGE: Self = Self(0x03);
}

impl Deref for SensorType {
    type Target = u8;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<u8> for SensorType {
    fn from(tag: u8) -> Self {
        Self(tag)
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// Request command, the high nibble of the command/address byte.
#[derive(PartialEq, Eq, Debug, Copy, Clone, Hash)]
#[repr(u8)]
pub enum Command {
    /// Is there a sensor at this address?
    Discover = 0x80,
    /// Which sensor type is at this address?
    Type = 0x90,
    /// What is the current reading at this address?
    Measurement = 0xA0,
}

impl Command {
    /// Decode the command from a command/address byte, ignoring the address nibble.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte & 0xF0 {
            0x80 => Some(Self::Discover),
            0x90 => Some(Self::Type),
            0xA0 => Some(Self::Measurement),
            _ => None,
        }
    }

    /// Combine the command with an address into the command/address byte.
    pub const fn with_address(self, address: Address) -> u8 {
        self as u8 | address.0
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Discover => "DISCOVER",
            Self::Type => "TYPE",
            Self::Measurement => "MEASUREMENT",
        })
    }
}
