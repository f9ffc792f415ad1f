//! Fixed-capacity table of the virtual sensors presented on the bus.

use snafu::OptionExt;

use crate::types::{Address, Error, SensorType, TableFullSnafu};
use crate::MAX_SENSORS;

/// One occupied sensor slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Sensor {
    /// The type tag reported in `TYPE` replies.
    pub sensor_type: SensorType,
    /// Raw reading in protocol units.
    pub value: u16,
}

/// Outcome of [`SensorTable::upsert`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Upsert {
    /// The sensor type was new and now occupies the slot at this address.
    Inserted(Address),
    /// The value of an existing sensor at this address was replaced.
    Updated(Address),
}

impl Upsert {
    /// Address of the sensor, regardless of whether it was new.
    pub const fn address(self) -> Address {
        match self {
            Self::Inserted(address) | Self::Updated(address) => address,
        }
    }
}

/// Up to [`MAX_SENSORS`] sensors, indexed by `address - 1`.
///
/// New sensor types always take the lowest free slot, so the address of a
/// sensor only depends on the order in which the types were first written.
/// A type never moves once it has a slot.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SensorTable {
    slots: [Option<Sensor>; MAX_SENSORS],
}

impl SensorTable {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            slots: [None; MAX_SENSORS],
        }
    }

    /// Overwrite the value of `sensor_type`, or bind it to the first free slot.
    /// # Errors
    /// Returns [`Error::TableFull`] if the type is new and no slot is free.
    /// The table is left unchanged in that case.
    pub fn upsert(&mut self, sensor_type: SensorType, value: u16) -> Result<Upsert, Error> {
        if let Some(index) = self.find_by_type(sensor_type) {
            if let Some(sensor) = self.slots[index].as_mut() {
                sensor.value = value;
            }
            return Ok(Upsert::Updated(Address::from_index(index)));
        }

        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .context(TableFullSnafu { sensor_type })?;
        self.slots[index] = Some(Sensor { sensor_type, value });
        Ok(Upsert::Inserted(Address::from_index(index)))
    }

    /// Slot index of `sensor_type`, if it has one.
    pub fn find_by_type(&self, sensor_type: SensorType) -> Option<usize> {
        self.slots.iter().position(|slot| match slot {
            Some(sensor) => sensor.sensor_type == sensor_type,
            None => false,
        })
    }

    /// The sensor at a 1-based bus address. Addresses outside `[1, 4]` and
    /// unoccupied slots yield `None`.
    pub fn at(&self, address: u8) -> Option<&Sensor> {
        let index = usize::from(address).checked_sub(1)?;
        self.slots.get(index)?.as_ref()
    }

    /// Number of occupied slots.
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

}
