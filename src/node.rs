//! See [`Node`] for more details.

pub mod io;

use crate::event::{Event, EventSink, LogSink};
use crate::frame::{self, ResponseFrame};
use crate::nom_parser::{parse_request, RequestToken};
use crate::sensor_table::{SensorTable, Upsert};
use crate::types::{Address, Command, Error, SensorType};
use crate::{units, REQUEST_LEN};

/// Sensor side of the iBUS telemetry protocol, without any I/O.
///
/// The node owns the sensor table and answers one request frame at a time.
/// Feed it complete 4 byte requests with [`handle_frame()`](Self::handle_frame),
/// put the returned [`Reply`] on the bus and confirm the transmission with
/// [`frame_sent()`](Self::frame_sent). Most users want [`io::SerialNode`],
/// which does all of that on top of a [`io::Transport`].
///
/// # Example
///
/// ```
/// use ibus_telemetry::{frame, Command, Node, addr};
///
/// let mut node = Node::new();
/// node.set_temperature(21.5).unwrap();
///
/// // nothing is bound to address 2
/// assert!(node.handle_frame(&frame::request(Command::Discover, addr(2))).is_none());
///
/// let reply = node.handle_frame(&frame::request(Command::Discover, addr(1))).unwrap();
/// assert_eq!(reply.as_bytes(), &[0x04, 0x81, 0x7A, 0xFF]);
/// node.frame_sent(&reply);
/// assert!(node.is_discovered());
/// ```
#[derive(Debug)]
pub struct Node<S = LogSink> {
    sensors: SensorTable,
    requests: u32,
    responses: u32,
    discovered: bool,
    debug: bool,
    sink: S,
}

/// A reply waiting to be put on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub(crate) command: Command,
    pub(crate) address: Address,
    pub(crate) frame: ResponseFrame,
}

impl Reply {
    /// The bytes to transmit.
    pub fn as_bytes(&self) -> &[u8] {
        self.frame.as_ref()
    }

    /// The command this is an answer to.
    pub const fn command(&self) -> Command {
        self.command
    }

    /// The address of the answering sensor.
    pub const fn address(&self) -> Address {
        self.address
    }
}

impl Node<LogSink> {
    /// Create a node with an empty sensor table, logging through the `log` crate
    /// once debugging is enabled.
    pub const fn new() -> Self {
        Self::with_sink(LogSink)
    }
}

impl Default for Node<LogSink> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSink> Node<S> {
    /// Create a node reporting diagnostic events to `sink`.
    pub const fn with_sink(sink: S) -> Self {
        Self {
            sensors: SensorTable::new(),
            requests: 0,
            responses: 0,
            discovered: false,
            debug: false,
            sink,
        }
    }

    /// Validate one request and work out the answer, if any.
    ///
    /// Frames with a bad length byte or checksum, requests for addresses
    /// outside `[1, 4]` and requests for unbound addresses all yield `None`.
    /// Only frames passing validation are counted as requests.
    pub fn handle_frame(&mut self, frame: &[u8; REQUEST_LEN]) -> Option<Reply> {
        let (command, address) = match parse_request(frame) {
            RequestToken::Request { command, address } => (command, address),
            RequestToken::InvalidLength(length) => {
                self.emit(|| Event::InvalidLength(length));
                return None;
            }
            RequestToken::ChecksumMismatch { expected, received } => {
                self.emit(|| Event::ChecksumMismatch { expected, received });
                return None;
            }
        };
        self.requests = self.requests.wrapping_add(1);

        let address = match Address::new(address) {
            Ok(address) => address,
            Err(_) => {
                self.emit(|| Event::AddressOutOfRange(address));
                return None;
            }
        };
        let command = match Command::from_byte(command) {
            Some(command) => command,
            None => {
                self.emit(|| Event::UnknownCommand { command, address });
                return None;
            }
        };
        let sensor = match self.sensors.at(*address) {
            Some(sensor) => *sensor,
            None => {
                self.emit(|| Event::NoSensor { command, address });
                return None;
            }
        };

        let frame = match command {
            Command::Discover => frame::discover_response(address),
            Command::Type => frame::type_response(address, sensor.sensor_type),
            Command::Measurement => frame::measurement_response(address, sensor.value),
        };
        Some(Reply {
            command,
            address,
            frame,
        })
    }

    /// Signals that `reply` was put on the bus.
    pub fn frame_sent(&mut self, reply: &Reply) {
        self.responses = self.responses.wrapping_add(1);
        if reply.command == Command::Discover {
            self.discovered = true;
        }
        self.emit(|| Event::response_sent(reply));
    }

    /// Set the raw value of a sensor, binding `sensor_type` to the next free
    /// address the first time it is used.
    /// # Errors
    /// Returns [`Error::TableFull`] if `sensor_type` is new and all four
    /// addresses are taken. Nothing is changed in that case.
    pub fn set_sensor(
        &mut self,
        sensor_type: impl Into<SensorType>,
        raw_value: u16,
    ) -> Result<Address, Error> {
        let sensor_type = sensor_type.into();
        match self.sensors.upsert(sensor_type, raw_value) {
            Ok(Upsert::Inserted(address)) => {
                self.emit(|| Event::SensorAdded {
                    sensor_type,
                    address,
                });
                Ok(address)
            }
            Ok(Upsert::Updated(address)) => Ok(address),
            Err(err) => {
                self.emit(|| Event::TableFull { sensor_type });
                Err(err)
            }
        }
    }

    /// Receiver supply voltage in volts.
    pub fn set_internal_voltage(&mut self, volts: f32) -> Result<Address, Error> {
        self.set_sensor(SensorType::INTERNAL_VOLTAGE, units::volts_to_raw(volts))
    }

    /// External (battery) voltage in volts.
    pub fn set_external_voltage(&mut self, volts: f32) -> Result<Address, Error> {
        self.set_sensor(SensorType::EXTERNAL_VOLTAGE, units::volts_to_raw(volts))
    }

    /// Temperature in degrees Celsius.
    pub fn set_temperature(&mut self, celsius: f32) -> Result<Address, Error> {
        self.set_sensor(SensorType::TEMPERATURE, units::celsius_to_raw(celsius))
    }

    /// Motor speed in revolutions per minute.
    pub fn set_rpm(&mut self, rpm: u16) -> Result<Address, Error> {
        self.set_sensor(SensorType::RPM, units::rpm_to_raw(rpm))
    }

    /// Number of requests that passed validation.
    pub const fn request_count(&self) -> u32 {
        self.requests
    }

    /// Number of replies put on the bus.
    pub const fn response_count(&self) -> u32 {
        self.responses
    }

    /// True once the receiver has discovered any of our sensors.
    pub const fn is_discovered(&self) -> bool {
        self.discovered
    }

    /// Number of sensors bound to an address.
    pub fn sensor_count(&self) -> usize {
        self.sensors.occupied_count()
    }

    /// Turn delivery of diagnostic events on or off.
    pub fn set_debug(&mut self, enable: bool) {
        self.debug = enable;
    }

    /// Whether diagnostic events are being delivered.
    pub const fn debug_enabled(&self) -> bool {
        self.debug
    }

    /// The sink diagnostic events go to.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn emit(&mut self, event: impl FnOnce() -> Event) {
        if self.debug {
            self.sink.event(&event());
        }
    }
}
