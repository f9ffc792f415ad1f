//! A [`Node`] bound to a serial transport, driven by [`SerialNode::poll`].

use crate::event::{EventSink, LogSink};
use crate::node::{Node, Reply};
use crate::types::{Address, Command, Error, SensorType};
use crate::{Event, REQUEST_LEN};

/// Byte-oriented duplex serial channel shared with the receiver.
///
/// Opening and configuring the port (115200 baud, 8N1) is up to the caller.
/// None of the methods may block waiting for the receiver.
pub trait Transport {
    type Error;

    /// Number of received bytes that can be read without blocking.
    fn bytes_available(&mut self) -> Result<usize, Self::Error>;

    /// Read one received byte. Only called when bytes are available.
    fn read_byte(&mut self) -> Result<u8, Self::Error>;

    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Wait until everything written has left the UART.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn bytes_available(&mut self) -> Result<usize, Self::Error> {
        (**self).bytes_available()
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        (**self).read_byte()
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        (**self).write_all(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        (**self).flush()
    }
}

/// What a single [`SerialNode::poll`] call did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// Less than a full request was buffered, nothing was read.
    Idle,
    /// A request was read and dropped without answering.
    Ignored,
    /// A request was read and answered.
    Responded { command: Command, address: Address },
}

/// Sensor node answering the receiver over a [`Transport`].
///
/// Call [`poll()`](Self::poll) from the main loop as often as possible. Each
/// call handles at most one request and never waits for data, so it can
/// share the loop with anything else. Sensor values can be changed at any
/// time between polls.
///
/// # Example
///
/// ```
/// use ibus_telemetry::{PollStatus, SerialNode, Transport};
/// use std::collections::VecDeque;
/// use std::convert::Infallible;
///
/// #[derive(Default)]
/// struct Loopback {
///     rx: VecDeque<u8>,
///     tx: Vec<u8>,
/// }
///
/// impl Transport for Loopback {
///     type Error = Infallible;
///     fn bytes_available(&mut self) -> Result<usize, Infallible> { Ok(self.rx.len()) }
///     fn read_byte(&mut self) -> Result<u8, Infallible> { Ok(self.rx.pop_front().unwrap_or(0)) }
///     fn write_all(&mut self, data: &[u8]) -> Result<(), Infallible> {
///         self.tx.extend_from_slice(data);
///         Ok(())
///     }
///     fn flush(&mut self) -> Result<(), Infallible> { Ok(()) }
/// }
///
/// let mut node = SerialNode::new(Loopback::default());
/// node.set_rpm(4294).unwrap();
///
/// assert_eq!(node.poll(), Ok(PollStatus::Idle));
/// node.transport_mut().rx.extend(&[0x04, 0x91, 0x6A, 0xFF]);
/// assert!(matches!(node.poll(), Ok(PollStatus::Responded { .. })));
/// assert_eq!(node.transport().tx, [0x06, 0x91, 0x02, 0x02, 0x64, 0xFF]);
/// ```
#[derive(Debug)]
pub struct SerialNode<T, S = LogSink> {
    transport: T,
    node: Node<S>,
}

impl<T: Transport> SerialNode<T, LogSink> {
    /// Bind a new node to `transport`. Nothing is read or written until
    /// the first poll.
    pub const fn new(transport: T) -> Self {
        Self::with_sink(transport, LogSink)
    }
}

impl<T: Transport, S: EventSink> SerialNode<T, S> {
    /// Like [`new()`](SerialNode::new), delivering debug events to `sink`.
    pub const fn with_sink(transport: T, sink: S) -> Self {
        Self {
            transport,
            node: Node::with_sink(sink),
        }
    }

    /// Handle at most one request from the receiver.
    ///
    /// Once four or more bytes are buffered one request is read and answered
    /// if it is valid and addressed to a bound sensor. Whatever else is in the
    /// receive buffer is discarded afterwards, the protocol has no frame
    /// delimiter to resynchronise on.
    ///
    /// # Errors
    /// Only errors from the transport are returned. A reply that failed to
    /// go out is not counted as a response. If both the reply and draining
    /// the input fail, the reply error is returned.
    pub fn poll(&mut self) -> Result<PollStatus, T::Error> {
        if self.transport.bytes_available()? < REQUEST_LEN {
            return Ok(PollStatus::Idle);
        }

        let mut frame = [0; REQUEST_LEN];
        for byte in frame.iter_mut() {
            *byte = self.transport.read_byte()?;
        }
        self.node.emit(|| Event::FrameReceived(frame));

        let status = match self.node.handle_frame(&frame) {
            Some(reply) => self.send(&reply),
            None => Ok(PollStatus::Ignored),
        };
        let drained = self.clear_input();
        let status = status?;
        drained?;
        Ok(status)
    }

    /// Discard everything in the receive buffer.
    pub fn clear_input(&mut self) -> Result<(), T::Error> {
        while self.transport.bytes_available()? > 0 {
            self.transport.read_byte()?;
        }
        Ok(())
    }

    fn send(&mut self, reply: &Reply) -> Result<PollStatus, T::Error> {
        self.transport.write_all(reply.as_bytes())?;
        self.transport.flush()?;
        self.node.frame_sent(reply);
        Ok(PollStatus::Responded {
            command: reply.command(),
            address: reply.address(),
        })
    }

    /// See [`Node::set_sensor`].
    pub fn set_sensor(
        &mut self,
        sensor_type: impl Into<SensorType>,
        raw_value: u16,
    ) -> Result<Address, Error> {
        self.node.set_sensor(sensor_type, raw_value)
    }

    /// Receiver supply voltage in volts.
    pub fn set_internal_voltage(&mut self, volts: f32) -> Result<Address, Error> {
        self.node.set_internal_voltage(volts)
    }

    /// External (battery) voltage in volts.
    pub fn set_external_voltage(&mut self, volts: f32) -> Result<Address, Error> {
        self.node.set_external_voltage(volts)
    }

    /// Temperature in degrees Celsius.
    pub fn set_temperature(&mut self, celsius: f32) -> Result<Address, Error> {
        self.node.set_temperature(celsius)
    }

    /// Motor speed in revolutions per minute.
    pub fn set_rpm(&mut self, rpm: u16) -> Result<Address, Error> {
        self.node.set_rpm(rpm)
    }

    /// Valid requests received, whether answered or not.
    pub const fn request_count(&self) -> u32 {
        self.node.request_count()
    }

    /// Replies written and flushed to the transport.
    pub const fn response_count(&self) -> u32 {
        self.node.response_count()
    }

    /// True once a DISCOVER reply has been sent.
    pub const fn is_discovered(&self) -> bool {
        self.node.is_discovered()
    }

    /// Number of bound sensor slots.
    pub fn sensor_count(&self) -> usize {
        self.node.sensor_count()
    }

    /// Turn diagnostic output on or off. Has no effect on the protocol.
    pub fn set_debug(&mut self, enable: bool) {
        self.node.set_debug(enable)
    }

    /// The protocol engine, e.g. to reach its event sink.
    pub fn node_mut(&mut self) -> &mut Node<S> {
        &mut self.node
    }

    /// The underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// The underlying transport, e.g. to adjust port settings.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Unbind the node, returning the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }
}
