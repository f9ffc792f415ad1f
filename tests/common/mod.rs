#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{Error, ErrorKind};
use std::rc::Rc;

use ibus_telemetry::Transport;

/// Simulated sensor port. The test keeps one handle to play the receiver,
/// the node under test owns a [`SerialPort`] sharing the same state.
pub struct SerialInterface {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    writes: usize,
    do_read_error: bool,
    do_write_error: bool,
}

pub struct SerialPort(Rc<RefCell<SerialInterface>>);

impl SerialPort {
    pub fn new(serial_if: &Rc<RefCell<SerialInterface>>) -> SerialPort {
        SerialPort(serial_if.clone())
    }
}

impl SerialInterface {
    pub fn new() -> Rc<RefCell<SerialInterface>> {
        Rc::new(RefCell::new(SerialInterface {
            rx: VecDeque::new(),
            tx: Vec::new(),
            writes: 0,
            do_read_error: false,
            do_write_error: false,
        }))
    }

    /// Bytes sent by the receiver.
    pub fn receive(&mut self, data: &[u8]) {
        self.rx.extend(data);
    }

    /// Everything the node wrote since the last call.
    pub fn take_sent(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.tx)
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn trigger_write_error(&mut self) {
        self.do_write_error = true;
    }

    pub fn trigger_read_error(&mut self) {
        self.do_read_error = true;
    }
}

impl Transport for SerialPort {
    type Error = Error;

    fn bytes_available(&mut self) -> std::io::Result<usize> {
        Ok(self.0.borrow().rx.len())
    }

    fn read_byte(&mut self) -> std::io::Result<u8> {
        let mut inner = self.0.borrow_mut();
        if inner.do_read_error {
            inner.do_read_error = false;
            return Err(Error::new(ErrorKind::Other, "IO read error"));
        }
        inner
            .rx
            .pop_front()
            .ok_or_else(|| Error::new(ErrorKind::WouldBlock, "nothing to read"))
    }

    fn write_all(&mut self, data: &[u8]) -> std::io::Result<()> {
        let mut inner = self.0.borrow_mut();
        if inner.do_write_error {
            inner.do_write_error = false;
            return Err(Error::new(ErrorKind::PermissionDenied, "IO write error"));
        }
        inner.writes += 1;
        inner.tx.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Build a request the way the receiver does, from the raw command/address byte.
pub fn raw_request(command_address: u8) -> [u8; 4] {
    let [lo, hi] = (0xFFFF - (0x04 + u16::from(command_address))).to_le_bytes();
    [0x04, command_address, lo, hi]
}

/// Check a reply against the length byte and checksum it carries.
pub fn reply_is_valid(reply: &[u8]) -> bool {
    if reply.len() < 4 || usize::from(reply[0]) != reply.len() {
        return false;
    }
    let (body, checksum) = reply.split_at(reply.len() - 2);
    let sum = body.iter().map(|&b| u16::from(b)).sum::<u16>();
    u16::from_le_bytes([checksum[0], checksum[1]]) == 0xFFFF - sum
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
