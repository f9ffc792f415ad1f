//! Present four simulated sensors on an iBUS sensor port.
//!
//! Usage: `ibus_sensor [serial port]`, run with `RUST_LOG=debug` to see
//! every frame.

use anyhow::{Context, Result};
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use ibus_telemetry::{SerialNode, Transport, BAUD_RATE};

struct Port(Box<dyn serialport::SerialPort>);

impl Transport for Port {
    type Error = io::Error;

    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.0.bytes_to_read()? as usize)
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        let mut buf = [0; 1];
        self.0.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        Write::write_all(&mut self.0, data)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(&mut self.0)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args();
    args.next(); // Skip program name
    let port = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());

    let serial = serialport::new(&port, BAUD_RATE)
        .timeout(Duration::from_millis(10))
        .open()
        .with_context(|| format!("Failed to open serial port {}", port))?;

    let mut node = SerialNode::new(Port(serial));
    node.set_debug(log::log_enabled!(log::Level::Debug));
    // line garbage from power up
    node.clear_input()?;

    let start = Instant::now();
    let mut last_update = start;
    let mut last_report = start;
    let mut tick = 0u16;
    update_sensors(&mut node, tick)?;

    loop {
        node.poll().context("Serial port failed")?;

        if last_update.elapsed() >= Duration::from_millis(500) {
            last_update = Instant::now();
            tick = tick.wrapping_add(1);
            update_sensors(&mut node, tick)?;
        }
        if last_report.elapsed() >= Duration::from_secs(5) {
            last_report = Instant::now();
            log::info!(
                "requests: {}, responses: {}, discovered: {}",
                node.request_count(),
                node.response_count(),
                node.is_discovered()
            );
        }
        std::thread::sleep(Duration::from_micros(200));
    }
}

fn update_sensors(node: &mut SerialNode<Port>, tick: u16) -> Result<()> {
    let wave = f32::from(tick % 20) / 20.0;
    node.set_internal_voltage(5.0 + 0.1 * wave)?;
    node.set_external_voltage(12.6 - wave)?;
    node.set_temperature(21.0 + 5.0 * wave)?;
    node.set_rpm(4000 + (tick % 10) * 50)?;
    Ok(())
}
