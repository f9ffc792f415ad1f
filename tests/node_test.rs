mod common;

use common::{init_logging, raw_request, reply_is_valid, SerialInterface, SerialPort};
use ibus_telemetry::frame::request;
use ibus_telemetry::{addr, Command, Error, PollStatus, SensorType, SerialNode};

#[test]
fn type_request_for_internal_voltage() {
    let serial_sim = SerialInterface::new();
    let mut node = SerialNode::new(SerialPort::new(&serial_sim));

    assert_eq!(node.set_sensor(SensorType::INTERNAL_VOLTAGE, 508), Ok(addr(1)));

    serial_sim.borrow_mut().receive(&raw_request(0x91));
    assert_eq!(
        node.poll().unwrap(),
        PollStatus::Responded {
            command: Command::Type,
            address: addr(1)
        }
    );

    let [c1, c2] = (0xFFFF - (0x06 + 0x91 + 0x00 + 0x02u16)).to_le_bytes();
    assert_eq!(
        serial_sim.borrow_mut().take_sent(),
        [0x06, 0x91, 0x00, 0x02, c1, c2]
    );
    assert_eq!(node.request_count(), 1);
    assert_eq!(node.response_count(), 1);
}

#[test]
fn discover_without_sensor_is_silent() {
    let serial_sim = SerialInterface::new();
    let mut node = SerialNode::new(SerialPort::new(&serial_sim));
    node.set_temperature(21.5).unwrap();

    serial_sim.borrow_mut().receive(&raw_request(0x82));
    assert_eq!(node.poll().unwrap(), PollStatus::Ignored);
    assert_eq!(serial_sim.borrow().writes(), 0);
    assert!(!node.is_discovered());
    assert_eq!(node.request_count(), 1);
    assert_eq!(node.response_count(), 0);
}

#[test]
fn short_buffer_is_a_no_op() {
    let serial_sim = SerialInterface::new();
    let mut node = SerialNode::new(SerialPort::new(&serial_sim));
    node.set_rpm(4294).unwrap();

    serial_sim.borrow_mut().receive(&raw_request(0xA1)[..3]);
    for _ in 0..5 {
        assert_eq!(node.poll().unwrap(), PollStatus::Idle);
    }
    assert_eq!(serial_sim.borrow().pending(), 3);
    assert_eq!(serial_sim.borrow().writes(), 0);
    assert_eq!(node.request_count(), 0);
}

#[test]
fn corrupted_checksum_is_dropped() {
    let serial_sim = SerialInterface::new();
    let mut node = SerialNode::new(SerialPort::new(&serial_sim));
    node.set_rpm(4294).unwrap();

    for corrupt in 2..4 {
        let mut frame = raw_request(0xA1);
        frame[corrupt] ^= 0x10;
        serial_sim.borrow_mut().receive(&frame);
        assert_eq!(node.poll().unwrap(), PollStatus::Ignored);
    }
    // wrong length byte, checksum fixed up for it
    serial_sim.borrow_mut().receive(&[0x05, 0xA1, 0x59, 0xFF]);
    assert_eq!(node.poll().unwrap(), PollStatus::Ignored);

    assert_eq!(serial_sim.borrow().writes(), 0);
    assert_eq!(node.request_count(), 0);
    assert_eq!(node.response_count(), 0);
}

#[test]
fn addresses_follow_order_of_first_use() {
    let serial_sim = SerialInterface::new();
    let mut node = SerialNode::new(SerialPort::new(&serial_sim));

    assert_eq!(node.set_external_voltage(12.5), Ok(addr(1)));
    assert_eq!(node.set_rpm(3000), Ok(addr(2)));
    assert_eq!(node.set_internal_voltage(5.0), Ok(addr(3)));
    assert_eq!(node.set_external_voltage(11.0), Ok(addr(1)));
    assert_eq!(node.set_temperature(20.0), Ok(addr(4)));
    assert_eq!(node.set_rpm(3100), Ok(addr(2)));

    let expected_types = [
        SensorType::EXTERNAL_VOLTAGE,
        SensorType::RPM,
        SensorType::INTERNAL_VOLTAGE,
        SensorType::TEMPERATURE,
    ];
    for (n, sensor_type) in expected_types.iter().enumerate() {
        let address = addr(n as u8 + 1);
        serial_sim
            .borrow_mut()
            .receive(&request(Command::Type, address));
        node.poll().unwrap();
        let sent = serial_sim.borrow_mut().take_sent();
        assert_eq!(sent[2], **sensor_type);
        assert_eq!(sent[3], 0x02);
    }

    serial_sim
        .borrow_mut()
        .receive(&request(Command::Measurement, addr(1)));
    node.poll().unwrap();
    assert_eq!(&serial_sim.borrow_mut().take_sent()[..4], &[0x06, 0xA1, 0x4C, 0x04]);
}

#[test]
fn fifth_sensor_type_is_rejected() {
    let serial_sim = SerialInterface::new();
    let mut node = SerialNode::new(SerialPort::new(&serial_sim));
    for tag in 0..4u8 {
        node.set_sensor(tag, 0).unwrap();
    }
    assert_eq!(
        node.set_sensor(0x41u8, 100),
        Err(Error::TableFull {
            sensor_type: SensorType(0x41)
        })
    );
    assert_eq!(node.sensor_count(), 4);
    for tag in 0..4u8 {
        assert_eq!(node.set_sensor(tag, 100), Ok(addr(tag + 1)));
    }
}

#[test]
fn every_reply_carries_a_valid_checksum() {
    let serial_sim = SerialInterface::new();
    let mut node = SerialNode::new(SerialPort::new(&serial_sim));
    node.set_internal_voltage(5.08).unwrap();
    node.set_temperature(85.3).unwrap();
    node.set_rpm(u16::MAX).unwrap();
    node.set_external_voltage(16.8).unwrap();

    for command in [Command::Discover, Command::Type, Command::Measurement].iter() {
        for a in 1..=4 {
            serial_sim.borrow_mut().receive(&request(*command, addr(a)));
            assert!(matches!(node.poll(), Ok(PollStatus::Responded { .. })));
            let sent = serial_sim.borrow_mut().take_sent();
            assert!(reply_is_valid(&sent), "invalid reply {:02X?}", sent);
            assert_eq!(sent[1], command.with_address(addr(a)));
        }
    }
    assert_eq!(node.request_count(), 12);
    assert_eq!(node.response_count(), 12);
}

#[test]
fn receiver_discovery_sweep() {
    init_logging();
    let serial_sim = SerialInterface::new();
    let mut node = SerialNode::new(SerialPort::new(&serial_sim));
    node.set_debug(true);
    node.set_internal_voltage(5.0).unwrap();
    node.set_temperature(25.0).unwrap();

    // the receiver probes every address, line noise trails some requests
    let mut answered = Vec::new();
    for a in 1..=15u8 {
        serial_sim.borrow_mut().receive(&raw_request(0x80 | a));
        serial_sim.borrow_mut().receive(&[0x00, 0x55]);
        if let PollStatus::Responded { address, .. } = node.poll().unwrap() {
            answered.push(*address);
        }
        assert_eq!(serial_sim.borrow().pending(), 0);
    }
    assert_eq!(answered, [1, 2]);
    assert!(node.is_discovered());
    assert_eq!(node.request_count(), 15);
    assert_eq!(node.response_count(), 2);
    assert_eq!(
        serial_sim.borrow_mut().take_sent(),
        [raw_request(0x81), raw_request(0x82)].concat()
    );
}

#[test]
fn nodes_do_not_share_state() {
    let sim_a = SerialInterface::new();
    let sim_b = SerialInterface::new();
    let mut node_a = SerialNode::new(SerialPort::new(&sim_a));
    let mut node_b = SerialNode::new(SerialPort::new(&sim_b));

    node_a.set_rpm(1000).unwrap();
    node_b.set_temperature(0.0).unwrap();
    node_b.set_rpm(2000).unwrap();

    sim_a.borrow_mut().receive(&raw_request(0xA1));
    sim_b.borrow_mut().receive(&raw_request(0xA2));
    node_a.poll().unwrap();
    node_b.poll().unwrap();

    assert_eq!(&sim_a.borrow_mut().take_sent()[..4], &[0x06, 0xA1, 0xE8, 0x03]);
    assert_eq!(&sim_b.borrow_mut().take_sent()[..4], &[0x06, 0xA2, 0xD0, 0x07]);
    assert_eq!((node_a.sensor_count(), node_b.sensor_count()), (1, 2));
    assert_eq!((node_a.response_count(), node_b.response_count()), (1, 1));
}

#[test]
fn transport_errors_are_returned() {
    let serial_sim = SerialInterface::new();
    let mut node = SerialNode::new(SerialPort::new(&serial_sim));
    node.set_rpm(1).unwrap();

    serial_sim.borrow_mut().receive(&raw_request(0xA1));
    serial_sim.borrow_mut().trigger_write_error();
    assert!(node.poll().is_err());
    assert_eq!(node.response_count(), 0);

    serial_sim.borrow_mut().receive(&raw_request(0xA1));
    serial_sim.borrow_mut().trigger_read_error();
    assert!(node.poll().is_err());

    // the next request goes through again
    serial_sim.borrow_mut().receive(&raw_request(0xA1));
    node.clear_input().unwrap();
    serial_sim.borrow_mut().receive(&raw_request(0xA1));
    assert!(matches!(node.poll(), Ok(PollStatus::Responded { .. })));
    assert_eq!(node.response_count(), 1);
}
