//! Conversion from real-world units to raw sensor values.
//!
//! All conversions truncate toward zero and saturate to the `u16` range,
//! so negative and NaN inputs become 0.

/// Volts to 0.01 V units.
pub fn volts_to_raw(volts: f32) -> u16 {
    (volts * 100.0) as u16
}

/// Degrees Celsius to 0.1 °C units counted from -40 °C.
pub fn celsius_to_raw(celsius: f32) -> u16 {
    ((celsius + 40.0) * 10.0) as u16
}

/// RPM are sent unscaled.
pub const fn rpm_to_raw(rpm: u16) -> u16 {
    rpm
}
