// src/registers.rs
//! INA260 register map and pure codec
//!
//! Everything in this module is stateless: register addresses, the
//! configuration word layout, engineering-unit scaling, and the wire
//! byte-order conversion. No I/O happens here.

use serde::{Deserialize, Serialize};

/// Manufacturer ID register value for all Texas Instruments parts.
pub const MANUFACTURER_ID: u16 = 0x5449;

/// Die ID register value for the INA260.
pub const DIE_ID: u16 = 0x2270;

/// In-band marker the transport layer reports for a failed read.
///
/// This overloads the data range: a genuine +40958.75 mA reading encodes to
/// the same word. The sample store records validity out-of-band, so exported
/// data never depends on this value; it only drives mid-run recovery.
pub const SENTINEL_INVALID: u16 = 0x7FFF;

/// Register addresses of the INA260.
///
/// Each register is 16 bits wide and transferred big-endian on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    /// __R/W__ - Operating mode, averaging, and conversion times.
    Config = 0x00,
    /// __R__ - Shunt current, two's complement, 1.25 mA/bit.
    Current = 0x01,
    /// __R__ - Bus voltage, 1.25 mV/bit.
    BusVoltage = 0x02,
    /// __R__ - Power, unsigned, 10 mW/bit.
    Power = 0x03,
    /// __R/W__ - Alert configuration and conversion-ready flag.
    MaskEnable = 0x06,
    /// __R/W__ - Alert comparison limit.
    AlertLimit = 0x07,
    /// __R__ - Always [`MANUFACTURER_ID`].
    ManufacturerId = 0xFE,
    /// __R__ - Always [`DIE_ID`].
    DieId = 0xFF,
}

impl From<Register> for u8 {
    fn from(value: Register) -> Self {
        value as u8
    }
}

// Config register bit layout.
const RST_BIT: u16 = 15;
const MODE_CONTINUOUS_BIT: u16 = 2;
const MODE_BUS_VOLTAGE_BIT: u16 = 1;
const MODE_SHUNT_CURRENT_BIT: u16 = 0;
const AVG_SHIFT: u16 = 9;
const VBUSCT_SHIFT: u16 = 6;
const ISHCT_SHIFT: u16 = 3;

/// Bits 14:13 read back as set regardless of what was written; the encoder
/// sets them so a read-back comparison of the whole word is exact.
const CONFIG_RESERVED: u16 = (1 << 14) | (1 << 13);

/// Conversion-time buckets supported by the chip.
///
/// The 3-bit code is written identically into the shunt-current field
/// (bits 5:3) and the bus-voltage field (bits 8:6).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionTime {
    /// 140 µs, the power-on default and the fastest the chip supports.
    Us140 = 0,
    /// 204 µs
    Us204 = 1,
    /// 332 µs
    Us332 = 2,
    /// 588 µs
    Us588 = 3,
    /// 1.1 ms
    Us1100 = 4,
    /// 2.116 ms
    Us2116 = 5,
    /// 4.156 ms
    Us4156 = 6,
    /// 8.244 ms
    Us8244 = 7,
}

impl ConversionTime {
    /// 3-bit field code.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Conversion duration in microseconds.
    pub fn micros(self) -> u32 {
        match self {
            ConversionTime::Us140 => 140,
            ConversionTime::Us204 => 204,
            ConversionTime::Us332 => 332,
            ConversionTime::Us588 => 588,
            ConversionTime::Us1100 => 1100,
            ConversionTime::Us2116 => 2116,
            ConversionTime::Us4156 => 4156,
            ConversionTime::Us8244 => 8244,
        }
    }

    /// Bucket for a requested duration; anything that is not one of the
    /// eight fixed durations falls back to the fastest bucket.
    pub fn from_micros(micros: u32) -> Self {
        match micros {
            204 => ConversionTime::Us204,
            332 => ConversionTime::Us332,
            588 => ConversionTime::Us588,
            1100 => ConversionTime::Us1100,
            2116 => ConversionTime::Us2116,
            4156 => ConversionTime::Us4156,
            8244 => ConversionTime::Us8244,
            _ => ConversionTime::Us140,
        }
    }

    /// Bucket for a raw 3-bit field code; out-of-range codes fall back to
    /// the fastest bucket.
    pub fn from_code(code: u16) -> Self {
        match code & 0x07 {
            1 => ConversionTime::Us204,
            2 => ConversionTime::Us332,
            3 => ConversionTime::Us588,
            4 => ConversionTime::Us1100,
            5 => ConversionTime::Us2116,
            6 => ConversionTime::Us4156,
            7 => ConversionTime::Us8244,
            _ => ConversionTime::Us140,
        }
    }
}

/// Averaging modes (AVG field, bits 11:9).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Averaging {
    /// No averaging, every conversion is reported.
    X1 = 0,
    /// 4 conversions per reported value.
    X4 = 1,
    /// 16 conversions per reported value.
    X16 = 2,
    /// 64 conversions per reported value.
    X64 = 3,
    /// 128 conversions per reported value.
    X128 = 4,
    /// 256 conversions per reported value.
    X256 = 5,
    /// 512 conversions per reported value.
    X512 = 6,
    /// 1024 conversions per reported value.
    X1024 = 7,
}

impl Averaging {
    /// 3-bit field code.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Number of conversions averaged per reported value.
    pub fn sample_count(self) -> u16 {
        match self {
            Averaging::X1 => 1,
            Averaging::X4 => 4,
            Averaging::X16 => 16,
            Averaging::X64 => 64,
            Averaging::X128 => 128,
            Averaging::X256 => 256,
            Averaging::X512 => 512,
            Averaging::X1024 => 1024,
        }
    }

    /// Mode for a requested average length; unsupported lengths fall back
    /// to no averaging.
    pub fn from_samples(samples: u16) -> Self {
        match samples {
            4 => Averaging::X4,
            16 => Averaging::X16,
            64 => Averaging::X64,
            128 => Averaging::X128,
            256 => Averaging::X256,
            512 => Averaging::X512,
            1024 => Averaging::X1024,
            _ => Averaging::X1,
        }
    }
}

/// Desired operating state of one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfiguration {
    /// Enable shunt-current conversions.
    pub measure_current: bool,
    /// Enable bus-voltage conversions.
    pub measure_voltage: bool,
    /// Continuous conversion mode; `false` selects triggered mode.
    pub continuous: bool,
    /// Conversions averaged per reported value.
    pub averaging: Averaging,
    /// Conversion time for both measurement channels.
    pub conversion_time: ConversionTime,
}

impl Default for DeviceConfiguration {
    fn default() -> Self {
        Self {
            measure_current: true,
            measure_voltage: false,
            continuous: true,
            averaging: Averaging::X1,
            conversion_time: ConversionTime::Us140,
        }
    }
}

/// The config-register word that resets the device.
pub const fn reset_word() -> u16 {
    1 << RST_BIT
}

/// Encode a [`DeviceConfiguration`] into the config register word.
///
/// If neither measurement channel is enabled the current channel is enabled
/// instead; a device that converts nothing is never written.
pub fn encode_config(cfg: &DeviceConfiguration) -> u16 {
    let measure_current = cfg.measure_current || !cfg.measure_voltage;

    let mut word = CONFIG_RESERVED;
    if measure_current {
        word |= 1 << MODE_SHUNT_CURRENT_BIT;
    }
    if cfg.measure_voltage {
        word |= 1 << MODE_BUS_VOLTAGE_BIT;
    }
    if cfg.continuous {
        word |= 1 << MODE_CONTINUOUS_BIT;
    }
    word |= cfg.averaging.code() << AVG_SHIFT;
    word |= cfg.conversion_time.code() << VBUSCT_SHIFT;
    word |= cfg.conversion_time.code() << ISHCT_SHIFT;
    word
}

/// Current register value in milliamps.
///
/// Raw value is two's complement at 1.25 mA/bit; rounding is half away from
/// zero.
pub fn decode_current(raw: u16) -> i32 {
    let signed = raw as i16;
    (f64::from(signed) * 1.25).round() as i32
}

/// Bus-voltage register value in millivolts.
///
/// The hardware never reports a negative bus voltage, but the signed
/// interpretation is kept identical to [`decode_current`].
pub fn decode_voltage(raw: u16) -> i32 {
    let signed = raw as i16;
    (f64::from(signed) * 1.25).round() as i32
}

/// Power register value in milliwatts, unsigned at 10 mW/bit.
pub fn decode_power(raw: u16) -> u32 {
    u32::from(raw) * 10
}

/// Host word from the big-endian wire representation.
///
/// SMBus word transactions are little-endian, the INA260 talks big-endian;
/// every transaction crosses this boundary exactly once, here.
pub fn from_wire(word: u16) -> u16 {
    word.swap_bytes()
}

/// Big-endian wire representation of a host word.
pub fn to_wire(word: u16) -> u16 {
    word.swap_bytes()
}
