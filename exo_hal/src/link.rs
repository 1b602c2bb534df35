//! Secondary-link framing.
//!
//! One query transaction: transmit the single command byte `0x10` to the
//! secondary at 7-bit address `0x30`, then receive exactly 16 bytes laid
//! out as little-endian `u32 ts_ms` followed by three little-endian
//! IEEE-754 binary32 fields `load_left`, `load_right`, `accel_z`. The
//! codec is transport-agnostic: the same framing runs over Linux
//! `i2c-dev`, the simulation bus and test fixtures.
//!
//! The mirrored `ts_ms` is the secondary's own tick. It is decoded and
//! carried in the frame but the watchdog runs on the local tick.

use exo_common::consts::{SECONDARY_FRAME_LEN, SECONDARY_I2C_ADDR, SECONDARY_QUERY_CMD};
use exo_common::frame::SensorFrame;
use exo_common::hal::{LinkError, SecondaryBus, SecondaryPort};

/// Decode a 16-byte wire frame.
pub fn decode_frame(raw: &[u8; SECONDARY_FRAME_LEN]) -> SensorFrame {
    let le_u32 = |offset: usize| {
        u32::from_le_bytes([raw[offset], raw[offset + 1], raw[offset + 2], raw[offset + 3]])
    };
    SensorFrame {
        ts_ms: le_u32(0),
        load_left: f32::from_bits(le_u32(4)),
        load_right: f32::from_bits(le_u32(8)),
        accel_z: f32::from_bits(le_u32(12)),
    }
}

/// Encode a frame into the 16-byte wire layout.
pub fn encode_frame(frame: &SensorFrame) -> [u8; SECONDARY_FRAME_LEN] {
    let mut raw = [0u8; SECONDARY_FRAME_LEN];
    raw[0..4].copy_from_slice(&frame.ts_ms.to_le_bytes());
    raw[4..8].copy_from_slice(&frame.load_left.to_le_bytes());
    raw[8..12].copy_from_slice(&frame.load_right.to_le_bytes());
    raw[12..16].copy_from_slice(&frame.accel_z.to_le_bytes());
    raw
}

/// Framed query port over a raw byte transport.
#[derive(Debug)]
pub struct SecondaryLink<B> {
    bus: B,
}

impl<B> SecondaryLink<B> {
    /// Wrap a transport.
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Access the underlying transport.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}

impl<B: SecondaryBus> SecondaryPort for SecondaryLink<B> {
    fn query(&mut self) -> Result<SensorFrame, LinkError> {
        self.bus
            .write(SECONDARY_I2C_ADDR, &[SECONDARY_QUERY_CMD])?;
        let mut raw = [0u8; SECONDARY_FRAME_LEN];
        self.bus.read(SECONDARY_I2C_ADDR, &mut raw)?;
        Ok(decode_frame(&raw))
    }
}
