//! Sensor snapshot types shared by the primary and secondary sides.

use serde::{Deserialize, Serialize};

/// Load-cell channel selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LoadChannel {
    /// Left harness load cell.
    Left = 0,
    /// Right harness load cell.
    Right = 1,
}

impl LoadChannel {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Left),
            1 => Some(Self::Right),
            _ => None,
        }
    }
}

/// One immutable sensor snapshot.
///
/// Created by the sensor port (primary side) or decoded from the secondary
/// link (mirror side); never mutated after construction. Loads may be
/// negative under sensor drift and may legitimately exceed the overload
/// threshold. `ts_ms` is the local monotonic tick at capture time for
/// primary frames and the secondary's own tick for mirrored frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorFrame {
    /// Monotonic capture tick [ms].
    pub ts_ms: u32,
    /// Left load cell [kg].
    pub load_left: f32,
    /// Right load cell [kg].
    pub load_right: f32,
    /// Vertical acceleration channel.
    pub accel_z: f32,
}

impl SensorFrame {
    /// Load reading for the given channel.
    #[inline]
    pub const fn load(&self, channel: LoadChannel) -> f32 {
        match channel {
            LoadChannel::Left => self.load_left,
            LoadChannel::Right => self.load_right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_channel_roundtrip() {
        for v in 0..=1u8 {
            let ch = LoadChannel::from_u8(v).unwrap();
            assert_eq!(ch as u8, v);
        }
        assert!(LoadChannel::from_u8(2).is_none());
    }

    #[test]
    fn load_accessor_selects_channel() {
        let frame = SensorFrame {
            ts_ms: 100,
            load_left: 12.5,
            load_right: 30.0,
            accel_z: 0.98,
        };
        assert_eq!(frame.load(LoadChannel::Left), 12.5);
        assert_eq!(frame.load(LoadChannel::Right), 30.0);
    }
}
