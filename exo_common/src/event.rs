//! Audit event vocabulary.
//!
//! Every supervisor decision is recorded as an [`AuditEvent`] with a kind
//! and reason drawn from closed sets. The wire strings are the canonical
//! record vocabulary consumed by the telemetry collectors; they must not
//! change without coordinating with the fleet side.

use crate::frame::SensorFrame;

/// Audit event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventKind {
    /// Mechanical quick-release latch commanded.
    MechRelease = 0,
    /// Descent actuator commanded.
    Descent = 1,
    /// Periodic liveness record from a hazard-free iteration.
    Heartbeat = 2,
    /// FAILSAFE entered or re-asserted.
    Failsafe = 3,
    /// EMERGENCY_DESCENT entered or re-asserted.
    EmergencyDescent = 4,
}

impl EventKind {
    /// Canonical record string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MechRelease => "MECH_RELEASE",
            Self::Descent => "DESCENT",
            Self::Heartbeat => "HEARTBEAT",
            Self::Failsafe => "FAILSAFE",
            Self::EmergencyDescent => "EMERGENCY_DESCENT",
        }
    }
}

/// Audit event reason tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReasonTag {
    /// Hazard-free iteration.
    Ok = 0,
    /// Latch commanded to retain the harness.
    Locked = 1,
    /// Latch commanded to release the harness.
    Released = 2,
    /// Descent actuator enabled.
    Enabled = 3,
    /// Descent actuator disabled.
    Disabled = 4,
    /// Secondary MCU silent beyond the heartbeat timeout.
    SecondaryWatchdogTimeout = 5,
    /// Primary/secondary load readings diverged.
    SensorMismatch = 6,
    /// Load above threshold on either channel.
    Overload = 7,
    /// Load falling faster than the drop-rate threshold.
    SuddenDrop = 8,
}

impl ReasonTag {
    /// Canonical record string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Locked => "locked",
            Self::Released => "released",
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::SecondaryWatchdogTimeout => "secondary_watchdog_timeout",
            Self::SensorMismatch => "sensor_mismatch",
            Self::Overload => "overload",
            Self::SuddenDrop => "sudden_drop",
        }
    }
}

/// One audit record, prior to serialization and signing.
///
/// Actuator events carry no frame (the record then shows the
/// `[-1.00,-1.00]` / `0.000` placeholders); heartbeat and state events
/// attach the primary frame of the iteration that produced them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuditEvent {
    /// Monotonic tick at emission time [ms].
    pub ts_ms: u32,
    /// Event kind.
    pub kind: EventKind,
    /// Reason tag.
    pub reason: ReasonTag,
    /// Primary frame for sensor-bearing events.
    pub frame: Option<SensorFrame>,
}

impl AuditEvent {
    /// Frameless event (actuator changes).
    #[inline]
    pub const fn new(ts_ms: u32, kind: EventKind, reason: ReasonTag) -> Self {
        Self {
            ts_ms,
            kind,
            reason,
            frame: None,
        }
    }

    /// Attach the iteration's primary frame.
    #[inline]
    pub const fn with_frame(mut self, frame: SensorFrame) -> Self {
        self.frame = Some(frame);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_strings_are_canonical() {
        assert_eq!(EventKind::MechRelease.as_str(), "MECH_RELEASE");
        assert_eq!(EventKind::Descent.as_str(), "DESCENT");
        assert_eq!(EventKind::Heartbeat.as_str(), "HEARTBEAT");
        assert_eq!(EventKind::Failsafe.as_str(), "FAILSAFE");
        assert_eq!(EventKind::EmergencyDescent.as_str(), "EMERGENCY_DESCENT");
    }

    #[test]
    fn reason_tag_strings_are_canonical() {
        assert_eq!(
            ReasonTag::SecondaryWatchdogTimeout.as_str(),
            "secondary_watchdog_timeout"
        );
        assert_eq!(ReasonTag::SensorMismatch.as_str(), "sensor_mismatch");
        assert_eq!(ReasonTag::Overload.as_str(), "overload");
        assert_eq!(ReasonTag::SuddenDrop.as_str(), "sudden_drop");
        assert_eq!(ReasonTag::Ok.as_str(), "ok");
    }

    #[test]
    fn builder_attaches_frame() {
        let frame = SensorFrame {
            ts_ms: 10,
            load_left: 1.0,
            load_right: 2.0,
            accel_z: 0.9,
        };
        let ev = AuditEvent::new(10, EventKind::Heartbeat, ReasonTag::Ok);
        assert!(ev.frame.is_none());
        let ev = ev.with_frame(frame);
        assert_eq!(ev.frame, Some(frame));
    }
}
