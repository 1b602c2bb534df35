//! Pure hazard evaluation.
//!
//! Side-effect-free predicates over sensor frames plus the heartbeat
//! tracker for the secondary watchdog. [`detect`] collects every predicate
//! that holds for an iteration into a [`HazardFlags`] set;
//! [`HazardFlags::highest_priority`] maps the set to the single winning
//! [`Hazard`]. The priority ordering guarantees a vanished secondary is
//! reported as a watchdog timeout, never misread as a drop.

use bitflags::bitflags;

use crate::consts::{
    DROP_RATE_THRESHOLD_KG_S, HEARTBEAT_TIMEOUT_MS, LOAD_THRESHOLD_KG, MISMATCH_DENOM_FLOOR_KG,
    SENSOR_MISMATCH_RATIO,
};
use crate::event::ReasonTag;
use crate::frame::SensorFrame;

/// One classified hazard, ordered by priority (highest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hazard {
    /// Secondary MCU silent beyond [`HEARTBEAT_TIMEOUT_MS`].
    WatchdogExpired,
    /// Primary and secondary load readings diverged (or NaN fault).
    SensorMismatch,
    /// Load above [`LOAD_THRESHOLD_KG`] on either channel.
    Overload,
    /// Load falling faster than [`DROP_RATE_THRESHOLD_KG_S`].
    SuddenDrop,
}

impl Hazard {
    /// Reason tag stamped into audit records for this hazard.
    #[inline]
    pub const fn reason_tag(&self) -> ReasonTag {
        match self {
            Self::WatchdogExpired => ReasonTag::SecondaryWatchdogTimeout,
            Self::SensorMismatch => ReasonTag::SensorMismatch,
            Self::Overload => ReasonTag::Overload,
            Self::SuddenDrop => ReasonTag::SuddenDrop,
        }
    }
}

bitflags! {
    /// Set of hazard predicates that fired within one iteration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HazardFlags: u8 {
        /// Secondary watchdog timeout.
        const WATCHDOG_EXPIRED = 0x01;
        /// Primary/secondary mismatch.
        const SENSOR_MISMATCH  = 0x02;
        /// Overload on either channel.
        const OVERLOAD         = 0x04;
        /// Sudden load drop.
        const SUDDEN_DROP      = 0x08;
    }
}

impl HazardFlags {
    /// The single hazard that determines this iteration's action.
    ///
    /// Priority: watchdog → mismatch → overload → sudden drop. Checks
    /// below the winner are disregarded for the iteration.
    #[inline]
    pub const fn highest_priority(self) -> Option<Hazard> {
        if self.contains(Self::WATCHDOG_EXPIRED) {
            Some(Hazard::WatchdogExpired)
        } else if self.contains(Self::SENSOR_MISMATCH) {
            Some(Hazard::SensorMismatch)
        } else if self.contains(Self::OVERLOAD) {
            Some(Hazard::Overload)
        } else if self.contains(Self::SUDDEN_DROP) {
            Some(Hazard::SuddenDrop)
        } else {
            None
        }
    }
}

impl Default for HazardFlags {
    fn default() -> Self {
        Self::empty()
    }
}

// ─── Heartbeat tracker ──────────────────────────────────────────────

/// Liveness state for the secondary MCU.
///
/// Owned exclusively by the supervisor loop; updated only on a successful
/// secondary query. Comparisons use wrapping differences so a single
/// 32-bit tick wrap (~49.7 days) is tolerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatTracker {
    last_secondary_ok_ms: u32,
}

impl HeartbeatTracker {
    /// Start the tracker at the boot tick so the watchdog cannot trip
    /// before the secondary had a full timeout window to respond.
    #[inline]
    pub const fn new(now_ms: u32) -> Self {
        Self {
            last_secondary_ok_ms: now_ms,
        }
    }

    /// Record a successful secondary read at the local tick.
    #[inline]
    pub fn mark_ok(&mut self, now_ms: u32) {
        self.last_secondary_ok_ms = now_ms;
    }

    /// True iff the secondary has been silent longer than the timeout.
    #[inline]
    pub fn expired(&self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.last_secondary_ok_ms) > HEARTBEAT_TIMEOUT_MS
    }

    /// Local tick of the last successful secondary read.
    #[inline]
    pub const fn last_ok_ms(&self) -> u32 {
        self.last_secondary_ok_ms
    }
}

// ─── Predicates ─────────────────────────────────────────────────────

/// Relative divergence check between the primary frame and the mirror.
///
/// Per load channel: mismatch iff `|a - b| > ratio * max(|a|, |b|, 1.0)`.
/// NaN in either operand is a sensor fault and forces a mismatch. The
/// accel channel is not cross-checked.
pub fn sensor_mismatch(primary: &SensorFrame, mirror: &SensorFrame) -> bool {
    let pairs = [
        (primary.load_left, mirror.load_left),
        (primary.load_right, mirror.load_right),
    ];
    for (a, b) in pairs {
        if a.is_nan() || b.is_nan() {
            return true;
        }
        let denom = a.abs().max(b.abs()).max(MISMATCH_DENOM_FLOOR_KG);
        if (a - b).abs() > SENSOR_MISMATCH_RATIO * denom {
            return true;
        }
    }
    false
}

/// Strict overload check on either load channel.
///
/// NaN would compare false under IEEE rules, so it is handled explicitly:
/// an unreadable load cell counts as overloaded.
pub fn overload(frame: &SensorFrame) -> bool {
    let hot = |kg: f32| kg.is_nan() || kg > LOAD_THRESHOLD_KG;
    hot(frame.load_left) || hot(frame.load_right)
}

/// Per-channel load decrease rate check against the previous accepted frame.
///
/// Returns false without a previous frame or with a non-positive dt.
/// A rising load never triggers.
pub fn sudden_drop(prev: Option<&SensorFrame>, cur: &SensorFrame) -> bool {
    let Some(prev) = prev else {
        return false;
    };
    let dt_s = cur.ts_ms.wrapping_sub(prev.ts_ms) as f32 / 1000.0;
    if dt_s <= 0.0 {
        return false;
    }
    let dropping = |was: f32, is: f32| (was - is) / dt_s > DROP_RATE_THRESHOLD_KG_S;
    dropping(prev.load_left, cur.load_left) || dropping(prev.load_right, cur.load_right)
}

/// Watchdog predicate over the tracker.
#[inline]
pub fn watchdog_expired(tracker: &HeartbeatTracker, now_ms: u32) -> bool {
    tracker.expired(now_ms)
}

/// Run every predicate for one iteration and collect the fired set.
///
/// `mirror` is the most recently accepted secondary frame; until one has
/// ever been received the mismatch check is skipped (the watchdog bounds
/// how long that grace can last).
pub fn detect(
    prev: Option<&SensorFrame>,
    primary: &SensorFrame,
    mirror: Option<&SensorFrame>,
    tracker: &HeartbeatTracker,
    now_ms: u32,
) -> HazardFlags {
    let mut flags = HazardFlags::empty();
    if watchdog_expired(tracker, now_ms) {
        flags |= HazardFlags::WATCHDOG_EXPIRED;
    }
    if let Some(mirror) = mirror {
        if sensor_mismatch(primary, mirror) {
            flags |= HazardFlags::SENSOR_MISMATCH;
        }
    }
    if overload(primary) {
        flags |= HazardFlags::OVERLOAD;
    }
    if sudden_drop(prev, primary) {
        flags |= HazardFlags::SUDDEN_DROP;
    }
    flags
}
