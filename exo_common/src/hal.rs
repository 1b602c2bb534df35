//! Capability traits for the supervisor's external ports.
//!
//! The four hardware seams (clock, sensors, secondary bus, actuators) and
//! the two audit-side hooks (secure element, telemetry sink) are modeled
//! as small traits so tests inject in-memory fakes and HIL builds inject
//! real drivers. The traits are deliberately thin: they capture the
//! operations the safety loop consumes, nothing about how a backend
//! provides them.
//!
//! # Timing Contracts
//!
//! | Operation | Bound | Notes |
//! |-----------|-------|-------|
//! | `Clock::now_ms` | none | ≤1 ms resolution, monotonic |
//! | sensor reads | small fraction of the 50 ms cycle | synchronous |
//! | `SecondaryBus` write / read | 50 ms each | the two permitted I²C blocks |
//! | `ActuatorOutputs` | non-blocking | must not suspend the loop |
//! | `TelemetrySink::enqueue` | non-blocking | drop instead of stalling |

use thiserror::Error;

use crate::consts::MAX_SIGNATURE_LEN;
use crate::frame::{LoadChannel, SensorFrame};

/// Secondary link failure. A single failure is transient; the watchdog
/// decides when persistence becomes a hazard.
#[derive(Debug, Clone, Error)]
pub enum LinkError {
    /// Command transmission to the secondary failed.
    #[error("secondary transmit failed: {0}")]
    Transmit(String),

    /// Response reception from the secondary failed.
    #[error("secondary receive failed: {0}")]
    Receive(String),

    /// The secondary answered with the wrong number of bytes.
    #[error("secondary frame short: expected {expected} bytes, got {got}")]
    ShortFrame {
        /// Bytes the protocol requires.
        expected: usize,
        /// Bytes actually received.
        got: usize,
    },
}

/// Monotonic millisecond clock plus the loop's delay primitive.
///
/// Consumers compare ticks with wrapping differences, so a single 32-bit
/// wrap (~49.7 days) is tolerated as long as measured intervals stay well
/// under 2³¹ ms.
pub trait Clock {
    /// Monotonically non-decreasing tick since boot [ms].
    fn now_ms(&self) -> u32;

    /// Block the calling thread for `ms` milliseconds.
    fn sleep_ms(&mut self, ms: u32);
}

/// Primary-side ADC reads of the load cells and the vertical accelerometer.
///
/// Reads may return arbitrary finite values on hardware fault and must not
/// return NaN; the hazard evaluator treats NaN as a fault regardless.
pub trait LoadSensors {
    /// Load reading [kg] for one harness channel.
    fn read_load(&mut self, channel: LoadChannel) -> f32;

    /// Vertical acceleration channel.
    fn read_accel_z(&mut self) -> f32;
}

/// Raw byte transport to the secondary MCU (I²C controller semantics).
///
/// Implementations bound each half-transaction at 50 ms.
pub trait SecondaryBus {
    /// Transmit `bytes` to the 7-bit address.
    fn write(&mut self, addr: u8, bytes: &[u8]) -> Result<(), LinkError>;

    /// Receive exactly `buf.len()` bytes from the 7-bit address.
    fn read(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), LinkError>;
}

/// Framed secondary query: one request/response exchange yielding a
/// mirrored sensor frame.
pub trait SecondaryPort {
    /// Request and decode one mirrored frame.
    fn query(&mut self) -> Result<SensorFrame, LinkError>;
}

/// The two discrete safety outputs.
///
/// Polarity is fixed at this layer: high = latch locked (harness
/// retained), high = descent enabled. Implementations must not block and
/// must not panic: a failed line write is logged by the driver, never
/// raised into the loop.
pub trait ActuatorOutputs {
    /// Drive the mechanical quick-release line.
    fn set_mech_release(&mut self, locked: bool);

    /// Drive the descent-enable line.
    fn set_descent(&mut self, enabled: bool);
}

/// Signature bytes returned by the secure element; length is opaque to the
/// core, bounded only by the envelope capacity.
pub type Signature = heapless::Vec<u8, MAX_SIGNATURE_LEN>;

/// Secure element hooks consumed by the audit path.
pub trait SecureElement {
    /// Sign `record` and persist it element-side. `None` means signing is
    /// unavailable; the caller falls back to the unsigned envelope.
    fn sign_and_store(&mut self, record: &[u8]) -> Option<Signature>;

    /// Verify a two-person operator approval blob. Consumed by
    /// provisioning flows only; no live transition is gated on it.
    fn verify_operator_approval(&mut self, blob: &[u8]) -> bool;
}

/// Outbound telemetry boundary.
///
/// `enqueue` is best-effort and non-blocking: returns false when the
/// payload was dropped (queue full or contended). Callers count drops;
/// they never retry in-cycle.
pub trait TelemetrySink {
    /// Hand one framed payload to the uploader side.
    fn enqueue(&mut self, payload: &[u8]) -> bool;
}
