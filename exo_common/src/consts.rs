//! System-wide constants for the EXO workspace.
//!
//! Single source of truth for tunables, wire-protocol constants and
//! buffer capacities. Imported by all crates; no duplication permitted.

use static_assertions::const_assert;

/// Node identifier stamped into every audit record.
pub const NODE_ID: &str = "suit-01";

// ─── Tunables ───────────────────────────────────────────────────────

/// Supervisor cycle period [ms].
pub const SAMPLE_INTERVAL_MS: u32 = 50;

/// Secondary MCU silence tolerated before the watchdog trips [ms].
pub const HEARTBEAT_TIMEOUT_MS: u32 = 1000;

/// Per-channel overload threshold [kg]. Strict: a reading above this trips.
pub const LOAD_THRESHOLD_KG: f32 = 50.0;

/// Allowed primary/secondary divergence as a fraction of the larger reading.
pub const SENSOR_MISMATCH_RATIO: f32 = 0.20;

/// Mismatch denominator floor [kg], so near-zero loads don't divide away.
pub const MISMATCH_DENOM_FLOOR_KG: f32 = 1.0;

/// Load decrease rate that signals a harness failure or free fall [kg/s].
pub const DROP_RATE_THRESHOLD_KG_S: f32 = 10.0;

/// Post-event yield so the telemetry queue can drain [ms].
pub const EVENT_DRAIN_MS: u32 = 100;

// ─── Secondary link protocol ────────────────────────────────────────

/// 7-bit I²C address of the secondary MCU.
pub const SECONDARY_I2C_ADDR: u8 = 0x30;

/// Command byte requesting a mirrored sensor frame.
pub const SECONDARY_QUERY_CMD: u8 = 0x10;

/// Wire size of a mirrored frame: LE u32 ts_ms + three LE f32 fields.
pub const SECONDARY_FRAME_LEN: usize = 16;

/// Bound on each I²C half-transaction [ms].
pub const LINK_TIMEOUT_MS: u32 = 50;

// ─── Audit / telemetry ──────────────────────────────────────────────

/// Capacity of the canonical audit record buffer [bytes].
pub const AUDIT_RECORD_CAP: usize = 256;

/// Capacity of the telemetry payload buffer (flag + record + signature) [bytes].
pub const TELEMETRY_PAYLOAD_CAP: usize = 512;

/// Upper bound on a secure-element signature [bytes].
pub const MAX_SIGNATURE_LEN: usize = 255;

/// Envelope flag byte: record carries a signature.
pub const ENVELOPE_SIGNED: u8 = 0x00;

/// Envelope flag byte: unsigned fallback.
pub const ENVELOPE_UNSIGNED: u8 = 0xFF;

/// Bounded depth of the outbound telemetry queue [payloads].
pub const TELEMETRY_QUEUE_DEPTH: usize = 64;

// The envelope must always have room for flag byte + full record + signature.
const_assert!(1 + AUDIT_RECORD_CAP + MAX_SIGNATURE_LEN <= TELEMETRY_PAYLOAD_CAP);
const_assert!(SECONDARY_FRAME_LEN == 4 + 3 * 4);
const_assert!(HEARTBEAT_TIMEOUT_MS > SAMPLE_INTERVAL_MS);
