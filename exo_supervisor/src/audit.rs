//! Audit sink.
//!
//! Serializes every [`AuditEvent`] into the canonical single-line record,
//! asks the secure element to sign it, frames the result into the
//! telemetry envelope and hands it to the uploader queue. All buffers are
//! fixed-capacity stack containers; nothing on this path allocates or
//! blocks. Signing failure falls back to the unsigned envelope; buffer
//! overflow substitutes an unsigned `TRUNCATED` record. Neither fault
//! alters supervisor state.
//!
//! Envelope framing (read by the fleet collectors):
//! `flag_byte || record_bytes || signature_bytes`, flag `0x00` = signed,
//! `0xFF` = unsigned fallback.

use core::fmt::Write as _;

use tracing::{debug, warn};

use exo_common::consts::{AUDIT_RECORD_CAP, ENVELOPE_SIGNED, ENVELOPE_UNSIGNED};
use exo_common::event::AuditEvent;
use exo_common::hal::{SecureElement, TelemetrySink};

use crate::telemetry::Payload;

/// Canonical textual record buffer.
pub type AuditRecord = heapless::String<AUDIT_RECORD_CAP>;

/// Sink diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditCounters {
    /// Events handed to the sink.
    pub emitted: u64,
    /// Records enqueued with the unsigned fallback flag.
    pub unsigned: u64,
    /// Records replaced by the TRUNCATED substitute.
    pub truncated: u64,
    /// Payloads the telemetry queue rejected.
    pub dropped: u64,
}

/// Record did not fit its buffer.
struct Truncated;

/// Serialize an event into the canonical record form.
///
/// Field order is fixed; loads print with two fractional digits and
/// accel with three. Events without a frame show the `[-1.00,-1.00]` /
/// `0.000` placeholders. Errors when the record exceeds the buffer.
pub fn format_record(node_id: &str, event: &AuditEvent) -> Result<AuditRecord, core::fmt::Error> {
    let (load_left, load_right, accel_z) = match event.frame {
        Some(frame) => (frame.load_left, frame.load_right, frame.accel_z),
        None => (-1.0, -1.0, 0.0),
    };
    let mut record = AuditRecord::new();
    write!(
        record,
        "{{\"ts_ms\":{},\"node\":\"{}\",\"event\":\"{}\",\"reason\":\"{}\",\"loads\":[{:.2},{:.2}],\"accel_z\":{:.3}}}",
        event.ts_ms,
        node_id,
        event.kind.as_str(),
        event.reason.as_str(),
        load_left,
        load_right,
        accel_z,
    )?;
    Ok(record)
}

/// Substitute record for an event that did not fit.
fn truncated_record(node_id: &str, ts_ms: u32) -> AuditRecord {
    let mut record = AuditRecord::new();
    // Fits for any sane node id; a failure here leaves a shorter record,
    // which the collectors still attribute via the envelope flag.
    let _ = write!(
        record,
        "{{\"ts_ms\":{ts_ms},\"node\":\"{node_id}\",\"event\":\"TRUNCATED\",\"reason\":\"record_overflow\",\"loads\":[-1.00,-1.00],\"accel_z\":0.000}}",
    );
    record
}

/// The audit pipeline: serialize, sign, frame, enqueue.
#[derive(Debug)]
pub struct AuditSink<E, T> {
    node_id: &'static str,
    secure: E,
    telemetry: T,
    counters: AuditCounters,
}

impl<E: SecureElement, T: TelemetrySink> AuditSink<E, T> {
    /// Sink stamping `node_id` into every record.
    pub fn new(node_id: &'static str, secure: E, telemetry: T) -> Self {
        Self {
            node_id,
            secure,
            telemetry,
            counters: AuditCounters::default(),
        }
    }

    /// Serialize, sign and enqueue one event. Never blocks, never panics;
    /// every fault degrades to a flagged or substituted payload.
    pub fn emit(&mut self, event: &AuditEvent) {
        self.counters.emitted += 1;
        let payload = match self.build_payload(event) {
            Ok(payload) => payload,
            Err(Truncated) => {
                self.counters.truncated += 1;
                warn!(
                    kind = event.kind.as_str(),
                    "audit record overflow; substituting TRUNCATED"
                );
                Self::fallback_payload(self.node_id, event.ts_ms)
            }
        };
        if !self.telemetry.enqueue(&payload) {
            self.counters.dropped += 1;
            debug!("telemetry queue rejected audit payload");
        }
    }

    /// Sink diagnostics.
    pub const fn counters(&self) -> AuditCounters {
        self.counters
    }

    fn build_payload(&mut self, event: &AuditEvent) -> Result<Payload, Truncated> {
        let record = format_record(self.node_id, event).map_err(|_| Truncated)?;

        let mut payload = Payload::new();
        match self.secure.sign_and_store(record.as_bytes()) {
            Some(signature) => {
                seal(&mut payload, ENVELOPE_SIGNED, record.as_bytes(), &signature)?;
            }
            None => {
                self.counters.unsigned += 1;
                debug!("secure element signing unavailable; enqueuing unsigned record");
                seal(&mut payload, ENVELOPE_UNSIGNED, record.as_bytes(), &[])?;
            }
        }
        Ok(payload)
    }

    fn fallback_payload(node_id: &str, ts_ms: u32) -> Payload {
        let record = truncated_record(node_id, ts_ms);
        let mut payload = Payload::new();
        // Truncated substitutes always fit: capacity is asserted against
        // the record cap plus the maximum signature length.
        let _ = payload.push(ENVELOPE_UNSIGNED);
        let _ = payload.extend_from_slice(record.as_bytes());
        payload
    }
}

/// Frame `flag || record || signature` into `payload`.
fn seal(payload: &mut Payload, flag: u8, record: &[u8], signature: &[u8]) -> Result<(), Truncated> {
    payload.push(flag).map_err(|_| Truncated)?;
    payload.extend_from_slice(record).map_err(|_| Truncated)?;
    payload.extend_from_slice(signature).map_err(|_| Truncated)?;
    Ok(())
}
