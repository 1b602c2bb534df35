//! Outbound telemetry boundary.
//!
//! The safety loop hands signed audit payloads to the uploader through a
//! bounded queue. The loop side must never block: enqueue uses `try_lock`
//! and reports a dropped payload instead of waiting out contention or a
//! full queue. The uploader drains on its own schedule.

use std::sync::Arc;

use heapless::Deque;
use parking_lot::Mutex;

use exo_common::consts::{TELEMETRY_PAYLOAD_CAP, TELEMETRY_QUEUE_DEPTH};
use exo_common::hal::TelemetrySink;

/// One framed payload: flag byte + record + signature.
pub type Payload = heapless::Vec<u8, TELEMETRY_PAYLOAD_CAP>;

/// Bounded handoff queue between the safety loop and the uploader thread.
///
/// Clones share the same queue.
#[derive(Debug, Clone)]
pub struct TelemetryQueue {
    inner: Arc<Mutex<Deque<Payload, TELEMETRY_QUEUE_DEPTH>>>,
}

impl Default for TelemetryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Deque::new())),
        }
    }

    /// Uploader-side drain; may block briefly on the lock.
    pub fn pop(&self) -> Option<Payload> {
        self.inner.lock().pop_front()
    }

    /// Payloads currently queued.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TelemetrySink for TelemetryQueue {
    fn enqueue(&mut self, payload: &[u8]) -> bool {
        // Loop side: contention means drop, never wait.
        let Some(mut queue) = self.inner.try_lock() else {
            return false;
        };
        if queue.is_full() {
            return false;
        }
        let mut owned = Payload::new();
        if owned.extend_from_slice(payload).is_err() {
            return false;
        }
        queue.push_back(owned).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_is_preserved() {
        let mut queue = TelemetryQueue::new();
        assert!(queue.enqueue(&[1]));
        assert!(queue.enqueue(&[2, 2]));
        assert!(queue.enqueue(&[3, 3, 3]));

        assert_eq!(queue.pop().unwrap().as_slice(), &[1]);
        assert_eq!(queue.pop().unwrap().as_slice(), &[2, 2]);
        assert_eq!(queue.pop().unwrap().as_slice(), &[3, 3, 3]);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn full_queue_drops_new_payloads() {
        let mut queue = TelemetryQueue::new();
        for i in 0..TELEMETRY_QUEUE_DEPTH {
            assert!(queue.enqueue(&[i as u8]), "payload {i} should fit");
        }
        assert!(!queue.enqueue(&[0xEE]));

        // Earlier payloads survive intact.
        assert_eq!(queue.len(), TELEMETRY_QUEUE_DEPTH);
        assert_eq!(queue.pop().unwrap().as_slice(), &[0]);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let mut queue = TelemetryQueue::new();
        let oversized = vec![0u8; TELEMETRY_PAYLOAD_CAP + 1];
        assert!(!queue.enqueue(&oversized));
        assert!(queue.is_empty());
    }

    #[test]
    fn clones_share_the_queue() {
        let mut writer = TelemetryQueue::new();
        let reader = writer.clone();
        assert!(writer.enqueue(&[7]));
        assert_eq!(reader.pop().unwrap().as_slice(), &[7]);
    }
}
