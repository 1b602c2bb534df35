//! Shared fixtures for the supervisor integration tests.
//!
//! Scripted ports plus a harness that assembles a supervisor over the
//! simulation clock. Signing is left unavailable so every telemetry
//! payload is `0xFF || record` and parses directly as JSON.

#![allow(dead_code)]

use std::collections::VecDeque;

use exo_common::consts::{ENVELOPE_UNSIGNED, NODE_ID};
use exo_common::frame::{LoadChannel, SensorFrame};
use exo_common::hal::{LinkError, LoadSensors, SecondaryPort};
use exo_hal::drivers::sim::{SimActuators, SimClock, SimSecureElement};
use exo_supervisor::audit::AuditSink;
use exo_supervisor::supervisor::Supervisor;
use exo_supervisor::telemetry::TelemetryQueue;

/// Primary sensor script: each iteration consumes one `(left, right,
/// accel)` step; the last step holds once the script runs out.
pub struct ScriptedSensors {
    script: VecDeque<(f32, f32, f32)>,
    current: (f32, f32, f32),
}

impl ScriptedSensors {
    pub fn steady(left: f32, right: f32, accel: f32) -> Self {
        Self {
            script: VecDeque::new(),
            current: (left, right, accel),
        }
    }

    pub fn sequence(steps: &[(f32, f32, f32)]) -> Self {
        Self {
            script: steps.iter().copied().collect(),
            current: (0.0, 0.0, 0.0),
        }
    }
}

impl LoadSensors for ScriptedSensors {
    fn read_load(&mut self, channel: LoadChannel) -> f32 {
        // The supervisor samples LEFT first; that read advances the script.
        if channel == LoadChannel::Left {
            if let Some(next) = self.script.pop_front() {
                self.current = next;
            }
        }
        match channel {
            LoadChannel::Left => self.current.0,
            LoadChannel::Right => self.current.1,
        }
    }

    fn read_accel_z(&mut self) -> f32 {
        self.current.2
    }
}

/// One scripted secondary response.
#[derive(Clone, Copy)]
pub enum Mirror {
    Frame(f32, f32, f32),
    Fail,
}

/// Secondary port script with the same consume-then-hold behavior.
pub struct ScriptedSecondary {
    script: VecDeque<Mirror>,
    hold: Mirror,
    ts_ms: u32,
}

impl ScriptedSecondary {
    pub fn steady(left: f32, right: f32, accel: f32) -> Self {
        Self {
            script: VecDeque::new(),
            hold: Mirror::Frame(left, right, accel),
            ts_ms: 0,
        }
    }

    pub fn silent() -> Self {
        Self {
            script: VecDeque::new(),
            hold: Mirror::Fail,
            ts_ms: 0,
        }
    }

    pub fn sequence(steps: &[Mirror], hold: Mirror) -> Self {
        Self {
            script: steps.iter().copied().collect(),
            hold,
            ts_ms: 0,
        }
    }
}

impl SecondaryPort for ScriptedSecondary {
    fn query(&mut self) -> Result<SensorFrame, LinkError> {
        let step = self.script.pop_front().unwrap_or(self.hold);
        match step {
            Mirror::Frame(load_left, load_right, accel_z) => {
                // The mirror carries the secondary's own tick; the
                // supervisor never consults it.
                self.ts_ms = self.ts_ms.wrapping_add(50);
                Ok(SensorFrame {
                    ts_ms: self.ts_ms,
                    load_left,
                    load_right,
                    accel_z,
                })
            }
            Mirror::Fail => Err(LinkError::Transmit("scripted outage".to_string())),
        }
    }
}

pub type TestSupervisor = Supervisor<
    SimClock,
    ScriptedSensors,
    ScriptedSecondary,
    SimActuators,
    SimSecureElement,
    TelemetryQueue,
>;

pub struct Harness {
    pub supervisor: TestSupervisor,
    pub clock: SimClock,
    pub queue: TelemetryQueue,
}

/// Supervisor over scripted ports, starting at virtual tick 0.
pub fn harness(sensors: ScriptedSensors, secondary: ScriptedSecondary) -> Harness {
    let clock = SimClock::new();
    let queue = TelemetryQueue::new();
    let audit = AuditSink::new(NODE_ID, SimSecureElement::unavailable(), queue.clone());
    let supervisor = Supervisor::new(clock.clone(), sensors, secondary, SimActuators::new(), audit);
    Harness {
        supervisor,
        clock,
        queue,
    }
}

/// Drain every queued payload into parsed records.
pub fn drain(queue: &TelemetryQueue) -> Vec<serde_json::Value> {
    let mut records = Vec::new();
    while let Some(payload) = queue.pop() {
        assert_eq!(
            payload[0], ENVELOPE_UNSIGNED,
            "harness runs with signing unavailable"
        );
        let record: serde_json::Value =
            serde_json::from_slice(&payload[1..]).expect("payload body is one JSON record");
        records.push(record);
    }
    records
}
