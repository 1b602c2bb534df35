//! The supervisor loop.
//!
//! Owns the state machine and every piece of mutable loop state: the
//! current [`SystemState`], the heartbeat tracker, the previous accepted
//! primary frame and the most recent secondary mirror. Ports are injected
//! as capability traits; nothing here touches hardware directly.
//!
//! One cycle: sample the primary sensors, query the secondary, evaluate
//! the hazard predicates in priority order, then either handle the
//! winning hazard (actuate, emit, yield) or emit a heartbeat and pace the
//! loop out to the 50 ms sample interval. Audit events within a cycle are
//! emitted in causal order: actuator changes first, the state-labeled
//! event second.

use tracing::{debug, info, warn};

use exo_common::consts::{EVENT_DRAIN_MS, SAMPLE_INTERVAL_MS};
use exo_common::event::{AuditEvent, EventKind, ReasonTag};
use exo_common::frame::{LoadChannel, SensorFrame};
use exo_common::hal::{
    ActuatorOutputs, Clock, LoadSensors, SecondaryPort, SecureElement, TelemetrySink,
};
use exo_common::hazard::{self, Hazard, HeartbeatTracker};
use exo_common::state::SystemState;

use crate::audit::AuditSink;

/// What one loop iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No hazard fired; heartbeat emitted, `prev` retained.
    Clean,
    /// The given hazard won the iteration and was handled.
    HazardHandled(Hazard),
}

/// The safety supervisor context.
///
/// Sole owner of the state machine and the loop-mutable state; helpers
/// receive it by reference. There are no statics anywhere in the loop.
pub struct Supervisor<C, S, L, A, E, T> {
    clock: C,
    sensors: S,
    secondary: L,
    actuators: A,
    audit: AuditSink<E, T>,
    state: SystemState,
    tracker: HeartbeatTracker,
    /// Previous accepted primary frame, for the drop-rate check. Only
    /// hazard-free iterations advance it.
    prev: Option<SensorFrame>,
    /// Most recently accepted secondary mirror; staleness is bounded by
    /// the watchdog.
    mirror: Option<SensorFrame>,
    cycles: u64,
}

impl<C, S, L, A, E, T> Supervisor<C, S, L, A, E, T>
where
    C: Clock,
    S: LoadSensors,
    L: SecondaryPort,
    A: ActuatorOutputs,
    E: SecureElement,
    T: TelemetrySink,
{
    /// Assemble a supervisor over its ports. The heartbeat tracker starts
    /// at the current tick so the secondary gets a full timeout window.
    pub fn new(clock: C, sensors: S, secondary: L, actuators: A, audit: AuditSink<E, T>) -> Self {
        let tracker = HeartbeatTracker::new(clock.now_ms());
        Self {
            clock,
            sensors,
            secondary,
            actuators,
            audit,
            state: SystemState::Normal,
            tracker,
            prev: None,
            mirror: None,
            cycles: 0,
        }
    }

    /// Boot sequence: command the safe output levels before the first
    /// sample: latch LOCKED, descent DISABLED.
    pub fn boot(&mut self) {
        info!(state = self.state.as_str(), "boot: commanding safe outputs");
        self.command_latch(true);
        self.command_descent(false);
    }

    /// Run forever. The loop has no cancellation point: after a trip it
    /// keeps cycling and logging heartbeats so observers can confirm
    /// liveness. Power-off is the only exit.
    pub fn run(&mut self) -> ! {
        loop {
            self.run_cycle();
        }
    }

    /// One iteration of the safety loop.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        let t0 = self.clock.now_ms();
        let primary = SensorFrame {
            ts_ms: t0,
            load_left: self.sensors.read_load(LoadChannel::Left),
            load_right: self.sensors.read_load(LoadChannel::Right),
            accel_z: self.sensors.read_accel_z(),
        };

        match self.secondary.query() {
            Ok(mirror) => {
                self.tracker.mark_ok(self.clock.now_ms());
                self.mirror = Some(mirror);
            }
            // A single failure is transient; the watchdog decides when
            // persistence becomes a hazard.
            Err(err) => debug!(%err, "secondary query failed"),
        }

        let now = self.clock.now_ms();
        let flags = hazard::detect(
            self.prev.as_ref(),
            &primary,
            self.mirror.as_ref(),
            &self.tracker,
            now,
        );
        self.cycles += 1;

        if let Some(hazard) = flags.highest_priority() {
            warn!(
                reason = hazard.reason_tag().as_str(),
                fired = ?flags,
                state = self.state.as_str(),
                "hazard detected"
            );
            self.handle_hazard(hazard, &primary);
            // Let the telemetry queue drain before the next sample; the
            // iteration restarts without updating `prev`.
            self.clock.sleep_ms(EVENT_DRAIN_MS);
            return CycleOutcome::HazardHandled(hazard);
        }

        self.audit.emit(
            &AuditEvent::new(self.clock.now_ms(), EventKind::Heartbeat, ReasonTag::Ok)
                .with_frame(primary),
        );
        self.prev = Some(primary);
        self.pace(t0);
        CycleOutcome::Clean
    }

    /// Current state.
    pub const fn state(&self) -> &SystemState {
        &self.state
    }

    /// Iterations executed since boot.
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Local tick of the last successful secondary read.
    pub const fn last_secondary_ok_ms(&self) -> u32 {
        self.tracker.last_ok_ms()
    }

    /// The actuator port (tests inspect recorded commands).
    pub const fn actuators(&self) -> &A {
        &self.actuators
    }

    /// The audit sink (tests inspect counters).
    pub const fn audit(&self) -> &AuditSink<E, T> {
        &self.audit
    }

    /// Apply the transition for the winning hazard and perform its
    /// actions. Safe outputs are re-commanded every iteration a hazard
    /// fires, even when the state value is unchanged.
    fn handle_hazard(&mut self, hazard: Hazard, primary: &SensorFrame) {
        let next = self.state.on_hazard(hazard, primary);
        let descending = matches!(next, SystemState::EmergencyDescent { .. });

        if descending {
            self.command_descent(true);
        }
        self.command_latch(false);

        let kind = if descending {
            EventKind::EmergencyDescent
        } else {
            EventKind::Failsafe
        };
        self.audit.emit(
            &AuditEvent::new(self.clock.now_ms(), kind, hazard.reason_tag()).with_frame(*primary),
        );

        if self.state != next {
            info!(
                from = self.state.as_str(),
                to = next.as_str(),
                "state transition"
            );
        }
        self.state = next;
    }

    /// Drive the latch line and emit its audit event before returning.
    fn command_latch(&mut self, locked: bool) {
        self.actuators.set_mech_release(locked);
        let reason = if locked {
            ReasonTag::Locked
        } else {
            ReasonTag::Released
        };
        self.audit
            .emit(&AuditEvent::new(self.clock.now_ms(), EventKind::MechRelease, reason));
    }

    /// Drive the descent line and emit its audit event before returning.
    fn command_descent(&mut self, enabled: bool) {
        self.actuators.set_descent(enabled);
        let reason = if enabled {
            ReasonTag::Enabled
        } else {
            ReasonTag::Disabled
        };
        self.audit
            .emit(&AuditEvent::new(self.clock.now_ms(), EventKind::Descent, reason));
    }

    /// Sleep out the remainder of the sample interval. Overruns are
    /// absorbed: the loop never runs catch-up iterations.
    fn pace(&mut self, t0: u32) {
        let elapsed = self.clock.now_ms().wrapping_sub(t0);
        if elapsed < SAMPLE_INTERVAL_MS {
            self.clock.sleep_ms(SAMPLE_INTERVAL_MS - elapsed);
        }
    }
}
