//! End-to-end supervisor scenarios.
//!
//! Each test drives `run_cycle` against scripted ports with the
//! simulation clock, so timing-sensitive cases (the ~21-cycle watchdog
//! silence) take no wall time. Records are drained from the real
//! telemetry queue and cross-checked as JSON.

mod common;

use common::{Mirror, ScriptedSecondary, ScriptedSensors, drain, harness};
use exo_common::hazard::Hazard;
use exo_common::state::SystemState;
use exo_hal::drivers::sim::ActuatorLine;
use exo_supervisor::supervisor::CycleOutcome;

#[test]
fn boot_idle_stays_normal_and_heartbeats() {
    let mut h = harness(
        ScriptedSensors::steady(20.0, 21.0, 0.98),
        ScriptedSecondary::steady(20.1, 20.9, 0.99),
    );
    h.supervisor.boot();
    for i in 0..5 {
        assert_eq!(h.supervisor.run_cycle(), CycleOutcome::Clean, "cycle {i}");
    }

    assert_eq!(*h.supervisor.state(), SystemState::Normal);
    // Latch commanded LOCKED exactly once, at boot.
    assert_eq!(
        h.supervisor.actuators().history,
        vec![
            (ActuatorLine::MechRelease, true),
            (ActuatorLine::Descent, false)
        ]
    );

    let records = drain(&h.queue);
    assert_eq!(records.len(), 7);
    assert_eq!(records[0]["event"], "MECH_RELEASE");
    assert_eq!(records[0]["reason"], "locked");
    assert_eq!(records[1]["event"], "DESCENT");
    assert_eq!(records[1]["reason"], "disabled");
    for record in &records[2..] {
        assert_eq!(record["event"], "HEARTBEAT");
        assert_eq!(record["reason"], "ok");
        assert_eq!(record["node"], "suit-01");
        assert_eq!(record["loads"][0], 20.0);
        assert_eq!(record["loads"][1], 21.0);
    }
}

#[test]
fn overload_trips_failsafe_with_latch_released() {
    let mut h = harness(
        ScriptedSensors::steady(55.0, 12.0, 0.98),
        ScriptedSecondary::steady(55.1, 12.1, 0.99),
    );
    h.supervisor.boot();

    assert_eq!(
        h.supervisor.run_cycle(),
        CycleOutcome::HazardHandled(Hazard::Overload)
    );
    assert_eq!(
        *h.supervisor.state(),
        SystemState::Failsafe {
            cause: Hazard::Overload
        }
    );

    let actuators = h.supervisor.actuators();
    assert_eq!(actuators.latch_locked, Some(false));
    // Descent untouched: still the DISABLED commanded at boot.
    assert_eq!(actuators.descent_enabled, Some(false));

    let records = drain(&h.queue);
    let release = &records[records.len() - 2];
    assert_eq!(release["event"], "MECH_RELEASE");
    assert_eq!(release["reason"], "released");
    let failsafe = records.last().unwrap();
    assert_eq!(failsafe["event"], "FAILSAFE");
    assert_eq!(failsafe["reason"], "overload");
    assert_eq!(failsafe["loads"][0], 55.0);
    assert_eq!(failsafe["loads"][1], 12.0);
}

#[test]
fn sensor_mismatch_trips_failsafe() {
    // |30 - 40| = 10 > 0.20 × 40 = 8 on the right channel.
    let mut h = harness(
        ScriptedSensors::steady(30.0, 30.0, 0.98),
        ScriptedSecondary::steady(30.0, 40.0, 0.99),
    );
    h.supervisor.boot();

    assert_eq!(
        h.supervisor.run_cycle(),
        CycleOutcome::HazardHandled(Hazard::SensorMismatch)
    );
    assert_eq!(
        *h.supervisor.state(),
        SystemState::Failsafe {
            cause: Hazard::SensorMismatch
        }
    );

    let records = drain(&h.queue);
    let failsafe = records.last().unwrap();
    assert_eq!(failsafe["event"], "FAILSAFE");
    assert_eq!(failsafe["reason"], "sensor_mismatch");
}

#[test]
fn silent_secondary_trips_watchdog_after_timeout() {
    let mut h = harness(
        ScriptedSensors::steady(20.0, 21.0, 0.98),
        ScriptedSecondary::silent(),
    );
    h.supervisor.boot();

    // 21 clean cycles × 50 ms = 1050 ms must elapse before the strict
    // > 1000 ms comparison can hold at a cycle start.
    for i in 0..21 {
        assert_eq!(h.supervisor.run_cycle(), CycleOutcome::Clean, "cycle {i}");
    }
    assert_eq!(
        h.supervisor.run_cycle(),
        CycleOutcome::HazardHandled(Hazard::WatchdogExpired)
    );
    assert_eq!(
        *h.supervisor.state(),
        SystemState::Failsafe {
            cause: Hazard::WatchdogExpired
        }
    );
    assert_eq!(h.supervisor.last_secondary_ok_ms(), 0);

    let records = drain(&h.queue);
    let failsafe = records.last().unwrap();
    assert_eq!(failsafe["event"], "FAILSAFE");
    assert_eq!(failsafe["reason"], "secondary_watchdog_timeout");
}

#[test]
fn sudden_drop_escalates_to_emergency_descent() {
    // 8 kg lost on the left channel in one 50 ms cycle: 160 kg/s.
    let mut h = harness(
        ScriptedSensors::sequence(&[(40.0, 40.0, 0.98), (32.0, 40.0, 0.40)]),
        ScriptedSecondary::sequence(
            &[Mirror::Frame(40.1, 39.9, 0.99)],
            Mirror::Frame(32.1, 39.9, 0.41),
        ),
    );
    h.supervisor.boot();

    assert_eq!(h.supervisor.run_cycle(), CycleOutcome::Clean);
    assert_eq!(
        h.supervisor.run_cycle(),
        CycleOutcome::HazardHandled(Hazard::SuddenDrop)
    );
    assert!(matches!(
        h.supervisor.state(),
        SystemState::EmergencyDescent { .. }
    ));

    // Descent enabled BEFORE the latch release.
    assert_eq!(
        h.supervisor.actuators().history,
        vec![
            (ActuatorLine::MechRelease, true),
            (ActuatorLine::Descent, false),
            (ActuatorLine::Descent, true),
            (ActuatorLine::MechRelease, false),
        ]
    );

    let records = drain(&h.queue);
    let n = records.len();
    assert_eq!(records[n - 3]["event"], "DESCENT");
    assert_eq!(records[n - 3]["reason"], "enabled");
    assert_eq!(records[n - 2]["event"], "MECH_RELEASE");
    assert_eq!(records[n - 2]["reason"], "released");
    assert_eq!(records[n - 1]["event"], "EMERGENCY_DESCENT");
    assert_eq!(records[n - 1]["reason"], "sudden_drop");
    assert_eq!(records[n - 1]["loads"][0], 32.0);
}

#[test]
fn watchdog_wins_priority_collision() {
    // Secondary answers once at boot, then goes dark; the primary drifts
    // to a mismatching value exactly when the watchdog first expires.
    let mut steps = vec![(30.0, 30.0, 0.98); 21];
    steps.push((30.0, 40.0, 0.98));
    let mut h = harness(
        ScriptedSensors::sequence(&steps),
        ScriptedSecondary::sequence(&[Mirror::Frame(30.0, 30.0, 0.98)], Mirror::Fail),
    );
    h.supervisor.boot();

    for i in 0..21 {
        assert_eq!(h.supervisor.run_cycle(), CycleOutcome::Clean, "cycle {i}");
    }
    // This cycle satisfies both the watchdog and the mismatch predicate
    // (|40 - 30| = 10 > 0.20 × 40 = 8 against the stale mirror).
    assert_eq!(
        h.supervisor.run_cycle(),
        CycleOutcome::HazardHandled(Hazard::WatchdogExpired)
    );

    let records = drain(&h.queue);
    let failsafe = records.last().unwrap();
    assert_eq!(failsafe["event"], "FAILSAFE");
    assert_eq!(failsafe["reason"], "secondary_watchdog_timeout");
}
