//! Full supervisor cycle benchmark.
//!
//! Measures one hazard-free iteration over the simulation ports with the
//! virtual clock, so pacing sleeps cost nothing and the number reflects
//! the compute path: sensor ingest, link codec, hazard evaluation and
//! audit serialization + signing.

use criterion::{Criterion, criterion_group, criterion_main};

use exo_common::consts::NODE_ID;
use exo_common::hal::TelemetrySink;
use exo_hal::drivers::sim::{
    SimActuators, SimClock, SimLoadSensors, SimSecondaryBus, SimSecureElement, SimWorld,
};
use exo_hal::link::SecondaryLink;
use exo_supervisor::audit::AuditSink;
use exo_supervisor::supervisor::Supervisor;

/// Discards payloads so the bench stays on the loop's compute path.
struct NullSink;

impl TelemetrySink for NullSink {
    fn enqueue(&mut self, _payload: &[u8]) -> bool {
        true
    }
}

fn bench_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("supervisor_cycle");
    group.significance_level(0.01);
    group.sample_size(500);

    let world = SimWorld::shared(20.0, 21.0, 0.98, 0.1);
    let audit = AuditSink::new(NODE_ID, SimSecureElement::new(), NullSink);
    let mut supervisor = Supervisor::new(
        SimClock::new(),
        SimLoadSensors::new(world.clone()),
        SecondaryLink::new(SimSecondaryBus::new(world)),
        SimActuators::new(),
        audit,
    );
    supervisor.boot();

    group.bench_function("clean_cycle", |b| b.iter(|| supervisor.run_cycle()));

    group.finish();
}

criterion_group!(benches, bench_cycle);
criterion_main!(benches);
