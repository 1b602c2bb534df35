//! EXO Safety Supervisor
//!
//! The safety decision loop for the EXO support suit: periodic sensor
//! ingest, cross-MCU redundancy and watchdog, hazard classification,
//! state transitions, actuator commanding, and the signed audit stream.
//!
//! # Module Structure
//!
//! - [`supervisor`] - The loop, the state machine and the boot sequence
//! - [`audit`] - Canonical record serialization, signing, envelope framing
//! - [`telemetry`] - Bounded non-blocking handoff to the uploader

pub mod audit;
pub mod supervisor;
pub mod telemetry;
