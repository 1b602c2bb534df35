//! EXO Common Library
//!
//! Shared vocabulary for the EXO safety supervisor workspace: the sensor
//! frame and system state types, the pure hazard evaluator, the audit
//! event vocabulary, the capability traits for hardware ports and
//! audit-side hooks, and configuration loading.
//!
//! # Module Structure
//!
//! - [`consts`] - Tunables, protocol constants and buffer capacities
//! - [`frame`] - Sensor snapshot types
//! - [`state`] - System state machine
//! - [`hazard`] - Pure hazard predicates, priority selection, heartbeat tracker
//! - [`event`] - Audit event vocabulary
//! - [`hal`] - Capability traits for ports and audit hooks
//! - [`config`] - TOML configuration loading

pub mod config;
pub mod consts;
pub mod event;
pub mod frame;
pub mod hal;
pub mod hazard;
pub mod state;
