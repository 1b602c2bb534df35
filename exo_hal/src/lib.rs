//! EXO Hardware Abstraction Layer
//!
//! Concrete implementations of the port traits in `exo_common::hal`:
//!
//! - [`clock`] - Monotonic host clock
//! - [`link`] - Secondary-link wire codec over any [`exo_common::hal::SecondaryBus`]
//! - [`drivers`] - Port backends: in-memory simulation, and (feature
//!   `linux-hw`) Linux `i2c-dev` / sysfs-GPIO hardware

pub mod clock;
pub mod drivers;
pub mod link;
