//! Configuration loading.
//!
//! Compile-time tunables live in [`crate::consts`]; this module covers the
//! deployment-varying facts loaded from `supervisor.toml`: log level, port
//! driver selection and per-driver settings. Parsing is strict
//! (`deny_unknown_fields`) with serde defaults, so a sparse file is valid
//! and a misspelled key is an error rather than a silently ignored line.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Log level for configuration.
///
/// Serializes to lowercase strings: "trace", "debug", "info", "warn", "error".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace-level verbosity.
    Trace,
    /// Debug-level verbosity.
    Debug,
    /// Info-level verbosity (default).
    Info,
    /// Warning-level verbosity.
    Warn,
    /// Error-level verbosity.
    Error,
}

impl LogLevel {
    /// Filter directive understood by the tracing subscriber.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("configuration validation failed: {0}")]
    ValidationError(String),

    /// Unknown field in TOML (strict parsing with `deny_unknown_fields`).
    #[error("unknown field: {0}")]
    UnknownField(String),
}

/// Trait for loading configuration from TOML files.
///
/// Blanket-implemented for every `DeserializeOwned` type.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::UnknownField` for keys rejected by strict parsing
/// - Returns `ConfigError::ParseError` for any other TOML failure
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| {
            let msg = e.to_string();
            if msg.contains("unknown field") {
                ConfigError::UnknownField(msg)
            } else {
                ConfigError::ParseError(msg)
            }
        })
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

// ─── Supervisor configuration ───────────────────────────────────────

/// Port driver selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Full in-memory simulation port set (default).
    Simulation,
    /// Linux i2c-dev secondary link + sysfs GPIO actuators.
    I2c,
}

fn default_driver() -> DriverKind {
    DriverKind::Simulation
}

/// `[supervisor]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupervisorSection {
    /// Diagnostic log level.
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
    /// Which port backends to wire up.
    #[serde(default = "default_driver")]
    pub driver: DriverKind,
}

impl Default for SupervisorSection {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            driver: DriverKind::Simulation,
        }
    }
}

/// `[i2c]` section, required when `driver = "i2c"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct I2cSection {
    /// Character device of the bus the secondary MCU sits on.
    #[serde(default = "default_i2c_bus")]
    pub bus: String,
}

fn default_i2c_bus() -> String {
    "/dev/i2c-1".to_string()
}

/// `[gpio]` section, required when `driver = "i2c"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GpioSection {
    /// Sysfs value file driving the mechanical release line.
    pub mech_release: String,
    /// Sysfs value file driving the descent-enable line.
    pub descent: String,
}

/// `[sim]` section: steady-state load profile for the simulation driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimSection {
    /// Left load cell reading [kg].
    #[serde(default = "default_sim_load_left")]
    pub load_left: f32,
    /// Right load cell reading [kg].
    #[serde(default = "default_sim_load_right")]
    pub load_right: f32,
    /// Vertical acceleration reading.
    #[serde(default = "default_sim_accel_z")]
    pub accel_z: f32,
    /// Offset the simulated secondary adds to its mirrored loads [kg].
    #[serde(default = "default_sim_mirror_skew")]
    pub mirror_skew: f32,
}

fn default_sim_load_left() -> f32 {
    20.0
}
fn default_sim_load_right() -> f32 {
    21.0
}
fn default_sim_accel_z() -> f32 {
    0.98
}
fn default_sim_mirror_skew() -> f32 {
    0.1
}

impl Default for SimSection {
    fn default() -> Self {
        Self {
            load_left: 20.0,
            load_right: 21.0,
            accel_z: 0.98,
            mirror_skew: 0.1,
        }
    }
}

/// Complete supervisor configuration, loaded from `supervisor.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupervisorConfig {
    /// Top-level supervisor settings.
    #[serde(default)]
    pub supervisor: SupervisorSection,
    /// Simulation load profile.
    #[serde(default)]
    pub sim: SimSection,
    /// I²C bus settings (i2c driver only).
    #[serde(default)]
    pub i2c: Option<I2cSection>,
    /// GPIO line settings (i2c driver only).
    #[serde(default)]
    pub gpio: Option<GpioSection>,
}

impl SupervisorConfig {
    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.supervisor.driver == DriverKind::I2c {
            if self.i2c.is_none() {
                return Err(ConfigError::ValidationError(
                    "driver = \"i2c\" requires an [i2c] section".to_string(),
                ));
            }
            if self.gpio.is_none() {
                return Err(ConfigError::ValidationError(
                    "driver = \"i2c\" requires a [gpio] section".to_string(),
                ));
            }
        }
        for (field, value) in [
            ("sim.load_left", self.sim.load_left),
            ("sim.load_right", self.sim.load_right),
            ("sim.accel_z", self.sim.accel_z),
            ("sim.mirror_skew", self.sim.mirror_skew),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::ValidationError(format!(
                    "{field}={value} must be finite"
                )));
            }
        }
        Ok(())
    }
}
