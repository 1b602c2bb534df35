//! Linux hardware backends (feature `linux-hw`).
//!
//! HIL builds talk to the secondary MCU through the kernel `i2c-dev`
//! interface and drive the two actuator lines through sysfs GPIO value
//! files. Board bring-up (pin muxing, GPIO export, bus enumeration) is
//! outside this crate; paths arrive from `supervisor.toml`.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use tracing::error;

use exo_common::consts::LINK_TIMEOUT_MS;
use exo_common::hal::{ActuatorOutputs, LinkError, SecondaryBus};

// linux/i2c-dev.h requests.
nix::ioctl_write_int_bad!(i2c_set_timeout, 0x0702);
nix::ioctl_write_int_bad!(i2c_set_slave, 0x0703);

/// Secondary bus over `/dev/i2c-N`.
///
/// The kernel-side transaction timeout is set to the 50 ms link contract
/// at open time, so both halves of a query are bounded without userspace
/// timers.
#[derive(Debug)]
pub struct I2cDevBus {
    dev: File,
    selected: Option<u8>,
}

impl I2cDevBus {
    /// Open a bus device node.
    pub fn open(path: &Path) -> Result<Self, LinkError> {
        let dev = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| LinkError::Transmit(format!("open {}: {e}", path.display())))?;
        // Kernel timeout granularity is 10 ms.
        unsafe { i2c_set_timeout(dev.as_raw_fd(), (LINK_TIMEOUT_MS / 10) as libc::c_int) }
            .map_err(|e| LinkError::Transmit(format!("I2C_TIMEOUT: {e}")))?;
        Ok(Self {
            dev,
            selected: None,
        })
    }

    fn select(&mut self, addr: u8) -> Result<(), LinkError> {
        if self.selected == Some(addr) {
            return Ok(());
        }
        unsafe { i2c_set_slave(self.dev.as_raw_fd(), libc::c_int::from(addr)) }
            .map_err(|e| LinkError::Transmit(format!("I2C_SLAVE 0x{addr:02x}: {e}")))?;
        self.selected = Some(addr);
        Ok(())
    }
}

impl SecondaryBus for I2cDevBus {
    fn write(&mut self, addr: u8, bytes: &[u8]) -> Result<(), LinkError> {
        self.select(addr)?;
        self.dev
            .write_all(bytes)
            .map_err(|e| LinkError::Transmit(e.to_string()))
    }

    fn read(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), LinkError> {
        self.select(addr)?;
        let got = self
            .dev
            .read(buf)
            .map_err(|e| LinkError::Receive(e.to_string()))?;
        if got != buf.len() {
            return Err(LinkError::ShortFrame {
                expected: buf.len(),
                got,
            });
        }
        Ok(())
    }
}

/// Actuator lines over sysfs GPIO value files.
///
/// High = latch locked, high = descent enabled, per the board wiring
/// contract. Line-write failures are logged and absorbed; the actuator
/// port must never raise into the safety loop.
#[derive(Debug)]
pub struct SysfsGpioActuators {
    mech_release: PathBuf,
    descent: PathBuf,
}

impl SysfsGpioActuators {
    /// Port driving the two exported value files.
    pub fn new(mech_release: impl Into<PathBuf>, descent: impl Into<PathBuf>) -> Self {
        Self {
            mech_release: mech_release.into(),
            descent: descent.into(),
        }
    }

    fn drive(line: &Path, high: bool) {
        if let Err(e) = std::fs::write(line, if high { "1" } else { "0" }) {
            error!(line = %line.display(), %e, "GPIO write failed");
        }
    }
}

impl ActuatorOutputs for SysfsGpioActuators {
    fn set_mech_release(&mut self, locked: bool) {
        Self::drive(&self.mech_release, locked);
    }

    fn set_descent(&mut self, enabled: bool) {
        Self::drive(&self.descent, enabled);
    }
}
