//! Simulation port set.
//!
//! Software-emulated implementations of every port trait, for development
//! runs and tests without physical hardware. All ports share a
//! [`SimWorld`] so a test (or the config file) adjusts one place and the
//! primary sensors and the mirrored secondary move together. The
//! simulated secondary answers through the real wire codec, so simulation
//! runs exercise the same framing path as hardware.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::debug;

use exo_common::consts::{SAMPLE_INTERVAL_MS, SECONDARY_FRAME_LEN, SECONDARY_I2C_ADDR, SECONDARY_QUERY_CMD};
use exo_common::frame::{LoadChannel, SensorFrame};
use exo_common::hal::{
    ActuatorOutputs, Clock, LinkError, LoadSensors, SecondaryBus, SecureElement, Signature,
};

use crate::link::encode_frame;

// ─── Shared world ───────────────────────────────────────────────────

/// Ambient physical state the simulated ports observe.
#[derive(Debug, Clone, Copy)]
pub struct SimWorld {
    /// Left load cell reading [kg].
    pub load_left: f32,
    /// Right load cell reading [kg].
    pub load_right: f32,
    /// Vertical acceleration reading.
    pub accel_z: f32,
    /// Offset the secondary adds to its mirrored loads [kg].
    pub mirror_skew: f32,
    /// When set, the secondary bus refuses every transaction.
    pub link_down: bool,
}

/// Handle shared between the simulated ports.
pub type SharedWorld = Rc<RefCell<SimWorld>>;

impl SimWorld {
    /// Build a shared world with the given steady-state profile.
    pub fn shared(load_left: f32, load_right: f32, accel_z: f32, mirror_skew: f32) -> SharedWorld {
        Rc::new(RefCell::new(Self {
            load_left,
            load_right,
            accel_z,
            mirror_skew,
            link_down: false,
        }))
    }
}

// ─── Clock ──────────────────────────────────────────────────────────

/// Virtual clock: `sleep_ms` advances the tick instead of blocking, so
/// timing properties are testable without wall-clock delays.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now: Rc<Cell<u32>>,
}

impl SimClock {
    /// Clock starting at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance virtual time from outside the loop (e.g. between cycles).
    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }

    fn sleep_ms(&mut self, ms: u32) {
        self.advance(ms);
    }
}

// ─── Sensors ────────────────────────────────────────────────────────

/// Primary load/accel sensors reading the shared world.
#[derive(Debug, Clone)]
pub struct SimLoadSensors {
    world: SharedWorld,
}

impl SimLoadSensors {
    /// Sensors observing `world`.
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

impl LoadSensors for SimLoadSensors {
    fn read_load(&mut self, channel: LoadChannel) -> f32 {
        let world = self.world.borrow();
        match channel {
            LoadChannel::Left => world.load_left,
            LoadChannel::Right => world.load_right,
        }
    }

    fn read_accel_z(&mut self) -> f32 {
        self.world.borrow().accel_z
    }
}

// ─── Secondary bus ──────────────────────────────────────────────────

/// Simulated secondary MCU behind the I²C protocol.
///
/// Speaks the real wire protocol: rejects traffic for other addresses,
/// requires the query command before a read, and encodes its answer with
/// the production codec. Mirrored frames carry the secondary's own tick,
/// which advances one sample interval per query.
#[derive(Debug, Clone)]
pub struct SimSecondaryBus {
    world: SharedWorld,
    ts_ms: u32,
    pending_query: bool,
}

impl SimSecondaryBus {
    /// Bus mirroring `world`.
    pub fn new(world: SharedWorld) -> Self {
        Self {
            world,
            ts_ms: 0,
            pending_query: false,
        }
    }
}

impl SecondaryBus for SimSecondaryBus {
    fn write(&mut self, addr: u8, bytes: &[u8]) -> Result<(), LinkError> {
        if self.world.borrow().link_down {
            return Err(LinkError::Transmit("simulated bus fault".to_string()));
        }
        if addr != SECONDARY_I2C_ADDR {
            return Err(LinkError::Transmit(format!("no device at 0x{addr:02x}")));
        }
        if bytes != [SECONDARY_QUERY_CMD] {
            return Err(LinkError::Transmit(format!(
                "secondary rejected command {bytes:02x?}"
            )));
        }
        self.pending_query = true;
        Ok(())
    }

    fn read(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), LinkError> {
        if self.world.borrow().link_down {
            return Err(LinkError::Receive("simulated bus fault".to_string()));
        }
        if addr != SECONDARY_I2C_ADDR {
            return Err(LinkError::Receive(format!("no device at 0x{addr:02x}")));
        }
        if !self.pending_query {
            return Err(LinkError::Receive("read without pending query".to_string()));
        }
        if buf.len() != SECONDARY_FRAME_LEN {
            return Err(LinkError::ShortFrame {
                expected: SECONDARY_FRAME_LEN,
                got: buf.len(),
            });
        }
        self.pending_query = false;
        self.ts_ms = self.ts_ms.wrapping_add(SAMPLE_INTERVAL_MS);

        let world = self.world.borrow();
        let mirror = SensorFrame {
            ts_ms: self.ts_ms,
            load_left: world.load_left + world.mirror_skew,
            load_right: world.load_right - world.mirror_skew,
            accel_z: world.accel_z,
        };
        buf.copy_from_slice(&encode_frame(&mirror));
        Ok(())
    }
}

// ─── Actuators ──────────────────────────────────────────────────────

/// Which output line a command drove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorLine {
    /// Mechanical quick-release latch.
    MechRelease,
    /// Descent enable.
    Descent,
}

/// Recording actuator port.
///
/// Holds the last commanded level per line and the full command history
/// so tests can assert ordering ("descent before release").
#[derive(Debug, Clone, Default)]
pub struct SimActuators {
    /// Last commanded latch level (`true` = locked).
    pub latch_locked: Option<bool>,
    /// Last commanded descent level (`true` = enabled).
    pub descent_enabled: Option<bool>,
    /// Every command in arrival order.
    pub history: Vec<(ActuatorLine, bool)>,
}

impl SimActuators {
    /// Fresh port with no commands recorded.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActuatorOutputs for SimActuators {
    fn set_mech_release(&mut self, locked: bool) {
        debug!(locked, "sim: mech release line driven");
        self.latch_locked = Some(locked);
        self.history.push((ActuatorLine::MechRelease, locked));
    }

    fn set_descent(&mut self, enabled: bool) {
        debug!(enabled, "sim: descent line driven");
        self.descent_enabled = Some(enabled);
        self.history.push((ActuatorLine::Descent, enabled));
    }
}

// ─── Secure element ─────────────────────────────────────────────────

/// Stand-in secure element.
///
/// Produces an 8-byte FNV-1a tag as its "signature": a placeholder with
/// the right shape, not a cryptographic signature. Real deployments wire
/// a hardware element through the same trait during provisioning.
#[derive(Debug, Clone)]
pub struct SimSecureElement {
    signing_available: bool,
    signed_count: u64,
}

impl SimSecureElement {
    /// Element that signs every record.
    pub fn new() -> Self {
        Self {
            signing_available: true,
            signed_count: 0,
        }
    }

    /// Element whose signing path is down, forcing the unsigned fallback.
    pub fn unavailable() -> Self {
        Self {
            signing_available: false,
            signed_count: 0,
        }
    }

    /// Records signed so far.
    pub const fn signed_count(&self) -> u64 {
        self.signed_count
    }

    fn fnv1a64(data: &[u8]) -> u64 {
        let mut hash = 0xcbf2_9ce4_8422_2325u64;
        for &byte in data {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        hash
    }
}

impl Default for SimSecureElement {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureElement for SimSecureElement {
    fn sign_and_store(&mut self, record: &[u8]) -> Option<Signature> {
        if !self.signing_available {
            return None;
        }
        self.signed_count += 1;
        let tag = Self::fnv1a64(record);
        Signature::from_slice(&tag.to_le_bytes()).ok()
    }

    fn verify_operator_approval(&mut self, blob: &[u8]) -> bool {
        // Sim policy: any non-empty blob counts as an approved pair.
        debug!(len = blob.len(), "sim: operator approval checked");
        !blob.is_empty()
    }
}
