use crate::{
    Result,
    constants::{CMD_CLICK, CMD_LOCK, CMD_TOGGLE, CMD_UNLOCK, DEFAULT_HISTORY_NAME},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Device identifier (the UUID the vendor assigns at registration)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(Uuid);

impl DeviceId {
    /// Wrap an existing UUID.
    #[must_use]
    pub fn new(uuid: Uuid) -> Self {
        DeviceId(uuid)
    }

    /// Generate a random identifier. Mostly useful for tests and simulations.
    #[must_use]
    pub fn random() -> Self {
        DeviceId(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl std::str::FromStr for DeviceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(DeviceId)
            .map_err(|e| Error::InvalidDeviceId(format!("{s}: {e}")))
    }
}

impl From<Uuid> for DeviceId {
    fn from(uuid: Uuid) -> Self {
        DeviceId(uuid)
    }
}

/// Device kind. Fixed at registration; selects byte layout and battery curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceVariant {
    /// Full smart lock, reports bolt position.
    Lock,
    /// Simple push actuator, no position.
    Bot,
}

impl DeviceVariant {
    /// All known variants.
    pub const ALL: [DeviceVariant; 2] = [DeviceVariant::Lock, DeviceVariant::Bot];

    /// Returns `true` if this variant accepts the given command.
    ///
    /// Locks understand lock, unlock and toggle; bots only understand click.
    #[inline]
    #[must_use]
    pub fn supports(self, command: Command) -> bool {
        match self {
            DeviceVariant::Lock => matches!(
                command,
                Command::Lock | Command::Unlock | Command::Toggle
            ),
            DeviceVariant::Bot => matches!(command, Command::Click),
        }
    }

    /// Returns `true` if reports from this variant carry a position reading.
    #[inline]
    #[must_use]
    pub fn reports_position(self) -> bool {
        matches!(self, DeviceVariant::Lock)
    }

    /// Lowercase name used in logs, config files and the CLI.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceVariant::Lock => "lock",
            DeviceVariant::Bot => "bot",
        }
    }
}

impl fmt::Display for DeviceVariant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeviceVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lock" => Ok(DeviceVariant::Lock),
            "bot" => Ok(DeviceVariant::Bot),
            _ => Err(Error::UnknownVariant(s.to_string())),
        }
    }
}

/// A registered device: identity, display name and variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    #[serde(default)]
    pub name: Option<String>,
    pub variant: DeviceVariant,
}

impl Device {
    /// Create an unnamed device.
    #[must_use]
    pub fn new(id: DeviceId, variant: DeviceVariant) -> Self {
        Self {
            id,
            name: None,
            variant,
        }
    }

    /// Set the human-readable name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name for logs: the configured name, or the UUID when unnamed.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => self.id.to_string(),
        }
    }
}

/// Decoded mechanical status of a device.
///
/// Each decode produces a fresh snapshot; snapshots are never mutated.
/// `locked` and `unlocked` are independent flags exactly as the device
/// reports them, so both (or neither) may be set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MechanicalStatus {
    battery_voltage: f64,
    battery_percentage: f64,
    position: u16,
    locked: bool,
    unlocked: bool,
}

impl MechanicalStatus {
    /// Build a snapshot. The percentage is clamped into `[0, 100]`.
    #[must_use]
    pub fn new(
        battery_voltage: f64,
        battery_percentage: f64,
        position: u16,
        locked: bool,
        unlocked: bool,
    ) -> Self {
        Self {
            battery_voltage,
            battery_percentage: battery_percentage.clamp(0.0, 100.0),
            position,
            locked,
            unlocked,
        }
    }

    /// Battery voltage derived from the raw ADC reading.
    #[must_use]
    pub fn battery_voltage(&self) -> f64 {
        self.battery_voltage
    }

    /// Estimated battery charge, always within `[0, 100]`.
    #[must_use]
    pub fn battery_percentage(&self) -> f64 {
        self.battery_percentage
    }

    /// Raw position reading (always 0 for bots).
    #[must_use]
    pub fn position(&self) -> u16 {
        self.position
    }

    /// Locked flag as reported.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Unlocked flag as reported.
    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Returns `true` if the charge is at or below `threshold` percent.
    #[must_use]
    pub fn is_battery_low(&self, threshold: f64) -> bool {
        self.battery_percentage <= threshold
    }
}

/// Device command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Command {
    Lock = CMD_LOCK,
    Unlock = CMD_UNLOCK,
    Toggle = CMD_TOGGLE,
    Click = CMD_CLICK,
}

impl Command {
    /// Create a command from its numeric code.
    ///
    /// # Errors
    /// Returns `Error::UnknownCommand` for codes outside the command set.
    #[inline]
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            CMD_LOCK => Ok(Command::Lock),
            CMD_UNLOCK => Ok(Command::Unlock),
            CMD_TOGGLE => Ok(Command::Toggle),
            CMD_CLICK => Ok(Command::Click),
            _ => Err(Error::UnknownCommand(code.to_string())),
        }
    }

    /// Numeric code sent to the device.
    #[inline]
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Command::Lock => "lock",
            Command::Unlock => "unlock",
            Command::Toggle => "toggle",
            Command::Click => "click",
        };
        write!(f, "{name}({})", self.code())
    }
}

impl std::str::FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lock" => Ok(Command::Lock),
            "unlock" => Ok(Command::Unlock),
            "toggle" => Ok(Command::Toggle),
            "click" => Ok(Command::Click),
            _ => Err(Error::UnknownCommand(s.to_string())),
        }
    }
}

/// Arguments sent alongside a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandArgs {
    /// Tag recorded in the device's history log.
    pub history: String,
}

impl CommandArgs {
    #[must_use]
    pub fn new(history: impl Into<String>) -> Self {
        Self {
            history: history.into(),
        }
    }
}

impl Default for CommandArgs {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_NAME)
    }
}
