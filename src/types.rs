use serde::{Deserialize, Serialize};
use std::fmt;

/// Source index as used by the legacy line protocol (1..=12)
pub type SourceIndex = u8;

/// Volume expressed in the receiver's own units
pub type NativeVolume = i32;

/// Transport family used to reach the receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TransportKind {
    /// Local serial line (RS232)
    #[default]
    #[serde(rename = "RS232")]
    Rs232,

    /// Line protocol over a Telnet control port
    #[serde(rename = "Telnet")]
    Telnet,

    /// Binary status/command protocol over raw TCP
    #[serde(rename = "TCP")]
    Tcp,
}

impl TransportKind {
    /// Whether this transport speaks the `Main.Power=On` line protocol
    pub fn is_legacy(self) -> bool {
        matches!(self, Self::Rs232 | Self::Telnet)
    }
}

/// An independently powered output of the receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Main,
    Zone2,
    Zone3,
}

impl Zone {
    /// Prefix used by the line protocol
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Main => "Main",
            Self::Zone2 => "Zone2",
            Self::Zone3 => "Zone3",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Observed power state of a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    On,
    Off,
    #[default]
    Unknown,
}

impl From<Option<bool>> for PowerState {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::On,
            Some(false) => Self::Off,
            None => Self::Unknown,
        }
    }
}

/// State of one zone as of the most recent poll
///
/// `None` means the value could not be determined this cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ZoneSnapshot {
    pub power: PowerState,
    pub muted: Option<bool>,
    /// Volume in the normalized domain, 0.0 to 1.0 for in-range readings
    pub volume: Option<f64>,
    pub source: Option<String>,
}

impl ZoneSnapshot {
    /// Snapshot for a zone whose power could not be read
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Snapshot for a zone reported as powered off
    ///
    /// Secondary zones on the line protocol report an explicit unmuted state
    /// while off; the main zone reports nothing.
    pub fn off(muted: Option<bool>) -> Self {
        Self {
            power: PowerState::Off,
            muted,
            volume: None,
            source: None,
        }
    }
}

/// Snapshot of all three zones produced by one poll cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReceiverSnapshot {
    pub main: ZoneSnapshot,
    pub zone2: ZoneSnapshot,
    pub zone3: ZoneSnapshot,
}

impl ReceiverSnapshot {
    /// The receiver is available iff the main zone power is known
    pub fn available(&self) -> bool {
        self.main.power != PowerState::Unknown
    }

    /// Get the snapshot for a zone
    pub fn zone(&self, zone: Zone) -> &ZoneSnapshot {
        match zone {
            Zone::Main => &self.main,
            Zone::Zone2 => &self.zone2,
            Zone::Zone3 => &self.zone3,
        }
    }

    pub(crate) fn zone_mut(&mut self, zone: Zone) -> &mut ZoneSnapshot {
        match zone {
            Zone::Main => &mut self.main,
            Zone::Zone2 => &mut self.zone2,
            Zone::Zone3 => &mut self.zone3,
        }
    }
}

/// Whole main-zone state returned by one status request on the TCP protocol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub power: bool,
    /// Volume on the 0-200 device scale
    pub volume: NativeVolume,
    pub muted: bool,
    /// Device source name, `None` if the reported code is not recognised
    pub source: Option<String>,
}

/// Per-zone attributes exposed next to the main media-player state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ZoneAttributes {
    pub zone2_state: PowerState,
    pub is_zone2_volume_muted: Option<bool>,
    pub zone2_volume_level: Option<f64>,
    pub zone3_state: PowerState,
    pub is_zone3_volume_muted: Option<bool>,
    pub zone3_volume_level: Option<f64>,
}

impl From<&ReceiverSnapshot> for ZoneAttributes {
    fn from(snapshot: &ReceiverSnapshot) -> Self {
        Self {
            zone2_state: snapshot.zone2.power,
            is_zone2_volume_muted: snapshot.zone2.muted,
            zone2_volume_level: snapshot.zone2.volume,
            zone3_state: snapshot.zone3.power,
            is_zone3_volume_muted: snapshot.zone3.muted,
            zone3_volume_level: snapshot.zone3.volume,
        }
    }
}
