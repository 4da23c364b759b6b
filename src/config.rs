use crate::error::{NadError, Result};
use crate::types::{SourceIndex, TransportKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Highest source index a receiver can expose (C 658 with an MDC HDM-2 card)
pub const MAX_SOURCE_INDEX: SourceIndex = 12;

/// Accepted window for `min_volume`/`max_volume`, in dB
pub const VOLUME_BOUNDS_DB: RangeInclusive<i32> = -200..=50;

/// Accepted window for `volume_step`, in dB
pub const VOLUME_STEP_DB: RangeInclusive<i32> = 1..=100;

/// Receiver configuration
///
/// Field names and defaults match the platform options of the driver, so a
/// configuration block can be deserialized directly:
///
/// ```
/// use nad_control::ReceiverConfig;
///
/// let config = ReceiverConfig::from_json(r#"{
///     "type": "Telnet",
///     "host": "192.168.1.50",
///     "port": 23,
///     "sources": { "1": "Tuner", "3": "CD" }
/// }"#).unwrap();
/// assert_eq!(config.min_volume, -92);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverConfig {
    #[serde(rename = "type", default)]
    pub transport: TransportKind,

    /// Serial device path (RS232 only)
    #[serde(default = "default_serial_port")]
    pub serial_port: String,

    /// Receiver host (Telnet and TCP)
    #[serde(default)]
    pub host: Option<String>,

    /// Telnet control port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_name")]
    pub name: String,

    /// Lower end of the usable volume range in dB
    #[serde(default = "default_min_volume")]
    pub min_volume: i32,

    /// Upper end of the usable volume range in dB
    #[serde(default = "default_max_volume")]
    pub max_volume: i32,

    /// Source index to display name
    #[serde(default)]
    pub sources: BTreeMap<SourceIndex, String>,

    /// Step size in dB for the TCP protocol's volume up/down
    #[serde(default = "default_volume_step")]
    pub volume_step: i32,

    #[serde(default)]
    pub unique_id: Option<String>,
}

fn default_serial_port() -> String {
    "/dev/ttyUSB0".to_string()
}

fn default_port() -> u16 {
    53
}

fn default_name() -> String {
    "NAD Receiver".to_string()
}

fn default_min_volume() -> i32 {
    -92
}

fn default_max_volume() -> i32 {
    -20
}

fn default_volume_step() -> i32 {
    4
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            serial_port: default_serial_port(),
            host: None,
            port: default_port(),
            name: default_name(),
            min_volume: default_min_volume(),
            max_volume: default_max_volume(),
            sources: BTreeMap::new(),
            volume_step: default_volume_step(),
            unique_id: None,
        }
    }
}

impl ReceiverConfig {
    /// Configuration for a receiver on a local serial port
    pub fn rs232(serial_port: impl Into<String>) -> Self {
        Self {
            transport: TransportKind::Rs232,
            serial_port: serial_port.into(),
            ..Self::default()
        }
    }

    /// Configuration for a receiver reachable over Telnet
    pub fn telnet(host: impl Into<String>, port: u16) -> Self {
        Self {
            transport: TransportKind::Telnet,
            host: Some(host.into()),
            port,
            ..Self::default()
        }
    }

    /// Configuration for a receiver speaking the binary TCP protocol
    pub fn tcp(host: impl Into<String>) -> Self {
        Self {
            transport: TransportKind::Tcp,
            host: Some(host.into()),
            ..Self::default()
        }
    }

    /// Set the source table
    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = (SourceIndex, S)>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(|(i, s)| (i, s.into())).collect();
        self
    }

    /// Set the volume bounds in dB
    pub fn with_volume_bounds(mut self, min_volume: i32, max_volume: i32) -> Self {
        self.min_volume = min_volume;
        self.max_volume = max_volume;
        self
    }

    /// Parse and validate a JSON configuration block
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the driver relies on
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("min_volume", self.min_volume), ("max_volume", self.max_volume)] {
            if !VOLUME_BOUNDS_DB.contains(&value) {
                return Err(NadError::Config(format!(
                    "{} ({}) must be within {}..={} dB",
                    field,
                    value,
                    VOLUME_BOUNDS_DB.start(),
                    VOLUME_BOUNDS_DB.end()
                )));
            }
        }

        if self.min_volume >= self.max_volume {
            return Err(NadError::Config(format!(
                "min_volume ({}) must be below max_volume ({})",
                self.min_volume, self.max_volume
            )));
        }

        if !VOLUME_STEP_DB.contains(&self.volume_step) {
            return Err(NadError::Config(format!(
                "volume_step ({}) must be within {}..={} dB",
                self.volume_step,
                VOLUME_STEP_DB.start(),
                VOLUME_STEP_DB.end()
            )));
        }

        if matches!(self.transport, TransportKind::Telnet | TransportKind::Tcp) {
            if self.host.as_deref().map_or(true, str::is_empty) {
                return Err(NadError::Config(format!(
                    "host is required for the {:?} transport",
                    self.transport
                )));
            }
        }

        SourceTable::new(self.sources.clone()).map(|_| ())
    }

    /// Build the source table from the configured mapping
    pub fn source_table(&self) -> Result<SourceTable> {
        SourceTable::new(self.sources.clone())
    }

    /// Configured unique id, or a freshly generated one
    pub fn unique_id_or_generate(&self) -> String {
        self.unique_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }
}

/// Bidirectional mapping between source indices and display names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceTable {
    by_index: BTreeMap<SourceIndex, String>,
    by_name: BTreeMap<String, SourceIndex>,
}

impl SourceTable {
    /// Build a table, rejecting out-of-range indices and duplicate names
    pub fn new(sources: BTreeMap<SourceIndex, String>) -> Result<Self> {
        let mut by_name = BTreeMap::new();
        for (&index, name) in &sources {
            if !(1..=MAX_SOURCE_INDEX).contains(&index) {
                return Err(NadError::Config(format!(
                    "source index {} outside 1..={}",
                    index, MAX_SOURCE_INDEX
                )));
            }
            if by_name.insert(name.clone(), index).is_some() {
                return Err(NadError::Config(format!("duplicate source name {:?}", name)));
            }
        }

        Ok(Self {
            by_index: sources,
            by_name,
        })
    }

    /// Display name for a source index
    pub fn name(&self, index: SourceIndex) -> Option<&str> {
        self.by_index.get(&index).map(String::as_str)
    }

    /// Source index for a display name
    pub fn index(&self, name: &str) -> Option<SourceIndex> {
        self.by_name.get(name).copied()
    }

    /// Display names in alphabetical order
    pub fn names(&self) -> Vec<String> {
        self.by_name.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }
}
