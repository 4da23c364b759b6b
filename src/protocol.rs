use crate::types::Zone;
use std::fmt;

/// Function addressed by a line command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Power,
    Volume,
    Mute,
    Source,
}

impl Function {
    pub fn name(self) -> &'static str {
        match self {
            Self::Power => "Power",
            Self::Volume => "Volume",
            Self::Mute => "Mute",
            Self::Source => "Source",
        }
    }
}

/// Line protocol operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Query,
    Set,
    Increment,
    Decrement,
}

impl Operator {
    pub fn symbol(self) -> char {
        match self {
            Self::Query => '?',
            Self::Set => '=',
            Self::Increment => '+',
            Self::Decrement => '-',
        }
    }
}

/// One line protocol command, e.g. `Zone2.Power=On`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineCommand {
    pub zone: Zone,
    pub function: Function,
    pub operator: Operator,
    /// Argument for `=`; `None` renders as an empty argument
    pub value: Option<String>,
}

impl LineCommand {
    /// Create a command without a value
    pub fn new(zone: Zone, function: Function, operator: Operator) -> Self {
        Self {
            zone,
            function,
            operator,
            value: None,
        }
    }

    /// Create a query command (`?`)
    pub fn query(zone: Zone, function: Function) -> Self {
        Self::new(zone, function, Operator::Query)
    }

    /// Set the command value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// `Zone.Function` prefix that replies to this command start with
    pub fn key(&self) -> String {
        format!("{}.{}", self.zone.prefix(), self.function.name())
    }

    /// Command text without framing
    pub fn to_wire(&self) -> String {
        format!(
            "{}{}{}",
            self.key(),
            self.operator.symbol(),
            self.value.as_deref().unwrap_or("")
        )
    }
}

impl fmt::Display for LineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

/// TCP port of the binary protocol
pub const TCP_PORT: u16 = 50001;

/// Length in hex digits of one status chunk in a reply
pub const STATUS_CHUNK_LEN: usize = 10;

/// Opcodes of the binary TCP protocol, as hex strings
pub mod opcode {
    pub const POWERSAVE: &str = "00010207";
    pub const OFF: &str = "0001020900";
    pub const ON: &str = "0001020901";
    pub const VOLUME: &str = "00010204";
    pub const MUTE: &str = "0001020a";
    pub const SOURCE: &str = "00010203";

    pub const POLL_VOLUME: &str = "0001020204";
    pub const POLL_POWER: &str = "0001020209";
    pub const POLL_MUTED: &str = "000102020a";
    pub const POLL_SOURCE: &str = "0001020203";
}

/// Sources known to TCP receivers, in display order, with their codes
pub const DEVICE_SOURCES: [(&str, &str); 8] = [
    ("Coaxial 1", "00"),
    ("Coaxial 2", "01"),
    ("Optical 1", "02"),
    ("Optical 2", "03"),
    ("Computer", "04"),
    ("Airplay", "05"),
    ("Dock", "06"),
    ("Bluetooth", "07"),
];

/// Code for a device source name
pub fn device_source_code(name: &str) -> Option<&'static str> {
    DEVICE_SOURCES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, code)| *code)
}

/// Device source name for a code
pub fn device_source_name(code: &str) -> Option<&'static str> {
    DEVICE_SOURCES
        .iter()
        .find(|(_, c)| c.eq_ignore_ascii_case(code))
        .map(|(name, _)| *name)
}

/// One binary TCP message, held as lowercase hex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    hex: String,
    expects_reply: bool,
}

impl Frame {
    /// A frame sent without waiting for a reply
    pub fn new(hex: impl Into<String>) -> Self {
        Self {
            hex: hex.into(),
            expects_reply: false,
        }
    }

    /// Concatenate several opcodes into one frame
    pub fn concat(parts: &[&str]) -> Self {
        Self::new(parts.concat())
    }

    /// Mark this frame as one whose reply should be read
    pub fn with_reply(mut self) -> Self {
        self.expects_reply = true;
        self
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }

    pub fn expects_reply(&self) -> bool {
        self.expects_reply
    }

    /// Raw bytes to put on the wire
    pub fn to_bytes(&self) -> Result<Vec<u8>, hex::FromHexError> {
        hex::decode(&self.hex)
    }
}
