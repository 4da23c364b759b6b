//! Rust library for controlling NAD receivers
//!
//! This library maps a media-player abstraction (power, volume, mute, source)
//! onto NAD receivers reachable over three transports:
//!
//! - **RS232**: the `Main.Power=On` line protocol on a local serial port
//! - **Telnet**: the same line protocol over a network control port
//! - **TCP**: the binary status/command protocol of the D-series amplifiers
//!
//! Line-protocol receivers expose three zones (main, zone2, zone3); TCP
//! receivers expose the main zone only.
//!
//! # Quick Start
//!
//! ```no_run
//! use nad_control::{Receiver, ReceiverConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReceiverConfig::from_json(r#"{
//!         "type": "RS232",
//!         "serial_port": "/dev/ttyUSB0",
//!         "sources": { "1": "Tuner", "3": "CD" }
//!     }"#)?;
//!     let receiver = Receiver::from_config(&config)?;
//!
//!     receiver.update().await;
//!     println!("{:?} at {:?}", receiver.state(), receiver.volume_level());
//!
//!     receiver.turn_on().await?;
//!     receiver.select_source("CD").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Volume**: conversion between normalized volume and receiver units
//! - **Encoder**: command descriptors per zone and action
//! - **Transport**: serial, Telnet and TCP sessions behind two traits
//! - **Decoder**: typed values from raw replies, absent when unparseable
//! - **Session**: the poll/reconciliation engine for each protocol family
//! - **Receiver**: the media-player facade holding the current snapshot
//! - **Services**: the side-channel zone operations

mod config;
mod decoder;
mod encoder;
mod error;
mod poller;
mod protocol;
mod receiver;
mod services;
mod session;
mod subscription;
mod transport;
mod types;
mod volume;

// Public exports
pub use config::{
    ReceiverConfig, SourceTable, MAX_SOURCE_INDEX, VOLUME_BOUNDS_DB, VOLUME_STEP_DB,
};
pub use decoder::{decode_source, decode_status, decode_switch, decode_volume, reply_value};
pub use encoder::{FrameEncoder, LineEncoder};
pub use error::{NadError, Result};
pub use poller::Poller;
pub use protocol::{
    device_source_code, device_source_name, opcode, Frame, Function, LineCommand, Operator,
    DEVICE_SOURCES, TCP_PORT,
};
pub use receiver::Receiver;
pub use services::{Service, ServiceCall, ServiceData, ServiceRegistry, SERVICE_DOMAIN};
pub use session::{LegacySession, PollOutcome, ReconciliationPolicy, TcpSession};
pub use subscription::SnapshotReceiver;
pub use transport::{
    Connector, LineChannel, LineTransport, SerialConnector, SerialTransport, StatusTransport,
    TcpTransport, TelnetConnector, TelnetTransport, TransportHandle,
};
pub use types::{
    DeviceStatus, NativeVolume, PowerState, ReceiverSnapshot, SourceIndex, TransportKind, Zone,
    ZoneAttributes, ZoneSnapshot,
};
pub use volume::{
    db_to_device_scale, DecibelConverter, DeviceScaleConverter, VolumeConverter, VolumeRange,
    DEVICE_SCALE_MAX,
};
