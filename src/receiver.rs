use crate::config::ReceiverConfig;
use crate::error::{NadError, Result};
use crate::poller::Poller;
use crate::services::{Service, ServiceCall, ServiceRegistry};
use crate::session::{LegacySession, PollOutcome, ReconciliationPolicy, TcpSession};
use crate::subscription::SnapshotReceiver;
use crate::transport::TransportHandle;
use crate::types::{PowerState, ReceiverSnapshot, TransportKind, Zone, ZoneAttributes};
use crate::volume::VolumeRange;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};

enum Session {
    Legacy(LegacySession),
    Tcp(TcpSession),
}

/// A NAD receiver exposed as a media player
///
/// Commands go straight to the transport. Read accessors answer from the
/// snapshot of the last completed [`update`](Self::update); every update
/// replaces that snapshot wholesale.
///
/// All transport traffic of one receiver is serialized by an internal lock,
/// so commands never interleave with an in-flight poll.
///
/// # Example
///
/// ```no_run
/// use nad_control::{Receiver, ReceiverConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ReceiverConfig::telnet("192.168.1.50", 23).with_sources([(3, "CD")]);
///     let receiver = Receiver::from_config(&config)?;
///
///     receiver.update().await;
///     if receiver.available() {
///         receiver.select_source("CD").await?;
///         receiver.set_volume_level(0.4).await?;
///     }
///     Ok(())
/// }
/// ```
pub struct Receiver {
    name: String,
    unique_id: String,
    kind: TransportKind,
    session: Session,
    services: ServiceRegistry,
    op_lock: Mutex<()>,
    snapshot: RwLock<ReceiverSnapshot>,
    updates: broadcast::Sender<ReceiverSnapshot>,
}

impl Receiver {
    /// Build a receiver and the transport its configuration names
    pub fn from_config(config: &ReceiverConfig) -> Result<Self> {
        config.validate()?;
        let transport = TransportHandle::from_config(config)?;
        Self::with_transport(config, transport)
    }

    /// Build a receiver on an already constructed transport
    pub fn with_transport(config: &ReceiverConfig, transport: TransportHandle) -> Result<Self> {
        config.validate()?;

        let session = match transport {
            TransportHandle::Line(transport) if config.transport.is_legacy() => {
                Session::Legacy(LegacySession::new(
                    transport,
                    config.source_table()?,
                    VolumeRange::decibels(config.min_volume, config.max_volume),
                ))
            }
            TransportHandle::Status(transport) if !config.transport.is_legacy() => {
                Session::Tcp(TcpSession::new(
                    transport,
                    VolumeRange::device_scale(config.min_volume, config.max_volume),
                    config.volume_step,
                ))
            }
            _ => {
                return Err(NadError::Config(format!(
                    "transport does not match type {:?}",
                    config.transport
                )))
            }
        };

        let (updates, _) = broadcast::channel(16);

        Ok(Self {
            name: config.name.clone(),
            unique_id: config.unique_id_or_generate(),
            kind: config.transport,
            session,
            services: ServiceRegistry::default(),
            op_lock: Mutex::new(()),
            snapshot: RwLock::new(ReceiverSnapshot::default()),
            updates,
        })
    }

    /// Replace the set of side-channel services this receiver answers to
    pub fn with_services(mut self, services: ServiceRegistry) -> Self {
        self.services = services;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn transport_kind(&self) -> TransportKind {
        self.kind
    }

    pub fn policy(&self) -> ReconciliationPolicy {
        match &self.session {
            Session::Legacy(session) => session.policy(),
            Session::Tcp(session) => session.policy(),
        }
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    // ========== Polling ==========

    /// Run one poll cycle and replace the snapshot
    ///
    /// Never fails; unreadable values become unknown and an unreachable TCP
    /// receiver leaves the previous snapshot untouched.
    pub async fn update(&self) -> PollOutcome {
        let _op = self.op_lock.lock().await;

        let outcome = match &self.session {
            Session::Legacy(session) => session.poll().await,
            Session::Tcp(session) => session.poll().await,
        };

        match &outcome {
            PollOutcome::Updated(snapshot) | PollOutcome::Unavailable(snapshot) => {
                *self.snapshot.write() = snapshot.clone();
                let _ = self.updates.send(snapshot.clone());
            }
            PollOutcome::Skipped => {}
        }

        outcome
    }

    /// Subscribe to snapshots of completed poll cycles
    pub fn subscribe(&self) -> SnapshotReceiver {
        SnapshotReceiver::new(self.updates.subscribe())
    }

    /// Poll in the background every `period`
    pub fn spawn_poller(self: &Arc<Self>, period: Duration) -> Poller {
        Poller::spawn(Arc::clone(self), period)
    }

    // ========== Snapshot accessors ==========

    pub fn snapshot(&self) -> ReceiverSnapshot {
        self.snapshot.read().clone()
    }

    /// Main zone power
    pub fn state(&self) -> PowerState {
        self.snapshot.read().main.power
    }

    pub fn available(&self) -> bool {
        self.snapshot.read().available()
    }

    pub fn volume_level(&self) -> Option<f64> {
        self.snapshot.read().main.volume
    }

    pub fn is_volume_muted(&self) -> Option<bool> {
        self.snapshot.read().main.muted
    }

    pub fn source(&self) -> Option<String> {
        self.snapshot.read().main.source.clone()
    }

    /// Zone2 and zone3 state reported alongside the main zone
    pub fn extra_state_attributes(&self) -> ZoneAttributes {
        ZoneAttributes::from(&*self.snapshot.read())
    }

    /// Selectable source names
    ///
    /// Line-protocol receivers list the configured names alphabetically; TCP
    /// receivers list the device's own sources.
    pub fn source_list(&self) -> Vec<String> {
        match &self.session {
            Session::Legacy(session) => session.sources().names(),
            Session::Tcp(session) => session.source_list().to_vec(),
        }
    }

    // ========== Main zone ==========

    pub async fn turn_on(&self) -> Result<()> {
        self.zone_turn_on(Zone::Main).await
    }

    pub async fn turn_off(&self) -> Result<()> {
        self.zone_turn_off(Zone::Main).await
    }

    pub async fn volume_up(&self) -> Result<()> {
        self.zone_volume_up(Zone::Main).await
    }

    pub async fn volume_down(&self) -> Result<()> {
        self.zone_volume_down(Zone::Main).await
    }

    /// Set volume, range 0..1
    pub async fn set_volume_level(&self, volume: f64) -> Result<()> {
        self.zone_set_volume_level(Zone::Main, volume).await
    }

    pub async fn mute_volume(&self, mute: bool) -> Result<()> {
        self.zone_mute_volume(Zone::Main, mute).await
    }

    /// Select an input source by display name
    ///
    /// Unknown names are not an error.
    pub async fn select_source(&self, source: &str) -> Result<()> {
        let _op = self.op_lock.lock().await;
        match &self.session {
            Session::Legacy(session) => session.select_source(Zone::Main, source).await,
            Session::Tcp(session) => session.select_source(source).await,
        }
    }

    // ========== Any zone ==========

    pub async fn zone_turn_on(&self, zone: Zone) -> Result<()> {
        self.zone_power(zone, true).await
    }

    pub async fn zone_turn_off(&self, zone: Zone) -> Result<()> {
        self.zone_power(zone, false).await
    }

    async fn zone_power(&self, zone: Zone, on: bool) -> Result<()> {
        let _op = self.op_lock.lock().await;
        match &self.session {
            Session::Legacy(session) => session.power(zone, on).await,
            Session::Tcp(session) if zone == Zone::Main => session.power(on).await,
            Session::Tcp(session) => Err(session.unsupported("power", zone)),
        }
    }

    pub async fn zone_volume_up(&self, zone: Zone) -> Result<()> {
        let _op = self.op_lock.lock().await;
        match &self.session {
            Session::Legacy(session) => session.volume_up(zone).await,
            Session::Tcp(session) if zone == Zone::Main => session.volume_up().await,
            Session::Tcp(session) => Err(session.unsupported("volume up", zone)),
        }
    }

    pub async fn zone_volume_down(&self, zone: Zone) -> Result<()> {
        let _op = self.op_lock.lock().await;
        match &self.session {
            Session::Legacy(session) => session.volume_down(zone).await,
            Session::Tcp(session) if zone == Zone::Main => session.volume_down().await,
            Session::Tcp(session) => Err(session.unsupported("volume down", zone)),
        }
    }

    /// Set a zone's volume, range 0..1; values outside are clamped
    pub async fn zone_set_volume_level(&self, zone: Zone, volume: f64) -> Result<()> {
        if !volume.is_finite() {
            return Err(NadError::InvalidArgument(format!("volume {}", volume)));
        }
        let volume = volume.clamp(0.0, 1.0);

        let _op = self.op_lock.lock().await;
        match &self.session {
            Session::Legacy(session) => session.set_volume_level(zone, volume).await,
            Session::Tcp(session) if zone == Zone::Main => session.set_volume_level(volume).await,
            Session::Tcp(session) => Err(session.unsupported("set volume", zone)),
        }
    }

    pub async fn zone_mute_volume(&self, zone: Zone, mute: bool) -> Result<()> {
        let _op = self.op_lock.lock().await;
        match &self.session {
            Session::Legacy(session) => session.mute(zone, mute).await,
            Session::Tcp(session) if zone == Zone::Main => session.mute(mute).await,
            Session::Tcp(session) => Err(session.unsupported("mute", zone)),
        }
    }

    // ========== Services ==========

    /// Dispatch a side-channel service call
    pub async fn call_service(&self, call: &ServiceCall) -> Result<()> {
        let service = self.services.resolve(call)?;
        let zone = service.zone();
        tracing::debug!("Service {} on {}", service.name(), self.name);

        match service {
            Service::TurnOnZone2 | Service::TurnOnZone3 => self.zone_turn_on(zone).await,
            Service::TurnOffZone2 | Service::TurnOffZone3 => self.zone_turn_off(zone).await,
            Service::VolumeUpZone2 | Service::VolumeUpZone3 => self.zone_volume_up(zone).await,
            Service::VolumeDownZone2 | Service::VolumeDownZone3 => {
                self.zone_volume_down(zone).await
            }
            Service::MuteZone2 | Service::MuteZone3 => {
                let mute = call.data.is_volume_muted.ok_or_else(|| {
                    NadError::InvalidArgument("is_volume_muted is required".to_string())
                })?;
                self.zone_mute_volume(zone, mute).await
            }
            Service::SetVolumeZone2 | Service::SetVolumeZone3 => {
                let volume = call.data.volume_level.ok_or_else(|| {
                    NadError::InvalidArgument("volume_level is required".to_string())
                })?;
                self.zone_set_volume_level(zone, volume).await
            }
        }
    }
}
