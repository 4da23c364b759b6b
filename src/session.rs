use crate::config::SourceTable;
use crate::decoder::{decode_source, decode_switch, decode_volume};
use crate::encoder::{FrameEncoder, LineEncoder};
use crate::error::{NadError, Result};
use crate::protocol::{Function, LineCommand};
use crate::transport::{LineTransport, StatusTransport};
use crate::types::{NativeVolume, PowerState, ReceiverSnapshot, TransportKind, Zone, ZoneSnapshot};
use crate::volume::{DecibelConverter, DeviceScaleConverter, VolumeConverter, VolumeRange};
use parking_lot::Mutex;
use std::sync::Arc;

/// How a poll cycle reacts when the receiver cannot be read
///
/// Either way a poll yields a whole new [`ReceiverSnapshot`] or nothing; it is
/// never merged with the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconciliationPolicy {
    /// Line protocol: unreadable main power wipes the snapshot to unknown and
    /// skips the secondary zones for this cycle
    WipeOnMainPowerLoss,

    /// TCP protocol: an unreachable receiver leaves the previous snapshot in
    /// place
    SkipCycleOnUnreachable,
}

impl ReconciliationPolicy {
    pub fn for_transport(kind: TransportKind) -> Self {
        if kind.is_legacy() {
            Self::WipeOnMainPowerLoss
        } else {
            Self::SkipCycleOnUnreachable
        }
    }
}

/// Result of one poll cycle
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// A complete new snapshot
    Updated(ReceiverSnapshot),

    /// Receiver unreachable; the snapshot is replaced by this all-unknown one
    Unavailable(ReceiverSnapshot),

    /// Nothing usable was read; keep the previous snapshot
    Skipped,
}

/// Session for RS232 and Telnet receivers
pub struct LegacySession {
    transport: Arc<dyn LineTransport>,
    sources: SourceTable,
    converter: DecibelConverter,
}

impl LegacySession {
    pub fn new(transport: Arc<dyn LineTransport>, sources: SourceTable, range: VolumeRange) -> Self {
        Self {
            transport,
            sources,
            converter: DecibelConverter::new(range),
        }
    }

    pub fn policy(&self) -> ReconciliationPolicy {
        ReconciliationPolicy::WipeOnMainPowerLoss
    }

    pub fn sources(&self) -> &SourceTable {
        &self.sources
    }

    /// Run one poll cycle over all zones
    pub async fn poll(&self) -> PollOutcome {
        let main_power = self.query_power(Zone::Main).await;
        if main_power == PowerState::Unknown {
            tracing::debug!("Main power unreadable, receiver unavailable");
            return PollOutcome::Unavailable(ReceiverSnapshot::default());
        }

        let mut snapshot = ReceiverSnapshot::default();
        snapshot.main = self.poll_zone(Zone::Main, main_power).await;

        for zone in [Zone::Zone2, Zone::Zone3] {
            let power = self.query_power(zone).await;
            *snapshot.zone_mut(zone) = self.poll_zone(zone, power).await;
        }

        PollOutcome::Updated(snapshot)
    }

    async fn poll_zone(&self, zone: Zone, power: PowerState) -> ZoneSnapshot {
        match power {
            PowerState::Unknown => ZoneSnapshot::unknown(),
            PowerState::Off if zone == Zone::Main => ZoneSnapshot::off(None),
            PowerState::Off => ZoneSnapshot::off(Some(false)),
            PowerState::On => {
                let muted = decode_switch(self.query(zone, Function::Mute).await.as_deref());

                // Some receivers (e.g. C 356BEE) only step volume and cannot report it
                let volume = decode_volume(self.query(zone, Function::Volume).await.as_deref())
                    .map(|db| self.converter.normalize(db));

                let source = decode_source(self.query(zone, Function::Source).await.as_deref())
                    .and_then(|index| self.sources.name(index))
                    .map(str::to_string);

                ZoneSnapshot {
                    power,
                    muted,
                    volume,
                    source,
                }
            }
        }
    }

    async fn query_power(&self, zone: Zone) -> PowerState {
        decode_switch(self.query(zone, Function::Power).await.as_deref()).into()
    }

    /// A failed query reads as no reply
    async fn query(&self, zone: Zone, function: Function) -> Option<String> {
        match self
            .transport
            .send_and_receive(&LineEncoder::query(zone, function))
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Query {}.{} failed: {}", zone, function.name(), e);
                None
            }
        }
    }

    async fn send(&self, command: LineCommand) -> Result<()> {
        self.transport.send(&command).await
    }

    pub async fn power(&self, zone: Zone, on: bool) -> Result<()> {
        self.send(LineEncoder::power(zone, on)).await
    }

    pub async fn volume_up(&self, zone: Zone) -> Result<()> {
        self.send(LineEncoder::volume_up(zone)).await
    }

    pub async fn volume_down(&self, zone: Zone) -> Result<()> {
        self.send(LineEncoder::volume_down(zone)).await
    }

    /// Set volume from the normalized domain
    pub async fn set_volume_level(&self, zone: Zone, volume: f64) -> Result<()> {
        let db = self.converter.denormalize(volume);
        self.send(LineEncoder::set_volume(zone, db)).await
    }

    pub async fn mute(&self, zone: Zone, muted: bool) -> Result<()> {
        self.send(LineEncoder::mute(zone, muted)).await
    }

    pub async fn select_source(&self, zone: Zone, name: &str) -> Result<()> {
        let command = LineEncoder::select_source(zone, &self.sources, name);
        if command.value.is_none() {
            tracing::debug!("Source {:?} not in the source table", name);
        }
        self.send(command).await
    }
}

/// Session for receivers on the binary TCP protocol
///
/// These receivers have a single zone and report it in one status request.
pub struct TcpSession {
    transport: Arc<dyn StatusTransport>,
    converter: DeviceScaleConverter,
    volume_step: i32,
    source_list: Vec<String>,
    /// Device-scale volume from the last successful poll
    last_volume: Mutex<Option<NativeVolume>>,
}

impl TcpSession {
    pub fn new(transport: Arc<dyn StatusTransport>, range: VolumeRange, volume_step: i32) -> Self {
        let source_list = transport.available_sources();
        Self {
            transport,
            converter: DeviceScaleConverter::new(range),
            volume_step,
            source_list,
            last_volume: Mutex::new(None),
        }
    }

    pub fn policy(&self) -> ReconciliationPolicy {
        ReconciliationPolicy::SkipCycleOnUnreachable
    }

    pub fn source_list(&self) -> &[String] {
        &self.source_list
    }

    pub fn last_volume(&self) -> Option<NativeVolume> {
        *self.last_volume.lock()
    }

    /// Run one poll cycle
    pub async fn poll(&self) -> PollOutcome {
        let status = match self.transport.status().await {
            Ok(Some(status)) => status,
            Ok(None) => {
                tracing::debug!("Status reply unusable, keeping previous state");
                return PollOutcome::Skipped;
            }
            Err(e) => {
                tracing::warn!("Status request failed, keeping previous state: {}", e);
                return PollOutcome::Skipped;
            }
        };

        *self.last_volume.lock() = Some(status.volume);

        let main = if status.power {
            ZoneSnapshot {
                power: PowerState::On,
                muted: Some(status.muted),
                volume: Some(self.converter.normalize(f64::from(status.volume))),
                source: status.source,
            }
        } else {
            ZoneSnapshot::off(None)
        };

        PollOutcome::Updated(ReceiverSnapshot {
            main,
            ..ReceiverSnapshot::default()
        })
    }

    pub async fn power(&self, on: bool) -> Result<()> {
        self.transport
            .send_and_receive(&FrameEncoder::power(on))
            .await
            .map(|_| ())
    }

    pub async fn volume_up(&self) -> Result<()> {
        self.step_volume(true).await
    }

    pub async fn volume_down(&self) -> Result<()> {
        self.step_volume(false).await
    }

    async fn step_volume(&self, up: bool) -> Result<()> {
        let Some(current) = self.last_volume() else {
            tracing::warn!("Volume not known yet, ignoring volume step");
            return Ok(());
        };

        match FrameEncoder::volume_step(current, self.volume_step, up) {
            Some(frame) => self.transport.send_and_receive(&frame).await.map(|_| ()),
            None => {
                tracing::debug!("Volume step from {} leaves the device scale", current);
                Ok(())
            }
        }
    }

    /// Set volume from the normalized domain
    pub async fn set_volume_level(&self, volume: f64) -> Result<()> {
        let native = self.converter.denormalize(volume);
        match FrameEncoder::set_volume(native) {
            Some(frame) => self.transport.send_and_receive(&frame).await.map(|_| ()),
            None => {
                tracing::debug!("Volume {} outside the device scale", native);
                Ok(())
            }
        }
    }

    pub async fn mute(&self, muted: bool) -> Result<()> {
        self.transport
            .send_and_receive(&FrameEncoder::mute(muted))
            .await
            .map(|_| ())
    }

    /// Select a device source by name
    ///
    /// Only sent while powered on, when the source differs from the current
    /// one and the name is a known device source.
    pub async fn select_source(&self, name: &str) -> Result<()> {
        let Some(status) = self.transport.status().await? else {
            return Ok(());
        };

        if !status.power || status.source.as_deref() == Some(name) {
            return Ok(());
        }

        match FrameEncoder::select_source(name) {
            Some(frame) => self.transport.send_and_receive(&frame).await.map(|_| ()),
            None => {
                tracing::debug!("Source {:?} not offered by the device", name);
                Ok(())
            }
        }
    }

    /// Zone operations other than main have no TCP encoding
    pub(crate) fn unsupported(&self, operation: &str, zone: Zone) -> NadError {
        NadError::Unsupported(format!("{} on {} over TCP", operation, zone))
    }
}
