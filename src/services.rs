use crate::error::{NadError, Result};
use crate::types::Zone;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Namespace the services are registered under
pub const SERVICE_DOMAIN: &str = "nadt765";

/// A zone operation callable through the side channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Service {
    TurnOnZone2,
    TurnOffZone2,
    MuteZone2,
    VolumeDownZone2,
    SetVolumeZone2,
    VolumeUpZone2,
    TurnOnZone3,
    TurnOffZone3,
    MuteZone3,
    VolumeDownZone3,
    SetVolumeZone3,
    VolumeUpZone3,
}

impl Service {
    pub const ALL: [Service; 12] = [
        Service::TurnOnZone2,
        Service::TurnOffZone2,
        Service::MuteZone2,
        Service::VolumeDownZone2,
        Service::SetVolumeZone2,
        Service::VolumeUpZone2,
        Service::TurnOnZone3,
        Service::TurnOffZone3,
        Service::MuteZone3,
        Service::VolumeDownZone3,
        Service::SetVolumeZone3,
        Service::VolumeUpZone3,
    ];

    /// Services registered in the current deployment
    pub const REGISTERED: [Service; 2] = [Service::TurnOnZone2, Service::TurnOffZone2];

    /// Service name within [`SERVICE_DOMAIN`]
    pub fn name(self) -> &'static str {
        match self {
            Self::TurnOnZone2 => "Turn_on_Zone2",
            Self::TurnOffZone2 => "Turn_off_Zone2",
            Self::MuteZone2 => "Mute_Zone2",
            Self::VolumeDownZone2 => "Volume_down_Zone2",
            Self::SetVolumeZone2 => "Set_volume_Zone2",
            Self::VolumeUpZone2 => "Volume_up_Zone2",
            Self::TurnOnZone3 => "Turn_on_Zone3",
            Self::TurnOffZone3 => "Turn_off_Zone3",
            Self::MuteZone3 => "Mute_Zone3",
            Self::VolumeDownZone3 => "Volume_down_Zone3",
            Self::SetVolumeZone3 => "Set_volume_Zone3",
            Self::VolumeUpZone3 => "Volume_up_Zone3",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Zone the service acts on
    pub fn zone(self) -> Zone {
        match self {
            Self::TurnOnZone2
            | Self::TurnOffZone2
            | Self::MuteZone2
            | Self::VolumeDownZone2
            | Self::SetVolumeZone2
            | Self::VolumeUpZone2 => Zone::Zone2,
            _ => Zone::Zone3,
        }
    }
}

/// Arguments carried by a service call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ServiceData {
    #[serde(default)]
    pub is_volume_muted: Option<bool>,
    #[serde(default)]
    pub volume_level: Option<f64>,
}

/// A service invocation from the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    #[serde(default)]
    pub data: ServiceData,
}

impl ServiceCall {
    /// Call without arguments in the default domain
    pub fn new(service: Service) -> Self {
        Self {
            domain: SERVICE_DOMAIN.to_string(),
            service: service.name().to_string(),
            data: ServiceData::default(),
        }
    }

    pub fn with_data(mut self, data: ServiceData) -> Self {
        self.data = data;
        self
    }
}

/// Set of services a receiver answers to
///
/// The default registry only exposes zone2 power on/off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRegistry {
    services: BTreeSet<Service>,
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::with_services(Service::REGISTERED)
    }
}

impl ServiceRegistry {
    pub fn with_services(services: impl IntoIterator<Item = Service>) -> Self {
        Self {
            services: services.into_iter().collect(),
        }
    }

    /// Registry exposing every zone operation
    pub fn full() -> Self {
        Self::with_services(Service::ALL)
    }

    pub fn contains(&self, service: Service) -> bool {
        self.services.contains(&service)
    }

    /// Registered service names
    pub fn names(&self) -> Vec<&'static str> {
        self.services.iter().map(|s| s.name()).collect()
    }

    /// Resolve a call to a registered service
    pub fn resolve(&self, call: &ServiceCall) -> Result<Service> {
        if call.domain != SERVICE_DOMAIN {
            return Err(NadError::Unsupported(format!(
                "service domain {:?}",
                call.domain
            )));
        }

        Service::from_name(&call.service)
            .filter(|service| self.contains(*service))
            .ok_or_else(|| {
                NadError::Unsupported(format!("service {}.{}", call.domain, call.service))
            })
    }
}
