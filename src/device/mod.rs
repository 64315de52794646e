use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use uuid::Uuid;

/// Scopes advertised in ProbeMatch and Hello when none are configured
pub const DEFAULT_SCOPES: [&str; 4] = [
    "onvif://www.onvif.org/type/video_encoder",
    "onvif://www.onvif.org/type/NetworkVideoTransmitter",
    "onvif://www.onvif.org/Profile/Streaming",
    "onvif://www.onvif.org/location/anywhere",
];

/// Who the device says it is. Built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
#[rustfmt::skip]
pub struct DeviceIdentity {
    pub uuid:               Uuid,
    pub manufacturer:       String,
    pub model:              String,
    pub firmware_version:   String,
    pub serial_number:      String,
    pub hardware_id:        String,
}

/// Where the device can be reached. Snapshot taken at startup and never
/// re-resolved, so an address change needs a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[rustfmt::skip]
pub struct NetworkEndpoint {
    pub ip:          Ipv4Addr,
    pub http_port:   u16,
    pub rtsp_port:   u16,
}

/// HTTP services advertised through XAddrs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Device,
    Events,
    Imaging,
    Media,
    Ptz,
    Analytics,
}

impl Service {
    pub fn path(&self) -> &'static str {
        match self {
            Service::Device => "/onvif/device_service",
            Service::Events => "/onvif/Events",
            Service::Imaging => "/onvif/Imaging",
            Service::Media => "/onvif/Media",
            Service::Ptz => "/onvif/PTZ",
            Service::Analytics => "/onvif/Analytics",
        }
    }
}

impl NetworkEndpoint {
    /// The one place HTTP service addresses are built.
    pub fn service_url(&self, service: Service) -> String {
        format!("http://{}:{}{}", self.ip, self.http_port, service.path())
    }

    pub fn stream_uri(&self) -> String {
        format!("rtsp://{}:{}/", self.ip, self.rtsp_port)
    }
}

/// A single media profile as rendered by GetProfiles
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
#[rustfmt::skip]
pub struct MediaProfile {
    pub token:        String,
    pub name:         String,
    pub width:        u32,
    pub height:       u32,
    pub bitrate:      u32,
    pub frame_rate:   u32,
    pub encoding:     String,
}

impl Default for MediaProfile {
    fn default() -> Self {
        MediaProfile {
            token: "Profile1".to_string(),
            name: "Profile1".to_string(),
            width: 320,
            height: 240,
            bitrate: 135000,
            frame_rate: 5,
            encoding: "H264".to_string(),
        }
    }
}

/// Profiles keyed by token. Iteration follows token order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaProfiles(BTreeMap<String, MediaProfile>);

impl MediaProfiles {
    pub fn single(profile: MediaProfile) -> Self {
        let mut profiles = MediaProfiles::default();
        profiles.insert(profile);
        profiles
    }

    /// Adds a profile, replacing any previous one with the same token.
    pub fn insert(&mut self, profile: MediaProfile) -> Option<MediaProfile> {
        self.0.insert(profile.token.clone(), profile)
    }

    pub fn get(&self, token: &str) -> Option<&MediaProfile> {
        self.0.get(token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaProfile> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything both the responder and the dispatcher read. Shared behind an
/// `Arc` and never mutated once built.
#[derive(Debug, Clone)]
#[rustfmt::skip]
pub struct DeviceContext {
    pub identity:   DeviceIdentity,
    pub endpoint:   NetworkEndpoint,
    pub profiles:   MediaProfiles,
    pub scopes:     Vec<String>,
}

impl DeviceContext {
    pub fn new(identity: DeviceIdentity, endpoint: NetworkEndpoint, profiles: MediaProfiles) -> Self {
        DeviceContext {
            identity,
            endpoint,
            profiles,
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// XAddrs announced over WS-Discovery
    pub fn x_addrs(&self) -> Vec<String> {
        vec![self.endpoint.service_url(Service::Device)]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_context() -> DeviceContext {
        let identity = DeviceIdentity {
            uuid: Uuid::parse_str("5f0c1a2e-8c4b-4d43-9d0e-6a1b2c3d4e5f").unwrap(),
            manufacturer: "Acme".to_string(),
            model: "Cam-1".to_string(),
            firmware_version: "1.0.2".to_string(),
            serial_number: "000001".to_string(),
            hardware_id: "hw-01".to_string(),
        };
        let endpoint = NetworkEndpoint {
            ip: Ipv4Addr::new(10, 0, 0, 5),
            http_port: 8080,
            rtsp_port: 8086,
        };

        DeviceContext::new(identity, endpoint, MediaProfiles::single(MediaProfile::default()))
    }

    #[test]
    fn service_urls_carry_the_port_once() {
        let context = sample_context();

        assert_eq!(
            context.endpoint.service_url(Service::Device),
            "http://10.0.0.5:8080/onvif/device_service"
        );
        assert_eq!(
            context.endpoint.service_url(Service::Media),
            "http://10.0.0.5:8080/onvif/Media"
        );
        assert_eq!(context.endpoint.stream_uri(), "rtsp://10.0.0.5:8086/");
    }

    #[test]
    fn profiles_are_keyed_by_token() {
        let mut profiles = MediaProfiles::single(MediaProfile::default());
        let second = MediaProfile {
            token: "Profile0".to_string(),
            name: "Sub".to_string(),
            ..MediaProfile::default()
        };

        assert!(profiles.insert(second).is_none());
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles.get("Profile0").map(|p| p.name.as_str()), Some("Sub"));

        let tokens: Vec<&str> = profiles.iter().map(|p| p.token.as_str()).collect();
        assert_eq!(tokens, ["Profile0", "Profile1"]);
    }
}
