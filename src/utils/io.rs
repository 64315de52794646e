use crate::device::{
    DeviceContext, DeviceIdentity, MediaProfile, MediaProfiles, NetworkEndpoint, DEFAULT_SCOPES,
};
use crate::discovery::ResponderOptions;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

/// Runtime configuration, read from a TOML file. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub device: DeviceConfig,
    pub network: NetworkConfig,
    pub discovery: DiscoveryConfig,
    pub profile: MediaProfile,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
#[rustfmt::skip]
pub struct DeviceConfig {
    pub uuid:               Option<Uuid>,
    pub manufacturer:       String,
    pub model:              String,
    pub firmware_version:   String,
    pub serial_number:      String,
    pub hardware_id:        Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
#[rustfmt::skip]
pub struct NetworkConfig {
    pub ip:          Option<Ipv4Addr>,
    pub http_port:   u16,
    pub rtsp_port:   u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
#[rustfmt::skip]
pub struct DiscoveryConfig {
    pub hello:                bool,
    pub hello_interval_ms:    u64,
    pub restart_backoff_ms:   u64,
    pub scopes:               Vec<String>,
}

/// Credentials are carried for the HTTP host but never checked here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            uuid: None,
            manufacturer: "Generic".to_string(),
            model: "IPCamera".to_string(),
            firmware_version: env!("CARGO_PKG_VERSION").to_string(),
            serial_number: "000001".to_string(),
            hardware_id: None,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            ip: None,
            http_port: 8080,
            rtsp_port: 8086,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        let defaults = ResponderOptions::default();

        DiscoveryConfig {
            hello: defaults.hello,
            hello_interval_ms: defaults.hello_interval.as_millis() as u64,
            restart_backoff_ms: defaults.restart_backoff.as_millis() as u64,
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("[Config][load] Failed to read {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("[Config][load] Failed to parse {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Freezes the configuration into the context shared by the responder
    /// and the dispatcher. Fills in the device uuid and local address when
    /// the file leaves them out.
    pub fn device_context(&self) -> Result<DeviceContext> {
        let uuid = match self.device.uuid {
            Some(uuid) => uuid,
            None => {
                let uuid = Uuid::new_v4();
                warn!("[Config] No device uuid configured, using {uuid} for this run only");
                uuid
            }
        };

        let ip = match self.network.ip {
            Some(ip) => ip,
            None => {
                let ip = local_ipv4()?;
                info!("[Config] Detected local address {ip}");
                ip
            }
        };

        let identity = DeviceIdentity {
            uuid,
            manufacturer: self.device.manufacturer.clone(),
            model: self.device.model.clone(),
            firmware_version: self.device.firmware_version.clone(),
            serial_number: self.device.serial_number.clone(),
            hardware_id: self
                .device
                .hardware_id
                .clone()
                .unwrap_or_else(|| uuid.to_string()),
        };

        let endpoint = NetworkEndpoint {
            ip,
            http_port: self.network.http_port,
            rtsp_port: self.network.rtsp_port,
        };

        let context = DeviceContext::new(identity, endpoint, MediaProfiles::single(self.profile.clone()))
            .with_scopes(self.discovery.scopes.clone());

        Ok(context)
    }

    pub fn responder_options(&self) -> ResponderOptions {
        ResponderOptions {
            hello: self.discovery.hello,
            hello_interval: Duration::from_millis(self.discovery.hello_interval_ms),
            restart_backoff: Duration::from_millis(self.discovery.restart_backoff_ms),
        }
    }
}

/// First non-loopback IPv4 address of this host
fn local_ipv4() -> Result<Ipv4Addr> {
    let interfaces = get_if_addrs::get_if_addrs()
        .context("[Config][local_ipv4] Unable to list network interfaces")?;

    interfaces
        .iter()
        .filter(|iface| !iface.is_loopback())
        .find_map(|iface| match iface.ip() {
            IpAddr::V4(ip) => Some(ip),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| anyhow!("[Config][local_ipv4] No IPv4 interface found, set network.ip"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();

        assert_eq!(config.network.http_port, 8080);
        assert_eq!(config.network.rtsp_port, 8086);
        assert!(!config.discovery.hello);
        assert_eq!(config.discovery.hello_interval_ms, 1000);
        assert_eq!(config.profile, MediaProfile::default());
        assert!(config.auth.username.is_none());
    }

    #[test]
    fn file_values_reach_the_context() {
        let config = Config::from_toml(
            r#"
            [device]
            uuid = "5f0c1a2e-8c4b-4d43-9d0e-6a1b2c3d4e5f"
            manufacturer = "Acme"
            model = "Cam-1"

            [network]
            ip = "192.168.1.20"
            http_port = 8081
            rtsp_port = 554

            [discovery]
            hello = true
            scopes = ["onvif://www.onvif.org/type/video_encoder"]

            [profile]
            width = 1280
            height = 720

            [auth]
            username = "admin"
            password = "secret"
            "#,
        )
        .unwrap();

        let context = config.device_context().unwrap();

        assert_eq!(context.identity.manufacturer, "Acme");
        assert_eq!(context.identity.hardware_id, "5f0c1a2e-8c4b-4d43-9d0e-6a1b2c3d4e5f");
        assert_eq!(context.endpoint.ip, Ipv4Addr::new(192, 168, 1, 20));
        assert_eq!(context.endpoint.stream_uri(), "rtsp://192.168.1.20:554/");
        assert_eq!(context.scopes.len(), 1);

        let profile = context.profiles.get("Profile1").unwrap();
        assert_eq!((profile.width, profile.height), (1280, 720));
        assert_eq!(profile.encoding, "H264");

        assert!(config.responder_options().hello);
        assert_eq!(config.auth.username.as_deref(), Some("admin"));
    }

    #[test]
    fn unknown_types_are_reported() {
        assert!(Config::from_toml("[network]\nhttp_port = \"eighty\"").is_err());
    }
}
