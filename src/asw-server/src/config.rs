// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file support for asw-server.
//!
//! Config is loaded from the `[asw-server]` section of `asw-rs.toml`.
//! Default search order:
//! 1. Path specified via `--config` CLI argument
//! 2. `./asw-rs.toml`
//! 3. `~/.config/asw-rs/asw-rs.toml`
//! 4. `/etc/asw-rs/asw-rs.toml`

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use asw_app::{ConfigError, ConfigFile};
use asw_core::{AntennaCatalog, RadioSet};

const MAX_RADIOS: u8 = 9;
pub const DEFAULT_BAUD: u32 = 9600;

/// Top-level server configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Link to the switch controller
    pub controller: ControllerConfig,
    /// Radios and antennas wired to the switch
    pub switch: SwitchConfig,
    /// HTTP/WebSocket listener
    pub http: HttpConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: Option<String>,
}

/// Controller link configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Access type: "serial", "tcp" or "dummy"
    #[serde(rename = "type")]
    pub access_type: Option<String>,
    /// Serial port path (for serial access)
    pub port: Option<String>,
    /// Baud rate (for serial access, default 9600)
    pub baud: Option<u32>,
    /// Host address (for TCP access)
    pub host: Option<String>,
    /// TCP port (for TCP access)
    pub tcp_port: Option<u16>,
    /// How long to wait for each controller reply, in milliseconds
    pub timeout_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            access_type: None,
            port: None,
            baud: None,
            host: None,
            tcp_port: None,
            timeout_ms: 1500,
        }
    }
}

/// Switch topology.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchConfig {
    /// Number of radio ports
    pub radios: u8,
    /// Antenna display names, in controller port order
    pub antennas: Vec<String>,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            radios: 2,
            antennas: (1..=6).map(|n| format!("Antenna {}", n)).collect(),
        }
    }
}

impl SwitchConfig {
    pub fn radio_set(&self) -> Option<RadioSet> {
        RadioSet::new(self.radios)
    }

    pub fn catalog(&self) -> Option<AntennaCatalog> {
        AntennaCatalog::from_names(self.antennas.iter().cloned())
    }
}

/// HTTP/WebSocket listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// IP address to listen on
    pub listen: IpAddr,
    /// TCP port to listen on
    pub port: u16,
    /// Events buffered per client before a slow client starts losing them
    pub broadcast_capacity: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            broadcast_capacity: 64,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_log_level(self.general.log_level.as_deref())?;
        validate_controller(&self.controller)?;

        if self.switch.radios == 0 || self.switch.radios > MAX_RADIOS {
            return Err(format!(
                "[switch].radios must be within 1..={} (got {})",
                MAX_RADIOS, self.switch.radios
            ));
        }
        if self.switch.antennas.is_empty() {
            return Err("[switch].antennas must list at least one antenna".to_string());
        }
        if self.switch.antennas.len() > AntennaCatalog::MAX_ANTENNAS {
            return Err(format!(
                "[switch].antennas lists {} antennas (max {})",
                self.switch.antennas.len(),
                AntennaCatalog::MAX_ANTENNAS
            ));
        }
        if let Some(pos) = self.switch.antennas.iter().position(|n| n.trim().is_empty()) {
            return Err(format!("[switch].antennas[{}] must not be empty", pos));
        }

        if self.http.port == 0 {
            return Err("[http].port must be > 0".to_string());
        }
        if self.http.broadcast_capacity == 0 {
            return Err("[http].broadcast_capacity must be > 0".to_string());
        }
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        <Self as ConfigFile>::load_from_file(path)
    }

    pub fn load_from_default_paths() -> Result<(Self, Option<PathBuf>), ConfigError> {
        <Self as ConfigFile>::load_from_default_paths()
    }

    pub fn example_combined_toml() -> String {
        #[derive(serde::Serialize)]
        struct Wrapper {
            #[serde(rename = "asw-server")]
            inner: ServerConfig,
        }
        let example = ServerConfig {
            general: GeneralConfig {
                log_level: Some("info".to_string()),
            },
            controller: ControllerConfig {
                access_type: Some("serial".to_string()),
                port: Some("/dev/ttyUSB0".to_string()),
                baud: Some(9600),
                ..ControllerConfig::default()
            },
            switch: SwitchConfig {
                radios: 2,
                antennas: vec![
                    "HexBeam 20m, 15m 10m".to_string(),
                    "Vertical 160m, 80m, 40m".to_string(),
                    "Dipol 80m, 40m, 20m".to_string(),
                    "Long Wire".to_string(),
                    "Antenna 5".to_string(),
                    "Antenna 6".to_string(),
                ],
            },
            http: HttpConfig::default(),
        };
        toml::to_string_pretty(&Wrapper { inner: example }).unwrap_or_default()
    }
}

fn validate_log_level(level: Option<&str>) -> Result<(), String> {
    if let Some(level) = level {
        match level {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(format!(
                    "[general].log_level '{}' is invalid (expected one of: trace, debug, info, warn, error)",
                    level
                ))
            }
        }
    }
    Ok(())
}

fn validate_controller(controller: &ControllerConfig) -> Result<(), String> {
    if controller.timeout_ms == 0 || controller.timeout_ms > 60_000 {
        return Err(format!(
            "[controller].timeout_ms must be within 1..=60000 (got {})",
            controller.timeout_ms
        ));
    }

    let serial_fields_set = controller.port.is_some() || controller.baud.is_some();
    let tcp_fields_set = controller.host.is_some() || controller.tcp_port.is_some();

    // Address may still come from the command line.
    if controller.access_type.is_none() && !serial_fields_set && !tcp_fields_set {
        return Ok(());
    }

    match controller.access_type.as_deref().unwrap_or("serial") {
        "serial" => {
            if controller.port.as_deref().unwrap_or("").trim().is_empty() {
                return Err(
                    "[controller].port must be set for serial access ([controller].type='serial')"
                        .to_string(),
                );
            }
            if controller.baud == Some(0) {
                return Err(
                    "[controller].baud must be > 0 for serial access ([controller].type='serial')"
                        .to_string(),
                );
            }
        }
        "tcp" => {
            if controller.host.as_deref().unwrap_or("").trim().is_empty() {
                return Err(
                    "[controller].host must be set for tcp access ([controller].type='tcp')"
                        .to_string(),
                );
            }
            if controller.tcp_port.unwrap_or(0) == 0 {
                return Err(
                    "[controller].tcp_port must be > 0 for tcp access ([controller].type='tcp')"
                        .to_string(),
                );
            }
        }
        "dummy" => {}
        other => {
            return Err(format!(
                "[controller].type '{}' is invalid (expected 'serial', 'tcp', or 'dummy')",
                other
            ))
        }
    }
    Ok(())
}

impl ConfigFile for ServerConfig {
    fn section_key() -> &'static str {
        "asw-server"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.controller.timeout_ms, 1500);
        assert!(config.controller.access_type.is_none());
        assert_eq!(config.switch.radios, 2);
        assert_eq!(config.switch.antennas.len(), 6);
        assert_eq!(config.http.port, 5000);
        assert_eq!(config.http.broadcast_capacity, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[controller]
type = "serial"
port = "/dev/ttyUSB0"
baud = 9600
"#;

        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.controller.port, Some("/dev/ttyUSB0".to_string()));
        assert_eq!(config.controller.baud, Some(9600));
        assert_eq!(config.switch.radios, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[general]
log_level = "debug"

[controller]
type = "tcp"
host = "192.168.1.50"
tcp_port = 4000
timeout_ms = 800

[switch]
radios = 3
antennas = ["Yagi", "Vertical"]

[http]
listen = "127.0.0.1"
port = 8080
broadcast_capacity = 16
"#;

        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level.as_deref(), Some("debug"));
        assert_eq!(config.controller.access_type.as_deref(), Some("tcp"));
        assert_eq!(config.controller.timeout_ms, 800);
        assert_eq!(config.switch.radio_set().unwrap().count(), 3);
        assert_eq!(config.switch.catalog().unwrap().len(), 2);
        assert_eq!(config.http.listen, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.http.port, 8080);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_example_combined_toml_parses() {
        let example = ServerConfig::example_combined_toml();
        let config = <ServerConfig as ConfigFile>::load_from_str(&example).unwrap();
        assert_eq!(config.switch.antennas[3], "Long Wire");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_log_level() {
        let mut config = ServerConfig::default();
        config.general.log_level = Some("loud".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_timeout_out_of_range() {
        let mut config = ServerConfig::default();
        config.controller.timeout_ms = 0;
        assert!(config.validate().is_err());
        config.controller.timeout_ms = 60_001;
        assert!(config.validate().is_err());
        config.controller.timeout_ms = 60_000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_serial_requires_port() {
        let mut config = ServerConfig::default();
        config.controller.access_type = Some("serial".to_string());
        assert!(config.validate().is_err());
        config.controller.port = Some("/dev/ttyUSB0".to_string());
        assert!(config.validate().is_ok());
        config.controller.baud = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_tcp_requires_host_and_port() {
        let mut config = ServerConfig::default();
        config.controller.access_type = Some("tcp".to_string());
        config.controller.host = Some("bridge.local".to_string());
        assert!(config.validate().is_err());
        config.controller.tcp_port = Some(4000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_access_type() {
        let mut config = ServerConfig::default();
        config.controller.access_type = Some("usb".to_string());
        assert!(config.validate().is_err());
        config.controller.access_type = Some("dummy".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_switch_topology() {
        let mut config = ServerConfig::default();
        config.switch.radios = 0;
        assert!(config.validate().is_err());
        config.switch.radios = 10;
        assert!(config.validate().is_err());
        config.switch.radios = 9;
        assert!(config.validate().is_ok());

        let mut config = ServerConfig::default();
        config.switch.antennas.clear();
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.switch.antennas[2] = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.switch.antennas = (0..100).map(|n| n.to_string()).collect();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_http() {
        let mut config = ServerConfig::default();
        config.http.broadcast_capacity = 0;
        assert!(config.validate().is_err());
    }
}
