// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

mod api;
mod config;
mod http;
mod hub;
mod ws;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use asw_app::init_logging;
use asw_backend::{connector, open_link, LinkAccess};
use asw_core::{DynResult, SerialTransport};

use config::{ServerConfig, DEFAULT_BAUD};
use hub::SessionHub;

const PKG_DESCRIPTION: &str = concat!(env!("CARGO_PKG_NAME"), " - antenna switch server");

#[derive(Debug, Parser)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = PKG_DESCRIPTION,
)]
struct Cli {
    /// Path to configuration file
    #[arg(long = "config", short = 'C', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print example configuration and exit
    #[arg(long = "print-config")]
    print_config: bool,
    /// Access method to reach the switch controller
    #[arg(short = 'a', long = "access", value_enum)]
    access: Option<AccessKind>,
    /// Controller address:
    /// when access is serial: <path> <baud>;
    /// when access is TCP: <host>:<port>
    #[arg(value_name = "CONTROLLER_ADDR")]
    controller_addr: Option<String>,
    /// IP address for the HTTP/WebSocket listener
    #[arg(short = 'l', long = "listen")]
    listen: Option<IpAddr>,
    /// Port for the HTTP/WebSocket listener
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,
    /// Controller reply timeout in milliseconds
    #[arg(short = 't', long = "timeout-ms")]
    timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AccessKind {
    Serial,
    Tcp,
    Dummy,
}

/// Parse a serial controller address of the form "<path> <baud>".
fn parse_serial_addr(addr: &str) -> DynResult<(String, u32)> {
    let mut parts = addr.split_whitespace();
    let path = parts
        .next()
        .ok_or("Serial controller address must be '<path> <baud>'")?;
    let baud_str = parts
        .next()
        .ok_or("Serial controller address must be '<path> <baud>'")?;
    if parts.next().is_some() {
        return Err("Serial controller address must be '<path> <baud>' (got extra data)".into());
    }
    let baud: u32 = baud_str
        .parse()
        .map_err(|e| format!("Invalid baud '{}': {}", baud_str, e))?;
    Ok((path.to_string(), baud))
}

/// Resolved configuration after merging config file and CLI arguments.
#[derive(Debug)]
struct ResolvedConfig {
    access: LinkAccess,
    timeout: Duration,
    listen: SocketAddr,
}

fn resolve_config(cli: &Cli, cfg: &ServerConfig) -> DynResult<ResolvedConfig> {
    let access_type = cli
        .access
        .map(|a| match a {
            AccessKind::Serial => "serial",
            AccessKind::Tcp => "tcp",
            AccessKind::Dummy => "dummy",
        })
        .or(cfg.controller.access_type.as_deref());

    let access = match access_type {
        Some("serial") | None => {
            let (path, baud) = if let Some(ref addr) = cli.controller_addr {
                parse_serial_addr(addr)?
            } else if let Some(port) = &cfg.controller.port {
                (port.clone(), cfg.controller.baud.unwrap_or(DEFAULT_BAUD))
            } else {
                return Err("Serial access requires a port. Use '<path> <baud>' argument or set [controller].port in config.".into());
            };
            LinkAccess::Serial { path, baud }
        }
        Some("tcp") => {
            let addr = if let Some(ref addr) = cli.controller_addr {
                addr.clone()
            } else if let (Some(host), Some(port)) = (&cfg.controller.host, cfg.controller.tcp_port)
            {
                format!("{}:{}", host, port)
            } else {
                return Err("TCP access requires host:port. Use argument or set [controller].host and .tcp_port in config.".into());
            };
            LinkAccess::Tcp { addr }
        }
        Some("dummy") => {
            let antennas = u8::try_from(cfg.switch.antennas.len())
                .map_err(|_| "Too many antennas for the dummy controller")?;
            LinkAccess::Dummy {
                radios: cfg.switch.radios,
                antennas,
            }
        }
        Some(other) => return Err(format!("Unknown access type: {}", other).into()),
    };

    let timeout_ms = cli.timeout_ms.unwrap_or(cfg.controller.timeout_ms);
    if timeout_ms == 0 {
        return Err("Controller timeout must be > 0".into());
    }

    let listen = SocketAddr::new(
        cli.listen.unwrap_or(cfg.http.listen),
        cli.port.unwrap_or(cfg.http.port),
    );

    Ok(ResolvedConfig {
        access,
        timeout: Duration::from_millis(timeout_ms),
        listen,
    })
}

#[tokio::main]
async fn main() -> DynResult<()> {
    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", ServerConfig::example_combined_toml());
        return Ok(());
    }

    let (cfg, config_path) = if let Some(ref path) = cli.config {
        let cfg = ServerConfig::load_from_file(path)?;
        (cfg, Some(path.clone()))
    } else {
        ServerConfig::load_from_default_paths()?
    };
    cfg.validate()
        .map_err(|e| format!("Invalid server configuration: {}", e))?;

    init_logging(cfg.general.log_level.as_deref());

    if let Some(ref path) = config_path {
        info!("Loaded configuration from {}", path.display());
    }

    let resolved = resolve_config(&cli, &cfg)?;
    let radios = cfg.switch.radio_set().ok_or("[switch].radios must be > 0")?;
    let catalog = cfg
        .switch
        .catalog()
        .ok_or("[switch].antennas is not a valid antenna list")?;

    match &resolved.access {
        LinkAccess::Serial { path, baud } => {
            info!("Starting asw-server (access: serial {} @ {} baud)", path, baud)
        }
        LinkAccess::Tcp { addr } => info!("Starting asw-server (access: tcp {})", addr),
        LinkAccess::Dummy { .. } => info!("Starting asw-server (access: dummy)"),
    }
    info!(
        "{} radios, {} antennas, reply timeout {:?}",
        radios.count(),
        catalog.len(),
        resolved.timeout
    );

    let link = open_link(&resolved.access).await?;
    let transport = SerialTransport::new(link, resolved.timeout)
        .with_connector(connector(resolved.access.clone()));

    match transport.identify().await {
        Ok(banner) => info!("Controller: {}", banner),
        Err(e) => warn!("Controller did not identify itself: {}", e),
    }

    let hub = Arc::new(SessionHub::new(
        Arc::new(transport),
        Arc::new(catalog),
        radios,
        cfg.http.broadcast_capacity,
    ));

    http::serve(resolved.listen, hub).await?;
    info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("asw-server").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_serial_addr() {
        assert_eq!(
            parse_serial_addr("/dev/ttyUSB0 9600").unwrap(),
            ("/dev/ttyUSB0".to_string(), 9600)
        );
        assert!(parse_serial_addr("/dev/ttyUSB0").is_err());
        assert!(parse_serial_addr("/dev/ttyUSB0 fast").is_err());
        assert!(parse_serial_addr("/dev/ttyUSB0 9600 8N1").is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cfg = ServerConfig::default();
        let resolved = resolve_config(
            &cli(&["-a", "tcp", "bridge.local:4000", "-p", "8080", "-t", "250"]),
            &cfg,
        )
        .unwrap();
        assert_eq!(
            resolved.access,
            LinkAccess::Tcp {
                addr: "bridge.local:4000".to_string()
            }
        );
        assert_eq!(resolved.timeout, Duration::from_millis(250));
        assert_eq!(resolved.listen.port(), 8080);
    }

    #[test]
    fn test_serial_from_config() {
        let mut cfg = ServerConfig::default();
        cfg.controller.port = Some("/dev/ttyACM0".to_string());
        cfg.controller.baud = Some(9600);
        let resolved = resolve_config(&cli(&[]), &cfg).unwrap();
        assert_eq!(
            resolved.access,
            LinkAccess::Serial {
                path: "/dev/ttyACM0".to_string(),
                baud: 9600
            }
        );
        assert_eq!(resolved.timeout, Duration::from_millis(1500));
        assert_eq!(resolved.listen.port(), 5000);
    }

    #[test]
    fn test_serial_baud_defaults() {
        let mut cfg = ServerConfig::default();
        cfg.controller.port = Some("/dev/ttyUSB1".to_string());
        let resolved = resolve_config(&cli(&["-a", "serial"]), &cfg).unwrap();
        assert_eq!(
            resolved.access,
            LinkAccess::Serial {
                path: "/dev/ttyUSB1".to_string(),
                baud: DEFAULT_BAUD
            }
        );
    }

    #[test]
    fn test_serial_requires_address() {
        assert!(resolve_config(&cli(&[]), &ServerConfig::default()).is_err());
    }

    #[test]
    fn test_dummy_uses_switch_topology() {
        let resolved = resolve_config(&cli(&["-a", "dummy"]), &ServerConfig::default()).unwrap();
        assert_eq!(
            resolved.access,
            LinkAccess::Dummy {
                radios: 2,
                antennas: 6
            }
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(resolve_config(&cli(&["-a", "dummy", "-t", "0"]), &ServerConfig::default()).is_err());
    }
}
