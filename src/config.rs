//! Configuration and paths

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// All configurable paths and constants
#[derive(Debug, Clone)]
pub struct Config {
    pub home: PathBuf,
    pub bridge_dir: PathBuf,
    pub credentials_file: PathBuf,
    pub schedule_file: PathBuf,
    pub state_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub listen_addr: SocketAddr,
    pub network_domain: String,
    pub gateway_url: String,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().expect("Could not find home directory");
        let bridge_dir = home.join(".message-bridge");

        Self {
            credentials_file: bridge_dir.join("credentials.json"),
            schedule_file: bridge_dir.join("scheduled_messages.json"),
            state_dir: bridge_dir.join("state"),
            logs_dir: bridge_dir.join("logs"),
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            network_domain: NETWORK_DOMAIN.to_string(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            bridge_dir,
            home,
        }
    }
}

impl Config {
    /// Create config for testing with custom paths
    pub fn for_test(temp_dir: &std::path::Path) -> Self {
        Self {
            home: temp_dir.to_path_buf(),
            bridge_dir: temp_dir.to_path_buf(),
            credentials_file: temp_dir.join("credentials.json"),
            schedule_file: temp_dir.join("scheduled_messages.json"),
            state_dir: temp_dir.join("state"),
            logs_dir: temp_dir.join("logs"),
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
            network_domain: NETWORK_DOMAIN.to_string(),
            gateway_url: "http://127.0.0.1:9/send".to_string(),
        }
    }
}

/// Default listen port for the HTTP surface
pub const DEFAULT_PORT: u16 = 45981;

/// Domain suffix appended to a numeric recipient to form a full address
pub const NETWORK_DOMAIN: &str = "s.whatsapp.net";

/// Local gateway endpoint outbound sends are posted to
pub const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:8090/v1/send";
