// Copyright 2026 bgpcore Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{Ipv4Addr, SocketAddr};

fn default_true() -> bool {
    true
}

fn default_listen_addr() -> String {
    "0.0.0.0:179".to_string()
}

fn default_peer_asn() -> u32 {
    // AS_TRANS until the operator fills in the real one
    23456
}

fn default_bgp_port() -> u16 {
    179
}

fn default_mode() -> PeerMode {
    PeerMode::Active
}

fn default_connect_retry() -> u64 {
    120
}

fn default_hold_time() -> u16 {
    90
}

fn default_keepalive() -> u64 {
    30
}

fn default_delay_open_secs() -> u64 {
    5
}

fn default_as_origination() -> u64 {
    15
}

fn default_route_advertisement() -> u64 {
    30
}

/// Whether the session dials out or waits for the peer to connect.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PeerMode {
    Active,
    Passive,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct DelayOpen {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_delay_open_secs")]
    pub seconds: u64,
}

impl Default for DelayOpen {
    fn default() -> Self {
        DelayOpen {
            enabled: true,
            seconds: default_delay_open_secs(),
        }
    }
}

/// Per-peer session configuration. Immutable after session start; the FSM
/// holds a snapshot.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PeerConfig {
    #[serde(default = "default_peer_asn")]
    pub asn: u32,
    /// Peer router identifier, used for collision arbitration before the
    /// peer's OPEN arrives.
    pub bgp_id: Ipv4Addr,
    pub host: Ipv4Addr,
    #[serde(default = "default_bgp_port")]
    pub port: u16,
    #[serde(default = "default_mode")]
    pub mode: PeerMode,
    /// Start the session without operator intervention.
    #[serde(default = "default_true")]
    pub automatic: bool,
    #[serde(default = "default_connect_retry")]
    pub connect_retry_secs: u64,
    #[serde(default = "default_hold_time")]
    pub hold_time_secs: u16,
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u64,
    #[serde(default)]
    pub delay_open: DelayOpen,
    /// Pacing interval for locally originated routes; consumed by the
    /// route engine.
    #[serde(default = "default_as_origination")]
    pub as_origination_secs: u64,
    /// MinRouteAdvertisementInterval for UPDATEs sent to this peer.
    #[serde(default = "default_route_advertisement")]
    pub route_advertisement_secs: u64,
    /// RFC 4271 8.2.1.5: permit NOTIFICATION before an OPEN was sent.
    #[serde(default = "default_true")]
    pub notification_without_open: bool,
}

impl PeerConfig {
    pub fn new(host: Ipv4Addr, bgp_id: Ipv4Addr, asn: u32) -> Self {
        PeerConfig {
            asn,
            bgp_id,
            host,
            ..PeerConfig::default()
        }
    }

    /// DelayOpen interval in seconds; zero when disabled.
    pub fn delay_open_secs(&self) -> u64 {
        if self.delay_open.enabled {
            self.delay_open.seconds
        } else {
            0
        }
    }

    pub fn passive(&self) -> bool {
        self.mode == PeerMode::Passive
    }
}

impl Default for PeerConfig {
    fn default() -> Self {
        PeerConfig {
            asn: default_peer_asn(),
            bgp_id: Ipv4Addr::new(127, 0, 0, 1),
            host: Ipv4Addr::LOCALHOST,
            port: default_bgp_port(),
            mode: default_mode(),
            automatic: true,
            connect_retry_secs: default_connect_retry(),
            hold_time_secs: default_hold_time(),
            keepalive_secs: default_keepalive(),
            delay_open: DelayOpen::default(),
            as_origination_secs: default_as_origination(),
            route_advertisement_secs: default_route_advertisement(),
            notification_without_open: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub asn: u32,
    pub router_id: Ipv4Addr,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Prefixes this speaker originates; handed to the route engine.
    #[serde(default)]
    pub networks: Vec<String>,
    #[serde(default)]
    pub peers: Vec<PeerConfig>,
}

impl Config {
    pub fn new(asn: u32, listen_addr: &str, router_id: Ipv4Addr) -> Self {
        Config {
            asn,
            router_id,
            listen_addr: listen_addr.to_string(),
            networks: Vec::new(),
            peers: Vec::new(),
        }
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    /// Get the local bind address for outgoing connections (IP with port 0)
    pub fn get_local_addr(&self) -> Result<SocketAddr, String> {
        let local_ip = self
            .listen_addr
            .split(':')
            .next()
            .ok_or_else(|| "invalid listen_addr format".to_string())?;

        format!("{}:0", local_ip)
            .parse()
            .map_err(|e| format!("failed to parse local bind address: {}", e))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            asn: 65000,
            router_id: Ipv4Addr::new(1, 1, 1, 1),
            listen_addr: default_listen_addr(),
            networks: Vec::new(),
            peers: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_yaml(name: &str, content: &str) -> String {
        let temp_file = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&temp_file).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        temp_file.to_str().unwrap().to_string()
    }

    #[test]
    fn test_config_new() {
        let config = Config::new(65100, "192.168.1.1:179", Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(config.asn, 65100);
        assert_eq!(config.listen_addr, "192.168.1.1:179");
        assert_eq!(config.router_id, Ipv4Addr::new(192, 168, 1, 1));
        assert!(config.peers.is_empty());
    }

    #[test]
    fn test_peer_config_defaults() {
        let peer = PeerConfig::new(
            Ipv4Addr::new(172, 16, 1, 4),
            Ipv4Addr::new(172, 16, 1, 4),
            65001,
        );
        assert_eq!(peer.port, 179);
        assert_eq!(peer.mode, PeerMode::Active);
        assert!(peer.automatic);
        assert_eq!(peer.connect_retry_secs, 120);
        assert_eq!(peer.hold_time_secs, 90);
        assert_eq!(peer.keepalive_secs, 30);
        assert_eq!(peer.delay_open, DelayOpen {
            enabled: true,
            seconds: 5
        });
        assert_eq!(peer.as_origination_secs, 15);
        assert_eq!(peer.route_advertisement_secs, 30);
        assert!(peer.notification_without_open);
    }

    #[test]
    fn test_delay_open_secs() {
        let mut peer = PeerConfig::default();
        assert_eq!(peer.delay_open_secs(), 5);
        peer.delay_open.enabled = false;
        assert_eq!(peer.delay_open_secs(), 0);
    }

    #[test]
    fn test_config_from_file() {
        let temp_file = write_temp_yaml(
            "bgpcore_test_config.yaml",
            concat!(
                "asn: 65200\n",
                "router_id: \"10.0.0.1\"\n",
                "listen_addr: \"10.0.0.1:179\"\n",
                "peers:\n",
                "  - host: \"10.0.0.2\"\n",
                "    bgp_id: \"10.0.0.2\"\n",
                "    asn: 65201\n",
                "    mode: passive\n",
                "    hold_time_secs: 30\n",
            ),
        );

        let config = Config::from_file(&temp_file).unwrap();
        assert_eq!(config.asn, 65200);
        assert_eq!(config.router_id, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(config.peers.len(), 1);

        let peer = &config.peers[0];
        assert_eq!(peer.asn, 65201);
        assert_eq!(peer.mode, PeerMode::Passive);
        assert_eq!(peer.hold_time_secs, 30);
        // Unspecified fields take their defaults
        assert_eq!(peer.port, 179);
        assert!(peer.delay_open.enabled);

        std::fs::remove_file(temp_file).unwrap();
    }

    #[test]
    fn test_config_from_file_not_found() {
        let result = Config::from_file("/nonexistent/path.yaml");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_from_file_invalid_yaml() {
        let temp_file = write_temp_yaml(
            "bgpcore_test_config_invalid.yaml",
            "asn: not_a_number\nrouter_id: \"10.0.0.1\"\n",
        );

        let result = Config::from_file(&temp_file);
        assert!(result.is_err());

        std::fs::remove_file(temp_file).unwrap();
    }

    #[test]
    fn test_get_local_addr() {
        let config = Config::new(65000, "10.0.0.1:179", Ipv4Addr::new(10, 0, 0, 1));
        let addr = config.get_local_addr().unwrap();
        assert_eq!(addr.to_string(), "10.0.0.1:0");
    }
}
