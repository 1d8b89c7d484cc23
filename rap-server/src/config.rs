//! Daemon configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via RAP_CONFIG or --config)
//! 3. Environment variables

use crate::server::{MalformedPolicy, ServerConfig};
use rap_core::MemoryTarget;
use rap_protocol::{Profile, MIN_MAX_MESSAGE_SIZE};
use rap_transport::UdpConfig;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Wire profile shared with every client.
    pub profile: Profile,
    pub network: NetworkConfig,
    pub server: ServerSection,
    /// The in-memory register file being served.
    pub registers: RegistersConfig,
}

impl Config {
    /// Loads configuration from file, then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("RAP_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Loads configuration from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Saves configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`, keyed by environment variable name.
    /// Values that do not parse are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        self.network.apply_overrides(&lookup);
        self.server.apply_overrides(&lookup);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.profile
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        self.network.validate()?;
        self.registers.validate()
    }

    pub fn udp_config(&self) -> UdpConfig {
        self.network.udp_config()
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::default()
            .with_malformed_policy(self.server.on_malformed)
            .with_thread_name(self.server.thread_name.clone())
    }

    /// Builds the register file described by the `registers` section.
    pub fn register_target(&self) -> MemoryTarget {
        let registers = &self.registers;
        registers
            .read_only
            .iter()
            .fold(
                MemoryTarget::for_profile(&self.profile, registers.base, registers.size),
                |target, range| target.with_read_only(range.start..range.end),
            )
    }
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address to bind to.
    #[serde(with = "socket_addr_serde")]
    pub bind_addr: SocketAddr,
    /// Fixed peer. When unset, replies go to the sender of the last command.
    pub remote_addr: Option<SocketAddr>,
    /// Link MTU the message size limit is derived from.
    pub mtu: usize,
    /// Receive timeout in milliseconds. `null` waits indefinitely.
    pub timeout_ms: Option<u64>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 5150)),
            remote_addr: None,
            mtu: rap_transport::udp::DEFAULT_MTU,
            timeout_ms: Some(1000),
        }
    }
}

impl NetworkConfig {
    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(parsed) = lookup("RAP_BIND").and_then(|v| v.parse().ok()) {
            self.bind_addr = parsed;
        }

        if let Some(parsed) = lookup("RAP_REMOTE").and_then(|v| v.parse().ok()) {
            self.remote_addr = Some(parsed);
        }

        if let Some(ms) = lookup("RAP_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.timeout_ms = Some(ms);
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn udp_config(&self) -> UdpConfig {
        let config = UdpConfig::new(self.bind_addr)
            .with_mtu(self.mtu)
            .with_timeout(self.timeout());
        match self.remote_addr {
            Some(remote) => config.with_remote(remote),
            None => config,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let max = self.udp_config().max_message_size();
        if max < MIN_MAX_MESSAGE_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "mtu {} leaves {} bytes per message, need at least {}",
                self.mtu, max, MIN_MAX_MESSAGE_SIZE
            )));
        }
        if self.timeout_ms == Some(0) {
            return Err(ConfigError::ValidationError(
                "timeout_ms must be positive or null".to_string(),
            ));
        }
        Ok(())
    }
}

/// Server engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub on_malformed: MalformedPolicy,
    pub thread_name: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        let defaults = ServerConfig::default();
        Self {
            on_malformed: defaults.on_malformed,
            thread_name: defaults.thread_name,
        }
    }
}

impl ServerSection {
    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(policy) = lookup("RAP_ON_MALFORMED").and_then(|v| v.parse().ok()) {
            self.on_malformed = policy;
        }
    }
}

/// Register window of the in-memory backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistersConfig {
    pub base: u64,
    pub size: u64,
    pub read_only: Vec<AddressRange>,
}

impl Default for RegistersConfig {
    fn default() -> Self {
        Self {
            base: 0,
            size: 0x1_0000,
            read_only: Vec::new(),
        }
    }
}

impl RegistersConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::ValidationError(
                "registers.size must be positive".to_string(),
            ));
        }
        if self.base.checked_add(self.size - 1).is_none() {
            return Err(ConfigError::ValidationError(
                "register window overflows the address space".to_string(),
            ));
        }
        if let Some(range) = self.read_only.iter().find(|r| r.start >= r.end) {
            return Err(ConfigError::ValidationError(format!(
                "empty read-only range {:#x}..{:#x}",
                range.start, range.end
            )));
        }
        Ok(())
    }
}

/// Half-open address range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRange {
    pub start: u64,
    pub end: u64,
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::ValidationError(msg) => {
                write!(f, "configuration validation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// SocketAddr as a plain string in YAML.
mod socket_addr_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::net::SocketAddr;

    pub fn serialize<S>(addr: &SocketAddr, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&addr.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SocketAddr, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
