use std::path::Path;
use std::time::Duration;
use serde::Deserialize;
use anyhow::{bail, Context, Result};
use shared::protocol::DEFAULT_REGISTRY_URL;
use shared::types::ServiceDescriptor;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub poll: PollConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_url")]
    pub url: String,
    /// Unset keeps the HTTP client's own default
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Falls back to `name` when omitted
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// Stop before polling when registration fails
    #[serde(default)]
    pub require_registration: bool,
}

fn default_url() -> String {
    DEFAULT_REGISTRY_URL.to_string()
}

fn default_name() -> String {
    "example-service".to_string()
}

fn default_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_tags() -> Vec<String> {
    vec!["example".to_string()]
}

fn default_interval() -> u64 {
    5
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            request_timeout_secs: None,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            id: None,
            name: default_name(),
            address: default_address(),
            port: default_port(),
            tags: default_tags(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            require_registration: false,
        }
    }
}

impl RegistryConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl ServiceConfig {
    /// Build the descriptor presented at registration
    pub fn descriptor(&self) -> Result<ServiceDescriptor> {
        let id = self.id.clone().unwrap_or_else(|| self.name.clone());
        let descriptor = ServiceDescriptor::new(
            id,
            self.name.clone(),
            self.address.clone(),
            self.port,
            self.tags.iter().cloned(),
        );
        descriptor.validate().context("Invalid [service] section")?;
        Ok(descriptor)
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll.interval_secs == 0 {
            bail!("poll.interval_secs must be greater than zero");
        }
        self.service.descriptor()?;
        Ok(())
    }
}
