use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use serde_json::Value;
use crate::protocol::{CHECK_CRITICAL, CHECK_MAINTENANCE, CHECK_PASSING, CHECK_WARNING};

/// The identity and network metadata presented to the registry on registration.
/// Serializes to the registry's registration payload: `{ID, Name, Address, Port, Tags}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Unique per registry instance
    #[serde(rename = "ID")]
    pub id: String,

    /// Display name, also the key for health lookups
    #[serde(rename = "Name")]
    pub name: String,

    /// Address the service is reachable on, e.g. "127.0.0.1"
    #[serde(rename = "Address")]
    pub address: String,

    /// Service port (1-65535)
    #[serde(rename = "Port")]
    pub port: u16,

    /// Free-form tags
    #[serde(rename = "Tags", default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("service id must not be empty")]
    EmptyId,
    #[error("service name must not be empty")]
    EmptyName,
    #[error("service port must be in 1-65535, got {0}")]
    InvalidPort(u16),
}

impl ServiceDescriptor {
    /// Tags are a set: duplicates are dropped, first occurrence wins.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        port: u16,
        tags: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut unique: Vec<String> = Vec::new();
        for tag in tags {
            if !unique.contains(&tag) {
                unique.push(tag);
            }
        }

        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
            port,
            tags: unique,
        }
    }

    /// Check the invariants the registry relies on. Must pass before any request is sent.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.id.trim().is_empty() {
            return Err(DescriptorError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(DescriptorError::EmptyName);
        }
        if self.port == 0 {
            return Err(DescriptorError::InvalidPort(self.port));
        }
        Ok(())
    }
}

/// Worst-of ordering: Passing < Warning < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckStatus {
    Passing,
    Warning,
    Critical,
}

impl CheckStatus {
    /// Maintenance mode takes the instance out of rotation, so it counts as critical.
    pub fn parse(status: &str) -> Option<Self> {
        match status {
            CHECK_PASSING => Some(Self::Passing),
            CHECK_WARNING => Some(Self::Warning),
            CHECK_CRITICAL | CHECK_MAINTENANCE => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passing => CHECK_PASSING,
            Self::Warning => CHECK_WARNING,
            Self::Critical => CHECK_CRITICAL,
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A snapshot of what the registry reports for one service name.
///
/// The payload schema belongs to the registry and is kept verbatim. The summary
/// helpers only read the common entry shape
/// (`[{"Service": {"Service": name, ..}, "Checks": [{"Status": ..}]}]`)
/// and fall back to empty answers for anything else.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    service_name: String,
    payload: Value,
    fetched_at: DateTime<Utc>,
}

impl HealthReport {
    pub fn new(service_name: impl Into<String>, payload: Value) -> Self {
        Self {
            service_name: service_name.into(),
            payload,
            fetched_at: Utc::now(),
        }
    }

    /// Service name this report was requested for
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn into_payload(self) -> Value {
        self.payload
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    fn entries(&self) -> &[Value] {
        self.payload.as_array().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of service instances listed in the report
    pub fn instance_count(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instance_count() == 0
    }

    /// Whether any entry describes a service registered under `name`
    pub fn contains_service(&self, name: &str) -> bool {
        self.entries().iter().any(|entry| {
            entry
                .pointer("/Service/Service")
                .and_then(Value::as_str)
                .is_some_and(|service| service == name)
        })
    }

    /// Worst check status across all entries, `None` if no recognizable checks
    pub fn worst_status(&self) -> Option<CheckStatus> {
        self.entries()
            .iter()
            .filter_map(|entry| entry.get("Checks").and_then(Value::as_array))
            .flatten()
            .filter_map(|check| check.get("Status").and_then(Value::as_str))
            .filter_map(CheckStatus::parse)
            .max()
    }
}

impl fmt::Display for HealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.payload)
    }
}
