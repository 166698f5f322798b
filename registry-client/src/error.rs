use reqwest::StatusCode;
use shared::types::DescriptorError;

/// Why a single registry call did not succeed
#[derive(Debug, thiserror::Error)]
pub enum CallFailure {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("registry answered {0}")]
    Status(StatusCode),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Rejected locally; nothing was sent
    #[error("invalid service descriptor: {0}")]
    InvalidDescriptor(#[from] DescriptorError),

    #[error("invalid registry url {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("failed to register service {service_id}: {source}")]
    Registration {
        service_id: String,
        source: CallFailure,
    },

    #[error("failed to fetch health for {service_name}: {source}")]
    Communication {
        service_name: String,
        source: CallFailure,
    },

    #[error("failed to deregister service {service_id}: {source}")]
    Deregistration {
        service_id: String,
        source: CallFailure,
    },
}

pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
