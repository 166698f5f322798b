use reqwest::{StatusCode, Url};
use shared::protocol::{DEREGISTER_PATH, HEALTH_SERVICE_PATH, REGISTER_PATH};
use shared::types::{DescriptorError, HealthReport, ServiceDescriptor};
use crate::config::RegistryConfig;
use crate::error::{CallFailure, RegistryError, Result};

/// HTTP client for a Consul-compatible registry agent.
///
/// Every call issues a fresh request and waits for its response; nothing is
/// retried and nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RegistryClient {
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url).map_err(|e| RegistryError::InvalidBaseUrl {
            url: config.url.clone(),
            reason: e.to_string(),
        })?;

        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(RegistryError::InvalidBaseUrl {
                url: config.url.clone(),
                reason: "expected an http(s) url".to_string(),
            });
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| RegistryError::InvalidBaseUrl {
            url: config.url.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append an API path (and optionally one escaped trailing segment) to the base url
    fn endpoint(&self, path: &str, tail: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base urls are rejected in new()
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
            if let Some(tail) = tail {
                segments.push(tail);
            }
        }
        url
    }

    /// Register the service. Succeeds only on an explicit 200 from the registry.
    pub async fn try_register(&self, descriptor: &ServiceDescriptor) -> Result<()> {
        descriptor.validate()?;

        let url = self.endpoint(REGISTER_PATH, None);
        tracing::debug!("PUT {} for {}", url, descriptor.id);

        let failure = |source: CallFailure| RegistryError::Registration {
            service_id: descriptor.id.clone(),
            source,
        };

        let response = self
            .http
            .put(url)
            .json(descriptor)
            .send()
            .await
            .map_err(|e| failure(e.into()))?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(failure(CallFailure::Status(status))),
        }
    }

    /// Register the service, reducing the outcome to a success flag
    pub async fn register(&self, descriptor: &ServiceDescriptor) -> bool {
        match self.try_register(descriptor).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("{}", e);
                false
            }
        }
    }

    /// Fetch the registry's current health entries for `service_name`.
    ///
    /// Any status is accepted as long as the body is JSON; an unknown service
    /// comes back as an empty list rather than an error.
    pub async fn fetch_health(&self, service_name: &str) -> Result<HealthReport> {
        if service_name.trim().is_empty() {
            return Err(DescriptorError::EmptyName.into());
        }

        let failure = |source: CallFailure| RegistryError::Communication {
            service_name: service_name.to_string(),
            source,
        };

        let url = self.endpoint(HEALTH_SERVICE_PATH, Some(service_name));
        tracing::debug!("GET {}", url);

        let response = self.http.get(url).send().await.map_err(|e| failure(e.into()))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| failure(e.into()))?;
        let payload = serde_json::from_slice(&body).map_err(|e| failure(e.into()))?;

        if !status.is_success() {
            tracing::debug!("Health endpoint answered {} for {}", status, service_name);
        }

        Ok(HealthReport::new(service_name, payload))
    }

    /// Remove the service. Succeeds only on an explicit 200 from the registry.
    pub async fn try_deregister(&self, service_id: &str) -> Result<()> {
        if service_id.trim().is_empty() {
            return Err(DescriptorError::EmptyId.into());
        }

        let url = self.endpoint(DEREGISTER_PATH, Some(service_id));
        tracing::debug!("PUT {}", url);

        let failure = |source: CallFailure| RegistryError::Deregistration {
            service_id: service_id.to_string(),
            source,
        };

        let response = self.http.put(url).send().await.map_err(|e| failure(e.into()))?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(failure(CallFailure::Status(status))),
        }
    }

    /// Remove the service, reducing the outcome to a success flag
    pub async fn deregister(&self, service_id: &str) -> bool {
        match self.try_deregister(service_id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("{}", e);
                false
            }
        }
    }
}
