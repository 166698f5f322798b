use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use anyhow::{bail, Context};
use shared::types::{HealthReport, ServiceDescriptor};
use crate::client::RegistryClient;
use crate::config::PollConfig;
use crate::error::Result;

/// Lifecycle of the registered service, as driven by [`Agent::run`].
///
/// `Polling` is the only repeating state and the shutdown signal is the only way
/// out of it. Health content never moves the agent back to `Unregistered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Unregistered,
    Registered,
    Polling,
    Deregistering,
    Terminated,
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unregistered => "unregistered",
            Self::Registered => "registered",
            Self::Polling => "polling",
            Self::Deregistering => "deregistering",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// What happened during one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub registered: bool,
    pub polls: u64,
    pub deregistered: bool,
    pub state: AgentState,
}

/// Registers one service, polls its health until cancelled, then deregisters it.
pub struct Agent {
    client: RegistryClient,
    descriptor: ServiceDescriptor,
    interval: Duration,
    require_registration: bool,
    state: AgentState,
}

impl Agent {
    pub fn new(client: RegistryClient, descriptor: ServiceDescriptor, poll: &PollConfig) -> Self {
        Self {
            client,
            descriptor,
            interval: poll.interval(),
            require_registration: poll.require_registration,
            state: AgentState::Unregistered,
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    fn transition(&mut self, next: AgentState) {
        tracing::debug!("{}: {} -> {}", self.descriptor.id, self.state, next);
        self.state = next;
    }

    /// Drive the full lifecycle until `cancel` fires.
    ///
    /// Registration failure is reported and polling starts anyway, unless
    /// `require_registration` is set. A failed health poll ends the run with
    /// that error and no deregistration. On cancellation exactly one
    /// deregistration is attempted, whatever its outcome.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<RunSummary> {
        let registered = match self.client.try_register(&self.descriptor).await {
            Ok(()) => {
                tracing::info!(
                    "Service '{}' registered as {} at {}:{}",
                    self.descriptor.name,
                    self.descriptor.id,
                    self.descriptor.address,
                    self.descriptor.port
                );
                self.transition(AgentState::Registered);
                true
            }
            Err(e) if self.require_registration => {
                tracing::error!("{}", e);
                self.transition(AgentState::Terminated);
                return Err(e);
            }
            Err(e) => {
                tracing::warn!("{}; polling anyway", e);
                false
            }
        };

        self.transition(AgentState::Polling);
        let polls = match self.poll_until_cancelled(&cancel).await {
            Ok(polls) => polls,
            Err(e) => {
                tracing::error!("{}", e);
                self.transition(AgentState::Terminated);
                return Err(e);
            }
        };

        tracing::info!("Deregistering service '{}'...", self.descriptor.id);
        self.transition(AgentState::Deregistering);
        let deregistered = self.client.deregister(&self.descriptor.id).await;
        if deregistered {
            tracing::info!("Service '{}' deregistered successfully", self.descriptor.id);
        }
        self.transition(AgentState::Terminated);

        Ok(RunSummary {
            registered,
            polls,
            deregistered,
            state: self.state,
        })
    }

    /// Poll at a fixed interval; returns the number of completed polls once cancelled.
    /// A health request still in flight at cancellation is dropped.
    async fn poll_until_cancelled(&self, cancel: &CancellationToken) -> Result<u64> {
        let mut polls = 0u64;

        while !cancel.is_cancelled() {
            let report = tokio::select! {
                report = self.client.fetch_health(&self.descriptor.name) => report?,
                _ = cancel.cancelled() => {
                    tracing::info!("Shutdown requested, abandoning pending health request");
                    break;
                }
            };
            polls += 1;
            tracing::info!("{}", health_status_line(&report));

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = cancel.cancelled() => {
                    tracing::info!("Shutdown requested, leaving poll loop");
                    break;
                }
            }
        }

        Ok(polls)
    }
}

fn health_status_line(report: &HealthReport) -> String {
    let status = report
        .worst_status()
        .map(|s| s.as_str())
        .unwrap_or("unknown");
    format!(
        "Health Status [{} at {}, {} instance(s), {}]: {}",
        report.service_name(),
        report.fetched_at().format("%Y-%m-%dT%H:%M:%SZ"),
        report.instance_count(),
        status,
        report
    )
}

/// Run `agent` until the first `signal`, then let it deregister.
///
/// Failing to listen for the signal is fatal and nothing is deregistered.
/// A second signal while deregistration is still pending gives up on it.
pub async fn run_until_signal<S, F>(
    mut agent: Agent,
    cancel: CancellationToken,
    mut signal: S,
) -> anyhow::Result<RunSummary>
where
    S: FnMut() -> F,
    F: Future<Output = std::io::Result<()>>,
{
    let agent_cancel = cancel.clone();
    let mut handle = tokio::spawn(async move { agent.run(agent_cancel).await });

    tokio::select! {
        result = &mut handle => {
            return Ok(result.context("Agent task failed")??);
        }
        received = signal() => {
            if let Err(e) = received {
                handle.abort();
                return Err(e).context("Failed to listen for ctrl-c");
            }
            tracing::info!("Shutdown signal received");
            cancel.cancel();
        }
    }

    tokio::select! {
        result = &mut handle => Ok(result.context("Agent task failed")??),
        Ok(()) = signal() => {
            handle.abort();
            bail!("Second shutdown signal, exiting before deregistration finished");
        }
    }
}
