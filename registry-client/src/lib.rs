//! Registers one service with a Consul-compatible registry, polls its health
//! until shut down, then deregisters it.

pub mod agent;
pub mod client;
pub mod config;
pub mod error;

pub use agent::{run_until_signal, Agent, AgentState, RunSummary};
pub use client::RegistryClient;
pub use error::{CallFailure, RegistryError};
