//! HTTP adapter for the ticket intake workflow API.
//!
//! The backend owns all reasoning (analysis, categorization, clarification).
//! This crate only knows how to reach it: where it lives ([`ClientConfig`]),
//! what goes over the wire ([`protocol`]), and how transient transport
//! failures are retried ([`RetryPolicy`]).

mod client;
mod config;
mod error;
pub mod protocol;
mod retry;

pub use client::HttpWorkflowClient;
pub use client::WorkflowApi;
pub use config::API_URL_ENV_VAR;
pub use config::ClientConfig;
pub use config::DEFAULT_API_PREFIX;
pub use config::DEFAULT_BASE_URL;
pub use error::ClientError;
pub use error::FailureKind;
pub use error::TransportKind;
pub use retry::RetryPolicy;
