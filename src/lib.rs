//! Construct ready-to-use clients for S3-compatible object stores.
//!
//! An [`S3Agent`] is built from a [`Config`] holding the endpoint, static
//! credentials and an optional root CA. Construction validates the config,
//! builds a TLS transport trusting the supplied CA, and opens a path-style
//! session against the endpoint.
//!
//! ```no_run
//! use s3_agent::{Config, S3Agent};
//!
//! # fn demo() -> s3_agent::Result<()> {
//! let config = Config::new("AK", "SK", "https://s3.example.com");
//! let agent = S3Agent::new(&config)?;
//! let _client: &aws_sdk_s3::Client = agent.client();
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

// Tracing target constants for consistent logging
pub const TRACING_TARGET_AGENT: &str = "s3_agent::agent";
pub const TRACING_TARGET_TLS: &str = "s3_agent::tls";

pub mod agent;

pub use crate::agent::{
    AgentError, AwsClientFactory, BoxError, ClientFactory, Config, Endpoint, Field, HttpClient,
    Result, S3Agent, SessionParams, SessionPolicy, TlsError, TlsTransport,
};
