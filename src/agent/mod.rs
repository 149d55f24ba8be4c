//! Agent construction pipeline.
//!
//! `Config` → validation → TLS transport → HTTP client → session → `S3Agent`.

mod config;
mod error;
mod s3;
mod session;
mod tls;

pub use config::{Config, Endpoint};
pub use error::{AgentError, BoxError, Field, Result, TlsError};
pub use s3::S3Agent;
pub use session::{
    AwsClientFactory, ClientFactory, HttpClient, SessionParams, SessionPolicy, DEFAULT_REGION,
    FORCE_PATH_STYLE, HTTP_TIMEOUT, MAX_RETRIES,
};
pub use tls::TlsTransport;
