use std::fmt;

use tracing::{debug, error, info, instrument};

use super::config::{mask_endpoint, Config};
use super::error::{AgentError, Result};
use super::session::{AwsClientFactory, ClientFactory, HttpClient, SessionParams, SessionPolicy};
use super::tls::TlsTransport;
use crate::TRACING_TARGET_AGENT;

/// Handle wrapping one S3 API client.
///
/// There is no shutdown; the client lives as long as the handle. Clones share
/// the underlying client when `C` does.
#[derive(Clone)]
pub struct S3Agent<C = aws_sdk_s3::Client> {
    client: C,
    endpoint: String,
    policy: SessionPolicy,
}

impl S3Agent {
    /// Create an `S3Agent` talking to `config.endpoint` with static credentials.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_factory(config, &AwsClientFactory)
    }
}

impl<C> S3Agent<C> {
    /// Create an `S3Agent` whose client is opened by `factory`.
    ///
    /// Stops at the first failing step: validation, TLS transport, then
    /// session. Validation errors are returned as is, TLS failures carry
    /// build context, and factory errors become [`AgentError::Session`].
    #[instrument(skip_all, target = TRACING_TARGET_AGENT, fields(endpoint = %mask_endpoint(&config.endpoint)))]
    pub fn with_factory<F>(config: &Config, factory: &F) -> Result<Self>
    where
        F: ClientFactory<Client = C> + ?Sized,
    {
        let endpoint = config.validate().map_err(|e| {
            error!(target: TRACING_TARGET_AGENT, error = %e, "Configuration validation failed");
            e
        })?;

        let transport = TlsTransport::from_root_ca(config.root_ca.as_deref()).map_err(|e| {
            error!(target: TRACING_TARGET_AGENT, error = %e, "Failed to build TLS transport");
            AgentError::from(e)
        })?;
        debug!(
            target: TRACING_TARGET_AGENT,
            custom_roots = transport.custom_root_count(),
            "TLS transport ready"
        );

        let policy = SessionPolicy::default();
        let http_client = HttpClient::new(transport, policy.http_timeout);

        let params = SessionParams {
            access_key: config.access_key.clone(),
            secret_key: config.secret_key.clone(),
            endpoint: endpoint.clone(),
            policy: policy.clone(),
            http_client,
        };

        let client = factory.open(params).map_err(|e| {
            error!(target: TRACING_TARGET_AGENT, error = %e, "Failed to open S3 session");
            AgentError::Session(e)
        })?;

        info!(
            target: TRACING_TARGET_AGENT,
            access_key = %config.access_key_masked(),
            region = %policy.region,
            path_style = policy.force_path_style,
            max_retries = policy.max_retries,
            "S3 agent initialized"
        );

        Ok(Self {
            client,
            endpoint: endpoint.as_str().to_owned(),
            policy,
        })
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_client(self) -> C {
        self.client
    }

    /// Endpoint the client was built for, as given in the config.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }
}

impl<C> fmt::Debug for S3Agent<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Agent")
            .field("endpoint", &mask_endpoint(&self.endpoint))
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_creation() {
        let config = Config::new("AK", "SK", "https://s3.example.com");
        let agent = S3Agent::new(&config).unwrap();
        assert_eq!(agent.endpoint(), "https://s3.example.com");
        assert!(agent.policy().force_path_style);
    }

    #[test]
    fn test_agent_invalid_config() {
        let config = Config::new("", "", "https://s3.example.com");
        assert!(S3Agent::new(&config).unwrap_err().is_missing_field());
    }

    #[test]
    fn test_agent_debug() {
        let config = Config::new("minioadmin", "minioadmin", "https://u:p@localhost:9000");
        let agent = S3Agent::new(&config).unwrap();
        let debug = format!("{agent:?}");

        assert!(debug.contains("S3Agent"));
        assert!(debug.contains("localhost:9000"));
        assert!(!debug.contains("minioadmin"));
        assert!(!debug.contains("u:p@"));
    }
}
