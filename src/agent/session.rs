//! Session parameters and the factory that turns them into an S3 client.

use std::{fmt, time::Duration};

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_smithy_http_client::tls::{self, rustls_provider::CryptoMode};

use super::config::Endpoint;
use super::error::BoxError;
use super::tls::TlsTransport;

/// Region handed to the SDK. The endpoint decides routing; the SDK only
/// requires that some region is set.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Per-attempt timeout of the HTTP client.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(200);

/// Retries after the first attempt, performed by the SDK.
pub const MAX_RETRIES: u32 = 5;

/// S3-compatible backends generally lack virtual-hosted bucket addressing.
pub const FORCE_PATH_STYLE: bool = true;

/// Fixed policy applied to every session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPolicy {
    pub region: String,
    pub http_timeout: Duration,
    pub max_retries: u32,
    pub force_path_style: bool,
}

impl SessionPolicy {
    /// Total attempts the SDK makes for one request.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_owned(),
            http_timeout: HTTP_TIMEOUT,
            max_retries: MAX_RETRIES,
            force_path_style: FORCE_PATH_STYLE,
        }
    }
}

/// HTTP client settings: a TLS transport plus a request timeout.
#[derive(Debug)]
pub struct HttpClient {
    pub transport: TlsTransport,
    pub timeout: Duration,
}

impl HttpClient {
    pub fn new(transport: TlsTransport, timeout: Duration) -> Self {
        Self { transport, timeout }
    }
}

/// Everything a [`ClientFactory`] needs to open a session.
pub struct SessionParams {
    pub access_key: String,
    pub secret_key: String,
    pub endpoint: Endpoint,
    pub policy: SessionPolicy,
    pub http_client: HttpClient,
}

impl fmt::Debug for SessionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionParams")
            .field("access_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("policy", &self.policy)
            .field("http_client", &self.http_client)
            .finish()
    }
}

/// Opens a signed session and returns the API client built from it.
///
/// [`AwsClientFactory`] is the production implementation; tests substitute
/// their own to avoid the SDK.
pub trait ClientFactory {
    type Client;

    fn open(&self, params: SessionParams) -> Result<Self::Client, BoxError>;
}

impl<F: ClientFactory + ?Sized> ClientFactory for &F {
    type Client = F::Client;

    fn open(&self, params: SessionParams) -> Result<Self::Client, BoxError> {
        (**self).open(params)
    }
}

/// Builds an [`aws_sdk_s3::Client`] with static credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsClientFactory;

impl AwsClientFactory {
    const PROVIDER_NAME: &'static str = "s3-agent";
}

impl ClientFactory for AwsClientFactory {
    type Client = aws_sdk_s3::Client;

    fn open(&self, params: SessionParams) -> Result<Self::Client, BoxError> {
        let SessionParams {
            access_key,
            secret_key,
            endpoint,
            policy,
            http_client,
        } = params;

        let max_attempts = policy.max_attempts();
        let credentials =
            Credentials::new(access_key, secret_key, None, None, Self::PROVIDER_NAME);

        let timeout_config = TimeoutConfig::builder()
            .operation_attempt_timeout(http_client.timeout)
            .build();

        let http_client = aws_smithy_http_client::Builder::new()
            .tls_provider(tls::Provider::Rustls(CryptoMode::Ring))
            .tls_context(http_client.transport.into_context())
            .build_https();

        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(policy.region))
            .endpoint_url(endpoint.as_str())
            .force_path_style(policy.force_path_style)
            .retry_config(RetryConfig::standard().with_max_attempts(max_attempts))
            .timeout_config(timeout_config)
            .http_client(http_client)
            .build();

        Ok(aws_sdk_s3::Client::from_conf(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = SessionPolicy::default();
        assert_eq!(policy.region, "us-east-1");
        assert_eq!(policy.http_timeout, Duration::from_secs(200));
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.max_attempts(), 6);
        assert!(policy.force_path_style);
    }

    #[test]
    fn test_params_debug_redacts_credentials() {
        let params = SessionParams {
            access_key: "AKIATEST12345".to_owned(),
            secret_key: "topsecret".to_owned(),
            endpoint: Endpoint::parse("https://s3.example.com").unwrap(),
            policy: SessionPolicy::default(),
            http_client: HttpClient::new(TlsTransport::from_root_ca(None).unwrap(), HTTP_TIMEOUT),
        };
        let debug = format!("{params:?}");
        assert!(!debug.contains("AKIATEST12345"));
        assert!(!debug.contains("topsecret"));
        assert!(debug.contains("s3.example.com"));
    }

    #[test]
    fn test_aws_factory_applies_policy() {
        let params = SessionParams {
            access_key: "AK".to_owned(),
            secret_key: "SK".to_owned(),
            endpoint: Endpoint::parse("https://s3.example.com").unwrap(),
            policy: SessionPolicy::default(),
            http_client: HttpClient::new(TlsTransport::from_root_ca(None).unwrap(), HTTP_TIMEOUT),
        };
        let client = AwsClientFactory.open(params).unwrap();
        let config = client.config();

        assert_eq!(config.region().map(|r| r.to_string()), Some(DEFAULT_REGION.to_owned()));
        assert_eq!(
            config.retry_config().map(|r| r.max_attempts()),
            Some(MAX_RETRIES + 1)
        );
        assert_eq!(
            config
                .timeout_config()
                .and_then(|t| t.operation_attempt_timeout()),
            Some(HTTP_TIMEOUT)
        );
    }
}
