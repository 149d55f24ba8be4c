use std::fmt;

/// Boxed error returned by [`ClientFactory`](super::ClientFactory) implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate.
pub type Result<T, E = AgentError> = std::result::Result<T, E>;

/// A required [`Config`](super::Config) field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Endpoint,
    AccessKey,
    SecretKey,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Endpoint => "endpoint",
            Field::AccessKey => "access key",
            Field::SecretKey => "secret key",
        })
    }
}

/// Errors returned while constructing an [`S3Agent`](super::S3Agent).
///
/// Every variant is terminal: a failed construction yields no handle and is
/// not retried.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AgentError {
    /// A required field was empty.
    #[error("{field} is empty")]
    MissingField { field: Field },

    /// The endpoint could not be parsed as a URL.
    #[error("url parse endpoint [{endpoint}] failed, error is [{reason}]")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// The root CA could not be turned into a TLS transport.
    #[error("build tls config failed, error is [{0}]")]
    TlsConfig(#[source] TlsError),

    /// The client factory failed to open a session.
    #[error("open s3 session failed: {0}")]
    Session(#[source] BoxError),
}

impl AgentError {
    pub(crate) fn missing(field: Field) -> Self {
        Self::MissingField { field }
    }

    pub(crate) fn invalid_endpoint(endpoint: &str, reason: impl fmt::Display) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.to_owned(),
            reason: reason.to_string(),
        }
    }

    pub fn is_missing_field(&self) -> bool {
        matches!(self, Self::MissingField { .. })
    }

    pub fn is_invalid_endpoint(&self) -> bool {
        matches!(self, Self::InvalidEndpoint { .. })
    }

    pub fn is_tls_config(&self) -> bool {
        matches!(self, Self::TlsConfig(_))
    }

    pub fn is_session(&self) -> bool {
        matches!(self, Self::Session(_))
    }

    /// Returns the empty field for [`AgentError::MissingField`].
    pub fn missing_field(&self) -> Option<Field> {
        match self {
            Self::MissingField { field } => Some(*field),
            _ => None,
        }
    }
}

impl From<TlsError> for AgentError {
    fn from(err: TlsError) -> Self {
        Self::TlsConfig(err)
    }
}

/// Failures turning root CA bytes into a trust store.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TlsError {
    /// The bytes contained no PEM `CERTIFICATE` block.
    #[error("no certificate found in root ca")]
    NoCertificates,

    /// A PEM block was malformed.
    #[error("decode root ca pem: {0}")]
    Pem(String),

    /// A certificate was decoded but is not a usable trust anchor.
    #[error("invalid root ca certificate #{index}: {source}")]
    InvalidCertificate {
        index: usize,
        #[source]
        source: rustls::Error,
    },

    /// Reading the root CA from disk failed.
    #[error("read root ca: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP client TLS context rejected the trust store.
    #[error("tls context: {0}")]
    Context(#[source] BoxError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_names_the_field() {
        let err = AgentError::missing(Field::AccessKey);
        assert_eq!(err.to_string(), "access key is empty");
        assert_eq!(err.missing_field(), Some(Field::AccessKey));
        assert!(err.is_missing_field());
        assert!(!err.is_tls_config());
    }

    #[test]
    fn tls_errors_carry_build_context() {
        let err = AgentError::from(TlsError::NoCertificates);
        assert!(err.is_tls_config());
        assert_eq!(
            err.to_string(),
            "build tls config failed, error is [no certificate found in root ca]"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn invalid_endpoint_quotes_input() {
        let err = AgentError::invalid_endpoint("http://[::1", "invalid IPv6 address");
        assert!(err.is_invalid_endpoint());
        assert_eq!(err.missing_field(), None);
        assert!(err.to_string().contains("[http://[::1]"));
    }
}
