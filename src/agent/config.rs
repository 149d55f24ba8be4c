//! Connection settings for an S3-compatible endpoint.

use std::{fmt, path::Path};

use serde::{Deserialize, Serialize};
use url::{ParseError, Url};

use super::error::{AgentError, Field, Result, TlsError};

/// Settings required to build an [`S3Agent`](super::S3Agent).
///
/// The config is only read during construction; the agent copies what it
/// needs and does not keep a reference to it.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub access_key: String,

    #[serde(skip_serializing)]
    pub secret_key: String,

    /// Endpoint URL, e.g. `https://s3.example.com` or `http://localhost:9000`.
    pub endpoint: String,

    /// PEM encoded CA certificate(s) to trust in addition to the system roots.
    #[serde(default, with = "pem_string")]
    pub root_ca: Option<Vec<u8>>,
}

impl Config {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            endpoint: endpoint.into(),
            root_ca: None,
        }
    }

    pub fn with_root_ca(mut self, root_ca: impl Into<Vec<u8>>) -> Self {
        self.root_ca = Some(root_ca.into());
        self
    }

    /// Loads the root CA from a PEM file.
    pub fn with_root_ca_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let pem = std::fs::read(path).map_err(TlsError::from)?;
        Ok(self.with_root_ca(pem))
    }

    /// Checks that every required field is set and that the endpoint parses.
    ///
    /// Fields are checked in order: endpoint, access key, secret key.
    pub fn validate(&self) -> Result<Endpoint> {
        let endpoint = Endpoint::parse(&self.endpoint)?;

        if self.access_key.is_empty() {
            return Err(AgentError::missing(Field::AccessKey));
        }

        if self.secret_key.is_empty() {
            return Err(AgentError::missing(Field::SecretKey));
        }

        Ok(endpoint)
    }

    /// Returns the endpoint with any embedded user info removed, for logging.
    pub fn endpoint_masked(&self) -> String {
        mask_endpoint(&self.endpoint)
    }

    /// Returns the access key with all but the first four characters hidden.
    pub fn access_key_masked(&self) -> String {
        match self.access_key.char_indices().nth(4) {
            Some((at, _)) => format!("{}***", &self.access_key[..at]),
            None => "*".repeat(self.access_key.chars().count()),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("access_key", &self.access_key_masked())
            .field("secret_key", &"<redacted>")
            .field("endpoint", &self.endpoint_masked())
            .field("root_ca", &self.root_ca.as_ref().map(Vec::len))
            .finish()
    }
}

/// A validated endpoint.
///
/// Keeps the caller's string as given; the SDK receives it unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    raw: String,
    url: Option<Url>,
}

impl Endpoint {
    /// Parses an endpoint string.
    ///
    /// Absolute URLs must be well formed. Scheme-less strings such as
    /// `s3.example.com` are accepted as relative references, as long as
    /// their first path segment has no `:`. Control characters and
    /// malformed `%` escapes outside the query are rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(AgentError::missing(Field::Endpoint));
        }

        if raw.chars().any(|c| c.is_ascii_control()) {
            return Err(AgentError::invalid_endpoint(
                raw,
                "invalid control character in URL",
            ));
        }

        check_escapes(raw)?;

        match Url::parse(raw) {
            Ok(url) => Ok(Self {
                raw: raw.to_owned(),
                url: Some(url),
            }),
            Err(ParseError::RelativeUrlWithoutBase) => {
                if raw.starts_with(':') {
                    return Err(AgentError::invalid_endpoint(raw, "missing protocol scheme"));
                }
                let first_segment = raw.split(['/', '?', '#']).next().unwrap_or_default();
                if first_segment.contains(':') {
                    return Err(AgentError::invalid_endpoint(
                        raw,
                        "first path segment in URL cannot contain colon",
                    ));
                }
                Ok(Self {
                    raw: raw.to_owned(),
                    url: None,
                })
            }
            Err(err) => Err(AgentError::invalid_endpoint(raw, err)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed URL when the endpoint is absolute.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn is_secure(&self) -> bool {
        self.url.as_ref().is_some_and(|url| url.scheme() == "https")
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Every `%` before the query must start a two digit hex escape.
fn check_escapes(raw: &str) -> Result<()> {
    let (head, fragment) = match raw.split_once('#') {
        Some((head, fragment)) => (head, fragment),
        None => (raw, ""),
    };
    let before_query = head.split('?').next().unwrap_or_default();

    for part in [before_query, fragment] {
        let bytes = part.as_bytes();
        for (i, _) in part.match_indices('%') {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                let escape: String = part[i..].chars().take(3).collect();
                return Err(AgentError::invalid_endpoint(
                    raw,
                    format!("invalid URL escape {escape:?}"),
                ));
            }
        }
    }

    Ok(())
}

pub(crate) fn mask_endpoint(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) if url.has_authority() => {
            // Only fails for URLs without a host, excluded above.
            url.set_username("").ok();
            url.set_password(None).ok();
            url.to_string()
        }
        _ => raw.to_owned(),
    }
}

mod pem_string {
    use serde::{ser::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(pem) => {
                let pem = std::str::from_utf8(pem)
                    .map_err(|e| S::Error::custom(format!("root ca is not PEM text: {e}")))?;
                s.serialize_some(pem)
            }
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        Ok(Option::<String>::deserialize(d)?.map(String::into_bytes))
    }
}
