//! Client configuration.
//!
//! A [`ClientConfig`] is fixed when the [`crate::Client`] is built and never
//! changes afterwards; concurrent `convert` calls only ever read it. Build one
//! through [`ClientConfig::builder`], which validates the endpoint up front so
//! a typo fails at construction rather than on the first request.

use crate::error::ConvertError;
use crate::transport::Transport;
use reqwest::Url;
use std::fmt;
use std::sync::Arc;

/// Configuration for a conversion [`crate::Client`].
///
/// # Example
/// ```rust
/// use xmlconvert_client::ClientConfig;
///
/// let config = ClientConfig::builder("https://convert.example.com/api/Fop")
///     .secret("s3cr3t")
///     .request_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.endpoint_url.path(), "/api/Fop");
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Conversion endpoint. The `sig` query parameter is appended per request.
    pub endpoint_url: Url,

    /// Shared signing secret. `None` signs with the empty key.
    pub secret: Option<String>,

    /// Whole-request timeout for the default reqwest transport. Default: none.
    ///
    /// Ignored when [`ClientConfig::transport`] is set; a custom transport
    /// owns its own timeouts.
    pub request_timeout_secs: Option<u64>,

    /// Pre-constructed transport. Takes precedence over the default.
    pub transport: Option<Arc<dyn Transport>>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint_url", &self.endpoint_url.as_str())
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("transport", &self.transport.as_ref().map(|_| "<dyn Transport>"))
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for the given endpoint URL.
    pub fn builder(endpoint_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            endpoint_url: endpoint_url.into(),
            secret: None,
            request_timeout_secs: None,
            transport: None,
        }
    }
}

/// Builder for [`ClientConfig`].
pub struct ClientConfigBuilder {
    endpoint_url: String,
    secret: Option<String>,
    request_timeout_secs: Option<u64>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientConfigBuilder {
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Like [`Self::secret`] but accepts an optional value, e.g. from an
    /// environment variable that may be unset.
    pub fn maybe_secret(mut self, secret: Option<String>) -> Self {
        self.secret = secret;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the configuration, validating the endpoint.
    pub fn build(self) -> Result<ClientConfig, ConvertError> {
        let endpoint_url = Url::parse(self.endpoint_url.trim()).map_err(|e| {
            ConvertError::InvalidConfig(format!(
                "endpoint URL '{}' is not valid: {}",
                self.endpoint_url, e
            ))
        })?;

        if !matches!(endpoint_url.scheme(), "http" | "https") {
            return Err(ConvertError::InvalidConfig(format!(
                "endpoint URL must use http or https, got '{}'",
                endpoint_url.scheme()
            )));
        }

        if self.request_timeout_secs == Some(0) {
            return Err(ConvertError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }

        Ok(ClientConfig {
            endpoint_url,
            secret: self.secret,
            request_timeout_secs: self.request_timeout_secs,
            transport: self.transport,
        })
    }
}
