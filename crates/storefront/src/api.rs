//! HTTP client for the catalog backend REST API.
//!
//! Wraps `reqwest` with typed endpoints for the two calls the page makes:
//! `GET /products/{key}` and `POST /sessions`. The sessions endpoint
//! answers 2xx for rejected credentials too, carrying an `error` field in
//! the body; [`StoreClient::create_session`] checks that field explicitly
//! and reports rejection as a [`SignInOutcome`], not as an [`ApiError`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use secrecy::ExposeSecret;
use tracing::instrument;
use url::Url;

use crate::catalog::QueryKey;
use crate::config::ApiConfig;
use crate::models::{Credentials, Product, SessionRecord};

/// Errors returned by the catalog backend client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Network or TLS failure from the underlying HTTP client, or a non-2xx
    /// HTTP status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured base URL cannot be used to build request URLs.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result of a sign-in attempt that produced a response.
#[derive(Debug, Clone)]
pub enum SignInOutcome {
    /// The backend issued a session record.
    Accepted(SessionRecord),
    /// The backend answered 2xx but the body carried an `error` field.
    Rejected {
        /// The `error` field's value, for inline display.
        message: String,
        /// The full response body as received.
        body: serde_json::Value,
    },
}

/// Client for the catalog backend.
///
/// Cheaply cloneable; all clones share one connection pool. Use
/// [`StoreClient::new`] for production or [`StoreClient::with_base_url`]
/// to point at a mock server in tests.
#[derive(Clone)]
pub struct StoreClient {
    inner: Arc<StoreClientInner>,
}

struct StoreClientInner {
    client: Client,
    base_url: Url,
}

impl StoreClient {
    /// Creates a new client from API configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ApiError::InvalidBaseUrl`] if the
    /// configured base URL is unusable.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::with_base_url(&config.base_url, config.timeout_secs)
    }

    /// Creates a new client with an explicit base URL (for testing with
    /// wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ApiError::InvalidBaseUrl`] if `base_url`
    /// does not parse or cannot take path segments.
    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("vitrine/0.1 (storefront)")
            .build()?;

        // Normalise: ensure the base URL ends with exactly one slash so that
        // appended path segments extend the base path rather than replacing
        // its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| ApiError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: "URL cannot take path segments".to_owned(),
            });
        }

        Ok(Self {
            inner: Arc::new(StoreClientInner {
                client,
                base_url: parsed,
            }),
        })
    }

    /// Fetches the product list for a derived query key.
    ///
    /// Calls `GET /products/{key}`. The server owns sorting and filtering;
    /// the response array is returned in server order.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] on network failure or non-2xx HTTP status.
    /// - [`ApiError::Deserialize`] if the response is not a product array.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn fetch_products(&self, key: &QueryKey) -> Result<Vec<Product>, ApiError> {
        let url = self.products_url(key)?;
        let response = self.inner.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "failed to parse product list response"
            );
            ApiError::Deserialize {
                context: format!("GET {url}"),
                source: e,
            }
        })
    }

    /// Attempts a sign-in against `POST /sessions`.
    ///
    /// The backend reports rejected credentials with a 2xx response whose
    /// body carries an `error` field; that field is checked before the body
    /// is parsed as a [`SessionRecord`]. Both outcomes are `Ok` here since
    /// the request itself succeeded.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] on network failure or non-2xx HTTP status.
    /// - [`ApiError::Deserialize`] if the body is not JSON, or has no
    ///   `error` field but does not parse as a session record.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn create_session(
        &self,
        credentials: &Credentials,
    ) -> Result<SignInOutcome, ApiError> {
        let url = self.sessions_url()?;
        let payload = serde_json::json!({
            "email": credentials.email,
            "password": credentials.password.expose_secret(),
        });

        let response = self
            .inner
            .client
            .post(url.clone())
            .json(&payload)
            .send()
            .await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;

        let body: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| ApiError::Deserialize {
                context: format!("POST {url}"),
                source: e,
            })?;

        if let Some(err) = body.get("error") {
            let message = match err.as_str() {
                Some(s) => s.to_owned(),
                None => err.to_string(),
            };
            return Ok(SignInOutcome::Rejected { message, body });
        }

        let record: SessionRecord =
            serde_json::from_value(body).map_err(|e| ApiError::Deserialize {
                context: format!("POST {url}"),
                source: e,
            })?;

        Ok(SignInOutcome::Accepted(record))
    }

    fn products_url(&self, key: &QueryKey) -> Result<Url, ApiError> {
        let segments = key.segments();
        self.endpoint_url(std::iter::once("products").chain(segments.iter().map(String::as_str)))
    }

    fn sessions_url(&self) -> Result<Url, ApiError> {
        self.endpoint_url(std::iter::once("sessions"))
    }

    /// Builds a request URL by appending percent-encoded path segments to
    /// the base URL. Each segment is encoded as a whole, so filter text
    /// containing `/`, `?`, or `#` stays a single segment.
    fn endpoint_url<'a, I>(&self, segments: I) -> Result<Url, ApiError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut url = self.inner.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ApiError::InvalidBaseUrl {
                    url: self.inner.base_url.to_string(),
                    reason: "URL cannot take path segments".to_owned(),
                })?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }
}
