//! Biometric verifier: delegated face comparison.
//!
//! Normalizes the enrolled and captured images and submits both as
//! base64 payloads to the external comparison endpoint. The provider
//! returns a confidence score (0-100); the decision policy accepts only
//! when confidence is strictly greater than the threshold. Any provider
//! error, network failure, or missing confidence is a rejection, never
//! an acceptance (fail closed). The verifier performs no persistence;
//! the caller triggers the audit recorder on accept.

use crate::APP_USER_AGENT;
use anyhow::{anyhow, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, warn};

/// Minimum confidence for an accepted match, exclusive.
pub const MATCH_THRESHOLD: f64 = 70.0;

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Accept iff the provider confidence is strictly above the threshold.
#[must_use]
pub fn is_match(confidence: f64) -> bool {
    confidence > MATCH_THRESHOLD
}

/// Strip a `data:image/...;base64,` prefix so only the raw base64
/// payload is transmitted. Returns the input unchanged when no data-URI
/// prefix is present.
#[must_use]
pub fn strip_data_uri(image: &str) -> &str {
    if image.starts_with("data:") {
        if let Some(index) = image.find(";base64,") {
            return &image[index + ";base64,".len()..];
        }
    }
    image
}

pub struct FaceClient {
    client: Client,
    compare_url: String,
    api_key: SecretString,
    api_secret: SecretString,
}

impl FaceClient {
    /// Build the provider client with a bounded request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        compare_url: String,
        api_key: SecretString,
        api_secret: SecretString,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(PROVIDER_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            compare_url,
            api_key,
            api_secret,
        })
    }

    /// Compare two images and return the provider confidence score.
    ///
    /// Retries once on transient network failure (connect/timeout), not
    /// on provider rejection.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, a non-success provider
    /// status, or a response without a confidence score. Callers treat
    /// every error as a rejected match.
    pub async fn compare(&self, enrolled: &str, captured: &str) -> Result<f64> {
        let params = [
            ("api_key", self.api_key.expose_secret()),
            ("api_secret", self.api_secret.expose_secret()),
            ("image_base64_1", strip_data_uri(enrolled)),
            ("image_base64_2", strip_data_uri(captured)),
        ];

        let response = match self.client.post(&self.compare_url).form(&params).send().await {
            Ok(response) => response,
            Err(err) if err.is_connect() || err.is_timeout() => {
                warn!("Face provider request failed, retrying once: {err}");
                self.client.post(&self.compare_url).form(&params).send().await?
            }
            Err(err) => return Err(err.into()),
        };

        if !response.status().is_success() {
            let status = response.status();
            let json_response: Value = response.json().await.unwrap_or_default();

            let error_message = json_response["error_message"].as_str().unwrap_or_default();

            error!("Face provider returned {status}: {error_message}");

            return Err(anyhow!("{}, {}", status, error_message));
        }

        let json_response: Value = response.json().await?;

        json_response["confidence"].as_f64().map_or_else(
            || {
                error!("Face provider response without confidence score");

                Err(anyhow!("No confidence in provider response"))
            },
            Ok,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_data_uri_removes_prefix() {
        assert_eq!(strip_data_uri("data:image/png;base64,AAAA"), "AAAA");
        assert_eq!(strip_data_uri("data:image/jpeg;base64,/9j/4A=="), "/9j/4A==");
    }

    #[test]
    fn strip_data_uri_leaves_raw_base64_untouched() {
        assert_eq!(strip_data_uri("AAAA"), "AAAA");
        assert_eq!(strip_data_uri(""), "");
    }

    #[test]
    fn strip_data_uri_requires_data_scheme() {
        // A stray ";base64," in the payload must not be treated as a prefix.
        assert_eq!(strip_data_uri("abc;base64,def"), "abc;base64,def");
    }

    #[test]
    fn match_threshold_is_strict() {
        assert!(!is_match(69.9));
        assert!(!is_match(70.0));
        assert!(is_match(70.1));
        assert!(is_match(100.0));
        assert!(!is_match(0.0));
    }
}
