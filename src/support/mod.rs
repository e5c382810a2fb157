//! Support assistant proxy.
//!
//! Forwards support questions to an external chat-completion provider,
//! scoped by a fixed system prompt to the Face ID login domain. The
//! exchange is persisted by the handler after a successful response.

use crate::APP_USER_AGENT;
use anyhow::{anyhow, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{error, warn};

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str = "You are the support assistant for a site offering \
password and Face ID login. Answer only questions about Face ID enrollment, \
signing in, face recognition, or the site itself. Face comparison is performed \
by an external provider and Face ID is an additional sign-in method next to \
the password. If the question is off-topic, reply that this chat only answers \
questions about the Face ID system.";

pub struct SupportClient {
    client: Client,
    api_url: String,
    api_key: SecretString,
    model: String,
}

impl SupportClient {
    /// Build the provider client with a bounded request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(api_url: String, api_key: SecretString, model: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(PROVIDER_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_url,
            api_key,
            model,
        })
    }

    /// Ask the model a support question and return its reply.
    ///
    /// Retries once on transient network failure (connect/timeout).
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, a non-success provider
    /// status, or a response without a completion.
    pub async fn ask(&self, message: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": message },
            ],
            "temperature": 0.7,
            "max_tokens": 300,
        });

        let request = || {
            self.client
                .post(&self.api_url)
                .bearer_auth(self.api_key.expose_secret())
                .json(&body)
        };

        let response = match request().send().await {
            Ok(response) => response,
            Err(err) if err.is_connect() || err.is_timeout() => {
                warn!("Chat provider request failed, retrying once: {err}");
                request().send().await?
            }
            Err(err) => return Err(err.into()),
        };

        if !response.status().is_success() {
            let status = response.status();
            let json_response: Value = response.json().await.unwrap_or_default();

            let error_message = json_response["error"]["message"].as_str().unwrap_or_default();

            error!("Chat provider returned {status}: {error_message}");

            return Err(anyhow!("{}, {}", status, error_message));
        }

        let json_response: Value = response.json().await?;

        json_response["choices"][0]["message"]["content"]
            .as_str()
            .map_or_else(
                || {
                    error!("Chat provider response without completion");

                    Err(anyhow!("No completion in provider response"))
                },
                |content| Ok(content.to_string()),
            )
    }
}
