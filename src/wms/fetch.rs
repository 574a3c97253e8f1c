use std::fmt;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;

use crate::core::constants::USER_AGENT;

/// Shared async HTTP client. Built once so every source reuses the same
/// connection pool.
pub(crate) static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|err| {
            log::warn!("falling back to default HTTP client: {}", err);
            Client::new()
        })
});

/// Why a fetch produced no body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// The server answered with a non-2xx status
    Status(u16),
    /// No usable response (connection, TLS, decoding)
    Transport(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Status(code) => write!(f, "HTTP {}", code),
            FetchFailure::Transport(reason) => write!(f, "transport error: {}", reason),
        }
    }
}

/// Result of a text fetch. Failures are values, not errors: the caller
/// decides how to degrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success(String),
    Failure(FetchFailure),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            FetchOutcome::Success(body) => Some(body),
            FetchOutcome::Failure(_) => None,
        }
    }
}

/// Asynchronous text GET, injectable so hosts can route requests through
/// their own stack and tests can script responses.
#[async_trait]
pub trait FetchClient: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// [`FetchClient`] backed by reqwest
#[derive(Debug, Clone)]
pub struct ReqwestFetchClient {
    client: Client,
}

impl ReqwestFetchClient {
    pub fn new() -> Self {
        Self {
            client: HTTP_CLIENT.clone(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestFetchClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FetchClient for ReqwestFetchClient {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        log::debug!("GET {}", url);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                log::warn!("request to {} failed: {}", url, err);
                return FetchOutcome::Failure(FetchFailure::Transport(err.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            log::warn!("request to {} returned {}", url, status);
            return FetchOutcome::Failure(FetchFailure::Status(status.as_u16()));
        }

        match response.text().await {
            Ok(body) => FetchOutcome::Success(body),
            Err(err) => {
                log::warn!("reading body from {} failed: {}", url, err);
                FetchOutcome::Failure(FetchFailure::Transport(err.to_string()))
            }
        }
    }
}
