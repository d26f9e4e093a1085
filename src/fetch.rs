//! Blocking page fetches shared by the listing and detail passes.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use thiserror::Error;

type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Failure at a network boundary.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("request to {url} failed: {source}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: DynError,
    },
    /// The server answered with a non-2xx status.
    #[error("{url} answered {status}: {body}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body, kept for diagnostics.
        body: String,
    },
    /// The response arrived but its body could not be read or decoded.
    #[error("could not decode response from {url}: {source}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Underlying decode error.
        #[source]
        source: DynError,
    },
}

impl FetchError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Decode { .. } => None,
        }
    }
}

/// Source of HTML pages keyed by absolute URL.
pub trait PageSource {
    /// Returns the body of `url`, or a [`FetchError`] for transport and non-2xx failures.
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// [`PageSource`] backed by a blocking `reqwest` client.
#[derive(Clone)]
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    /// Builds a client that identifies itself with `user_agent`.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl PageSource for HttpPageSource {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| transport(url, err))?;
        read_success(url, response)?
            .text()
            .map_err(|err| decode(url, err))
    }
}

/// Passes 2xx responses through and turns everything else into [`FetchError::Status`].
pub(crate) fn read_success(
    url: &str,
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    Err(FetchError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        body,
    })
}

pub(crate) fn transport(url: &str, err: reqwest::Error) -> FetchError {
    FetchError::Transport {
        url: url.to_string(),
        source: Box::new(err),
    }
}

pub(crate) fn decode(url: &str, err: impl std::error::Error + Send + Sync + 'static) -> FetchError {
    FetchError::Decode {
        url: url.to_string(),
        source: Box::new(err),
    }
}
