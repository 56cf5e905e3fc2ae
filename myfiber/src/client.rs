use std::time::Duration;

pub use reqwest::header::HeaderValue;

use crate::{
    config::{ConfigError, ConfigStore, Configuration},
    query::{Params, with_query},
    response::{Document, Inspection, inspect},
    retry::Backoff,
    transport::{HttpTransport, Transport},
};

/// User agent identifying this client to the API.
pub const USER_AGENT: &str = concat!("QGISClientv", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Retry window got used up, or the server did not answer in time.
    #[error("request timed out")]
    Timeout,

    /// Server answered with other status than `200 OK` or `503 Service Unavailable`.
    #[error("API error {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Api {
        status: u16,
        message: Option<String>,
    },

    /// Connection could not be made or the response could not be read.
    #[error(transparent)]
    Http(reqwest::Error),

    /// Response of `200 OK` was not valid JSON.
    #[error("malformed response body: {0}")]
    Body(#[from] serde_json::Error),

    /// Response of `200 OK` was valid JSON, but not an object.
    #[error("response body is not a JSON object")]
    NotADocument,

    /// Configured API key cannot be sent as an HTTP header.
    #[error("API key is not a valid header value")]
    InvalidApiKey(#[source] reqwest::header::InvalidHeaderValue),

    /// Configuration could not be read from its store.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Controls how [`Client`] talks to the API.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// User agent sent with every request.
    pub user_agent: HeaderValue,

    /// Total time in which retries of a single request may happen. When it passes, the request
    /// fails with [`Error::Timeout`].
    pub retry_timeout: Duration,

    /// Limit for a single HTTP exchange. `None` waits as long as the server keeps the
    /// connection open.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            user_agent: HeaderValue::from_static(USER_AGENT),
            retry_timeout: Duration::from_secs(60),
            request_timeout: None,
        }
    }
}

/// Client of the API. Takes a snapshot of the [`Configuration`] when constructed.
#[derive(Debug)]
pub struct Client<T = HttpTransport> {
    base_url: String,
    transport: T,
    retry_timeout: Duration,
}

impl Client {
    /// Construct new [`Client`] with default [`ClientOptions`].
    pub fn new(configuration: &Configuration) -> Result<Self, Error> {
        Self::with_options(configuration, ClientOptions::default())
    }

    /// Construct new [`Client`] with supplied [`ClientOptions`].
    pub fn with_options(
        configuration: &Configuration,
        options: ClientOptions,
    ) -> Result<Self, Error> {
        let ClientOptions {
            user_agent,
            retry_timeout,
            request_timeout,
        } = options;

        let transport = HttpTransport::new(&configuration.api_key, user_agent, request_timeout)?;
        Ok(Self::with_transport(configuration, transport, retry_timeout))
    }

    /// Construct new [`Client`], reading the configuration from the store.
    pub fn from_store(store: &impl ConfigStore) -> Result<Self, Error> {
        Self::new(&store.read()?)
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(
        configuration: &Configuration,
        transport: T,
        retry_timeout: Duration,
    ) -> Self {
        Self {
            base_url: configuration.base_url.clone(),
            transport,
            retry_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get `path` (relative to the base URL) with given query parameters, and parse the response.
    ///
    /// Requests answered with `503 Service Unavailable` are attempted again with an exponential
    /// backoff, until the retry timeout passes.
    pub fn request(&self, path: &str, params: Option<&Params>) -> Result<Document, Error> {
        let url = format!("{}{}", self.base_url, with_query(path, params));
        let mut backoff = Backoff::start(self.retry_timeout);

        loop {
            backoff.before_attempt()?;

            log::debug!("GET {url}");
            let response = self.transport.get(&url)?;

            match inspect(&response) {
                Inspection::Done(document) => return Ok(document),
                Inspection::Retriable => {
                    backoff.retry();
                    log::warn!(
                        "Server responded with {}, retrying for the {}. time.",
                        response.status,
                        backoff.retries()
                    );
                }
                Inspection::Fatal(error) => return Err(error),
            }
        }
    }
}
