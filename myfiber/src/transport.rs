use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};

use crate::{client::Error, response::Response};

/// Media type of the documents served by the API.
pub const ACCEPT_GEOJSON: &str = "application/geo+json";

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Performs a single HTTP GET. [`crate::Client`] builds the retry logic on top of it.
pub trait Transport {
    /// Get the URL. Any response counts as success, including error statuses. Timeouts must be
    /// reported as [`Error::Timeout`].
    fn get(&self, url: &str) -> Result<Response, Error>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str) -> Result<Response, Error> {
        (**self).get(url)
    }
}

/// [`Transport`] using a blocking reqwest session, with authentication and content negotiation
/// headers sent along every request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(
        api_key: &str,
        user_agent: HeaderValue,
        timeout: Option<Duration>,
    ) -> Result<Self, Error> {
        let mut api_key = HeaderValue::from_str(api_key).map_err(Error::InvalidApiKey)?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_GEOJSON));
        headers.insert(HeaderName::from_static(API_KEY_HEADER), api_key);

        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(Error::Http)?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Response, Error> {
        let response = self.client.get(url).send().map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(classify)?;

        log::trace!("Got {status} with {} bytes.", body.len());
        Ok(Response { status, body })
    }
}

fn classify(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Timeout
    } else {
        Error::Http(error)
    }
}
