//! HTTP client abstraction for testability.

use super::FallbackError;
use std::time::Duration;

/// Trait for blocking HTTP GET operations.
///
/// This abstraction allows for dependency injection and easier testing by
/// enabling mock HTTP clients in tests. The fallback resolver only ever
/// issues GET requests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the response body.
    fn get(&self, url: &str) -> Result<Vec<u8>, FallbackError>;
}

/// Default timeout applied to fallback API requests.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// User-Agent sent with every request, as the OSM API rejects anonymous
/// clients.
const USER_AGENT: &str = concat!("osmstream/", env!("CARGO_PKG_VERSION"));

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a new client with the default timeout.
    pub fn new() -> Result<Self, FallbackError> {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    /// Creates a new client with a custom per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FallbackError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FallbackError::Http(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, FallbackError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FallbackError::Http(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(FallbackError::Http(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| FallbackError::Http(format!("failed to read response: {e}")))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Mock HTTP client serving canned responses per URL.
    #[derive(Default)]
    pub struct MockHttpClient {
        pub responses: HashMap<String, Vec<u8>>,
    }

    impl MockHttpClient {
        pub fn with_response(mut self, url: &str, body: &str) -> Self {
            self.responses.insert(url.to_string(), body.as_bytes().to_vec());
            self
        }
    }

    impl HttpClient for MockHttpClient {
        fn get(&self, url: &str) -> Result<Vec<u8>, FallbackError> {
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| FallbackError::Http(format!("HTTP 404 from {url}")))
        }
    }

    #[test]
    fn test_mock_client_serves_canned_body() {
        let mock = MockHttpClient::default().with_response("http://example.com/a", "hello");
        assert_eq!(mock.get("http://example.com/a").unwrap(), b"hello");
        assert!(mock.get("http://example.com/b").is_err());
    }
}
