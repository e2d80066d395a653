use std::time::Duration;

use url::Url;

use crate::error::{ClientError, ClientResult};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: Url,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(server_url: &str) -> ClientResult<Self> {
        let api_url = normalize_api_url(server_url)?;
        Ok(Self {
            api_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Accepts either the server root or its `api/` prefix and returns the API
/// root with a trailing slash, so relative endpoint paths join beneath it.
pub fn normalize_api_url(raw: &str) -> ClientResult<Url> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ClientError::InvalidUrl(format!(
            "server url must start with http:// or https://: {raw}"
        )));
    }

    let with_api = if trimmed.ends_with("/api") {
        format!("{trimmed}/")
    } else {
        format!("{trimmed}/api/")
    };

    Url::parse(&with_api).map_err(|err| ClientError::InvalidUrl(format!("{with_api}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_api_prefix_to_server_root() {
        assert_eq!(
            normalize_api_url("https://fundi.example.com").expect("url").as_str(),
            "https://fundi.example.com/api/"
        );
        assert_eq!(
            normalize_api_url("http://127.0.0.1:8000/").expect("url").as_str(),
            "http://127.0.0.1:8000/api/"
        );
    }

    #[test]
    fn keeps_existing_api_prefix() {
        assert_eq!(
            normalize_api_url("https://fundi.example.com/api/").expect("url").as_str(),
            "https://fundi.example.com/api/"
        );
    }

    #[test]
    fn rejects_non_http_schemes() {
        let err = normalize_api_url("ftp://fundi.example.com").expect_err("scheme");
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }
}
