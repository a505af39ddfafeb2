//! Fetching environment configuration from the bucketing file endpoint.
use std::time::Duration;

use reqwest::{StatusCode, Url};

use crate::{Configuration, Error, Result};

/// Default base URL of the CDN serving bucketing files.
pub const DEFAULT_BASE_URL: &str = "https://cdn.varia.io";

/// Default request timeout for configuration fetches.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of additional attempts after a failed fetch.
pub const DEFAULT_RETRIES: u32 = 1;

/// Source of [`Configuration`] snapshots.
///
/// The engine consumes this trait both for the synchronous initial load and from the background
/// poller. Implement it to serve configuration from somewhere else than the CDN (tests use this
/// to script refresh sequences).
pub trait ConfigurationFetcher: Send {
    fn fetch_configuration(&mut self) -> Result<Configuration>;
}

/// Configuration for [`HttpConfigurationFetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Base URL of the bucketing file CDN.
    pub base_url: String,
    /// API key sent as the `x-api-key` header, if any.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Number of additional attempts after a failed request.
    pub retries: u32,
}

impl Default for HttpFetcherConfig {
    fn default() -> HttpFetcherConfig {
        HttpFetcherConfig {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
        }
    }
}

/// Fetches the environment's bucketing file (`/{env_id}/bucketing.json`) over HTTP.
pub struct HttpConfigurationFetcher {
    // Client holds a connection pool internally, so we're reusing the client between requests.
    client: reqwest::blocking::Client,
    env_id: String,
    config: HttpFetcherConfig,
    /// If we receive a 401 Unauthorized error during a request, it means the API key is not
    /// valid. We cache this error so we don't issue additional requests to the server.
    unauthorized: bool,
}

impl HttpConfigurationFetcher {
    pub fn new(env_id: impl Into<String>, config: HttpFetcherConfig) -> HttpConfigurationFetcher {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to initialize HTTP client");

        HttpConfigurationFetcher {
            client,
            env_id: env_id.into(),
            config,
            unauthorized: false,
        }
    }

    fn bucketing_url(&self) -> Result<Url> {
        Url::parse(&format!(
            "{}/{}/bucketing.json",
            self.config.base_url, self.env_id
        ))
        .map_err(Error::InvalidBaseUrl)
    }

    fn request(&self, url: Url) -> Result<Configuration> {
        let mut request = self.client.get(url);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("x-api-key", api_key);
        }

        let response = request.send()?;

        let response = response.error_for_status().map_err(|err| {
            if err.status() == Some(StatusCode::UNAUTHORIZED) {
                Error::Unauthorized
            } else {
                log::warn!(target: "varia", "received non-200 response while fetching new configuration: {:?}", err);
                Error::from(err)
            }
        })?;

        let configuration = response.json()?;

        Ok(configuration)
    }
}

impl ConfigurationFetcher for HttpConfigurationFetcher {
    fn fetch_configuration(&mut self) -> Result<Configuration> {
        if self.unauthorized {
            return Err(Error::Unauthorized);
        }

        let url = self.bucketing_url()?;

        log::debug!(target: "varia", env_id = self.env_id.as_str(); "fetching environment configuration");

        let mut attempts_left = self.config.retries + 1;
        loop {
            attempts_left -= 1;
            match self.request(url.clone()) {
                Ok(configuration) => {
                    log::debug!(target: "varia", env_id = self.env_id.as_str(); "successfully fetched environment configuration");
                    return Ok(configuration);
                }
                Err(Error::Unauthorized) => {
                    log::warn!(target: "varia", "client is not authorized. Check your API key");
                    self.unauthorized = true;
                    return Err(Error::Unauthorized);
                }
                Err(err) if attempts_left == 0 => return Err(err),
                Err(err) => {
                    log::debug!(target: "varia", "retrying configuration fetch after error: {err}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_base_url() {
        let mut fetcher = HttpConfigurationFetcher::new(
            "env_1",
            HttpFetcherConfig {
                base_url: "not a url".to_owned(),
                ..Default::default()
            },
        );

        assert!(matches!(
            fetcher.fetch_configuration(),
            Err(Error::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn builds_the_bucketing_path_from_the_environment_id() {
        let fetcher = HttpConfigurationFetcher::new("env_abc", HttpFetcherConfig::default());

        let url = fetcher.bucketing_url().unwrap();
        assert_eq!(url.path(), "/env_abc/bucketing.json");
    }
}
