//! Synchronous client for the weather backend.
//!
//! The backend serves one processed document (`GET /api/weather`) holding the
//! temperature, cloud, wind, surface-wind and VFR series. Transient failures
//! (5xx, network errors) are retried a few times with a short backoff.
//!
//! ```no_run
//! # use meteogram::api::Client;
//! let client = Client::new("http://localhost:8080/api/weather")?;
//! let payload = client.fetch_payload()?;
//! println!("{} temperature samples", payload.temperature_data.len());
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;

use crate::config::DEFAULT_SOURCE_URL;
use crate::models::WeatherPayload;

const BACKOFF_MS: [u64; 3] = [100, 300, 700];

#[derive(Debug, Clone)]
pub struct Client {
    pub url: String,
    http: HttpClient,
}

impl Client {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30)) // total request timeout
            .connect_timeout(Duration::from_secs(10))
            .redirect(Policy::limited(5))
            .user_agent(concat!("meteogram/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build HTTP client")?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }

    /// Client for the local backend at [`DEFAULT_SOURCE_URL`].
    pub fn local() -> Result<Self> {
        Self::new(DEFAULT_SOURCE_URL)
    }

    /// Raw response body.
    pub fn fetch_text(&self) -> Result<String> {
        let mut last_err: Option<anyhow::Error> = None;
        for backoff_ms in BACKOFF_MS {
            match self.http.get(&self.url).send() {
                Ok(r) if r.status().is_success() => {
                    return r.text().context("read response body");
                }
                Ok(r) if r.status().is_server_error() => {
                    log::debug!("{} answered {}; retrying", self.url, r.status());
                    last_err = Some(anyhow::anyhow!("HTTP {}", r.status()));
                }
                Ok(r) => bail!("request to {} failed with HTTP {}", self.url, r.status()),
                Err(e) => {
                    log::debug!("request to {} failed: {e}; retrying", self.url);
                    last_err = Some(e.into());
                }
            }
            std::thread::sleep(Duration::from_millis(backoff_ms));
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("request failed")))
            .with_context(|| format!("GET {}", self.url))
    }

    /// Fetch and decode the weather document.
    pub fn fetch_payload(&self) -> Result<WeatherPayload> {
        let text = self.fetch_text()?;
        let payload = WeatherPayload::from_json(&text)
            .with_context(|| format!("decode weather payload from {}", self.url))?;
        log::info!(
            "fetched {} temperature, {} cloud, {} wind samples from {}",
            payload.temperature_data.len(),
            payload.cloud_data.len(),
            payload.wind_data.len(),
            self.url
        );
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_keeps_url() {
        let c = Client::new("http://127.0.0.1:9/api/weather").unwrap();
        assert_eq!(c.url, "http://127.0.0.1:9/api/weather");
        assert_eq!(Client::local().unwrap().url, DEFAULT_SOURCE_URL);
    }

    // Live test (opt-in, sleeps through the retry backoff): cargo test --features online
    #[cfg(feature = "online")]
    #[test]
    fn unreachable_backend_is_an_error() {
        // port 9 (discard) is closed on any sane test host
        let c = Client::new("http://127.0.0.1:9/api/weather").unwrap();
        let err = c.fetch_payload().unwrap_err();
        assert!(format!("{err:#}").contains("GET http://127.0.0.1:9/api/weather"));
    }
}
