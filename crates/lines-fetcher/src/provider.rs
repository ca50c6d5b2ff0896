//! HTTP client for the upstream lines provider

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{FetchError, FetchResult};

/// Provider response body: `{"lines": {"SOCCER": "1.234"}}`
#[derive(Debug, Deserialize)]
pub struct LinesResponse {
    pub lines: HashMap<String, String>,
}

/// Client for `GET /api/v1/lines/{sport}`
#[derive(Debug, Clone)]
pub struct LinesProvider {
    client: Client,
    base_url: Url,
}

impl LinesProvider {
    pub fn new(base_url: &str, timeout: Duration) -> FetchResult<Self> {
        // Without a trailing slash `join` would replace the last path segment
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch the current line for one sport
    pub async fn fetch(&self, sport: &str) -> FetchResult<f64> {
        let url = self.base_url.join(&format!("api/v1/lines/{}", sport))?;
        debug!(%url, "Fetching line");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                sport: sport.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body: LinesResponse = response.json().await?;
        parse_line(sport, &body)
    }
}

/// Extract a sport's value from a provider response.
///
/// The provider keys lines by upper-cased sport name and encodes values as
/// decimal strings.
pub fn parse_line(sport: &str, response: &LinesResponse) -> FetchResult<f64> {
    let raw = response
        .lines
        .get(&sport.to_uppercase())
        .ok_or_else(|| FetchError::MissingSport(sport.to_string()))?;

    raw.trim().parse::<f64>().map_err(|_| FetchError::InvalidValue {
        sport: sport.to_string(),
        value: raw.clone(),
    })
}
