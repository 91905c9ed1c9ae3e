//! HTTP breed source backed by TheCatAPI.

use super::catalog::{Breed, BreedCatalogError, BreedSource};
use log::warn;
use reqwest::blocking::Client;
use std::time::Duration;

pub const DEFAULT_BREED_API_BASE_URL: &str = "https://api.thecatapi.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches `GET {base_url}/breeds`, sending `x-api-key` when configured.
pub struct HttpBreedSource {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl HttpBreedSource {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, BreedCatalogError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| BreedCatalogError::Transport(err.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            client,
        })
    }

    fn breeds_url(&self) -> String {
        format!("{}/breeds", self.base_url.trim_end_matches('/'))
    }
}

impl BreedSource for HttpBreedSource {
    fn fetch_breeds(&self) -> Result<Vec<Breed>, BreedCatalogError> {
        let mut request = self.client.get(self.breeds_url());
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().map_err(|err| {
            warn!("event=breed_fetch module=breeds status=error error_code=transport error={err}");
            BreedCatalogError::Transport(err.to_string())
        })?;
        let status = response.status();
        if !status.is_success() {
            warn!(
                "event=breed_fetch module=breeds status=error error_code=upstream_status status_code={}",
                status.as_u16()
            );
            return Err(BreedCatalogError::UpstreamStatus(status.as_u16()));
        }

        response
            .json::<Vec<Breed>>()
            .map_err(|err| BreedCatalogError::Decode(err.to_string()))
    }
}
