//! Published version lookup against the PyPI JSON API.

use std::time::Duration;

use async_trait::async_trait;
use polyver_core::clients::RegistryClient;
use polyver_core::error::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct PypiResponse {
    info: PypiInfo,
}

#[derive(Debug, Deserialize)]
struct PypiInfo {
    version: String,
}

/// Registry client speaking the `/<package>/json` endpoint of PyPI and
/// compatible indexes.
#[derive(Debug, Clone)]
pub struct PypiRegistry {
    client: Client,
}

impl PypiRegistry {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Registry {
                package: String::new(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }

    fn package_url(registry: &str, package: &str) -> String {
        format!("{}/{}/json", registry.trim_end_matches('/'), package)
    }
}

#[async_trait]
impl RegistryClient for PypiRegistry {
    async fn current_published_version(&self, package: &str, registry: &str) -> Result<String> {
        let url = Self::package_url(registry, package);
        debug!("Fetching {}", url);

        let registry_error = |message: String| Error::Registry {
            package: package.to_string(),
            message,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| registry_error(format!("Request to {} failed: {}", url, e)))?;

        match response.status() {
            status if status.is_success() => {
                let body = response
                    .text()
                    .await
                    .map_err(|e| registry_error(format!("Failed to read response: {}", e)))?;
                parse_published_version(&body).map_err(registry_error)
            }
            StatusCode::NOT_FOUND => Err(registry_error(format!(
                "package is not published to {}",
                registry
            ))),
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(registry_error(format!(
                    "Registry responded with status {}: {}",
                    status, text
                )))
            }
        }
    }
}

fn parse_published_version(body: &str) -> std::result::Result<String, String> {
    serde_json::from_str::<PypiResponse>(body)
        .map(|response| response.info.version)
        .map_err(|e| format!("Unexpected registry response: {}", e))
}
