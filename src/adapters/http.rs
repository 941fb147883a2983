use crate::core::response::decode;
use crate::core::{GeocodeClient, GeocodeResponse};
use crate::utils::error::{EtlError, GeocodeError, Result};
use reqwest::Client;
use std::time::Duration;
use url::Url;

pub const DEFAULT_GEOCODE_PATH: &str = "/maps/api/geocode/json";

/// Talks to a Google-style geocoding endpoint at `host:port`.
#[derive(Debug, Clone)]
pub struct HttpGeocodeClient {
    client: Client,
    endpoint: Url,
}

impl HttpGeocodeClient {
    pub fn new(host: &str, port: u16, path: &str, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint_url(host, port, path)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EtlError::ConfigError {
                message: format!("Cannot build HTTP client: {}", e),
            })?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// `http://{host}:{port}{path}`. A host that already carries a scheme keeps it.
pub fn endpoint_url(host: &str, port: u16, path: &str) -> Result<Url> {
    let invalid = |reason: String| EtlError::InvalidConfigValueError {
        field: "host".to_string(),
        value: host.to_string(),
        reason,
    };

    let base = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    };

    let mut url = Url::parse(&base).map_err(|e| invalid(format!("Invalid URL format: {}", e)))?;
    url.set_port(Some(port))
        .map_err(|_| invalid("URL cannot carry a port".to_string()))?;
    url.set_path(path);
    Ok(url)
}

#[async_trait::async_trait]
impl GeocodeClient for HttpGeocodeClient {
    async fn geocode(&self, address: &str) -> std::result::Result<GeocodeResponse, GeocodeError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("address", address), ("sensor", "false")])
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Geocoder response status: {}", status);
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GeocodeError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(decode(&body))
    }
}
