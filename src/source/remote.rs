//! HTTP source
//!
//! One GET against a backend endpoint, either sensor data or the device
//! registry. There is no retry, backoff or timeout; a failed fetch is
//! reported and the caller decides whether to try again.

use crate::devices::{parse_devices, SensorDevice};
use crate::error::LiwanagError;
use crate::types::SensorPayload;
use tracing::{info, warn};

use super::parse_payload;

/// Backend endpoint returning `{ data, count }`
#[derive(Debug, Clone)]
pub struct RemoteSource {
    http: reqwest::Client,
    url: String,
}

impl RemoteSource {
    pub fn new(url: &str) -> Result<Self, LiwanagError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("liwanag/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LiwanagError::Http(e.to_string()))?;

        Ok(Self {
            http,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the full reading set
    pub async fn fetch(&self) -> Result<SensorPayload, LiwanagError> {
        let body = self.get_body().await?;
        let payload = self.readable(parse_response(&body))?;
        info!(url = %self.url, readings = payload.data.len(), count = ?payload.count, "Fetched sensor data");
        Ok(payload)
    }

    /// Fetch the device registry
    pub async fn fetch_devices(&self) -> Result<Vec<SensorDevice>, LiwanagError> {
        let body = self.get_body().await?;
        let devices = self.readable(
            parse_devices(&body).map_err(|e| LiwanagError::BadResponse(e.to_string())),
        )?;
        info!(url = %self.url, devices = devices.len(), "Fetched device registry");
        Ok(devices)
    }

    async fn get_body(&self) -> Result<String, LiwanagError> {
        let resp = self
            .http
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| LiwanagError::Http(e.to_string()))?;

        let status = resp.status().as_u16();
        if let Err(e) = check_status(status) {
            warn!(url = %self.url, status, "Backend request failed");
            return Err(e);
        }

        resp.text()
            .await
            .map_err(|e| LiwanagError::Http(e.to_string()))
    }

    fn readable<T>(&self, parsed: Result<T, LiwanagError>) -> Result<T, LiwanagError> {
        if let Err(e) = &parsed {
            warn!(url = %self.url, error = %e, "Backend response unreadable");
        }
        parsed
    }
}

/// A 2xx body that is not a sensor payload (e.g. a proxy's HTML error
/// page) counts as a failed fetch.
pub(crate) fn parse_response(body: &str) -> Result<SensorPayload, LiwanagError> {
    parse_payload(body).map_err(|e| LiwanagError::BadResponse(e.to_string()))
}

/// Any non-2xx status is a fetch failure
pub(crate) fn check_status(status: u16) -> Result<(), LiwanagError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(LiwanagError::FetchFailed { status })
    }
}
