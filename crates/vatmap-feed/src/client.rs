//! Proxy HTTP client.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::FeedError;
use crate::types::{EntityDetail, EntitySnapshot, FirMap};

/// HTTP client for the data proxy.
pub struct FeedClient {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: String,
}

impl FeedClient {
    /// Create a new feed client against the proxy base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the full-state entity snapshot (flights + controllers).
    ///
    /// An empty or shapeless payload is [`FeedError::EmptyPayload`] so
    /// the caller can distinguish "feed says nothing is online" from a
    /// transport failure.
    pub async fn fetch_entity_feed(&self) -> Result<EntitySnapshot, FeedError> {
        let value: Value = self.get_json("/api/flights").await?;

        let is_empty_object = value.as_object().map_or(true, |map| map.is_empty());
        if is_empty_object {
            return Err(FeedError::EmptyPayload);
        }

        let snapshot: EntitySnapshot = serde_json::from_value(value)?;
        tracing::debug!(
            flights = snapshot.flights.len(),
            controllers = snapshot.controllers.len(),
            "entity feed fetched"
        );
        Ok(snapshot)
    }

    /// Fetch the online FIRs keyed by FIR identifier.
    pub async fn fetch_firs(&self) -> Result<FirMap, FeedError> {
        let firs: FirMap = self.get_json("/api/firs").await?;
        tracing::debug!(firs = firs.len(), "FIR feed fetched");
        Ok(firs)
    }

    /// Fetch the available weather-radar frame timestamps, oldest
    /// first. The consumer only needs the latest one.
    pub async fn fetch_weather_timestamps(&self) -> Result<Vec<i64>, FeedError> {
        self.get_json("/api/weather").await
    }

    /// Fetch the full detail record for one entity.
    pub async fn fetch_entity_detail(&self, id: i64) -> Result<EntityDetail, FeedError> {
        self.get_json(&format!("/api/flight?id={id}")).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FeedError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = FeedClient::new("http://localhost:8000/");
        assert_eq!(client.base_url, "http://localhost:8000");
    }
}
