//! Photo metadata service client.
//!
//! Queries the secondary image service for a city's photo set, keyed by the
//! canonical display name the weather provider resolved. Modeled as an
//! explicit async call the sync pipeline awaits as one stage; failures are
//! typed so the orchestrator can leave the previous photo set untouched.

use serde::Deserialize;

use crate::errors::SyncError;

/// Client for the city-images metadata service.
#[derive(Debug, Clone)]
pub struct PhotoClient {
    client: reqwest::Client,
    base_url: String,
}

/// One image reference as served by the metadata service.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoRecord {
    #[serde(rename = "imageUrl")]
    pub url: String,
    #[serde(rename = "imageTitle")]
    pub title: String,
    #[serde(rename = "imageDate")]
    pub taken_on: String,
    #[serde(rename = "imageOwner")]
    pub owner: String,
}

impl PhotoClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the photo set for a resolved display name.
    ///
    /// # Errors
    ///
    /// `Transport` when the request fails at the network layer or the body
    /// is unreadable; `Server` on a non-success HTTP status; `Parse` when
    /// the body is not the expected array shape.
    pub async fn fetch_city_photos(
        &self,
        display_name: &str,
    ) -> Result<Vec<PhotoRecord>, SyncError> {
        let url = format!("{}/city-images", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("city", display_name)])
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("photo service request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SyncError::Server(format!(
                "photo service returned HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SyncError::Transport(format!("photo service body unreadable: {}", e)))?;

        serde_json::from_str::<Vec<PhotoRecord>>(&body)
            .map_err(|e| SyncError::Parse(format!("photo payload structure: {}", e)))
    }
}
