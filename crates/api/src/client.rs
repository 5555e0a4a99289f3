// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde_json::Value;
use tracing::info;

use crate::TenderData;
use crate::error::ApiError;

/// The HTTP sink pushing final results to the procurement platform.
#[derive(Debug)]
pub struct ResultsClient {
    tender_url: String,
    api_token: String,
    debug: bool,
    session: reqwest::Client,
}

impl ResultsClient {
    /// Creates a client for one tender.
    ///
    /// In debug mode the approved payload is logged but never sent.
    #[must_use]
    pub fn new(tender_url: String, api_token: String, debug: bool) -> Self {
        Self {
            tender_url,
            api_token,
            debug,
            session: reqwest::Client::new(),
        }
    }

    /// Posts the merged bid records to `{tender_url}/auction`.
    ///
    /// Returns the payload itself in debug mode, the platform's response
    /// body otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the payload cannot be built or the
    /// platform rejects the request.
    pub async fn post_results(&self, tender: &TenderData) -> Result<Value, ApiError> {
        let payload: Value = serde_json::json!({ "data": { "bids": tender.data.bids } });
        info!("Approved data: {payload}");

        if self.debug {
            return Ok(payload);
        }

        let url: String = format!("{}/auction", self.tender_url);
        info!("Making request to api: POST {url}");
        let response = self
            .session
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}
