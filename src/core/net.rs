// src/core/net.rs
// One blocking GET per classification root. No retries: a failed root is
// left pending and picked up by the next run.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use tracing::debug;

use crate::config::consts::REQUEST_TIMEOUT_SECS;
use crate::config::ExtractorConfig;
use crate::error::{ExtractError, Result};
use crate::hsn::RootCode;

/// One entry of the remote lookup list. Either field may be missing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ClassificationRecord {
    #[serde(rename = "NationalMeasureCode", default)]
    pub code: Option<String>,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
}

impl ClassificationRecord {
    pub fn new(code: &str, description: &str) -> Self {
        Self { code: Some(code.to_string()), description: Some(description.to_string()) }
    }
}

#[derive(Deserialize)]
struct LookupPayload {
    #[serde(rename = "NationalMeasureCodeLookupList", default)]
    records: Option<Vec<ClassificationRecord>>,
}

/// Source of raw records for one root. The run controller only sees this.
pub trait Fetch {
    fn fetch(&self, root: RootCode) -> Result<Vec<ClassificationRecord>>;
}

impl<T: Fetch + ?Sized> Fetch for &T {
    fn fetch(&self, root: RootCode) -> Result<Vec<ClassificationRecord>> {
        (**self).fetch(root)
    }
}

/// Decode a lookup response body. A payload without the list is empty.
pub fn parse_lookup_payload(root: RootCode, body: &str) -> Result<Vec<ClassificationRecord>> {
    let payload: LookupPayload = serde_json::from_str(body).map_err(|e| {
        ExtractError::MalformedResponse { root: root.to_string(), reason: e.to_string() }
    })?;
    Ok(payload.records.unwrap_or_default())
}

/// Fetcher against the live lookup endpoint.
pub struct HttpFetcher {
    client: Client,
    base_url: String,
    auth_token: String,
    base_params: Vec<(&'static str, String)>,
}

impl HttpFetcher {
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ExtractError::Config(format!("could not build HTTP client: {e}")))?;

        let base_params = vec![
            ("type", config.classification_type.to_string()),
            ("countryId", config.country_id.to_string()),
            ("simulationDate", config.simulation_date.clone()),
            ("description", String::new()),
            ("linkedCode", String::new()),
            ("exclusions", "true".to_string()),
            ("dutyTypeId", "0".to_string()),
        ];

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            auth_token: config.auth_token.clone(),
            base_params,
        })
    }

    fn get(&self, root: RootCode) -> std::result::Result<String, reqwest::Error> {
        let code = root.to_string();
        self.client
            .get(&self.base_url)
            .header(AUTHORIZATION, &self.auth_token)
            .header(ACCEPT, "application/json")
            .query(&self.base_params)
            .query(&[("code", code.as_str())])
            .send()?
            .error_for_status()?
            .text()
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, root: RootCode) -> Result<Vec<ClassificationRecord>> {
        debug!(%root, url = %self.base_url, "GET lookup");
        let body = self.get(root).map_err(|e| ExtractError::Transport {
            root: root.to_string(),
            reason: e.to_string(),
        })?;
        parse_lookup_payload(root, &body)
    }
}
