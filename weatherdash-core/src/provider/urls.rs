//! Request URLs for the weather provider.
//!
//! Pure and deterministic: the location is passed through unvalidated and
//! percent-encoded, the API key is embedded in every URL.

use chrono::NaiveDate;
use reqwest::Url;

use crate::{
    error::{DashboardError, Result},
    model::Location,
};

#[derive(Clone)]
pub struct QueryUrls {
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for QueryUrls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryUrls")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl QueryUrls {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// `current.json` with air quality enabled.
    pub fn current(&self, location: &Location) -> Result<Url> {
        self.build("current.json", &[("q", location.as_str()), ("aqi", "yes")])
    }

    /// `forecast.json` for `days` days, air quality disabled.
    pub fn forecast(&self, days: u8, location: &Location) -> Result<Url> {
        let days = days.to_string();
        self.build("forecast.json", &[("q", location.as_str()), ("days", &days), ("aqi", "no")])
    }

    pub fn astronomy(&self, location: &Location, date: NaiveDate) -> Result<Url> {
        let dt = date.format("%Y-%m-%d").to_string();
        self.build("astronomy.json", &[("q", location.as_str()), ("dt", &dt)])
    }

    pub fn history(&self, location: &Location, start: NaiveDate, end: NaiveDate) -> Result<Url> {
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();
        self.build(
            "history.json",
            &[("q", location.as_str()), ("start_date", &start), ("end_date", &end)],
        )
    }

    fn build(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{endpoint}", self.base_url))
            .map_err(|e| {
                DashboardError::Configuration(format!("invalid weather API base URL: {e}"))
            })?;
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .extend_pairs(params.iter().copied());
        Ok(url)
    }
}

/// URL with the `key` parameter masked, for logs.
pub fn redacted(url: &Url) -> String {
    let mut masked = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}
