use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Url};
use tracing::{debug, instrument, warn};

use crate::{
    contract::{self, AstroSnapshot, WeatherSnapshot},
    error::{DashboardError, Result, truncate_body},
    model::Location,
    provider::urls::{QueryUrls, redacted},
};

use super::{SnapshotSource, WeatherProvider};

/// WeatherAPI.com client; every body goes through the response contract.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    urls: QueryUrls,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(urls: QueryUrls) -> Self {
        Self { urls, http: Client::new() }
    }

    async fn get_body(&self, url: Url, what: &str) -> Result<String> {
        debug!(url = %redacted(&url), "requesting {what}");

        let res = self.http.get(url).send().await.map_err(|e| {
            DashboardError::network(format!(
                "Failed to send request to WeatherAPI.com ({what}): {e}"
            ))
        })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            DashboardError::network(format!("Failed to read WeatherAPI {what} response body: {e}"))
        })?;

        if !status.is_success() {
            warn!(%status, "WeatherAPI {what} request failed");
            return Err(DashboardError::network(format!(
                "WeatherAPI {what} request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        Ok(body)
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    #[instrument(skip(self, location), fields(location = %location))]
    async fn current(&self, location: &Location) -> Result<WeatherSnapshot> {
        let body = self.get_body(self.urls.current(location)?, "current").await?;
        contract::parse_current_or_forecast(&body)
    }

    #[instrument(skip(self, location), fields(location = %location))]
    async fn forecast(&self, location: &Location, days: u8) -> Result<WeatherSnapshot> {
        let body = self.get_body(self.urls.forecast(days, location)?, "forecast").await?;
        contract::parse_current_or_forecast(&body)
    }

    #[instrument(skip(self, location), fields(location = %location))]
    async fn astronomy(&self, location: &Location, date: NaiveDate) -> Result<AstroSnapshot> {
        let body = self.get_body(self.urls.astronomy(location, date)?, "astronomy").await?;
        contract::parse_astro(&body)
    }

    fn current_key(&self, location: &Location) -> Result<String> {
        Ok(self.urls.current(location)?.to_string())
    }

    fn forecast_key(&self, location: &Location, days: u8) -> Result<String> {
        Ok(self.urls.forecast(days, location)?.to_string())
    }

    fn astronomy_key(&self, location: &Location, date: NaiveDate) -> Result<String> {
        Ok(self.urls.astronomy(location, date)?.to_string())
    }
}

#[async_trait]
impl SnapshotSource for WeatherApiProvider {
    async fn current_snapshot(&self, location: &Location) -> Result<WeatherSnapshot> {
        self.current(location).await
    }
}
