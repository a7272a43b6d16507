use crate::{
    Config,
    contract::{AstroSnapshot, WeatherSnapshot},
    error::Result,
    model::Location,
    provider::{urls::QueryUrls, weatherapi::WeatherApiProvider},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::{fmt::Debug, sync::Arc};

pub mod urls;
pub mod weatherapi;

/// Source of validated weather data for one location.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, location: &Location) -> Result<WeatherSnapshot>;

    /// Current conditions plus `days` forecast days with hourly detail.
    async fn forecast(&self, location: &Location, days: u8) -> Result<WeatherSnapshot>;

    async fn astronomy(&self, location: &Location, date: NaiveDate) -> Result<AstroSnapshot>;

    /// Cache key for the `current` request.
    fn current_key(&self, location: &Location) -> Result<String>;

    fn forecast_key(&self, location: &Location, days: u8) -> Result<String>;

    fn astronomy_key(&self, location: &Location, date: NaiveDate) -> Result<String>;
}

/// Where auto-fill reads the latest current-conditions snapshot from.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn current_snapshot(&self, location: &Location) -> Result<WeatherSnapshot>;
}

/// Construct the weather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.weather_api_key()?;
    let urls = QueryUrls::new(config.weather_api.base_url.clone(), api_key.to_owned());
    Ok(Arc::new(WeatherApiProvider::new(urls)))
}
