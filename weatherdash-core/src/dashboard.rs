//! The dashboard: every view and chart query behind a shared request cache.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::{
    Config,
    backend::BackendClient,
    cache::{FetchCache, FetchState},
    contract::{AstroSnapshot, WeatherSnapshot},
    error::{DashboardError, Result},
    model::{DateRange, HistoryWindow, Location},
    provider::{SnapshotSource, WeatherProvider, provider_from_config},
    views::Highlights,
    visualize::{
        self, ClusterPoint, ClusterSlice, RainProbabilityPoint, TemperaturePoint, TemperatureQuery,
    },
};

pub struct Dashboard {
    provider: Arc<dyn WeatherProvider>,
    backend: Option<BackendClient>,
    history: HistoryWindow,
    forecast_days: u8,
    current: FetchCache<String, WeatherSnapshot>,
    forecast: FetchCache<String, WeatherSnapshot>,
    astro: FetchCache<String, AstroSnapshot>,
    temperature: FetchCache<TemperatureQuery, Vec<TemperaturePoint>>,
    rain: FetchCache<DateRange, Vec<RainProbabilityPoint>>,
    clusters: FetchCache<DateRange, Vec<ClusterPoint>>,
}

impl Dashboard {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        backend: Option<BackendClient>,
        history: HistoryWindow,
        forecast_days: u8,
    ) -> Self {
        Self {
            provider,
            backend,
            history,
            forecast_days,
            current: FetchCache::new(),
            forecast: FetchCache::new(),
            astro: FetchCache::new(),
            temperature: FetchCache::new(),
            rain: FetchCache::new(),
            clusters: FetchCache::new(),
        }
    }

    /// Provider is required; the backend only when `[backend]` is set.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = provider_from_config(config)?;
        let backend = match config.backend.base_url {
            Some(_) => Some(BackendClient::from_config(config)?),
            None => None,
        };
        Ok(Self::new(provider, backend, config.history, config.forecast_days))
    }

    pub fn history(&self) -> &HistoryWindow {
        &self.history
    }

    pub fn backend(&self) -> Result<&BackendClient> {
        self.backend.as_ref().ok_or_else(|| {
            DashboardError::Configuration(
                "no prediction backend configured \
                 (set [backend] base_url or WEATHER_BACKEND_URL)"
                    .into(),
            )
        })
    }

    pub async fn current(&self, location: &Location) -> Result<Arc<WeatherSnapshot>> {
        let key = self.provider.current_key(location)?;
        let provider = Arc::clone(&self.provider);
        let location = location.clone();
        self.current
            .fetch(key, move || async move { provider.current(&location).await })
            .await
    }

    /// Cached current conditions right away, refreshed in the background.
    pub fn current_state(&self, location: &Location) -> Result<FetchState<WeatherSnapshot>> {
        let key = self.provider.current_key(location)?;
        let provider = Arc::clone(&self.provider);
        let location = location.clone();
        Ok(self.current.revalidate(key, move || async move { provider.current(&location).await }))
    }

    /// Forecast for `days` days, or the configured default.
    pub async fn forecast(
        &self,
        location: &Location,
        days: Option<u8>,
    ) -> Result<Arc<WeatherSnapshot>> {
        let days = days.unwrap_or(self.forecast_days);
        let key = self.provider.forecast_key(location, days)?;
        let provider = Arc::clone(&self.provider);
        let location = location.clone();
        self.forecast
            .fetch(key, move || async move { provider.forecast(&location, days).await })
            .await
    }

    pub async fn astronomy(
        &self,
        location: &Location,
        date: NaiveDate,
    ) -> Result<Arc<AstroSnapshot>> {
        let key = self.provider.astronomy_key(location, date)?;
        let provider = Arc::clone(&self.provider);
        let location = location.clone();
        self.astro
            .fetch(key, move || async move { provider.astronomy(&location, date).await })
            .await
    }

    /// Highlights for `today`. A failed astronomy request leaves sunrise and
    /// sunset pending instead of failing the whole view.
    pub async fn highlights(&self, location: &Location, today: NaiveDate) -> Result<Highlights> {
        let (current, astro) =
            futures::join!(self.current(location), self.astronomy(location, today));
        let current = current?;
        let astro = match astro {
            Ok(astro) => Some(astro),
            Err(err) => {
                warn!(error = %err, "astronomy unavailable");
                None
            }
        };
        Ok(Highlights::new(&current.current, astro.as_deref()))
    }

    pub async fn temperature_chart(
        &self,
        query: TemperatureQuery,
    ) -> Result<Arc<Vec<TemperaturePoint>>> {
        let backend = self.backend()?.clone();
        match query {
            TemperatureQuery::History(range) => {
                let range = self.history.check(range)?;
                self.temperature
                    .fetch(TemperatureQuery::History(range), move || async move {
                        let points = backend.temperature_history(range).await?;
                        Ok(visualize::clip(&points, &range))
                    })
                    .await
            }
            TemperatureQuery::NextWeek { location, from } => {
                let forecast = self.forecast(&location, Some(7)).await?;
                if forecast.forecast_days().is_empty() {
                    return Err(DashboardError::schema(format!(
                        "forecast for {location} has no days to predict from"
                    )));
                }
                let key = TemperatureQuery::NextWeek { location, from };
                self.temperature
                    .fetch(key, move || async move {
                        let days = forecast.forecast_days();
                        let predictions = backend.predict_next_week(days).await?;
                        debug!(count = predictions.len(), "next-week predictions");
                        Ok(visualize::next_week_series(from, &predictions))
                    })
                    .await
            }
        }
    }

    pub async fn rain_chart(&self, range: DateRange) -> Result<Arc<Vec<RainProbabilityPoint>>> {
        let range = self.history.check(range)?;
        let backend = self.backend()?.clone();
        self.rain
            .fetch(range, move || async move {
                let by_date = backend.rain_probabilities(range).await?;
                Ok(visualize::clip(&visualize::rain_series(&by_date), &range))
            })
            .await
    }

    pub async fn cluster_points(&self, range: DateRange) -> Result<Arc<Vec<ClusterPoint>>> {
        let range = self.history.check(range)?;
        let backend = self.backend()?.clone();
        self.clusters
            .fetch(range, move || async move {
                let by_date = backend.cluster_assignments(range).await?;
                Ok(visualize::clip(&visualize::cluster_series(&by_date), &range))
            })
            .await
    }

    /// Pie slices of the weather-pattern distribution in `range`.
    pub async fn cluster_chart(&self, range: DateRange) -> Result<Vec<ClusterSlice>> {
        let points = self.cluster_points(range).await?;
        Ok(visualize::cluster_distribution(&points))
    }
}

/// Auto-fill through the dashboard reuses an already loaded snapshot.
#[async_trait]
impl SnapshotSource for Dashboard {
    async fn current_snapshot(&self, location: &Location) -> Result<WeatherSnapshot> {
        Ok(self.current(location).await?.as_ref().clone())
    }
}
