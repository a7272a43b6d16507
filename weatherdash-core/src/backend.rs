//! Client for the prediction and visualization backend.

use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::{
    Config,
    contract::{DaySummary, ForecastDay},
    error::{DashboardError, Result, truncate_body},
    model::DateRange,
    prediction::{PredictionKind, PredictionResult, PredictionService, WeatherCluster},
    visualize::{TemperaturePoint, parse_day},
};

#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    http: Client,
}

#[derive(Serialize)]
struct NextWeekRequest<'a> {
    forecast_days: Vec<NextWeekDay<'a>>,
}

#[derive(Serialize)]
struct NextWeekDay<'a> {
    day: &'a DaySummary,
}

#[derive(Deserialize)]
struct NextWeekResponse {
    predictions: Vec<f64>,
}

#[derive(Deserialize)]
struct TemperatureResponse {
    chart_data: TemperatureChartData,
}

#[derive(Deserialize)]
struct TemperatureChartData {
    temperature_data: Vec<TemperaturePoint>,
}

#[derive(Deserialize)]
struct RainResponse {
    probability_by_date: BTreeMap<String, f64>,
}

#[derive(Deserialize)]
struct ClusterResponse {
    cluster_by_date: BTreeMap<String, WeatherCluster>,
}

impl BackendClient {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url: String = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| {
                DashboardError::Configuration(format!("invalid backend URL '{base_url}': {e}"))
            })?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| {
                DashboardError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { base_url, http })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let base_url = config.backend_url()?;
        let timeout = config.backend.timeout_secs.map(Duration::from_secs);
        Ok(Self::new(base_url, timeout)?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{path}", self.base_url))
            .map_err(|e| {
                DashboardError::Configuration(format!("invalid backend path {path}: {e}"))
            })?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter().copied());
        }
        Ok(url)
    }

    fn range_url(&self, path: &str, range: &DateRange) -> Result<Url> {
        self.url(path, &[("start_date", &range.start_param()), ("end_date", &range.end_param())])
    }

    /// GET a visualization endpoint. `Ok(None)` when the backend has no data
    /// for the range (404).
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        debug!(%url, "backend request");
        let res = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| {
                DashboardError::network(format!("Failed to reach backend at {url}: {e}"))
            })?;

        if res.status() == StatusCode::NOT_FOUND {
            debug!(%url, "no data for range");
            return Ok(None);
        }
        read_json(res, url.path()).await.map(Some)
    }

    /// Predicted average temperatures for the given forecast days, in order.
    #[instrument(skip_all, fields(days = days.len()))]
    pub async fn predict_next_week(&self, days: &[ForecastDay]) -> Result<Vec<f64>> {
        let url = self.url("/predict/next-week", &[])?;
        let body = NextWeekRequest {
            forecast_days: days.iter().map(|d| NextWeekDay { day: &d.day }).collect(),
        };

        let res = self
            .http
            .post(url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                DashboardError::network(format!("Failed to reach backend at {url}: {e}"))
            })?;
        let parsed: NextWeekResponse = read_json(res, url.path()).await?;
        Ok(parsed.predictions)
    }

    #[instrument(skip(self, range), fields(range = %range))]
    pub async fn temperature_history(&self, range: DateRange) -> Result<Vec<TemperaturePoint>> {
        let url = self.range_url("/visualize/temperature", &range)?;
        let parsed: Option<TemperatureResponse> = self.get_json(url).await?;
        Ok(parsed.map(|r| r.chart_data.temperature_data).unwrap_or_default())
    }

    #[instrument(skip(self, range), fields(range = %range))]
    pub async fn rain_probabilities(&self, range: DateRange) -> Result<BTreeMap<NaiveDate, f64>> {
        let url = self.range_url("/visualize/rain", &range)?;
        let parsed: Option<RainResponse> = self.get_json(url).await?;
        parsed.map(|r| dated(r.probability_by_date)).transpose().map(Option::unwrap_or_default)
    }

    #[instrument(skip(self, range), fields(range = %range))]
    pub async fn cluster_assignments(
        &self,
        range: DateRange,
    ) -> Result<BTreeMap<NaiveDate, WeatherCluster>> {
        let url = self.range_url("/visualize/cluster", &range)?;
        let parsed: Option<ClusterResponse> = self.get_json(url).await?;
        parsed.map(|r| dated(r.cluster_by_date)).transpose().map(Option::unwrap_or_default)
    }
}

fn dated<V>(by_date: BTreeMap<String, V>) -> Result<BTreeMap<NaiveDate, V>> {
    by_date
        .into_iter()
        .map(|(raw, v)| parse_day(&raw).map(|d| (d, v)).map_err(DashboardError::schema))
        .collect()
}

async fn read_json<T: DeserializeOwned>(res: Response, what: &str) -> Result<T> {
    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| {
            DashboardError::network(format!("Failed to read backend {what} response body: {e}"))
        })?;

    if !status.is_success() {
        warn!(%status, "backend {what} request failed");
        return Err(DashboardError::network(format!(
            "Backend {what} request failed with status {status}: {}",
            truncate_body(&body)
        )));
    }

    serde_json::from_str(&body)
        .map_err(|e| DashboardError::schema(format!("backend {what} response: {e}")))
}

#[async_trait]
impl PredictionService for BackendClient {
    #[instrument(skip(self, kind, payload), fields(kind = %kind))]
    async fn predict(&self, kind: PredictionKind, payload: Value) -> Result<PredictionResult> {
        let url = self.url(kind.path(), &[])?;
        debug!(%url, "submitting prediction");

        let res = self
            .http
            .post(url.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                DashboardError::network(format!("Failed to reach backend at {url}: {e}"))
            })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| {
                DashboardError::network(format!("Failed to read prediction response body: {e}"))
            })?;

        if !status.is_success() {
            return Err(DashboardError::PredictionRejected {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| DashboardError::schema(format!("prediction response: {e}")))?;
        PredictionResult::from_response(kind, &value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> BackendClient {
        BackendClient::new("http://localhost:8000/", None).unwrap()
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(client().base_url(), "http://localhost:8000");
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let err = BackendClient::new("not a url", None).unwrap_err();
        assert!(matches!(err, DashboardError::Configuration(_)));
    }

    #[test]
    fn range_params_use_iso_dates() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2017, 6, 17).unwrap(),
            NaiveDate::from_ymd_opt(2017, 6, 25).unwrap(),
        )
        .unwrap();
        let url = client().range_url("/visualize/rain", &range).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/visualize/rain?start_date=2017-06-17&end_date=2017-06-25"
        );
    }

    #[test]
    fn from_config_requires_backend_url() {
        let err = BackendClient::from_config(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("Hint: run `weatherdash configure`"));
    }

    #[test]
    fn bad_date_key_is_a_schema_violation() {
        let map = BTreeMap::from([("June 17".to_string(), 0.3)]);
        assert!(matches!(dated(map), Err(DashboardError::SchemaViolation(_))));
    }
}
