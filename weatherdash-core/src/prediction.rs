//! Prediction request pipeline: typed inputs, declared bounds, auto-fill
//! from the latest snapshot, and the per-form submit state machine.

use std::{convert::TryFrom, fmt};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DashboardError, Result};

pub mod autofill;
pub mod form;
pub mod input;

pub use autofill::{CurrentField, FillRule, FillSource};
pub use form::{FormPhase, PredictionForm};
pub use input::{FormInput, RainInput, TemperatureInput, WeatherTypeInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PredictionKind {
    Temperature,
    Rain,
    WeatherType,
}

impl PredictionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionKind::Temperature => "temperature",
            PredictionKind::Rain => "rain",
            PredictionKind::WeatherType => "weather-type",
        }
    }

    /// Backend endpoint that accepts this kind's input.
    pub fn path(&self) -> &'static str {
        match self {
            PredictionKind::Temperature => "/predict/temperature",
            PredictionKind::Rain => "/predict/rain",
            PredictionKind::WeatherType => "/predict/weather-type",
        }
    }

    pub const fn all() -> &'static [PredictionKind] {
        &[PredictionKind::Temperature, PredictionKind::Rain, PredictionKind::WeatherType]
    }
}

impl fmt::Display for PredictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PredictionKind {
    type Error = DashboardError;

    fn try_from(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "temperature" => Ok(PredictionKind::Temperature),
            "rain" => Ok(PredictionKind::Rain),
            "weather-type" | "weather_type" => Ok(PredictionKind::WeatherType),
            _ => Err(DashboardError::Configuration(format!(
                "Unknown prediction kind '{value}'. \
                 Supported kinds: temperature, rain, weather-type."
            ))),
        }
    }
}

/// Rain model output: a probability, or the backend's Yes/No label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RainOutcome {
    Probability(f64),
    Label(bool),
}

impl RainOutcome {
    pub fn is_likely(&self) -> bool {
        match self {
            RainOutcome::Probability(p) => *p > 0.5,
            RainOutcome::Label(yes) => *yes,
        }
    }

    pub fn summary(&self) -> &'static str {
        if self.is_likely() { "Likely to rain" } else { "Unlikely to rain" }
    }
}

/// One of the three weather patterns produced by the clustering model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WeatherCluster {
    HotAndDry,
    ModerateWeather,
    CoolAndHumid,
}

impl WeatherCluster {
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            0 => Some(WeatherCluster::HotAndDry),
            1 => Some(WeatherCluster::ModerateWeather),
            2 => Some(WeatherCluster::CoolAndHumid),
            _ => None,
        }
    }

    pub fn id(&self) -> u8 {
        match self {
            WeatherCluster::HotAndDry => 0,
            WeatherCluster::ModerateWeather => 1,
            WeatherCluster::CoolAndHumid => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeatherCluster::HotAndDry => "Hot and Dry",
            WeatherCluster::ModerateWeather => "Moderate Weather",
            WeatherCluster::CoolAndHumid => "Cool and Humid",
        }
    }
}

impl<'de> Deserialize<'de> for WeatherCluster {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = i64::deserialize(deserializer)?;
        WeatherCluster::from_id(id)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown weather cluster id {id}")))
    }
}

impl Serialize for WeatherCluster {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.id())
    }
}

impl fmt::Display for WeatherCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PredictionResult {
    /// Tomorrow's temperature in °C.
    Temperature(f64),
    Rain(RainOutcome),
    WeatherType(WeatherCluster),
}

impl PredictionResult {
    /// Extract the single `prediction` field of a predict response body.
    pub fn from_response(kind: PredictionKind, body: &Value) -> Result<Self> {
        let value = body
            .get("prediction")
            .ok_or_else(|| {
                DashboardError::schema("prediction response has no `prediction` field")
            })?;

        let unexpected =
            || DashboardError::schema(format!("unexpected {kind} prediction: {value}"));

        match kind {
            PredictionKind::Temperature => {
                value.as_f64().map(PredictionResult::Temperature).ok_or_else(unexpected)
            }
            PredictionKind::Rain => {
                let outcome = match value {
                    Value::Number(n) => n.as_f64().map(RainOutcome::Probability),
                    Value::Bool(b) => Some(RainOutcome::Label(*b)),
                    Value::String(s) if s.eq_ignore_ascii_case("yes") => {
                        Some(RainOutcome::Label(true))
                    }
                    Value::String(s) if s.eq_ignore_ascii_case("no") => {
                        Some(RainOutcome::Label(false))
                    }
                    _ => None,
                };
                outcome.map(PredictionResult::Rain).ok_or_else(unexpected)
            }
            PredictionKind::WeatherType => value
                .as_i64()
                .and_then(WeatherCluster::from_id)
                .map(PredictionResult::WeatherType)
                .ok_or_else(unexpected),
        }
    }
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionResult::Temperature(t) => write!(f, "{t}°C"),
            PredictionResult::Rain(outcome) => f.write_str(outcome.summary()),
            PredictionResult::WeatherType(cluster) => f.write_str(cluster.label()),
        }
    }
}

/// Backend that turns a validated input into a prediction.
#[async_trait]
pub trait PredictionService: Send + Sync {
    async fn predict(&self, kind: PredictionKind, payload: Value) -> Result<PredictionResult>;
}
