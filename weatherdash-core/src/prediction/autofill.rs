//! Mapping from a current-conditions snapshot onto prediction form fields.
//!
//! Each form declares a table of `target field -> source`. Concepts the
//! weather provider does not expose (rainfall, evaporation, gust direction
//! on a 0-10 scale) are filled from a literal placeholder.

use crate::{contract::CurrentConditions, validation::FieldValue};

/// A numeric reading from [`CurrentConditions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentField {
    PressureMb,
    PrecipMm,
    Humidity,
    DewpointC,
    TempC,
    GustKph,
    Cloud,
}

impl CurrentField {
    pub fn read(&self, current: &CurrentConditions) -> f64 {
        match self {
            CurrentField::PressureMb => current.pressure_mb,
            CurrentField::PrecipMm => current.precip_mm,
            CurrentField::Humidity => current.humidity,
            CurrentField::DewpointC => current.dewpoint_c,
            CurrentField::TempC => current.temp_c,
            CurrentField::GustKph => current.gust_kph,
            CurrentField::Cloud => current.cloud,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillSource {
    /// Copy the reading as is.
    Reading(CurrentField),
    /// `true` when the reading is above zero.
    Observed(CurrentField),
    /// No provider analog; fill with a constant.
    Placeholder(FieldValue),
}

impl FillSource {
    pub fn resolve(&self, current: &CurrentConditions) -> FieldValue {
        match self {
            FillSource::Reading(field) => FieldValue::Number(field.read(current)),
            FillSource::Observed(field) => FieldValue::Flag(field.read(current) > 0.0),
            FillSource::Placeholder(value) => *value,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, FillSource::Placeholder(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillRule {
    pub target: &'static str,
    pub source: FillSource,
}

const fn reading(target: &'static str, field: CurrentField) -> FillRule {
    FillRule { target, source: FillSource::Reading(field) }
}

const fn placeholder(target: &'static str, value: f64) -> FillRule {
    FillRule { target, source: FillSource::Placeholder(FieldValue::Number(value)) }
}

pub const TEMPERATURE_RULES: &[FillRule] = &[
    reading("sealevelpressure", CurrentField::PressureMb),
    reading("evaporation", CurrentField::PrecipMm),
    reading("humidity", CurrentField::Humidity),
    reading("dew", CurrentField::DewpointC),
    reading("temp", CurrentField::TempC),
];

pub const RAIN_RULES: &[FillRule] = &[
    placeholder("rainfall", 1.0),
    placeholder("evaporation", 1.0),
    placeholder("wind_gust_dir", 10.0),
    reading("wind_gust_speed", CurrentField::GustKph),
    reading("dew", CurrentField::DewpointC),
    reading("humidity", CurrentField::Humidity),
    reading("precip", CurrentField::PrecipMm),
    reading("sealevelpressure", CurrentField::PressureMb),
    reading("cloudcover", CurrentField::Cloud),
    FillRule { target: "rain_today", source: FillSource::Observed(CurrentField::PrecipMm) },
];

pub const WEATHER_TYPE_RULES: &[FillRule] = &[
    reading("temp", CurrentField::TempC),
    reading("humidity", CurrentField::Humidity),
    placeholder("evaporation", 1.25),
    reading("cloudcover", CurrentField::Cloud),
    reading("rainfall", CurrentField::PrecipMm),
];

/// Resolve every rule against `current`.
pub fn resolve(rules: &[FillRule], current: &CurrentConditions) -> Vec<(&'static str, FieldValue)> {
    rules.iter().map(|rule| (rule.target, rule.source.resolve(current))).collect()
}
