use serde::Serialize;

use crate::{
    error::{DashboardError, FieldError, Result},
    validation::{BoundSet, FieldBound, FieldSpec, FieldValue},
};

use super::{FillRule, PredictionKind};

/// A prediction form's field set.
///
/// `Default` yields the values a fresh form opens with. Serialization
/// produces the backend request body.
pub trait FormInput: Serialize + Clone + Default + Send + Sync + 'static {
    const KIND: PredictionKind;

    /// Bounds each field is declared with.
    fn declared_bounds() -> BoundSet;

    /// Field mapping used by auto-fill.
    fn autofill_rules() -> &'static [FillRule];

    /// Current values in declaration order.
    fn values(&self) -> Vec<(&'static str, FieldValue)>;

    /// Store a raw value; bounds are checked separately at submit time.
    fn set(&mut self, field: &str, value: FieldValue) -> Result<()>;
}

fn number(field: &'static str, value: FieldValue) -> Result<f64> {
    value.as_number().ok_or_else(|| {
        DashboardError::Validation(vec![FieldError { field, message: "Expected a number".into() }])
    })
}

fn flag(field: &'static str, value: FieldValue) -> Result<bool> {
    value.as_flag().ok_or_else(|| {
        let message = "Expected true or false".to_string();
        DashboardError::Validation(vec![FieldError { field, message }])
    })
}

fn unknown(kind: PredictionKind, field: &str) -> DashboardError {
    DashboardError::UnknownField { form: kind.to_string(), field: field.to_string() }
}

/// Inputs to the next-day temperature regression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureInput {
    pub sealevelpressure: f64,
    pub evaporation: f64,
    pub humidity: f64,
    pub dew: f64,
    pub temp: f64,
}

impl Default for TemperatureInput {
    fn default() -> Self {
        Self { sealevelpressure: 1013.0, evaporation: 0.0, humidity: 60.0, dew: 0.0, temp: 0.0 }
    }
}

impl FormInput for TemperatureInput {
    const KIND: PredictionKind = PredictionKind::Temperature;

    fn declared_bounds() -> BoundSet {
        BoundSet::new(vec![
            FieldSpec::number(
                "sealevelpressure",
                "Sea Level Pressure (hPa)",
                " hPa",
                FieldBound::between(800.0, 1200.0),
            ),
            FieldSpec::number(
                "evaporation",
                "Evaporation (mm)",
                " mm",
                FieldBound::between(0.0, 100.0),
            ),
            FieldSpec::number("humidity", "Humidity (%)", "%", FieldBound::between(0.0, 100.0)),
            FieldSpec::number("dew", "Dew Point (°C)", "°C", FieldBound::between(-50.0, 50.0)),
            FieldSpec::number("temp", "Temperature (°C)", "°C", FieldBound::between(-50.0, 50.0)),
        ])
    }

    fn autofill_rules() -> &'static [FillRule] {
        super::autofill::TEMPERATURE_RULES
    }

    fn values(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("sealevelpressure", FieldValue::Number(self.sealevelpressure)),
            ("evaporation", FieldValue::Number(self.evaporation)),
            ("humidity", FieldValue::Number(self.humidity)),
            ("dew", FieldValue::Number(self.dew)),
            ("temp", FieldValue::Number(self.temp)),
        ]
    }

    fn set(&mut self, field: &str, value: FieldValue) -> Result<()> {
        match field {
            "sealevelpressure" => self.sealevelpressure = number("sealevelpressure", value)?,
            "evaporation" => self.evaporation = number("evaporation", value)?,
            "humidity" => self.humidity = number("humidity", value)?,
            "dew" => self.dew = number("dew", value)?,
            "temp" => self.temp = number("temp", value)?,
            other => return Err(unknown(Self::KIND, other)),
        }
        Ok(())
    }
}

/// Inputs to the rain classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RainInput {
    pub rainfall: f64,
    pub evaporation: f64,
    pub wind_gust_dir: f64,
    pub wind_gust_speed: f64,
    pub dew: f64,
    pub humidity: f64,
    pub precip: f64,
    pub sealevelpressure: f64,
    pub cloudcover: f64,
    pub rain_today: bool,
}

impl Default for RainInput {
    fn default() -> Self {
        Self {
            rainfall: 0.0,
            evaporation: 0.0,
            wind_gust_dir: 10.0,
            wind_gust_speed: 0.0,
            dew: 0.0,
            humidity: 0.0,
            precip: 0.0,
            sealevelpressure: 1013.0,
            cloudcover: 0.0,
            rain_today: false,
        }
    }
}

impl FormInput for RainInput {
    const KIND: PredictionKind = PredictionKind::Rain;

    // Looser than the temperature form: several fields have no upper bound
    // and the dew point has none at all.
    fn declared_bounds() -> BoundSet {
        BoundSet::new(vec![
            FieldSpec::number("rainfall", "Rainfall (mm)", " mm", FieldBound::at_least(0.0)),
            FieldSpec::number("evaporation", "Evaporation (mm)", " mm", FieldBound::at_least(0.0)),
            FieldSpec::number(
                "wind_gust_dir",
                "Wind Gust Direction",
                "",
                FieldBound::between(0.0, 10.0),
            ),
            FieldSpec::number(
                "wind_gust_speed",
                "Wind Gust Speed (km/h)",
                " km/h",
                FieldBound::at_least(0.0),
            ),
            FieldSpec::number("dew", "Dew Point (°C)", "°C", FieldBound::unbounded()),
            FieldSpec::number("humidity", "Humidity (%)", "%", FieldBound::between(0.0, 100.0)),
            FieldSpec::number("precip", "Precipitation (mm)", " mm", FieldBound::at_least(0.0)),
            FieldSpec::number(
                "sealevelpressure",
                "Sea Level Pressure (hPa)",
                " hPa",
                FieldBound::at_least(0.0),
            ),
            FieldSpec::number(
                "cloudcover",
                "Cloud Cover (%)",
                "%",
                FieldBound::between(0.0, 100.0),
            ),
            FieldSpec::flag("rain_today", "Rain Today"),
        ])
    }

    fn autofill_rules() -> &'static [FillRule] {
        super::autofill::RAIN_RULES
    }

    fn values(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("rainfall", FieldValue::Number(self.rainfall)),
            ("evaporation", FieldValue::Number(self.evaporation)),
            ("wind_gust_dir", FieldValue::Number(self.wind_gust_dir)),
            ("wind_gust_speed", FieldValue::Number(self.wind_gust_speed)),
            ("dew", FieldValue::Number(self.dew)),
            ("humidity", FieldValue::Number(self.humidity)),
            ("precip", FieldValue::Number(self.precip)),
            ("sealevelpressure", FieldValue::Number(self.sealevelpressure)),
            ("cloudcover", FieldValue::Number(self.cloudcover)),
            ("rain_today", FieldValue::Flag(self.rain_today)),
        ]
    }

    fn set(&mut self, field: &str, value: FieldValue) -> Result<()> {
        match field {
            "rainfall" => self.rainfall = number("rainfall", value)?,
            "evaporation" => self.evaporation = number("evaporation", value)?,
            "wind_gust_dir" => self.wind_gust_dir = number("wind_gust_dir", value)?,
            "wind_gust_speed" => self.wind_gust_speed = number("wind_gust_speed", value)?,
            "dew" => self.dew = number("dew", value)?,
            "humidity" => self.humidity = number("humidity", value)?,
            "precip" => self.precip = number("precip", value)?,
            "sealevelpressure" => self.sealevelpressure = number("sealevelpressure", value)?,
            "cloudcover" => self.cloudcover = number("cloudcover", value)?,
            "rain_today" => self.rain_today = flag("rain_today", value)?,
            other => return Err(unknown(Self::KIND, other)),
        }
        Ok(())
    }
}

/// Inputs to the weather-type clustering model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherTypeInput {
    pub temp: f64,
    pub humidity: f64,
    pub evaporation: f64,
    pub cloudcover: f64,
    pub rainfall: f64,
}

impl Default for WeatherTypeInput {
    fn default() -> Self {
        Self { temp: 20.0, humidity: 50.0, evaporation: 0.0, cloudcover: 30.0, rainfall: 0.0 }
    }
}

impl FormInput for WeatherTypeInput {
    const KIND: PredictionKind = PredictionKind::WeatherType;

    fn declared_bounds() -> BoundSet {
        BoundSet::new(vec![
            FieldSpec::number("temp", "Temperature (°C)", "°C", FieldBound::between(-50.0, 50.0)),
            FieldSpec::number("humidity", "Humidity (%)", "%", FieldBound::between(0.0, 100.0)),
            FieldSpec::number("evaporation", "Evaporation (mm)", " mm", FieldBound::at_least(0.0)),
            FieldSpec::number(
                "cloudcover",
                "Cloud Cover (%)",
                "%",
                FieldBound::between(0.0, 100.0),
            ),
            FieldSpec::number("rainfall", "Rainfall (mm)", " mm", FieldBound::at_least(0.0)),
        ])
    }

    fn autofill_rules() -> &'static [FillRule] {
        super::autofill::WEATHER_TYPE_RULES
    }

    fn values(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("temp", FieldValue::Number(self.temp)),
            ("humidity", FieldValue::Number(self.humidity)),
            ("evaporation", FieldValue::Number(self.evaporation)),
            ("cloudcover", FieldValue::Number(self.cloudcover)),
            ("rainfall", FieldValue::Number(self.rainfall)),
        ]
    }

    fn set(&mut self, field: &str, value: FieldValue) -> Result<()> {
        match field {
            "temp" => self.temp = number("temp", value)?,
            "humidity" => self.humidity = number("humidity", value)?,
            "evaporation" => self.evaporation = number("evaporation", value)?,
            "cloudcover" => self.cloudcover = number("cloudcover", value)?,
            "rainfall" => self.rainfall = number("rainfall", value)?,
            other => return Err(unknown(Self::KIND, other)),
        }
        Ok(())
    }
}
