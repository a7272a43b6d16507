//! Shape of the weather provider's JSON responses.
//!
//! Every required field must be present with the right primitive type;
//! validation is all-or-nothing per response. Optional sub-objects (air
//! quality, forecast) may be absent and are then simply not rendered.

use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

/// Number of hourly readings in one forecast day.
pub const HOURS_PER_DAY: usize = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub name: String,
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub tz_id: String,
    pub localtime_epoch: i64,
    pub localtime: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    pub icon: String,
    pub code: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    pub co: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    #[serde(rename = "us-epa-index")]
    pub us_epa_index: f64,
    #[serde(rename = "gb-defra-index")]
    pub gb_defra_index: f64,
}

/// Point-in-time snapshot under the `current` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub last_updated_epoch: i64,
    pub last_updated: String,
    pub temp_c: f64,
    pub temp_f: f64,
    pub is_day: u8,
    pub condition: Condition,
    pub wind_mph: f64,
    pub wind_kph: f64,
    pub wind_degree: f64,
    pub wind_dir: String,
    pub pressure_mb: f64,
    pub pressure_in: f64,
    pub precip_mm: f64,
    pub precip_in: f64,
    pub humidity: f64,
    pub cloud: f64,
    pub feelslike_c: f64,
    pub feelslike_f: f64,
    pub windchill_c: f64,
    pub windchill_f: f64,
    pub heatindex_c: f64,
    pub heatindex_f: f64,
    pub dewpoint_c: f64,
    pub dewpoint_f: f64,
    pub vis_km: f64,
    pub vis_miles: f64,
    pub uv: f64,
    pub gust_mph: f64,
    pub gust_kph: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_quality: Option<AirQuality>,
}

/// Aggregated summary of one forecast day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub maxtemp_c: f64,
    pub maxtemp_f: f64,
    pub mintemp_c: f64,
    pub mintemp_f: f64,
    pub avgtemp_c: f64,
    pub avgtemp_f: f64,
    pub maxwind_mph: f64,
    pub maxwind_kph: f64,
    pub totalprecip_mm: f64,
    pub totalprecip_in: f64,
    pub totalsnow_cm: f64,
    pub avgvis_km: f64,
    pub avgvis_miles: f64,
    pub avghumidity: f64,
    pub daily_will_it_rain: u8,
    pub daily_chance_of_rain: f64,
    pub daily_will_it_snow: u8,
    pub daily_chance_of_snow: f64,
    pub condition: Condition,
    pub uv: f64,
}

/// Sun and moon times for one (location, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstroSnapshot {
    pub sunrise: String,
    pub sunset: String,
    pub moonrise: String,
    pub moonset: String,
    pub moon_phase: String,
    pub moon_illumination: f64,
    pub is_moon_up: u8,
    pub is_sun_up: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyReading {
    pub time_epoch: i64,
    pub time: String,
    pub temp_c: f64,
    pub temp_f: f64,
    pub is_day: u8,
    pub condition: Condition,
    pub wind_mph: f64,
    pub wind_kph: f64,
    pub wind_degree: f64,
    pub wind_dir: String,
    pub pressure_mb: f64,
    pub pressure_in: f64,
    pub precip_mm: f64,
    pub precip_in: f64,
    pub snow_cm: f64,
    pub humidity: f64,
    pub cloud: f64,
    pub feelslike_c: f64,
    pub feelslike_f: f64,
    pub windchill_c: f64,
    pub windchill_f: f64,
    pub heatindex_c: f64,
    pub heatindex_f: f64,
    pub dewpoint_c: f64,
    pub dewpoint_f: f64,
    pub will_it_rain: u8,
    pub chance_of_rain: f64,
    pub will_it_snow: u8,
    pub chance_of_snow: f64,
    pub vis_km: f64,
    pub vis_miles: f64,
    pub gust_mph: f64,
    pub gust_kph: f64,
    pub uv: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: String,
    pub date_epoch: i64,
    pub day: DaySummary,
    pub astro: AstroSnapshot,
    pub hour: Vec<HourlyReading>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub forecastday: Vec<ForecastDay>,
}

/// Body of a `current.json` or `forecast.json` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: LocationInfo,
    pub current: CurrentConditions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Forecast>,
}

impl WeatherSnapshot {
    pub fn forecast_days(&self) -> &[ForecastDay] {
        self.forecast.as_ref().map(|f| f.forecastday.as_slice()).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct AstronomyResponse {
    astronomy: AstronomyBody,
}

#[derive(Debug, Deserialize)]
struct AstronomyBody {
    astro: AstroSnapshot,
}

/// Parse and validate a `current.json` or `forecast.json` body.
pub fn parse_current_or_forecast(body: &str) -> Result<WeatherSnapshot> {
    let snapshot: WeatherSnapshot = serde_json::from_str(body).map_err(DashboardError::schema)?;
    validate_snapshot(&snapshot)?;
    Ok(snapshot)
}

/// Parse the nested `astronomy.astro` object of an `astronomy.json` body.
pub fn parse_astro(body: &str) -> Result<AstroSnapshot> {
    let parsed: AstronomyResponse = serde_json::from_str(body).map_err(DashboardError::schema)?;
    let astro = parsed.astronomy.astro;
    if !(0.0..=100.0).contains(&astro.moon_illumination) {
        return Err(DashboardError::schema(format!(
            "astro.moon_illumination out of range: {}",
            astro.moon_illumination
        )));
    }
    Ok(astro)
}

fn validate_snapshot(snapshot: &WeatherSnapshot) -> Result<()> {
    let c = &snapshot.current;
    non_negative("current", &[
        ("humidity", c.humidity),
        ("cloud", c.cloud),
        ("uv", c.uv),
        ("vis_km", c.vis_km),
    ])?;

    for day in snapshot.forecast_days() {
        if day.hour.len() != HOURS_PER_DAY {
            return Err(DashboardError::schema(format!(
                "forecast day {} has {} hourly readings, expected {HOURS_PER_DAY}",
                day.date,
                day.hour.len()
            )));
        }
        if day.hour.windows(2).any(|w| w[0].time_epoch >= w[1].time_epoch) {
            return Err(DashboardError::schema(format!(
                "forecast day {} hourly readings are not in chronological order",
                day.date
            )));
        }
        for h in &day.hour {
            non_negative("hour", &[
                ("humidity", h.humidity),
                ("cloud", h.cloud),
                ("uv", h.uv),
                ("vis_km", h.vis_km),
            ])?;
        }
    }
    Ok(())
}

fn non_negative(scope: &str, fields: &[(&str, f64)]) -> Result<()> {
    match fields.iter().find(|(_, v)| *v < 0.0 || !v.is_finite()) {
        Some((name, v)) => {
            Err(DashboardError::schema(format!("{scope}.{name} must be non-negative, got {v}")))
        }
        None => Ok(()),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{Value, json};

    pub const CURRENT: &str = include_str!("../tests/fixtures/current_melbourne.json");
    pub const ASTRONOMY: &str = include_str!("../tests/fixtures/astronomy_melbourne.json");

    pub fn current_value() -> Value {
        serde_json::from_str(CURRENT).expect("fixture is valid JSON")
    }

    pub fn hour(epoch: i64, temp_c: f64) -> Value {
        let time = chrono::DateTime::from_timestamp(epoch, 0)
            .expect("epoch in range")
            .format("%Y-%m-%d %H:%M")
            .to_string();
        json!({
            "time_epoch": epoch, "time": time,
            "temp_c": temp_c, "temp_f": temp_c * 1.8 + 32.0, "is_day": 0,
            "condition": {
                "text": "Clear",
                "icon": "//cdn.weatherapi.com/weather/64x64/night/113.png",
                "code": 1000
            },
            "wind_mph": 5.6, "wind_kph": 9.0, "wind_degree": 200.0, "wind_dir": "SSW",
            "pressure_mb": 1016.0, "pressure_in": 30.0, "precip_mm": 0.0, "precip_in": 0.0,
            "snow_cm": 0.0, "humidity": 70.0, "cloud": 10.0,
            "feelslike_c": temp_c, "feelslike_f": 50.0, "windchill_c": temp_c, "windchill_f": 50.0,
            "heatindex_c": temp_c, "heatindex_f": 50.0, "dewpoint_c": 6.0, "dewpoint_f": 42.8,
            "will_it_rain": 0, "chance_of_rain": 0.0, "will_it_snow": 0, "chance_of_snow": 0.0,
            "vis_km": 10.0, "vis_miles": 6.0, "gust_mph": 9.0, "gust_kph": 14.4, "uv": 0.0
        })
    }

    pub fn forecast_day(date: &str, date_epoch: i64, min: f64, max: f64) -> Value {
        let hours: Vec<Value> =
            (0..24).map(|i| hour(date_epoch + i * 3600, min + i as f64 * 0.2)).collect();
        json!({
            "date": date, "date_epoch": date_epoch,
            "day": {
                "maxtemp_c": max, "maxtemp_f": max * 1.8 + 32.0,
                "mintemp_c": min, "mintemp_f": min * 1.8 + 32.0,
                "avgtemp_c": (min + max) / 2.0, "avgtemp_f": 55.0,
                "maxwind_mph": 12.0, "maxwind_kph": 19.3,
                "totalprecip_mm": 1.2, "totalprecip_in": 0.05, "totalsnow_cm": 0.0,
                "avgvis_km": 9.8, "avgvis_miles": 6.0, "avghumidity": 72.0,
                "daily_will_it_rain": 1, "daily_chance_of_rain": 80.0,
                "daily_will_it_snow": 0, "daily_chance_of_snow": 0.0,
                "condition": {
                    "text": "Patchy rain nearby",
                    "icon": "//cdn.weatherapi.com/weather/64x64/day/176.png",
                    "code": 1063
                },
                "uv": 3.0
            },
            "astro": {
                "sunrise": "07:12 AM", "sunset": "05:34 PM", "moonrise": "02:10 AM",
                "moonset": "01:45 PM", "moon_phase": "Waning Crescent",
                "moon_illumination": 42.0, "is_moon_up": 0, "is_sun_up": 1
            },
            "hour": hours
        })
    }

    /// Current response extended with `days` forecast days.
    pub fn forecast_value(days: usize) -> Value {
        let mut value = current_value();
        let base = 1_714_485_600_i64;
        let forecastday: Vec<Value> = (0..days)
            .map(|i| {
                let date = format!("2024-05-{:02}", i + 1);
                forecast_day(&date, base + i as i64 * 86_400, 8.0 + i as f64, 16.0 + i as f64)
            })
            .collect();
        value["forecast"] = json!({ "forecastday": forecastday });
        value
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn parses_current_payload() {
        let snapshot = parse_current_or_forecast(CURRENT).expect("valid payload");
        assert_eq!(snapshot.location.name, "Melbourne");
        assert_eq!(snapshot.current.pressure_mb, 1015.0);
        assert_eq!(snapshot.current.humidity, 55.0);
        assert!(snapshot.current.air_quality.is_some());
        assert!(snapshot.forecast.is_none());
    }

    #[test]
    fn every_required_current_field_is_enforced() {
        let base = current_value();
        let keys: Vec<String> = base["current"]
            .as_object()
            .unwrap()
            .keys()
            .filter(|k| k.as_str() != "air_quality")
            .cloned()
            .collect();

        for key in keys {
            let mut value = base.clone();
            value["current"].as_object_mut().unwrap().remove(&key);
            let err = parse_current_or_forecast(&value.to_string()).unwrap_err();
            assert!(matches!(err, DashboardError::SchemaViolation(_)), "missing {key} should fail");
        }
    }

    #[test]
    fn missing_location_field_fails() {
        let mut value = current_value();
        value["location"].as_object_mut().unwrap().remove("tz_id");
        assert!(parse_current_or_forecast(&value.to_string()).is_err());
    }

    #[test]
    fn wrong_primitive_type_fails() {
        let mut value = current_value();
        value["current"]["temp_c"] = serde_json::json!("18");
        let err = parse_current_or_forecast(&value.to_string()).unwrap_err();
        assert!(matches!(err, DashboardError::SchemaViolation(_)));
    }

    #[test]
    fn air_quality_is_optional() {
        let mut value = current_value();
        value["current"].as_object_mut().unwrap().remove("air_quality");
        let snapshot =
            parse_current_or_forecast(&value.to_string()).expect("air quality may be absent");
        assert!(snapshot.current.air_quality.is_none());
    }

    #[test]
    fn partial_air_quality_fails() {
        let mut value = current_value();
        value["current"]["air_quality"].as_object_mut().unwrap().remove("us-epa-index");
        assert!(parse_current_or_forecast(&value.to_string()).is_err());
    }

    #[test]
    fn negative_humidity_is_a_schema_violation() {
        let mut value = current_value();
        value["current"]["humidity"] = serde_json::json!(-1);
        let err = parse_current_or_forecast(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("current.humidity"));
    }

    #[test]
    fn parses_forecast_with_hourly_detail() {
        let snapshot =
            parse_current_or_forecast(&forecast_value(7).to_string()).expect("valid forecast");
        let days = snapshot.forecast_days();
        assert_eq!(days.len(), 7);
        assert!(days.iter().all(|d| d.hour.len() == HOURS_PER_DAY));
        assert_eq!(days[0].astro.sunrise, "07:12 AM");
    }

    #[test]
    fn forecast_day_with_missing_hour_fails() {
        let mut value = forecast_value(1);
        value["forecast"]["forecastday"][0]["hour"].as_array_mut().unwrap().pop();
        let err = parse_current_or_forecast(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("23 hourly readings"));
    }

    #[test]
    fn unordered_hours_fail() {
        let mut value = forecast_value(1);
        value["forecast"]["forecastday"][0]["hour"].as_array_mut().unwrap().swap(3, 4);
        let err = parse_current_or_forecast(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("chronological"));
    }

    #[test]
    fn parses_astronomy_payload() {
        let astro = parse_astro(ASTRONOMY).expect("valid astronomy");
        assert_eq!(astro.sunrise, "07:08 AM");
        assert_eq!(astro.moon_phase, "Waxing Gibbous");
        assert_eq!(astro.is_sun_up, 1);
    }

    #[test]
    fn astronomy_without_nested_object_fails() {
        let err = parse_astro(r#"{"astronomy": {}}"#).unwrap_err();
        assert!(matches!(err, DashboardError::SchemaViolation(_)));
    }
}
