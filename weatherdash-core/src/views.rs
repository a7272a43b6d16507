//! Read-only view models over validated snapshots.
//!
//! Each view has a `Display` impl producing the terminal rendering used by
//! the CLI.

use std::fmt;

use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;

use crate::{
    contract::{AstroSnapshot, CurrentConditions, ForecastDay, WeatherSnapshot},
    visualize::parse_day,
};

/// Number of hourly slots shown from the current hour on.
pub const HOURLY_SLOTS: usize = 7;

const PENDING: &str = "—";

fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

/// Provider local time, e.g. `2024-05-01 14:00` or `2024-05-01 4:05`.
fn local_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M").ok()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentCard {
    pub place: String,
    /// `Wednesday, 14:00`, or the raw provider string if unparseable.
    pub local_time: String,
    pub temp_c: f64,
    pub condition: String,
    pub humidity: f64,
}

impl CurrentCard {
    pub fn from_snapshot(snapshot: &WeatherSnapshot) -> Self {
        let loc = &snapshot.location;
        let local_time = local_time(&loc.localtime)
            .map(|t| t.format("%A, %H:%M").to_string())
            .unwrap_or_else(|| loc.localtime.clone());

        Self {
            place: format!("{}, {}, {}", loc.name, loc.region, loc.country),
            local_time,
            temp_c: snapshot.current.temp_c,
            condition: snapshot.current.condition.text.clone(),
            humidity: snapshot.current.humidity,
        }
    }
}

impl fmt::Display for CurrentCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.place)?;
        writeln!(f, "{}", self.local_time)?;
        writeln!(f, "{}°C  {}", self.temp_c, self.condition)?;
        write!(f, "Humidity - {}%", self.humidity)
    }
}

/// One row of the weekly strip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayRow {
    /// Short weekday, e.g. `Wed`.
    pub weekday: String,
    pub min_c: f64,
    pub max_c: f64,
    pub condition: String,
}

impl DayRow {
    fn from_day(day: &ForecastDay) -> Self {
        let weekday = parse_day(&day.date)
            .map(|d| d.format("%a").to_string())
            .unwrap_or_else(|_| day.date.clone());

        Self {
            weekday,
            min_c: round_half_up(day.day.mintemp_c),
            max_c: round_half_up(day.day.maxtemp_c),
            condition: day.day.condition.text.clone(),
        }
    }
}

impl fmt::Display for DayRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<4} {}°C - {}°C  {}", self.weekday, self.min_c, self.max_c, self.condition)
    }
}

pub fn weekly(snapshot: &WeatherSnapshot) -> Vec<DayRow> {
    snapshot.forecast_days().iter().map(DayRow::from_day).collect()
}

/// One slot of the hourly strip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourRow {
    /// `HH:mm`
    pub time: String,
    pub temp_c: f64,
    pub condition: String,
}

impl fmt::Display for HourRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}°C  {}", self.time, self.temp_c, self.condition)
    }
}

/// Up to [`HOURLY_SLOTS`] hours of the first forecast day starting at
/// `from_hour`. Hours past midnight are not carried over.
pub fn hourly(snapshot: &WeatherSnapshot, from_hour: usize) -> Vec<HourRow> {
    let Some(today) = snapshot.forecast_days().first() else {
        return Vec::new();
    };

    today
        .hour
        .iter()
        .skip(from_hour)
        .take(HOURLY_SLOTS)
        .map(|h| HourRow {
            time: local_time(&h.time)
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_else(|| h.time.clone()),
            temp_c: round_half_up(h.temp_c),
            condition: h.condition.text.clone(),
        })
        .collect()
}

/// Hourly strip from the location's current local hour.
pub fn hourly_from_now(snapshot: &WeatherSnapshot) -> Vec<HourRow> {
    let hour = local_time(&snapshot.location.localtime).map_or(0, |t| t.hour() as usize);
    hourly(snapshot, hour)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HumidityLevel {
    Low,
    Normal,
    High,
}

impl HumidityLevel {
    pub fn classify(humidity: f64) -> Self {
        if humidity < 30.0 {
            HumidityLevel::Low
        } else if humidity > 70.0 {
            HumidityLevel::High
        } else {
            HumidityLevel::Normal
        }
    }
}

impl fmt::Display for HumidityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HumidityLevel::Low => "Low",
            HumidityLevel::Normal => "Normal",
            HumidityLevel::High => "High",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlights {
    pub uv: f64,
    pub wind_kph: f64,
    /// `None` until the astronomy request has resolved.
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub humidity: f64,
    pub vis_km: f64,
    pub us_epa_index: Option<f64>,
}

impl Highlights {
    pub fn new(current: &CurrentConditions, astro: Option<&AstroSnapshot>) -> Self {
        Self {
            uv: current.uv,
            wind_kph: current.wind_kph,
            sunrise: astro.map(|a| a.sunrise.clone()),
            sunset: astro.map(|a| a.sunset.clone()),
            humidity: current.humidity,
            vis_km: current.vis_km,
            us_epa_index: current.air_quality.as_ref().map(|aq| aq.us_epa_index),
        }
    }

    pub fn humidity_level(&self) -> HumidityLevel {
        HumidityLevel::classify(self.humidity)
    }

    pub fn air_quality_label(&self) -> String {
        self.us_epa_index.map_or_else(|| "N/A".to_string(), |i| i.to_string())
    }

    pub fn air_quality_status(&self) -> &'static str {
        match self.us_epa_index {
            Some(i) if i > 3.0 => "Unhealthy",
            _ => "Good",
        }
    }
}

impl fmt::Display for Highlights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "UV Index      {}", self.uv)?;
        writeln!(f, "Wind Status   {} km/h", self.wind_kph)?;
        writeln!(f, "Sunrise       {}", self.sunrise.as_deref().unwrap_or(PENDING))?;
        writeln!(f, "Sunset        {}", self.sunset.as_deref().unwrap_or(PENDING))?;
        writeln!(f, "Humidity      {}% ({})", self.humidity, self.humidity_level())?;
        writeln!(f, "Visibility    {} km", self.vis_km)?;
        write!(f, "Air Quality   {} ({})", self.air_quality_label(), self.air_quality_status())
    }
}
