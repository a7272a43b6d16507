//! Visualization queries: typed chart series, date-range clipping and the
//! cluster distribution.
//!
//! Every chart is filtered the same way: the server is asked for the
//! selected [`DateRange`] and the returned series is clipped to it again,
//! so a chart never shows points outside the selection whatever the backend
//! sends back.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    error::Result,
    model::{DateRange, Location},
    prediction::WeatherCluster,
};

/// Anything plotted against a calendar date.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperaturePoint {
    #[serde(deserialize_with = "lenient_date")]
    pub date: NaiveDate,
    pub temperature: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RainProbabilityPoint {
    pub date: NaiveDate,
    pub probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClusterPoint {
    pub date: NaiveDate,
    pub cluster: WeatherCluster,
}

impl Dated for TemperaturePoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for RainProbabilityPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for ClusterPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Keep only points inside `range`, sorted by date.
pub fn clip<T: Dated + Clone>(points: &[T], range: &DateRange) -> Vec<T> {
    let mut kept: Vec<T> = points.iter().filter(|p| range.contains(p.date())).cloned().collect();
    kept.sort_by_key(|p| p.date());
    kept
}

pub fn rain_series(by_date: &BTreeMap<NaiveDate, f64>) -> Vec<RainProbabilityPoint> {
    by_date.iter().map(|(&date, &probability)| RainProbabilityPoint { date, probability }).collect()
}

pub fn cluster_series(by_date: &BTreeMap<NaiveDate, WeatherCluster>) -> Vec<ClusterPoint> {
    by_date.iter().map(|(&date, &cluster)| ClusterPoint { date, cluster }).collect()
}

/// One pie slice of the weather-pattern distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClusterSlice {
    pub cluster: WeatherCluster,
    pub count: usize,
    /// Share of all points, 0-100.
    pub percent: f64,
}

impl ClusterSlice {
    pub fn label(&self) -> &'static str {
        self.cluster.label()
    }
}

/// Count points per cluster, in ascending cluster id order. Clusters that
/// do not occur get no slice.
pub fn cluster_distribution(points: &[ClusterPoint]) -> Vec<ClusterSlice> {
    let mut counts: BTreeMap<WeatherCluster, usize> = BTreeMap::new();
    for p in points {
        *counts.entry(p.cluster).or_default() += 1;
    }

    let total = points.len();
    counts
        .into_iter()
        .map(|(cluster, count)| ClusterSlice { cluster, count, percent: percent(count, total) })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn percent(count: usize, total: usize) -> f64 {
    if total == 0 { 0.0 } else { count as f64 * 100.0 / total as f64 }
}

/// Date the i-th next-week prediction with `today + i`.
pub fn next_week_series(today: NaiveDate, predictions: &[f64]) -> Vec<TemperaturePoint> {
    predictions
        .iter()
        .enumerate()
        .filter_map(|(i, &temperature)| {
            let date = today.checked_add_days(Days::new(i as u64))?;
            Some(TemperaturePoint { date, temperature })
        })
        .collect()
}

/// Which series the temperature chart shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemperatureQuery {
    History(DateRange),
    /// Model output for the week starting at `from`, computed from the
    /// provider forecast for `location`. Not clipped to any range.
    NextWeek { location: Location, from: NaiveDate },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chart {
    Temperature,
    Rain,
    Cluster,
}

impl Chart {
    /// Range a chart opens with.
    pub fn default_range(&self) -> Result<DateRange> {
        let (from, to) = match self {
            Chart::Temperature | Chart::Rain => ((2017, 6, 17), (2017, 6, 25)),
            Chart::Cluster => ((2017, 3, 1), (2017, 6, 25)),
        };
        DateRange::new(ymd(from), ymd(to))
    }
}

fn ymd((y, m, d): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

/// Accept `YYYY-MM-DD` optionally followed by a time part.
pub(crate) fn lenient_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_day(&raw).map_err(serde::de::Error::custom)
}

pub(crate) fn parse_day(raw: &str) -> std::result::Result<NaiveDate, String> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| format!("invalid date '{raw}': {e}"))
}
