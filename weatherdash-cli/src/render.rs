//! Terminal output for views, charts and prediction results.

use weatherdash_core::{
    DashboardError, DateRange, PredictionResult,
    prediction::RainOutcome,
    views::{DayRow, HourRow},
    visualize::{ClusterSlice, RainProbabilityPoint, TemperaturePoint},
};

const BAR_WIDTH: f64 = 40.0;

/// A view that could not load; the rest of the output carries on.
pub fn failed(what: &str, err: &DashboardError) {
    tracing::warn!(error = %err, "{what} unavailable");
    eprintln!("Failed to load {what}: {err}");
}

pub fn heading(title: &str) {
    println!();
    println!("{title}");
    println!("{}", "-".repeat(title.chars().count()));
}

pub fn weekly(rows: &[DayRow]) {
    heading("This week");
    for row in rows {
        println!("{row}");
    }
}

pub fn hourly(rows: &[HourRow]) {
    heading("Today");
    if rows.is_empty() {
        println!("No hourly data left for today.");
    }
    for row in rows {
        println!("{row}");
    }
}

fn bar(fraction: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let len = (fraction.clamp(0.0, 1.0) * BAR_WIDTH).round() as usize;
    "█".repeat(len)
}

pub fn temperature_chart(title: &str, points: &[TemperaturePoint]) {
    heading(title);
    if points.is_empty() {
        println!("No data for this range.");
        return;
    }

    let min = points.iter().map(|p| p.temperature).fold(f64::INFINITY, f64::min);
    let max = points.iter().map(|p| p.temperature).fold(f64::NEG_INFINITY, f64::max);
    let span = (max - min).max(f64::EPSILON);

    for p in points {
        // Keep a visible stub for the minimum.
        let fraction = 0.05 + 0.95 * (p.temperature - min) / span;
        println!("{}  {:>6.1}°C  {}", p.date, p.temperature, bar(fraction));
    }
}

pub fn rain_chart(range: &DateRange, points: &[RainProbabilityPoint]) {
    heading(&format!("Rain probability, {range}"));
    if points.is_empty() {
        println!("No data for this range.");
        return;
    }
    for p in points {
        println!("{}  {:>5.1}%  {}", p.date, p.probability * 100.0, bar(p.probability));
    }
}

pub fn cluster_chart(range: &DateRange, slices: &[ClusterSlice]) {
    heading(&format!("Weather patterns, {range}"));
    if slices.is_empty() {
        println!("No data for this range.");
        return;
    }
    for s in slices {
        println!(
            "{:<18} {:>4} days  {:>3.0}%  {}",
            s.label(),
            s.count,
            s.percent,
            bar(s.percent / 100.0)
        );
    }
}

pub fn prediction(result: &PredictionResult) {
    match result {
        PredictionResult::Temperature(t) => {
            println!("Predicted temperature for tomorrow: {t:.2}°C");
        }
        PredictionResult::Rain(RainOutcome::Probability(p)) => {
            println!("Rain prediction: {} ({:.0}%)", result, p * 100.0);
        }
        PredictionResult::Rain(RainOutcome::Label(_)) => println!("Rain prediction: {result}"),
        PredictionResult::WeatherType(cluster) => println!("Predicted weather type: {cluster}"),
    }
}

pub fn field_errors(err: &DashboardError) {
    for e in err.field_errors() {
        eprintln!("  {}: {}", e.field, e.message);
    }
}
