use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use weatherdash_core::{
    Config, Dashboard, DateRange, Location, PredictionKind,
    prediction::{RainInput, TemperatureInput, WeatherTypeInput},
    views::{self, CurrentCard},
    visualize::{Chart, TemperatureQuery},
};

use crate::{
    configure,
    predict::{self, PredictOptions},
    render,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weatherdash",
    version,
    about = "Weather dashboard: conditions, forecasts, predictions and charts"
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the weather API key, prediction backend and default location.
    Configure,

    /// Show current conditions and today's highlights.
    Now {
        /// Location name; defaults to the configured one.
        #[arg(long)]
        location: Option<String>,
    },

    /// Show the multi-day forecast.
    Forecast {
        #[arg(long)]
        location: Option<String>,

        /// Number of forecast days; defaults to `forecast_days` from config.
        #[arg(long)]
        days: Option<u8>,

        /// Also show the next hours of today.
        #[arg(long)]
        hourly: bool,
    },

    /// Fill in and submit a prediction form.
    Predict {
        /// temperature, rain or weather-type
        #[arg(value_parser = parse_kind)]
        kind: PredictionKind,

        /// Pre-fill the form from current conditions.
        #[arg(long)]
        auto_fill: bool,

        /// Set a field, e.g. `--set humidity=55`. May be repeated.
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = predict::parse_assignment)]
        set: Vec<(String, String)>,

        /// Submit without prompting.
        #[arg(long)]
        no_input: bool,

        /// Location used by auto-fill.
        #[arg(long)]
        location: Option<String>,
    },

    /// Show a chart over historical data.
    Chart {
        #[arg(value_enum)]
        chart: ChartArg,

        /// First day (YYYY-MM-DD).
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day (YYYY-MM-DD).
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Temperature chart only: predicted temperatures for the coming week.
        #[arg(long)]
        predict: bool,

        /// Shrink or grow the range by two days around its midpoint.
        #[arg(long, value_enum)]
        zoom: Option<Zoom>,

        /// Location for `--predict`.
        #[arg(long)]
        location: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChartArg {
    Temperature,
    Rain,
    Cluster,
}

impl From<ChartArg> for Chart {
    fn from(arg: ChartArg) -> Self {
        match arg {
            ChartArg::Temperature => Chart::Temperature,
            ChartArg::Rain => Chart::Rain,
            ChartArg::Cluster => Chart::Cluster,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Zoom {
    In,
    Out,
}

fn parse_kind(raw: &str) -> Result<PredictionKind, String> {
    PredictionKind::try_from(raw).map_err(|e| e.to_string())
}

fn resolve_location(config: &Config, flag: Option<String>) -> Result<Location> {
    match flag {
        Some(name) => Ok(Location::new(name)?),
        None => config.default_location(),
    }
}

/// Range from `--from`/`--to`, filling gaps from the chart's default range.
fn selected_range(
    chart: Chart,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<DateRange> {
    let default = chart.default_range()?;
    Ok(DateRange::new(from.unwrap_or(default.from), to.unwrap_or(default.to))?)
}

/// Day the astronomy lookup is made for: the UTC calendar date of `now`.
fn astronomy_day<Tz: TimeZone>(now: &DateTime<Tz>) -> NaiveDate {
    now.with_timezone(&Utc).date_naive()
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure::run(),
            command => {
                let config = Config::load().context("Failed to load configuration")?;
                execute(command, &config).await
            }
        }
    }
}

async fn execute(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Configure => configure::run()?,

        Command::Now { location } => {
            let location = resolve_location(config, location)?;
            let dashboard = Dashboard::from_config(config)?;

            let today = astronomy_day(&Utc::now());
            let (current, highlights) =
                tokio::join!(dashboard.current(&location), dashboard.highlights(&location, today));

            match current {
                Ok(snapshot) => println!("{}", CurrentCard::from_snapshot(&snapshot)),
                Err(err) => render::failed("current weather", &err),
            }
            match highlights {
                Ok(h) => {
                    render::heading("Today's highlights");
                    println!("{h}");
                }
                Err(err) => render::failed("highlights", &err),
            }
        }

        Command::Forecast { location, days, hourly } => {
            let location = resolve_location(config, location)?;
            let dashboard = Dashboard::from_config(config)?;

            match dashboard.forecast(&location, days).await {
                Ok(snapshot) => {
                    render::weekly(&views::weekly(&snapshot));
                    if hourly {
                        render::hourly(&views::hourly_from_now(&snapshot));
                    }
                }
                Err(err) => render::failed("forecast", &err),
            }
        }

        Command::Predict { kind, auto_fill, set, no_input, location } => {
            let opts = PredictOptions {
                location: resolve_location(config, location)?,
                auto_fill,
                assignments: set,
                interactive: !no_input,
            };
            match kind {
                PredictionKind::Temperature => {
                    predict::run::<TemperatureInput>(config, opts).await?;
                }
                PredictionKind::Rain => predict::run::<RainInput>(config, opts).await?,
                PredictionKind::WeatherType => {
                    predict::run::<WeatherTypeInput>(config, opts).await?;
                }
            }
        }

        Command::Chart { chart, from, to, predict, zoom, location } => {
            let dashboard = Dashboard::from_config(config)?;
            let chart = Chart::from(chart);
            let mut range = selected_range(chart, from, to)?;
            if let Some(zoom) = zoom {
                range = range.zoom(zoom == Zoom::In, dashboard.history());
            }

            match chart {
                Chart::Temperature if predict => {
                    let location = resolve_location(config, location)?;
                    let from = Local::now().date_naive();
                    let query = TemperatureQuery::NextWeek { location, from };
                    match dashboard.temperature_chart(query).await {
                        Ok(points) => {
                            let title = "Predicted temperature, next 7 days";
                            render::temperature_chart(title, &points);
                        }
                        Err(err) => render::failed("temperature predictions", &err),
                    }
                }
                Chart::Temperature => {
                    let query = TemperatureQuery::History(range);
                    match dashboard.temperature_chart(query).await {
                        Ok(points) => {
                            render::temperature_chart(&format!("Temperature, {range}"), &points);
                        }
                        Err(err) => render::failed("temperature data", &err),
                    }
                }
                Chart::Rain => match dashboard.rain_chart(range).await {
                    Ok(points) => render::rain_chart(&range, &points),
                    Err(err) => render::failed("rain probabilities", &err),
                },
                Chart::Cluster => match dashboard.cluster_chart(range).await {
                    Ok(slices) => render::cluster_chart(&range, &slices),
                    Err(err) => render::failed("weather patterns", &err),
                },
            }
        }
    }

    Ok(())
}
