//! Core library for the `weatherdash` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather provider response contract, URL builder and client
//! - The prediction/visualization backend client
//! - A keyed stale-while-revalidate request cache
//! - Prediction forms with bounds, auto-fill and submit
//! - Chart queries and terminal view models
//!
//! It is used by `weatherdash-cli`, but can also be reused by other binaries or services.

pub mod backend;
pub mod cache;
pub mod config;
pub mod contract;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod prediction;
pub mod provider;
pub mod validation;
pub mod views;
pub mod visualize;

pub use backend::BackendClient;
pub use cache::{FetchCache, FetchState, Mutation};
pub use config::Config;
pub use dashboard::Dashboard;
pub use error::{DashboardError, FieldError};
pub use model::{DateRange, HistoryWindow, Location};
pub use prediction::{
    FormInput, FormPhase, PredictionForm, PredictionKind, PredictionResult, PredictionService,
};
pub use provider::{SnapshotSource, WeatherProvider};
