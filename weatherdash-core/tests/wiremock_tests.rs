//! Integration tests for the HTTP clients
//!
//! Tests cover:
//! - WeatherAPI.com provider against a mock server
//! - Prediction and visualization backend endpoints
//! - Dashboard request sharing and graceful degradation

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use weatherdash_core::{
    BackendClient, Dashboard, DashboardError, DateRange, HistoryWindow, Location, PredictionForm,
    PredictionKind, PredictionResult, PredictionService, WeatherProvider,
    contract::ForecastDay,
    prediction::{RainOutcome, TemperatureInput, WeatherCluster},
    provider::{urls::QueryUrls, weatherapi::WeatherApiProvider},
    visualize::TemperatureQuery,
};

const CURRENT: &str = include_str!("fixtures/current_melbourne.json");
const ASTRONOMY: &str = include_str!("fixtures/astronomy_melbourne.json");
const SUNNY_ICON: &str = "//cdn.weatherapi.com/weather/64x64/day/113.png";

// ============================================================================
// Helpers
// ============================================================================

fn melbourne() -> Location {
    Location::new("Melbourne").unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn range(from: &str, to: &str) -> DateRange {
    DateRange::new(date(from), date(to)).unwrap()
}

fn provider(server: &MockServer) -> WeatherApiProvider {
    WeatherApiProvider::new(QueryUrls::new(server.uri(), "TESTKEY"))
}

fn backend(server: &MockServer) -> BackendClient {
    BackendClient::new(server.uri(), None).unwrap()
}

fn forecast_day(day: &str, avg: f64) -> ForecastDay {
    serde_json::from_value(json!({
        "date": day, "date_epoch": 1_714_521_600,
        "day": {
            "maxtemp_c": avg + 4.0, "maxtemp_f": 64.4, "mintemp_c": avg - 4.0, "mintemp_f": 50.0,
            "avgtemp_c": avg, "avgtemp_f": 57.2, "maxwind_mph": 12.0, "maxwind_kph": 19.3,
            "totalprecip_mm": 0.4, "totalprecip_in": 0.02, "totalsnow_cm": 0.0,
            "avgvis_km": 10.0, "avgvis_miles": 6.0, "avghumidity": 68.0,
            "daily_will_it_rain": 0, "daily_chance_of_rain": 20.0,
            "daily_will_it_snow": 0, "daily_chance_of_snow": 0.0,
            "condition": {"text": "Sunny", "icon": SUNNY_ICON, "code": 1000},
            "uv": 3.0
        },
        "astro": {
            "sunrise": "07:08 AM", "sunset": "05:38 PM", "moonrise": "12:51 AM",
            "moonset": "01:58 PM", "moon_phase": "Waxing Gibbous",
            "moon_illumination": 81.0, "is_moon_up": 0, "is_sun_up": 1
        },
        "hour": []
    }))
    .unwrap()
}

/// A full 24-hour forecast day as the provider sends it.
fn forecast_day_json(day: &str, date_epoch: i64, avg: f64) -> Value {
    let hours: Vec<Value> = (0..24)
        .map(|i| {
            json!({
                "time_epoch": date_epoch + i * 3600, "time": format!("{day} {i:02}:00"),
                "temp_c": avg, "temp_f": 57.2, "is_day": 1,
                "condition": {"text": "Sunny", "icon": SUNNY_ICON, "code": 1000},
                "wind_mph": 5.6, "wind_kph": 9.0, "wind_degree": 200.0, "wind_dir": "SSW",
                "pressure_mb": 1016.0, "pressure_in": 30.0, "precip_mm": 0.0, "precip_in": 0.0,
                "snow_cm": 0.0, "humidity": 70.0, "cloud": 10.0,
                "feelslike_c": avg, "feelslike_f": 57.2, "windchill_c": avg, "windchill_f": 57.2,
                "heatindex_c": avg, "heatindex_f": 57.2, "dewpoint_c": 6.0, "dewpoint_f": 42.8,
                "will_it_rain": 0, "chance_of_rain": 0.0, "will_it_snow": 0, "chance_of_snow": 0.0,
                "vis_km": 10.0, "vis_miles": 6.0, "gust_mph": 9.0, "gust_kph": 14.4, "uv": 0.0
            })
        })
        .collect();

    let mut value = serde_json::to_value(forecast_day(day, avg)).unwrap();
    value["date_epoch"] = json!(date_epoch);
    value["hour"] = Value::Array(hours);
    value
}

/// Current-conditions body extended with `days` forecast days from 2024-05-01.
fn forecast_body(days: i64) -> Value {
    let mut value: Value = serde_json::from_str(CURRENT).unwrap();
    let forecastday: Vec<Value> = (0..days)
        .map(|i| {
            let day = format!("2024-05-{:02}", i + 1);
            forecast_day_json(&day, 1_714_521_600 + i * 86_400, 14.0 + i as f64)
        })
        .collect();
    value["forecast"] = json!({ "forecastday": forecastday });
    value
}

// ============================================================================
// Weather Provider Tests
// ============================================================================

mod provider_tests {
    use super::*;

    #[tokio::test]
    async fn current_sends_key_location_and_air_quality() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current.json"))
            .and(query_param("key", "TESTKEY"))
            .and(query_param("q", "Melbourne"))
            .and(query_param("aqi", "yes"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CURRENT))
            .expect(1)
            .mount(&server)
            .await;

        let snapshot = provider(&server).current(&melbourne()).await.unwrap();
        assert_eq!(snapshot.location.name, "Melbourne");
        assert_eq!(snapshot.current.humidity, 55.0);
        assert!(snapshot.forecast.is_none());
    }

    #[tokio::test]
    async fn astronomy_sends_the_date() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/astronomy.json"))
            .and(query_param("dt", "2024-05-01"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ASTRONOMY))
            .mount(&server)
            .await;

        let astro = provider(&server).astronomy(&melbourne(), date("2024-05-01")).await.unwrap();
        assert_eq!(astro.sunrise, "07:08 AM");
        assert_eq!(astro.moon_phase, "Waxing Gibbous");
    }

    #[tokio::test]
    async fn error_status_is_a_network_failure_with_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({
                    "error": {"code": 2008, "message": "API key has been disabled."}
                })),
            )
            .mount(&server)
            .await;

        let err = provider(&server).current(&melbourne()).await.unwrap_err();
        match err {
            DashboardError::NetworkFailure(msg) => {
                assert!(msg.contains("403"));
                assert!(msg.contains("API key has been disabled."));
            }
            other => panic!("expected NetworkFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_a_schema_violation() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"location": {"name": "Melbourne"}})),
            )
            .mount(&server)
            .await;

        let err = provider(&server).current(&melbourne()).await.unwrap_err();
        assert!(matches!(err, DashboardError::SchemaViolation(_)));
    }
}

// ============================================================================
// Backend Client Tests
// ============================================================================

mod backend_tests {
    use super::*;

    #[tokio::test]
    async fn temperature_prediction_is_extracted() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/predict/temperature"))
            .and(body_partial_json(json!({"humidity": 55.0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"prediction": 21.5})))
            .mount(&server)
            .await;

        let result = backend(&server)
            .predict(PredictionKind::Temperature, json!({"humidity": 55.0}))
            .await
            .unwrap();
        assert_eq!(result, PredictionResult::Temperature(21.5));
    }

    #[tokio::test]
    async fn rain_label_is_accepted() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/predict/rain"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"prediction": "Yes"})))
            .mount(&server)
            .await;

        let result = backend(&server).predict(PredictionKind::Rain, json!({})).await.unwrap();
        assert_eq!(result, PredictionResult::Rain(RainOutcome::Label(true)));
    }

    #[tokio::test]
    async fn error_status_rejects_prediction() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/predict/weather-type"))
            .respond_with(ResponseTemplate::new(422).set_body_string("value error"))
            .mount(&server)
            .await;

        let err = backend(&server)
            .predict(PredictionKind::WeatherType, json!({}))
            .await
            .unwrap_err();
        match err {
            DashboardError::PredictionRejected { status, body } => {
                assert_eq!(status, 422);
                assert_eq!(body, "value error");
            }
            other => panic!("expected PredictionRejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn temperature_history_accepts_timestamp_dates() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/visualize/temperature"))
            .and(query_param("start_date", "2017-06-17"))
            .and(query_param("end_date", "2017-06-18"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chart_data": {"temperature_data": [
                    {"date": "2017-06-17T00:00:00", "temperature": 9.5},
                    {"date": "2017-06-18", "temperature": 11.0}
                ]}
            })))
            .mount(&server)
            .await;

        let points = backend(&server)
            .temperature_history(range("2017-06-17", "2017-06-18"))
            .await
            .unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, date("2017-06-17"));
        assert_eq!(points[1].temperature, 11.0);
    }

    #[tokio::test]
    async fn empty_rain_range_is_an_empty_series() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/visualize/rain"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"detail": "No data found"})),
            )
            .mount(&server)
            .await;

        let by_date = backend(&server)
            .rain_probabilities(range("2017-06-17", "2017-06-25"))
            .await
            .unwrap();
        assert!(by_date.is_empty());
    }

    #[tokio::test]
    async fn cluster_ids_are_decoded() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/visualize/cluster"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cluster_by_date": {"2017-03-01": 0, "2017-03-02": 2}
            })))
            .mount(&server)
            .await;

        let by_date = backend(&server)
            .cluster_assignments(range("2017-03-01", "2017-03-02"))
            .await
            .unwrap();
        assert_eq!(by_date[&date("2017-03-01")], WeatherCluster::HotAndDry);
        assert_eq!(by_date[&date("2017-03-02")], WeatherCluster::CoolAndHumid);
    }

    #[tokio::test]
    async fn server_error_on_visualization_is_a_network_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/visualize/cluster"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = backend(&server)
            .cluster_assignments(range("2017-03-01", "2017-03-02"))
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::NetworkFailure(_)));
    }

    #[tokio::test]
    async fn next_week_sends_day_summaries() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/predict/next-week"))
            .and(body_partial_json(json!({"forecast_days": [{"day": {"avgtemp_c": 14.0}}]})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"predictions": [14.2, 15.1]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let days = vec![forecast_day("2024-05-01", 14.0), forecast_day("2024-05-02", 15.0)];
        let predictions = backend(&server).predict_next_week(&days).await.unwrap();
        assert_eq!(predictions, vec![14.2, 15.1]);
    }
}

// ============================================================================
// Dashboard Tests
// ============================================================================

mod dashboard_tests {
    use super::*;

    fn dashboard(weather: &MockServer, backend_server: &MockServer) -> Dashboard {
        Dashboard::new(
            Arc::new(provider(weather)),
            Some(backend(backend_server)),
            HistoryWindow::default(),
            7,
        )
    }

    #[tokio::test]
    async fn concurrent_chart_queries_share_one_request() {
        let weather = MockServer::start().await;
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/visualize/rain"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "probability_by_date": {"2017-06-16": 0.9, "2017-06-17": 0.3, "2017-06-18": 0.6}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dashboard = dashboard(&weather, &server);
        let selected = range("2017-06-17", "2017-06-18");
        let (a, b) = tokio::join!(dashboard.rain_chart(selected), dashboard.rain_chart(selected));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert!(Arc::ptr_eq(&a, &b));
        // The day before the range is clipped away.
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].date, date("2017-06-17"));
    }

    #[tokio::test]
    async fn highlights_survive_an_astronomy_failure() {
        let weather = MockServer::start().await;
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CURRENT))
            .mount(&weather)
            .await;
        Mock::given(method("GET"))
            .and(path("/astronomy.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&weather)
            .await;

        let highlights = dashboard(&weather, &server)
            .highlights(&melbourne(), date("2024-05-01"))
            .await
            .unwrap();
        assert_eq!(highlights.air_quality_label(), "1");
        assert!(highlights.sunrise.is_none());
        assert_eq!(highlights.humidity, 55.0);
    }

    #[tokio::test]
    async fn next_week_chart_posts_the_forecast_once() {
        let weather = MockServer::start().await;
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast.json"))
            .and(query_param("q", "Melbourne"))
            .and(query_param("days", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(7)))
            .expect(1)
            .mount(&weather)
            .await;
        Mock::given(method("POST"))
            .and(path("/predict/next-week"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [14.1, 15.2, 16.3, 17.4, 18.5, 19.6, 20.7]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dashboard = dashboard(&weather, &server);
        let query = TemperatureQuery::NextWeek { location: melbourne(), from: date("2024-05-01") };
        let points = dashboard.temperature_chart(query.clone()).await.unwrap();
        // Served from cache; neither endpoint is hit again.
        let again = dashboard.temperature_chart(query).await.unwrap();
        assert!(Arc::ptr_eq(&points, &again));

        let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
        let expected: Vec<NaiveDate> = (1..=7).map(|d| date(&format!("2024-05-{d:02}"))).collect();
        assert_eq!(dates, expected);
        assert_eq!(points[6].temperature, 20.7);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body: Value = requests[0].body_json().unwrap();
        let days = body["forecast_days"].as_array().unwrap();
        assert_eq!(days.len(), 7);
        assert_eq!(days[0]["day"]["avgtemp_c"], 14.0);
        assert_eq!(days[6]["day"]["avgtemp_c"], 20.0);
    }

    #[tokio::test]
    async fn next_week_chart_without_forecast_days_is_not_posted() {
        let weather = MockServer::start().await;
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CURRENT))
            .mount(&weather)
            .await;
        Mock::given(method("POST"))
            .and(path("/predict/next-week"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"predictions": []})))
            .expect(0)
            .mount(&server)
            .await;

        let query = TemperatureQuery::NextWeek { location: melbourne(), from: date("2024-05-01") };
        let err = dashboard(&weather, &server).temperature_chart(query).await.unwrap_err();
        assert!(matches!(err, DashboardError::SchemaViolation(_)));
    }

    #[tokio::test]
    async fn auto_filled_form_submits_current_readings() {
        let weather = MockServer::start().await;
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CURRENT))
            .expect(1)
            .mount(&weather)
            .await;
        Mock::given(method("POST"))
            .and(path("/predict/temperature"))
            .and(body_partial_json(json!({
                "sealevelpressure": 1015.0, "evaporation": 2.0, "humidity": 55.0,
                "dew": 10.0, "temp": 18.0
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"prediction": 19.25})))
            .expect(1)
            .mount(&server)
            .await;

        let dashboard = dashboard(&weather, &server);
        // Card already loaded; auto-fill reuses it.
        dashboard.current(&melbourne()).await.unwrap();

        let form: PredictionForm<TemperatureInput> = PredictionForm::new();
        form.open();
        form.auto_fill(&dashboard, &melbourne()).await.unwrap();

        let result = form.submit(dashboard.backend().unwrap()).await.unwrap();
        assert_eq!(result, PredictionResult::Temperature(19.25));
    }
}
