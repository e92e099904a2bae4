/// Route tests for the JSON API
///
/// These tests drive the full axum router over an in-memory dataset, so
/// they need no database:
/// 1. Index listing
/// 2. Precipitation and station listings
/// 3. One-year temperature window
/// 4. Per-date temperature statistics (start and start/end)
/// 5. Idempotence and failure mapping
///
/// Run with: cargo test --test api_routes

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use climate_service::api::{AppState, router};
use climate_service::memory_store::{Dataset, MemoryConnector};
use climate_service::model::{Measurement, Station, StoreError};
use climate_service::store::{ClimateStore, Connector};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn measurement(station: &str, date: &str, prcp: Option<f64>, tobs: i32) -> Measurement {
    Measurement {
        station: station.to_string(),
        date: date.to_string(),
        prcp,
        tobs,
    }
}

fn station(id: &str, name: &str) -> Station {
    Station { station: id.to_string(), name: name.to_string() }
}

fn sample_dataset() -> Dataset {
    Dataset {
        measurements: vec![
            measurement("USC00519397", "2016-08-22", Some(0.4), 74),
            measurement("USC00519397", "2016-08-23", Some(0.0), 81),
            measurement("USC00519281", "2016-08-23", Some(1.79), 77),
            measurement("USC00519397", "2017-01-01", None, 62),
            measurement("USC00519281", "2017-01-01", Some(0.29), 66),
            measurement("USC00513117", "2017-01-01", Some(0.0), 71),
            measurement("USC00519397", "2017-08-22", Some(0.0), 82),
            measurement("USC00519397", "2017-08-23", Some(0.0), 81),
            measurement("USC00519281", "2017-08-23", Some(0.08), 76),
        ],
        stations: vec![
            station("USC00519397", "WAIKIKI 717.2, HI US"),
            station("USC00513117", "KANEOHE 838.1, HI US"),
            station("USC00519281", "WAIHEE 837.5, HI US"),
        ],
    }
}

fn app(dataset: Dataset) -> Router {
    router(AppState::new(MemoryConnector::new(dataset)))
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn get_json(app: Router, uri: &str) -> Value {
    let (status, body) = get(app, uri).await;
    assert_eq!(status, StatusCode::OK, "GET {} failed: {}", uri, body);
    serde_json::from_str(&body).unwrap_or_else(|e| panic!("GET {} returned non-JSON: {}", uri, e))
}

fn stat_dates(stats: &Value) -> Vec<String> {
    stats
        .as_array()
        .expect("stats should be an array")
        .iter()
        .map(|s| s["Date"].as_str().unwrap().to_string())
        .collect()
}

fn keyed_dates(rows: &Value) -> Vec<String> {
    rows.as_array()
        .expect("rows should be an array")
        .iter()
        .map(|row| {
            let obj = row.as_object().unwrap();
            assert_eq!(obj.len(), 1, "each row should be a single-key object");
            obj.keys().next().unwrap().clone()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// 1. Index
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_index_lists_available_routes() {
    let response = app(sample_dataset())
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"), "got {}", content_type);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(body.starts_with("Available Routes:<br/>"));
    assert!(body.contains("/api/v1.0/&lt;start&gt;/&lt;end&gt;"));
}

// ---------------------------------------------------------------------------
// 2. Listings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_precipitation_matches_documented_example() {
    let dataset = Dataset {
        measurements: vec![
            measurement("USC00519397", "2017-08-23", Some(0.02), 76),
            measurement("USC00519397", "2017-08-22", Some(0.0), 77),
        ],
        stations: Vec::new(),
    };

    let json = get_json(app(dataset), "/api/v1.0/precipitation").await;
    assert_eq!(json, json!([{"2017-08-22": 0.0}, {"2017-08-23": 0.02}]));
}

#[tokio::test]
async fn test_precipitation_lists_every_row_in_date_order() {
    let json = get_json(app(sample_dataset()), "/api/v1.0/precipitation").await;
    let dates = keyed_dates(&json);

    assert_eq!(dates.len(), 9, "one entry per measurement row, duplicates included");
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);

    // Missing precipitation is reported as null, not dropped.
    assert!(json.as_array().unwrap().iter().any(|row| row["2017-01-01"].is_null()
        && row.as_object().unwrap().contains_key("2017-01-01")));
}

#[tokio::test]
async fn test_stations_maps_id_to_name() {
    let json = get_json(app(sample_dataset()), "/api/v1.0/stations").await;
    assert_eq!(
        json,
        json!({
            "USC00513117": "KANEOHE 838.1, HI US",
            "USC00519281": "WAIHEE 837.5, HI US",
            "USC00519397": "WAIKIKI 717.2, HI US",
        })
    );
}

#[tokio::test]
async fn test_stations_has_one_entry_per_distinct_id() {
    let mut dataset = sample_dataset();
    dataset.stations.push(station("USC00519397", "WAIKIKI (duplicate row)"));

    let json = get_json(app(dataset), "/api/v1.0/stations").await;
    let map = json.as_object().unwrap();
    assert_eq!(map.len(), 3);
    assert_eq!(map["USC00519397"], "WAIKIKI (duplicate row)", "later row wins");
}

// ---------------------------------------------------------------------------
// 3. One-year temperature window
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_tobs_covers_365_days_before_latest_date() {
    let json = get_json(app(sample_dataset()), "/api/v1.0/tobs").await;
    let dates = keyed_dates(&json);

    // Latest is 2017-08-23, so the window starts on 2016-08-23 inclusive.
    assert!(!dates.contains(&"2016-08-22".to_string()));
    assert_eq!(dates.first().map(String::as_str), Some("2016-08-23"));
    assert_eq!(dates.last().map(String::as_str), Some("2017-08-23"));
    assert_eq!(dates.len(), 8);
}

#[tokio::test]
async fn test_tobs_includes_every_station() {
    let json = get_json(app(sample_dataset()), "/api/v1.0/tobs").await;
    let values: Vec<i64> = json
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|row| row.get("2017-01-01").and_then(Value::as_i64))
        .collect();
    assert_eq!(values, vec![62, 66, 71]);
}

#[tokio::test]
async fn test_tobs_on_empty_dataset_is_empty_array() {
    let json = get_json(app(Dataset::default()), "/api/v1.0/tobs").await;
    assert_eq!(json, json!([]));
}

// ---------------------------------------------------------------------------
// 4. Temperature statistics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_stats_from_start_are_grouped_per_date() {
    let json = get_json(app(sample_dataset()), "/api/v1.0/2017-01-01").await;

    assert_eq!(stat_dates(&json), ["2017-01-01", "2017-08-22", "2017-08-23"]);
    assert_eq!(
        json[0],
        json!({"Date": "2017-01-01", "TMIN": 62, "TAVG": 66.33333333333333, "TMAX": 71})
    );
    assert_eq!(json[2], json!({"Date": "2017-08-23", "TMIN": 76, "TAVG": 78.5, "TMAX": 81}));
}

#[tokio::test]
async fn test_stats_range_is_subset_of_stats_from() {
    let from = get_json(app(sample_dataset()), "/api/v1.0/2016-08-23").await;
    let range = get_json(app(sample_dataset()), "/api/v1.0/2016-08-23/2017-08-22").await;

    let expected: Vec<Value> = from
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["Date"].as_str().unwrap() <= "2017-08-22")
        .cloned()
        .collect();
    assert_eq!(range, Value::Array(expected));
    assert_eq!(stat_dates(&range), ["2016-08-23", "2017-01-01", "2017-08-22"]);
}

#[tokio::test]
async fn test_stats_range_with_single_day() {
    let json = get_json(app(sample_dataset()), "/api/v1.0/2016-08-23/2016-08-23").await;
    assert_eq!(json, json!([{"Date": "2016-08-23", "TMIN": 77, "TAVG": 79.0, "TMAX": 81}]));
}

#[tokio::test]
async fn test_malformed_start_returns_empty_array() {
    let json = get_json(app(sample_dataset()), "/api/v1.0/yesterday").await;
    assert_eq!(json, json!([]));
}

#[tokio::test]
async fn test_reversed_range_returns_empty_array() {
    let json = get_json(app(sample_dataset()), "/api/v1.0/2017-08-23/2016-08-23").await;
    assert_eq!(json, json!([]));
}

#[tokio::test]
async fn test_static_routes_win_over_start_parameter() {
    let json = get_json(app(sample_dataset()), "/api/v1.0/stations").await;
    assert!(json.is_object(), "/stations must not be treated as a start date");
}

// ---------------------------------------------------------------------------
// 5. Idempotence and failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_repeated_calls_return_identical_json() {
    let app = app(sample_dataset());
    for uri in [
        "/api/v1.0/precipitation",
        "/api/v1.0/stations",
        "/api/v1.0/tobs",
        "/api/v1.0/2017-01-01",
        "/api/v1.0/2016-01-01/2017-01-01",
    ] {
        let first = get(app.clone(), uri).await;
        let second = get(app.clone(), uri).await;
        assert_eq!(first, second, "GET {} should be idempotent", uri);
    }
}

/// A connector whose database is always unreachable.
struct BrokenConnector;

impl Connector for BrokenConnector {
    fn open(&self) -> Result<Box<dyn ClimateStore>, StoreError> {
        Err(StoreError::Schema("measurement does not exist".to_string()))
    }
}

#[tokio::test]
async fn test_store_failure_is_a_bare_server_error() {
    let app = router(AppState::new(BrokenConnector));
    let (status, body) = get(app, "/api/v1.0/precipitation").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("measurement"), "error details must not leak: {}", body);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (status, _) = get(app(sample_dataset()), "/api/v2.0/2017-01-01/2017-02-01/extra").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
