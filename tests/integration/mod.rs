//! End-to-end tests: import CSV fixtures into a scratch store, then query it
//! through the HTTP router.
//!
//! Run with: cargo test --test integration

mod cli;

use std::path::{Path, PathBuf};

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use county_health::api::{create_router, AppState};
use county_health::error::ImportError;
use county_health::import::import_csv;
use county_health::measures::AllowList;
use county_health::store::CountyStore;

const ZIP_COUNTY_CSV: &str = "\
zip,county_code,county_name
02138,25017,Middlesex County
02139,25017,Middlesex County
10001,36061,New York County
";

// Release years are deliberately out of order in the file.
const RANKINGS_CSV: &str = "\
State,County,fipscode,Measure_name,data_release_year,Raw_value
MA,Middlesex County,25017,Adult obesity,2014,0.21
MA,Middlesex County,25017,Adult obesity,2010,0.19
MA,Middlesex County,25017,Adult obesity,2012,0.20
MA,Middlesex County,25017,Unemployment,2011,0.071
MA,Middlesex County,25017,Unemployment,2013,0.064
NY,New York County,36061,Adult obesity,2010,0.15
";

struct Fixture {
    _dir: TempDir,
    store: PathBuf,
}

impl Fixture {
    async fn populated() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("data.db");

        for (name, content) in [
            ("zip_county.csv", ZIP_COUNTY_CSV),
            ("county_health_rankings.csv", RANKINGS_CSV),
        ] {
            let csv = dir.path().join(name);
            std::fs::write(&csv, content).unwrap();
            import_csv(&store, &csv).await.unwrap();
        }

        Self { _dir: dir, store }
    }

    fn app(&self) -> Router {
        create_router(AppState::new(
            CountyStore::new(&self.store),
            AllowList::default(),
        ))
    }
}

async fn post_json(app: Router, payload: Value) -> Response {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri("/county_data")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn years(rows: &Value) -> Vec<&str> {
    rows.as_array()
        .unwrap()
        .iter()
        .map(|row| row["data_release_year"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn teapot_returns_418_with_empty_body() {
    let fixture = Fixture::populated().await;

    let response = post_json(
        fixture.app(),
        json!({"coffee": "teapot", "zip": "02138", "measure_name": "Adult obesity"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn missing_fields_is_400() {
    let fixture = Fixture::populated().await;

    for payload in [json!({}), json!({"zip": "02138"}), json!({"measure_name": "Unemployment"})] {
        let response = post_json(fixture.app(), payload).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({
                "error": "Bad Request",
                "message": "zip and measure_name are required",
                "status": 400,
            })
        );
    }
}

#[tokio::test]
async fn non_json_content_type_is_400() {
    let fixture = Fixture::populated().await;

    let response = fixture
        .app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/county_data")
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        json!("content-type must be application/json")
    );
}

#[tokio::test]
async fn malformed_zip_is_400() {
    let fixture = Fixture::populated().await;

    for zip in ["abcde", "1234", "123456"] {
        let response = post_json(
            fixture.app(),
            json!({"zip": zip, "measure_name": "Adult obesity"}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], json!("zip must be 5 digits"));
    }
}

#[tokio::test]
async fn disallowed_measure_is_400() {
    let fixture = Fixture::populated().await;

    let response = post_json(
        fixture.app(),
        json!({"zip": "02138", "measure_name": "Not a real measure"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], json!("measure_name not allowed"));
}

#[tokio::test]
async fn allowed_measure_without_data_is_404() {
    let fixture = Fixture::populated().await;

    for payload in [
        json!({"zip": "99999", "measure_name": "Adult obesity"}),
        json!({"zip": "02138", "measure_name": "Uninsured"}),
    ] {
        let response = post_json(fixture.app(), payload).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({
                "error": "Not Found",
                "message": "no data found for zip/measure_name",
                "status": 404,
            })
        );
    }
}

#[tokio::test]
async fn adult_obesity_for_02138_is_ordered_by_release_year() {
    let fixture = Fixture::populated().await;

    let response = post_json(
        fixture.app(),
        json!({"zip": "02138", "measure_name": "Adult obesity"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let rows = body_json(response).await;
    assert_eq!(years(&rows), vec!["2010", "2012", "2014"]);

    for row in rows.as_array().unwrap() {
        assert_eq!(row["Measure_name"], json!("Adult obesity"));
        assert_eq!(row["fipscode"], json!("25017"));
        assert_eq!(row["County"], json!("Middlesex County"));
    }
}

#[tokio::test]
async fn unemployment_for_02139() {
    let fixture = Fixture::populated().await;

    let response = post_json(
        fixture.app(),
        json!({"zip": "02139", "measure_name": "Unemployment"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let rows = body_json(response).await;
    assert_eq!(years(&rows), vec!["2011", "2013"]);
    assert!(rows
        .as_array()
        .unwrap()
        .iter()
        .all(|row| row["Measure_name"] == json!("Unemployment")));
}

#[tokio::test]
async fn numeric_zip_is_accepted() {
    let fixture = Fixture::populated().await;

    let response = post_json(
        fixture.app(),
        json!({"zip": 10001, "measure_name": "Adult obesity"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await[0]["fipscode"], json!("36061"));
}

#[tokio::test]
async fn healthz_reports_populated_store() {
    let fixture = Fixture::populated().await;

    let response = fixture
        .app()
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["exists"], json!(true));
    assert!(body["size"].as_u64().unwrap() > 0);
    let reported = Path::new(body["db_path"].as_str().unwrap());
    assert_eq!(
        reported.canonicalize().unwrap(),
        fixture.store.canonicalize().unwrap()
    );
}

#[tokio::test]
async fn lookups_leave_the_store_unchanged() {
    let fixture = Fixture::populated().await;
    let before = std::fs::read(&fixture.store).unwrap();

    for _ in 0..3 {
        let response = post_json(
            fixture.app(),
            json!({"zip": "02138", "measure_name": "Adult obesity"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(std::fs::read(&fixture.store).unwrap(), before);
}

#[tokio::test]
async fn failed_import_keeps_previous_data() {
    let fixture = Fixture::populated().await;
    let dir = fixture.store.parent().unwrap();
    let empty = dir.join("zip_county.csv");
    std::fs::write(&empty, "").unwrap();

    let result = import_csv(&fixture.store, &empty).await;
    assert!(matches!(result, Err(ImportError::Empty)));

    let response = post_json(
        fixture.app(),
        json!({"zip": "02138", "measure_name": "Adult obesity"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}
