//! Route tests against an in-memory dataset, driven through the router.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use configuration::Config;
use dataset::read_orders;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use web_server::{app, AppState};

const SAMPLE: &str = "\
order_date,category,revenue,customer_id
2024-01-05,Electronics,100,C1
2024-02-10,Electronics,50,C2
2024-02-15,Books,30,C1
2024-03-01,Garden,12.5,C3
";

fn router() -> Router {
    let dataset = read_orders(SAMPLE.as_bytes()).unwrap();
    app(Arc::new(AppState::new(&Config::default(), dataset)))
}

async fn get(uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = router()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
    (status, content_type, body)
}

async fn get_json(uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = get(uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

// ---------------------------------------------------------------------------
// metadata
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_is_ok() {
    let (status, _, body) = get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn categories_describe_the_dataset() {
    let (status, json) = get_json("/api/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["categories"], serde_json::json!(["Books", "Electronics", "Garden"]));
    assert_eq!(json["data_range"]["start"], "2024-01-05");
    assert_eq!(json["data_range"]["end"], "2024-03-01");
    assert_eq!(json["skipped_rows"], 0);
}

// ---------------------------------------------------------------------------
// report
// ---------------------------------------------------------------------------

#[tokio::test]
async fn report_defaults_to_everything() {
    let (status, json) = get_json("/api/report").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["metrics"]["order_count"], 4);
    assert_eq!(json["metrics"]["unique_customer_count"], 3);
    assert_eq!(json["series"]["revenue_by_month"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn report_applies_query_filter() {
    let (status, json) =
        get_json("/api/report?start=2024-01-01&end=2024-02-28&categories=Electronics,Books").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["metrics"]["order_count"], 3);
    assert_eq!(json["metrics"]["unique_customer_count"], 2);
    assert_eq!(json["series"]["revenue_by_month"][0]["label"], "2024-01");
    assert_eq!(json["series"]["revenue_by_month"][1]["label"], "2024-02");
    assert_eq!(json["insights"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn repeated_category_params_are_accepted() {
    let (status, json) = get_json("/api/report?category=Garden&category=Books").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["metrics"]["order_count"], 2);
}

#[tokio::test]
async fn empty_category_list_yields_zeroed_report() {
    let (status, json) = get_json("/api/report?categories=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["metrics"]["order_count"], 0);
    assert_eq!(json["insights"].as_array().unwrap().len(), 0);
    assert!(json["order_trend"].is_null());
}

#[tokio::test]
async fn inverted_range_is_a_bad_request() {
    let (status, json) = get_json("/api/report?start=2024-03-01&end=2024-01-01").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("after end date"));
}

#[tokio::test]
async fn overflowing_revenue_is_unprocessable() {
    let csv = "\
order_date,category,revenue,customer_id
2024-01-05,Electronics,79228162514264337593543950335,C1
2024-01-06,Electronics,79228162514264337593543950335,C2
";
    let dataset = read_orders(csv.as_bytes()).unwrap();
    let response = app(Arc::new(AppState::new(&Config::default(), dataset)))
        .oneshot(Request::builder().uri("/api/report").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("representable range"));
}

// ---------------------------------------------------------------------------
// export
// ---------------------------------------------------------------------------

#[tokio::test]
async fn export_is_a_csv_attachment_of_the_filtered_rows() {
    let response = router()
        .oneshot(
            Request::builder()
                .uri("/api/export.csv?categories=Books")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.contains("filtered_ecommerce.csv"));

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(
        std::str::from_utf8(&body).unwrap(),
        "order_date,category,revenue,customer_id\n2024-02-15,Books,30,C1\n"
    );
}

#[tokio::test]
async fn empty_export_is_header_only() {
    let (status, content_type, body) = get("/api/export.csv?categories=").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/csv"));
    assert_eq!(body, b"order_date,category,revenue,customer_id\n");
}

// ---------------------------------------------------------------------------
// charts and page
// ---------------------------------------------------------------------------

#[tokio::test]
async fn charts_are_svg() {
    for kind in ["revenue", "orders", "categories"] {
        let (status, content_type, body) = get(&format!("/api/charts/{kind}")).await;
        assert_eq!(status, StatusCode::OK, "{kind}");
        assert_eq!(content_type.as_deref(), Some("image/svg+xml"));
        assert!(String::from_utf8(body).unwrap().contains("<svg"));
    }
}

#[tokio::test]
async fn unknown_chart_is_not_found() {
    let (status, _, _) = get("/api/charts/pie").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dashboard_page_shows_kpis_and_insights() {
    let (status, _, body) = get("/").await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("Total Revenue"));
    assert!(html.contains("BRL 192.50"));
    assert!(html.contains("Automated Insights"));
    assert!(html.contains("Download filtered CSV"));
    assert!(html.contains("Data range: 2024-01-05 to 2024-03-01"));
}

#[tokio::test]
async fn invalid_range_keeps_comma_selected_categories_checked() {
    let (status, _, body) = get("/?start=2024-03-01&end=2024-01-01&categories=Books,Garden").await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("value=\"Books\" checked"));
    assert!(html.contains("value=\"Garden\" checked"));
    assert!(!html.contains("value=\"Electronics\" checked"));
}

#[tokio::test]
async fn dashboard_page_reports_invalid_range() {
    let (status, _, body) = get("/?start=2024-03-01&end=2024-01-01&selection=manual").await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("class=\"error\""));
    assert!(!html.contains("Total Revenue"));
}
