//! Integration tests for ingest-then-read against Postgres.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, post_json};
use serde_json::json;
use sqlx::PgPool;

async fn ingest(pool: &PgPool, body: serde_json::Value) {
    let app = common::build_pg_app(pool.clone());
    let response = post_json(app, "/api/v1/ingest", body).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Test: readings come back newest first
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn readings_are_listed_newest_first(pool: PgPool) {
    ingest(
        &pool,
        json!({
            "shipment_id": "GD-1",
            "timestamp": "2026-03-01T10:00:00Z",
            "temperature_c": 4.0
        }),
    )
    .await;
    ingest(
        &pool,
        json!({
            "shipment_id": "GD-1",
            "timestamp": "2026-03-01T10:05:00Z",
            "temperature_c": 5.0
        }),
    )
    .await;
    ingest(&pool, json!({ "shipment_id": "GD-OTHER", "temperature_c": 5.0 })).await;

    let app = common::build_pg_app(pool);
    let response = get(app, "/api/v1/shipments/GD-1/readings").await;
    assert_eq!(response.status(), StatusCode::OK);

    let data = body_json(response).await["data"].clone();
    let rows = data.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["temperature_c"], 5.0);
    assert_eq!(rows[1]["temperature_c"], 4.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn limit_caps_the_number_of_readings(pool: PgPool) {
    for _ in 0..3 {
        ingest(&pool, json!({ "shipment_id": "GD-1" })).await;
    }

    let app = common::build_pg_app(pool);
    let response = get(app, "/api/v1/shipments/GD-1/readings?limit=2").await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Test: alerts are persisted with their reasons
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn alerts_are_persisted_with_reasons(pool: PgPool) {
    ingest(
        &pool,
        json!({
            "shipment_id": "GD-2",
            "temperature_c": 5.0,
            "humidity_pct": 40.0,
            "g_force": 4.0
        }),
    )
    .await;

    let app = common::build_pg_app(pool);
    let response = get(app, "/api/v1/shipments/GD-2/alerts").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let alert = &json["data"][0];
    assert_eq!(alert["severity"], "HIGH");
    assert_eq!(alert["kinds"], json!(["IMPACT", "LOW_HUMIDITY"]));
    assert_eq!(alert["resolved"], false);
    assert_eq!(alert["reasons"].as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Test: health reports the database
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn health_reports_database(pool: PgPool) {
    let app = common::build_pg_app(pool);
    let json = body_json(get(app, "/health").await).await;

    assert_eq!(json["status"], "ok");
    assert_eq!(json["db_healthy"], true);
    assert_eq!(json["storage"], "postgres");
}
