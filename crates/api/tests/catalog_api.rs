//! Integration tests for the public catalog endpoints.
//!
//! The test app runs the catalog offline, so every answer comes from the
//! built-in dataset and reports `source: "fallback"`.

mod common;

use axum::http::StatusCode;
use common::{body_json, get};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn component_types_fall_back_to_builtin_list(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/catalog/component-types").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["meta"]["source"], "fallback");
    assert_eq!(json["meta"]["count"], 7);
    assert_eq!(json["data"][0], "belt");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn component_specifications_filter_by_type_and_price(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(
        app,
        "/api/v1/catalog/component-specifications?component_type=motor&max_price=200",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["meta"]["source"], "fallback");
    assert_eq!(json["meta"]["filters"]["component_type"], "motor");
    assert_eq!(json["meta"]["filters"]["max_price"], 200.0);
    assert!(json["meta"]["filters"].get("min_price").is_none());

    let names: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Standard Motor", "Economy Motor"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_requires_a_query(pool: PgPool) {
    let app = common::build_test_app(pool);

    for uri in [
        "/api/v1/catalog/component-specifications/search",
        "/api/v1/catalog/component-specifications/search?q=%20%20",
    ] {
        let response = get(app.clone(), uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let json = body_json(response).await;
        assert_eq!(json["error"], "Search query is required");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_matches_component_names(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(
        app,
        "/api/v1/catalog/component-specifications/search?q=premium&component_type=sensor",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["meta"]["query"], "premium");
    assert_eq!(json["meta"]["count"], 1);
    assert_eq!(json["data"][0]["name"], "Premium Sensor");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn conveyor_systems_filter_by_category(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(
        app,
        "/api/v1/catalog/conveyor-systems?system_category=Roller%20Conveyors",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["meta"]["count"], 3);
    assert!(json["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|row| row["system_category"] == "Roller Conveyors"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn system_specifications_are_grouped_by_category(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/catalog/system-specifications").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["meta"]["count"], 3);
    assert_eq!(json["meta"]["source"], "fallback");
    assert_eq!(json["data"]["Belt Conveyors"][0], "belt_conveyor");
}
