//! Filter semantics: optional category equality AND'ed with every attribute filter.

mod common;

use axum::http::Method;
use common::{ids, response_json, value_id, TestApp};
use serde_json::{json, Value};

struct Catalog {
    app: TestApp,
    clothing: i64,
    other: i64,
    color: i64,
    size: i64,
    red_m: i64,
    red_l: i64,
    blue_m: i64,
    red_only: i64,
    red_m_elsewhere: i64,
}

/// Clothing holds four products with partial matches; another category holds a
/// product that would match on attributes alone.
async fn catalog() -> Catalog {
    let app = TestApp::new().await;
    let color = app
        .create_attribute("Color", &["Red", "Blue"])
        .await["id"]
        .as_i64()
        .unwrap();
    let size = app
        .create_attribute("Size", &["M", "L"])
        .await["id"]
        .as_i64()
        .unwrap();
    let red = value_id(&app, color, "Red").await;
    let blue = value_id(&app, color, "Blue").await;
    let m = value_id(&app, size, "M").await;
    let l = value_id(&app, size, "L").await;

    let clothing = app.create_category("Clothing", &[color, size]).await["id"]
        .as_i64()
        .unwrap();
    let other = app.create_category("Outlet", &[color, size]).await["id"]
        .as_i64()
        .unwrap();

    let id = |v: Value| v["id"].as_i64().unwrap();
    Catalog {
        red_m: id(app.create_product("Red M", clothing, &[red, m]).await),
        red_l: id(app.create_product("Red L", clothing, &[red, l]).await),
        blue_m: id(app.create_product("Blue M", clothing, &[blue, m]).await),
        red_only: id(app.create_product("Red only", clothing, &[red]).await),
        red_m_elsewhere: id(app.create_product("Outlet Red M", other, &[red, m]).await),
        app,
        clothing,
        other,
        color,
        size,
    }
}

async fn filter(app: &TestApp, body: Value) -> Vec<i64> {
    let response = app
        .request(Method::POST, "/api/product/filter", Some(body))
        .await;
    assert_eq!(response.status(), 200);
    ids(&response_json(response).await)
}

#[tokio::test]
async fn category_and_two_attribute_filters_require_every_match() {
    let c = catalog().await;

    let found = filter(
        &c.app,
        json!({
            "categoryId": c.clothing,
            "attributeFilters": [
                { "categoryAttributeId": c.color, "value": "Red" },
                { "categoryAttributeId": c.size, "value": "M" }
            ]
        }),
    )
    .await;

    assert_eq!(found, vec![c.red_m]);
}

#[tokio::test]
async fn attribute_filters_without_category_span_categories() {
    let c = catalog().await;

    let found = filter(
        &c.app,
        json!({
            "attributeFilters": [
                { "categoryAttributeId": c.color, "value": "Red" },
                { "categoryAttributeId": c.size, "value": "M" }
            ]
        }),
    )
    .await;

    assert_eq!(found, vec![c.red_m, c.red_m_elsewhere]);
}

#[tokio::test]
async fn single_filter_matches_attribute_and_value_together() {
    let c = catalog().await;

    let found = filter(
        &c.app,
        json!({
            "categoryId": c.clothing,
            "attributeFilters": [{ "categoryAttributeId": c.color, "value": "Red" }]
        }),
    )
    .await;
    assert_eq!(found, vec![c.red_m, c.red_l, c.red_only]);

    // "M" exists, but under Size rather than Color.
    let found = filter(
        &c.app,
        json!({ "attributeFilters": [{ "categoryAttributeId": c.color, "value": "M" }] }),
    )
    .await;
    assert!(found.is_empty());
}

#[tokio::test]
async fn value_matching_is_exact() {
    let c = catalog().await;

    let found = filter(
        &c.app,
        json!({ "attributeFilters": [{ "categoryAttributeId": c.color, "value": "red" }] }),
    )
    .await;

    assert!(found.is_empty());
}

#[tokio::test]
async fn category_only_and_empty_filters() {
    let c = catalog().await;

    let found = filter(&c.app, json!({ "categoryId": c.other })).await;
    assert_eq!(found, vec![c.red_m_elsewhere]);

    let everything = filter(&c.app, json!({})).await;
    assert_eq!(
        everything,
        vec![c.red_m, c.red_l, c.blue_m, c.red_only, c.red_m_elsewhere]
    );
}

#[tokio::test]
async fn two_values_of_one_attribute_need_both_links() {
    let c = catalog().await;

    let found = filter(
        &c.app,
        json!({
            "attributeFilters": [
                { "categoryAttributeId": c.color, "value": "Red" },
                { "categoryAttributeId": c.color, "value": "Blue" }
            ]
        }),
    )
    .await;

    assert!(found.is_empty());
}
