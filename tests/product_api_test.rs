//! Integration tests for product CRUD, images and attribute links.

mod common;

use axum::http::{header, Method};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use catalog_api::{
    dto::{ImageUpload, ProductInput},
    entities::{product, product_attribute_value},
    errors::ServiceError,
    services::ProductService,
};
use assert_matches::assert_matches;
use common::{response_json, value_id, FormPart, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::{json, Value};

struct Fixture {
    app: TestApp,
    category_id: i64,
    color_id: i64,
    red: i64,
    blue: i64,
    size_id: i64,
    medium: i64,
}

async fn fixture() -> Fixture {
    let app = TestApp::new().await;
    let color = app.create_attribute("Color", &["Red", "Blue"]).await;
    let size = app.create_attribute("Size", &["M", "L"]).await;
    let color_id = color["id"].as_i64().unwrap();
    let size_id = size["id"].as_i64().unwrap();
    let category = app.create_category("Clothing", &[color_id, size_id]).await;

    Fixture {
        category_id: category["id"].as_i64().unwrap(),
        red: value_id(&app, color_id, "Red").await,
        blue: value_id(&app, color_id, "Blue").await,
        medium: value_id(&app, size_id, "M").await,
        color_id,
        size_id,
        app,
    }
}

fn price(product: &Value) -> Decimal {
    product["price"].as_str().unwrap().parse().unwrap()
}

fn linked_value_ids(product: &Value) -> Vec<i64> {
    product["attributes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["attributeValueId"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn create_returns_location_and_hydrated_product() {
    let f = fixture().await;
    let png = vec![0x89, b'P', b'N', b'G', 1, 2, 3];

    let response = f
        .app
        .multipart(
            Method::POST,
            "/api/product",
            vec![
                FormPart::text("name", "T-Shirt"),
                FormPart::text("description", "Plain cotton tee"),
                FormPart::text("price", "19.5"),
                FormPart::text("stockQuantity", 40),
                FormPart::text("categoryId", f.category_id),
                FormPart::text("isRecommended", "true"),
                FormPart::text("attributeValueIds", f.red),
                FormPart::text("attributeValueIds[]", f.medium),
                FormPart::image(png.clone(), "image/png"),
            ],
        )
        .await;
    assert_eq!(response.status(), 201);

    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("location header");
    let body = response_json(response).await;
    let id = body["id"].as_i64().unwrap();
    assert_eq!(location, format!("/api/product/{id}"));

    assert_eq!(body["name"], "T-Shirt");
    assert_eq!(body["description"], "Plain cotton tee");
    assert_eq!(price(&body), dec!(19.5));
    assert_eq!(body["stockQuantity"], 40);
    assert_eq!(body["categoryId"], f.category_id);
    assert_eq!(body["categoryName"], "Clothing");
    assert_eq!(body["isRecommended"], true);
    assert_eq!(body["imageContentType"], "image/png");
    assert_eq!(body["imageBase64"], STANDARD.encode(&png));
    assert!(body["createdAt"].is_string());

    assert_eq!(linked_value_ids(&body), vec![f.red, f.medium]);
    assert_eq!(body["attributes"][0]["attributeId"], f.color_id);
    assert_eq!(body["attributes"][0]["attributeName"], "Color");
    assert_eq!(body["attributes"][0]["value"], "Red");
    assert_eq!(body["attributes"][1]["attributeId"], f.size_id);

    let fetched = response_json(f.app.request(Method::GET, &location, None).await).await;
    assert_eq!(fetched["name"], "T-Shirt");
    assert_eq!(linked_value_ids(&fetched), vec![f.red, f.medium]);
}

#[tokio::test]
async fn create_defaults_recommended_flag_and_image() {
    let f = fixture().await;

    let body = f.app.create_product("Socks", f.category_id, &[]).await;

    assert_eq!(body["isRecommended"], false);
    assert!(body["imageBase64"].is_null());
    assert!(body["attributes"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn create_with_unknown_category_is_bad_request() {
    let f = fixture().await;

    let response = f.app.multipart(
        Method::POST,
        "/api/product",
        vec![
            FormPart::text("name", "Orphan"),
            FormPart::text("price", "1"),
            FormPart::text("stockQuantity", 1),
            FormPart::text("categoryId", 9999),
        ],
    )
    .await;
    assert_eq!(response.status(), 400);

    let count = product::Entity::find().count(&*f.app.state.db).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn create_with_unknown_attribute_value_writes_nothing() {
    let f = fixture().await;

    let response = f.app.multipart(
        Method::POST,
        "/api/product",
        vec![
            FormPart::text("name", "Hat"),
            FormPart::text("price", "5"),
            FormPart::text("stockQuantity", 1),
            FormPart::text("categoryId", f.category_id),
            FormPart::text("attributeValueIds", f.red),
            FormPart::text("attributeValueIds", 4242),
        ],
    )
    .await;
    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("4242"));

    let count = product::Entity::find().count(&*f.app.state.db).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn malformed_or_missing_form_fields_are_bad_request() {
    let f = fixture().await;

    let response = f.app.multipart(
        Method::POST,
        "/api/product",
        vec![
            FormPart::text("name", "Hat"),
            FormPart::text("price", "cheap"),
            FormPart::text("stockQuantity", 1),
            FormPart::text("categoryId", f.category_id),
        ],
    )
    .await;
    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert_eq!(body["details"], "invalid_field");

    let response = f.app.multipart(
        Method::POST,
        "/api/product",
        vec![
            FormPart::text("name", ""),
            FormPart::text("price", "3"),
            FormPart::text("stockQuantity", 1),
            FormPart::text("categoryId", f.category_id),
        ],
    )
    .await;
    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert_eq!(body["details"], "missing_field");

    let response = f.app.multipart(
        Method::POST,
        "/api/product",
        vec![
            FormPart::text("name", "Hat"),
            FormPart::text("price", "3"),
            FormPart::text("stockQuantity", -1),
            FormPart::text("categoryId", f.category_id),
        ],
    )
    .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn price_beyond_column_limits_is_bad_request() {
    let f = fixture().await;

    for raw in ["100000000000000", "99999999999999.99", "4.999"] {
        let response = f
            .app
            .multipart(
                Method::POST,
                "/api/product",
                vec![
                    FormPart::text("name", "Yacht"),
                    FormPart::text("price", raw),
                    FormPart::text("stockQuantity", 1),
                    FormPart::text("categoryId", f.category_id),
                ],
            )
            .await;
        assert_eq!(response.status(), 400, "price {} should be rejected", raw);
    }

    let count = product::Entity::find().count(&*f.app.state.db).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn largest_price_round_trips_exactly() {
    let f = fixture().await;

    let response = f
        .app
        .multipart(
            Method::POST,
            "/api/product",
            vec![
                FormPart::text("name", "Yacht"),
                FormPart::text("price", "9999999999999.99"),
                FormPart::text("stockQuantity", 1),
                FormPart::text("categoryId", f.category_id),
            ],
        )
        .await;
    assert_eq!(response.status(), 201);
    let created = response_json(response).await;

    let response = f
        .app
        .request(Method::GET, &format!("/api/product/{}", created["id"]), None)
        .await;
    assert_eq!(response.status(), 200);
    let fetched = response_json(response).await;
    assert_eq!(price(&fetched), dec!(9999999999999.99));
}

#[tokio::test]
async fn oversized_image_is_rejected_and_not_persisted() {
    let app = TestApp::with_config(|cfg| cfg.max_image_bytes = 1024).await;
    let category = app.create_category("Home", &[]).await;

    let response = app
        .multipart(
            Method::POST,
            "/api/product",
            vec![
                FormPart::text("name", "Poster"),
                FormPart::text("price", "9.75"),
                FormPart::text("stockQuantity", 2),
                FormPart::text("categoryId", category["id"].as_i64().unwrap()),
                FormPart::image(vec![7u8; 1025], "image/jpeg"),
            ],
        )
        .await;
    assert_eq!(response.status(), 400);

    let count = product::Entity::find().count(&*app.state.db).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn service_rejects_image_over_ten_megabytes() {
    let app = TestApp::new().await;
    let category = app.create_category("Home", &[]).await;
    let service = ProductService::new(app.state.db.clone(), app.state.config.max_image_bytes);

    let mut input = ProductInput::new("Canvas", dec!(10), 1, category["id"].as_i64().unwrap() as i32);
    input.image = Some(ImageUpload {
        bytes: vec![0u8; 10 * 1024 * 1024 + 1],
        content_type: "image/png".into(),
    });

    let result = service.create_product(input).await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    let count = product::Entity::find().count(&*app.state.db).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn update_replaces_links_instead_of_merging() {
    let f = fixture().await;
    let created = f
        .app
        .create_product("Jacket", f.category_id, &[f.red, f.medium])
        .await;
    let id = created["id"].as_i64().unwrap();

    let response = f
        .app
        .multipart(
            Method::PUT,
            &format!("/api/product/{id}"),
            vec![
                FormPart::text("name", "Jacket"),
                FormPart::text("price", "99.25"),
                FormPart::text("stockQuantity", 8),
                FormPart::text("categoryId", f.category_id),
                FormPart::text("attributeValueIds", f.blue),
            ],
        )
        .await;
    assert_eq!(response.status(), 204);

    let links = product_attribute_value::Entity::find()
        .filter(product_attribute_value::Column::ProductId.eq(id as i32))
        .count(&*f.app.state.db)
        .await
        .unwrap();
    assert_eq!(links, 1);

    let fetched = response_json(
        f.app
            .request(Method::GET, &format!("/api/product/{id}"), None)
            .await,
    )
    .await;
    assert_eq!(linked_value_ids(&fetched), vec![f.blue]);
    assert_eq!(price(&fetched), dec!(99.25));
    assert_eq!(fetched["stockQuantity"], 8);
    assert!(fetched["updatedAt"].is_string());
}

#[tokio::test]
async fn update_without_image_or_ids_keeps_them() {
    let f = fixture().await;
    let png = vec![1u8, 2, 3, 4];

    let response = f
        .app
        .multipart(
            Method::POST,
            "/api/product",
            vec![
                FormPart::text("name", "Boots"),
                FormPart::text("price", "80"),
                FormPart::text("stockQuantity", 5),
                FormPart::text("categoryId", f.category_id),
                FormPart::text("isRecommended", "true"),
                FormPart::text("attributeValueIds", f.red),
                FormPart::image(png.clone(), "image/webp"),
            ],
        )
        .await;
    assert_eq!(response.status(), 201);
    let id = response_json(response).await["id"].as_i64().unwrap();

    let response = f
        .app
        .multipart(
            Method::PUT,
            &format!("/api/product/{id}"),
            vec![
                FormPart::text("name", "Winter Boots"),
                FormPart::text("price", "85"),
                FormPart::text("stockQuantity", 4),
                FormPart::text("categoryId", f.category_id),
            ],
        )
        .await;
    assert_eq!(response.status(), 204);

    let fetched = response_json(
        f.app
            .request(Method::GET, &format!("/api/product/{id}"), None)
            .await,
    )
    .await;
    assert_eq!(fetched["name"], "Winter Boots");
    assert_eq!(fetched["imageBase64"], STANDARD.encode(&png));
    assert_eq!(fetched["imageContentType"], "image/webp");
    assert_eq!(fetched["isRecommended"], true);
    assert_eq!(linked_value_ids(&fetched), vec![f.red]);
}

#[tokio::test]
async fn update_with_empty_ids_part_clears_links() {
    let f = fixture().await;
    let created = f.app.create_product("Belt", f.category_id, &[f.red]).await;
    let id = created["id"].as_i64().unwrap();

    let response = f
        .app
        .multipart(
            Method::PUT,
            &format!("/api/product/{id}"),
            vec![
                FormPart::text("name", "Belt"),
                FormPart::text("price", "12.5"),
                FormPart::text("stockQuantity", 3),
                FormPart::text("categoryId", f.category_id),
                FormPart::text("attributeValueIds", ""),
            ],
        )
        .await;
    assert_eq!(response.status(), 204);

    let fetched = response_json(
        f.app
            .request(Method::GET, &format!("/api/product/{id}"), None)
            .await,
    )
    .await;
    assert!(fetched["attributes"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn update_missing_product_is_not_found() {
    let f = fixture().await;

    let response = f
        .app
        .multipart(
            Method::PUT,
            "/api/product/555",
            vec![
                FormPart::text("name", "Ghost"),
                FormPart::text("price", "1"),
                FormPart::text("stockQuantity", 1),
                FormPart::text("categoryId", f.category_id),
            ],
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn delete_removes_product_and_links() {
    let f = fixture().await;
    let created = f.app.create_product("Gloves", f.category_id, &[f.red]).await;
    let id = created["id"].as_i64().unwrap();

    let response = f
        .app
        .request(Method::DELETE, &format!("/api/product/{id}"), None)
        .await;
    assert_eq!(response.status(), 204);

    let response = f
        .app
        .request(Method::GET, &format!("/api/product/{id}"), None)
        .await;
    assert_eq!(response.status(), 404);

    let links = product_attribute_value::Entity::find()
        .count(&*f.app.state.db)
        .await
        .unwrap();
    assert_eq!(links, 0);

    let response = f
        .app
        .request(Method::DELETE, &format!("/api/product/{id}"), None)
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn add_and_remove_single_attribute_link() {
    let f = fixture().await;
    let created = f.app.create_product("Cap", f.category_id, &[]).await;
    let id = created["id"].as_i64().unwrap();

    let response = f
        .app
        .request(
            Method::POST,
            &format!("/api/product/{id}/attributes"),
            Some(json!({ "attributeValueId": f.blue })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(linked_value_ids(&body), vec![f.blue]);
    assert!(body["updatedAt"].is_string());

    let response = f
        .app
        .request(
            Method::POST,
            &format!("/api/product/{id}/attributes"),
            Some(json!({ "attributeValueId": f.blue })),
        )
        .await;
    assert_eq!(response.status(), 409);

    let response = f
        .app
        .request(
            Method::DELETE,
            &format!("/api/product/{id}/attributes/{}", f.blue),
            None,
        )
        .await;
    assert_eq!(response.status(), 204);

    let response = f
        .app
        .request(
            Method::DELETE,
            &format!("/api/product/{id}/attributes/{}", f.blue),
            None,
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn add_attribute_validates_product_and_value() {
    let f = fixture().await;
    let created = f.app.create_product("Cap", f.category_id, &[]).await;
    let id = created["id"].as_i64().unwrap();

    let response = f
        .app
        .request(
            Method::POST,
            &format!("/api/product/{id}/attributes"),
            Some(json!({ "attributeValueId": 31337 })),
        )
        .await;
    assert_eq!(response.status(), 400);

    let response = f
        .app
        .request(
            Method::POST,
            "/api/product/31337/attributes",
            Some(json!({ "attributeValueId": f.red })),
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn list_by_category_only_returns_that_category() {
    let f = fixture().await;
    let other = f.app.create_category("Books", &[]).await;
    let other_id = other["id"].as_i64().unwrap();
    let shirt = f.app.create_product("Shirt", f.category_id, &[]).await;
    f.app.create_product("Novel", other_id, &[]).await;

    let list = response_json(
        f.app
            .request(
                Method::GET,
                &format!("/api/product/category/{}", f.category_id),
                None,
            )
            .await,
    )
    .await;
    assert_eq!(common::ids(&list), vec![shirt["id"].as_i64().unwrap()]);

    let all = response_json(f.app.request(Method::GET, "/api/product/all", None).await).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let response = f
        .app
        .request(Method::GET, "/api/product/category/9999", None)
        .await;
    assert_eq!(response.status(), 200);
    assert!(response_json(response).await.as_array().unwrap().is_empty());
}
