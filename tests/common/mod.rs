#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{header, Method, Request},
    response::Response,
    Router,
};
use catalog_api::{config::AppConfig, db, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "catalog-test-boundary";

/// Helper harness for spinning up the full router over a throwaway SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _dir: TempDir,
}

/// One part of a multipart product form.
pub enum FormPart {
    Text(&'static str, String),
    File {
        name: &'static str,
        filename: &'static str,
        content_type: Option<&'static str>,
        bytes: Vec<u8>,
    },
}

impl FormPart {
    pub fn text(name: &'static str, value: impl ToString) -> Self {
        FormPart::Text(name, value.to_string())
    }

    pub fn image(bytes: Vec<u8>, content_type: &'static str) -> Self {
        FormPart::File {
            name: "image",
            filename: "image.png",
            content_type: Some(content_type),
            bytes,
        }
    }
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let db_path = dir.path().join("catalog.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.cors_allow_any_origin = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        customize(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = catalog_api::build_router(state.clone()).expect("router builds");

        Self {
            router,
            state,
            _dir: dir,
        }
    }

    /// Send a request against the router with an optional JSON body.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request_with_headers(method, uri, body, &[]).await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = if let Some(json) = body {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.send(request).await
    }

    /// Send a multipart/form-data request built from `parts`.
    pub async fn multipart(&self, method: Method, uri: &str, parts: Vec<FormPart>) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .expect("failed to build multipart request");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn create_attribute(&self, name: &str, values: &[&str]) -> Value {
        let response = self
            .request(
                Method::POST,
                "/api/attribute",
                Some(json!({ "name": name, "values": values })),
            )
            .await;
        assert_eq!(response.status(), 201, "attribute {name} should be created");
        response_json(response).await
    }

    pub async fn create_category(&self, name: &str, attribute_ids: &[i64]) -> Value {
        let response = self
            .request(
                Method::POST,
                "/api/category",
                Some(json!({ "name": name, "attributeIds": attribute_ids })),
            )
            .await;
        assert_eq!(response.status(), 201, "category {name} should be created");
        response_json(response).await
    }

    /// Creates a product through the multipart endpoint and returns its body.
    pub async fn create_product(
        &self,
        name: &str,
        category_id: i64,
        attribute_value_ids: &[i64],
    ) -> Value {
        let mut parts = vec![
            FormPart::text("name", name),
            FormPart::text("price", "12.5"),
            FormPart::text("stockQuantity", 3),
            FormPart::text("categoryId", category_id),
        ];
        parts.extend(
            attribute_value_ids
                .iter()
                .map(|id| FormPart::text("attributeValueIds", id)),
        );

        let response = self.multipart(Method::POST, "/api/product", parts).await;
        assert_eq!(response.status(), 201, "product {name} should be created");
        response_json(response).await
    }
}

pub fn multipart_body(parts: Vec<FormPart>) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            FormPart::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            FormPart::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                if let Some(content_type) = content_type {
                    body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
                }
                body.extend_from_slice(b"\r\n");
                body.extend_from_slice(&bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Ids of a JSON array of objects, in order.
pub fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .expect("array")
        .iter()
        .map(|item| item["id"].as_i64().expect("id"))
        .collect()
}

/// Looks up the stored id of `value` under attribute `attribute_id`.
pub async fn value_id(app: &TestApp, attribute_id: i64, value: &str) -> i64 {
    use catalog_api::entities::attribute_value;
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

    attribute_value::Entity::find()
        .filter(attribute_value::Column::CategoryAttributeId.eq(attribute_id as i32))
        .filter(attribute_value::Column::Value.eq(value))
        .one(&*app.state.db)
        .await
        .expect("query attribute value")
        .map(|v| i64::from(v.id))
        .expect("attribute value exists")
}
