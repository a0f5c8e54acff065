// Shared fixtures for integration tests: an in-memory sqlite database with the
// full schema, seed helpers and token minting.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::Utc;
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use tower::ServiceExt;

use foodgram_backend::db::entities::{ingredient, recipe, tag, user};
use foodgram_backend::db::models::{IngredientAmount, RecipeInput};
use foodgram_backend::db::schema::create_schema;
use foodgram_backend::db::services::RecipeService;
use foodgram_backend::server::config::ServerConfig;
use foodgram_backend::web::create_axum_router;
use foodgram_backend::web::models::Claims;

pub const JWT_SECRET: &str = "integration-test-secret";

pub async fn setup_db() -> DatabaseConnection {
    // One connection: every pooled connection would otherwise get its own
    // empty in-memory database.
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opt).await.expect("connect to sqlite");
    create_schema(&db).await.expect("create schema");
    db
}

pub fn test_config() -> Arc<ServerConfig> {
    Arc::new(ServerConfig {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        listen_addr: "127.0.0.1:0".to_string(),
        log_dir: "logs".to_string(),
        default_page_size: 6,
        max_db_connections: 1,
    })
}

pub fn test_router(db: &DatabaseConnection) -> Router {
    create_axum_router(db.clone(), test_config())
}

pub async fn create_user(db: &DatabaseConnection, username: &str) -> user::Model {
    create_user_with_role(db, username, user::ROLE_USER).await
}

pub async fn create_user_with_role(
    db: &DatabaseConnection,
    username: &str,
    role: &str,
) -> user::Model {
    user::ActiveModel {
        email: Set(format!("{username}@example.com")),
        username: Set(username.to_string()),
        first_name: Set(username.to_string()),
        last_name: Set("Tester".to_string()),
        role: Set(role.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert user")
}

pub async fn create_tag(db: &DatabaseConnection, name: &str, slug: &str) -> tag::Model {
    tag::ActiveModel {
        name: Set(name.to_string()),
        color: Set("#49B64E".to_string()),
        slug: Set(slug.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert tag")
}

pub async fn create_ingredient(
    db: &DatabaseConnection,
    name: &str,
    measurement_unit: &str,
) -> ingredient::Model {
    ingredient::ActiveModel {
        name: Set(name.to_string()),
        measurement_unit: Set(measurement_unit.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert ingredient")
}

/// Creates a recipe through the service, so links are written the same way
/// the API writes them. `ingredients` is `(ingredient_id, amount)`.
pub async fn create_recipe(
    db: &DatabaseConnection,
    author_id: i32,
    name: &str,
    tag_ids: &[i32],
    ingredients: &[(i32, i32)],
) -> recipe::Model {
    let input = RecipeInput {
        name: name.to_string(),
        image: format!("https://cdn.example/{name}.png"),
        text: format!("How to cook {name}."),
        cooking_time: 15,
        tag_ids: tag_ids.to_vec(),
        ingredients: ingredients
            .iter()
            .map(|&(ingredient_id, amount)| IngredientAmount {
                ingredient_id,
                amount,
            })
            .collect(),
    };
    RecipeService::create(db, author_id, input)
        .await
        .expect("create recipe")
        .recipe
}

pub fn token_for(user: &user::Model) -> String {
    let claims = Claims {
        sub: user.username.clone(),
        user_id: user.id,
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_ref()),
    )
    .expect("encode token")
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("utf-8 body")
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("json body")
    }
}

/// Sends one request through the router. `token` becomes a Bearer header,
/// `body` a JSON body.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes()
        .to_vec();

    TestResponse {
        status,
        headers,
        body,
    }
}
