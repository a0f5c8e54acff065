use axum::{
    Router,
    http::Method,
    middleware as axum_middleware,
    routing::get,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::config::ServerConfig;
use crate::web::middleware::auth;
use crate::web::routes::{ingredient_routes, recipe_routes, tag_routes, user_routes};

pub use crate::web::error::AppError;

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub config: Arc<ServerConfig>,
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn create_axum_router(db_pool: DatabaseConnection, config: Arc<ServerConfig>) -> Router {
    let app_state = Arc::new(AppState { db_pool, config });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let api = Router::new()
        .nest("/recipes", recipe_routes::create_recipes_router())
        .nest("/tags", tag_routes::create_tags_router())
        .nest("/ingredients", ingredient_routes::create_ingredients_router())
        .nest("/users", user_routes::create_users_router())
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth::optional_auth,
        ));

    Router::new()
        .route("/api/health", get(health_check_handler))
        .nest("/api", api)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
