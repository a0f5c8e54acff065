use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::services::IngredientService;
use crate::web::models::catalog_models::IngredientResponse;
use crate::web::{AppError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct IngredientSearchQuery {
    /// Case-insensitive name prefix.
    name: Option<String>,
}

async fn search_ingredients_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<IngredientSearchQuery>,
) -> Result<Json<Vec<IngredientResponse>>, AppError> {
    let ingredients = IngredientService::search(&app_state.db_pool, query.name.as_deref()).await?;
    Ok(Json(
        ingredients.into_iter().map(IngredientResponse::from).collect(),
    ))
}

async fn get_ingredient_handler(
    State(app_state): State<Arc<AppState>>,
    Path(ingredient_id): Path<i32>,
) -> Result<Json<IngredientResponse>, AppError> {
    let ingredient = IngredientService::get(&app_state.db_pool, ingredient_id).await?;
    Ok(Json(ingredient.into()))
}

pub fn create_ingredients_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(search_ingredients_handler))
        .route("/{id}", get(get_ingredient_handler))
}
