use axum::{
    Json, Router,
    extract::{Extension, OriginalUri, Path, State},
    http::{StatusCode, header},
    middleware as axum_middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use axum_extra::extract::Query;
use std::sync::Arc;

use crate::db::pagination::{PageRequest, PaginationParams};
use crate::db::services::{MembershipChange, MembershipKind, MembershipService, RecipeService};
use crate::recipe_filter::{RecipeFilter, RecipeQueryParams};
use crate::shopping_list::{
    SHOPPING_LIST_CONTENT_TYPE, SHOPPING_LIST_FILENAME, aggregate_shopping_list,
    render_shopping_list,
};
use crate::web::middleware::auth::require_auth;
use crate::web::models::recipe_models::{
    RecipePatchPayload, RecipeReadResponse, RecipeShortResponse, RecipeWritePayload,
    read_projection, write_projection,
};
use crate::web::models::{AuthenticatedUser, PaginatedResponse};
use crate::web::{AppError, AppState};

async fn list_recipes_handler(
    Extension(auth_user): Extension<Option<AuthenticatedUser>>,
    State(app_state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<RecipeQueryParams>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<RecipeReadResponse>>, AppError> {
    let filter = RecipeFilter::from_params(&params)?;
    let page = PageRequest::from_params(&pagination, app_state.config.default_page_size)?;

    let recipes = RecipeService::list(
        &app_state.db_pool,
        auth_user.map(|u| u.id),
        &filter,
        page,
    )
    .await?;
    Ok(Json(PaginatedResponse::from_page(
        recipes.map(read_projection),
        &uri,
    )))
}

async fn get_recipe_handler(
    Extension(auth_user): Extension<Option<AuthenticatedUser>>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<Json<RecipeReadResponse>, AppError> {
    let details =
        RecipeService::get_details(&app_state.db_pool, recipe_id, auth_user.map(|u| u.id)).await?;
    Ok(Json(read_projection(details)))
}

async fn create_recipe_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<RecipeWritePayload>,
) -> Result<(StatusCode, Json<RecipeReadResponse>), AppError> {
    let details =
        RecipeService::create(&app_state.db_pool, authenticated_user.id, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(read_projection(details))))
}

async fn update_recipe_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
    Json(payload): Json<RecipePatchPayload>,
) -> Result<Json<RecipeReadResponse>, AppError> {
    let current = RecipeService::get_details(
        &app_state.db_pool,
        recipe_id,
        Some(authenticated_user.id),
    )
    .await?;
    let merged = payload.merge_over(write_projection(&current));

    let details = RecipeService::update(
        &app_state.db_pool,
        recipe_id,
        authenticated_user.id,
        merged.into(),
    )
    .await?;
    Ok(Json(read_projection(details)))
}

async fn delete_recipe_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    RecipeService::delete(&app_state.db_pool, recipe_id, authenticated_user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_membership(
    app_state: &AppState,
    kind: MembershipKind,
    user_id: i32,
    recipe_id: i32,
) -> Result<(StatusCode, Json<RecipeShortResponse>), AppError> {
    let (recipe, change) = MembershipService::add(&app_state.db_pool, kind, user_id, recipe_id).await?;
    let status = match change {
        MembershipChange::Added => StatusCode::CREATED,
        MembershipChange::AlreadyPresent => StatusCode::OK,
    };
    Ok((status, Json(recipe.into())))
}

async fn add_favorite_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<(StatusCode, Json<RecipeShortResponse>), AppError> {
    add_membership(&app_state, MembershipKind::Favorite, authenticated_user.id, recipe_id).await
}

async fn remove_favorite_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    MembershipService::remove(
        &app_state.db_pool,
        MembershipKind::Favorite,
        authenticated_user.id,
        recipe_id,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_to_cart_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<(StatusCode, Json<RecipeShortResponse>), AppError> {
    add_membership(
        &app_state,
        MembershipKind::ShoppingCart,
        authenticated_user.id,
        recipe_id,
    )
    .await
}

async fn remove_from_cart_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    MembershipService::remove(
        &app_state.db_pool,
        MembershipKind::ShoppingCart,
        authenticated_user.id,
        recipe_id,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn download_shopping_cart_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let items = aggregate_shopping_list(&app_state.db_pool, authenticated_user.id).await?;
    let body = render_shopping_list(&items);

    Ok((
        [
            (header::CONTENT_TYPE, SHOPPING_LIST_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\""),
            ),
        ],
        body,
    ))
}

pub fn create_recipes_router() -> Router<Arc<AppState>> {
    let auth_layer = || axum_middleware::from_fn(require_auth);

    Router::new()
        .route(
            "/",
            get(list_recipes_handler)
                .merge(post(create_recipe_handler).route_layer(auth_layer())),
        )
        .route(
            "/download_shopping_cart",
            get(download_shopping_cart_handler).route_layer(auth_layer()),
        )
        .route(
            "/{id}",
            get(get_recipe_handler).merge(
                patch(update_recipe_handler)
                    .delete(delete_recipe_handler)
                    .route_layer(auth_layer()),
            ),
        )
        .route(
            "/{id}/favorite",
            post(add_favorite_handler)
                .delete(remove_favorite_handler)
                .route_layer(auth_layer()),
        )
        .route(
            "/{id}/shopping_cart",
            post(add_to_cart_handler)
                .delete(remove_from_cart_handler)
                .route_layer(auth_layer()),
        )
}
