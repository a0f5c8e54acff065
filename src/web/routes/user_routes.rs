use axum::{
    Json, Router,
    extract::{Extension, OriginalUri, Path, Query, State},
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post},
};
use std::sync::Arc;

use crate::db::models::AuthorSummary;
use crate::db::pagination::{PageRequest, PaginationParams};
use crate::db::services::{FollowService, MembershipChange, UserService};
use crate::web::middleware::auth::require_auth;
use crate::web::models::user_models::{SubscriptionQuery, SubscriptionResponse, UserResponse};
use crate::web::models::{AuthenticatedUser, PaginatedResponse};
use crate::web::{AppError, AppState};

async fn list_users_handler(
    Extension(auth_user): Extension<Option<AuthenticatedUser>>,
    State(app_state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<UserResponse>>, AppError> {
    let page = PageRequest::from_params(&pagination, app_state.config.default_page_size)?;
    let users = UserService::list(&app_state.db_pool, auth_user.map(|u| u.id), page).await?;
    Ok(Json(PaginatedResponse::from_page(
        users.map(UserResponse::from),
        &uri,
    )))
}

async fn get_user_handler(
    Extension(auth_user): Extension<Option<AuthenticatedUser>>,
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    let summary =
        UserService::get_summary(&app_state.db_pool, user_id, auth_user.map(|u| u.id)).await?;
    Ok(Json(summary.into()))
}

async fn me_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<UserResponse>, AppError> {
    let user = UserService::get(&app_state.db_pool, authenticated_user.id).await?;
    Ok(Json(
        AuthorSummary {
            user,
            is_subscribed: false,
        }
        .into(),
    ))
}

async fn subscriptions_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<SubscriptionQuery>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<SubscriptionResponse>>, AppError> {
    let recipes_limit = query.recipes_limit().map_err(AppError::InvalidInput)?;
    let page = PageRequest::from_params(&pagination, app_state.config.default_page_size)?;

    let subscriptions = FollowService::subscriptions(
        &app_state.db_pool,
        authenticated_user.id,
        page,
        recipes_limit,
    )
    .await?;
    Ok(Json(PaginatedResponse::from_page(
        subscriptions.map(SubscriptionResponse::from),
        &uri,
    )))
}

async fn subscribe_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(author_id): Path<i32>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let (author, change) =
        FollowService::subscribe(&app_state.db_pool, authenticated_user.id, author_id).await?;
    let status = match change {
        MembershipChange::Added => StatusCode::CREATED,
        MembershipChange::AlreadyPresent => StatusCode::OK,
    };
    Ok((
        status,
        Json(
            AuthorSummary {
                user: author,
                is_subscribed: true,
            }
            .into(),
        ),
    ))
}

async fn unsubscribe_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(author_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    FollowService::unsubscribe(&app_state.db_pool, authenticated_user.id, author_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn create_users_router() -> Router<Arc<AppState>> {
    let auth_layer = || axum_middleware::from_fn(require_auth);

    Router::new()
        .route("/", get(list_users_handler))
        .route("/me", get(me_handler).route_layer(auth_layer()))
        .route(
            "/subscriptions",
            get(subscriptions_handler).route_layer(auth_layer()),
        )
        .route("/{id}", get(get_user_handler))
        .route(
            "/{id}/subscribe",
            post(subscribe_handler)
                .delete(unsubscribe_handler)
                .route_layer(auth_layer()),
        )
}
