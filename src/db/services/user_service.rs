use sea_orm::{DbConn, DbErr, EntityTrait, PaginatorTrait, QueryOrder};

use crate::db::entities::user;
use crate::db::models::AuthorSummary;
use crate::db::pagination::{Page, PageRequest};
use crate::db::services::FollowService;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    #[error("User not found: {0}")]
    NotFound(i32),
}

pub struct UserService;

impl UserService {
    pub async fn get(db: &DbConn, user_id: i32) -> Result<user::Model, UserError> {
        user::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or(UserError::NotFound(user_id))
    }

    /// Loads a user together with whether `viewer` follows them.
    pub async fn get_summary(
        db: &DbConn,
        user_id: i32,
        viewer: Option<i32>,
    ) -> Result<AuthorSummary, UserError> {
        let user = Self::get(db, user_id).await?;
        let mut summaries = Self::summarize(db, vec![user], viewer).await?;
        summaries.pop().ok_or(UserError::NotFound(user_id))
    }

    pub async fn list(
        db: &DbConn,
        viewer: Option<i32>,
        page: PageRequest,
    ) -> Result<Page<AuthorSummary>, UserError> {
        let paginator = user::Entity::find()
            .order_by_asc(user::Column::Username)
            .paginate(db, page.limit);
        let count = paginator.num_items().await?;
        let users = paginator.fetch_page(page.index()).await?;

        Ok(Page {
            items: Self::summarize(db, users, viewer).await?,
            count,
            request: page,
        })
    }

    async fn summarize(
        db: &DbConn,
        users: Vec<user::Model>,
        viewer: Option<i32>,
    ) -> Result<Vec<AuthorSummary>, DbErr> {
        let followed = match viewer {
            Some(viewer_id) => {
                let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
                FollowService::followed_among(db, viewer_id, &ids).await?
            }
            None => Default::default(),
        };

        Ok(users
            .into_iter()
            .map(|user| AuthorSummary {
                is_subscribed: followed.contains(&user.id),
                user,
            })
            .collect())
    }
}
