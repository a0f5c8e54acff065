use std::collections::HashSet;

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbConn, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, QueryTrait, Set,
};
use tracing::{debug, info};

use crate::db::entities::{follow, recipe, user};
use crate::db::models::Subscription;
use crate::db::pagination::{Page, PageRequest};
use crate::db::services::MembershipChange;

#[derive(Debug, thiserror::Error)]
pub enum FollowError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    #[error("User not found: {0}")]
    UserNotFound(i32),
    #[error("You cannot subscribe to yourself")]
    SelfFollow,
    #[error("You are not subscribed to user {0}")]
    NotFollowing(i32),
}

pub struct FollowService;

impl FollowService {
    /// `user_id` starts following `author_id`. Following twice is not an error.
    pub async fn subscribe(
        db: &DbConn,
        user_id: i32,
        author_id: i32,
    ) -> Result<(user::Model, MembershipChange), FollowError> {
        if user_id == author_id {
            return Err(FollowError::SelfFollow);
        }
        let author = user::Entity::find_by_id(author_id)
            .one(db)
            .await?
            .ok_or(FollowError::UserNotFound(author_id))?;

        let inserted = follow::Entity::insert(follow::ActiveModel {
            user_id: Set(user_id),
            author_id: Set(author_id),
        })
        .on_conflict(
            OnConflict::columns([follow::Column::UserId, follow::Column::AuthorId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

        if inserted > 0 {
            info!(user_id, author_id, "Subscribed to author.");
            Ok((author, MembershipChange::Added))
        } else {
            debug!(user_id, author_id, "Already subscribed to author.");
            Ok((author, MembershipChange::AlreadyPresent))
        }
    }

    pub async fn unsubscribe(db: &DbConn, user_id: i32, author_id: i32) -> Result<(), FollowError> {
        if user::Entity::find_by_id(author_id).one(db).await?.is_none() {
            return Err(FollowError::UserNotFound(author_id));
        }

        let result = follow::Entity::delete_many()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(FollowError::NotFollowing(author_id));
        }
        info!(user_id, author_id, "Unsubscribed from author.");
        Ok(())
    }

    /// Which of `author_ids` the user follows.
    pub async fn followed_among<C>(
        db: &C,
        user_id: i32,
        author_ids: &[i32],
    ) -> Result<HashSet<i32>, DbErr>
    where
        C: ConnectionTrait,
    {
        if author_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i32> = follow::Entity::find()
            .select_only()
            .column(follow::Column::AuthorId)
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.is_in(author_ids.iter().copied()))
            .into_tuple()
            .all(db)
            .await?;
        Ok(ids.into_iter().collect())
    }

    /// Authors the user follows, by username, each with their newest recipes.
    pub async fn subscriptions(
        db: &DbConn,
        user_id: i32,
        page: PageRequest,
        recipes_limit: Option<u64>,
    ) -> Result<Page<Subscription>, FollowError> {
        let followed = follow::Entity::find()
            .select_only()
            .column(follow::Column::AuthorId)
            .filter(follow::Column::UserId.eq(user_id))
            .into_query();

        let paginator = user::Entity::find()
            .filter(user::Column::Id.in_subquery(followed))
            .order_by_asc(user::Column::Username)
            .paginate(db, page.limit);
        let count = paginator.num_items().await?;
        let authors = paginator.fetch_page(page.index()).await?;

        let mut items = Vec::with_capacity(authors.len());
        for author in authors {
            let by_author = recipe::Entity::find()
                .filter(recipe::Column::AuthorId.eq(author.id))
                .order_by_desc(recipe::Column::CreatedAt)
                .order_by_desc(recipe::Column::Id);

            let recipes_count = by_author.clone().count(db).await?;
            let recipes = match recipes_limit {
                Some(limit) => by_author.limit(limit).all(db).await?,
                None => by_author.all(db).await?,
            };

            items.push(Subscription {
                author,
                recipes,
                recipes_count,
            });
        }

        Ok(Page {
            items,
            count,
            request: page,
        })
    }
}
