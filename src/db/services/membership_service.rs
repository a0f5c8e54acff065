use std::collections::HashSet;
use std::fmt;

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbConn, DbErr, EntityTrait, QueryFilter, QuerySelect, Set,
};
use tracing::{debug, info};

use crate::db::entities::{favorite, recipe, shopping_cart};

/// The two per-user recipe sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipKind {
    Favorite,
    ShoppingCart,
}

impl fmt::Display for MembershipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipKind::Favorite => write!(f, "favorites"),
            MembershipKind::ShoppingCart => write!(f, "shopping cart"),
        }
    }
}

/// Outcome of an idempotent insert into a unique-pair set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    Added,
    AlreadyPresent,
}

#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    #[error("Recipe not found: {0}")]
    RecipeNotFound(i32),
    #[error("Recipe {recipe_id} is not in your {kind}")]
    NotPresent { kind: MembershipKind, recipe_id: i32 },
}

pub struct MembershipService;

impl MembershipService {
    async fn find_recipe(db: &DbConn, recipe_id: i32) -> Result<recipe::Model, MembershipError> {
        recipe::Entity::find_by_id(recipe_id)
            .one(db)
            .await?
            .ok_or(MembershipError::RecipeNotFound(recipe_id))
    }

    /// Adds `recipe_id` to the user's set.
    ///
    /// The insert is `ON CONFLICT DO NOTHING`, so a duplicate (including one
    /// lost to a concurrent insert) reports `AlreadyPresent` instead of failing.
    pub async fn add(
        db: &DbConn,
        kind: MembershipKind,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<(recipe::Model, MembershipChange), MembershipError> {
        let recipe = Self::find_recipe(db, recipe_id).await?;

        let inserted = match kind {
            MembershipKind::Favorite => {
                favorite::Entity::insert(favorite::ActiveModel {
                    user_id: Set(user_id),
                    recipe_id: Set(recipe_id),
                })
                .on_conflict(
                    OnConflict::columns([favorite::Column::UserId, favorite::Column::RecipeId])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(db)
                .await?
            }
            MembershipKind::ShoppingCart => {
                shopping_cart::Entity::insert(shopping_cart::ActiveModel {
                    user_id: Set(user_id),
                    recipe_id: Set(recipe_id),
                })
                .on_conflict(
                    OnConflict::columns([
                        shopping_cart::Column::UserId,
                        shopping_cart::Column::RecipeId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(db)
                .await?
            }
        };

        let change = if inserted > 0 {
            info!(user_id, recipe_id, %kind, "Recipe added.");
            MembershipChange::Added
        } else {
            debug!(user_id, recipe_id, %kind, "Recipe already present.");
            MembershipChange::AlreadyPresent
        };
        Ok((recipe, change))
    }

    pub async fn remove(
        db: &DbConn,
        kind: MembershipKind,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<(), MembershipError> {
        Self::find_recipe(db, recipe_id).await?;

        let rows_affected = match kind {
            MembershipKind::Favorite => {
                favorite::Entity::delete_many()
                    .filter(favorite::Column::UserId.eq(user_id))
                    .filter(favorite::Column::RecipeId.eq(recipe_id))
                    .exec(db)
                    .await?
                    .rows_affected
            }
            MembershipKind::ShoppingCart => {
                shopping_cart::Entity::delete_many()
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                    .exec(db)
                    .await?
                    .rows_affected
            }
        };

        if rows_affected == 0 {
            return Err(MembershipError::NotPresent { kind, recipe_id });
        }
        info!(user_id, recipe_id, %kind, "Recipe removed.");
        Ok(())
    }

    /// Which of `among` are in the user's set.
    pub async fn recipe_ids<C>(
        db: &C,
        kind: MembershipKind,
        user_id: i32,
        among: &[i32],
    ) -> Result<HashSet<i32>, DbErr>
    where
        C: ConnectionTrait,
    {
        if among.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i32> = match kind {
            MembershipKind::Favorite => {
                favorite::Entity::find()
                    .select_only()
                    .column(favorite::Column::RecipeId)
                    .filter(favorite::Column::UserId.eq(user_id))
                    .filter(favorite::Column::RecipeId.is_in(among.iter().copied()))
                    .into_tuple()
                    .all(db)
                    .await?
            }
            MembershipKind::ShoppingCart => {
                shopping_cart::Entity::find()
                    .select_only()
                    .column(shopping_cart::Column::RecipeId)
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .filter(shopping_cart::Column::RecipeId.is_in(among.iter().copied()))
                    .into_tuple()
                    .all(db)
                    .await?
            }
        };
        Ok(ids.into_iter().collect())
    }
}
