use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{DbConn, DbErr, EntityTrait, QueryFilter, QueryOrder};

use crate::db::entities::{ingredient, tag};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    #[error("Tag not found: {0}")]
    TagNotFound(i32),
    #[error("Ingredient not found: {0}")]
    IngredientNotFound(i32),
}

pub struct TagService;

impl TagService {
    pub async fn list(db: &DbConn) -> Result<Vec<tag::Model>, CatalogError> {
        Ok(tag::Entity::find()
            .order_by_asc(tag::Column::Name)
            .all(db)
            .await?)
    }

    pub async fn get(db: &DbConn, tag_id: i32) -> Result<tag::Model, CatalogError> {
        tag::Entity::find_by_id(tag_id)
            .one(db)
            .await?
            .ok_or(CatalogError::TagNotFound(tag_id))
    }
}

pub struct IngredientService;

impl IngredientService {
    /// Ingredients whose name starts with `name_prefix`, ignoring case.
    ///
    /// The prefix is lowercased here and compared against `lower(name)`.
    /// Postgres folds any script; SQLite's `lower()` folds ASCII only, so
    /// there a non-ASCII prefix only matches names stored in lower case.
    pub async fn search(
        db: &DbConn,
        name_prefix: Option<&str>,
    ) -> Result<Vec<ingredient::Model>, CatalogError> {
        let mut query = ingredient::Entity::find()
            .order_by_asc(ingredient::Column::Name)
            .order_by_asc(ingredient::Column::MeasurementUnit);

        if let Some(prefix) = name_prefix.map(str::trim).filter(|p| !p.is_empty()) {
            let pattern = format!("{}%", escape_like(&prefix.to_lowercase()));
            let pattern = LikeExpr::new(pattern).escape(LIKE_ESCAPE);
            query = query.filter(
                Expr::expr(Func::lower(Expr::col((
                    ingredient::Entity,
                    ingredient::Column::Name,
                ))))
                .like(pattern),
            );
        }

        Ok(query.all(db).await?)
    }

    pub async fn get(db: &DbConn, ingredient_id: i32) -> Result<ingredient::Model, CatalogError> {
        ingredient::Entity::find_by_id(ingredient_id)
            .one(db)
            .await?
            .ok_or(CatalogError::IngredientNotFound(ingredient_id))
    }
}

const LIKE_ESCAPE: char = '\\';

// `%` and `_` typed by the user match literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}
