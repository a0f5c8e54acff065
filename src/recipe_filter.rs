//! Recipe list filtering.
//!
//! Raw query-string values are parsed into a [`RecipeFilter`], which is then
//! applied to a base `Select` as extra `WHERE` clauses only. Applying a
//! filter never adds rows and never touches the base ordering.

use std::collections::BTreeSet;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QuerySelect, QueryTrait, Select};
use serde::Deserialize;
use thiserror::Error;

use crate::db::entities::{favorite, recipe, recipe_tag, shopping_cart, tag};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid value '{value}' for parameter '{name}'")]
    InvalidParameter { name: &'static str, value: String },
}

/// Query parameters as they arrive on `GET /api/recipes`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RecipeQueryParams {
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_favorited: Option<String>,
    pub is_in_shopping_cart: Option<String>,
}

/// Membership restriction against the requester's favorites or cart.
/// `true` keeps only member recipes, `false` drops them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipFilter {
    Favorited(bool),
    InShoppingCart(bool),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecipeFilter {
    pub author: Option<i32>,
    /// Tag slugs, deduplicated. A recipe matches if it carries any of them.
    pub tags: BTreeSet<String>,
    pub membership: Option<MembershipFilter>,
}

impl RecipeFilter {
    /// Parses raw parameters.
    ///
    /// Only one membership filter is honoured per call: when both
    /// `is_favorited` and `is_in_shopping_cart` are given, `is_favorited`
    /// wins and `is_in_shopping_cart` is ignored without being validated.
    /// Empty values count as absent.
    pub fn from_params(params: &RecipeQueryParams) -> Result<Self, FilterError> {
        let author = match non_empty(params.author.as_deref()) {
            Some(raw) => Some(raw.parse::<i32>().map_err(|_| FilterError::InvalidParameter {
                name: "author",
                value: raw.to_string(),
            })?),
            None => None,
        };

        let tags = params
            .tags
            .iter()
            .map(|slug| slug.trim())
            .filter(|slug| !slug.is_empty())
            .map(str::to_string)
            .collect();

        let membership = if let Some(raw) = non_empty(params.is_favorited.as_deref()) {
            Some(MembershipFilter::Favorited(parse_flag("is_favorited", raw)?))
        } else if let Some(raw) = non_empty(params.is_in_shopping_cart.as_deref()) {
            Some(MembershipFilter::InShoppingCart(parse_flag("is_in_shopping_cart", raw)?))
        } else {
            None
        };

        Ok(Self {
            author,
            tags,
            membership,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.author.is_none() && self.tags.is_empty() && self.membership.is_none()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `1` and `0` are the only accepted flag values. Any other integer, such as
/// `2`, is rejected as well rather than silently leaving the list unfiltered.
fn parse_flag(name: &'static str, raw: &str) -> Result<bool, FilterError> {
    match raw.parse::<i64>() {
        Ok(1) => Ok(true),
        Ok(0) => Ok(false),
        _ => Err(FilterError::InvalidParameter {
            name,
            value: raw.to_string(),
        }),
    }
}

/// Narrows `base` by `filter` on behalf of `requester`.
///
/// Tag and membership checks are `IN (subquery)` predicates on the recipe id,
/// so a recipe carrying several requested tags still appears once. Membership
/// filters are skipped for anonymous requesters.
pub fn filter_recipes(
    base: Select<recipe::Entity>,
    requester: Option<i32>,
    filter: &RecipeFilter,
) -> Select<recipe::Entity> {
    let mut query = base;

    if let Some(author_id) = filter.author {
        query = query.filter(recipe::Column::AuthorId.eq(author_id));
    }

    if !filter.tags.is_empty() {
        let tagged = recipe_tag::Entity::find()
            .select_only()
            .column(recipe_tag::Column::RecipeId)
            .inner_join(tag::Entity)
            .filter(tag::Column::Slug.is_in(filter.tags.iter().cloned()))
            .into_query();
        query = query.filter(recipe::Column::Id.in_subquery(tagged));
    }

    if let (Some(user_id), Some(membership)) = (requester, filter.membership) {
        let (members, keep) = match membership {
            MembershipFilter::Favorited(keep) => (
                favorite::Entity::find()
                    .select_only()
                    .column(favorite::Column::RecipeId)
                    .filter(favorite::Column::UserId.eq(user_id))
                    .into_query(),
                keep,
            ),
            MembershipFilter::InShoppingCart(keep) => (
                shopping_cart::Entity::find()
                    .select_only()
                    .column(shopping_cart::Column::RecipeId)
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .into_query(),
                keep,
            ),
        };
        query = if keep {
            query.filter(recipe::Column::Id.in_subquery(members))
        } else {
            query.filter(recipe::Column::Id.not_in_subquery(members))
        };
    }

    query
}
