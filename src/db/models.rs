use serde::{Deserialize, Serialize};

use crate::db::entities::{ingredient, recipe, tag, user};

/// A user as seen by a (possibly anonymous) viewer.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorSummary {
    pub user: user::Model,
    /// Whether the viewer follows this user. Always `false` for anonymous viewers.
    pub is_subscribed: bool,
}

/// One ingredient line of a recipe with the ingredient resolved.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeIngredientLine {
    pub ingredient: ingredient::Model,
    pub amount: i32,
}

/// A recipe with everything both of its projections need.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetails {
    pub recipe: recipe::Model,
    pub author: AuthorSummary,
    pub tags: Vec<tag::Model>,
    pub ingredients: Vec<RecipeIngredientLine>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientAmount {
    pub ingredient_id: i32,
    pub amount: i32,
}

/// Everything needed to create a recipe or replace its contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeInput {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub tag_ids: Vec<i32>,
    pub ingredients: Vec<IngredientAmount>,
}

/// A followed author with a preview of their recipes.
#[derive(Debug, Clone, Serialize)]
pub struct Subscription {
    pub author: user::Model,
    /// Newest first, truncated to the requested limit.
    pub recipes: Vec<recipe::Model>,
    pub recipes_count: u64,
}
