//! Recipe projections.
//!
//! A recipe leaves the service layer as a [`RecipeDetails`] aggregate and is
//! projected into one of three wire shapes: the full read shape, the write
//! shape clients send back, and the short card used in lists of references.

use serde::{Deserialize, Serialize};

use crate::db::entities::recipe;
use crate::db::models::{IngredientAmount, RecipeDetails, RecipeInput};
use crate::web::models::catalog_models::TagResponse;
use crate::web::models::user_models::UserResponse;

#[derive(Debug, Clone, Serialize)]
pub struct RecipeIngredientResponse {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeReadResponse {
    pub id: i32,
    pub tags: Vec<TagResponse>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientAmountPayload {
    pub id: i32,
    pub amount: i32,
}

/// Body of `POST /api/recipes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeWritePayload {
    #[serde(default)]
    pub tags: Vec<i32>,
    pub ingredients: Vec<IngredientAmountPayload>,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

impl From<RecipeWritePayload> for RecipeInput {
    fn from(payload: RecipeWritePayload) -> Self {
        RecipeInput {
            name: payload.name,
            image: payload.image,
            text: payload.text,
            cooking_time: payload.cooking_time,
            tag_ids: payload.tags,
            ingredients: payload
                .ingredients
                .into_iter()
                .map(|line| IngredientAmount {
                    ingredient_id: line.id,
                    amount: line.amount,
                })
                .collect(),
        }
    }
}

/// Body of `PATCH /api/recipes/{id}`. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipePatchPayload {
    pub tags: Option<Vec<i32>>,
    pub ingredients: Option<Vec<IngredientAmountPayload>>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

impl RecipePatchPayload {
    pub fn merge_over(self, current: RecipeWritePayload) -> RecipeWritePayload {
        RecipeWritePayload {
            tags: self.tags.unwrap_or(current.tags),
            ingredients: self.ingredients.unwrap_or(current.ingredients),
            name: self.name.unwrap_or(current.name),
            image: self.image.unwrap_or(current.image),
            text: self.text.unwrap_or(current.text),
            cooking_time: self.cooking_time.unwrap_or(current.cooking_time),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeShortResponse {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<recipe::Model> for RecipeShortResponse {
    fn from(recipe: recipe::Model) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

pub fn read_projection(details: RecipeDetails) -> RecipeReadResponse {
    RecipeReadResponse {
        id: details.recipe.id,
        tags: details.tags.into_iter().map(TagResponse::from).collect(),
        author: details.author.into(),
        ingredients: details
            .ingredients
            .into_iter()
            .map(|line| RecipeIngredientResponse {
                id: line.ingredient.id,
                name: line.ingredient.name,
                measurement_unit: line.ingredient.measurement_unit,
                amount: line.amount,
            })
            .collect(),
        name: details.recipe.name,
        image: details.recipe.image,
        text: details.recipe.text,
        cooking_time: details.recipe.cooking_time,
        is_favorited: details.is_favorited,
        is_in_shopping_cart: details.is_in_shopping_cart,
    }
}

pub fn write_projection(details: &RecipeDetails) -> RecipeWritePayload {
    RecipeWritePayload {
        tags: details.tags.iter().map(|tag| tag.id).collect(),
        ingredients: details
            .ingredients
            .iter()
            .map(|line| IngredientAmountPayload {
                id: line.ingredient.id,
                amount: line.amount,
            })
            .collect(),
        name: details.recipe.name.clone(),
        image: details.recipe.image.clone(),
        text: details.recipe.text.clone(),
        cooking_time: details.recipe.cooking_time,
    }
}
