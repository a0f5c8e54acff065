use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect,
};

use crate::db::entities::{ingredient, recipe_ingredient, shopping_cart};
use crate::shopping_list::{IngredientLine, ShoppingCartSource};

#[async_trait]
impl ShoppingCartSource for DatabaseConnection {
    async fn cart_recipe_ids(&self, user_id: i32) -> Result<Vec<i32>, DbErr> {
        shopping_cart::Entity::find()
            .select_only()
            .column(shopping_cart::Column::RecipeId)
            .filter(shopping_cart::Column::UserId.eq(user_id))
            .into_tuple::<i32>()
            .all(self)
            .await
    }

    async fn ingredient_lines(&self, recipe_ids: &[i32]) -> Result<Vec<IngredientLine>, DbErr> {
        let rows: Vec<(String, String, i32)> = recipe_ingredient::Entity::find()
            .select_only()
            .column(ingredient::Column::Name)
            .column(ingredient::Column::MeasurementUnit)
            .column(recipe_ingredient::Column::Amount)
            .inner_join(ingredient::Entity)
            .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids.iter().copied()))
            .into_tuple()
            .all(self)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(name, measurement_unit, amount)| {
                IngredientLine::new(name, measurement_unit, i64::from(amount))
            })
            .collect())
    }
}
