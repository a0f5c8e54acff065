//! Shopping-list aggregation.
//!
//! Ingredient lines of every recipe in a user's cart are merged by the
//! `(name, measurement_unit)` pair, summed, sorted by name and rendered into
//! the plain-text document users download.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sea_orm::DbErr;
use serde::Serialize;
use tracing::debug;

pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";
pub const SHOPPING_LIST_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

const HEADER_TITLE: &str = "\"Продуктовый помощник\"";
const HEADER_ATTRIBUTION: &str = "Бутырин Артемий - 2022";

/// One `(ingredient, unit, amount)` requirement attached to one recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

impl IngredientLine {
    pub fn new(name: impl Into<String>, measurement_unit: impl Into<String>, amount: i64) -> Self {
        Self {
            name: name.into(),
            measurement_unit: measurement_unit.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

/// Read side the aggregator needs from the store.
#[async_trait]
pub trait ShoppingCartSource: Send + Sync {
    /// Recipes currently in the user's cart.
    async fn cart_recipe_ids(&self, user_id: i32) -> Result<Vec<i32>, DbErr>;

    /// Every ingredient line belonging to the given recipes.
    async fn ingredient_lines(&self, recipe_ids: &[i32]) -> Result<Vec<IngredientLine>, DbErr>;
}

/// Groups lines by `(name, unit)` and sums their amounts.
///
/// The result is ordered by name in code-point order; lines sharing a name
/// but not a unit stay separate and are ordered by unit.
pub fn aggregate_lines<I>(lines: I) -> Vec<ShoppingListItem>
where
    I: IntoIterator<Item = IngredientLine>,
{
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for line in lines {
        *totals
            .entry((line.name, line.measurement_unit))
            .or_insert(0) += line.amount;
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), total_amount)| ShoppingListItem {
            name,
            measurement_unit,
            total_amount,
        })
        .collect()
}

/// Builds the aggregated shopping list for `user_id`.
///
/// An empty cart yields an empty list. Store failures are propagated as-is.
pub async fn aggregate_shopping_list<S>(
    source: &S,
    user_id: i32,
) -> Result<Vec<ShoppingListItem>, DbErr>
where
    S: ShoppingCartSource + ?Sized,
{
    let recipe_ids = source.cart_recipe_ids(user_id).await?;
    if recipe_ids.is_empty() {
        debug!(user_id, "Shopping cart is empty.");
        return Ok(Vec::new());
    }

    let lines = source.ingredient_lines(&recipe_ids).await?;
    let items = aggregate_lines(lines);
    debug!(
        user_id,
        recipe_count = recipe_ids.len(),
        item_count = items.len(),
        "Aggregated shopping list."
    );
    Ok(items)
}

/// Renders the downloadable document: a two-line header, a blank line, then
/// one `name - amount (unit)` line per item.
pub fn render_shopping_list(items: &[ShoppingListItem]) -> String {
    let mut document = format!("{HEADER_TITLE}\n{HEADER_ATTRIBUTION}\n\n");
    for item in items {
        document.push_str(&format!(
            "{} - {} ({})\n",
            item.name, item.total_amount, item.measurement_unit
        ));
    }
    document
}
