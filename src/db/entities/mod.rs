//! SeaORM entities mapping the recipe tables.
//!
//! Every association (tags, ingredient lines, favorites, cart, follows) is its own
//! entity with a composite primary key rather than an embedded collection.

pub mod user;
pub mod follow;
pub mod tag;
pub mod ingredient;
pub mod recipe;
pub mod recipe_tag;
pub mod recipe_ingredient;
pub mod favorite;
pub mod shopping_cart;
