pub mod db;
pub mod recipe_filter;
pub mod server;
pub mod shopping_list;
pub mod web;
