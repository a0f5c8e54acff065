//! The `services` module is the data-access layer for the recipe domain.
//! Handlers work with these services and the entity models; all query
//! building stays here.
//!
//! Every service that takes a requester or viewer id receives it explicitly,
//! so they can be exercised without an HTTP request.

pub mod catalog_service;
pub mod follow_service;
pub mod membership_service;
pub mod recipe_service;
pub mod shopping_cart_service;
pub mod user_service;

pub use catalog_service::*;
pub use follow_service::*;
pub use membership_service::*;
pub use recipe_service::*;
pub use user_service::*;
