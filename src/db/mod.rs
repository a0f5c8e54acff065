pub mod entities;
pub mod models;
pub mod pagination;
pub mod schema;
pub mod services;
