use axum::http::Uri;
use serde::{Deserialize, Serialize};

use crate::db::pagination::Page;

pub mod catalog_models;
pub mod recipe_models;
pub mod user_models;

// JWT Claims structure. Tokens are issued elsewhere; this service only verifies them.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // username
    pub user_id: i32,
    pub exp: usize,
}

/// Struct to hold authenticated user details, to be passed as a request extension.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub username: String,
}

/// `{count, next, previous, results}` envelope for list endpoints.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> PaginatedResponse<T> {
    /// `uri` is the request URI; `next`/`previous` are built from it with the
    /// `page` parameter replaced.
    pub fn from_page(page: Page<T>, uri: &Uri) -> Self {
        let next = page
            .has_next()
            .then(|| page_link(uri, page.request.page + 1));
        let previous = page
            .has_previous()
            .then(|| page_link(uri, page.request.page - 1));

        Self {
            count: page.count,
            next,
            previous,
            results: page.items,
        }
    }
}

fn page_link(uri: &Uri, page: u64) -> String {
    let page_pair = format!("page={page}");
    let mut pairs: Vec<&str> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty() && *pair != "page" && !pair.starts_with("page="))
        .collect();
    pairs.push(&page_pair);
    format!("{}?{}", uri.path(), pairs.join("&"))
}
