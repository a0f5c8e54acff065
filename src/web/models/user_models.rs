use serde::{Deserialize, Serialize};

use crate::db::models::{AuthorSummary, Subscription};
use crate::web::models::recipe_models::RecipeShortResponse;

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl From<AuthorSummary> for UserResponse {
    fn from(summary: AuthorSummary) -> Self {
        let user = summary.user;
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed: summary.is_subscribed,
        }
    }
}

/// A followed author: the user fields plus a preview of their recipes.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub author: UserResponse,
    pub recipes: Vec<RecipeShortResponse>,
    pub recipes_count: u64,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(subscription: Subscription) -> Self {
        Self {
            author: AuthorSummary {
                user: subscription.author,
                is_subscribed: true,
            }
            .into(),
            recipes: subscription
                .recipes
                .into_iter()
                .map(RecipeShortResponse::from)
                .collect(),
            recipes_count: subscription.recipes_count,
        }
    }
}

/// `?recipes_limit=` is kept as a string so a bad value becomes a 400 with a
/// readable message instead of an extractor rejection. The limit must fit a
/// `u32`, well inside what the database accepts for `LIMIT`.
#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionQuery {
    pub recipes_limit: Option<String>,
}

impl SubscriptionQuery {
    pub fn recipes_limit(&self) -> Result<Option<u64>, String> {
        match self.recipes_limit.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<u32>()
                .map(|limit| Some(u64::from(limit)))
                .map_err(|_| format!("Invalid value '{raw}' for parameter 'recipes_limit'")),
        }
    }
}
