use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbConn, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, SqlErr, TransactionTrait,
};
use tracing::{debug, info, warn};

use crate::db::entities::{ingredient, recipe, recipe_ingredient, recipe_tag, tag, user};
use crate::db::models::{AuthorSummary, RecipeDetails, RecipeIngredientLine, RecipeInput};
use crate::db::pagination::{Page, PageRequest};
use crate::db::services::{FollowService, MembershipKind, MembershipService};
use crate::recipe_filter::{RecipeFilter, filter_recipes};

pub const MAX_RECIPE_NAME_LEN: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    #[error("Recipe not found: {0}")]
    NotFound(i32),
    #[error("Only the author or an administrator may change this recipe")]
    Forbidden,
    #[error("Invalid recipe: {0}")]
    Validation(String),
    #[error("A recipe with the name '{0}' already exists.")]
    DuplicateName(String),
}

pub struct RecipeService;

impl RecipeService {
    /// All recipes, newest first. Ties on the timestamp fall back to id.
    pub fn base_query() -> Select<recipe::Entity> {
        recipe::Entity::find()
            .order_by_desc(recipe::Column::CreatedAt)
            .order_by_desc(recipe::Column::Id)
    }

    pub async fn list(
        db: &DbConn,
        requester: Option<i32>,
        filter: &RecipeFilter,
        page: PageRequest,
    ) -> Result<Page<RecipeDetails>, RecipeError> {
        let paginator = filter_recipes(Self::base_query(), requester, filter).paginate(db, page.limit);
        let count = paginator.num_items().await?;
        let recipes = paginator.fetch_page(page.index()).await?;
        debug!(?requester, ?filter, count, "Listed recipes.");

        Ok(Page {
            items: Self::load_details(db, recipes, requester).await?,
            count,
            request: page,
        })
    }

    pub async fn get(db: &DbConn, recipe_id: i32) -> Result<recipe::Model, RecipeError> {
        recipe::Entity::find_by_id(recipe_id)
            .one(db)
            .await?
            .ok_or(RecipeError::NotFound(recipe_id))
    }

    pub async fn get_details(
        db: &DbConn,
        recipe_id: i32,
        viewer: Option<i32>,
    ) -> Result<RecipeDetails, RecipeError> {
        let recipe = Self::get(db, recipe_id).await?;
        Self::load_details(db, vec![recipe], viewer)
            .await?
            .pop()
            .ok_or(RecipeError::NotFound(recipe_id))
    }

    /// Resolves tags, ingredient lines, authors and the viewer's flags for a
    /// batch of recipes, keeping the input order.
    pub async fn load_details<C>(
        db: &C,
        recipes: Vec<recipe::Model>,
        viewer: Option<i32>,
    ) -> Result<Vec<RecipeDetails>, DbErr>
    where
        C: ConnectionTrait,
    {
        if recipes.is_empty() {
            return Ok(Vec::new());
        }

        let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
        let author_ids: Vec<i32> = recipes
            .iter()
            .map(|r| r.author_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut tags_by_recipe: HashMap<i32, Vec<tag::Model>> = HashMap::new();
        let tag_links = recipe_tag::Entity::find()
            .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.iter().copied()))
            .find_also_related(tag::Entity)
            .all(db)
            .await?;
        for (link, tag) in tag_links {
            if let Some(tag) = tag {
                tags_by_recipe.entry(link.recipe_id).or_default().push(tag);
            }
        }
        for tags in tags_by_recipe.values_mut() {
            tags.sort_by(|a, b| a.name.cmp(&b.name));
        }

        let mut lines_by_recipe: HashMap<i32, Vec<RecipeIngredientLine>> = HashMap::new();
        let ingredient_links = recipe_ingredient::Entity::find()
            .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids.iter().copied()))
            .find_also_related(ingredient::Entity)
            .all(db)
            .await?;
        for (link, ingredient) in ingredient_links {
            if let Some(ingredient) = ingredient {
                lines_by_recipe
                    .entry(link.recipe_id)
                    .or_default()
                    .push(RecipeIngredientLine {
                        ingredient,
                        amount: link.amount,
                    });
            }
        }
        for lines in lines_by_recipe.values_mut() {
            lines.sort_by(|a, b| a.ingredient.name.cmp(&b.ingredient.name));
        }

        let authors: HashMap<i32, user::Model> = user::Entity::find()
            .filter(user::Column::Id.is_in(author_ids.iter().copied()))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let (favorited, in_cart, followed) = match viewer {
            Some(viewer_id) => (
                MembershipService::recipe_ids(db, MembershipKind::Favorite, viewer_id, &recipe_ids)
                    .await?,
                MembershipService::recipe_ids(db, MembershipKind::ShoppingCart, viewer_id, &recipe_ids)
                    .await?,
                FollowService::followed_among(db, viewer_id, &author_ids).await?,
            ),
            None => (HashSet::new(), HashSet::new(), HashSet::new()),
        };

        recipes
            .into_iter()
            .map(|recipe| {
                let author = authors.get(&recipe.author_id).cloned().ok_or_else(|| {
                    DbErr::RecordNotFound(format!(
                        "author {} of recipe {}",
                        recipe.author_id, recipe.id
                    ))
                })?;
                Ok(RecipeDetails {
                    author: AuthorSummary {
                        is_subscribed: followed.contains(&author.id),
                        user: author,
                    },
                    tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
                    ingredients: lines_by_recipe.remove(&recipe.id).unwrap_or_default(),
                    is_favorited: favorited.contains(&recipe.id),
                    is_in_shopping_cart: in_cart.contains(&recipe.id),
                    recipe,
                })
            })
            .collect()
    }

    pub async fn create(
        db: &DbConn,
        author_id: i32,
        input: RecipeInput,
    ) -> Result<RecipeDetails, RecipeError> {
        let input = validate(input)?;
        let txn = db.begin().await?;

        ensure_references_exist(&txn, &input).await?;
        ensure_name_available(&txn, author_id, &input.name, None).await?;

        let recipe = recipe::ActiveModel {
            author_id: Set(author_id),
            name: Set(input.name.clone()),
            image: Set(input.image.clone()),
            text: Set(input.text.clone()),
            cooking_time: Set(input.cooking_time),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| map_write_error(e, &input.name))?;

        replace_links(&txn, recipe.id, &input).await?;
        let details = Self::load_details(&txn, vec![recipe], Some(author_id))
            .await?
            .pop()
            .ok_or_else(|| RecipeError::Validation("recipe vanished during creation".to_string()))?;
        txn.commit().await?;

        info!(recipe_id = details.recipe.id, author_id, "Recipe created.");
        Ok(details)
    }

    /// Replaces a recipe's fields, tags and ingredient lines.
    pub async fn update(
        db: &DbConn,
        recipe_id: i32,
        user_id: i32,
        input: RecipeInput,
    ) -> Result<RecipeDetails, RecipeError> {
        let txn = db.begin().await?;

        let recipe = recipe::Entity::find_by_id(recipe_id)
            .one(&txn)
            .await?
            .ok_or(RecipeError::NotFound(recipe_id))?;
        ensure_can_modify(&txn, &recipe, user_id).await?;
        let input = validate(input)?;
        ensure_references_exist(&txn, &input).await?;
        ensure_name_available(&txn, recipe.author_id, &input.name, Some(recipe.id)).await?;

        let mut active: recipe::ActiveModel = recipe.into();
        active.name = Set(input.name.clone());
        active.image = Set(input.image.clone());
        active.text = Set(input.text.clone());
        active.cooking_time = Set(input.cooking_time);
        let recipe = active
            .update(&txn)
            .await
            .map_err(|e| map_write_error(e, &input.name))?;

        replace_links(&txn, recipe.id, &input).await?;
        let details = Self::load_details(&txn, vec![recipe], Some(user_id))
            .await?
            .pop()
            .ok_or(RecipeError::NotFound(recipe_id))?;
        txn.commit().await?;

        info!(recipe_id, user_id, "Recipe updated.");
        Ok(details)
    }

    /// Deletes a recipe. Tag and ingredient links, favorites and cart entries
    /// go with it through `ON DELETE CASCADE`.
    pub async fn delete(db: &DbConn, recipe_id: i32, user_id: i32) -> Result<(), RecipeError> {
        let recipe = Self::get(db, recipe_id).await?;
        ensure_can_modify(db, &recipe, user_id).await?;

        recipe.delete(db).await?;
        info!(recipe_id, user_id, "Recipe deleted.");
        Ok(())
    }
}

fn validate(mut input: RecipeInput) -> Result<RecipeInput, RecipeError> {
    input.name = input.name.trim().to_string();
    if input.name.is_empty() {
        return Err(RecipeError::Validation("name must not be empty".to_string()));
    }
    if input.name.chars().count() > MAX_RECIPE_NAME_LEN {
        return Err(RecipeError::Validation(format!(
            "name must be at most {MAX_RECIPE_NAME_LEN} characters"
        )));
    }
    if input.image.trim().is_empty() {
        return Err(RecipeError::Validation("image must not be empty".to_string()));
    }
    if input.text.trim().is_empty() {
        return Err(RecipeError::Validation("text must not be empty".to_string()));
    }
    if input.cooking_time < 1 {
        return Err(RecipeError::Validation(
            "cooking_time must be at least 1 minute".to_string(),
        ));
    }
    if input.ingredients.is_empty() {
        return Err(RecipeError::Validation(
            "at least one ingredient is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for line in &input.ingredients {
        if line.amount < 1 {
            return Err(RecipeError::Validation(format!(
                "amount of ingredient {} must be at least 1",
                line.ingredient_id
            )));
        }
        if !seen.insert(line.ingredient_id) {
            return Err(RecipeError::Validation(format!(
                "ingredient {} is listed more than once",
                line.ingredient_id
            )));
        }
    }

    // Tags are a set.
    let mut seen_tags = HashSet::new();
    input.tag_ids.retain(|id| seen_tags.insert(*id));

    Ok(input)
}

async fn ensure_references_exist<C>(db: &C, input: &RecipeInput) -> Result<(), RecipeError>
where
    C: ConnectionTrait,
{
    if !input.tag_ids.is_empty() {
        let found: HashSet<i32> = tag::Entity::find()
            .select_only()
            .column(tag::Column::Id)
            .filter(tag::Column::Id.is_in(input.tag_ids.iter().copied()))
            .into_tuple::<i32>()
            .all(db)
            .await?
            .into_iter()
            .collect();
        if let Some(missing) = input.tag_ids.iter().find(|id| !found.contains(id)) {
            return Err(RecipeError::Validation(format!("tag {missing} does not exist")));
        }
    }

    let ingredient_ids: Vec<i32> = input.ingredients.iter().map(|l| l.ingredient_id).collect();
    let found: HashSet<i32> = ingredient::Entity::find()
        .select_only()
        .column(ingredient::Column::Id)
        .filter(ingredient::Column::Id.is_in(ingredient_ids.iter().copied()))
        .into_tuple::<i32>()
        .all(db)
        .await?
        .into_iter()
        .collect();
    if let Some(missing) = ingredient_ids.iter().find(|id| !found.contains(id)) {
        return Err(RecipeError::Validation(format!(
            "ingredient {missing} does not exist"
        )));
    }
    Ok(())
}

async fn ensure_name_available<C>(
    db: &C,
    author_id: i32,
    name: &str,
    except_recipe: Option<i32>,
) -> Result<(), RecipeError>
where
    C: ConnectionTrait,
{
    let mut query = recipe::Entity::find()
        .filter(recipe::Column::AuthorId.eq(author_id))
        .filter(recipe::Column::Name.eq(name));
    if let Some(recipe_id) = except_recipe {
        query = query.filter(recipe::Column::Id.ne(recipe_id));
    }

    if query.one(db).await?.is_some() {
        return Err(RecipeError::DuplicateName(name.to_string()));
    }
    Ok(())
}

async fn ensure_can_modify<C>(db: &C, recipe: &recipe::Model, user_id: i32) -> Result<(), RecipeError>
where
    C: ConnectionTrait,
{
    if recipe.author_id == user_id {
        return Ok(());
    }

    let is_admin = user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .is_some_and(|u| u.is_admin());
    if is_admin {
        return Ok(());
    }

    warn!(recipe_id = recipe.id, user_id, "Refused to modify another user's recipe.");
    Err(RecipeError::Forbidden)
}

async fn replace_links<C>(db: &C, recipe_id: i32, input: &RecipeInput) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;
    if !input.tag_ids.is_empty() {
        recipe_tag::Entity::insert_many(input.tag_ids.iter().map(|tag_id| recipe_tag::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(*tag_id),
        }))
        .exec_without_returning(db)
        .await?;
    }

    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;
    recipe_ingredient::Entity::insert_many(input.ingredients.iter().map(|line| {
        recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(line.ingredient_id),
            amount: Set(line.amount),
        }
    }))
    .exec_without_returning(db)
    .await?;

    Ok(())
}

fn map_write_error(err: DbErr, name: &str) -> RecipeError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => RecipeError::DuplicateName(name.to_string()),
        _ => RecipeError::DbErr(err),
    }
}
