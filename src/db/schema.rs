//! Schema bootstrap.
//!
//! Tables are created from the entity definitions (foreign keys with
//! `ON DELETE CASCADE` come from their `belongs_to` relations), followed by
//! the composite unique indexes the entities cannot express.

use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Schema};
use tracing::info;

use crate::db::entities::{
    favorite, follow, ingredient, recipe, recipe_ingredient, recipe_tag, shopping_cart, tag, user,
};

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;
    Ok(())
}

fn unique_indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .name("ux_ingredients_name_unit")
            .table(ingredient::Entity)
            .col(ingredient::Column::Name)
            .col(ingredient::Column::MeasurementUnit)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("ux_recipes_author_name")
            .table(recipe::Entity)
            .col(recipe::Column::AuthorId)
            .col(recipe::Column::Name)
            .unique()
            .if_not_exists()
            .to_owned(),
    ]
}

/// Creates every table and index that does not exist yet.
pub async fn create_schema<C>(db: &C) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let schema = Schema::new(db.get_database_backend());

    // Referenced tables first.
    create_table(db, &schema, user::Entity).await?;
    create_table(db, &schema, tag::Entity).await?;
    create_table(db, &schema, ingredient::Entity).await?;
    create_table(db, &schema, recipe::Entity).await?;
    create_table(db, &schema, recipe_tag::Entity).await?;
    create_table(db, &schema, recipe_ingredient::Entity).await?;
    create_table(db, &schema, favorite::Entity).await?;
    create_table(db, &schema, shopping_cart::Entity).await?;
    create_table(db, &schema, follow::Entity).await?;

    let backend = db.get_database_backend();
    for index in unique_indexes() {
        db.execute(backend.build(&index)).await?;
    }

    info!("Database schema is up to date.");
    Ok(())
}
