mod common;

use common::*;
use foodgram_backend::db::services::{
    MembershipChange, MembershipError, MembershipKind, MembershipService, RecipeService,
};
use foodgram_backend::shopping_list::{
    ShoppingListItem, aggregate_shopping_list, render_shopping_list,
};

fn item(name: &str, unit: &str, total: i64) -> ShoppingListItem {
    ShoppingListItem {
        name: name.to_string(),
        measurement_unit: unit.to_string(),
        total_amount: total,
    }
}

#[tokio::test]
async fn test_cart_ingredients_are_summed_across_recipes() {
    let db = setup_db().await;
    let cook = create_user(&db, "cook").await;
    let shopper = create_user(&db, "shopper").await;
    let flour = create_ingredient(&db, "Flour", "g").await.id;
    let egg = create_ingredient(&db, "Egg", "pcs").await.id;

    let pancakes = create_recipe(&db, cook.id, "Pancakes", &[], &[(flour, 200), (egg, 2)]).await;
    let bread = create_recipe(&db, cook.id, "Bread", &[], &[(flour, 300)]).await;
    // In nobody's cart, must not leak in.
    create_recipe(&db, cook.id, "Omelette", &[], &[(egg, 3)]).await;

    for recipe_id in [pancakes.id, bread.id] {
        MembershipService::add(&db, MembershipKind::ShoppingCart, shopper.id, recipe_id)
            .await
            .unwrap();
    }

    let items = aggregate_shopping_list(&db, shopper.id).await.unwrap();
    assert_eq!(items, vec![item("Egg", "pcs", 2), item("Flour", "g", 500)]);

    let document = render_shopping_list(&items);
    assert!(document.ends_with("\n\nEgg - 2 (pcs)\nFlour - 500 (g)\n"));
}

#[tokio::test]
async fn test_same_name_different_units_stay_apart() {
    let db = setup_db().await;
    let cook = create_user(&db, "cook").await;
    let sugar_g = create_ingredient(&db, "сахар", "г").await.id;
    let sugar_spoon = create_ingredient(&db, "сахар", "ст. л.").await.id;

    let tea = create_recipe(&db, cook.id, "Чай", &[], &[(sugar_spoon, 2)]).await;
    let cake = create_recipe(&db, cook.id, "Торт", &[], &[(sugar_g, 150)]).await;
    for recipe in [&tea, &cake] {
        MembershipService::add(&db, MembershipKind::ShoppingCart, cook.id, recipe.id)
            .await
            .unwrap();
    }

    let items = aggregate_shopping_list(&db, cook.id).await.unwrap();
    assert_eq!(
        items,
        vec![item("сахар", "г", 150), item("сахар", "ст. л.", 2)]
    );
}

#[tokio::test]
async fn test_empty_cart_renders_header_only() {
    let db = setup_db().await;
    let shopper = create_user(&db, "shopper").await;

    let items = aggregate_shopping_list(&db, shopper.id).await.unwrap();
    assert!(items.is_empty());
    assert_eq!(
        render_shopping_list(&items),
        "\"Продуктовый помощник\"\nБутырин Артемий - 2022\n\n"
    );
}

#[tokio::test]
async fn test_cart_membership_is_a_set() {
    let db = setup_db().await;
    let cook = create_user(&db, "cook").await;
    let flour = create_ingredient(&db, "Flour", "g").await.id;
    let bread = create_recipe(&db, cook.id, "Bread", &[], &[(flour, 300)]).await;

    let (_, first) = MembershipService::add(&db, MembershipKind::ShoppingCart, cook.id, bread.id)
        .await
        .unwrap();
    let (_, second) = MembershipService::add(&db, MembershipKind::ShoppingCart, cook.id, bread.id)
        .await
        .unwrap();
    assert_eq!(first, MembershipChange::Added);
    assert_eq!(second, MembershipChange::AlreadyPresent);

    // Added twice, counted once.
    let items = aggregate_shopping_list(&db, cook.id).await.unwrap();
    assert_eq!(items, vec![item("Flour", "g", 300)]);

    MembershipService::remove(&db, MembershipKind::ShoppingCart, cook.id, bread.id)
        .await
        .unwrap();
    let err = MembershipService::remove(&db, MembershipKind::ShoppingCart, cook.id, bread.id)
        .await
        .unwrap_err();
    assert!(matches!(err, MembershipError::NotPresent { .. }));

    let missing = MembershipService::add(&db, MembershipKind::ShoppingCart, cook.id, 9999)
        .await
        .unwrap_err();
    assert!(matches!(missing, MembershipError::RecipeNotFound(9999)));
}

#[tokio::test]
async fn test_deleted_recipe_leaves_the_cart() {
    let db = setup_db().await;
    let cook = create_user(&db, "cook").await;
    let shopper = create_user(&db, "shopper").await;
    let flour = create_ingredient(&db, "Flour", "g").await.id;
    let bread = create_recipe(&db, cook.id, "Bread", &[], &[(flour, 300)]).await;

    MembershipService::add(&db, MembershipKind::ShoppingCart, shopper.id, bread.id)
        .await
        .unwrap();
    RecipeService::delete(&db, bread.id, cook.id).await.unwrap();

    let items = aggregate_shopping_list(&db, shopper.id).await.unwrap();
    assert!(items.is_empty());
}
