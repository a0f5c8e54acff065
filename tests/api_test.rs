mod common;

use axum::http::{Method, StatusCode, header};
use serde_json::json;

use common::*;
use foodgram_backend::db::entities::user;
use foodgram_backend::db::services::{MembershipKind, MembershipService};

#[tokio::test]
async fn test_health_check() {
    let db = setup_db().await;
    let app = test_router(&db);

    let response = send(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "OK");
}

#[tokio::test]
async fn test_download_shopping_cart() {
    let db = setup_db().await;
    let shopper = create_user(&db, "shopper").await;
    let flour = create_ingredient(&db, "Flour", "g").await.id;
    let egg = create_ingredient(&db, "Egg", "pcs").await.id;
    let pancakes = create_recipe(&db, shopper.id, "Pancakes", &[], &[(flour, 200), (egg, 2)]).await;
    let bread = create_recipe(&db, shopper.id, "Bread", &[], &[(flour, 300)]).await;
    for recipe in [&pancakes, &bread] {
        MembershipService::add(&db, MembershipKind::ShoppingCart, shopper.id, recipe.id)
            .await
            .unwrap();
    }
    let app = test_router(&db);

    let response = send(
        &app,
        Method::GET,
        "/api/recipes/download_shopping_cart",
        Some(&token_for(&shopper)),
        None,
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert_eq!(
        response.headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"shopping_list.txt\""
    );
    assert_eq!(
        response.text(),
        "\"Продуктовый помощник\"\nБутырин Артемий - 2022\n\nEgg - 2 (pcs)\nFlour - 500 (g)\n"
    );
}

#[tokio::test]
async fn test_protected_routes_need_a_token() {
    let db = setup_db().await;
    let app = test_router(&db);

    for uri in ["/api/recipes/download_shopping_cart", "/api/users/me"] {
        let response = send(&app, Method::GET, uri, None, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn test_invalid_token_is_rejected_even_on_public_routes() {
    let db = setup_db().await;
    let app = test_router(&db);

    let response = send(&app, Method::GET, "/api/recipes", Some("not-a-jwt"), None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.json()["error"].is_string());
}

#[tokio::test]
async fn test_bad_filter_flag_is_a_bad_request() {
    let db = setup_db().await;
    let app = test_router(&db);

    for uri in [
        "/api/recipes?is_favorited=abc",
        "/api/recipes?is_in_shopping_cart=2",
        "/api/recipes?author=me",
    ] {
        let response = send(&app, Method::GET, uri, None, None).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_recipe_list_with_repeated_tags_and_pagination() {
    let db = setup_db().await;
    let cook = create_user(&db, "cook").await;
    let lunch = create_tag(&db, "Обед", "lunch").await.id;
    let dinner = create_tag(&db, "Ужин", "dinner").await.id;
    let rice = create_ingredient(&db, "рис", "г").await.id;
    create_recipe(&db, cook.id, "Plov", &[lunch, dinner], &[(rice, 300)]).await;
    create_recipe(&db, cook.id, "Risotto", &[dinner], &[(rice, 200)]).await;
    create_recipe(&db, cook.id, "Porridge", &[], &[(rice, 50)]).await;
    let app = test_router(&db);

    let response = send(
        &app,
        Method::GET,
        "/api/recipes?tags=lunch&tags=dinner&limit=1",
        None,
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"][0]["name"], "Risotto");
    assert_eq!(body["results"][0]["is_favorited"], false);
    assert_eq!(
        body["next"],
        "/api/recipes?tags=lunch&tags=dinner&limit=1&page=2"
    );
    assert!(body["previous"].is_null());
}

#[tokio::test]
async fn test_page_past_the_end_is_an_empty_page() {
    let db = setup_db().await;
    let reader = create_user(&db, "reader").await;
    let cook = create_user(&db, "cook").await;
    let rice = create_ingredient(&db, "рис", "г").await.id;
    create_recipe(&db, cook.id, "Plov", &[], &[(rice, 300)]).await;
    let app = test_router(&db);
    let token = token_for(&reader);

    for uri in [
        "/api/recipes?page=18446744073709551615",
        "/api/recipes?page=18446744073709551615&limit=100",
        "/api/users?page=99999999999999999999999",
        "/api/users/subscriptions?page=18446744073709551615",
    ] {
        let response = send(&app, Method::GET, uri, Some(&token), None).await;
        assert_eq!(response.status, StatusCode::OK, "{uri}");
        let body = response.json();
        assert_eq!(body["results"].as_array().map(Vec::len), Some(0), "{uri}");
        assert!(body["next"].is_null(), "{uri}");
        assert!(body["previous"].is_string(), "{uri}");
    }

    let recipes = send(&app, Method::GET, "/api/recipes?page=18446744073709551615", None, None).await;
    assert_eq!(recipes.json()["count"], 1);
}

#[tokio::test]
async fn test_malformed_pagination_is_a_json_bad_request() {
    let db = setup_db().await;
    let reader = create_user(&db, "reader").await;
    let app = test_router(&db);
    let token = token_for(&reader);

    for uri in [
        "/api/recipes?page=two",
        "/api/recipes?limit=-1",
        "/api/users?page=1.5",
        "/api/users/subscriptions?limit=ten",
    ] {
        let response = send(&app, Method::GET, uri, Some(&token), None).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{uri}");
        let error = response.json()["error"].as_str().map(str::to_string);
        assert!(error.is_some_and(|msg| msg.starts_with("Invalid value")), "{uri}");
    }
}

#[tokio::test]
async fn test_favorite_add_twice_then_remove_twice() {
    let db = setup_db().await;
    let cook = create_user(&db, "cook").await;
    let fan = create_user(&db, "fan").await;
    let rice = create_ingredient(&db, "рис", "г").await.id;
    let plov = create_recipe(&db, cook.id, "Plov", &[], &[(rice, 300)]).await;
    let app = test_router(&db);
    let token = token_for(&fan);
    let uri = format!("/api/recipes/{}/favorite", plov.id);

    let first = send(&app, Method::POST, &uri, Some(&token), None).await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.json(), json!({
        "id": plov.id,
        "name": "Plov",
        "image": plov.image,
        "cooking_time": 15,
    }));

    let again = send(&app, Method::POST, &uri, Some(&token), None).await;
    assert_eq!(again.status, StatusCode::OK);

    let detail = send(&app, Method::GET, &format!("/api/recipes/{}", plov.id), Some(&token), None).await;
    assert_eq!(detail.json()["is_favorited"], true);

    let removed = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);
    let not_there = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(not_there.status, StatusCode::BAD_REQUEST);

    let unknown = send(&app, Method::POST, "/api/recipes/9999/favorite", Some(&token), None).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_recipe_validation_and_conflict() {
    let db = setup_db().await;
    let cook = create_user(&db, "cook").await;
    let lunch = create_tag(&db, "Обед", "lunch").await.id;
    let rice = create_ingredient(&db, "рис", "г").await.id;
    let app = test_router(&db);
    let token = token_for(&cook);

    let payload = json!({
        "tags": [lunch],
        "ingredients": [{"id": rice, "amount": 300}],
        "name": "Plov",
        "image": "https://cdn.example/plov.png",
        "text": "Fry, then simmer.",
        "cooking_time": 90
    });

    let created = send(&app, Method::POST, "/api/recipes", Some(&token), Some(payload.clone())).await;
    assert_eq!(created.status, StatusCode::CREATED);
    let body = created.json();
    assert_eq!(body["author"]["username"], "cook");
    assert_eq!(body["tags"][0]["slug"], "lunch");
    assert_eq!(body["ingredients"][0]["amount"], 300);
    assert_eq!(body["ingredients"][0]["measurement_unit"], "г");

    let duplicate = send(&app, Method::POST, "/api/recipes", Some(&token), Some(payload.clone())).await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let mut zero_amount = payload.clone();
    zero_amount["name"] = json!("Plov 2");
    zero_amount["ingredients"] = json!([{"id": rice, "amount": 0}]);
    let rejected = send(&app, Method::POST, "/api/recipes", Some(&token), Some(zero_amount)).await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);

    let mut unknown_tag = payload;
    unknown_tag["name"] = json!("Plov 3");
    unknown_tag["tags"] = json!([4242]);
    let rejected = send(&app, Method::POST, "/api/recipes", Some(&token), Some(unknown_tag)).await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);

    let anonymous = send(&app, Method::POST, "/api/recipes", None, Some(json!({}))).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_only_author_or_admin_may_change_a_recipe() {
    let db = setup_db().await;
    let cook = create_user(&db, "cook").await;
    let stranger = create_user(&db, "stranger").await;
    let admin = create_user_with_role(&db, "admin", user::ROLE_ADMIN).await;
    let rice = create_ingredient(&db, "рис", "г").await.id;
    let plov = create_recipe(&db, cook.id, "Plov", &[], &[(rice, 300)]).await;
    let app = test_router(&db);
    let uri = format!("/api/recipes/{}", plov.id);

    let forbidden = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token_for(&stranger)),
        Some(json!({"cooking_time": 5})),
    )
    .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let updated = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token_for(&cook)),
        Some(json!({"cooking_time": 45})),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    let body = updated.json();
    assert_eq!(body["cooking_time"], 45);
    assert_eq!(body["name"], "Plov");
    assert_eq!(body["ingredients"][0]["amount"], 300);

    let deleted = send(&app, Method::DELETE, &uri, Some(&token_for(&admin)), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let gone = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_subscriptions() {
    let db = setup_db().await;
    let reader = create_user(&db, "reader").await;
    let cook = create_user(&db, "cook").await;
    let rice = create_ingredient(&db, "рис", "г").await.id;
    create_recipe(&db, cook.id, "Plov", &[], &[(rice, 300)]).await;
    create_recipe(&db, cook.id, "Risotto", &[], &[(rice, 200)]).await;
    let app = test_router(&db);
    let token = token_for(&reader);

    let own = send(
        &app,
        Method::POST,
        &format!("/api/users/{}/subscribe", reader.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(own.status, StatusCode::BAD_REQUEST);

    let subscribe_uri = format!("/api/users/{}/subscribe", cook.id);
    let first = send(&app, Method::POST, &subscribe_uri, Some(&token), None).await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.json()["is_subscribed"], true);
    let again = send(&app, Method::POST, &subscribe_uri, Some(&token), None).await;
    assert_eq!(again.status, StatusCode::OK);

    let list = send(
        &app,
        Method::GET,
        "/api/users/subscriptions?recipes_limit=1",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(list.status, StatusCode::OK);
    let body = list.json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["username"], "cook");
    assert_eq!(body["results"][0]["recipes_count"], 2);
    assert_eq!(body["results"][0]["recipes"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["results"][0]["recipes"][0]["name"], "Risotto");

    let bad_limit = send(
        &app,
        Method::GET,
        "/api/users/subscriptions?recipes_limit=many",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(bad_limit.status, StatusCode::BAD_REQUEST);

    let huge_limit = send(
        &app,
        Method::GET,
        "/api/users/subscriptions?recipes_limit=18446744073709551615",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(huge_limit.status, StatusCode::BAD_REQUEST);
    assert!(huge_limit.json()["error"].is_string());

    let gone = send(&app, Method::DELETE, &subscribe_uri, Some(&token), None).await;
    assert_eq!(gone.status, StatusCode::NO_CONTENT);
    let not_following = send(&app, Method::DELETE, &subscribe_uri, Some(&token), None).await;
    assert_eq!(not_following.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_catalog_endpoints() {
    let db = setup_db().await;
    create_tag(&db, "Ужин", "dinner").await;
    create_tag(&db, "Завтрак", "breakfast").await;
    create_ingredient(&db, "Мука пшеничная", "г").await;
    create_ingredient(&db, "молоко", "мл").await;
    create_ingredient(&db, "Mustard", "г").await;
    create_ingredient(&db, "mint", "г").await;
    let app = test_router(&db);

    let tags = send(&app, Method::GET, "/api/tags", None, None).await.json();
    assert_eq!(tags[0]["slug"], "breakfast");
    assert_eq!(tags[1]["slug"], "dinner");

    let found = send(&app, Method::GET, "/api/ingredients?name=MU", None, None).await.json();
    let names: Vec<&str> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Mustard"]);

    let missing = send(&app, Method::GET, "/api/ingredients/999", None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ingredient_search_treats_wildcards_literally() {
    let db = setup_db().await;
    create_ingredient(&db, "salt_sea", "г").await;
    create_ingredient(&db, "saltysea", "г").await;
    create_ingredient(&db, "100% cocoa", "г").await;
    create_ingredient(&db, "1000 islands", "мл").await;
    create_ingredient(&db, "молоко", "мл").await;
    create_ingredient(&db, "морковь", "г").await;
    create_ingredient(&db, "мука", "г").await;
    let app = test_router(&db);

    let names = |body: serde_json::Value| -> Vec<String> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|i| i["name"].as_str().unwrap().to_string())
            .collect()
    };

    let underscore = send(&app, Method::GET, "/api/ingredients?name=salt_", None, None).await;
    assert_eq!(names(underscore.json()), vec!["salt_sea"]);

    let percent = send(&app, Method::GET, "/api/ingredients?name=100%25", None, None).await;
    assert_eq!(names(percent.json()), vec!["100% cocoa"]);

    // An upper-case Cyrillic query still finds lower-case names.
    let cyrillic = send(
        &app,
        Method::GET,
        "/api/ingredients?name=%D0%9C%D0%9E",
        None,
        None,
    )
    .await;
    assert_eq!(cyrillic.status, StatusCode::OK);
    assert_eq!(names(cyrillic.json()), vec!["молоко", "морковь"]);
}
