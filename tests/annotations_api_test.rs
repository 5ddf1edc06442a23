// ABOUTME: Integration tests for ratings and threaded comments
// ABOUTME: Covers reply tracking, root derivation, cascades, and permission rules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple
#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use axum::http::StatusCode;
use axum::Router;
use serde_json::{json, Value};
use uuid::Uuid;

use common::{create_recipe, register_admin, register_user, request, setup};

async fn post_rating(router: &Router, token: &str, parent: &str, rating: f64) -> Value {
    let (status, body) = request(
        router,
        "POST",
        "/ratings",
        Some(token),
        Some(json!({ "parent": parent, "rating": rating })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

async fn post_comment(router: &Router, token: &str, parent: &str, kind: &str, text: &str) -> Value {
    let (status, body) = request(
        router,
        "POST",
        "/comments",
        Some(token),
        Some(json!({ "parent": parent, "parentType": kind, "comment": text })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn test_rating_requires_an_active_recipe() {
    let (router, resources) = setup().await;
    let (_, token) = register_user(&resources, "drew").await;

    let missing = Uuid::new_v4().to_string();
    let (status, body) = request(
        &router,
        "POST",
        "/ratings",
        Some(&token),
        Some(json!({ "parent": missing, "rating": 4.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains(&missing));

    // Soft-deleted recipes are not valid parents either.
    let recipe = create_recipe(&router, &token, "Gone", "other", &[]).await;
    let id = recipe["id"].as_str().unwrap();
    request(&router, "DELETE", &format!("/recipes/{id}"), Some(&token), None).await;

    let (status, _) = request(
        &router,
        "POST",
        "/ratings",
        Some(&token),
        Some(json!({ "parent": id, "rating": 4.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rating_value_is_range_checked() {
    let (router, resources) = setup().await;
    let (_, token) = register_user(&resources, "drew").await;
    let recipe = create_recipe(&router, &token, "Spritz", "other", &[]).await;
    let id = recipe["id"].as_str().unwrap();

    for bad in [-0.5, 5.5] {
        let (status, body) = request(
            &router,
            "POST",
            "/ratings",
            Some(&token),
            Some(json!({ "parent": id, "rating": bad })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().starts_with("Rating must be between"));
    }

    // Boundary values are accepted.
    post_rating(&router, &token, id, 0.0).await;
    post_rating(&router, &token, id, 5.0).await;
}

#[tokio::test]
async fn test_comment_on_rating_is_tracked_in_replies() {
    let (router, resources) = setup().await;
    let (_, token) = register_user(&resources, "drew").await;
    let recipe = create_recipe(&router, &token, "Negroni", "stirred", &[]).await;
    let recipe_id = recipe["id"].as_str().unwrap();

    let rating = post_rating(&router, &token, recipe_id, 4.5).await;
    let rating_id = rating["id"].as_str().unwrap();
    assert!(rating["replies"].as_array().unwrap().is_empty());

    let comment = post_comment(&router, &token, rating_id, "ratings", "Bold take.").await;
    let comment_id = comment["id"].as_str().unwrap();

    let (status, body) =
        request(&router, "GET", &format!("/ratings/{rating_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["replies"], json!([comment_id]));

    // Removing the comment pulls it back out.
    let (status, _) =
        request(&router, "DELETE", &format!("/comments/{comment_id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = request(&router, "GET", &format!("/ratings/{rating_id}"), None, None).await;
    assert!(body["replies"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_nested_comment_inherits_the_root() {
    let (router, resources) = setup().await;
    let (_, token) = register_user(&resources, "drew").await;
    let recipe = create_recipe(&router, &token, "Old Fashioned", "stirred", &[]).await;
    let recipe_id = recipe["id"].as_str().unwrap();

    let top = post_comment(&router, &token, recipe_id, "recipes", "Classic.").await;
    let top_id = top["id"].as_str().unwrap();
    assert_eq!(top["root"], json!(recipe_id));
    assert_eq!(top["rootType"], "recipes");
    assert_eq!(top["parent"], json!(recipe_id));
    assert_eq!(top["parentType"], "recipes");

    let reply = post_comment(&router, &token, top_id, "comments", "Timeless, even.").await;
    let reply_id = reply["id"].as_str().unwrap();
    assert_eq!(reply["root"], json!(recipe_id));
    assert_eq!(reply["rootType"], "recipes");
    assert_eq!(reply["parent"], json!(top_id));
    assert_eq!(reply["parentType"], "comments");

    let (status, body) = request(&router, "GET", &format!("/comments/{top_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["replies"], json!([reply_id]));
}

#[tokio::test]
async fn test_comment_listing_by_parent() {
    let (router, resources) = setup().await;
    let (_, token) = register_user(&resources, "drew").await;
    let recipe = create_recipe(&router, &token, "Mojito", "other", &[]).await;
    let recipe_id = recipe["id"].as_str().unwrap();

    post_comment(&router, &token, recipe_id, "recipes", "First!").await;
    post_comment(&router, &token, recipe_id, "recipes", "Second.").await;

    let (status, body) = request(
        &router,
        "GET",
        &format!("/comments?parent={recipe_id}&parentType=recipes"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _) = request(
        &router,
        "GET",
        &format!("/comments?parent={}&parentType=recipes", Uuid::new_v4()),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rating_listing_by_recipe() {
    let (router, resources) = setup().await;
    let (_, token) = register_user(&resources, "drew").await;
    let (_, other) = register_user(&resources, "sam").await;
    let recipe = create_recipe(&router, &token, "Paloma", "other", &[]).await;
    let recipe_id = recipe["id"].as_str().unwrap();

    post_rating(&router, &token, recipe_id, 4.0).await;
    post_rating(&router, &other, recipe_id, 2.5).await;

    let (status, body) =
        request(&router, "GET", &format!("/ratings?parent={recipe_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    let ratings = body.as_array().unwrap();
    assert_eq!(ratings.len(), 2);
    for rating in ratings {
        assert_eq!(rating["parent"], json!(recipe_id));
    }
}

#[tokio::test]
async fn test_update_cannot_move_a_rating_or_comment() {
    let (router, resources) = setup().await;
    let (_, token) = register_user(&resources, "drew").await;
    let recipe = create_recipe(&router, &token, "Sazerac", "stirred", &[]).await;
    let recipe_id = recipe["id"].as_str().unwrap();

    let rating = post_rating(&router, &token, recipe_id, 3.0).await;
    let rating_id = rating["id"].as_str().unwrap();
    let (status, _) = request(
        &router,
        "PATCH",
        &format!("/ratings/{rating_id}"),
        Some(&token),
        Some(json!({ "parent": Uuid::new_v4().to_string(), "rating": 4.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let comment = post_comment(&router, &token, recipe_id, "recipes", "Strong.").await;
    let comment_id = comment["id"].as_str().unwrap();
    for field in ["root", "parent"] {
        let (status, _) = request(
            &router,
            "PATCH",
            &format!("/comments/{comment_id}"),
            Some(&token),
            Some(json!({ field: Uuid::new_v4().to_string(), "comment": "Moved." })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_update_marks_edited_and_is_owner_only() {
    let (router, resources) = setup().await;
    let (_, owner_token) = register_user(&resources, "drew").await;
    let (_, admin_token) = register_admin(&resources, "root").await;
    let recipe = create_recipe(&router, &owner_token, "Margarita", "shaken", &[]).await;
    let recipe_id = recipe["id"].as_str().unwrap();

    let rating = post_rating(&router, &owner_token, recipe_id, 3.0).await;
    let rating_id = rating["id"].as_str().unwrap();
    assert_eq!(rating["isEdited"], json!(false));

    // Even an admin may not rewrite someone else's words.
    let (status, _) = request(
        &router,
        "PATCH",
        &format!("/ratings/{rating_id}"),
        Some(&admin_token),
        Some(json!({ "rating": 1.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = request(
        &router,
        "PATCH",
        &format!("/ratings/{rating_id}"),
        Some(&owner_token),
        Some(json!({ "rating": 4.0, "comment": "Better than I remembered." })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isEdited"], json!(true));
    assert!((body["rating"].as_f64().unwrap() - 4.0).abs() < f64::EPSILON);

    let comment = post_comment(&router, &owner_token, recipe_id, "recipes", "Salty rim.").await;
    let comment_id = comment["id"].as_str().unwrap();
    let (status, _) = request(
        &router,
        "PATCH",
        &format!("/comments/{comment_id}"),
        Some(&admin_token),
        Some(json!({ "comment": "Edited by staff." })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_may_delete_but_stranger_may_not() {
    let (router, resources) = setup().await;
    let (_, owner_token) = register_user(&resources, "drew").await;
    let (_, stranger_token) = register_user(&resources, "sam").await;
    let (_, admin_token) = register_admin(&resources, "root").await;
    let recipe = create_recipe(&router, &owner_token, "Boulevardier", "stirred", &[]).await;
    let recipe_id = recipe["id"].as_str().unwrap();

    let comment = post_comment(&router, &owner_token, recipe_id, "recipes", "Bitter.").await;
    let comment_id = comment["id"].as_str().unwrap();

    let (status, body) = request(
        &router,
        "DELETE",
        &format!("/comments/{comment_id}"),
        Some(&stranger_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("You do not have permission to delete"));

    let (status, _) =
        request(&router, "DELETE", &format!("/comments/{comment_id}"), Some(&admin_token), None)
            .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_rating_delete_cascades_its_thread() {
    let (router, resources) = setup().await;
    let (_, token) = register_user(&resources, "drew").await;
    let recipe = create_recipe(&router, &token, "Daiquiri", "shaken", &[]).await;
    let recipe_id = recipe["id"].as_str().unwrap();

    let rating = post_rating(&router, &token, recipe_id, 5.0).await;
    let rating_id = rating["id"].as_str().unwrap();
    let top = post_comment(&router, &token, rating_id, "ratings", "Perfect.").await;
    let top_id = top["id"].as_str().unwrap();
    let reply = post_comment(&router, &token, top_id, "comments", "Seconded.").await;
    let reply_id = reply["id"].as_str().unwrap();

    let (status, _) =
        request(&router, "DELETE", &format!("/ratings/{rating_id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    for id in [rating_id, top_id, reply_id] {
        let path = if id == rating_id {
            format!("/ratings/{id}")
        } else {
            format!("/comments/{id}")
        };
        let (status, _) = request(&router, "GET", &path, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{path} survived the cascade");
    }
}

#[tokio::test]
async fn test_orphaned_reply_omits_its_dangling_parent() {
    let (router, resources) = setup().await;
    let (_, token) = register_user(&resources, "drew").await;
    let recipe = create_recipe(&router, &token, "Gimlet", "shaken", &[]).await;
    let recipe_id = recipe["id"].as_str().unwrap();

    let top = post_comment(&router, &token, recipe_id, "recipes", "Tart.").await;
    let top_id = top["id"].as_str().unwrap();
    let reply = post_comment(&router, &token, top_id, "comments", "Very.").await;
    let reply_id = reply["id"].as_str().unwrap();

    let (status, _) =
        request(&router, "DELETE", &format!("/comments/{top_id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    // The reply is still reachable; the dangling parent id vanishes while
    // the kind marker and the root stay.
    let (status, body) =
        request(&router, "GET", &format!("/comments/{reply_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("parent").is_none());
    assert_eq!(body["parentType"], "comments");
    assert_eq!(body["root"], json!(recipe_id));
}

#[tokio::test]
async fn test_blank_comment_text_is_rejected() {
    let (router, resources) = setup().await;
    let (_, token) = register_user(&resources, "drew").await;
    let recipe = create_recipe(&router, &token, "Mai Tai", "shaken", &[]).await;
    let recipe_id = recipe["id"].as_str().unwrap();

    let (status, body) = request(
        &router,
        "POST",
        "/comments",
        Some(&token),
        Some(json!({ "parent": recipe_id, "parentType": "recipes", "comment": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Comment text is required");
}

#[tokio::test]
async fn test_annotation_mutations_require_authentication() {
    let (router, resources) = setup().await;
    let (_, token) = register_user(&resources, "drew").await;
    let recipe = create_recipe(&router, &token, "Cosmo", "shaken", &[]).await;
    let recipe_id = recipe["id"].as_str().unwrap();

    let (status, _) = request(
        &router,
        "POST",
        "/ratings",
        None,
        Some(json!({ "parent": recipe_id, "rating": 3.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(
        &router,
        "POST",
        "/comments",
        None,
        Some(json!({ "parent": recipe_id, "parentType": "recipes", "comment": "Anon." })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
