// ABOUTME: Integration tests for collections and their sections
// ABOUTME: Covers reference validation, weak-reference expansion, and hard delete
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple
#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::{create_recipe, register_user, request, setup};

#[tokio::test]
async fn test_create_with_flat_list_and_sections() {
    let (router, resources) = setup().await;
    let (_, token) = register_user(&resources, "drew").await;

    let negroni = create_recipe(&router, &token, "Negroni", "stirred", &[]).await;
    let spritz = create_recipe(&router, &token, "Spritz", "other", &[]).await;
    let negroni_id = negroni["id"].as_str().unwrap();
    let spritz_id = spritz["id"].as_str().unwrap();

    let (status, body) = request(
        &router,
        "POST",
        "/collections",
        Some(&token),
        Some(json!({
            "name": "Aperitivo Hour",
            "description": "Before dinner.",
            "recipes": [negroni_id],
            "sections": [
                { "name": "Bubbles", "recipes": [spritz_id] },
                { "name": "Stirred", "description": "No ice shards.", "recipes": [negroni_id] },
            ],
            "isMenu": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    assert_eq!(body["recipes"][0]["id"], json!(negroni_id));
    assert_eq!(body["recipes"][0]["name"], "Negroni");
    assert_eq!(body["sections"][0]["name"], "Bubbles");
    assert_eq!(body["sections"][0]["recipes"][0]["id"], json!(spritz_id));
    assert_eq!(body["sections"][1]["recipes"][0]["id"], json!(negroni_id));
    assert_eq!(body["isMenu"], json!(true));
    assert_eq!(body["isPublic"], json!(true));
}

#[tokio::test]
async fn test_unknown_recipe_reference_is_rejected() {
    let (router, resources) = setup().await;
    let (_, token) = register_user(&resources, "drew").await;
    let missing = Uuid::new_v4().to_string();

    // A bad id in a section fails the whole create.
    let (status, body) = request(
        &router,
        "POST",
        "/collections",
        Some(&token),
        Some(json!({
            "name": "Ghost Menu",
            "sections": [{ "name": "Phantoms", "recipes": [missing] }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains(&missing));

    let (_, listing) = request(&router, "GET", "/collections", None, None).await;
    assert!(listing.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_deleted_recipe_becomes_a_weak_reference() {
    let (router, resources) = setup().await;
    let (_, token) = register_user(&resources, "drew").await;

    let recipe = create_recipe(&router, &token, "Fleeting", "other", &[]).await;
    let recipe_id = recipe["id"].as_str().unwrap();

    let (status, collection) = request(
        &router,
        "POST",
        "/collections",
        Some(&token),
        Some(json!({ "name": "Favorites", "recipes": [recipe_id] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let collection_id = collection["id"].as_str().unwrap();

    request(&router, "DELETE", &format!("/recipes/{recipe_id}"), Some(&token), None).await;

    // A soft-deleted recipe still renders, flagged.
    let (status, body) =
        request(&router, "GET", &format!("/collections/{collection_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recipes"][0]["id"], json!(recipe_id));
    assert_eq!(body["recipes"][0]["isDeleted"], json!(true));
}

#[tokio::test]
async fn test_patch_replaces_lists_independently() {
    let (router, resources) = setup().await;
    let (_, token) = register_user(&resources, "drew").await;

    let first = create_recipe(&router, &token, "First", "other", &[]).await;
    let second = create_recipe(&router, &token, "Second", "other", &[]).await;
    let first_id = first["id"].as_str().unwrap();
    let second_id = second["id"].as_str().unwrap();

    let (_, collection) = request(
        &router,
        "POST",
        "/collections",
        Some(&token),
        Some(json!({
            "name": "Rotation",
            "recipes": [first_id],
            "sections": [{ "name": "Keep", "recipes": [first_id] }],
        })),
    )
    .await;
    let id = collection["id"].as_str().unwrap();

    // Replacing the flat list leaves the sections alone.
    let (status, body) = request(
        &router,
        "PATCH",
        &format!("/collections/{id}"),
        Some(&token),
        Some(json!({ "recipes": [second_id] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["recipes"][0]["id"], json!(second_id));
    assert_eq!(body["sections"][0]["recipes"][0]["id"], json!(first_id));

    // An explicit empty list clears it.
    let (status, body) = request(
        &router,
        "PATCH",
        &format!("/collections/{id}"),
        Some(&token),
        Some(json!({ "sections": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["sections"].as_array().unwrap().is_empty());
    assert_eq!(body["recipes"][0]["id"], json!(second_id));
}

#[tokio::test]
async fn test_private_collection_visibility_and_permissions() {
    let (router, resources) = setup().await;
    let (_, owner_token) = register_user(&resources, "drew").await;
    let (_, stranger_token) = register_user(&resources, "sam").await;

    let (status, collection) = request(
        &router,
        "POST",
        "/collections",
        Some(&owner_token),
        Some(json!({ "name": "House List", "isPublic": false })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = collection["id"].as_str().unwrap();

    let (status, _) = request(&router, "GET", &format!("/collections/{id}"), None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) =
        request(&router, "GET", &format!("/collections/{id}"), Some(&stranger_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) =
        request(&router, "GET", &format!("/collections/{id}"), Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request(
        &router,
        "PATCH",
        &format!("/collections/{id}"),
        Some(&stranger_token),
        Some(json!({ "name": "Mine Now" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("You do not have permission to update"));
}

#[tokio::test]
async fn test_delete_is_hard_and_final() {
    let (router, resources) = setup().await;
    let (_, token) = register_user(&resources, "drew").await;

    let (_, collection) = request(
        &router,
        "POST",
        "/collections",
        Some(&token),
        Some(json!({ "name": "Short Lived" })),
    )
    .await;
    let id = collection["id"].as_str().unwrap();

    let (status, body) =
        request(&router, "DELETE", &format!("/collections/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Collection deleted");

    let (status, _) = request(&router, "GET", &format!("/collections/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // There is no restore for collections.
    let (status, _) =
        request(&router, "POST", &format!("/collections/{id}/restore"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
