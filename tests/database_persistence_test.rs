// ABOUTME: Integration tests for the file-backed store
// ABOUTME: Documents survive a full disconnect/reconnect cycle
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple
#![allow(missing_docs, clippy::unwrap_used)]

use chrono::Utc;
use uuid::Uuid;

use tipple_server::database::Database;
use tipple_server::models::recipe::{MixMethod, Recipe, RecipeKind};
use tipple_server::models::User;

#[tokio::test]
async fn test_documents_survive_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!(
        "sqlite:{}?mode=rwc",
        dir.path().join("tipple.db").display()
    );

    let user = User::new(
        "drew".into(),
        "drew@example.com".into(),
        "hash".into(),
        None,
    );
    let now = Utc::now();
    let recipe = Recipe {
        key: Uuid::new_v4(),
        id: Uuid::new_v4(),
        kind: RecipeKind::Cocktail,
        name: "Negroni".into(),
        description: String::new(),
        instructions: "Stir over ice.".into(),
        method: MixMethod::Stirred,
        ingredients: Vec::new(),
        abv: 24.0,
        tags: vec!["bitter".into()],
        is_subrecipe: false,
        is_public: true,
        is_deleted: false,
        owner_key: user.key,
        created_at: now,
        last_updated: now,
    };

    {
        let database = Database::connect(&url).await.unwrap();
        database.users().create(&user).await.unwrap();
        database.recipes().create(&recipe).await.unwrap();
        database.pool().close().await;
    }

    let database = Database::connect(&url).await.unwrap();
    let found = database
        .users()
        .find_by_email("drew@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.key, user.key);

    let (stored, owner) = database
        .recipes()
        .find_active_by_id(recipe.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "Negroni");
    assert_eq!(stored.tags, vec!["bitter".to_owned()]);
    assert!((stored.abv - 24.0).abs() < f64::EPSILON);
    assert_eq!(owner.username, "drew");
}

#[tokio::test]
async fn test_schema_bootstrap_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!(
        "sqlite:{}?mode=rwc",
        dir.path().join("tipple.db").display()
    );

    let first = Database::connect(&url).await.unwrap();
    first.pool().close().await;
    // Reconnecting reapplies every CREATE IF NOT EXISTS without error.
    let second = Database::connect(&url).await.unwrap();
    second.pool().close().await;
}
