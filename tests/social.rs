//! Social Graph Tests
//!
//! Covers follow/unfollow edges, relationship status, and follower listings.

mod common;

use axum::http::StatusCode;
use common::app;
use serde_json::json;
use uuid::Uuid;

// ===========================================================================
// Follow
// ===========================================================================

#[tokio::test]
async fn follow_user() {
    let app = app().await;
    let user_a = app.create_user("soc_follow_a").await;
    let user_b = app.create_user("soc_follow_b").await;

    let resp = app
        .post_json(
            &format!("/users/{}/follow", user_b.id),
            json!({}),
            Some(&user_a.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["followed"].as_bool().unwrap(), true);
    assert_eq!(body["message"].as_str().unwrap(), "now following");
}

#[tokio::test]
async fn follow_already_following() {
    let app = app().await;
    let user_a = app.create_user("soc_follow_dup_a").await;
    let user_b = app.create_user("soc_follow_dup_b").await;

    // Follow once
    let resp = app
        .post_json(
            &format!("/users/{}/follow", user_b.id),
            json!({}),
            Some(&user_a.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["followed"].as_bool().unwrap(), true);

    // Follow again — should be idempotent
    let resp = app
        .post_json(
            &format!("/users/{}/follow", user_b.id),
            json!({}),
            Some(&user_a.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["followed"].as_bool().unwrap(), false);
    assert_eq!(resp.json()["message"].as_str().unwrap(), "already following");

    // Exactly one edge exists
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM follows WHERE follower_id = $1 AND followee_id = $2",
    )
    .bind(user_a.id)
    .bind(user_b.id)
    .fetch_one(app.pool())
    .await
    .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn follow_self_rejected() {
    let app = app().await;
    let user = app.create_user("soc_follow_self").await;

    let resp = app
        .post_json(
            &format!("/users/{}/follow", user.id),
            json!({}),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "cannot follow yourself");

    // No edge was written
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
        .bind(user.id)
        .fetch_one(app.pool())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn follow_nonexistent_user() {
    let app = app().await;
    let user = app.create_user("soc_follow_ghost").await;

    let resp = app
        .post_json(
            &format!("/users/{}/follow", Uuid::new_v4()),
            json!({}),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.error_message(), "user not found");
}

#[tokio::test]
async fn follow_requires_auth() {
    let app = app().await;
    let user = app.create_user("soc_follow_anon").await;

    let resp = app
        .post_json(&format!("/users/{}/follow", user.id), json!({}), None)
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

// ===========================================================================
// Unfollow
// ===========================================================================

#[tokio::test]
async fn unfollow_user() {
    let app = app().await;
    let user_a = app.create_user("soc_unfollow_a").await;
    let user_b = app.create_user("soc_unfollow_b").await;

    app.post_json(
        &format!("/users/{}/follow", user_b.id),
        json!({}),
        Some(&user_a.access_token),
    )
    .await;

    let resp = app
        .post_json(
            &format!("/users/{}/unfollow", user_b.id),
            json!({}),
            Some(&user_a.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["unfollowed"].as_bool().unwrap(), true);
}

#[tokio::test]
async fn unfollow_when_not_following() {
    let app = app().await;
    let user_a = app.create_user("soc_unfollow_noop_a").await;
    let user_b = app.create_user("soc_unfollow_noop_b").await;

    let resp = app
        .post_json(
            &format!("/users/{}/unfollow", user_b.id),
            json!({}),
            Some(&user_a.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["unfollowed"].as_bool().unwrap(), false);
    assert_eq!(resp.json()["message"].as_str().unwrap(), "was not following");
}

#[tokio::test]
async fn unfollow_self_is_noop() {
    let app = app().await;
    let user = app.create_user("soc_unfollow_self").await;

    // A self-edge can never exist, so this is the plain absent-edge case
    let resp = app
        .post_json(
            &format!("/users/{}/unfollow", user.id),
            json!({}),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["unfollowed"].as_bool().unwrap(), false);
    assert_eq!(resp.json()["message"].as_str().unwrap(), "was not following");
}

// ===========================================================================
// Relationship status — edges are directed
// ===========================================================================

#[tokio::test]
async fn relationship_is_asymmetric() {
    let app = app().await;
    let user_a = app.create_user("soc_rel_a").await;
    let user_b = app.create_user("soc_rel_b").await;

    app.post_json(
        &format!("/users/{}/follow", user_b.id),
        json!({}),
        Some(&user_a.access_token),
    )
    .await;

    // A's view of B: following, not followed back
    let resp = app
        .get(
            &format!("/users/{}/relationship", user_b.id),
            Some(&user_a.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["is_following"].as_bool().unwrap(), true);
    assert_eq!(resp.json()["is_followed_by"].as_bool().unwrap(), false);

    // B's view of A: mirror image
    let resp = app
        .get(
            &format!("/users/{}/relationship", user_a.id),
            Some(&user_b.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["is_following"].as_bool().unwrap(), false);
    assert_eq!(resp.json()["is_followed_by"].as_bool().unwrap(), true);
}

#[tokio::test]
async fn relationship_with_self() {
    let app = app().await;
    let user = app.create_user("soc_rel_self").await;

    let resp = app
        .get(
            &format!("/users/{}/relationship", user.id),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["is_following"].as_bool().unwrap(), false);
    assert_eq!(resp.json()["is_followed_by"].as_bool().unwrap(), false);
}

// ===========================================================================
// Follower / following listings
// ===========================================================================

#[tokio::test]
async fn list_followers_and_following() {
    let app = app().await;
    let target = app.create_user("soc_list_target").await;
    let fan_1 = app.create_user("soc_list_fan1").await;
    let fan_2 = app.create_user("soc_list_fan2").await;

    for fan in [&fan_1, &fan_2] {
        let resp = app
            .post_json(
                &format!("/users/{}/follow", target.id),
                json!({}),
                Some(&fan.access_token),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK);
    }

    let resp = app
        .get(
            &format!("/users/{}/followers", target.id),
            Some(&target.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    let handles: Vec<&str> = items
        .iter()
        .map(|i| i["user"]["handle"].as_str().unwrap())
        .collect();
    assert!(handles.contains(&fan_1.handle.as_str()));
    assert!(handles.contains(&fan_2.handle.as_str()));
    // Public view never exposes email
    assert!(items[0]["user"]["email"].is_null());

    let resp = app
        .get(
            &format!("/users/{}/following", fan_1.id),
            Some(&fan_1.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0]["user"]["id"].as_str().unwrap(),
        target.id.to_string()
    );
}

#[tokio::test]
async fn list_followers_pagination() {
    let app = app().await;
    let target = app.create_user("soc_page_target").await;

    for i in 0..5 {
        let fan = app.create_user(&format!("soc_page_fan{}", i)).await;
        app.post_json(
            &format!("/users/{}/follow", target.id),
            json!({}),
            Some(&fan.access_token),
        )
        .await;
    }

    let resp = app
        .get(
            &format!("/users/{}/followers?limit=3", target.id),
            Some(&target.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["items"].as_array().unwrap().len(), 3);
    let cursor = body["next_cursor"].as_str().unwrap().to_string();

    let resp = app
        .get(
            &format!("/users/{}/followers?limit=3&cursor={}", target.id, cursor),
            Some(&target.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert!(body["next_cursor"].is_null());
}
