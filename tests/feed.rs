//! Home Feed Tests
//!
//! The feed is computed live from the follow graph: it reflects the current
//! set of followees on every read and never includes the viewer's own posts.

mod common;

use axum::http::StatusCode;
use common::app;
use serde_json::json;

// ===========================================================================
// Membership
// ===========================================================================

#[tokio::test]
async fn feed_empty_when_following_nobody() {
    let app = app().await;
    let viewer = app.create_user("feed_empty").await;
    let author = app.create_user("feed_empty_author").await;
    app.create_post_for_user(author.id, "unseen post").await;

    let resp = app.get("/feed", Some(&viewer.access_token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn feed_shows_followee_posts() {
    let app = app().await;
    let viewer = app.create_user("feed_member").await;
    let author = app.create_user("feed_member_author").await;
    let stranger = app.create_user("feed_member_stranger").await;

    let followed_post = app.create_post_for_user(author.id, "from a followee").await;
    app.create_post_for_user(stranger.id, "from a stranger").await;

    app.post_json(
        &format!("/users/{}/follow", author.id),
        json!({}),
        Some(&viewer.access_token),
    )
    .await;

    let resp = app.get("/feed", Some(&viewer.access_token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"].as_str().unwrap(), followed_post.to_string());
    assert_eq!(
        items[0]["author_handle"].as_str().unwrap(),
        author.handle.as_str()
    );
}

#[tokio::test]
async fn feed_excludes_own_posts() {
    let app = app().await;
    let viewer = app.create_user("feed_own").await;
    let author = app.create_user("feed_own_author").await;

    app.create_post_for_user(viewer.id, "my own post").await;
    let other_post = app.create_post_for_user(author.id, "their post").await;

    app.post_json(
        &format!("/users/{}/follow", author.id),
        json!({}),
        Some(&viewer.access_token),
    )
    .await;

    let resp = app.get("/feed", Some(&viewer.access_token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let items = resp.json()["items"].as_array().unwrap().clone();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"].as_str().unwrap(), other_post.to_string());
}

#[tokio::test]
async fn feed_tracks_follow_state_live() {
    let app = app().await;
    let viewer = app.create_user("feed_live").await;
    let author = app.create_user("feed_live_author").await;

    app.create_post_for_user(author.id, "now you see me").await;

    app.post_json(
        &format!("/users/{}/follow", author.id),
        json!({}),
        Some(&viewer.access_token),
    )
    .await;
    let resp = app.get("/feed", Some(&viewer.access_token)).await;
    assert_eq!(resp.json()["items"].as_array().unwrap().len(), 1);

    // Unfollow and the same post drops out on the next read
    app.post_json(
        &format!("/users/{}/unfollow", author.id),
        json!({}),
        Some(&viewer.access_token),
    )
    .await;
    let resp = app.get("/feed", Some(&viewer.access_token)).await;
    assert_eq!(resp.json()["items"].as_array().unwrap().len(), 0);
}

// ===========================================================================
// Ordering + pagination
// ===========================================================================

#[tokio::test]
async fn feed_newest_first_with_cursor() {
    let app = app().await;
    let viewer = app.create_user("feed_order").await;
    let author = app.create_user("feed_order_author").await;

    let mut post_ids = Vec::new();
    for i in 0..5 {
        post_ids.push(
            app.create_post_for_user(author.id, &format!("post {}", i))
                .await,
        );
    }

    app.post_json(
        &format!("/users/{}/follow", author.id),
        json!({}),
        Some(&viewer.access_token),
    )
    .await;

    let resp = app.get("/feed?limit=3", Some(&viewer.access_token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    // Newest first: the last created post leads
    assert_eq!(
        items[0]["id"].as_str().unwrap(),
        post_ids[4].to_string()
    );
    assert_eq!(items[1]["id"].as_str().unwrap(), post_ids[3].to_string());

    let cursor = body["next_cursor"].as_str().unwrap().to_string();
    let resp = app
        .get(
            &format!("/feed?limit=3&cursor={}", cursor),
            Some(&viewer.access_token),
        )
        .await;
    let body = resp.json();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"].as_str().unwrap(), post_ids[1].to_string());
    assert_eq!(items[1]["id"].as_str().unwrap(), post_ids[0].to_string());
    assert!(body["next_cursor"].is_null());
}

#[tokio::test]
async fn feed_merges_multiple_followees() {
    let app = app().await;
    let viewer = app.create_user("feed_multi").await;
    let author_b = app.create_user("feed_multi_b").await;
    let author_c = app.create_user("feed_multi_c").await;

    let post_b = app.create_post_for_user(author_b.id, "from b").await;
    let post_c = app.create_post_for_user(author_c.id, "from c").await;

    for author in [&author_b, &author_c] {
        app.post_json(
            &format!("/users/{}/follow", author.id),
            json!({}),
            Some(&viewer.access_token),
        )
        .await;
    }

    let resp = app.get("/feed", Some(&viewer.access_token)).await;
    let items = resp.json()["items"].as_array().unwrap().clone();
    assert_eq!(items.len(), 2);
    // Interleaved by recency across authors
    assert_eq!(items[0]["id"].as_str().unwrap(), post_c.to_string());
    assert_eq!(items[1]["id"].as_str().unwrap(), post_b.to_string());
}

#[tokio::test]
async fn feed_requires_auth() {
    let app = app().await;
    let resp = app.get("/feed", None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn feed_rejects_bad_limit() {
    let app = app().await;
    let viewer = app.create_user("feed_bad_limit").await;

    let resp = app.get("/feed?limit=0", Some(&viewer.access_token)).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app.get("/feed?limit=500", Some(&viewer.access_token)).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}
