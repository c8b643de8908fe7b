//! Tests for registration and the confirmation link

mod common;

use std::time::Duration;

use adsky_panel::error::INVALID_LINK_MESSAGE;
use common::{
    create_test_server, create_test_server_with_config, create_verified_user, link_path,
    location, login, register_user, test_config,
};
use serde_json::{json, Value};

/// Test: register answers success and mails a confirmation link
#[tokio::test]
async fn test_register_sends_confirmation_link() {
    let (server, email_sender) = create_test_server();

    let response = server
        .post("/api/user/register")
        .json(&json!({
            "username": "alice",
            "email": "Alice@Example.com",
            "password": "alicepassword",
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);

    // Stored and mailed under the normalized address
    let link = email_sender
        .registration_link("alice@example.com")
        .expect("No confirmation link sent");
    assert!(link.starts_with("http://localhost:3000/email/confirm/"));
}

/// Test: the confirmation link verifies the account and redirects to the panel
#[tokio::test]
async fn test_confirmation_link_verifies_account() {
    let (server, email_sender) = create_test_server();
    register_user(&server, "alice", "alice@example.com", "alicepassword").await;

    let link = email_sender.registration_link("alice@example.com").unwrap();
    let response = server.get(&link_path(&link)).await;

    assert_eq!(response.status_code(), 303);
    assert_eq!(
        location(&response),
        "http://localhost:3000/admin/?message=validation_success#home"
    );

    login(&server, "alice@example.com", "alicepassword").await;
}

/// Test: login is refused until the email address is confirmed
#[tokio::test]
async fn test_login_requires_confirmation() {
    let (server, _email_sender) = create_test_server();
    register_user(&server, "alice", "alice@example.com", "alicepassword").await;

    let response = server
        .post("/api/user/login")
        .json(&json!({ "email": "alice@example.com", "password": "alicepassword" }))
        .await;

    assert_eq!(response.status_code(), 403);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

/// Test: a confirmation link works exactly once
#[tokio::test]
async fn test_confirmation_link_single_use() {
    let (server, email_sender) = create_test_server();
    register_user(&server, "alice", "alice@example.com", "alicepassword").await;

    let path = link_path(&email_sender.registration_link("alice@example.com").unwrap());

    let first = server.get(&path).await;
    assert_eq!(first.status_code(), 303);

    let second = server.get(&path).await;
    assert_eq!(second.status_code(), 400);
    let body: Value = second.json();
    assert_eq!(body["reason"], INVALID_LINK_MESSAGE);
}

/// Test: a tampered secret is refused and the genuine link still works
#[tokio::test]
async fn test_tampered_secret_rejected() {
    let (server, email_sender) = create_test_server();
    register_user(&server, "alice", "alice@example.com", "alicepassword").await;

    let path = link_path(&email_sender.registration_link("alice@example.com").unwrap());
    let (prefix, _secret) = path.rsplit_once('/').unwrap();

    let response = server
        .get(&format!("{}/{}", prefix, "A".repeat(43)))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["reason"], INVALID_LINK_MESSAGE);

    let response = server.get(&path).await;
    assert_eq!(response.status_code(), 303);
}

/// Test: an unknown selector gets the same answer as any other bad link
#[tokio::test]
async fn test_unknown_selector_rejected() {
    let (server, _email_sender) = create_test_server();

    let response = server
        .get(&format!("/email/confirm/{}/{}", "B".repeat(22), "C".repeat(43)))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["reason"], INVALID_LINK_MESSAGE);
}

/// Test: an expired confirmation link is refused
#[tokio::test]
async fn test_expired_confirmation_link_rejected() {
    let mut config = test_config();
    config.tokens.registration_ttl_seconds = 1;
    let (server, email_sender, state) = create_test_server_with_config(config);
    register_user(&server, "alice", "alice@example.com", "alicepassword").await;

    let path = link_path(&email_sender.registration_link("alice@example.com").unwrap());

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let response = server.get(&path).await;
    assert_eq!(response.status_code(), 400);

    // Expired rows are removed when seen
    assert_eq!(state.user_store.token_count(), 0);
}

/// Test: duplicate email and username are both conflicts
#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let (server, _email_sender) = create_test_server();
    register_user(&server, "alice", "alice@example.com", "alicepassword").await;

    let response = server
        .post("/api/user/register")
        .json(&json!({
            "username": "alice2",
            "email": "ALICE@example.com",
            "password": "alicepassword",
        }))
        .await;
    assert_eq!(response.status_code(), 409);

    let response = server
        .post("/api/user/register")
        .json(&json!({
            "username": "alice",
            "email": "other@example.com",
            "password": "alicepassword",
        }))
        .await;
    assert_eq!(response.status_code(), 409);
}

/// Test: malformed input is rejected before anything is stored
#[tokio::test]
async fn test_register_validation() {
    let (server, email_sender) = create_test_server();

    let response = server
        .post("/api/user/register")
        .json(&json!({ "username": "alice", "email": "alice@example.com", "password": "short" }))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = server
        .post("/api/user/register")
        .json(&json!({ "username": "alice", "email": "not-an-email", "password": "alicepassword" }))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = server
        .post("/api/user/register")
        .json(&json!({ "username": "alice" }))
        .await;
    assert_eq!(response.status_code(), 400);

    assert_eq!(email_sender.sent_count(), 0);
}

/// Test: the first account is an admin, later ones are publishers
#[tokio::test]
async fn test_first_account_is_admin() {
    let (server, email_sender) = create_test_server();
    create_verified_user(&server, &email_sender, "first", "first@example.com", "firstpassword")
        .await;
    create_verified_user(&server, &email_sender, "second", "second@example.com", "secondpassword")
        .await;

    let response = server
        .post("/api/user/login")
        .json(&json!({ "email": "first@example.com", "password": "firstpassword" }))
        .await;
    let body: Value = response.json();
    assert_eq!(body["type"], "Admin");

    let response = server
        .post("/api/user/login")
        .json(&json!({ "email": "second@example.com", "password": "secondpassword" }))
        .await;
    let body: Value = response.json();
    assert_eq!(body["type"], "Publisher");
}

/// Test: resend_confirmation mails a fresh working link
#[tokio::test]
async fn test_resend_confirmation() {
    let (server, email_sender) = create_test_server();
    register_user(&server, "alice", "alice@example.com", "alicepassword").await;
    let first = email_sender.registration_link("alice@example.com").unwrap();

    let response = server
        .post("/api/user/resend_confirmation")
        .json(&json!({ "email": "alice@example.com" }))
        .await;
    assert_eq!(response.status_code(), 200);

    let second = email_sender.registration_link("alice@example.com").unwrap();
    assert_ne!(first, second);

    let response = server.get(&link_path(&second)).await;
    assert_eq!(response.status_code(), 303);
}

/// Test: resend_confirmation answers the same for verified and unknown accounts
#[tokio::test]
async fn test_resend_confirmation_does_not_reveal_accounts() {
    let (server, email_sender) = create_test_server();
    create_verified_user(&server, &email_sender, "alice", "alice@example.com", "alicepassword")
        .await;
    let sent = email_sender.sent_count();

    let known = server
        .post("/api/user/resend_confirmation")
        .json(&json!({ "email": "alice@example.com" }))
        .await;
    let unknown = server
        .post("/api/user/resend_confirmation")
        .json(&json!({ "email": "nobody@example.com" }))
        .await;

    assert_eq!(known.status_code(), 200);
    assert_eq!(unknown.status_code(), 200);
    assert_eq!(known.text(), unknown.text());
    assert_eq!(email_sender.sent_count(), sent);
}

/// Test: a confirmation token cannot be used as a reset link
#[tokio::test]
async fn test_confirmation_token_not_valid_for_reset() {
    let (server, email_sender) = create_test_server();
    register_user(&server, "alice", "alice@example.com", "alicepassword").await;

    let path = link_path(&email_sender.registration_link("alice@example.com").unwrap());
    let mut parts = path.rsplit('/');
    let secret = parts.next().unwrap();
    let selector = parts.next().unwrap();

    let response = server
        .get(&format!("/email/reset/alice@example.com/{}/{}", selector, secret))
        .await;
    assert_eq!(response.status_code(), 400);
    assert!(email_sender.new_password("alice@example.com").is_none());

    // Still good for what it was issued for
    let response = server.get(&path).await;
    assert_eq!(response.status_code(), 303);
}
