//! Common test utilities for panel integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::sync::RwLock;

use adsky_core::TokenConfig;
use adsky_panel::{
    routes, AppState, Config, EmailSender, InMemorySessionStore, InMemoryUserStore,
};
use axum_test::TestServer;
use serde_json::{json, Value};

pub const WEBSITE_ROOT: &str = "http://localhost:3000/";

pub type TestState = AppState<InMemoryUserStore, InMemorySessionStore, MockEmailSender>;

/// Mock email sender that captures links and generated passwords
#[derive(Default, Clone)]
pub struct MockEmailSender {
    /// Captured (email, link) pairs for confirmation mails
    pub registration_links: Arc<RwLock<Vec<(String, String)>>>,
    /// Captured (email, link) pairs for reset mails
    pub reset_links: Arc<RwLock<Vec<(String, String)>>>,
    /// Captured (email, password) pairs
    pub passwords: Arc<RwLock<Vec<(String, String)>>>,
    /// When set, mailing a new password fails
    pub fail_new_password: Arc<AtomicBool>,
}

fn last_for(sent: &RwLock<Vec<(String, String)>>, email: &str) -> Option<String> {
    sent.read()
        .unwrap()
        .iter()
        .rev()
        .find(|(e, _)| e == email)
        .map(|(_, v)| v.clone())
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last confirmation link sent to an email
    pub fn registration_link(&self, email: &str) -> Option<String> {
        last_for(&self.registration_links, email)
    }

    /// Last reset link sent to an email
    pub fn reset_link(&self, email: &str) -> Option<String> {
        last_for(&self.reset_links, email)
    }

    /// Last generated password sent to an email
    pub fn new_password(&self, email: &str) -> Option<String> {
        last_for(&self.passwords, email)
    }

    /// Make every following new-password mail fail, or succeed again
    pub fn set_fail_new_password(&self, fail: bool) {
        self.fail_new_password.store(fail, Ordering::SeqCst);
    }

    pub fn sent_count(&self) -> usize {
        self.registration_links.read().unwrap().len()
            + self.reset_links.read().unwrap().len()
            + self.passwords.read().unwrap().len()
    }
}

impl EmailSender for MockEmailSender {
    fn send_registration_link(&self, email: &str, link: &str) -> Result<(), String> {
        self.registration_links
            .write()
            .unwrap()
            .push((email.to_string(), link.to_string()));
        Ok(())
    }

    fn send_reset_link(&self, email: &str, link: &str) -> Result<(), String> {
        self.reset_links
            .write()
            .unwrap()
            .push((email.to_string(), link.to_string()));
        Ok(())
    }

    fn send_new_password(&self, email: &str, password: &str) -> Result<(), String> {
        if self.fail_new_password.load(Ordering::SeqCst) {
            return Err("mail server unreachable".to_string());
        }
        self.passwords
            .write()
            .unwrap()
            .push((email.to_string(), password.to_string()));
        Ok(())
    }
}

/// Config with a cheap bcrypt cost so tests stay fast
pub fn test_config() -> Config {
    Config {
        website_root: WEBSITE_ROOT.to_string(),
        tokens: TokenConfig {
            registration_ttl_seconds: 3600,
            reset_ttl_seconds: 600,
            hash_cost: 4,
        },
        ..Config::default()
    }
}

/// Create a test server from a config, keeping a handle on its state
pub fn create_test_server_with_config(
    config: Config,
) -> (TestServer, MockEmailSender, Arc<TestState>) {
    let email_sender = MockEmailSender::new();

    let state = Arc::new(
        AppState::new(
            config,
            InMemoryUserStore::new(),
            InMemorySessionStore::new(),
            email_sender.clone(),
        )
        .expect("Failed to create app state"),
    );

    let app = routes::create_router(Arc::clone(&state));
    let server = TestServer::new(app).expect("Failed to create test server");

    (server, email_sender, state)
}

/// Create a test server with mock email sender
pub fn create_test_server() -> (TestServer, MockEmailSender) {
    let (server, email_sender, _) = create_test_server_with_config(test_config());
    (server, email_sender)
}

/// Path part of an absolute link from an email
pub fn link_path(link: &str) -> String {
    let path = link
        .strip_prefix(WEBSITE_ROOT.trim_end_matches('/'))
        .expect("Link is not below the website root");
    path.to_string()
}

/// Location header of a redirect
pub fn location(response: &axum_test::TestResponse) -> String {
    response
        .header("location")
        .to_str()
        .expect("Location header is not ASCII")
        .to_string()
}

/// Register an account without confirming it
pub async fn register_user(server: &TestServer, username: &str, email: &str, password: &str) {
    let response = server
        .post("/api/user/register")
        .json(&json!({
            "username": username,
            "email": email,
            "password": password,
        }))
        .await;
    assert_eq!(response.status_code(), 200);
}

/// Register an account and follow its confirmation link
pub async fn create_verified_user(
    server: &TestServer,
    email_sender: &MockEmailSender,
    username: &str,
    email: &str,
    password: &str,
) {
    register_user(server, username, email, password).await;

    let link = email_sender
        .registration_link(email)
        .expect("No confirmation link sent");
    let response = server.get(&link_path(&link)).await;
    assert_eq!(response.status_code(), 303);
}

/// Log in and return the session cookie value
pub async fn login(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post("/api/user/login")
        .json(&json!({
            "email": email,
            "password": password,
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    response
        .maybe_cookie(routes::SESSION_COOKIE)
        .expect("No session cookie")
        .value()
        .to_string()
}

/// The first account becomes the admin; returns its session cookie value
pub async fn create_admin(server: &TestServer, email_sender: &MockEmailSender) -> String {
    create_verified_user(
        server,
        email_sender,
        "admin",
        "admin@example.com",
        "adminpassword",
    )
    .await;
    login(server, "admin@example.com", "adminpassword").await
}

/// Run a user operation with a session cookie
pub async fn user_op(
    server: &TestServer,
    session: &str,
    operation: &str,
    body: Value,
) -> axum_test::TestResponse {
    server
        .post(&format!("/api/user/{}", operation))
        .add_cookie(cookie::Cookie::new(
            routes::SESSION_COOKIE,
            session.to_string(),
        ))
        .json(&body)
        .await
}
