//! Data models for panel storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of an account in the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserType {
    /// Manages every account and ad
    Admin,
    /// Manages their own ads only
    Publisher,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Admin => "Admin",
            UserType::Publisher => "Publisher",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Admin" | "admin" => Some(UserType::Admin),
            "Publisher" | "publisher" => Some(UserType::Publisher),
            _ => None,
        }
    }
}

/// Unique user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

/// Unique session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// A panel account
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Always stored lowercase
    pub email: String,
    pub password_hash: String,
    pub user_type: UserType,
    pub verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub registered: DateTime<Utc>,
}

/// Fields needed to create an account. The store picks the role.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// A logged-in browser session
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}
