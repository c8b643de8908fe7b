//! SQLite-based storage implementation

use std::sync::{Arc, Mutex};

use adsky_core::store::StoreResult as TokenResult;
use adsky_core::{Purpose, StoreError, TokenStore, VerificationToken};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{
    NewUser, Session, SessionId, SessionStore, StoreResult, User, UserId, UserStore, UserType,
};
use crate::error::PanelError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, user_type, verified, last_login, registered";

const TOKEN_COLUMNS: &str =
    "selector, purpose, subject, secret_hash, issued_at, expires_at, consumed_at";

/// SQLite-based store implementing UserStore, TokenStore and SessionStore.
///
/// Clones share the same connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

/// Fixed-width UTC timestamps, so that SQL string comparison orders them
fn to_db_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn from_db_time(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Token timestamps decide validity, so a malformed one is an error
fn token_time(column: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, e.into())
        })
}

fn backend(e: rusqlite::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let id: i64 = row.get(0)?;
    let user_type: String = row.get(4)?;
    let verified: i32 = row.get(5)?;
    let last_login: Option<String> = row.get(6)?;
    let registered: String = row.get(7)?;
    Ok(User {
        id: UserId(id as u64),
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        user_type: UserType::from_str(&user_type).unwrap_or(UserType::Publisher),
        verified: verified != 0,
        last_login: last_login.as_deref().map(from_db_time),
        registered: from_db_time(&registered),
    })
}

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<VerificationToken> {
    let purpose: String = row.get(1)?;
    let issued_at: String = row.get(4)?;
    let expires_at: String = row.get(5)?;
    let consumed_at: Option<String> = row.get(6)?;
    let purpose = Purpose::from_str(&purpose).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("unknown token purpose {purpose:?}").into(),
        )
    })?;
    Ok(VerificationToken {
        selector: row.get(0)?,
        purpose,
        subject: row.get(2)?,
        secret_hash: row.get(3)?,
        issued_at: token_time(4, &issued_at)?,
        expires_at: token_time(5, &expires_at)?,
        consumed_at: consumed_at
            .as_deref()
            .map(|at| token_time(6, at))
            .transpose()?,
    })
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, PanelError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, PanelError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, PanelError> {
        // Enable foreign keys
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        Self::migrate(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run database migrations
    fn migrate(conn: &Connection) -> Result<(), PanelError> {
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    /// Get current schema version (0 if no schema exists)
    fn get_schema_version(conn: &Connection) -> Result<i32, PanelError> {
        let table_exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        Ok(conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })?)
    }

    /// Migration to version 1: initial schema
    fn migrate_v1(conn: &Connection) -> Result<(), PanelError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                user_type TEXT NOT NULL,
                verified INTEGER NOT NULL DEFAULT 0,
                last_login TEXT,
                registered TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);

            -- Tokens reference their account by email, not by foreign key:
            -- account changes delete them explicitly.
            CREATE TABLE IF NOT EXISTS verification_tokens (
                selector TEXT NOT NULL,
                purpose TEXT NOT NULL,
                subject TEXT NOT NULL,
                secret_hash TEXT NOT NULL,
                issued_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                consumed_at TEXT,
                PRIMARY KEY (selector, purpose)
            );
            CREATE INDEX IF NOT EXISTS idx_tokens_subject ON verification_tokens(subject);
            "#,
        )?;

        Ok(())
    }

    fn query_user(&self, clause: &str, value: &str) -> StoreResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {clause} = ?1");
        Ok(conn
            .query_row(&sql, params![value], user_from_row)
            .optional()?)
    }
}

impl UserStore for SqliteStore {
    fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let conn = self.conn.lock().unwrap();
        let email = new_user.email.to_lowercase();

        // A single statement, so two first registrations cannot both see an
        // empty table.
        conn.execute(
            "INSERT INTO users (username, email, password_hash, user_type, verified, registered)
             VALUES (?1, ?2, ?3,
                     CASE WHEN EXISTS(SELECT 1 FROM users) THEN ?4 ELSE ?5 END,
                     0, ?6)",
            params![
                new_user.username,
                email,
                new_user.password_hash,
                UserType::Publisher.as_str(),
                UserType::Admin.as_str(),
                to_db_time(Utc::now()),
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                let email_taken = conn
                    .query_row(
                        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
                        params![email],
                        |row| row.get::<_, bool>(0),
                    )
                    .unwrap_or(false);
                return if email_taken {
                    PanelError::EmailAlreadyExists
                } else {
                    PanelError::UsernameTaken
                };
            }
            PanelError::from(e)
        })?;

        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        Ok(conn.query_row(&sql, params![conn.last_insert_rowid()], user_from_row)?)
    }

    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        Ok(conn
            .query_row(&sql, params![user_id.0 as i64], user_from_row)
            .optional()?)
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.query_user("email", &email.to_lowercase())
    }

    fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.query_user("username", username)
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    fn update_user(
        &self,
        old_email: &str,
        new_email: &str,
        user_type: UserType,
    ) -> StoreResult<User> {
        let old_email = old_email.to_lowercase();
        let new_email = new_email.to_lowercase();
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let rows_affected = tx
            .execute(
                "UPDATE users SET email = ?1, user_type = ?2 WHERE email = ?3",
                params![new_email, user_type.as_str(), old_email],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    PanelError::EmailAlreadyExists
                } else {
                    PanelError::from(e)
                }
            })?;

        if rows_affected == 0 {
            return Err(PanelError::UserNotFound);
        }

        if new_email != old_email {
            tx.execute(
                "DELETE FROM verification_tokens WHERE subject = ?1",
                params![old_email],
            )?;
        }

        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
        let user = tx.query_row(&sql, params![new_email], user_from_row)?;
        tx.commit()?;

        Ok(user)
    }

    fn mark_verified(&self, email: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let rows_affected = conn.execute(
            "UPDATE users SET verified = 1 WHERE email = ?1",
            params![email.to_lowercase()],
        )?;

        if rows_affected == 0 {
            return Err(PanelError::UserNotFound);
        }

        Ok(())
    }

    fn update_password(&self, user_id: UserId, password_hash: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let rows_affected = conn.execute(
            "UPDATE users SET password_hash = ?1 WHERE id = ?2",
            params![password_hash, user_id.0 as i64],
        )?;

        if rows_affected == 0 {
            return Err(PanelError::UserNotFound);
        }

        Ok(())
    }

    fn record_login(&self, user_id: UserId, at: DateTime<Utc>) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let rows_affected = conn.execute(
            "UPDATE users SET last_login = ?1 WHERE id = ?2",
            params![to_db_time(at), user_id.0 as i64],
        )?;

        if rows_affected == 0 {
            return Err(PanelError::UserNotFound);
        }

        Ok(())
    }

    fn delete_user(&self, user_id: UserId) -> StoreResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let email: Option<String> = tx
            .query_row(
                "SELECT email FROM users WHERE id = ?1",
                params![user_id.0 as i64],
                |row| row.get(0),
            )
            .optional()?;
        let email = email.ok_or(PanelError::UserNotFound)?;

        tx.execute(
            "DELETE FROM verification_tokens WHERE subject = ?1",
            params![email],
        )?;
        // Sessions go with the user through ON DELETE CASCADE
        tx.execute("DELETE FROM users WHERE id = ?1", params![user_id.0 as i64])?;
        tx.commit()?;

        Ok(())
    }
}

impl TokenStore for SqliteStore {
    fn insert_token(&self, token: VerificationToken) -> TokenResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO verification_tokens
                (selector, purpose, subject, secret_hash, issued_at, expires_at, consumed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                token.selector,
                token.purpose.as_str(),
                token.subject,
                token.secret_hash,
                to_db_time(token.issued_at),
                to_db_time(token.expires_at),
                token.consumed_at.map(to_db_time),
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                StoreError::Conflict
            } else {
                backend(e)
            }
        })?;

        Ok(())
    }

    fn find_token(
        &self,
        selector: &str,
        purpose: Purpose,
    ) -> TokenResult<Option<VerificationToken>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {TOKEN_COLUMNS} FROM verification_tokens WHERE selector = ?1 AND purpose = ?2"
        );
        conn.query_row(&sql, params![selector, purpose.as_str()], token_from_row)
            .optional()
            .map_err(backend)
    }

    fn consume_token(
        &self,
        selector: &str,
        purpose: Purpose,
        now: DateTime<Utc>,
    ) -> TokenResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows_affected = conn
            .execute(
                "UPDATE verification_tokens SET consumed_at = ?1
                 WHERE selector = ?2 AND purpose = ?3
                   AND consumed_at IS NULL AND expires_at >= ?1",
                params![to_db_time(now), selector, purpose.as_str()],
            )
            .map_err(backend)?;

        Ok(rows_affected == 1)
    }

    fn delete_token(&self, selector: &str, purpose: Purpose) -> TokenResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM verification_tokens WHERE selector = ?1 AND purpose = ?2",
            params![selector, purpose.as_str()],
        )
        .map_err(backend)?;

        Ok(())
    }

    fn delete_tokens_for_subject(&self, subject: &str) -> TokenResult<u64> {
        let conn = self.conn.lock().unwrap();
        let rows_deleted = conn
            .execute(
                "DELETE FROM verification_tokens WHERE subject = ?1",
                params![subject],
            )
            .map_err(backend)?;

        Ok(rows_deleted as u64)
    }

    fn purge_tokens(&self, now: DateTime<Utc>) -> TokenResult<u64> {
        let conn = self.conn.lock().unwrap();
        let rows_deleted = conn
            .execute(
                "DELETE FROM verification_tokens
                 WHERE consumed_at IS NOT NULL OR expires_at < ?1",
                params![to_db_time(now)],
            )
            .map_err(backend)?;

        Ok(rows_deleted as u64)
    }
}

impl SessionStore for SqliteStore {
    fn create(&self, user_id: UserId) -> StoreResult<Session> {
        let conn = self.conn.lock().unwrap();
        let session = Session {
            id: SessionId(Uuid::new_v4().to_string()),
            user_id,
            created_at: Utc::now(),
        };

        conn.execute(
            "INSERT INTO sessions (id, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![
                session.id.0,
                session.user_id.0 as i64,
                to_db_time(session.created_at),
            ],
        )?;

        Ok(session)
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        let conn = self.conn.lock().unwrap();

        Ok(conn
            .query_row(
                "SELECT id, user_id, created_at FROM sessions WHERE id = ?1",
                params![session_id.0],
                |row| {
                    let id: String = row.get(0)?;
                    let user_id: i64 = row.get(1)?;
                    let created_at: String = row.get(2)?;
                    Ok(Session {
                        id: SessionId(id),
                        user_id: UserId(user_id as u64),
                        created_at: from_db_time(&created_at),
                    })
                },
            )
            .optional()?)
    }

    fn delete(&self, session_id: &SessionId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id.0])?;
        Ok(())
    }

    fn delete_for_user(&self, user_id: UserId) -> StoreResult<u64> {
        let conn = self.conn.lock().unwrap();
        let rows_deleted = conn.execute(
            "DELETE FROM sessions WHERE user_id = ?1",
            params![user_id.0 as i64],
        )?;
        Ok(rows_deleted as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn create_test_store() -> (SqliteStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let store = SqliteStore::open(path.to_str().unwrap()).unwrap();
        (store, dir) // Return dir to keep it alive
    }

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hashed_password".to_string(),
        }
    }

    fn token(selector: &str, subject: &str, now: DateTime<Utc>) -> VerificationToken {
        VerificationToken {
            selector: selector.to_string(),
            purpose: Purpose::RegistrationConfirmation,
            subject: subject.to_string(),
            secret_hash: "hash".to_string(),
            issued_at: now,
            expires_at: now + Duration::minutes(10),
            consumed_at: None,
        }
    }

    #[test]
    fn test_create_user_and_email() {
        let (store, _dir) = create_test_store();

        let user_id = store
            .create_user(new_user("alice", "alice@example.com"))
            .unwrap()
            .id;

        let user = store.get_user_by_email("alice@example.com").unwrap();
        assert!(user.is_some());
        assert_eq!(user.unwrap().id, user_id);
    }

    #[test]
    fn test_first_account_is_admin() {
        let (store, _dir) = create_test_store();

        let first = store.create_user(new_user("alice", "alice@example.com")).unwrap();
        let second = store.create_user(new_user("bob", "bob@example.com")).unwrap();

        assert_eq!(first.user_type, UserType::Admin);
        assert_eq!(second.user_type, UserType::Publisher);
        assert_eq!(
            store.get_user(second.id).unwrap().unwrap().user_type,
            UserType::Publisher
        );
    }

    #[test]
    fn test_concurrent_first_accounts_single_admin() {
        let (store, _dir) = create_test_store();
        let threads = 8;
        let barrier = Arc::new(std::sync::Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let store = store.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    store
                        .create_user(new_user(&format!("user{i}"), &format!("user{i}@example.com")))
                        .unwrap()
                })
            })
            .collect();

        let admins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|u| u.user_type == UserType::Admin)
            .count();
        assert_eq!(admins, 1);
    }

    #[test]
    fn test_malformed_token_time_is_an_error() {
        let (store, _dir) = create_test_store();
        store
            .insert_token(token("sel", "alice@example.com", Utc::now()))
            .unwrap();
        store
            .conn
            .lock()
            .unwrap()
            .execute(
                "UPDATE verification_tokens SET expires_at = 'not a time' WHERE selector = 'sel'",
                [],
            )
            .unwrap();

        let result = store.find_token("sel", Purpose::RegistrationConfirmation);
        assert!(matches!(result, Err(StoreError::Backend(_))));
    }

    #[test]
    fn test_email_case_insensitive() {
        let (store, _dir) = create_test_store();

        store.create_user(new_user("alice", "Test@Example.COM")).unwrap();

        assert!(store.get_user_by_email("test@example.com").unwrap().is_some());
        assert!(store.get_user_by_email("TEST@EXAMPLE.COM").unwrap().is_some());
    }

    #[test]
    fn test_duplicate_email_and_username_rejected() {
        let (store, _dir) = create_test_store();

        store.create_user(new_user("alice", "alice@example.com")).unwrap();

        let result = store.create_user(new_user("bob", "alice@example.com"));
        assert!(matches!(result, Err(PanelError::EmailAlreadyExists)));

        let result = store.create_user(new_user("alice", "bob@example.com"));
        assert!(matches!(result, Err(PanelError::UsernameTaken)));
    }

    #[test]
    fn test_verify_and_login_tracking() {
        let (store, _dir) = create_test_store();
        let id = store.create_user(new_user("alice", "alice@example.com")).unwrap().id;

        store.mark_verified("ALICE@example.com").unwrap();
        let at = Utc::now();
        store.record_login(id, at).unwrap();

        let user = store.get_user(id).unwrap().unwrap();
        assert!(user.verified);
        assert_eq!(user.last_login.map(to_db_time), Some(to_db_time(at)));
    }

    #[test]
    fn test_token_round_trip_and_consume() {
        let (store, _dir) = create_test_store();
        let now = Utc::now();
        store.insert_token(token("sel", "alice@example.com", now)).unwrap();

        let found = store
            .find_token("sel", Purpose::RegistrationConfirmation)
            .unwrap()
            .unwrap();
        assert_eq!(found.subject, "alice@example.com");
        assert!(found.consumed_at.is_none());

        assert!(store
            .consume_token("sel", Purpose::RegistrationConfirmation, now)
            .unwrap());
        assert!(!store
            .consume_token("sel", Purpose::RegistrationConfirmation, now)
            .unwrap());

        let found = store
            .find_token("sel", Purpose::RegistrationConfirmation)
            .unwrap()
            .unwrap();
        assert!(found.consumed_at.is_some());
    }

    #[test]
    fn test_duplicate_selector_conflicts() {
        let (store, _dir) = create_test_store();
        let now = Utc::now();
        store.insert_token(token("sel", "a@example.com", now)).unwrap();

        let result = store.insert_token(token("sel", "b@example.com", now));
        assert!(matches!(result, Err(StoreError::Conflict)));
    }

    #[test]
    fn test_consume_refuses_expired() {
        let (store, _dir) = create_test_store();
        let now = Utc::now();
        store.insert_token(token("sel", "a@example.com", now)).unwrap();

        assert!(!store
            .consume_token(
                "sel",
                Purpose::RegistrationConfirmation,
                now + Duration::hours(1)
            )
            .unwrap());
    }

    #[test]
    fn test_purge_tokens() {
        let (store, _dir) = create_test_store();
        let now = Utc::now();

        store.insert_token(token("live", "a@example.com", now)).unwrap();
        let mut expired = token("expired", "a@example.com", now - Duration::hours(2));
        expired.expires_at = now - Duration::hours(1);
        store.insert_token(expired).unwrap();
        store.insert_token(token("used", "a@example.com", now)).unwrap();
        store
            .consume_token("used", Purpose::RegistrationConfirmation, now)
            .unwrap();

        assert_eq!(store.purge_tokens(now).unwrap(), 2);
        assert!(store
            .find_token("live", Purpose::RegistrationConfirmation)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_update_email_drops_old_tokens() {
        let (store, _dir) = create_test_store();
        store.create_user(new_user("alice", "alice@example.com")).unwrap();
        store
            .insert_token(token("sel", "alice@example.com", Utc::now()))
            .unwrap();

        let user = store
            .update_user("alice@example.com", "new@example.com", UserType::Admin)
            .unwrap();
        assert_eq!(user.email, "new@example.com");
        assert_eq!(user.user_type, UserType::Admin);
        assert!(store
            .find_token("sel", Purpose::RegistrationConfirmation)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_update_to_taken_email_rejected() {
        let (store, _dir) = create_test_store();
        store.create_user(new_user("alice", "alice@example.com")).unwrap();
        store.create_user(new_user("bob", "bob@example.com")).unwrap();

        let result = store.update_user("alice@example.com", "bob@example.com", UserType::Publisher);
        assert!(matches!(result, Err(PanelError::EmailAlreadyExists)));
    }

    #[test]
    fn test_delete_user_cascades() {
        let (store, _dir) = create_test_store();

        let user_id = store
            .create_user(new_user("alice", "alice@example.com"))
            .unwrap()
            .id;
        let session = store.create(user_id).unwrap();
        store
            .insert_token(token("sel", "alice@example.com", Utc::now()))
            .unwrap();

        store.delete_user(user_id).unwrap();

        assert!(store.get_user(user_id).unwrap().is_none());
        assert!(store.get(&session.id).unwrap().is_none());
        assert!(store
            .find_token("sel", Purpose::RegistrationConfirmation)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let path = path.to_str().unwrap();

        {
            let store = SqliteStore::open(path).unwrap();
            store.create_user(new_user("alice", "alice@example.com")).unwrap();
        }

        let store = SqliteStore::open(path).unwrap();
        assert_eq!(store.list_users().unwrap().len(), 1);
    }
}
