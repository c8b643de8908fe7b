//! AdSky Panel
//!
//! Account management for the AdSky admin panel: registration with email
//! confirmation, login sessions, password recovery and admin user CRUD.

pub mod config;
pub mod crypto;
pub mod email;
pub mod error;
pub mod routes;
pub mod state;
pub mod store;
pub mod sweeper;

pub use config::Config;
pub use email::{ConsoleEmailSender, EmailSender, SmtpConfig, SmtpEmailSender};
pub use error::PanelError;
pub use state::AppState;
pub use store::{InMemorySessionStore, InMemoryUserStore, SessionStore, SqliteStore, UserStore};
pub use sweeper::spawn_sweeper;
