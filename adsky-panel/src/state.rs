//! Panel application state

use std::sync::Arc;

use adsky_core::{TokenError, VerificationTokenService};

use crate::config::Config;
use crate::email::EmailSender;
use crate::store::{SessionStore, UserStore};

/// Everything a request handler needs, built once in `main`
pub struct AppState<U, S, E> {
    pub config: Config,
    pub user_store: Arc<U>,
    pub session_store: Arc<S>,
    pub email_sender: E,
    /// Token service backed by the account store
    pub tokens: Arc<VerificationTokenService<Arc<U>>>,
}

impl<U, S, E> AppState<U, S, E>
where
    U: UserStore,
    S: SessionStore,
    E: EmailSender,
{
    pub fn new(
        config: Config,
        user_store: U,
        session_store: S,
        email_sender: E,
    ) -> Result<Self, TokenError> {
        let user_store = Arc::new(user_store);
        let tokens = VerificationTokenService::new(Arc::clone(&user_store), config.tokens.clone())?;

        Ok(Self {
            config,
            user_store,
            session_store: Arc::new(session_store),
            email_sender,
            tokens: Arc::new(tokens),
        })
    }
}
