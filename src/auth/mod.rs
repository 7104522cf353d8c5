//! Authentication session management
//!
//! [`AuthSession`] is the single owner of the current user and session
//! token. It is a two-state machine, logged out or logged in, and every
//! operation leaves it in a consistent state: a failed login or
//! registration never produces a partially authenticated session.

mod token;

use log::{debug, warn};
use reqwest::Client;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::error::Error;
use crate::fetch::Fetch;
use crate::model::{AuthResult, ResetTokenCheck, User};
use crate::normalize::{self, SubmittedIdentity};

pub use token::{MemoryTokenStore, TokenStore, TokenStoreError};

/// Read-only view of the authentication state, published to subscribers
#[derive(Debug, Clone, Default)]
pub struct AuthSnapshot {
    /// Whether a session token is held
    pub logged_in: bool,

    /// The current user; `None` while logged out, and also `None` for a
    /// session restored from a persisted token (see [`AuthSession::restore`])
    pub user: Option<User>,

    /// Message of the most recent failed operation, for transient display
    pub last_error: Option<String>,
}

/// Client for authentication against the Matchpoint API
pub struct AuthSession {
    /// The base URL for the Matchpoint backend
    base_url: String,

    /// HTTP client used for requests
    client: Client,

    /// Injected token persistence capability
    tokens: Arc<dyn TokenStore>,

    /// The current session token
    token: Mutex<Option<String>>,

    /// Published state
    state: watch::Sender<AuthSnapshot>,
}

impl AuthSession {
    /// Create a new AuthSession
    pub(crate) fn new(base_url: &str, client: Client, tokens: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(AuthSnapshot::default());
        Self {
            base_url: base_url.to_string(),
            client,
            tokens,
            token: Mutex::new(None),
            state,
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth{}", self.base_url, path)
    }

    /// The current session token, read-only for other components
    pub fn access_token(&self) -> Option<String> {
        self.token.lock().ok().and_then(|slot| slot.clone())
    }

    /// The current state
    pub fn snapshot(&self) -> AuthSnapshot {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes; the receiver always holds the latest
    /// snapshot
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    /// The currently known user, if any
    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    /// Restore a session from a previously persisted token
    ///
    /// Returns whether a session was restored. A restored session holds no
    /// user object; the user stays unknown until re-fetched. That gap is
    /// part of the contract, not something this method papers over.
    pub async fn restore(&self) -> Result<bool, Error> {
        match self.tokens.load().await? {
            Some(token) => {
                self.set_token(Some(token));
                self.state.send_modify(|s| {
                    s.logged_in = true;
                    s.user = None;
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Log in with email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<User, Error> {
        let result = self
            .run(async {
                let url = self.auth_url("/login");
                let body = Fetch::post(&self.client, &url)
                    .json(&json!({"email": email, "password": password}))?
                    .execute()
                    .await?;
                let auth =
                    normalize::auth_result(&body, &SubmittedIdentity::email_only(email))?;
                self.establish(auth).await
            })
            .await?;
        Ok(result)
    }

    /// Register a new account
    ///
    /// Some backend deployments acknowledge registration without issuing a
    /// token. In that case the account exists but no session does, so this
    /// falls through to [`AuthSession::login`] with the same credentials.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
        location: &str,
    ) -> Result<User, Error> {
        let registered = self
            .run(async {
                let url = self.auth_url("/register");
                let body = Fetch::post(&self.client, &url)
                    .json(&json!({
                        "email": email,
                        "password": password,
                        "name": name,
                        "location": location,
                    }))?
                    .execute()
                    .await?;
                let submitted = SubmittedIdentity {
                    email: email.to_string(),
                    name: Some(name.to_string()),
                    location: Some(location.to_string()),
                };
                normalize::auth_result(&body, &submitted)
                    .map_err(Error::from)
            })
            .await?;

        if registered.has_token() {
            self.run(async { self.establish(registered).await }).await
        } else {
            debug!("registration issued no token, logging in explicitly");
            self.login(email, password).await
        }
    }

    /// Log out
    ///
    /// Token removal is best-effort: a persistence failure is logged and
    /// swallowed, the in-memory transition to logged out always happens.
    pub async fn logout(&self) {
        if let Err(err) = self.tokens.remove().await {
            warn!("failed to remove persisted token: {}", err);
        }
        self.set_token(None);
        self.state.send_modify(|s| {
            s.logged_in = false;
            s.user = None;
        });
    }

    /// Request a password-reset email
    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>, Error> {
        self.run(async {
            let url = self.auth_url("/forgot-password");
            let body = Fetch::post(&self.client, &url)
                .json(&json!({"email": email}))?
                .execute()
                .await?;
            Ok(normalize::message(&body))
        })
        .await
    }

    /// Check whether a password-reset token is still valid
    pub async fn validate_reset_token(&self, token: &str) -> Result<ResetTokenCheck, Error> {
        self.run(async {
            let url = self.auth_url("/reset-password");
            let body = Fetch::get(&self.client, &url)
                .query([("token".to_string(), token.to_string())].into())
                .execute()
                .await?;
            Ok(normalize::reset_token_check(&body))
        })
        .await
    }

    /// Set a new password using a reset token
    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
    ) -> Result<Option<String>, Error> {
        self.run(async {
            let url = self.auth_url("/reset-password");
            let body = Fetch::post(&self.client, &url)
                .json(&json!({"token": token, "password": password}))?
                .execute()
                .await?;
            Ok(normalize::message(&body))
        })
        .await
    }

    /// Persist the token and transition to logged in
    async fn establish(&self, auth: AuthResult) -> Result<User, Error> {
        self.tokens.save(&auth.access_token).await?;
        self.set_token(Some(auth.access_token));
        let user = auth.user;
        self.state.send_modify(|s| {
            s.logged_in = true;
            s.user = Some(user.clone());
            s.last_error = None;
        });
        Ok(user)
    }

    fn set_token(&self, token: Option<String>) {
        if let Ok(mut slot) = self.token.lock() {
            *slot = token;
        }
    }

    /// Run an operation, recording its error message for display on failure
    async fn run<T>(
        &self,
        op: impl std::future::Future<Output = Result<T, Error>>,
    ) -> Result<T, Error> {
        match op.await {
            Ok(value) => Ok(value),
            Err(err) => {
                let message = err.user_message();
                self.state.send_modify(|s| s.last_error = Some(message));
                Err(err)
            }
        }
    }
}
