//! Matchpoint Rust Client Library
//!
//! An async client for the Matchpoint sports-partner matching API. The
//! backend's wire shapes are not contractually fixed, so every response
//! passes through a tolerant normalization layer ([`normalize`]) before
//! reaching the canonical domain model ([`model`]). On top of that sit the
//! two stateful components: the authentication session ([`auth`]) and the
//! swipe session engine ([`swipe`]).

pub mod auth;
pub mod config;
pub mod error;
pub mod fetch;
pub mod model;
pub mod normalize;
pub mod swipe;

use reqwest::Client;
use std::sync::Arc;

use crate::auth::{AuthSession, MemoryTokenStore, TokenStore};
use crate::config::ClientOptions;
use crate::swipe::SwipeEngine;

/// The main entry point for the Matchpoint client
pub struct Matchpoint {
    /// The base URL for the Matchpoint backend
    pub url: String,

    /// HTTP client used for requests
    pub http_client: Client,

    /// Client options
    pub options: ClientOptions,

    auth: Arc<AuthSession>,
    swipe: SwipeEngine,
}

impl Matchpoint {
    /// Create a new Matchpoint client with default options and an
    /// in-memory token store
    ///
    /// # Example
    ///
    /// ```
    /// use matchpoint_client::Matchpoint;
    ///
    /// let matchpoint = Matchpoint::new("https://api.matchpoint.example");
    /// ```
    pub fn new(base_url: &str) -> Self {
        Self::new_with_options(
            base_url,
            ClientOptions::default(),
            Arc::new(MemoryTokenStore::new()),
        )
    }

    /// Create a new Matchpoint client with custom options and token store
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use matchpoint_client::auth::MemoryTokenStore;
    /// use matchpoint_client::config::ClientOptions;
    /// use matchpoint_client::Matchpoint;
    ///
    /// let options = ClientOptions::default().with_page_size(10);
    /// let matchpoint = Matchpoint::new_with_options(
    ///     "https://api.matchpoint.example",
    ///     options,
    ///     Arc::new(MemoryTokenStore::new()),
    /// );
    /// ```
    pub fn new_with_options(
        base_url: &str,
        options: ClientOptions,
        token_store: Arc<dyn TokenStore>,
    ) -> Self {
        let base_url = base_url.trim_end_matches('/');
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().unwrap_or_default();

        let auth = Arc::new(AuthSession::new(base_url, http_client.clone(), token_store));
        let swipe = SwipeEngine::new(
            base_url,
            http_client.clone(),
            options.clone(),
            auth.clone(),
        );

        Self {
            url: base_url.to_string(),
            http_client,
            options,
            auth,
            swipe,
        }
    }

    /// The authentication session store
    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    /// The swipe session engine
    pub fn swipe(&self) -> &SwipeEngine {
        &self.swipe
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{AuthSession, AuthSnapshot, MemoryTokenStore, TokenStore};
    pub use crate::config::ClientOptions;
    pub use crate::error::{Error, NormalizationError};
    pub use crate::model::{
        AuthResult, MatchOutcome, Profile, Sport, SwipeDirection, SwipeSnapshot, User,
    };
    pub use crate::swipe::SwipeEngine;
    pub use crate::Matchpoint;
}
