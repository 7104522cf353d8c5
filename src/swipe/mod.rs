//! Swipe session engine
//!
//! Serves one candidate at a time from a paginated queue, applies swipe
//! decisions optimistically, and keeps the queue topped up by prefetching
//! the next page before the current one runs out.
//!
//! Mutation rules: the engine is the only writer of its queue and cursor.
//! Like/pass completions mutate the queue solely by filtering on the
//! swiped profile's id, which is commutative and idempotent, so calls
//! completing out of swipe order are harmless. A generation counter makes
//! completions that arrive after [`SwipeEngine::reset`] no-ops.

use log::{debug, warn};
use reqwest::Client;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use crate::auth::AuthSession;
use crate::config::ClientOptions;
use crate::error::Error;
use crate::fetch::{Fetch, FetchBuilder};
use crate::model::{PageMeta, Profile, SwipeDirection, SwipeSnapshot};
use crate::normalize;

/// Client for the candidate feed and swipe decisions
#[derive(Clone)]
pub struct SwipeEngine {
    inner: Arc<Inner>,
}

struct Inner {
    /// The base URL for the Matchpoint backend
    base_url: String,

    /// HTTP client used for requests
    client: Client,

    /// Client options
    options: ClientOptions,

    /// Session store, read for the bearer token only
    auth: Arc<AuthSession>,

    /// Published state
    state: watch::Sender<SwipeSnapshot>,

    /// Bumped by reset; async completions from an older generation are
    /// dropped instead of mutating the new session
    generation: AtomicU64,
}

impl SwipeEngine {
    /// Create a new SwipeEngine
    pub(crate) fn new(
        base_url: &str,
        client: Client,
        options: ClientOptions,
        auth: Arc<AuthSession>,
    ) -> Self {
        let (state, _) = watch::channel(SwipeSnapshot::initial(options.page_size));
        Self {
            inner: Arc::new(Inner {
                base_url: base_url.to_string(),
                client,
                options,
                auth,
                state,
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// The current state
    pub fn snapshot(&self) -> SwipeSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to state changes; the receiver always holds the latest
    /// snapshot
    pub fn subscribe(&self) -> watch::Receiver<SwipeSnapshot> {
        self.inner.state.subscribe()
    }

    /// The candidate currently presented for a decision
    pub fn current_candidate(&self) -> Option<Profile> {
        self.inner.state.borrow().current_candidate().cloned()
    }

    /// Fetch the next page of candidates
    ///
    /// Page loads are serialized: a call while one is already in flight,
    /// or after the feed is exhausted, is a no-op. The first page replaces
    /// the queue, later pages append; `current_page` only advances on
    /// success.
    pub async fn load_page(&self) -> Result<(), Error> {
        let generation = self.generation();
        let mut requested_page = 0;
        let acquired = self.inner.state.send_if_modified(|s| {
            if s.loading || !s.page.has_more {
                return false;
            }
            s.loading = true;
            requested_page = s.page.current_page;
            true
        });
        if !acquired {
            return Ok(());
        }

        let result = self.fetch_page(requested_page).await;

        if self.generation() != generation {
            // The session was reset while the request was in flight.
            return Ok(());
        }

        match result {
            Ok((profiles, meta)) => {
                debug!(
                    "loaded page {} ({} profiles, {} total pages)",
                    meta.page,
                    profiles.len(),
                    meta.total_pages
                );
                self.inner.state.send_modify(|s| {
                    if requested_page == 1 {
                        s.queue = profiles;
                    } else {
                        for profile in profiles {
                            if !s.queue.iter().any(|q| q.id == profile.id) {
                                s.queue.push(profile);
                            }
                        }
                    }
                    s.page.current_page = requested_page + 1;
                    s.page.has_more = meta.page < meta.total_pages;
                    s.loading = false;
                    s.last_error = None;
                });
                Ok(())
            }
            Err(err) => {
                let message = err.user_message();
                self.inner.state.send_modify(|s| {
                    s.loading = false;
                    s.last_error = Some(message);
                });
                Err(err)
            }
        }
    }

    /// Apply a swipe decision to a candidate
    ///
    /// Returns immediately. The like/pass call runs in the background, and
    /// the cursor advances after the configured settle delay whether or
    /// not that call has completed: the session moves forward
    /// optimistically, and a failed call is only recorded, never rolled
    /// back (the swiped profile is not re-inserted).
    pub fn swipe(&self, direction: SwipeDirection, profile: &Profile) {
        let generation = self.generation();

        if direction == SwipeDirection::Right {
            // Optimistic: counted when the swipe is issued.
            self.inner.state.send_modify(|s| s.liked_count += 1);
        }

        let engine = self.clone();
        let swiped = profile.clone();
        tokio::spawn(async move {
            engine.complete_swipe(generation, direction, swiped).await;
        });

        let engine = self.clone();
        let delay = self.inner.options.swipe_advance_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            engine.advance(generation).await;
        });
    }

    /// Clear all session state and start over
    pub fn reset(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        let initial = SwipeSnapshot::initial(self.inner.options.page_size);
        self.inner.state.send_modify(|s| *s = initial);
    }

    fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    fn authorized<'a>(&self, builder: FetchBuilder<'a>) -> FetchBuilder<'a> {
        match self.inner.auth.access_token() {
            Some(token) => builder.bearer_auth(&token),
            None => builder,
        }
    }

    async fn fetch_page(&self, page: u32) -> Result<(Vec<Profile>, PageMeta), Error> {
        let url = format!("{}/profiles", self.inner.base_url);
        let params: HashMap<String, String> = [
            ("page".to_string(), page.to_string()),
            (
                "limit".to_string(),
                self.inner.options.page_size.to_string(),
            ),
        ]
        .into();
        let body = self
            .authorized(Fetch::get(&self.inner.client, &url))
            .query(params)
            .execute()
            .await?;
        let page = normalize::profile_page(&body)?;
        Ok(page)
    }

    /// Run the like/pass call for a swipe and reconcile the queue
    async fn complete_swipe(&self, generation: u64, direction: SwipeDirection, profile: Profile) {
        let path = match direction {
            SwipeDirection::Right => "/like",
            SwipeDirection::Left => "/pass",
        };
        let url = format!("{}{}", self.inner.base_url, path);
        let result = async {
            self.authorized(Fetch::post(&self.inner.client, &url))
                .json(&json!({"profileId": profile.id}))?
                .execute()
                .await
        }
        .await;

        if self.generation() != generation {
            return;
        }

        // The removal is an optimistic, id-based mutation: it applies
        // whether or not the call succeeded, and a failure never
        // re-inserts the profile.
        self.inner.state.send_modify(|s| {
            s.queue.retain(|q| q.id != profile.id);
            s.cursor_index = s.cursor_index.min(s.queue.len());
        });

        match result {
            Ok(body) => {
                if direction == SwipeDirection::Right {
                    let outcome = normalize::match_outcome(&body);
                    if outcome.is_match {
                        let matched = outcome.matched_profile.unwrap_or(profile);
                        self.surface_match(generation, matched);
                    }
                }
            }
            Err(err) => {
                warn!("swipe call failed for profile {}: {}", profile.id, err);
                let message = err.user_message();
                self.inner
                    .state
                    .send_modify(|s| s.last_error = Some(message));
            }
        }
    }

    /// Surface a mutual match, clearing it after the display duration
    fn surface_match(&self, generation: u64, matched: Profile) {
        let matched_id = matched.id.clone();
        self.inner
            .state
            .send_modify(|s| s.pending_match = Some(matched));

        let engine = self.clone();
        let duration = self.inner.options.match_display_duration;
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if engine.generation() != generation {
                return;
            }
            engine.inner.state.send_modify(|s| {
                if s.pending_match.as_ref().map(|p| p.id.as_str()) == Some(matched_id.as_str()) {
                    s.pending_match = None;
                }
            });
        });
    }

    /// Advance the cursor after a swipe and prefetch when the queue runs low
    async fn advance(&self, generation: u64) {
        if self.generation() != generation {
            return;
        }
        let mut near_end = false;
        self.inner.state.send_modify(|s| {
            if s.cursor_index < s.queue.len() {
                s.cursor_index += 1;
            }
            near_end =
                s.page.has_more && s.queue.len() - s.cursor_index <= self.inner.options.prefetch_threshold;
        });
        if near_end {
            if let Err(err) = self.load_page().await {
                debug!("prefetch failed: {}", err);
            }
        }
    }
}
