//! Configuration options for the Matchpoint client

use std::time::Duration;

/// Configuration options for the Matchpoint client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Number of profiles requested per page
    pub page_size: u32,

    /// How close the cursor may come to the end of the queue before the
    /// next page is prefetched
    pub prefetch_threshold: usize,

    /// Delay between a swipe and the cursor advancing, letting any card
    /// transition settle before the next candidate is shown
    pub swipe_advance_delay: Duration,

    /// How long a mutual match stays surfaced before it is cleared
    pub match_display_duration: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            page_size: 20,
            prefetch_threshold: 2,
            swipe_advance_delay: Duration::from_millis(300),
            match_display_duration: Duration::from_secs(3),
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the profile page size
    pub fn with_page_size(mut self, value: u32) -> Self {
        self.page_size = value;
        self
    }

    /// Set the prefetch threshold
    pub fn with_prefetch_threshold(mut self, value: usize) -> Self {
        self.prefetch_threshold = value;
        self
    }

    /// Set the delay between a swipe and the cursor advance
    pub fn with_swipe_advance_delay(mut self, value: Duration) -> Self {
        self.swipe_advance_delay = value;
        self
    }

    /// Set how long a mutual match stays surfaced
    pub fn with_match_display_duration(mut self, value: Duration) -> Self {
        self.match_display_duration = value;
        self
    }
}
