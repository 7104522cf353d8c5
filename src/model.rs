//! Canonical in-memory representations of Matchpoint domain entities
//!
//! The backend's wire shapes vary between deployments; everything past the
//! normalizer (see [`crate::normalize`]) works with these fixed types only.

use serde::{Deserialize, Serialize};

/// An account holder
///
/// `id` is absent for users the backend has acknowledged but not yet
/// persisted (registration responses without a body).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned identifier, when known
    pub id: Option<String>,

    /// The user's email address
    pub email: String,

    /// Display name
    pub name: Option<String>,

    /// Free-form location label
    pub location: Option<String>,
}

/// Result of a login or registration call
///
/// An empty `access_token` means the backend accepted the request without
/// issuing a session; callers must authenticate separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResult {
    /// The bearer token, possibly empty
    pub access_token: String,

    /// The authenticated (or newly registered) user
    pub user: User,
}

impl AuthResult {
    /// Whether the backend issued a usable session token
    pub fn has_token(&self) -> bool {
        !self.access_token.is_empty()
    }
}

/// A sport a candidate plays, with display metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sport {
    /// The sport name
    pub name: String,

    /// Icon identifier for the sport
    pub icon: String,

    /// Self-reported skill level
    pub level: String,
}

/// Default icon assigned to sports derived from a bare interest list
pub const DEFAULT_SPORT_ICON: &str = "sportscourt";

/// Default level assigned to sports derived from a bare interest list
pub const DEFAULT_SPORT_LEVEL: &str = "Beginner";

impl Sport {
    /// Build a sport entry from a bare name, using display defaults
    pub fn from_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: DEFAULT_SPORT_ICON.to_string(),
            level: DEFAULT_SPORT_LEVEL.to_string(),
        }
    }
}

/// A candidate profile presented for a swipe decision
///
/// Every display field is concrete: normalization resolves missing wire
/// fields to the defaults produced by [`Profile::placeholder`], so the
/// presentation layer never sees a null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Identifier; synthesized when the backend omits one
    pub id: String,

    /// Display name
    pub name: String,

    /// Age in years (0 when unknown)
    pub age: u32,

    /// Primary image URL; always renderable, see image fallback chain
    pub avatar_url: String,

    /// Wide cover image URL
    pub cover_image_url: String,

    /// Free-form location label
    pub location: String,

    /// Preformatted distance text, e.g. "2.5 km away"
    pub distance_label: String,

    /// Short self-description
    pub bio: String,

    /// Sports the candidate plays, in server order
    pub sports: Vec<Sport>,

    /// Interest tags, in server order
    pub interests: Vec<String>,

    /// Average rating (0.0 when unrated)
    pub rating: f64,

    /// Number of activities the candidate has joined
    pub activities_joined_count: u32,
}

impl Profile {
    /// The "unknown" profile for a given id: the defaults every optional
    /// wire field resolves to
    pub fn placeholder(id: impl Into<String>) -> Self {
        let id = id.into();
        let avatar = placeholder_image_url(&id);
        Self {
            id,
            name: "Unknown".to_string(),
            age: 0,
            cover_image_url: avatar.clone(),
            avatar_url: avatar,
            location: String::new(),
            distance_label: String::new(),
            bio: String::new(),
            sports: Vec::new(),
            interests: Vec::new(),
            rating: 0.0,
            activities_joined_count: 0,
        }
    }
}

/// Deterministic placeholder image for a profile, keyed by its id
pub fn placeholder_image_url(id: &str) -> String {
    format!("https://i.pravatar.cc/300?u={}", id)
}

/// Position within the paginated profile feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    /// Next page to request; increments only after a successful fetch
    pub current_page: u32,

    /// Profiles requested per page
    pub page_size: u32,

    /// False only once a page response reports `page == totalPages`
    pub has_more: bool,
}

impl PageInfo {
    /// Pagination state before any page has been fetched
    pub fn initial(page_size: u32) -> Self {
        Self {
            current_page: 1,
            page_size,
            has_more: true,
        }
    }
}

/// Server-reported pagination metadata accompanying a profile page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    /// Total number of profiles in the feed
    pub total: u32,

    /// The page this response holds
    pub page: u32,

    /// Total number of pages in the feed
    pub total_pages: u32,

    /// Page size the server applied
    pub limit: u32,
}

/// Read-only view of a swipe session, published to subscribers
///
/// The engine owns the underlying state; presentation code only ever sees
/// these snapshots and issues commands back to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SwipeSnapshot {
    /// Remaining candidates in server page order, unique by id
    pub queue: Vec<Profile>,

    /// Index of the current candidate; never exceeds `queue.len()`
    pub cursor_index: usize,

    /// Optimistic like counter: incremented when the swipe is issued, not
    /// when the server confirms it
    pub liked_count: u32,

    /// A mutual match being surfaced, cleared automatically after the
    /// configured display duration
    pub pending_match: Option<Profile>,

    /// Pagination position
    pub page: PageInfo,

    /// Whether a page load is in flight
    pub loading: bool,

    /// Message of the most recent failed operation, for transient display
    pub last_error: Option<String>,
}

impl SwipeSnapshot {
    /// Fresh session state for the given page size
    pub fn initial(page_size: u32) -> Self {
        Self {
            queue: Vec::new(),
            cursor_index: 0,
            liked_count: 0,
            pending_match: None,
            page: PageInfo::initial(page_size),
            loading: false,
            last_error: None,
        }
    }

    /// The candidate currently presented for a decision
    pub fn current_candidate(&self) -> Option<&Profile> {
        self.queue.get(self.cursor_index)
    }
}

/// Server response to a like call
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    /// Whether the like completed a mutual match
    pub is_match: bool,

    /// The other party's profile, present when `is_match` is true
    pub matched_profile: Option<Profile>,
}

/// Result of checking a password-reset token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetTokenCheck {
    /// Whether the token is still usable
    pub valid: bool,

    /// Optional server-provided explanation
    pub message: Option<String>,
}

/// Swipe direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    /// Pass on the candidate
    Left,
    /// Like the candidate
    Right,
}
