//! Tolerant decoding of Matchpoint API responses
//!
//! The backend is not contractually fixed: identifiers arrive as `id` or
//! `_id`, tokens as `accessToken`, `access_token`, or `token`, and whole
//! bodies are sometimes wrapped under `data`. Every function here maps a
//! raw [`serde_json::Value`] into the canonical model of [`crate::model`],
//! failing with a typed [`NormalizationError`] only when the required
//! minimum is absent, never by panicking on a well-formed body.
//!
//! Auth responses are handled by an ordered fallback chain: each strategy
//! is tried in a fixed order and the first whose required fields are all
//! present wins. Strategies never merge partial results.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::NormalizationError;
use crate::model::{
    placeholder_image_url, AuthResult, MatchOutcome, PageMeta, Profile, ResetTokenCheck, Sport,
    User,
};

/// Fields the caller submitted in its own request, used as the user of
/// last resort when a registration response carries no body to speak of
#[derive(Debug, Clone)]
pub struct SubmittedIdentity {
    pub email: String,
    pub name: Option<String>,
    pub location: Option<String>,
}

impl SubmittedIdentity {
    /// Identity carrying only an email, for login requests
    pub fn email_only(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
            location: None,
        }
    }

    fn to_user(&self) -> User {
        User {
            id: None,
            email: self.email.clone(),
            name: self.name.clone(),
            location: self.location.clone(),
        }
    }
}

const TOKEN_KEYS: [&str; 3] = ["accessToken", "access_token", "token"];

/// Normalize a login/registration response
///
/// Strategies, in order; the first full match wins:
/// 1. token and `user` at the root
/// 2. token and `user` one level under `data`
/// 3. `user` at the root with no token (empty token issued)
/// 4. bare message envelope: user rebuilt from the submitted request fields
/// 5. a user object sitting unwrapped at the root
pub fn auth_result(
    body: &Value,
    submitted: &SubmittedIdentity,
) -> Result<AuthResult, NormalizationError> {
    let root = match body.as_object() {
        Some(obj) => obj,
        None => return Err(NormalizationError::UnrecognizedShape),
    };

    // 1. Direct: token and user at the root.
    if let (Some(token), Some(user_value)) = (token_of(root), root.get("user")) {
        return Ok(AuthResult {
            access_token: token,
            user: user(user_value)?,
        });
    }

    // 2. Same lookup nested under `data`.
    if let Some(data) = root.get("data").and_then(Value::as_object) {
        if let (Some(token), Some(user_value)) = (token_of(data), data.get("user")) {
            return Ok(AuthResult {
                access_token: token,
                user: user(user_value)?,
            });
        }
    }

    // 3. User without any token: session must be established separately.
    if let Some(user_value) = root.get("user") {
        return Ok(AuthResult {
            access_token: String::new(),
            user: user(user_value)?,
        });
    }

    // 4. Message-only envelope: nothing usable in the response, so the
    //    user is rebuilt from what the request itself submitted.
    if root.get("message").map_or(false, Value::is_string) {
        return Ok(AuthResult {
            access_token: String::new(),
            user: submitted.to_user(),
        });
    }

    // 5. A user object at the root with no envelope around it.
    if let Ok(bare) = user(body) {
        return Ok(AuthResult {
            access_token: String::new(),
            user: bare,
        });
    }

    Err(NormalizationError::UnrecognizedShape)
}

/// Normalize a user object
///
/// `email` is the only required field; `id` and `email` each resolve
/// through their known aliases.
pub fn user(value: &Value) -> Result<User, NormalizationError> {
    let obj = value
        .as_object()
        .ok_or(NormalizationError::UnrecognizedShape)?;

    let email = string_of(obj, &["email", "username"])
        .ok_or(NormalizationError::MissingRequiredField { field: "email" })?;

    Ok(User {
        id: id_of(obj),
        email,
        name: string_of(obj, &["name"]),
        location: string_of(obj, &["location"]),
    })
}

/// Normalize a candidate profile
///
/// Profiles are never rejected: a missing id is synthesized and every
/// other field resolves to the defaults of [`Profile::placeholder`].
pub fn profile(value: &Value) -> Profile {
    let obj = match value.as_object() {
        Some(obj) => obj,
        None => return Profile::placeholder(Uuid::new_v4().to_string()),
    };

    let id = id_of(obj).unwrap_or_else(|| Uuid::new_v4().to_string());
    let mut profile = Profile::placeholder(id.as_str());

    if let Some(name) = string_of(obj, &["name"]) {
        profile.name = name;
    }
    if let Some(age) = u32_of(obj, &["age"]) {
        profile.age = age;
    }
    if let Some(location) = string_of(obj, &["location"]) {
        profile.location = location;
    }
    if let Some(bio) = string_of(obj, &["bio", "description"]) {
        profile.bio = bio;
    }
    if let Some(rating) = f64_of(obj, &["rating"]) {
        profile.rating = rating;
    }
    if let Some(count) = u32_of(obj, &["activitiesJoined", "activitiesJoinedCount"]) {
        profile.activities_joined_count = count;
    }
    profile.distance_label = distance_label_of(obj);

    let avatar = string_of(obj, &["avatarUrl", "avatar"]);
    let cover = string_of(obj, &["coverImageUrl", "coverImage"]);
    let photo = string_of(obj, &["profileImageUrl", "profileImage", "image"]);
    let fallback = placeholder_image_url(&id);
    profile.avatar_url = avatar
        .clone()
        .or_else(|| cover.clone())
        .or_else(|| photo.clone())
        .unwrap_or_else(|| fallback.clone());
    profile.cover_image_url = cover.or(avatar).or(photo).unwrap_or(fallback);

    let generic_interests = string_list_of(obj, "sportsInterests");
    profile.sports = sports_of(obj, &generic_interests);
    profile.interests = match obj.get("interests") {
        Some(value) => string_list(value),
        None => generic_interests,
    };

    profile
}

/// Normalize a page of candidate profiles with its pagination metadata
///
/// The page body may sit at the root or under `data`; the `profiles`
/// array is required, pagination counters are tolerated when absent.
pub fn profile_page(body: &Value) -> Result<(Vec<Profile>, PageMeta), NormalizationError> {
    let root = body
        .as_object()
        .ok_or(NormalizationError::UnrecognizedShape)?;
    let page_obj = match root.get("profiles") {
        Some(_) => root,
        None => root
            .get("data")
            .and_then(Value::as_object)
            .filter(|data| data.contains_key("profiles"))
            .ok_or(NormalizationError::UnrecognizedShape)?,
    };

    let profiles: Vec<Profile> = page_obj
        .get("profiles")
        .and_then(Value::as_array)
        .ok_or(NormalizationError::UnrecognizedShape)?
        .iter()
        .map(profile)
        .collect();

    let pagination = page_obj.get("pagination").and_then(Value::as_object);
    let count = profiles.len() as u32;
    let meta = match pagination {
        Some(p) => PageMeta {
            total: u32_of(p, &["total"]).unwrap_or(count),
            page: u32_of(p, &["page"]).unwrap_or(1),
            total_pages: u32_of(p, &["totalPages"]).unwrap_or(1),
            limit: u32_of(p, &["limit"]).unwrap_or(count),
        },
        None => PageMeta {
            total: count,
            page: 1,
            total_pages: 1,
            limit: count,
        },
    };

    Ok((profiles, meta))
}

/// Normalize the response to a like call
pub fn match_outcome(body: &Value) -> MatchOutcome {
    let root = body
        .as_object()
        .map(|obj| unwrap_data(obj))
        .unwrap_or(None);
    let obj = match root {
        Some(obj) => obj,
        None => {
            return MatchOutcome {
                is_match: false,
                matched_profile: None,
            }
        }
    };

    let is_match = obj
        .get("isMatch")
        .or_else(|| obj.get("is_match"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let matched_profile = obj
        .get("matchedProfile")
        .or_else(|| obj.get("matched_profile"))
        .filter(|v| v.is_object())
        .map(profile);

    MatchOutcome {
        is_match,
        matched_profile,
    }
}

/// Extract the human-readable message of a message envelope, if any
pub fn message(body: &Value) -> Option<String> {
    let obj = body.as_object()?;
    match string_of(obj, &["message"]) {
        Some(text) => Some(text),
        None => {
            let data = obj.get("data")?.as_object()?;
            string_of(data, &["message"])
        }
    }
}

/// Normalize a reset-token validity check
pub fn reset_token_check(body: &Value) -> ResetTokenCheck {
    let obj = body.as_object();
    ResetTokenCheck {
        valid: obj
            .and_then(|o| o.get("valid"))
            .and_then(Value::as_bool)
            .unwrap_or(false),
        message: message(body),
    }
}

fn unwrap_data(obj: &Map<String, Value>) -> Option<&Map<String, Value>> {
    if obj.contains_key("isMatch") || obj.contains_key("is_match") {
        return Some(obj);
    }
    match obj.get("data").and_then(Value::as_object) {
        Some(data) => Some(data),
        None => Some(obj),
    }
}

fn token_of(obj: &Map<String, Value>) -> Option<String> {
    TOKEN_KEYS
        .iter()
        .find_map(|key| obj.get(*key))
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

/// An id may arrive under `id` or `_id`, as a string or a number
fn id_of(obj: &Map<String, Value>) -> Option<String> {
    ["id", "_id"].iter().find_map(|key| match obj.get(*key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn string_of(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| obj.get(*key))
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

fn u32_of(obj: &Map<String, Value>, keys: &[&str]) -> Option<u32> {
    keys.iter()
        .find_map(|key| obj.get(*key))
        .and_then(Value::as_u64)
        .map(|n| n as u32)
}

fn f64_of(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|key| obj.get(*key))
        .and_then(Value::as_f64)
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn string_list_of(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    obj.get(key).map(string_list).unwrap_or_default()
}

/// The distance label arrives preformatted or as a bare kilometre count
fn distance_label_of(obj: &Map<String, Value>) -> String {
    if let Some(label) = string_of(obj, &["distanceLabel", "distance"]) {
        return label;
    }
    match obj.get("distance").and_then(Value::as_f64) {
        Some(km) => format!("{} km away", km),
        None => String::new(),
    }
}

/// Sports come from an explicit `sports` list when non-empty, else from
/// the first three generic interest names with default icon and level
fn sports_of(obj: &Map<String, Value>, generic_interests: &[String]) -> Vec<Sport> {
    let explicit: Vec<Sport> = obj
        .get("sports")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(sport).collect())
        .unwrap_or_default();

    if !explicit.is_empty() {
        return explicit;
    }

    generic_interests
        .iter()
        .take(3)
        .map(Sport::from_name)
        .collect()
}

fn sport(value: &Value) -> Sport {
    match value.as_object() {
        Some(obj) => Sport {
            name: string_of(obj, &["name"]).unwrap_or_default(),
            icon: string_of(obj, &["icon"])
                .unwrap_or_else(|| crate::model::DEFAULT_SPORT_ICON.to_string()),
            level: string_of(obj, &["level"])
                .unwrap_or_else(|| crate::model::DEFAULT_SPORT_LEVEL.to_string()),
        },
        None => Sport::from_name(value.as_str().unwrap_or_default()),
    }
}
