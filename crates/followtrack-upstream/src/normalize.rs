//! Reconciles the many response shapes the upstream returns for the same
//! logical endpoint into one canonical representation.
//!
//! Every function here is total: unrecognized input yields `None` or an empty
//! `Vec`, never an error. Shapes are described as ordered slices (of plain
//! functions for profiles, of field paths for lists) and the first one that
//! produces a result wins.

use serde_json::Value;

/// Canonical profile fields extracted from a `/profile` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedProfile {
    pub username: String,
    pub is_private: bool,
    pub following_count: u64,
    pub user_id: Option<String>,
}

type ProfileStrategy = fn(&Value) -> Option<NormalizedProfile>;

/// Profile shapes in priority order.
const PROFILE_STRATEGIES: &[ProfileStrategy] = &[
    profile_top_level,
    profile_under_user,
    profile_under_data_user,
    profile_under_graphql_user,
    profile_under_profile,
];

/// Following/followers list locations in priority order. The empty path is a
/// bare top-level array.
const LIST_PATHS: &[&[&str]] = &[
    &[],
    &["users"],
    &["data", "users"],
    &["data", "user", "edge_follow", "edges"],
    &["profile", "edge_follow", "edges"],
    &["user", "edge_follow", "edges"],
    &["edges"],
    &["graphql", "user", "edge_follow", "edges"],
    &["data", "user", "edge_followed_by", "edges"],
    &["graphql", "user", "edge_followed_by", "edges"],
    &["following"],
    &["followers"],
    &["items"],
    &["response", "users"],
];

const MEDIA_PATHS: &[&[&str]] = &[
    &["items"],
    &["data", "items"],
    &["media"],
    &["data", "media"],
];

const CURSOR_PATHS: &[&[&str]] = &[
    &["next_max_id"],
    &["data", "next_max_id"],
    &["end_cursor"],
    &["page_info", "end_cursor"],
];

const USER_ID_PATHS: &[&[&str]] = &[
    &["UserID"],
    &["user_id"],
    &["data", "user_id"],
    &["data", "id"],
    &["data", "pk"],
    &["data", "user", "pk"],
    &["graphql", "user", "id"],
    &["id"],
    &["id_str"],
];

/// Normalizes a `/profile` body. Returns `None` when no strategy finds a
/// non-empty username.
#[must_use]
pub fn normalize_profile(body: &Value) -> Option<NormalizedProfile> {
    PROFILE_STRATEGIES.iter().find_map(|strategy| strategy(body))
}

/// Normalizes one following/followers page into usernames, dropping entries
/// without a usable name. Duplicates are kept.
#[must_use]
pub fn normalize_usernames(body: &Value) -> Vec<String> {
    let Some(entries) = LIST_PATHS.iter().find_map(|path| array_at(body, path)) else {
        if body.get("end_cursor").is_some() || body.get("page_info").is_some() {
            tracing::debug!("paginated response carried no recognizable user list");
        }
        return Vec::new();
    };
    entries.iter().filter_map(entry_username).collect()
}

/// Normalizes one media page; items are returned as raw JSON.
#[must_use]
pub fn normalize_media(body: &Value) -> Vec<Value> {
    MEDIA_PATHS
        .iter()
        .find_map(|path| array_at(body, path))
        .cloned()
        .unwrap_or_default()
}

/// Extracts the next-page cursor. An empty string means there is no next page.
#[must_use]
pub fn next_cursor(body: &Value) -> Option<String> {
    CURSOR_PATHS
        .iter()
        .find_map(|path| value_at(body, path).and_then(scalar_string))
}

/// Extracts a numeric user id from a `/user_id_by_username` body.
#[must_use]
pub fn normalize_user_id(body: &Value) -> Option<String> {
    USER_ID_PATHS
        .iter()
        .find_map(|path| value_at(body, path).and_then(scalar_string))
}

/// Returns the error message when a 2xx body nevertheless reports failure:
/// `status: "error"`, a non-empty `error` string, or a non-empty `message`
/// string without `status: "ok"`.
#[must_use]
pub fn error_message(body: &Value) -> Option<String> {
    let status = body.get("status").and_then(Value::as_str);
    let text_field = |key: &str| {
        body.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };

    if status.is_some_and(|s| s.eq_ignore_ascii_case("error") || s.eq_ignore_ascii_case("fail")) {
        return Some(
            text_field("error")
                .or_else(|| text_field("message"))
                .unwrap_or_else(|| "unknown error".to_owned()),
        );
    }
    if let Some(error) = text_field("error") {
        return Some(error);
    }
    if status.is_some_and(|s| s.eq_ignore_ascii_case("ok")) {
        return None;
    }
    text_field("message")
}

// ---------------------------------------------------------------------------
// Profile strategies
// ---------------------------------------------------------------------------

fn profile_top_level(body: &Value) -> Option<NormalizedProfile> {
    profile_from_node(Some(body), &[&["following_count"]])
}

fn profile_under_user(body: &Value) -> Option<NormalizedProfile> {
    profile_from_node(body.get("user"), &[&["following_count"]])
}

fn profile_under_data_user(body: &Value) -> Option<NormalizedProfile> {
    profile_from_node(
        value_at(body, &["data", "user"]),
        &[
            &["edge_follow", "count"],
            &["following_count"],
            &["edge_follow_count"],
        ],
    )
}

fn profile_under_graphql_user(body: &Value) -> Option<NormalizedProfile> {
    profile_from_node(
        value_at(body, &["graphql", "user"]),
        &[&["edge_follow", "count"], &["following_count"]],
    )
}

fn profile_under_profile(body: &Value) -> Option<NormalizedProfile> {
    profile_from_node(
        body.get("profile"),
        &[&["following_count"], &["edge_follow", "count"]],
    )
}

fn profile_from_node(node: Option<&Value>, count_paths: &[&[&str]]) -> Option<NormalizedProfile> {
    let node = node.filter(|n| n.is_object())?;
    let username = node
        .get("username")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())?
        .to_owned();

    let following_count = count_paths
        .iter()
        .find_map(|path| value_at(node, path).filter(|v| !v.is_null()))
        .map_or(0, coerce_count);

    let user_id = ["pk", "id", "pk_id"]
        .iter()
        .find_map(|key| node.get(*key).and_then(scalar_string));

    Some(NormalizedProfile {
        username,
        is_private: node.get("is_private").is_some_and(truthy),
        following_count,
        user_id,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn value_at<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, key| node.get(*key))
}

fn array_at<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Vec<Value>> {
    value_at(root, path).and_then(Value::as_array)
}

fn entry_username(entry: &Value) -> Option<String> {
    let name = match entry {
        Value::String(s) => Some(s.as_str()),
        Value::Object(_) => entry
            .get("username")
            .and_then(Value::as_str)
            .or_else(|| value_at(entry, &["user", "username"]).and_then(Value::as_str))
            .or_else(|| value_at(entry, &["node", "username"]).and_then(Value::as_str)),
        _ => None,
    }?;
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_owned())
}

/// Non-negative numbers and numeric strings become counts (fractions truncate).
/// Anything else is 0.
fn coerce_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(float_to_count))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite() && *f >= 0.0)
                        .map(float_to_count)
                })
                .unwrap_or(0)
        }
        _ => 0,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn float_to_count(f: f64) -> u64 {
    f.trunc() as u64
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1"),
        _ => false,
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
