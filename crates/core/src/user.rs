//! Cached user record.

use serde::{Deserialize, Serialize};

use crate::text::{capitalize, format_date};
use crate::types::UserId;

/// The user record cached alongside the bearer token.
///
/// Different endpoints return different subsets of these fields (login only
/// returns a role and an id, the profile endpoint returns names and email),
/// so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl UserInfo {
    /// Name to show in the profile header.
    ///
    /// Prefers the combined `name`, otherwise joins first and last name.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_owned();
        }

        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) if !last.is_empty() => format!("{first} {last}"),
            (Some(first), _) => first.to_owned(),
            (None, _) => String::new(),
        }
    }

    /// Account type label, e.g. "Customer".
    #[must_use]
    pub fn account_type_label(&self) -> String {
        self.account_type
            .as_deref()
            .or(self.role.as_deref())
            .filter(|s| !s.is_empty())
            .map_or_else(|| "Customer".to_owned(), capitalize)
    }

    /// Account creation date, or "N/A".
    #[must_use]
    pub fn joined_label(&self) -> String {
        self.created_at
            .as_deref()
            .and_then(format_date)
            .unwrap_or_else(|| "N/A".to_owned())
    }

    /// Apply a profile edit to the cached record.
    pub fn apply_name_change(&mut self, full_name: &str, first_name: &str, last_name: &str) {
        self.name = Some(full_name.to_owned());
        self.first_name = Some(first_name.to_owned());
        self.last_name = Some(last_name.to_owned());
    }

    /// Keep the id from an older record when a fresher one omits it.
    ///
    /// The profile endpoint does not echo the user id, but the id is what the
    /// expired-session fallback lookup needs.
    #[must_use]
    pub fn with_id_from(mut self, previous: Option<&Self>) -> Self {
        if self.id.is_none() {
            self.id = previous.and_then(|p| p.id.clone());
        }
        self
    }
}
