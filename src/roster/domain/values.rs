//! Validated scalar values for roster records.

use super::RosterDomainError;
use serde::Serialize;
use std::fmt;

/// Longest accepted name or email, in characters.
pub const MAX_FIELD_CHARS: usize = 255;

/// Non-empty, trimmed task name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskName(String);

impl TaskName {
    /// Creates a validated task name.
    ///
    /// # Errors
    ///
    /// Returns [`RosterDomainError::EmptyTaskName`] when the value is blank,
    /// or [`RosterDomainError::TooLong`] past [`MAX_FIELD_CHARS`].
    pub fn new(value: impl Into<String>) -> Result<Self, RosterDomainError> {
        let name = non_blank(value.into()).ok_or(RosterDomainError::EmptyTaskName)?;
        within_limit(name, "task name").map(Self)
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-empty, trimmed user display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserName(String);

impl UserName {
    /// Creates a validated user name.
    ///
    /// # Errors
    ///
    /// Returns [`RosterDomainError::EmptyUserName`] when the value is blank,
    /// or [`RosterDomainError::TooLong`] past [`MAX_FIELD_CHARS`].
    pub fn new(value: impl Into<String>) -> Result<Self, RosterDomainError> {
        let name = non_blank(value.into()).ok_or(RosterDomainError::EmptyUserName)?;
        within_limit(name, "user name").map(Self)
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Email address, unique across all users.
///
/// Comparison is exact after trimming; no case folding is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// # Errors
    ///
    /// Returns [`RosterDomainError::EmptyEmail`] when the value is blank, or
    /// [`RosterDomainError::InvalidEmail`] when it contains whitespace or has
    /// no `@` between a non-empty local part and domain, or
    /// [`RosterDomainError::TooLong`] past [`MAX_FIELD_CHARS`].
    pub fn new(value: impl Into<String>) -> Result<Self, RosterDomainError> {
        let raw = value.into();
        let Some(normalized) = non_blank(raw.clone()) else {
            return Err(RosterDomainError::EmptyEmail);
        };

        let is_valid = normalized
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty())
            && !normalized.chars().any(char::is_whitespace);
        if !is_valid {
            return Err(RosterDomainError::InvalidEmail(raw));
        }

        within_limit(normalized, "email").map(Self)
    }

    /// Returns the address as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

fn within_limit(value: String, field: &'static str) -> Result<String, RosterDomainError> {
    if value.chars().count() > MAX_FIELD_CHARS {
        Err(RosterDomainError::TooLong {
            field,
            max: MAX_FIELD_CHARS,
        })
    } else {
        Ok(value)
    }
}
