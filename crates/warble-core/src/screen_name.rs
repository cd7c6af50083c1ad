//! Screen name identity.
//!
//! AIM screen names compare case-insensitively with spaces ignored:
//! `"Chatting Chuck"` and `"chattingchuck"` are the same account. The wire
//! keeps the display form the user typed; registries, block checks, and
//! feedbag lookups key on the normalized identifier form.

use std::fmt;

/// A screen name in display form, as typed and as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenName(String);

impl ScreenName {
    /// Wrap a display-form name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Display form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier form for lookups and comparisons.
    #[must_use]
    pub fn ident(&self) -> IdentScreenName {
        IdentScreenName::from(self.0.as_str())
    }
}

impl fmt::Display for ScreenName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScreenName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Normalized screen name: lowercase, spaces stripped.
///
/// This is the canonical key for every map and relationship check; two
/// display forms of the same account always produce equal idents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentScreenName(String);

impl IdentScreenName {
    /// Identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for IdentScreenName {
    fn from(name: &str) -> Self {
        Self(name.chars().filter(|c| *c != ' ').flat_map(char::to_lowercase).collect())
    }
}

impl From<&ScreenName> for IdentScreenName {
    fn from(name: &ScreenName) -> Self {
        name.ident()
    }
}

impl fmt::Display for IdentScreenName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
