//! Normalized event names.

use serde::{Deserialize, Serialize};

/// A normalized (trimmed, lowercased), non-empty event name.
///
/// Event names are compared after normalization, so `" Error "` and
/// `"error"` address the same listener set. Blank input is not a valid
/// name; channel operations treat it as a silent no-op rather than an
/// error (notification primitives never fail).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventName(String);

impl EventName {
    /// Normalize `raw` into an event name.
    ///
    /// Returns `None` when the input is empty or whitespace-only.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for EventName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl AsRef<str> for EventName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
