//! Known identity providers and their short codes.

use serde::{Deserialize, Serialize};

/// External identity source that authenticated a login.
///
/// The set is closed: an unrecognized provider name parses to `None` rather
/// than a guess, and [`provider_code`] stays total over arbitrary strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Github,
    Facebook,
    Linkedin,
    Twitter,
    Google,
    Openid,
    Yahoo,
    Dropbox,
    /// Email-based identity; non-OAuth, never carries an access token.
    Email,
}

impl Provider {
    pub const ALL: [Provider; 9] = [
        Provider::Github,
        Provider::Facebook,
        Provider::Linkedin,
        Provider::Twitter,
        Provider::Google,
        Provider::Openid,
        Provider::Yahoo,
        Provider::Dropbox,
        Provider::Email,
    ];

    /// Parse a provider name (trimmed, case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "github" => Some(Self::Github),
            "facebook" => Some(Self::Facebook),
            "linkedin" => Some(Self::Linkedin),
            "twitter" => Some(Self::Twitter),
            "google" => Some(Self::Google),
            "openid" => Some(Self::Openid),
            "yahoo" => Some(Self::Yahoo),
            "dropbox" => Some(Self::Dropbox),
            "email" => Some(Self::Email),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Facebook => "facebook",
            Self::Linkedin => "linkedin",
            Self::Twitter => "twitter",
            Self::Google => "google",
            Self::Openid => "openid",
            Self::Yahoo => "yahoo",
            Self::Dropbox => "dropbox",
            Self::Email => "email",
        }
    }

    /// Fixed short code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Github => "gh",
            Self::Facebook => "fb",
            Self::Linkedin => "li",
            Self::Twitter => "tw",
            Self::Google => "gg",
            Self::Openid => "oi",
            Self::Yahoo => "yh",
            Self::Dropbox => "db",
            Self::Email => "eml",
        }
    }

    /// Whether identities from this provider carry an access token.
    pub fn bears_token(self) -> bool {
        !matches!(self, Self::Email)
    }
}

impl core::fmt::Display for Provider {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Total mapping from an arbitrary provider name to its short code.
///
/// Unknown names (and anything blank) map to `None` - the explicit
/// "no code" result.
pub fn provider_code(name: &str) -> Option<&'static str> {
    Provider::parse(name).map(Provider::code)
}
