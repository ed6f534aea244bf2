//! Inbound authenticated-request payload model (transport-agnostic).
//!
//! The external auth collaborator hands over a structure whose nested
//! authenticated-user object carries an id, an access token, and one key
//! named after the provider itself (e.g. `facebook`) holding the provider's
//! own user object. The provider name is recovered from that key when it is
//! not set explicitly.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Keys of the authenticated-user structure that are never provider keys.
const RESERVED_USER_KEYS: &[&str] = &["id", "accessToken"];

/// The nested authenticated-user structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AuthenticatedUser {
    /// Provider-assigned identity, numeric or string on the wire.
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,

    #[serde(rename = "accessToken", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Remaining entries; the provider key lives here.
    #[serde(flatten)]
    pub providers: Map<String, Value>,
}

impl AuthenticatedUser {
    /// First recognizable provider key in the structure.
    ///
    /// Reserved field names are skipped. A structure with zero remaining
    /// entries derives no provider.
    pub fn provider_key(&self) -> Option<&str> {
        self.providers
            .keys()
            .map(String::as_str)
            .find(|key| !RESERVED_USER_KEYS.contains(key))
    }
}

/// The raw payload produced by the external auth subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RequestPayload {
    /// Nested authenticated-user structure; absent on unauthenticated
    /// requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<AuthenticatedUser>,
}

impl RequestPayload {
    pub fn with_user(user: AuthenticatedUser) -> Self {
        Self { user: Some(user) }
    }
}

/// Accept both `"id": "u1"` and `"id": 42` from the wire.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}
