//! Identity adapter for third-party-authenticated login sessions.
//!
//! This is a consumer of the DomainKit object framework: it embeds a
//! [`DomainObject`] and reports every exceptional condition (missing
//! payload, premature attribute reads, rejected writes) through the
//! inherited event contract instead of raising. Consumer-facing reads
//! therefore never fail hard; they return `None` plus a reported event.

use domainkit_core::{
    DomainObject, Identifiable, ObjectId, ReportError, Reportable, Reporter,
};

use crate::payload::{AuthenticatedUser, RequestPayload};
use crate::provider::{Provider, provider_code};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Construction configuration for an [`IdentityAdapter`].
///
/// Everything is optional: with neither an identity id nor a payload the
/// instance is inert until a payload is attached.
#[derive(Debug, Default)]
pub struct IdentityConfig {
    pub identity_id: Option<String>,
    pub payload: Option<RequestPayload>,
    pub object: domainkit_core::ObjectConfig,
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity Adapter
// ─────────────────────────────────────────────────────────────────────────────

/// A third-party-authenticated login session.
///
/// # Invariants
/// - `provider_code` is a pure function of `provider_name`; unknown
///   providers yield `None`, never a guess.
/// - `email` identities never carry an access token; reading one yields
///   `None` plus a `warn` event regardless of the cached value.
/// - `modified` only becomes true through internal mutation logic; external
///   writes are rejected with an `InvalidSet` error event.
/// - `identity_id` is settable once meaningfully; later assignments are
///   rejected with an `InvalidSet` error event.
pub struct IdentityAdapter {
    base: DomainObject,
    identity_id: Option<String>,
    payload: Option<RequestPayload>,
    /// Cache of the last-seen authenticated-user structure.
    raw_user: Option<AuthenticatedUser>,
    /// Normalized provider name, derived lazily from the payload.
    provider: Option<String>,
    access_token: Option<String>,
    modified: bool,
}

impl IdentityAdapter {
    pub fn new(config: IdentityConfig) -> Self {
        // Base construction runs first; the private channel exists before
        // any adapter field is initialized.
        let base = DomainObject::new(config.object);
        let mut adapter = Self {
            base,
            identity_id: None,
            payload: None,
            raw_user: None,
            provider: None,
            access_token: None,
            modified: false,
        };
        if let Some(id) = config.identity_id {
            adapter.adopt_identity_id(&id);
        }
        if let Some(payload) = config.payload {
            adapter.attach_payload(payload);
        }
        adapter
    }

    /// Attach an inbound payload without deriving anything yet.
    ///
    /// Payload-derived attributes become available lazily through the
    /// accessors, or eagerly via [`IdentityAdapter::extract_from_payload`].
    pub fn attach_payload(&mut self, payload: RequestPayload) {
        self.payload = Some(payload);
    }

    pub fn payload(&self) -> Option<&RequestPayload> {
        self.payload.as_ref()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors (result-or-diagnostic: `None` plus a reported event)
    // ─────────────────────────────────────────────────────────────────────

    pub fn identity_id(&self) -> Option<&str> {
        self.identity_id.as_deref()
    }

    /// Assign the identity id.
    ///
    /// Blank values are meaningless and leave the id unset. Once a
    /// meaningful value is in place, further assignments report
    /// `InvalidSet` and change nothing.
    pub fn set_identity_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        if id.trim().is_empty() {
            return;
        }
        if self.identity_id.is_some() {
            self.fire_error(ReportError::invalid_set("identity_id"));
            return;
        }
        self.identity_id = Some(id);
    }

    /// Normalized (lowercased, trimmed) provider name from the payload.
    ///
    /// Not yet available is a normal state: the read reports an
    /// `InvalidAttribute` error event and returns `None` without failing.
    pub fn provider_name(&mut self) -> Option<String> {
        match self.resolve_provider() {
            Some(provider) => Some(provider),
            None => {
                self.fire_error(ReportError::invalid_attribute("provider_name"));
                None
            }
        }
    }

    /// Fixed short code for the resolved provider.
    ///
    /// Pure function of [`IdentityAdapter::provider_name`]; unknown
    /// providers yield the explicit no-code result.
    pub fn provider_code(&mut self) -> Option<&'static str> {
        self.provider_name()
            .as_deref()
            .and_then(provider_code)
    }

    /// Cached access token.
    ///
    /// Reports `InvalidAttribute` when no provider is resolvable yet.
    /// Email identities never carry a token: the read yields `None` plus a
    /// `warn` event regardless of the cached value.
    pub fn access_token(&mut self) -> Option<String> {
        let Some(provider) = self.resolve_provider() else {
            self.fire_error(ReportError::invalid_attribute("access_token"));
            return None;
        };
        if Provider::parse(&provider) == Some(Provider::Email) {
            self.fire_warning("access tokens are not issued for email identities");
            return None;
        }
        self.access_token.clone()
    }

    /// Store a new access token.
    ///
    /// A value different from the cache marks the pending-cache-update
    /// condition (the hook for a future caching integration); the value is
    /// stored either way.
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        let token = token.into();
        if self.access_token.as_deref() != Some(token.as_str()) {
            self.modified = true;
        }
        self.access_token = Some(token);
    }

    pub fn modified(&self) -> bool {
        self.modified
    }

    /// Rejected by design: `modified` only changes through internal
    /// mutation logic. The attempt reports `InvalidSet` and the flag keeps
    /// its value.
    pub fn set_modified(&mut self, _value: bool) {
        self.fire_error(ReportError::invalid_set("modified"));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Payload operations
    // ─────────────────────────────────────────────────────────────────────

    /// Adopt identity attributes from a raw payload.
    ///
    /// Assigns the identity id (first meaningful value wins), caches the
    /// authenticated-user structure and token, and derives the provider
    /// from the first recognizable key. A structure with zero entries
    /// derives no provider; provider-dependent reads then take their
    /// "not yet available" branch. Returns whether a user structure was
    /// present.
    pub fn extract_from_payload(&mut self, payload: &RequestPayload) -> bool {
        let Some(user) = payload.user.as_ref() else {
            self.fire_error(ReportError::no_payload(
                "extract_from_payload: authenticated user structure missing",
            ));
            return false;
        };
        let user = user.clone();

        if let Some(id) = user.id.as_deref() {
            self.adopt_identity_id(id);
        }
        self.access_token = user.access_token.clone();
        self.provider = user
            .provider_key()
            .map(|key| key.trim().to_lowercase());
        self.raw_user = Some(user);
        true
    }

    /// Run extraction against the supplied payload, or the attached one.
    ///
    /// With neither, a `NoPayload` error event is reported and the call
    /// returns `false` without modifying any attribute.
    pub fn authenticate(&mut self, payload: Option<RequestPayload>) -> bool {
        let payload = payload.or_else(|| self.payload.clone());
        let Some(payload) = payload else {
            self.fire_error(ReportError::no_payload("authenticate"));
            return false;
        };
        let extracted = self.extract_from_payload(&payload);
        self.payload = Some(payload);
        extracted
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    /// Quiet set-once assignment used by construction and extraction.
    fn adopt_identity_id(&mut self, id: &str) {
        if self.identity_id.is_none() && !id.trim().is_empty() {
            self.identity_id = Some(id.to_string());
        }
    }

    /// Non-reporting provider derivation (accessors add their own events).
    fn resolve_provider(&mut self) -> Option<String> {
        if self.provider.is_none() {
            self.provider = self
                .current_user()
                .and_then(AuthenticatedUser::provider_key)
                .map(|key| key.trim().to_lowercase());
        }
        self.provider.clone()
    }

    fn current_user(&self) -> Option<&AuthenticatedUser> {
        self.raw_user
            .as_ref()
            .or_else(|| self.payload.as_ref().and_then(|p| p.user.as_ref()))
    }
}

impl Reportable for IdentityAdapter {
    fn reporter(&mut self) -> &mut Reporter {
        self.base.reporter()
    }
}

impl Identifiable for IdentityAdapter {
    fn object_id(&self) -> ObjectId {
        self.base.object_id()
    }
}

impl core::fmt::Debug for IdentityAdapter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdentityAdapter")
            .field("object_id", &self.base.object_id())
            .field("identity_id", &self.identity_id)
            .field("provider", &self.provider)
            .field("has_payload", &self.payload.is_some())
            .field("has_token", &self.access_token.is_some())
            .field("modified", &self.modified)
            .finish()
    }
}
