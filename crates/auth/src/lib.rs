//! `domainkit-auth` — third-party-authenticated identity adapter.
//!
//! Adapts the raw payload produced by an external OAuth-style collaborator
//! into normalized, read-only identity attributes. All exceptional
//! conditions are reported through the DomainKit event contract instead of
//! raised; this crate implements no authentication protocol and stores no
//! credentials.

pub mod adapter;
pub mod payload;
pub mod provider;

pub use adapter::{IdentityAdapter, IdentityConfig};
pub use payload::{AuthenticatedUser, RequestPayload};
pub use provider::{Provider, provider_code};
