//! `domainkit-core` — object-composition and reporting framework.
//!
//! Every DomainKit object owns a private event channel and reports
//! exceptional conditions as events (`error`, `warn`) instead of raising.
//! This crate wires the channel into a reusable [`Reporter`] component,
//! defines the error taxonomy, and provides the extension protocol
//! ([`DomainObject`] + [`Reportable`]) used to derive specialized object
//! types without inheritance hazards.

pub mod error;
pub mod object;
pub mod report;

pub use error::{ReportError, ReportedError};
pub use object::{DomainObject, Identifiable, ObjectConfig, ObjectId, Reportable};
pub use report::{ERROR_EVENT, EventBinding, Monitor, ReportPayload, Reporter, WARN_EVENT};
