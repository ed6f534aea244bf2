//! Report error model.
//!
//! Errors in this framework are **events, not exceptions**: everything that
//! goes wrong is normalized into a [`ReportedError`] and published on the
//! owner's `error` channel. Reporting itself is infallible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Symbol prefixes of frames that belong to this framework (or to the
/// capture machinery itself) and are stripped from reported traces, so the
/// first visible frame is attributable to integrating code.
const INTERNAL_FRAME_PREFIXES: &[&str] = &[
    "domainkit_core",
    "domainkit_events",
    "std::backtrace",
    "std::rt",
    "std::panic",
    "std::sys",
    "core::ops::function",
    "backtrace::",
    "__rust",
    "rust_begin_unwind",
    "_start",
];

/// Upper bound on retained trace frames (diagnostic, not forensic).
const MAX_TRACE_FRAMES: usize = 16;

/// Error taxonomy for the reporting path.
///
/// Keep this focused on the conditions the framework itself distinguishes;
/// anything else travels as [`ReportError::Generic`].
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ReportError {
    /// A derived property was read before its prerequisite data existed.
    #[error("invalid attribute access: {0}")]
    InvalidAttribute(String),

    /// A write was attempted on a read-only-by-design property.
    #[error("invalid set on read-only property: {0}")]
    InvalidSet(String),

    /// An operation requiring a request payload ran without one.
    #[error("no payload available: {0}")]
    NoPayload(String),

    /// Anything else routed through the reporting path.
    #[error("{0}")]
    Generic(String),
}

impl ReportError {
    pub fn invalid_attribute(attribute: impl Into<String>) -> Self {
        Self::InvalidAttribute(attribute.into())
    }

    pub fn invalid_set(attribute: impl Into<String>) -> Self {
        Self::InvalidSet(attribute.into())
    }

    pub fn no_payload(operation: impl Into<String>) -> Self {
        Self::NoPayload(operation.into())
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic(message.into())
    }
}

impl From<&str> for ReportError {
    fn from(message: &str) -> Self {
        Self::Generic(message.to_string())
    }
}

impl From<String> for ReportError {
    fn from(message: String) -> Self {
        Self::Generic(message)
    }
}

/// The structured error value published on `error` events.
///
/// Carries the taxonomy member, the business time of the report, and a
/// normalized call-site trace with framework-internal frames filtered out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedError {
    pub kind: ReportError,
    pub occurred_at: DateTime<Utc>,
    /// Filtered frame symbols, outermost caller first.
    pub trace: Vec<String>,
}

impl ReportedError {
    /// Normalize `kind` into a reported error, capturing the call-site trace.
    pub fn capture(kind: ReportError) -> Self {
        let backtrace = std::backtrace::Backtrace::force_capture();
        Self {
            kind,
            occurred_at: Utc::now(),
            trace: normalize_trace(&backtrace.to_string()),
        }
    }

    /// The human-readable message for this error.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl core::fmt::Display for ReportedError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.kind)?;
        for frame in &self.trace {
            write!(f, "\n    at {frame}")?;
        }
        Ok(())
    }
}

/// Reduce a raw `std::backtrace` rendering to the caller-attributable frames.
///
/// The raw form interleaves numbered symbol lines with `at file:line` lines;
/// only the symbol lines are kept, and any symbol belonging to this
/// framework (or the capture machinery) is dropped.
fn normalize_trace(raw: &str) -> Vec<String> {
    raw.lines()
        .filter_map(frame_symbol)
        .filter(|symbol| !is_internal_frame(symbol))
        .take(MAX_TRACE_FRAMES)
        .map(str::to_string)
        .collect()
}

fn frame_symbol(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let (index, symbol) = trimmed.split_once(": ")?;
    if index.chars().all(|c| c.is_ascii_digit()) && !index.is_empty() {
        Some(symbol.trim())
    } else {
        None
    }
}

fn is_internal_frame(symbol: &str) -> bool {
    let symbol = symbol.strip_prefix('<').unwrap_or(symbol);
    INTERNAL_FRAME_PREFIXES
        .iter()
        .any(|prefix| symbol.starts_with(prefix))
}
