//! The reporting component every domain object owns.
//!
//! This module provides the **two-tier reporting contract**:
//!
//! - `emit` is local-only notification through the instance's private
//!   [`EventChannel`]
//! - `fire_event` is `emit` plus, when a [`Monitor`] is attached, a forward
//!   of the same event and payload to that external collaborator
//!
//! The local emit always happens-before the monitor forward. The monitor is
//! an injected, optional reference with an explicit attach/detach lifecycle;
//! the reporter only reads whether one is attached and never manages the
//! monitor's own lifetime.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use domainkit_events::{ChannelOptions, EventChannel, EventName, Handler};

use crate::error::{ReportError, ReportedError};
use crate::object::{ObjectConfig, ObjectId};

/// Event name every reported error is published under.
pub const ERROR_EVENT: &str = "error";

/// Event name every reported warning is published under.
pub const WARN_EVENT: &str = "warn";

/// Payload carried by a published event.
///
/// The no-data case is an explicit sentinel ([`ReportPayload::Null`]), never
/// an unset value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "payload", content = "data", rename_all = "snake_case")]
pub enum ReportPayload {
    /// Explicit "no data" sentinel.
    #[default]
    Null,
    /// Raw warning message (the `warn` event payload).
    Message(String),
    /// Structured error value (the `error` event payload).
    Error(ReportedError),
    /// Arbitrary metadata for custom events.
    Value(serde_json::Value),
}

impl ReportPayload {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_message(&self) -> Option<&str> {
        match self {
            Self::Message(message) => Some(message),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ReportedError> {
        match self {
            Self::Error(error) => Some(error),
            _ => None,
        }
    }
}

impl From<&str> for ReportPayload {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

impl From<String> for ReportPayload {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<serde_json::Value> for ReportPayload {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

impl From<ReportedError> for ReportPayload {
    fn from(error: ReportedError) -> Self {
        Self::Error(error)
    }
}

/// External, process-owned collaborator that receives forwarded events for
/// cross-instance observability.
///
/// Implementations must tolerate any event at any time; forwarding is
/// fire-and-forget from the reporter's perspective.
pub trait Monitor: Send + Sync {
    fn forward(&self, object: ObjectId, event: &EventName, payload: &ReportPayload);
}

impl<T> Monitor for Arc<T>
where
    T: Monitor + ?Sized,
{
    fn forward(&self, object: ObjectId, event: &EventName, payload: &ReportPayload) {
        (**self).forward(object, event, payload);
    }
}

/// One entry in a bulk listener registration.
///
/// Names are normalized by the channel (trim, lowercase). A binding without
/// a handler follows the channel's missing-handler policy; it is a
/// convention, not an error.
pub struct EventBinding {
    pub name: String,
    pub handler: Option<Handler<ReportPayload>>,
}

impl EventBinding {
    pub fn new(name: impl Into<String>, handler: impl FnMut(&ReportPayload) + Send + 'static) -> Self {
        Self {
            name: name.into(),
            handler: Some(Box::new(handler)),
        }
    }

    /// A binding with no handler attached.
    pub fn unbound(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handler: None,
        }
    }
}

/// The owned reporting component.
///
/// Created exactly once per domain object, before any of the embedding
/// type's own fields initialize, and never exposed for replacement - only
/// the indirect operations below.
pub struct Reporter {
    object_id: ObjectId,
    channel: EventChannel<ReportPayload>,
    monitor: Option<Arc<dyn Monitor>>,
}

impl Reporter {
    pub(crate) fn new(object_id: ObjectId, config: &ObjectConfig) -> Self {
        let mut options = ChannelOptions {
            missing_handler: config.missing_handler,
            ..ChannelOptions::default()
        };
        if let Some(max) = config.max_listeners {
            options.max_listeners = max;
        }
        Self {
            object_id,
            channel: EventChannel::new(options),
            monitor: config.monitor.clone(),
        }
    }

    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// Local-only notification through the owned channel.
    ///
    /// Returns the number of handlers invoked.
    pub fn emit(&mut self, name: &str, payload: impl Into<ReportPayload>) -> usize {
        self.channel.publish(name, &payload.into())
    }

    /// Local-only notification with the explicit no-data payload.
    pub fn emit_signal(&mut self, name: &str) -> usize {
        self.channel.notify(name)
    }

    /// Emit locally, then forward to the monitor if one is attached.
    pub fn fire_event(&mut self, name: &str, payload: impl Into<ReportPayload>) {
        let payload = payload.into();
        // Local delivery happens-before the external forward.
        self.channel.publish(name, &payload);
        if let Some(monitor) = &self.monitor
            && let Some(event) = EventName::parse(name)
        {
            monitor.forward(self.object_id, &event, &payload);
        }
    }

    /// Record a warning and publish a `warn` event carrying the message.
    pub fn fire_warning(&mut self, message: &str) {
        self.fire_warning_if(message, || true);
    }

    /// As [`Reporter::fire_warning`], but `precondition` may veto emission.
    ///
    /// The precondition runs before any side effect, so a veto suppresses
    /// both the diagnostic record and the `warn` event.
    pub fn fire_warning_if(&mut self, message: &str, precondition: impl FnOnce() -> bool) {
        if !precondition() {
            return;
        }
        tracing::warn!(object = %self.object_id, message, "warning reported");
        self.fire_event(WARN_EVENT, ReportPayload::Message(message.to_string()));
    }

    /// Normalize `error` into a [`ReportedError`] and fire an `error` event.
    ///
    /// Reporting an error is itself never fallible; the returned value is
    /// the normalized error that was published.
    pub fn fire_error(&mut self, error: impl Into<ReportError>) -> ReportedError {
        let reported = ReportedError::capture(error.into());
        tracing::error!(object = %self.object_id, error = %reported.kind, "error reported");
        self.fire_event(ERROR_EVENT, ReportPayload::Error(reported.clone()));
        reported
    }

    /// Register a persistent listener on the owned channel.
    pub fn on(&mut self, name: &str, handler: impl FnMut(&ReportPayload) + Send + 'static) {
        self.channel.subscribe(name, handler);
    }

    /// Register a one-shot listener on the owned channel.
    pub fn once(&mut self, name: &str, handler: impl FnMut(&ReportPayload) + Send + 'static) {
        self.channel.subscribe_once(name, handler);
    }

    /// Remove every listener on the owned channel.
    pub fn remove_all_listeners(&mut self) {
        self.channel.unsubscribe_all();
    }

    /// Raise the channel's diagnostic listener capacity.
    pub fn set_max_listeners(&mut self, n: usize) {
        self.channel.set_max_listeners(n);
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.channel.listener_count(name)
    }

    /// Bulk listener registration.
    ///
    /// Bindings without a handler follow the channel's missing-handler
    /// policy; nothing here can fail.
    pub fn bind_listeners(&mut self, bindings: Vec<EventBinding>) {
        for binding in bindings {
            self.channel.subscribe_opt(&binding.name, binding.handler);
        }
    }

    pub fn attach_monitor(&mut self, monitor: Arc<dyn Monitor>) {
        self.monitor = Some(monitor);
    }

    pub fn detach_monitor(&mut self) {
        self.monitor = None;
    }

    pub fn monitor_attached(&self) -> bool {
        self.monitor.is_some()
    }
}

impl core::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Reporter")
            .field("object_id", &self.object_id)
            .field("channel", &self.channel)
            .field("monitor_attached", &self.monitor.is_some())
            .finish()
    }
}
