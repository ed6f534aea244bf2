//! Extension protocol: composition root + capability traits.
//!
//! DomainKit derives specialized object types by **composition, not
//! inheritance**: a derived type embeds a [`DomainObject`] (directly, or
//! through another derived type, arbitrarily deep) and implements
//! [`Reportable`] by delegating to it. Because [`DomainObject::new`] is the
//! only way to obtain a [`Reporter`], the private channel always exists
//! before any embedding type initializes its own fields - the base-before-
//! derived ordering cannot be forgotten by object authors.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domainkit_events::MissingHandler;

use crate::error::{ReportError, ReportedError};
use crate::report::{ERROR_EVENT, EventBinding, Monitor, ReportPayload, Reporter};

/// Uniform identity of a domain object.
///
/// Uses UUIDv7 (time-ordered). Appears in diagnostics and monitor forwards.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for ObjectId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<ObjectId> for Uuid {
    fn from(value: ObjectId) -> Self {
        value.0
    }
}

/// Configuration snapshot captured at object construction.
///
/// Construction never fails on a missing configuration; `Default` is the
/// empty config. The monitor, when present, is an injected collaborator
/// whose lifecycle belongs to the surrounding process.
#[derive(Clone, Default)]
pub struct ObjectConfig {
    /// Override for the channel's diagnostic listener capacity.
    pub max_listeners: Option<usize>,
    /// Policy for listener registrations without a handler.
    pub missing_handler: MissingHandler,
    /// Optional monitor to forward `fire_event` notifications to.
    pub monitor: Option<Arc<dyn Monitor>>,
}

impl core::fmt::Debug for ObjectConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObjectConfig")
            .field("max_listeners", &self.max_listeners)
            .field("missing_handler", &self.missing_handler)
            .field("monitor_attached", &self.monitor.is_some())
            .finish()
    }
}

/// Capability trait: a type that can be identified across the process.
pub trait Identifiable {
    fn object_id(&self) -> ObjectId;
}

/// Capability trait: a type that owns a [`Reporter`] and exposes the
/// two-tier reporting contract.
///
/// Implementors only provide [`Reportable::reporter`]; everything else is
/// delegation. Override [`Reportable::on_error`] to intercept errors that
/// nobody listens for.
pub trait Reportable {
    /// The owned reporting component.
    fn reporter(&mut self) -> &mut Reporter;

    /// Local-only notification; returns the number of handlers invoked.
    fn emit(&mut self, name: &str, payload: ReportPayload) -> usize {
        self.reporter().emit(name, payload)
    }

    /// Local-only notification with the explicit no-data payload.
    fn emit_signal(&mut self, name: &str) -> usize {
        self.reporter().emit_signal(name)
    }

    /// Emit locally, then forward to the attached monitor (if any).
    fn fire_event(&mut self, name: &str, payload: ReportPayload) {
        self.reporter().fire_event(name, payload);
    }

    /// Record a warning and publish a `warn` event.
    fn fire_warning(&mut self, message: &str) {
        self.reporter().fire_warning(message);
    }

    /// Normalize and publish an `error` event.
    ///
    /// When no `error` listener is registered, the error is additionally
    /// routed through [`Reportable::on_error`], so every error reaches the
    /// formatted diagnostic path even without explicit wiring.
    fn fire_error(&mut self, error: ReportError) -> ReportedError {
        let unheard = self.reporter().listener_count(ERROR_EVENT) == 0;
        let reported = self.reporter().fire_error(error);
        if unheard {
            self.on_error(&reported);
        }
        reported
    }

    /// Fallback for `error` events with no registered listener.
    ///
    /// The default implementation records the fully formatted diagnostic
    /// (message plus filtered trace).
    fn on_error(&mut self, error: &ReportedError) {
        tracing::error!(object = %self.reporter().object_id(), "{error}");
    }

    /// Register a persistent listener.
    fn on(&mut self, name: &str, handler: Box<dyn FnMut(&ReportPayload) + Send>) {
        self.reporter().on(name, handler);
    }

    /// Register a one-shot listener.
    fn once(&mut self, name: &str, handler: Box<dyn FnMut(&ReportPayload) + Send>) {
        self.reporter().once(name, handler);
    }

    /// Remove every listener on the private channel.
    fn remove_all_listeners(&mut self) {
        self.reporter().remove_all_listeners();
    }

    /// Raise the channel's diagnostic listener capacity.
    fn set_max_listeners(&mut self, n: usize) {
        self.reporter().set_max_listeners(n);
    }

    /// Bulk listener registration (names normalized; missing handlers
    /// follow the channel policy).
    fn bind_listeners(&mut self, bindings: Vec<EventBinding>) {
        self.reporter().bind_listeners(bindings);
    }
}

/// Composition root embedded by every derived object type.
///
/// # Invariants
/// - The private event channel is created exactly once, here, before any
///   embedding type's own field initialization.
/// - The channel is never exposed for replacement; only the indirect
///   operations on [`Reportable`] touch it.
#[derive(Debug)]
pub struct DomainObject {
    id: ObjectId,
    reporter: Reporter,
    config: ObjectConfig,
}

impl DomainObject {
    /// Build the base object from a configuration snapshot.
    ///
    /// This is the single extension entry point: derived constructors call
    /// it (directly or through the type they embed) before initializing
    /// their own fields.
    pub fn new(config: ObjectConfig) -> Self {
        let id = ObjectId::new();
        let reporter = Reporter::new(id, &config);
        Self {
            id,
            reporter,
            config,
        }
    }

    /// The configuration snapshot captured at construction.
    pub fn config(&self) -> &ObjectConfig {
        &self.config
    }
}

impl Default for DomainObject {
    fn default() -> Self {
        Self::new(ObjectConfig::default())
    }
}

impl Identifiable for DomainObject {
    fn object_id(&self) -> ObjectId {
        self.id
    }
}

impl Reportable for DomainObject {
    fn reporter(&mut self) -> &mut Reporter {
        &mut self.reporter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<&'static str>>>;

    // Two-level derivation: Session embeds DomainObject, AdminSession embeds
    // Session. Construction runs base-to-derived, one call per level.
    struct Session {
        base: DomainObject,
        label: &'static str,
    }

    impl Session {
        fn new(config: ObjectConfig, log: &Log) -> Self {
            let base = DomainObject::new(config);
            log.lock().unwrap().push("session");
            Self {
                base,
                label: "session",
            }
        }
    }

    impl Reportable for Session {
        fn reporter(&mut self) -> &mut Reporter {
            self.base.reporter()
        }
    }

    impl Identifiable for Session {
        fn object_id(&self) -> ObjectId {
            self.base.object_id()
        }
    }

    struct AdminSession {
        inner: Session,
        elevated: bool,
    }

    impl AdminSession {
        fn new(config: ObjectConfig, log: &Log) -> Self {
            let inner = Session::new(config, log);
            log.lock().unwrap().push("admin");
            Self {
                inner,
                elevated: true,
            }
        }
    }

    impl Reportable for AdminSession {
        fn reporter(&mut self) -> &mut Reporter {
            self.inner.reporter()
        }
    }

    #[test]
    fn construction_chains_base_to_derived_exactly_once() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let admin = AdminSession::new(ObjectConfig::default(), &log);

        assert_eq!(*log.lock().unwrap(), vec!["session", "admin"]);
        assert!(admin.elevated);
        assert_eq!(admin.inner.label, "session");
    }

    #[test]
    fn derived_types_report_through_the_embedded_base() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let mut admin = AdminSession::new(ObjectConfig::default(), &log);

        let seen = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&seen);
        admin.on("granted", Box::new(move |_| *counter.lock().unwrap() += 1));

        admin.emit_signal("granted");
        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn channels_are_not_shared_between_instances() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let mut first = Session::new(ObjectConfig::default(), &log);
        let mut second = Session::new(ObjectConfig::default(), &log);

        let seen = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&seen);
        first.on("ping", Box::new(move |_| *counter.lock().unwrap() += 1));

        second.emit_signal("ping");
        assert_eq!(*seen.lock().unwrap(), 0);

        first.emit_signal("ping");
        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn objects_get_distinct_identities() {
        let a = DomainObject::default();
        let b = DomainObject::default();
        assert_ne!(a.object_id(), b.object_id());
    }

    #[test]
    fn fire_error_falls_back_to_on_error_when_nobody_listens() {
        struct Tracked {
            base: DomainObject,
            fallback_hits: usize,
        }
        impl Reportable for Tracked {
            fn reporter(&mut self) -> &mut Reporter {
                self.base.reporter()
            }
            fn on_error(&mut self, _error: &ReportedError) {
                self.fallback_hits += 1;
            }
        }

        let mut tracked = Tracked {
            base: DomainObject::default(),
            fallback_hits: 0,
        };

        tracked.fire_error(ReportError::generic("unheard"));
        assert_eq!(tracked.fallback_hits, 1);

        tracked.on(ERROR_EVENT, Box::new(|_| {}));
        tracked.fire_error(ReportError::generic("heard"));
        assert_eq!(tracked.fallback_hits, 1);
    }

    #[test]
    fn config_snapshot_is_kept_on_the_base() {
        let object = DomainObject::new(ObjectConfig {
            max_listeners: Some(3),
            ..ObjectConfig::default()
        });
        assert_eq!(object.config().max_listeners, Some(3));
    }
}
