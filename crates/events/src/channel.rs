//! Per-instance publish/subscribe channel (mechanics only).
//!
//! This module provides the **event channel pattern** - a private pub/sub
//! mechanism owned by exactly one object, used to notify listeners of that
//! object's events (errors, warnings, domain signals).
//!
//! ## Design Philosophy
//!
//! The channel is intentionally **lightweight** and makes minimal assumptions:
//!
//! - **Instance-scoped**: each channel belongs to one owner; there is no
//!   global bus and no cross-instance listener leakage
//! - **Synchronous**: delivery happens inside the `publish` call, in
//!   registration order
//! - **Best-effort**: channel operations never fail; publishing to an event
//!   nobody listens to is a no-op, not an error
//!
//! ## Why Never Fail?
//!
//! The channel is a notification primitive sitting underneath an error
//! reporting contract. If reporting an error could itself error, callers
//! would need error handling for their error handling. Instead, anything
//! suspicious (blank event name, missing handler, crowded listener list) is
//! surfaced as a `tracing` diagnostic and the operation degrades to a no-op.
//!
//! ## Delivery Guarantees
//!
//! - Handlers fire in registration order.
//! - Only registrations present at the start of a `publish` call are
//!   invoked; a handler registered during delivery waits for the next cycle.
//! - One-shot registrations (`subscribe_once`) fire at most once and are
//!   removed after the cycle that invoked them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::name::EventName;

/// Boxed listener callback.
///
/// Handlers receive the published payload by reference; the channel retains
/// ownership of the payload for the duration of the delivery cycle.
pub type Handler<M> = Box<dyn FnMut(&M) + Send>;

/// Policy for registrations that arrive without a handler.
///
/// The permissive `InstallNoop` variant matches the historical behavior of
/// frameworks that substitute a do-nothing callback so bulk registration
/// never fails. `Skip` drops the registration and records a warning, which
/// surfaces forgotten handlers during integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingHandler {
    /// Install a no-op handler; the registration counts as a listener.
    #[default]
    InstallNoop,
    /// Drop the registration with a diagnostic warning.
    Skip,
}

/// Channel configuration captured at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelOptions {
    /// Listener count above which a "possible leak" warning is recorded.
    ///
    /// Diagnostic only - registration is never blocked.
    pub max_listeners: usize,
    /// Policy for registrations without a handler.
    pub missing_handler: MissingHandler,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            max_listeners: 10,
            missing_handler: MissingHandler::default(),
        }
    }
}

struct Registration<M> {
    handler: Handler<M>,
    once: bool,
}

/// Private pub/sub channel for one owner instance.
///
/// Generic over the message type `M` so the owning layer decides what a
/// payload is; the channel only routes.
pub struct EventChannel<M> {
    listeners: HashMap<EventName, Vec<Registration<M>>>,
    options: ChannelOptions,
}

impl<M> EventChannel<M> {
    pub fn new(options: ChannelOptions) -> Self {
        Self {
            listeners: HashMap::new(),
            options,
        }
    }

    /// Register a persistent handler for `name`.
    ///
    /// Blank names are ignored (no-op). Handlers fire on every matching
    /// publish until [`EventChannel::unsubscribe_all`] removes them.
    pub fn subscribe(&mut self, name: &str, handler: impl FnMut(&M) + Send + 'static) {
        self.register(name, Box::new(handler), false);
    }

    /// Register a handler that is removed after its first invocation.
    pub fn subscribe_once(&mut self, name: &str, handler: impl FnMut(&M) + Send + 'static) {
        self.register(name, Box::new(handler), true);
    }

    /// Register an optional handler, applying the channel's
    /// [`MissingHandler`] policy when `handler` is `None`.
    pub fn subscribe_opt(&mut self, name: &str, handler: Option<Handler<M>>) {
        match (handler, self.options.missing_handler) {
            (Some(handler), _) => self.register(name, handler, false),
            (None, MissingHandler::InstallNoop) => {
                self.register(name, Box::new(|_: &M| {}), false);
            }
            (None, MissingHandler::Skip) => {
                tracing::warn!(event = name, "listener registered without a handler; skipped");
            }
        }
    }

    /// Raise (or lower) the diagnostic listener capacity.
    pub fn set_max_listeners(&mut self, n: usize) {
        self.options.max_listeners = n;
    }

    /// Remove every registration on this channel.
    ///
    /// Pending one-shot and persistent handlers alike are discarded.
    pub fn unsubscribe_all(&mut self) {
        self.listeners.clear();
    }

    /// Number of registrations currently listening for `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        EventName::parse(name)
            .and_then(|n| self.listeners.get(&n))
            .map_or(0, Vec::len)
    }

    /// Deliver `payload` to every handler registered for `name`.
    ///
    /// Delivery is synchronous and in registration order. Returns the number
    /// of handlers invoked (diagnostic; zero listeners is not an error).
    pub fn publish(&mut self, name: &str, payload: &M) -> usize {
        let Some(name) = EventName::parse(name) else {
            return 0;
        };
        let Some(regs) = self.listeners.get_mut(&name) else {
            return 0;
        };

        // Snapshot the cycle length: registrations appended during delivery
        // wait for the next publish.
        let cycle = regs.len();
        for reg in regs.iter_mut().take(cycle) {
            (reg.handler)(payload);
        }

        // One-shot registrations that fired this cycle are spent.
        let mut index = 0;
        regs.retain(|reg| {
            let spent = reg.once && index < cycle;
            index += 1;
            !spent
        });
        if regs.is_empty() {
            self.listeners.remove(&name);
        }

        cycle
    }

    fn register(&mut self, name: &str, handler: Handler<M>, once: bool) {
        let Some(name) = EventName::parse(name) else {
            tracing::warn!("listener registered against a blank event name; ignored");
            return;
        };

        let regs = self.listeners.entry(name.clone()).or_default();
        regs.push(Registration { handler, once });

        if regs.len() > self.options.max_listeners {
            tracing::warn!(
                event = %name,
                listeners = regs.len(),
                limit = self.options.max_listeners,
                "possible listener leak"
            );
        }
    }
}

impl<M> EventChannel<M>
where
    M: Default,
{
    /// Publish `name` with the explicit "no data" default payload.
    pub fn notify(&mut self, name: &str) -> usize {
        let payload = M::default();
        self.publish(name, &payload)
    }
}

impl<M> Default for EventChannel<M> {
    fn default() -> Self {
        Self::new(ChannelOptions::default())
    }
}

impl<M> core::fmt::Debug for EventChannel<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut counts: Vec<(&str, usize)> = self
            .listeners
            .iter()
            .map(|(name, regs)| (name.as_str(), regs.len()))
            .collect();
        counts.sort_unstable();
        f.debug_struct("EventChannel")
            .field("listeners", &counts)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<String>>>;

    fn handler_for(seen: &Seen, tag: &str) -> impl FnMut(&String) + Send + 'static {
        let seen = Arc::clone(seen);
        let tag = tag.to_string();
        move |payload: &String| {
            seen.lock().unwrap().push(format!("{tag}:{payload}"));
        }
    }

    #[test]
    fn handlers_fire_in_registration_order() {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let mut channel: EventChannel<String> = EventChannel::default();

        channel.subscribe("ping", handler_for(&seen, "first"));
        channel.subscribe("ping", handler_for(&seen, "second"));
        channel.subscribe("ping", handler_for(&seen, "third"));

        let invoked = channel.publish("ping", &"x".to_string());

        assert_eq!(invoked, 3);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["first:x", "second:x", "third:x"]
        );
    }

    #[test]
    fn once_handlers_fire_at_most_once_and_are_removed() {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let mut channel: EventChannel<String> = EventChannel::default();

        channel.subscribe_once("ping", handler_for(&seen, "once"));
        channel.subscribe("ping", handler_for(&seen, "always"));

        channel.publish("ping", &"1".to_string());
        assert_eq!(channel.listener_count("ping"), 1);

        channel.publish("ping", &"2".to_string());
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["once:1", "always:1", "always:2"]
        );
    }

    #[test]
    fn publish_to_unknown_event_is_a_noop() {
        let mut channel: EventChannel<String> = EventChannel::default();
        assert_eq!(channel.publish("nobody-home", &"x".to_string()), 0);
    }

    #[test]
    fn blank_event_names_are_ignored() {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let mut channel: EventChannel<String> = EventChannel::default();

        channel.subscribe("   ", handler_for(&seen, "never"));
        assert_eq!(channel.listener_count("   "), 0);
        assert_eq!(channel.publish("", &"x".to_string()), 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn event_names_are_normalized_for_matching() {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let mut channel: EventChannel<String> = EventChannel::default();

        channel.subscribe(" Error ", handler_for(&seen, "h"));
        channel.publish("error", &"boom".to_string());

        assert_eq!(*seen.lock().unwrap(), vec!["h:boom"]);
    }

    #[test]
    fn unsubscribe_all_discards_pending_registrations() {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let mut channel: EventChannel<String> = EventChannel::default();

        channel.subscribe("a", handler_for(&seen, "a"));
        channel.subscribe_once("b", handler_for(&seen, "b"));
        channel.unsubscribe_all();

        channel.publish("a", &"x".to_string());
        channel.publish("b", &"x".to_string());
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(channel.listener_count("a"), 0);
        assert_eq!(channel.listener_count("b"), 0);
    }

    #[test]
    fn missing_handler_policy_installs_noop_by_default() {
        let mut channel: EventChannel<String> = EventChannel::default();
        channel.subscribe_opt("ping", None);
        assert_eq!(channel.listener_count("ping"), 1);
        // The no-op still participates in delivery without observable effect.
        assert_eq!(channel.publish("ping", &"x".to_string()), 1);
    }

    #[test]
    fn missing_handler_skip_policy_drops_the_registration() {
        let mut channel: EventChannel<String> = EventChannel::new(ChannelOptions {
            missing_handler: MissingHandler::Skip,
            ..ChannelOptions::default()
        });
        channel.subscribe_opt("ping", None);
        assert_eq!(channel.listener_count("ping"), 0);
    }

    #[test]
    fn exceeding_max_listeners_never_blocks_registration() {
        let mut channel: EventChannel<String> = EventChannel::new(ChannelOptions {
            max_listeners: 2,
            ..ChannelOptions::default()
        });
        for _ in 0..5 {
            channel.subscribe("crowded", |_| {});
        }
        assert_eq!(channel.listener_count("crowded"), 5);

        channel.set_max_listeners(100);
        channel.subscribe("crowded", |_| {});
        assert_eq!(channel.listener_count("crowded"), 6);
    }

    proptest::proptest! {
        #[test]
        fn delivery_preserves_registration_order(
            tags in proptest::collection::vec("[a-z]{1,8}", 1..20)
        ) {
            let seen: Seen = Arc::new(Mutex::new(Vec::new()));
            let mut channel: EventChannel<String> = EventChannel::default();
            for tag in &tags {
                channel.subscribe("bulk", handler_for(&seen, tag));
            }

            channel.publish("bulk", &"p".to_string());

            let expected: Vec<String> = tags.iter().map(|t| format!("{t}:p")).collect();
            proptest::prop_assert_eq!(&*seen.lock().unwrap(), &expected);
        }
    }

    #[test]
    fn notify_delivers_the_default_payload() {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut channel: EventChannel<String> = EventChannel::default();

        channel.subscribe("tick", move |payload: &String| {
            sink.lock().unwrap().push(payload.clone());
        });
        channel.notify("tick");

        assert_eq!(*seen.lock().unwrap(), vec![String::new()]);
    }
}
