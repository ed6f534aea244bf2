//! `domainkit-events` — per-instance event channels.
//!
//! This crate contains the **notification primitive** every DomainKit object
//! owns: a private publish/subscribe channel, isolated from any global bus.
//! No IO, no async, no infrastructure concerns.

pub mod channel;
pub mod name;

pub use channel::{ChannelOptions, EventChannel, Handler, MissingHandler};
pub use name::EventName;
