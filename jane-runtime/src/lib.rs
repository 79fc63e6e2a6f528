//! Reference lifecycle, event wiring and the reference registry.
//!
//! Everything here is single-threaded: references and the registry are
//! shared through `Rc`, and events are delivered synchronously on the
//! caller's stack. A reference event can cascade through links to their
//! own subscribers, so one call may run as deep as the registry tree.

#![forbid(unsafe_code)]

pub mod contract;
pub mod events;
pub mod link;
pub mod pubsub;
pub mod reference;
pub mod registry;
pub mod sources;

pub use contract::Contract;
pub use events::{DataEvent, EventKind};
pub use link::ReferenceLink;
pub use pubsub::{EventSource, EventSubscriber, FnSubscriber, Publisher, SourceSet, SubscriberId};
pub use reference::{Acquire, PopulateTicket, Reference, ReferenceOptions, ReferenceStatus};
pub use registry::{Registry, RegistryOptions};
pub use sources::{DeferredSource, StaticSource};
