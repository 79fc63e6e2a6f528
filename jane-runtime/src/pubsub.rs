//! Direct publisher/subscriber wiring.
//!
//! A source owns a [`Publisher`] listing its subscribers; every subscriber
//! owns a [`SourceSet`] listing the sources it is attached to. Subscribing
//! and unsubscribing always update both sides, so a subscriber can detach
//! from everything with [`EventSubscriber::remove_all_sources`].
//!
//! Publishers hold subscribers strongly and subscribers hold sources weakly,
//! so the wiring never keeps a source alive on its own.
//!
//! # Delivery
//!
//! [`Publisher::post`] calls every subscriber synchronously, in subscription
//! order, on the caller's stack. The list is *not* snapshotted: a receiver
//! that subscribes or unsubscribes during delivery changes which entries the
//! rest of the same delivery reaches. Removing an entry that precedes the
//! current one shifts the next entry into the slot just delivered, so that
//! entry is skipped for this event.

use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::contract::Contract;
use crate::events::DataEvent;

/// Process-unique subscriber identity.
pub type SubscriberId = u64;

static NEXT_SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(1);

pub fn next_subscriber_id() -> SubscriberId {
    NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Anything that announces events.
pub trait EventSource {
    fn source_name(&self) -> &str;

    fn publisher(&self) -> &Publisher;
}

/// Anything that receives events.
pub trait EventSubscriber {
    fn subscriber_id(&self) -> SubscriberId;

    fn subscriber_name(&self) -> &str;

    /// Sources this subscriber is currently attached to.
    fn sources(&self) -> &SourceSet;

    fn receive_event(&self, source: &dyn EventSource, event: &DataEvent);

    /// Unsubscribe from every source.
    fn remove_all_sources(&self) {
        self.sources().remove_all(self.subscriber_id());
    }
}

/// A subscriber together with the contract it subscribed under.
pub struct SubscriberEntry {
    pub subscriber: Rc<dyn EventSubscriber>,
    pub contract: Contract,
}

pub struct Publisher {
    owner: Weak<dyn EventSource>,
    entries: RefCell<Vec<SubscriberEntry>>,
}

impl fmt::Debug for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .entries
            .borrow()
            .iter()
            .map(|e| e.subscriber.subscriber_name().to_string())
            .collect();
        f.debug_struct("Publisher")
            .field("subscribers", &names)
            .finish()
    }
}

impl Publisher {
    /// `owner` is the source this publisher announces for; it is recorded in
    /// each subscriber's [`SourceSet`].
    pub fn new(owner: Weak<dyn EventSource>) -> Self {
        Self {
            owner,
            entries: RefCell::new(Vec::new()),
        }
    }

    /// Append `subscriber` with `contract`. Returns `false` and changes
    /// nothing when it is already subscribed.
    pub fn add_subscriber(&self, subscriber: Rc<dyn EventSubscriber>, contract: Contract) -> bool {
        let id = subscriber.subscriber_id();
        if self.contains(id) {
            return false;
        }
        tracing::trace!(
            "[PUBSUB] {} subscribes (contract fields: {})",
            subscriber.subscriber_name(),
            contract.len()
        );
        subscriber.sources().insert(self.owner.clone());
        self.entries.borrow_mut().push(SubscriberEntry {
            subscriber,
            contract,
        });
        true
    }

    /// Remove the subscriber with `id`. Returns `false` when it is not
    /// subscribed.
    pub fn remove_subscriber(&self, id: SubscriberId) -> bool {
        let removed = {
            let mut entries = self.entries.borrow_mut();
            entries
                .iter()
                .position(|e| e.subscriber.subscriber_id() == id)
                .map(|pos| entries.remove(pos))
        };
        match removed {
            Some(entry) => {
                tracing::trace!("[PUBSUB] {} unsubscribes", entry.subscriber.subscriber_name());
                entry.subscriber.sources().remove(&self.owner);
                true
            }
            None => false,
        }
    }

    /// Remove every subscriber.
    pub fn clear(&self) {
        let entries = mem::take(&mut *self.entries.borrow_mut());
        for entry in entries {
            entry.subscriber.sources().remove(&self.owner);
        }
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|e| e.subscriber.subscriber_id() == id)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn subscriber_ids(&self) -> Vec<SubscriberId> {
        self.entries
            .borrow()
            .iter()
            .map(|e| e.subscriber.subscriber_id())
            .collect()
    }

    /// Fields of `contract` already claimed by a current subscriber, sorted
    /// and without duplicates.
    pub fn claimed_fields(&self, contract: &Contract) -> Vec<String> {
        let mut claimed: Vec<String> = self
            .entries
            .borrow()
            .iter()
            .flat_map(|e| e.contract.overlap(contract))
            .collect();
        claimed.sort();
        claimed.dedup();
        claimed
    }

    /// Whether any current subscriber holds a non-empty contract.
    pub fn has_writer(&self) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|e| !e.contract.is_read_only())
    }

    /// Deliver `event` from `source` to every subscriber. See the module
    /// docs for how concurrent list changes are observed.
    pub fn post(&self, source: &dyn EventSource, event: &DataEvent) {
        let mut slot = 0;
        loop {
            let subscriber = match self.entries.borrow().get(slot) {
                Some(entry) => Rc::clone(&entry.subscriber),
                None => break,
            };
            tracing::trace!(
                "[PUBSUB] {} posting {} to {}",
                source.source_name(),
                event,
                subscriber.subscriber_name()
            );
            subscriber.receive_event(source, event);
            slot += 1;
        }
    }
}

/// The inverse side of a subscription: sources a subscriber is attached to.
#[derive(Default)]
pub struct SourceSet {
    sources: RefCell<Vec<Weak<dyn EventSource>>>,
}

impl fmt::Debug for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSet")
            .field("len", &self.len())
            .finish()
    }
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, source: Weak<dyn EventSource>) -> bool {
        let mut sources = self.sources.borrow_mut();
        if sources.iter().any(|s| Weak::ptr_eq(s, &source)) {
            return false;
        }
        sources.push(source);
        true
    }

    fn remove(&self, source: &Weak<dyn EventSource>) -> bool {
        let mut sources = self.sources.borrow_mut();
        match sources.iter().position(|s| Weak::ptr_eq(s, source)) {
            Some(pos) => {
                sources.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Whether `source` is in the set.
    pub fn contains(&self, source: &dyn EventSource) -> bool {
        self.sources
            .borrow()
            .iter()
            .any(|s| std::ptr::addr_eq(s.as_ptr(), source as *const dyn EventSource))
    }

    pub fn len(&self) -> usize {
        self.sources.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.borrow().is_empty()
    }

    /// Unsubscribe `subscriber` from every source in the set.
    pub fn remove_all(&self, subscriber: SubscriberId) {
        let sources = mem::take(&mut *self.sources.borrow_mut());
        for source in sources {
            if let Some(source) = source.upgrade() {
                source.publisher().remove_subscriber(subscriber);
            }
        }
    }
}

/// A subscriber backed by a closure.
pub struct FnSubscriber<F> {
    id: SubscriberId,
    name: String,
    sources: SourceSet,
    handler: F,
}

impl<F> FnSubscriber<F>
where
    F: Fn(&dyn EventSource, &DataEvent),
{
    pub fn new(name: impl Into<String>, handler: F) -> Rc<Self> {
        Rc::new(Self {
            id: next_subscriber_id(),
            name: name.into(),
            sources: SourceSet::new(),
            handler,
        })
    }
}

impl<F> fmt::Debug for FnSubscriber<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSubscriber")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

impl<F> EventSubscriber for FnSubscriber<F>
where
    F: Fn(&dyn EventSource, &DataEvent),
{
    fn subscriber_id(&self) -> SubscriberId {
        self.id
    }

    fn subscriber_name(&self) -> &str {
        &self.name
    }

    fn sources(&self) -> &SourceSet {
        &self.sources
    }

    fn receive_event(&self, source: &dyn EventSource, event: &DataEvent) {
        (self.handler)(source, event);
    }
}
