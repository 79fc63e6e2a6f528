//! Lazily populated, event-emitting owners of one bag.
//!
//! ```text
//!            populate / post                 populate_response
//!   Empty ------------------> Populating ---------------------> Populated
//!     ^                                                             |
//!     +------------------------------ flush ------------------------+
//! ```
//!
//! How a reference obtains its data is the job of its [`Acquire`] hook: an
//! external loader for leaf references, upstream derivation for
//! [`ReferenceLink`](crate::link::ReferenceLink)s. Each population cycle is
//! identified by a [`PopulateTicket`]; responses carrying anything but the
//! current ticket are ignored, so a late answer to a superseded request can
//! never overwrite newer state.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use jane_result::Result as JaneResult;
use jane_table::{Bag, QueryConfig};

use crate::contract::Contract;
use crate::events::DataEvent;
use crate::pubsub::{EventSource, EventSubscriber, Publisher, SubscriberId};

/// Behaviour knobs of a [`Reference`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceOptions {
    /// When a writing subscriber arrives while the reference holds a
    /// writable bag, flush the bag instead of rejecting the subscriber.
    pub allow_flush_for_subscription: bool,
}

impl ReferenceOptions {
    pub fn with_allow_flush_for_subscription(mut self, allow: bool) -> Self {
        self.allow_flush_for_subscription = allow;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceStatus {
    Empty,
    Populating,
    Populated,
}

/// Identifies one population cycle of one reference.
#[derive(Clone, Debug)]
pub struct PopulateTicket {
    reference: Weak<Reference>,
    generation: u64,
}

impl PopulateTicket {
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The reference that issued the ticket, if it is still alive.
    pub fn reference(&self) -> Option<Rc<Reference>> {
        self.reference.upgrade()
    }

    /// Answer the request with `bag`. Returns `Ok(false)` when the reference
    /// is gone or the ticket is stale.
    pub fn complete(&self, bag: Option<Arc<Bag>>) -> JaneResult<bool> {
        match self.reference() {
            Some(reference) => reference.populate_response(self, bag, DataEvent::Populated),
            None => Ok(false),
        }
    }
}

/// Data acquisition hook of a [`Reference`].
///
/// `acquire` is called at most once per population cycle, after the
/// reference has announced [`DataEvent::Populating`]. It must eventually
/// answer through [`Reference::populate_response`] (or
/// [`PopulateTicket::complete`]) with the ticket it was given, either before
/// returning or later.
pub trait Acquire {
    fn acquire(&self, reference: &Rc<Reference>, ticket: PopulateTicket) -> JaneResult<()>;

    /// The reference this one derives from, if any.
    fn upstream(&self) -> Option<Rc<Reference>> {
        None
    }

    /// Drop any subscriptions the hook holds on other sources.
    fn detach(&self) {}
}

#[derive(Debug, Default)]
struct ReferenceState {
    bag: Option<Arc<Bag>>,
    pending: Option<u64>,
    generation: u64,
}

pub struct Reference {
    name: String,
    config: QueryConfig,
    options: ReferenceOptions,
    publisher: Publisher,
    state: RefCell<ReferenceState>,
    acquire: Box<dyn Acquire>,
    this: Weak<Reference>,
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference")
            .field("name", &self.name)
            .field("status", &self.status())
            .field("options", &self.options)
            .field("publisher", &self.publisher)
            .finish()
    }
}

impl EventSource for Reference {
    fn source_name(&self) -> &str {
        &self.name
    }

    fn publisher(&self) -> &Publisher {
        &self.publisher
    }
}

impl Reference {
    /// A reference that hands acquired bags through unchanged.
    pub fn new(name: impl Into<String>, acquire: impl Acquire + 'static) -> Rc<Self> {
        Self::with_config(name, QueryConfig::default(), ReferenceOptions::default(), acquire)
    }

    /// A reference that runs `config` over every acquired bag.
    pub fn with_config(
        name: impl Into<String>,
        config: QueryConfig,
        options: ReferenceOptions,
        acquire: impl Acquire + 'static,
    ) -> Rc<Self> {
        Self::build(name.into(), config, options, |_| Box::new(acquire))
    }

    /// Construct with a hook that needs a handle back to the reference.
    pub(crate) fn build<F>(
        name: String,
        config: QueryConfig,
        options: ReferenceOptions,
        make_acquire: F,
    ) -> Rc<Self>
    where
        F: FnOnce(&Weak<Reference>) -> Box<dyn Acquire>,
    {
        Rc::new_cyclic(|this: &Weak<Reference>| {
            let owner: Weak<dyn EventSource> = this.clone();
            Reference {
                name,
                config,
                options,
                publisher: Publisher::new(owner),
                state: RefCell::new(ReferenceState::default()),
                acquire: make_acquire(this),
                this: this.clone(),
            }
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn options(&self) -> &ReferenceOptions {
        &self.options
    }

    pub fn upstream(&self) -> Option<Rc<Reference>> {
        self.acquire.upstream()
    }

    pub fn status(&self) -> ReferenceStatus {
        let state = self.state.borrow();
        if state.bag.is_some() {
            ReferenceStatus::Populated
        } else if state.pending.is_some() {
            ReferenceStatus::Populating
        } else {
            ReferenceStatus::Empty
        }
    }

    pub fn has_bag(&self) -> bool {
        self.state.borrow().bag.is_some()
    }

    pub fn bag(&self) -> Option<Arc<Bag>> {
        self.state.borrow().bag.clone()
    }

    /// Whether an acquisition is outstanding.
    pub fn is_populating(&self) -> bool {
        self.state.borrow().pending.is_some()
    }

    /// The ticket of the outstanding acquisition, if any.
    pub fn pending_ticket(&self) -> Option<PopulateTicket> {
        self.state.borrow().pending.map(|generation| PopulateTicket {
            reference: self.this.clone(),
            generation,
        })
    }

    /// The held bag's flag when populated; otherwise whether any subscriber
    /// intends to write.
    pub fn bag_is_writable(&self) -> bool {
        match &self.state.borrow().bag {
            Some(bag) => bag.is_writable(),
            None => self.publisher.has_writer(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.publisher.len()
    }

    /// Start an acquisition unless the reference is populated or already
    /// waiting for one.
    pub fn populate(&self) -> JaneResult<()> {
        if self.status() != ReferenceStatus::Empty {
            tracing::trace!("[REFERENCE] {} populate skipped ({:?})", self.name, self.status());
            return Ok(());
        }
        self.populate_exec()
    }

    /// Announce the current bag if populated, otherwise [`Reference::populate`].
    pub fn post(&self) -> JaneResult<()> {
        if self.has_bag() {
            self.post_event(DataEvent::Populated);
            Ok(())
        } else {
            self.populate()
        }
    }

    /// Drop the bag. Announces [`DataEvent::Flushed`] only when there was one.
    ///
    /// An outstanding acquisition is not cancelled.
    pub fn flush(&self) {
        let dropped = self.state.borrow_mut().bag.take();
        if dropped.is_some() {
            tracing::debug!("[REFERENCE] {} flushed", self.name);
            self.post_event(DataEvent::Flushed);
        }
    }

    /// Flush, then start a new acquisition regardless of state. Any answer
    /// to an earlier acquisition becomes stale.
    pub fn refresh(&self) -> JaneResult<()> {
        self.flush();
        self.populate_exec()
    }

    /// Announce `event` to every subscriber.
    pub fn post_event(&self, event: DataEvent) {
        self.publisher.post(self, &event);
    }

    fn populate_exec(&self) -> JaneResult<()> {
        let Some(this) = self.this.upgrade() else {
            return Ok(());
        };
        let ticket = {
            let mut state = self.state.borrow_mut();
            state.generation += 1;
            state.pending = Some(state.generation);
            PopulateTicket {
                reference: self.this.clone(),
                generation: state.generation,
            }
        };
        tracing::debug!(
            "[REFERENCE] {} requesting data (generation {})",
            self.name,
            ticket.generation
        );
        self.post_event(DataEvent::Populating);
        self.acquire.acquire(&this, ticket)
    }

    fn ticket_is_current(&self, ticket: &PopulateTicket) -> bool {
        Weak::ptr_eq(&ticket.reference, &self.this)
            && self.state.borrow().pending == Some(ticket.generation)
    }

    /// Complete the acquisition identified by `ticket` and announce `event`.
    ///
    /// Returns `Ok(false)` without touching state when the ticket is stale
    /// or `bag` is `None`.
    pub fn populate_response(
        &self,
        ticket: &PopulateTicket,
        bag: Option<Arc<Bag>>,
        event: DataEvent,
    ) -> JaneResult<bool> {
        if !self.ticket_is_current(ticket) {
            tracing::debug!(
                "[REFERENCE] {} ignoring stale response (generation {})",
                self.name,
                ticket.generation
            );
            return Ok(false);
        }
        let Some(bag) = bag else {
            return Ok(false);
        };
        self.apply_bag(bag, event, true)?;
        Ok(true)
    }

    /// Replace the held bag with one derived from `bag` and announce `event`,
    /// outside any acquisition cycle. An acquisition in flight stays current.
    pub(crate) fn rederive(&self, bag: Arc<Bag>, event: DataEvent) -> JaneResult<()> {
        self.apply_bag(bag, event, false)
    }

    fn apply_bag(&self, bag: Arc<Bag>, event: DataEvent, settles: bool) -> JaneResult<()> {
        let writable = self.bag_is_writable();
        let bag = if writable || !self.config.is_empty() {
            Arc::new(bag.query(&self.config, writable)?)
        } else {
            bag
        };
        tracing::debug!(
            "[REFERENCE] {} holds {} rows (writable: {})",
            self.name,
            bag.len(),
            writable
        );
        {
            let mut state = self.state.borrow_mut();
            state.bag = Some(bag);
            if settles {
                state.pending = None;
            }
        }
        self.post_event(event);
        Ok(())
    }

    /// Whether a subscriber with `contract` may be added now.
    ///
    /// A non-empty contract is rejected when it claims a field another
    /// subscriber already claims. It is also rejected when a writable bag is
    /// held, unless the reference allows flushing for subscription, in which
    /// case the bag is flushed. Read-only contracts are always accepted.
    pub fn can_add_subscriber(&self, contract: &Contract) -> bool {
        if contract.is_read_only() {
            return true;
        }
        let claimed = self.publisher.claimed_fields(contract);
        if !claimed.is_empty() {
            tracing::debug!(
                "[REFERENCE] {} contract conflict on {:?}",
                self.name,
                claimed
            );
            return false;
        }
        if self.has_bag() && self.bag_is_writable() {
            if self.options.allow_flush_for_subscription {
                self.flush();
            } else {
                tracing::debug!(
                    "[REFERENCE] {} holds a writable bag, rejecting writer",
                    self.name
                );
                return false;
            }
        }
        true
    }

    /// Subscribe under `contract`. Returns `false` and changes nothing when
    /// the contract is refused or the subscriber is already subscribed.
    pub fn add_subscriber_with_contract(
        &self,
        subscriber: Rc<dyn EventSubscriber>,
        contract: Contract,
    ) -> bool {
        if self.publisher.contains(subscriber.subscriber_id()) {
            return false;
        }
        self.can_add_subscriber(&contract) && self.publisher.add_subscriber(subscriber, contract)
    }

    pub fn add_subscriber_read_only(&self, subscriber: Rc<dyn EventSubscriber>) -> bool {
        self.add_subscriber_with_contract(subscriber, Contract::read_only())
    }

    pub fn remove_subscriber(&self, id: SubscriberId) -> bool {
        self.publisher.remove_subscriber(id)
    }

    /// Release subscriptions the acquisition hook holds elsewhere.
    pub fn detach(&self) {
        self.acquire.detach();
    }
}
