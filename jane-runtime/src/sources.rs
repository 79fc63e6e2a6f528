//! Ready-made acquisition hooks for leaf references.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use jane_result::Result as JaneResult;
use jane_table::Bag;

use crate::events::DataEvent;
use crate::reference::{Acquire, PopulateTicket, Reference};

/// Answers every acquisition immediately with the same bag.
#[derive(Clone, Debug)]
pub struct StaticSource {
    bag: Arc<Bag>,
}

impl StaticSource {
    pub fn new(bag: impl Into<Arc<Bag>>) -> Self {
        Self { bag: bag.into() }
    }
}

impl Acquire for StaticSource {
    fn acquire(&self, reference: &Rc<Reference>, ticket: PopulateTicket) -> JaneResult<()> {
        reference
            .populate_response(&ticket, Some(Arc::clone(&self.bag)), DataEvent::Populated)
            .map(|_| ())
    }
}

#[derive(Debug, Default)]
struct DeferredQueue {
    tickets: RefCell<VecDeque<PopulateTicket>>,
    requests: Cell<usize>,
}

/// Queues acquisitions until the host answers them.
///
/// Clones share one queue: keep a clone to answer requests made by the
/// reference that owns the other.
#[derive(Clone, Debug, Default)]
pub struct DeferredSource {
    queue: Rc<DeferredQueue>,
}

impl DeferredSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquisitions requested so far.
    pub fn requests(&self) -> usize {
        self.queue.requests.get()
    }

    /// Requests not yet answered.
    pub fn pending(&self) -> usize {
        self.queue.tickets.borrow().len()
    }

    /// Remove the oldest unanswered request without answering it.
    pub fn take_next(&self) -> Option<PopulateTicket> {
        self.queue.tickets.borrow_mut().pop_front()
    }

    /// Answer the oldest request with `bag`. Returns `Ok(false)` when there
    /// is no request or the answer was stale.
    pub fn complete_next(&self, bag: impl Into<Arc<Bag>>) -> JaneResult<bool> {
        match self.take_next() {
            Some(ticket) => ticket.complete(Some(bag.into())),
            None => Ok(false),
        }
    }
}

impl Acquire for DeferredSource {
    fn acquire(&self, reference: &Rc<Reference>, ticket: PopulateTicket) -> JaneResult<()> {
        tracing::debug!(
            "[REFERENCE] {} queued acquisition (generation {})",
            reference.name(),
            ticket.generation()
        );
        self.queue.requests.set(self.queue.requests.get() + 1);
        self.queue.tickets.borrow_mut().push_back(ticket);
        Ok(())
    }
}
