//! References derived from another reference.
//!
//! A link subscribes read-only to its upstream through a relay subscriber
//! and reacts to what the upstream announces:
//!
//! - `Populated` while the link is waiting: derive from the upstream bag.
//! - `Changed` while the link holds a bag: derive again.
//! - `Flushed`: flush the link.
//!
//! The relay only holds the link weakly; dropping the link leaves an inert
//! relay behind until [`Reference::detach`] removes it.

use std::rc::{Rc, Weak};

use jane_result::Result as JaneResult;
use jane_table::QueryConfig;

use crate::events::DataEvent;
use crate::pubsub::{EventSource, EventSubscriber, FnSubscriber, SubscriberId};
use crate::reference::{Acquire, PopulateTicket, Reference, ReferenceOptions};

/// Acquisition hook of a derived reference.
pub struct ReferenceLink {
    upstream: Rc<Reference>,
    relay: SubscriberId,
}

impl ReferenceLink {
    /// Create a reference named `name` that derives its bag from `upstream`
    /// through `config`.
    pub fn create(
        name: impl Into<String>,
        upstream: &Rc<Reference>,
        config: QueryConfig,
        options: ReferenceOptions,
    ) -> Rc<Reference> {
        let name = name.into();
        let relay_name = format!("{name}.monitor");
        let mut relay: Option<Rc<dyn EventSubscriber>> = None;

        let link = Reference::build(name, config, options, |this: &Weak<Reference>| {
            let downstream = this.clone();
            let subscriber = FnSubscriber::new(
                relay_name,
                move |source: &dyn EventSource, event: &DataEvent| {
                    if let Some(link) = downstream.upgrade() {
                        handle_upstream_event(&link, source, event);
                    }
                },
            );
            let id = subscriber.subscriber_id();
            relay = Some(subscriber as Rc<dyn EventSubscriber>);
            Box::new(ReferenceLink {
                upstream: Rc::clone(upstream),
                relay: id,
            })
        });

        if let Some(relay) = relay {
            upstream.add_subscriber_read_only(relay);
        }
        link
    }
}

impl Acquire for ReferenceLink {
    fn acquire(&self, reference: &Rc<Reference>, ticket: PopulateTicket) -> JaneResult<()> {
        match self.upstream.bag() {
            Some(bag) => reference
                .populate_response(&ticket, Some(bag), DataEvent::Populated)
                .map(|_| ()),
            None => self.upstream.populate(),
        }
    }

    fn upstream(&self) -> Option<Rc<Reference>> {
        Some(Rc::clone(&self.upstream))
    }

    fn detach(&self) {
        self.upstream.remove_subscriber(self.relay);
    }
}

fn handle_upstream_event(link: &Reference, source: &dyn EventSource, event: &DataEvent) {
    tracing::trace!(
        "[REFERENCE] {} receives {} from {}",
        link.name(),
        event,
        source.source_name()
    );
    let Some(upstream) = link.upstream() else {
        return;
    };
    let result = match event {
        DataEvent::Populated => match (link.pending_ticket(), upstream.bag()) {
            (Some(ticket), Some(bag)) => link
                .populate_response(&ticket, Some(bag), DataEvent::Populated)
                .map(|_| ()),
            _ => Ok(()),
        },
        DataEvent::Changed if link.has_bag() => match upstream.bag() {
            Some(bag) => link.rederive(bag, DataEvent::Changed),
            None => Ok(()),
        },
        DataEvent::Flushed => {
            link.flush();
            Ok(())
        }
        _ => Ok(()),
    };
    if let Err(err) = result {
        tracing::warn!(
            "[REFERENCE] {} failed to derive from {}: {}",
            link.name(),
            upstream.name(),
            err
        );
    }
}
