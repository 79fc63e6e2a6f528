use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use jane_expr::FilterExpr;
use jane_runtime::{
    Contract, DataEvent, DeferredSource, EventKind, EventSource, EventSubscriber, FnSubscriber,
    Reference, ReferenceLink, ReferenceOptions, ReferenceStatus, StaticSource,
};
use jane_table::{Bag, QueryConfig};
use jane_test_utils::fixtures::ages_bag;
use jane_test_utils::init_tracing_for_tests;
use jane_types::Value;

type EventLog = Rc<RefCell<Vec<(String, EventKind)>>>;

fn people() -> Arc<Bag> {
    Arc::new(ages_bag("people"))
}

fn recorder(name: &str, log: &EventLog) -> Rc<dyn EventSubscriber> {
    let log = Rc::clone(log);
    FnSubscriber::new(name, move |source: &dyn EventSource, event: &DataEvent| {
        log.borrow_mut()
            .push((source.source_name().to_string(), event.kind()));
    })
}

fn kinds(log: &EventLog) -> Vec<EventKind> {
    log.borrow().iter().map(|(_, kind)| *kind).collect()
}

fn ids(bag: &Bag) -> Vec<Value> {
    bag.records()
        .iter()
        .map(|r| r.value_or_null("id").clone())
        .collect()
}

#[test]
fn double_populate_acquires_once() {
    init_tracing_for_tests();
    let source = DeferredSource::new();
    let reference = Reference::new("people", source.clone());
    let log = EventLog::default();
    reference.add_subscriber_read_only(recorder("watcher", &log));

    reference.populate().unwrap();
    reference.populate().unwrap();
    assert_eq!(source.requests(), 1);
    assert_eq!(kinds(&log), vec![EventKind::Populating]);

    assert!(source.complete_next(people()).unwrap());
    assert_eq!(reference.status(), ReferenceStatus::Populated);
    assert_eq!(kinds(&log), vec![EventKind::Populating, EventKind::Populated]);

    reference.populate().unwrap();
    assert_eq!(source.requests(), 1);

    reference.post().unwrap();
    assert_eq!(log.borrow().len(), 3);
    assert_eq!(log.borrow()[2], ("people".to_string(), EventKind::Populated));
}

#[test]
fn flush_emits_once_and_only_when_populated() {
    let reference = Reference::new("people", StaticSource::new(people()));
    let log = EventLog::default();
    reference.add_subscriber_read_only(recorder("watcher", &log));

    reference.flush();
    assert!(log.borrow().is_empty());

    reference.populate().unwrap();
    log.borrow_mut().clear();
    reference.flush();
    reference.flush();
    assert_eq!(kinds(&log), vec![EventKind::Flushed]);
    assert!(!reference.has_bag());
}

#[test]
fn refresh_makes_earlier_responses_stale() {
    let source = DeferredSource::new();
    let reference = Reference::new("people", source.clone());
    reference.populate().unwrap();
    let first = source.take_next().expect("first request");

    reference.refresh().unwrap();
    assert_eq!(source.requests(), 2);
    assert!(!first.complete(Some(people())).unwrap());
    assert!(reference.is_populating());

    assert!(source.complete_next(people()).unwrap());
    assert!(reference.has_bag());
}

#[test]
fn late_response_after_refresh_of_populated_reference_is_ignored() {
    let source = DeferredSource::new();
    let reference = Reference::new("people", source.clone());
    reference.populate().unwrap();
    source.complete_next(people()).unwrap();

    reference.refresh().unwrap();
    let stale = reference.pending_ticket().expect("pending");
    reference.refresh().unwrap();
    assert!(!stale.complete(Some(people())).unwrap());
    assert_eq!(source.pending(), 2);
}

#[test]
fn configured_reference_queries_acquired_bag() {
    let config = QueryConfig::new()
        .with_where(FilterExpr::gt_eq("age", 25))
        .with_sort("age asc");
    let reference = Reference::with_config(
        "adults",
        config,
        ReferenceOptions::default(),
        StaticSource::new(people()),
    );
    reference.populate().unwrap();
    let bag = reference.bag().expect("bag");
    assert_eq!(ids(&bag), vec![Value::from(3), Value::from(1)]);
}

#[test]
fn contracts_are_exclusive_per_field() {
    let reference = Reference::new("people", DeferredSource::new());
    let noop = |_: &dyn EventSource, _: &DataEvent| {};

    assert!(reference.add_subscriber_with_contract(
        FnSubscriber::new("a", noop),
        Contract::new(["age", "color"])
    ));
    assert!(!reference.can_add_subscriber(&Contract::new(["color"])));
    assert!(!reference.add_subscriber_with_contract(
        FnSubscriber::new("b", noop),
        Contract::new(["size", "age"])
    ));
    assert!(reference.add_subscriber_with_contract(
        FnSubscriber::new("c", noop),
        Contract::new(["size"])
    ));
    assert!(reference.add_subscriber_read_only(FnSubscriber::new("d", noop)));
    assert_eq!(reference.subscriber_count(), 3);
}

#[test]
fn writable_bag_gates_new_writers() {
    let noop = |_: &dyn EventSource, _: &DataEvent| {};

    let strict = Reference::new("strict", StaticSource::new(people()));
    strict.add_subscriber_with_contract(FnSubscriber::new("w", noop), Contract::new(["age"]));
    strict.populate().unwrap();
    assert!(strict.bag_is_writable());
    assert!(!strict.add_subscriber_with_contract(
        FnSubscriber::new("w2", noop),
        Contract::new(["name"])
    ));
    // Readers are never blocked by a writable bag.
    assert!(strict.add_subscriber_read_only(FnSubscriber::new("r", noop)));
    assert!(strict.has_bag());

    let lenient = Reference::with_config(
        "lenient",
        QueryConfig::new(),
        ReferenceOptions::default().with_allow_flush_for_subscription(true),
        StaticSource::new(people()),
    );
    let log = EventLog::default();
    lenient.add_subscriber_with_contract(recorder("w", &log), Contract::new(["age"]));
    lenient.populate().unwrap();
    assert!(lenient.add_subscriber_with_contract(
        FnSubscriber::new("w2", noop),
        Contract::new(["name"])
    ));
    assert!(!lenient.has_bag());
    assert_eq!(kinds(&log).last(), Some(&EventKind::Flushed));
}

#[test]
fn writable_copies_do_not_touch_upstream_records() {
    let source_bag = people();
    let reference = Reference::new("people", StaticSource::new(Arc::clone(&source_bag)));
    let noop = |_: &dyn EventSource, _: &DataEvent| {};
    reference.add_subscriber_with_contract(FnSubscriber::new("editor", noop), Contract::new(["age"]));
    reference.populate().unwrap();

    let bag = reference.bag().expect("bag");
    let mut record = bag.records()[0].clone();
    record.set("age", 99);
    assert_eq!(source_bag.records()[0].get("age"), Some(&Value::from(30)));
    assert!(!bag.records()[0].shares_storage_with(&source_bag.records()[0]));
}

#[test]
fn link_derives_from_populated_upstream_synchronously() {
    let upstream = Reference::new("people", StaticSource::new(people()));
    upstream.populate().unwrap();

    let link = ReferenceLink::create(
        "adults",
        &upstream,
        QueryConfig::new().with_where(FilterExpr::gt_eq("age", 25)),
        ReferenceOptions::default(),
    );
    assert_eq!(upstream.subscriber_count(), 1);
    link.populate().unwrap();
    assert_eq!(link.bag().expect("bag").len(), 2);
}

#[test]
fn link_waits_for_upstream_then_cascades() {
    init_tracing_for_tests();
    let source = DeferredSource::new();
    let upstream = Reference::new("people", source.clone());
    let link = ReferenceLink::create(
        "sorted",
        &upstream,
        QueryConfig::new().with_sort("age"),
        ReferenceOptions::default(),
    );
    let log = EventLog::default();
    link.add_subscriber_read_only(recorder("view", &log));

    link.populate().unwrap();
    assert!(upstream.is_populating());
    assert!(link.is_populating());
    assert_eq!(source.requests(), 1);

    source.complete_next(people()).unwrap();
    let bag = link.bag().expect("derived bag");
    assert_eq!(ids(&bag), vec![Value::from(2), Value::from(3), Value::from(1)]);
    assert_eq!(kinds(&log), vec![EventKind::Populating, EventKind::Populated]);

    upstream.post_event(DataEvent::Changed);
    assert_eq!(kinds(&log).last(), Some(&EventKind::Changed));

    upstream.flush();
    assert!(!link.has_bag());
    assert_eq!(kinds(&log).last(), Some(&EventKind::Flushed));
}

#[test]
fn link_ignores_upstream_population_it_did_not_request() {
    let upstream = Reference::new("people", StaticSource::new(people()));
    let link = ReferenceLink::create("copy", &upstream, QueryConfig::new(), ReferenceOptions::default());
    upstream.populate().unwrap();
    assert_eq!(link.status(), ReferenceStatus::Empty);

    // Changed only re-derives an already populated link.
    upstream.post_event(DataEvent::Changed);
    assert!(!link.has_bag());
}

#[test]
fn detached_link_stops_listening() {
    let upstream = Reference::new("people", StaticSource::new(people()));
    let link = ReferenceLink::create("copy", &upstream, QueryConfig::new(), ReferenceOptions::default());
    link.populate().unwrap();
    assert!(link.has_bag());

    link.detach();
    assert_eq!(upstream.subscriber_count(), 0);
    upstream.flush();
    assert!(link.has_bag());
}
