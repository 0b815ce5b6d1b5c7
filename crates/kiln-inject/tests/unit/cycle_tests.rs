//! Unit tests for registration-time cycle detection
//!
//! Every cyclic registration must fail before any constructor body runs
//! and leave the container as it was before the failing call.

use kiln_domain::{Error, Result};
use kiln_inject::{
    Collected, Container, Element, FieldInjector, FieldSet, Injectable, Injected, Module,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
struct Alpha;
struct Beta;

fn assert_cycle(err: &Error, expected: &str) {
    assert!(err.is_circular_dependency(), "unexpected error: {err}");
    assert_eq!(
        err.to_string(),
        format!("circular dependency detected: {expected}")
    );
}

/// Test A -> B -> A is rejected and no constructor runs
#[test]
fn test_two_node_cycle_rejected() {
    let runs = Arc::new(AtomicUsize::new(0));
    let container = Container::new();

    let seen = Arc::clone(&runs);
    container
        .provide(move |_b: Arc<Beta>| {
            seen.fetch_add(1, Ordering::SeqCst);
            Arc::new(Alpha)
        })
        .unwrap();
    let seen = Arc::clone(&runs);
    let err = container
        .provide(move |_a: Arc<Alpha>| {
            seen.fetch_add(1, Ordering::SeqCst);
            Arc::new(Beta)
        })
        .unwrap_err();

    assert_cycle(&err, "Beta -> Alpha -> Beta");
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    // Beta was rolled back, so Alpha now reports it as missing
    let err = container.resolve::<Arc<Alpha>>().unwrap_err();
    assert!(err.is_not_provided());
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

/// Test a cycle inside one batch rolls back the whole batch
#[test]
fn test_cycle_in_batch_rolls_back_batch() {
    let container = Container::new();
    let module = Module::new()
        .provide(|_b: Arc<Beta>| Arc::new(Alpha))
        .provide(|_a: Arc<Alpha>| Arc::new(Beta));

    let err = container.provide_module(module).unwrap_err();
    assert!(err.is_circular_dependency());
    assert!(!container.is_provided::<Alpha>().unwrap());
    assert!(!container.is_provided::<Beta>().unwrap());
}

/// Test a collected parameter creates an edge to every contribution
#[test]
fn test_cycle_through_collected_parameter() {
    let container = Container::new();
    container
        .provide(|_items: Collected<Beta>| Arc::new(Alpha))
        .unwrap();
    let err = container
        .provide(|_a: Arc<Alpha>| Element::of(Beta))
        .unwrap_err();

    assert_cycle(&err, "Element<Beta>[0] -> Alpha -> Element<Beta>[0]");
}

/// Test a self-dependent constructor is rejected
#[test]
fn test_self_dependency_rejected() {
    let container = Container::new();
    let err = container
        .provide(|_a: Option<Arc<Alpha>>| Arc::new(Alpha))
        .unwrap_err();
    assert_cycle(&err, "Alpha -> Alpha");
}

// =============================================================================
// Field injection edges
// =============================================================================

#[derive(Default)]
struct Handler {
    store: Option<Arc<Store>>,
}

struct Store;

impl Injectable for Handler {
    fn declare_fields(fields: &mut FieldSet) {
        fields.required::<Store>();
    }

    fn inject(&mut self, injector: &mut FieldInjector<'_>) -> Result<()> {
        self.store = Some(injector.required()?);
        Ok(())
    }
}

/// Test field requirements count as edges, labelled with the dependent
#[test]
fn test_cycle_through_injected_field() {
    let container = Container::new();
    container
        .provide(|| Injected::new(Handler::default()))
        .unwrap();
    let err = container
        .provide(|_h: Arc<Handler>| Arc::new(Store))
        .unwrap_err();

    assert_cycle(&err, "Store -> Handler -> Store@Handler");
}

/// Test field requirements of sibling outputs count as edges
#[test]
fn test_cycle_through_sibling_output() {
    let container = Container::new();
    container
        .provide(|| (Arc::new(Alpha), Injected::new(Handler::default())))
        .unwrap();
    let err = container
        .provide(|_a: Arc<Alpha>| Arc::new(Store))
        .unwrap_err();

    assert_cycle(&err, "Store -> Alpha -> Store@Handler");
}

/// Test an acyclic field graph registers and injects
#[test]
fn test_acyclic_field_graph_resolves() {
    let container = Container::new();
    container.provide(|| Arc::new(Store)).unwrap();
    container
        .provide(|| Injected::new(Handler::default()))
        .unwrap();

    let handler: Arc<Handler> = container.resolve().unwrap();
    assert!(handler.store.is_some());
}

// =============================================================================
// Undeclared field edges
// =============================================================================

/// Handler that injects a field it never declares
#[derive(Default)]
struct Dispatcher {
    queue: Option<Arc<Queue>>,
}

struct Queue;

impl Injectable for Dispatcher {
    fn inject(&mut self, injector: &mut FieldInjector<'_>) -> Result<()> {
        self.queue = Some(injector.required()?);
        Ok(())
    }
}

/// Test a cycle through an undeclared field fails at resolution instead of blocking
#[test]
fn test_undeclared_field_cycle_detected_at_resolution() {
    let container = Arc::new(Container::new());
    container
        .provide(|| Injected::new(Dispatcher::default()))
        .unwrap();
    // Registration cannot see the undeclared edge
    container
        .provide(|_d: Arc<Dispatcher>| Arc::new(Queue))
        .unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    let resolving = Arc::clone(&container);
    std::thread::spawn(move || {
        let _ = tx.send(resolving.resolve::<Arc<Dispatcher>>().map(|_| ()));
    });
    let err = rx
        .recv_timeout(std::time::Duration::from_secs(5))
        .expect("resolution must not block")
        .unwrap_err();

    assert_cycle(&err, "Dispatcher -> Queue -> Dispatcher");
}
