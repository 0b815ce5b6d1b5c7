//! Unit tests for multi-binding
//!
//! Contributions keep registration order, parent entries come first, and
//! an empty sequence is reported as missing.

use kiln_inject::{Collected, Container, Element};
use std::sync::Arc;

#[derive(Debug)]
struct Route(&'static str);

trait Greeter: Send + Sync {
    fn greet(&self) -> &'static str;
}

struct English;
struct French;

impl Greeter for English {
    fn greet(&self) -> &'static str {
        "hello"
    }
}

impl Greeter for French {
    fn greet(&self) -> &'static str {
        "bonjour"
    }
}

fn paths(routes: &[Arc<Route>]) -> Vec<&'static str> {
    routes.iter().map(|r| r.0).collect()
}

/// Test three contributions resolve in registration order
#[test]
fn test_contributions_keep_order() {
    let container = Container::new();
    container.provide(|| Element::of(Route("/a"))).unwrap();
    container.provide(|| Element::of(Route("/b"))).unwrap();
    container.provide(|| Element::of(Route("/c"))).unwrap();

    let routes = container.resolve_collected::<Route>().unwrap();
    assert_eq!(paths(&routes), vec!["/a", "/b", "/c"]);
}

/// Test zero contributions is reported as missing
#[test]
fn test_no_contributions_not_provided() {
    let container = Container::new();
    let err = container.resolve_collected::<Route>().unwrap_err();
    assert!(err.is_not_provided());
    assert!(err.to_string().contains("Collected<Route>"));
}

/// Test parent contributions precede local ones
#[test]
fn test_parent_contributions_first() {
    let parent = Arc::new(Container::new());
    parent.provide(|| Element::of(Route("/parent"))).unwrap();

    let child = Container::child(Arc::clone(&parent));
    child.provide(|| Element::of(Route("/child-1"))).unwrap();
    child.provide(|| Element::of(Route("/child-2"))).unwrap();

    let routes = child.resolve_collected::<Route>().unwrap();
    assert_eq!(paths(&routes), vec!["/parent", "/child-1", "/child-2"]);
}

/// Test a child without local contributions sees the parent's
#[test]
fn test_parent_only_contributions() {
    let parent = Arc::new(Container::new());
    parent.provide(|| Element::of(Route("/parent"))).unwrap();
    let child = Container::child(parent);

    let routes = child.resolve_collected::<Route>().unwrap();
    assert_eq!(paths(&routes), vec!["/parent"]);
}

/// Test a constructor can take the collected sequence
#[test]
fn test_collected_parameter() {
    struct Router(Vec<&'static str>);

    let container = Container::new();
    container.provide(|| Element::of(Route("/health"))).unwrap();
    container.provide(|| Element::of(Route("/metrics"))).unwrap();
    container
        .provide(|routes: Collected<Route>| Arc::new(Router(paths(&routes))))
        .unwrap();

    let router: Arc<Router> = container.resolve().unwrap();
    assert_eq!(router.0, vec!["/health", "/metrics"]);
}

/// Test trait objects can be contributed
#[test]
fn test_trait_object_contributions() {
    let container = Container::new();
    container
        .provide(|| {
            let greeter: Arc<dyn Greeter> = Arc::new(English);
            Element::new(greeter)
        })
        .unwrap();
    container
        .provide(|| {
            let greeter: Arc<dyn Greeter> = Arc::new(French);
            Element::new(greeter)
        })
        .unwrap();

    let greeters: Collected<dyn Greeter> = container.resolve().unwrap();
    let words: Vec<_> = greeters.iter().map(|g| g.greet()).collect();
    assert_eq!(words, vec!["hello", "bonjour"]);
}

/// Test a single binding and contributions of one type stay apart
#[test]
fn test_single_and_element_bindings_coexist() {
    let container = Container::new();
    container.provide(|| Arc::new(Route("/single"))).unwrap();
    container.provide(|| Element::of(Route("/element"))).unwrap();

    let single: Arc<Route> = container.resolve().unwrap();
    let collected = container.resolve_collected::<Route>().unwrap();
    assert_eq!(single.0, "/single");
    assert_eq!(paths(&collected), vec!["/element"]);
}

struct Missing;

/// Test a failure inside a parent contribution names the sequence once
#[test]
fn test_parent_contribution_failure_path() {
    let parent = Arc::new(Container::new());
    parent
        .provide(|_m: Arc<Missing>| Element::of(Route("/parent")))
        .unwrap();
    let child = Container::child(Arc::clone(&parent));

    let err = child.resolve_collected::<Route>().unwrap_err();
    assert!(err.is_not_provided());
    assert!(
        err.to_string()
            .ends_with("dependency path: Collected<Route> -> Element<Route>[0] -> Missing"),
        "unexpected error: {err}"
    );
}
