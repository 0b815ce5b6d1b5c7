//! Unit tests for container registration and resolution
//!
//! Covers single construction under contention, parent fallback,
//! optional parameters, batch rollback and the build pass.

use kiln_domain::Error;
use kiln_inject::{Container, Module, Void};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
struct Config {
    port: u16,
}

struct Database {
    port: u16,
}

struct Cache;

#[derive(Debug)]
struct Server {
    has_cache: bool,
}

fn counting<T: Send + Sync + 'static>(
    counter: &Arc<AtomicUsize>,
    make: fn() -> T,
) -> impl Fn() -> Arc<T> + Send + Sync + 'static {
    let counter = Arc::clone(counter);
    move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Arc::new(make())
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Test a dependency chain resolves through constructor parameters
#[test]
fn test_resolve_through_parameters() {
    let container = Container::new();
    container.provide(|| Arc::new(Config { port: 5432 })).unwrap();
    container
        .provide(|config: Arc<Config>| Arc::new(Database { port: config.port }))
        .unwrap();

    let db: Arc<Database> = container.resolve().unwrap();
    assert_eq!(db.port, 5432);
}

/// Test 50 concurrent resolutions run the constructor exactly once
#[test]
fn test_concurrent_resolution_constructs_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    container
        .provide(counting(&counter, || Config { port: 1 }))
        .unwrap();

    let resolved: Vec<Arc<Config>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..50)
            .map(|_| scope.spawn(|| container.resolve::<Arc<Config>>().unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(resolved.iter().all(|c| Arc::ptr_eq(c, &resolved[0])));
}

/// Test a missing type reports the full dependency path
#[test]
fn test_missing_type_reports_path() {
    let container = Container::new();
    container
        .provide(|db: Arc<Database>| Arc::new(Server { has_cache: db.port > 0 }))
        .unwrap();

    let err = container.resolve::<Arc<Server>>().unwrap_err();
    assert!(err.is_not_provided());
    assert_eq!(
        err.to_string(),
        "type not provided: dependency path: Server -> Database"
    );
}

/// Test optional parameters degrade to None only when the type is missing
#[test]
fn test_optional_parameter() {
    let container = Container::new();
    container
        .provide(|cache: Option<Arc<Cache>>| Arc::new(Server { has_cache: cache.is_some() }))
        .unwrap();
    let server: Arc<Server> = container.resolve().unwrap();
    assert!(!server.has_cache);

    let with_cache = Container::new();
    with_cache.provide(|| Arc::new(Cache)).unwrap();
    with_cache
        .provide(|cache: Option<Arc<Cache>>| Arc::new(Server { has_cache: cache.is_some() }))
        .unwrap();
    let server: Arc<Server> = with_cache.resolve().unwrap();
    assert!(server.has_cache);
}

/// Test a failing optional dependency still propagates its error
#[test]
fn test_optional_parameter_propagates_other_errors() {
    let container = Container::new();
    container
        .provide(|| -> Result<Arc<Cache>, Error> { Err(Error::internal("cache offline")) })
        .unwrap();
    container
        .provide(|cache: Option<Arc<Cache>>| Arc::new(Server { has_cache: cache.is_some() }))
        .unwrap();

    let err = container.resolve::<Arc<Server>>().unwrap_err();
    assert!(matches!(err, Error::Constructor { .. }));
    assert!(!err.is_not_provided());
}

/// Test constructor errors are wrapped with the constructor name
#[test]
fn test_constructor_error_is_wrapped() {
    let container = Container::new();
    container
        .provide(|| -> anyhow::Result<Arc<Config>> { Err(anyhow::anyhow!("bad port")) })
        .unwrap();

    let err = container.resolve::<Arc<Config>>().unwrap_err();
    match err {
        Error::Constructor { source, .. } => assert!(source.to_string().contains("bad port")),
        other => panic!("unexpected error: {other}"),
    }
}

/// Test the token reaches context parameters
#[test]
fn test_token_is_passed_through() {
    struct Holder(CancellationToken);

    let container = Container::new();
    container
        .provide(|token: CancellationToken| Arc::new(Holder(token)))
        .unwrap();

    let token = CancellationToken::new();
    let holder: Arc<Holder> = container.resolve_with(token.clone()).unwrap();
    token.cancel();
    assert!(holder.0.is_cancelled());
}

/// Test a cancelled token prevents constructors from running
#[test]
fn test_cancelled_token_skips_construction() {
    let counter = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    container
        .provide(counting(&counter, || Config { port: 1 }))
        .unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let err = container.resolve_with::<Arc<Config>>(token).unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    let _: Arc<Config> = container.resolve().unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

/// Test tuple dependencies resolve every member
#[test]
fn test_resolve_tuple() {
    let container = Container::new();
    container.provide(|| Arc::new(Config { port: 80 })).unwrap();
    container.provide(|| Arc::new(Cache)).unwrap();

    let (config, _cache): (Arc<Config>, Arc<Cache>) = container.resolve().unwrap();
    assert_eq!(config.port, 80);
}

/// Test one constructor can own several single bindings
#[test]
fn test_multiple_outputs_memoised_together() {
    let counter = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    let seen = Arc::clone(&counter);
    container
        .provide(move || {
            seen.fetch_add(1, Ordering::SeqCst);
            (Arc::new(Config { port: 1 }), Arc::new(Cache))
        })
        .unwrap();

    let _: Arc<Cache> = container.resolve().unwrap();
    let _: Arc<Config> = container.resolve().unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Registration
// =============================================================================

/// Test a single binding can only be registered once
#[test]
fn test_type_already_provided() {
    let container = Container::new();
    container.provide(|| Arc::new(Cache)).unwrap();
    let err = container.provide(|| Arc::new(Cache)).unwrap_err();
    assert!(matches!(err, Error::TypeAlreadyProvided { ref type_name } if type_name == "Cache"));

    // Still rejected after the first one was resolved
    let _: Arc<Cache> = container.resolve().unwrap();
    assert!(container.provide(|| Arc::new(Cache)).is_err());
}

/// Test the void marker cannot be requested as a single binding
#[test]
fn test_void_parameter_is_rejected() {
    let container = Container::new();
    let err = container
        .provide(|_void: Arc<Void>| Arc::new(Cache))
        .unwrap_err();
    assert!(matches!(err, Error::TypeNotAllowed { .. }));
}

/// Test a failing batch leaves no trace of its earlier constructors
#[test]
fn test_failed_batch_rolls_back() {
    let container = Container::new();
    container.provide(|| Arc::new(Cache)).unwrap();

    let module = Module::new()
        .provide(|| Arc::new(Config { port: 1 }))
        .provide(|| Arc::new(Cache));
    assert!(container.provide_module(module).is_err());

    assert!(!container.is_provided::<Config>().unwrap());
    assert!(container.is_provided::<Cache>().unwrap());
    container.provide(|| Arc::new(Config { port: 2 })).unwrap();
}

/// Test included modules register in order as one batch
#[test]
fn test_module_include() {
    let base = Module::new().provide(|| Arc::new(Config { port: 7 }));
    let module = Module::new()
        .include(base)
        .provide(|config: Arc<Config>| Arc::new(Database { port: config.port }));
    assert_eq!(module.len(), 2);

    let container = Container::new();
    container.provide_module(module).unwrap();
    let db: Arc<Database> = container.resolve().unwrap();
    assert_eq!(db.port, 7);
}

// =============================================================================
// Parent / child
// =============================================================================

/// Test a child returns the parent's single memoised instance
#[test]
fn test_child_uses_parent_instance() {
    let counter = Arc::new(AtomicUsize::new(0));
    let parent = Arc::new(Container::new());
    parent
        .provide(counting(&counter, || Config { port: 9 }))
        .unwrap();

    let child = Container::child(Arc::clone(&parent));
    let first: Arc<Config> = child.resolve().unwrap();
    let second: Arc<Config> = child.resolve().unwrap();
    let from_parent: Arc<Config> = parent.resolve().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &from_parent));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

/// Test the parent can be set only once
#[test]
fn test_parent_already_set() {
    let child = Container::new();
    child.set_parent(Arc::new(Container::new())).unwrap();
    let err = child.set_parent(Arc::new(Container::new())).unwrap_err();
    assert!(matches!(err, Error::ParentAlreadySet));
}

/// Test a child binding shadows nothing in the parent
#[test]
fn test_child_registration_is_local() {
    let parent = Arc::new(Container::new());
    let child = Container::child(Arc::clone(&parent));
    child.provide(|| Arc::new(Cache)).unwrap();

    assert!(child.is_provided::<Cache>().unwrap());
    assert!(!parent.is_provided::<Cache>().unwrap());
}

// =============================================================================
// Build
// =============================================================================

/// Test side-effect constructors run exactly once under build
#[test]
fn test_build_runs_void_constructors_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    let seen = Arc::clone(&counter);
    container
        .provide(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    container.build().unwrap();
    container.build().unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(container.resolve_collected::<Void>().unwrap().len(), 1);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

/// Test build follows registration order
#[test]
fn test_build_follows_registration_order() {
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));
    let container = Container::new();
    for label in ["first", "second", "third"] {
        let order = Arc::clone(&order);
        container
            .provide(move || order.lock().unwrap().push(label))
            .unwrap();
    }

    container.build().unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
}

/// Test build_module registers and builds in one call
#[test]
fn test_build_module() {
    let counter = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    let module = Module::new().provide(counting(&counter, || Cache));

    container.build_module(module).unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}
