//! Unit tests for dependency paths and binding keys

use kiln_domain::{DependencyPath, ProviderKey, TypeKey};

struct Server;
struct Database;
struct Handler;

#[test]
fn test_empty_path_renders_empty() {
    assert_eq!(DependencyPath::new().to_string(), "");
    assert!(DependencyPath::new().is_empty());
}

#[test]
fn test_path_extension_does_not_mutate_original() {
    let root = DependencyPath::new().with(ProviderKey::single::<Server>());
    let child = root.with(ProviderKey::single::<Database>());

    assert_eq!(root.len(), 1);
    assert_eq!(child.len(), 2);
    assert_eq!(child.to_string(), "Server -> Database");
}

#[test]
fn test_element_keys_render_index() {
    let path = DependencyPath::new()
        .with(ProviderKey::single::<Server>())
        .with(TypeKey::element::<Handler>().at(0));
    assert_eq!(path.to_string(), "Server -> Element<Handler>[0]");
}

#[test]
fn test_suffix_from_first_match() {
    let path = DependencyPath::new()
        .with(ProviderKey::single::<Server>())
        .with(ProviderKey::single::<Handler>())
        .with(ProviderKey::single::<Database>());

    let start = path
        .position(|key| *key == ProviderKey::single::<Handler>())
        .unwrap();
    assert_eq!(start, 1);
    assert_eq!(path.suffix(start).to_string(), "Handler -> Database");
    assert!(path.suffix(10).is_empty());
}
