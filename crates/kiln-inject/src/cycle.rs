//! Registration-time cycle detection
//!
//! A depth-first walk from each newly registered key over the declared
//! edges of pending providers. Keys on the current path are tracked in a
//! set cleared on backtrack; reaching one again reports the suffix of the
//! path starting at its first occurrence.
//!
//! ```text
//! A ─param─→ Element<B>[0] ─param─→ A        "A -> Element<B>[0] -> A"
//! A ─field─→ B ─field─→ A                    "A -> B@A -> A@B"
//! ```
//!
//! Field-injection edges carry the dependent type as a label (`B@A` reads
//! "B, injected into A"); constructor-parameter edges are unlabelled.

use kiln_domain::constants::PATH_SEPARATOR;
use kiln_domain::{Error, ProviderKey, Result, TypeKey};
use std::collections::HashSet;

/// Outgoing edge of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Edge {
    pub to: ProviderKey,
    pub via: Option<TypeKey>,
}

/// Read-only view of the declared dependency graph
pub(crate) trait Graph {
    fn edges(&self, key: ProviderKey) -> Vec<Edge>;
}

#[derive(Debug, Clone, Copy)]
struct Link {
    key: ProviderKey,
    via: Option<TypeKey>,
}

struct Walk<'g, G> {
    graph: &'g G,
    on_path: HashSet<ProviderKey>,
    finished: HashSet<ProviderKey>,
    path: Vec<Link>,
}

/// Fail with `CircularDependency` if `start` can reach itself
pub(crate) fn detect_cycle<G: Graph>(graph: &G, start: ProviderKey) -> Result<()> {
    let mut walk = Walk {
        graph,
        on_path: HashSet::new(),
        finished: HashSet::new(),
        path: Vec::new(),
    };
    walk.visit(Link {
        key: start,
        via: None,
    })
}

impl<G: Graph> Walk<'_, G> {
    fn visit(&mut self, link: Link) -> Result<()> {
        if self.on_path.contains(&link.key) {
            let first = self
                .path
                .iter()
                .position(|l| l.key == link.key)
                .unwrap_or(0);
            let mut cycle = self.path[first..].to_vec();
            cycle.push(link);
            return Err(Error::CircularDependency {
                path: render(&cycle),
            });
        }
        if self.finished.contains(&link.key) {
            return Ok(());
        }

        self.on_path.insert(link.key);
        self.path.push(link);
        for edge in self.graph.edges(link.key) {
            self.visit(Link {
                key: edge.to,
                via: edge.via,
            })?;
        }
        self.path.pop();
        self.on_path.remove(&link.key);
        self.finished.insert(link.key);
        Ok(())
    }
}

fn render(links: &[Link]) -> String {
    links
        .iter()
        .map(|link| match link.via {
            Some(via) => format!("{}@{via}", link.key),
            None => link.key.to_string(),
        })
        .collect::<Vec<_>>()
        .join(PATH_SEPARATOR)
}
