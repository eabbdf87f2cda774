//! Composable constraint pipeline.
//!
//! A constraint observes every mutation as a before/after pair and may
//! veto or transform the result: it receives the event describing the
//! atomic change, the predecessor graph, and the successor graph, and
//! returns the graph the mutation will hand back to the caller. The
//! conventional identity constraint returns the successor unchanged.
//!
//! Constraints compose as an ordered chain folded oldest-first: a
//! constraint added later observes (and may override) the output of every
//! constraint added before it. The chain runs only after the successor is
//! fully constructed and validated; a constraint can never see half-built
//! state.
//!
//! # Citations
//! - Chain of responsibility / visitor: Gamma, Helm, Johnson & Vlissides,
//!   "Design Patterns" (1994)

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::core::Digraph;
use crate::idgen::{EdgeId, NodeId};

/// Which kind of element a mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Edge,
}

/// Which atomic action a mutation performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Add,
    Remove,
    Assoc,
    Dissoc,
}

/// The element a mutation touched, by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Node(NodeId),
    Edge(EdgeId),
}

impl Element {
    /// The kind of the referenced element.
    #[inline]
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Node(_) => ElementKind::Node,
            Element::Edge(_) => ElementKind::Edge,
        }
    }
}

/// One atomic change, as observed by constraints.
///
/// Views of the affected element on either side of the change are obtained
/// with [`Digraph::node_view`] / [`Digraph::edge_view`] on the predecessor
/// and successor; for an `Add` the predecessor view denotes a nonexistent
/// element, for a `Remove` the successor view does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub action: Action,
    pub element: Element,
}

impl Event {
    /// Builds an event.
    #[inline]
    pub fn new(action: Action, element: Element) -> Self {
        Self { action, element }
    }

    /// The kind of the affected element.
    #[inline]
    pub fn kind(&self) -> ElementKind {
        self.element.kind()
    }

    /// The affected node id, if the element is a node.
    #[inline]
    pub fn node_id(&self) -> Option<NodeId> {
        match self.element {
            Element::Node(id) => Some(id),
            Element::Edge(_) => None,
        }
    }

    /// The affected edge id, if the element is an edge.
    #[inline]
    pub fn edge_id(&self) -> Option<EdgeId> {
        match self.element {
            Element::Edge(id) => Some(id),
            Element::Node(_) => None,
        }
    }
}

/// A constraint function: `(event, predecessor, successor) -> result`.
pub type Constraint = Arc<dyn Fn(&Event, &Digraph, &Digraph) -> Digraph + Send + Sync>;

/// Wraps a closure as a [`Constraint`].
pub fn constraint<F>(f: F) -> Constraint
where
    F: Fn(&Event, &Digraph, &Digraph) -> Digraph + Send + Sync + 'static,
{
    Arc::new(f)
}

/// An ordered chain of constraints, folded oldest-first.
///
/// The empty chain is the identity constraint.
#[derive(Clone, Default)]
pub struct ConstraintChain {
    links: im::Vector<Constraint>,
}

impl ConstraintChain {
    /// The identity chain.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Returns a chain with `c` appended; `c` will observe the output of
    /// every constraint already in the chain.
    pub fn push(&self, c: Constraint) -> Self {
        let mut links = self.links.clone();
        links.push_back(c);
        Self { links }
    }

    /// Number of constraints in the chain.
    #[inline]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// True for the identity chain.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Folds the successor through every constraint in order and returns
    /// the final graph. Each link receives the previous link's output as
    /// the successor argument.
    pub fn apply(&self, event: &Event, old: &Digraph, constructed: Digraph) -> Digraph {
        let mut g = constructed;
        for link in self.links.iter() {
            let out = link(event, old, &g);
            if !out.shares_structure(&g) {
                debug!(?event.action, ?event.element, "constraint overrode successor");
            }
            g = out;
        }
        g
    }
}

impl fmt::Debug for ConstraintChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintChain")
            .field("len", &self.links.len())
            .finish()
    }
}
