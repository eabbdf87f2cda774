//! Obverse: an immutable, attributed, relation-paired directed graph.
//!
//! This crate provides:
//! - A persistent graph value ([`Digraph`]): every mutation returns a new
//!   graph sharing unchanged substructure with its predecessor, which
//!   stays valid for any holder.
//! - Paired relations: every edge is stored under a relation label and
//!   that label's opposite simultaneously, so traversal works from either
//!   side without duplicate bookkeeping.
//! - Multi-index queries: node and edge attributes are reverse-indexed,
//!   and relation-keyed queries traverse through the same indices.
//! - A composable constraint pipeline: every atomic change is observed as
//!   a before/after pair by a chain of constraint functions that may veto
//!   or transform the result.
//!
//! # Name Origin: "Obverse"
//!
//! The obverse is the other face of the same coin. Every relation label in
//! this crate exists only together with its opposite face (`parent` with
//! `child`, `next` with `prev`), and every edge is reachable under both —
//! the two labels are one fact seen from two sides.
//!
//! # Example
//!
//! ```
//! use obverse::prelude::*;
//! use obverse::attrs;
//!
//! let g = digraph([("parent", "child")], vec![]);
//! let g = add_node(&g, attrs! { "name" => "a" }).unwrap();
//! let g = add_node(&g, attrs! { "name" => "b" }).unwrap();
//! let a = node_with(&g, &attrs! { "name" => "a" }).unwrap().unwrap().id();
//! let b = node_with(&g, &attrs! { "name" => "b" }).unwrap().unwrap().id();
//! let g = add_edge(&g, attrs! { "parent" => a, "child" => b }).unwrap();
//!
//! // The parent of b is a.
//! let parents = nodes_where(&g, &attrs! { "parent" => b }).unwrap();
//! assert_eq!(parents[0].id(), a);
//! ```
//!
//! # Attribute value contract
//!
//! Attribute values are used as reverse-index keys, so [`Value`] is a
//! closed enum with total equality, hashing, and ordering; floats are
//! deliberately absent.

pub mod composite;
pub mod constraint;
pub mod core;
pub mod error;
pub mod fingerprint;
pub mod idgen;
pub mod index;
pub mod operations;
pub mod query;
pub mod value;
pub mod view;

pub use crate::composite::{
    add_cycle, add_edges, add_nodes, add_path, assoc_all, assoc_edges, assoc_nodes,
    dissoc_edges, dissoc_nodes, edge_with, edges_touching, node_with, nodes_away,
};
pub use crate::constraint::{constraint, Action, Constraint, Element, ElementKind, Event};
pub use crate::core::Digraph;
pub use crate::error::GraphError;
pub use crate::fingerprint::{fingerprint, HashValue};
pub use crate::idgen::{EdgeId, IdSeq, NodeId};
pub use crate::index::{AttrMap, Bijection, Surjection};
pub use crate::operations::{
    add_edge, add_node, assoc_edge, assoc_node, dissoc_edge, dissoc_node, remove_edge,
    remove_node,
};
pub use crate::query::{edges, edges_where, nodes, nodes_where};
pub use crate::value::{Attrs, Label, Value};
pub use crate::view::{EdgeView, NodeView};

/// Builds a graph from relation pairs and constraints.
///
/// Relations are applied in order (each via [`Digraph::add_relation`]),
/// then constraints are composed in order onto the identity constraint, so
/// the last constraint given observes every other's output.
pub fn digraph<R, L1, L2>(relations: R, constraints: Vec<Constraint>) -> Digraph
where
    R: IntoIterator<Item = (L1, L2)>,
    L1: Into<Label>,
    L2: Into<Label>,
{
    let mut g = Digraph::new();
    for (r1, r2) in relations {
        g = g.add_relation(r1, r2);
    }
    for c in constraints {
        g = g.add_constraint(c);
    }
    g
}

/// Prelude for convenient usage.
pub mod prelude {
    pub use crate::composite::{
        add_cycle, add_edges, add_nodes, add_path, assoc_all, assoc_edges, assoc_nodes,
        dissoc_edges, dissoc_nodes, edge_with, edges_touching, node_with, nodes_away,
    };
    pub use crate::constraint::{constraint, Action, Constraint, Element, ElementKind, Event};
    pub use crate::core::Digraph;
    pub use crate::digraph;
    pub use crate::error::GraphError;
    pub use crate::fingerprint::{fingerprint, HashValue};
    pub use crate::idgen::{EdgeId, IdSeq, NodeId};
    pub use crate::operations::{
        add_edge, add_node, assoc_edge, assoc_node, dissoc_edge, dissoc_node, remove_edge,
        remove_node,
    };
    pub use crate::query::{edges, edges_where, nodes, nodes_where};
    pub use crate::value::{Attrs, Label, Value};
    pub use crate::view::{EdgeView, NodeView};
}
