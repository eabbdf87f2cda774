//! Graph mutations.
//!
//! Every operation here follows the same three-phase discipline:
//!
//! 1. **Validate** against the receiving graph. Nothing is constructed
//!    until every precondition holds, so a failure is total: no successor
//!    value exists, and the receiver is untouched (it is immutable anyway).
//! 2. **Construct** the successor, sharing all unchanged substructure with
//!    the receiver.
//! 3. **Run the constraint chain** on the fully-built successor. Whatever
//!    the chain returns is what the operation returns.
//!
//! Mutation targets are views; a view whose id is not a member of the
//! receiving graph is refused as foreign.
//!
//! # Citations
//! - Validation-before-mutation: Cormen et al., "Introduction to
//!   Algorithms", Chapter 22 (2009)
//! - Persistent update discipline: Okasaki, "Purely Functional Data
//!   Structures", Chapter 2 (1999)

use tracing::trace;

use crate::constraint::{Action, Element, Event};
use crate::core::{normalise_pair, Digraph};
use crate::error::GraphError;
use crate::idgen::{EdgeId, NodeId};
use crate::value::{Attrs, Label, Value};
use crate::view::{EdgeView, NodeView};

/// Adds a node carrying `attrs`, consuming a fresh id.
///
/// No attribute key may name a relation. The id producer must yield a
/// head, and that head must not already be a live node.
pub fn add_node(g: &Digraph, attrs: Attrs) -> Result<Digraph, GraphError> {
    for k in attrs.keys() {
        if g.has_relation(k) {
            return Err(GraphError::AttrIsRelation(k.clone()));
        }
    }
    let raw = g.node_ids.peek().ok_or(GraphError::IdSeqExhausted)?;
    let id = NodeId::new(raw);
    if g.has_node(id) {
        return Err(GraphError::IdSeqCollision(raw));
    }

    let mut next = g.clone();
    next.nodes.insert(id);
    next.nodes_map = next.nodes_map.merge(&id, &attrs);
    next.node_ids = next.node_ids.advance();
    trace!(node = %id, "add node");
    Ok(finish(g, next, Action::Add, Element::Node(id)))
}

/// Removes the node behind `v`, cascading over its incident edges first.
///
/// The node's id is prepended back onto the node id sequence, so the next
/// add on this lineage reuses it. Ids of cascaded edges are not reclaimed.
pub fn remove_node(g: &Digraph, v: &NodeView<'_>) -> Result<Digraph, GraphError> {
    let id = member_node(g, v)?;

    let mut next = g.clone();
    for eid in incident_edges(g, id) {
        next.edges_map = next.edges_map.remove_id(&eid);
        next.edges_relations.remove(&eid);
    }
    next.nodes.remove(&id);
    next.nodes_map = next.nodes_map.remove_id(&id);
    next.node_ids = next.node_ids.push_back_id(id.as_i64());
    trace!(node = %id, "remove node");
    Ok(finish(g, next, Action::Remove, Element::Node(id)))
}

/// Merges `attrs` into the node behind `v`.
///
/// No attribute key may name a relation.
pub fn assoc_node(g: &Digraph, v: &NodeView<'_>, attrs: Attrs) -> Result<Digraph, GraphError> {
    let id = member_node(g, v)?;
    for k in attrs.keys() {
        if g.has_relation(k) {
            return Err(GraphError::AttrIsRelation(k.clone()));
        }
    }

    let mut next = g.clone();
    next.nodes_map = next.nodes_map.merge(&id, &attrs);
    trace!(node = %id, "assoc node");
    Ok(finish(g, next, Action::Assoc, Element::Node(id)))
}

/// Removes the listed attribute keys from the node behind `v`.
///
/// Keys the node does not carry are ignored.
pub fn dissoc_node(g: &Digraph, v: &NodeView<'_>, keys: &[Label]) -> Result<Digraph, GraphError> {
    let id = member_node(g, v)?;

    let mut next = g.clone();
    for k in keys {
        next.nodes_map = next.nodes_map.dissoc(&id, k);
    }
    trace!(node = %id, "dissoc node");
    Ok(finish(g, next, Action::Dissoc, Element::Node(id)))
}

/// Adds an edge described by `attrs`, consuming a fresh edge id.
///
/// `attrs` must carry exactly two relation-labeled keys, the two labels
/// must be each other's opposites, and each must reference a node of this
/// graph. The remaining keys become user attributes of the edge.
pub fn add_edge(g: &Digraph, attrs: Attrs) -> Result<Digraph, GraphError> {
    let rel: Vec<(&Label, &Value)> = attrs.iter().filter(|&(k, _)| g.has_relation(k)).collect();
    if rel.len() != 2 {
        return Err(GraphError::EdgeRelationCount(rel.len()));
    }
    let (r1, v1) = rel[0];
    let (r2, v2) = rel[1];
    if !g.related_in(r1, r2) {
        return Err(GraphError::EdgeRelationsNotOpposite(r1.clone(), r2.clone()));
    }
    ensure_endpoint(g, r1, v1)?;
    ensure_endpoint(g, r2, v2)?;

    let raw = g.edge_ids.peek().ok_or(GraphError::IdSeqExhausted)?;
    let id = EdgeId::new(raw);
    if g.has_edge(id) {
        return Err(GraphError::IdSeqCollision(raw));
    }

    let pair = normalise_pair(r1.clone(), r2.clone());
    let mut next = g.clone();
    next.edges_map = next.edges_map.merge(&id, &attrs);
    next.edges_relations.insert(id, pair);
    next.edge_ids = next.edge_ids.advance();
    trace!(edge = %id, "add edge");
    Ok(finish(g, next, Action::Add, Element::Edge(id)))
}

/// Removes the edge behind `e` and prepends its id back onto the edge id
/// sequence.
pub fn remove_edge(g: &Digraph, e: &EdgeView<'_>) -> Result<Digraph, GraphError> {
    let id = member_edge(g, e)?;

    let mut next = g.clone();
    next.edges_map = next.edges_map.remove_id(&id);
    next.edges_relations.remove(&id);
    next.edge_ids = next.edge_ids.push_back_id(id.as_i64());
    trace!(edge = %id, "remove edge");
    Ok(finish(g, next, Action::Remove, Element::Edge(id)))
}

/// Merges `attrs` into the edge behind `e`.
///
/// The edge's relation pair is fixed at creation. Relation-labeled keys in
/// `attrs` may only re-point an endpoint: with one such key the label must
/// be one of the edge's own pair; with two they must be exactly the pair.
/// Every endpoint referenced must be a node of this graph.
pub fn assoc_edge(g: &Digraph, e: &EdgeView<'_>, attrs: Attrs) -> Result<Digraph, GraphError> {
    let id = member_edge(g, e)?;
    let pair = g
        .edges_relations
        .get(&id)
        .cloned()
        .expect("live edge has a relation pair");

    let rel: Vec<(&Label, &Value)> = attrs.iter().filter(|&(k, _)| g.has_relation(k)).collect();
    match rel.as_slice() {
        [] => {}
        [(k, v)] => {
            let (k, v): (&Label, &Value) = (*k, *v);
            if *k != pair.0 && *k != pair.1 {
                return Err(GraphError::EdgeRelationAltered(k.clone()));
            }
            ensure_endpoint(g, k, v)?;
        }
        // Both labels offered: they must be exactly this edge's pair.
        [(ka, va), (kb, vb)] => {
            let (ka, va): (&Label, &Value) = (*ka, *va);
            let (kb, vb): (&Label, &Value) = (*kb, *vb);
            let offered = normalise_pair(ka.clone(), kb.clone());
            if offered != pair {
                let offending = if *ka != pair.0 && *ka != pair.1 {
                    ka.clone()
                } else {
                    kb.clone()
                };
                return Err(GraphError::EdgeRelationAltered(offending));
            }
            ensure_endpoint(g, ka, va)?;
            ensure_endpoint(g, kb, vb)?;
        }
        more => {
            return Err(GraphError::EdgeRelationCount(more.len()));
        }
    }

    let mut next = g.clone();
    next.edges_map = next.edges_map.merge(&id, &attrs);
    trace!(edge = %id, "assoc edge");
    Ok(finish(g, next, Action::Assoc, Element::Edge(id)))
}

/// Removes the listed attribute keys from the edge behind `e`.
///
/// Relation keys cannot be dissociated; an edge always keeps both of its
/// endpoints.
pub fn dissoc_edge(g: &Digraph, e: &EdgeView<'_>, keys: &[Label]) -> Result<Digraph, GraphError> {
    let id = member_edge(g, e)?;
    for k in keys {
        if g.has_relation(k) {
            return Err(GraphError::EdgeRelationDissociation(k.clone()));
        }
    }

    let mut next = g.clone();
    for k in keys {
        next.edges_map = next.edges_map.dissoc(&id, k);
    }
    trace!(edge = %id, "dissoc edge");
    Ok(finish(g, next, Action::Dissoc, Element::Edge(id)))
}

// ----------------------------------------------------------------------
// Shared helpers
// ----------------------------------------------------------------------

/// Runs the constraint chain of `old` on the constructed successor.
fn finish(old: &Digraph, successor: Digraph, action: Action, element: Element) -> Digraph {
    let event = Event::new(action, element);
    old.constraints.apply(&event, old, successor)
}

fn member_node(g: &Digraph, v: &NodeView<'_>) -> Result<NodeId, GraphError> {
    let id = v.id();
    if g.has_node(id) {
        Ok(id)
    } else {
        Err(GraphError::ForeignView)
    }
}

fn member_edge(g: &Digraph, e: &EdgeView<'_>) -> Result<EdgeId, GraphError> {
    let id = e.id();
    if g.has_edge(id) {
        Ok(id)
    } else {
        Err(GraphError::ForeignView)
    }
}

/// Requires `v` to reference a live node of `g`.
fn ensure_endpoint(g: &Digraph, k: &Label, v: &Value) -> Result<(), GraphError> {
    match v.as_node() {
        Some(id) if g.has_node(id) => Ok(()),
        _ => Err(GraphError::EdgeEndpointMissing(k.clone())),
    }
}

/// Edge ids incident to `id` under any known relation label.
pub(crate) fn incident_edges(g: &Digraph, id: NodeId) -> im::OrdSet<EdgeId> {
    let target = Value::Node(id);
    let mut acc = im::OrdSet::new();
    for r in g.relation_labels() {
        acc = acc.union(g.edges_map.keys_with(&r, &target));
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs;
    use crate::constraint::constraint;
    use crate::idgen::IdSeq;
    use std::sync::Arc;

    fn l(s: &str) -> Label {
        Label::from(s)
    }

    fn parent_child() -> Digraph {
        Digraph::new().add_relation("parent", "child")
    }

    /// Two named nodes and the ids they received.
    fn two_nodes() -> (Digraph, NodeId, NodeId) {
        let g = add_node(&parent_child(), attrs! { "name" => "a" }).unwrap();
        let g = add_node(&g, attrs! { "name" => "b" }).unwrap();
        let ids: Vec<NodeId> = g.node_ids_iter().copied().collect();
        let mut ids = ids.into_iter();
        let a = ids.next().unwrap();
        let b = ids.next().unwrap();
        (g, a, b)
    }

    #[test]
    fn add_node_consumes_even_ids() {
        let (g, a, b) = two_nodes();
        assert_eq!((a.as_i64(), b.as_i64()), (0, 2));
        assert!(g.is_well_formed());
    }

    #[test]
    fn add_node_rejects_relation_keys() {
        let err = add_node(&parent_child(), attrs! { "parent" => 1 }).unwrap_err();
        assert_eq!(err, GraphError::AttrIsRelation(l("parent")));
    }

    #[test]
    fn predecessor_survives_mutation() {
        let g0 = parent_child();
        let g1 = add_node(&g0, attrs! { "name" => "a" }).unwrap();
        assert_eq!(g0.node_count(), 0);
        assert_eq!(g1.node_count(), 1);
    }

    #[test]
    fn add_edge_requires_opposite_pair() {
        let (g, a, b) = two_nodes();
        let g2 = g.add_relation("likes", "liked-by");
        let err = add_edge(&g2, attrs! { "parent" => a, "likes" => b }).unwrap_err();
        assert!(matches!(err, GraphError::EdgeRelationsNotOpposite(_, _)));
    }

    #[test]
    fn add_edge_counts_relation_keys() {
        let (g, a, _) = two_nodes();
        let err = add_edge(&g, attrs! { "parent" => a }).unwrap_err();
        assert_eq!(err, GraphError::EdgeRelationCount(1));
        let err = add_edge(&g, attrs! { "weight" => 3 }).unwrap_err();
        assert_eq!(err, GraphError::EdgeRelationCount(0));
    }

    #[test]
    fn add_edge_requires_live_endpoints() {
        let (g, a, _) = two_nodes();
        let err =
            add_edge(&g, attrs! { "parent" => a, "child" => NodeId::new(99) }).unwrap_err();
        assert_eq!(err, GraphError::EdgeEndpointMissing(l("child")));
        // A non-node value under a relation key is the same failure.
        let err = add_edge(&g, attrs! { "parent" => a, "child" => "b" }).unwrap_err();
        assert_eq!(err, GraphError::EdgeEndpointMissing(l("child")));
    }

    #[test]
    fn add_edge_stores_endpoints_and_pair() {
        let (g, a, b) = two_nodes();
        let g = add_edge(&g, attrs! { "parent" => a, "child" => b, "since" => 2001 }).unwrap();
        assert!(g.is_well_formed());
        let eid = *g.edge_ids_iter().next().unwrap();
        assert_eq!(eid.as_i64(), 1);
        let e = g.edge_view(eid);
        assert_eq!(e.attr(&l("since")), Some(Value::Int(2001)));
        assert_eq!(e.attr(&l("parent")), Some(Value::Node(a)));
    }

    #[test]
    fn remove_node_cascades_incident_edges() {
        let (g, a, b) = two_nodes();
        let g = add_edge(&g, attrs! { "parent" => a, "child" => b }).unwrap();
        let g = remove_node(&g, &g.node_view(a)).unwrap();
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.edge_count(), 0);
        assert!(g.has_node(b));
        assert!(g.is_well_formed());
    }

    #[test]
    fn removed_node_id_is_reused() {
        let g = parent_child();
        let g = add_node(&g, attrs! { "n" => 1 }).unwrap();
        let g = add_node(&g, attrs! { "n" => 2 }).unwrap();
        let g = add_node(&g, attrs! { "n" => 3 }).unwrap();
        let last = *g.node_ids_iter().last().unwrap();
        let g = remove_node(&g, &g.node_view(last)).unwrap();
        let g = add_node(&g, attrs! { "n" => 4 }).unwrap();
        assert!(g.has_node(last));
        assert_eq!(
            g.node_view(last).attr(&l("n")),
            Some(Value::Int(4))
        );
    }

    #[test]
    fn remove_then_add_restores_node_state() {
        let (g, _, _) = two_nodes();
        let g = g.reset_constraints();
        let before = g.clone();
        let g2 = add_node(&g, attrs! { "name" => "c" }).unwrap();
        let added = *g2.node_ids_iter().last().unwrap();
        let g3 = remove_node(&g2, &g2.node_view(added)).unwrap();
        assert_eq!(g3, before);
        // The id sequence head is restored too.
        assert_eq!(g3.node_ids.peek(), g.node_ids.peek());
    }

    #[test]
    fn foreign_views_are_refused() {
        let (g, a, _) = two_nodes();
        let other = parent_child();
        assert_eq!(
            remove_node(&other, &other.node_view(a)).unwrap_err(),
            GraphError::ForeignView
        );
        assert_eq!(
            assoc_node(&other, &other.node_view(a), attrs! { "x" => 1 }).unwrap_err(),
            GraphError::ForeignView
        );
        let _ = g;
    }

    #[test]
    fn assoc_node_merges_and_is_idempotent() {
        let (g, a, _) = two_nodes();
        let g1 = assoc_node(&g, &g.node_view(a), attrs! { "size" => 2 }).unwrap();
        let g2 = assoc_node(&g1, &g1.node_view(a), attrs! { "size" => 2 }).unwrap();
        assert_eq!(g1, g2);
        assert_eq!(g2.node_view(a).attr(&l("name")), Some(Value::from("a")));
    }

    #[test]
    fn dissoc_node_of_absent_key_is_noop() {
        let (g, a, _) = two_nodes();
        let g2 = dissoc_node(&g, &g.node_view(a), &[l("missing")]).unwrap();
        assert_eq!(g, g2);
    }

    #[test]
    fn assoc_edge_cannot_alter_relation_pair() {
        let (g, a, b) = two_nodes();
        let g = g.add_relation("likes", "liked-by");
        let g = add_edge(&g, attrs! { "likes" => a, "liked-by" => b }).unwrap();
        let eid = *g.edge_ids_iter().next().unwrap();
        let err = assoc_edge(&g, &g.edge_view(eid), attrs! { "parent" => a }).unwrap_err();
        assert_eq!(err, GraphError::EdgeRelationAltered(l("parent")));
    }

    #[test]
    fn assoc_edge_repoints_an_endpoint() {
        let (g, a, b) = two_nodes();
        let g = add_node(&g, attrs! { "name" => "c" }).unwrap();
        let c = *g.node_ids_iter().last().unwrap();
        let g = add_edge(&g, attrs! { "parent" => a, "child" => b }).unwrap();
        let eid = *g.edge_ids_iter().next().unwrap();
        let g = assoc_edge(&g, &g.edge_view(eid), attrs! { "child" => c }).unwrap();
        assert!(g.is_well_formed());
        assert_eq!(g.edge_view(eid).endpoint(&l("child")).unwrap().id(), c);
        // Repointing to a dead endpoint is refused.
        let err = assoc_edge(
            &g,
            &g.edge_view(eid),
            attrs! { "child" => NodeId::new(99) },
        )
        .unwrap_err();
        assert_eq!(err, GraphError::EdgeEndpointMissing(l("child")));
    }

    #[test]
    fn dissoc_edge_protects_relation_keys() {
        let (g, a, b) = two_nodes();
        let g = add_edge(&g, attrs! { "parent" => a, "child" => b, "w" => 1 }).unwrap();
        let eid = *g.edge_ids_iter().next().unwrap();
        let err = dissoc_edge(&g, &g.edge_view(eid), &[l("parent")]).unwrap_err();
        assert_eq!(err, GraphError::EdgeRelationDissociation(l("parent")));
        let g = dissoc_edge(&g, &g.edge_view(eid), &[l("w")]).unwrap();
        assert_eq!(g.edge_view(eid).attr(&l("w")), None);
        assert!(g.is_well_formed());
    }

    #[test]
    fn removed_edge_id_is_reused() {
        let (g, a, b) = two_nodes();
        let g = add_edge(&g, attrs! { "parent" => a, "child" => b }).unwrap();
        let eid = *g.edge_ids_iter().next().unwrap();
        let g = remove_edge(&g, &g.edge_view(eid)).unwrap();
        let g = add_edge(&g, attrs! { "parent" => b, "child" => a }).unwrap();
        assert_eq!(*g.edge_ids_iter().next().unwrap(), eid);
    }

    #[test]
    fn exhausted_id_seq_is_reported() {
        let g = parent_child().with_id_seqs(
            IdSeq::from_producer(Arc::new(|_| None)),
            IdSeq::odds(),
        );
        assert_eq!(
            add_node(&g, attrs! {}).unwrap_err(),
            GraphError::IdSeqExhausted
        );
    }

    #[test]
    fn colliding_id_seq_is_reported() {
        // A constant producer repeats its first id.
        let g = parent_child().with_id_seqs(
            IdSeq::from_producer(Arc::new(|_| Some(0))),
            IdSeq::odds(),
        );
        let g = add_node(&g, attrs! {}).unwrap();
        assert_eq!(
            add_node(&g, attrs! {}).unwrap_err(),
            GraphError::IdSeqCollision(0)
        );
    }

    #[test]
    fn constraint_can_veto_removal() {
        let veto = constraint(|ev: &Event, old: &Digraph, new: &Digraph| {
            if ev.action == Action::Remove {
                old.clone()
            } else {
                new.clone()
            }
        });
        let (g, a, _) = two_nodes();
        let g = g.add_constraint(veto);
        let before = g.clone();
        let after = remove_node(&g, &g.node_view(a)).unwrap();
        assert_eq!(after, before);
    }

    #[test]
    fn constraints_compose_in_add_order() {
        // The first constraint tags the touched node; the second observes
        // the tag, proving it ran on the first one's output.
        let first = constraint(|ev: &Event, _: &Digraph, new: &Digraph| {
            let Some(id) = ev.node_id() else {
                return new.clone();
            };
            let mut out = new.clone();
            out.nodes_map = out.nodes_map.assoc(id, Label::from("step"), Value::Int(1));
            out
        });
        let second = constraint(|ev: &Event, _: &Digraph, new: &Digraph| {
            let Some(id) = ev.node_id() else {
                return new.clone();
            };
            assert_eq!(
                new.node_view(id).attr(&Label::from("step")),
                Some(Value::Int(1))
            );
            let mut out = new.clone();
            out.nodes_map = out.nodes_map.assoc(id, Label::from("step"), Value::Int(2));
            out
        });
        let g = parent_child().add_constraint(first).add_constraint(second);
        let g = add_node(&g, attrs! {}).unwrap();
        let id = *g.node_ids_iter().next().unwrap();
        assert_eq!(g.node_view(id).attr(&Label::from("step")), Some(Value::Int(2)));
    }
}
