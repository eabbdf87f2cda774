//! Indexed queries over nodes and edges.
//!
//! A query is an attribute-shaped map: each key is matched independently
//! and the results are intersected. Within one key, a `List` value is a
//! union of alternatives; any other value is a single alternative; `Nil`
//! matches nothing. All matching dispatches through the reverse indices,
//! so cost is proportional to the result sets, not to graph size.
//!
//! A key that is a known relation label traverses instead of matching:
//!
//! - a node alternative `v` selects the nodes reachable from `v` across
//!   that relation (for `nodes_where`) or the edges traversed to reach
//!   them (for `edges_where`);
//! - an edge alternative selects that edge's endpoint under the label
//!   (for `nodes_where`) or the edges sharing its opposite endpoint
//!   (for `edges_where`);
//! - anything else is refused as an invalid query value.
//!
//! Results are in ascending id order, deterministic within one graph
//! value.

use crate::core::Digraph;
use crate::error::GraphError;
use crate::idgen::{EdgeId, NodeId};
use crate::value::{Attrs, Label, Value};
use crate::view::{EdgeView, NodeView};

/// All node views, in ascending id order.
pub fn nodes(g: &Digraph) -> Vec<NodeView<'_>> {
    g.node_ids_iter().map(|id| g.node_view(*id)).collect()
}

/// All edge views, in ascending id order.
pub fn edges(g: &Digraph) -> Vec<EdgeView<'_>> {
    g.edge_ids_iter().map(|id| g.edge_view(*id)).collect()
}

/// Node views matching `query`; the empty query matches every node.
pub fn nodes_where<'g>(g: &'g Digraph, query: &Attrs) -> Result<Vec<NodeView<'g>>, GraphError> {
    if query.is_empty() {
        return Ok(nodes(g));
    }
    let sets = per_key_sets(g, query, node_matches_for_key)?;
    Ok(intersect(sets)
        .into_iter()
        .map(|id| g.node_view(id))
        .collect())
}

/// Edge views matching `query`; the empty query matches every edge.
pub fn edges_where<'g>(g: &'g Digraph, query: &Attrs) -> Result<Vec<EdgeView<'g>>, GraphError> {
    if query.is_empty() {
        return Ok(edges(g));
    }
    let sets = per_key_sets(g, query, edge_matches_for_key)?;
    Ok(intersect(sets)
        .into_iter()
        .map(|id| g.edge_view(id))
        .collect())
}

// ----------------------------------------------------------------------
// Per-key matching
// ----------------------------------------------------------------------

/// Evaluates every query key to its union-of-alternatives set.
fn per_key_sets<I, F>(g: &Digraph, query: &Attrs, match_key: F) -> Result<Vec<im::OrdSet<I>>, GraphError>
where
    I: Clone + Ord,
    F: Fn(&Digraph, &Label, &Value) -> Result<im::OrdSet<I>, GraphError>,
{
    let mut sets = Vec::with_capacity(query.len());
    for (k, v) in query.iter() {
        let mut acc = im::OrdSet::new();
        for alt in v.alternatives() {
            acc = acc.union(match_key(g, k, alt)?);
        }
        sets.push(acc);
    }
    Ok(sets)
}

/// The single-key union is returned as-is; multiple keys intersect.
fn intersect<I: Clone + Ord>(mut sets: Vec<im::OrdSet<I>>) -> im::OrdSet<I> {
    let Some(first) = sets.pop() else {
        return im::OrdSet::new();
    };
    sets.into_iter().fold(first, |acc, s| acc.intersection(s))
}

/// Matching node ids for one key and one alternative.
fn node_matches_for_key(
    g: &Digraph,
    k: &Label,
    alt: &Value,
) -> Result<im::OrdSet<NodeId>, GraphError> {
    if alt.is_nil() {
        return Ok(im::OrdSet::new());
    }
    if let Some(opp) = g.opposite(k) {
        // Relation key: traverse.
        match alt {
            Value::Node(_) => {
                let mut out = im::OrdSet::new();
                for e in g.edges_map.keys_with(&opp, alt) {
                    if let Some(n) = g.edges_map.get(&e, k).and_then(Value::as_node) {
                        out.insert(n);
                    }
                }
                Ok(out)
            }
            Value::Edge(eid) => {
                let mut out = im::OrdSet::new();
                if let Some(n) = g.edges_map.get(eid, k).and_then(Value::as_node) {
                    out.insert(n);
                }
                Ok(out)
            }
            _ => Err(GraphError::InvalidQueryValue(k.clone())),
        }
    } else {
        // Attribute key: exact match through the reverse index.
        Ok(g.nodes_map.keys_with(k, alt))
    }
}

/// Matching edge ids for one key and one alternative.
fn edge_matches_for_key(
    g: &Digraph,
    k: &Label,
    alt: &Value,
) -> Result<im::OrdSet<EdgeId>, GraphError> {
    if alt.is_nil() {
        return Ok(im::OrdSet::new());
    }
    if let Some(opp) = g.opposite(k) {
        match alt {
            // Edges traversed from the node across `k`: those carrying the
            // node on the opposite side.
            Value::Node(_) => Ok(g.edges_map.keys_with(&opp, alt)),
            // Edges sharing the given edge's opposite endpoint.
            Value::Edge(eid) => match g.edges_map.get(eid, &opp) {
                Some(target) => Ok(g.edges_map.keys_with(&opp, &target.clone())),
                None => Ok(im::OrdSet::new()),
            },
            _ => Err(GraphError::InvalidQueryValue(k.clone())),
        }
    } else {
        Ok(g.edges_map.keys_with(k, alt))
    }
}
