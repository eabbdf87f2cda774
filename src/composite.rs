//! Derived helpers built on the primitive operations and queries.
//!
//! Everything here is expressible with `crate::operations` and
//! `crate::query` alone; no function below touches graph internals. The
//! plural helpers fold their single-element counterpart over a collection,
//! threading the successor graph through each step.

use crate::constraint::Element;
use crate::core::Digraph;
use crate::error::GraphError;
use crate::idgen::NodeId;
use crate::operations::{
    add_edge, add_node, assoc_edge, assoc_node, dissoc_edge, dissoc_node,
};
use crate::query::{edges_where, nodes_where};
use crate::value::{Attrs, Label, Value};
use crate::view::{EdgeView, NodeView};

/// Edges incident to the node behind `v` under any known relation label.
///
/// The union over every relation label of the edges traversed from `v`
/// across that label, in ascending edge id order.
pub fn edges_touching<'g>(
    g: &'g Digraph,
    v: &NodeView<'_>,
) -> Result<Vec<EdgeView<'g>>, GraphError> {
    let mut seen = im::OrdSet::new();
    for r in g.relation_labels() {
        let mut q = Attrs::new();
        q.insert(r, Value::Node(v.id()));
        for e in edges_where(g, &q)? {
            seen.insert(e.id());
        }
    }
    Ok(seen.into_iter().map(|id| g.edge_view(id)).collect())
}

/// Adds an edge between each consecutive pair of `nodes`: edge `i` carries
/// `{r1: nodes[i], r2: nodes[i+1]}` plus `attrs`.
///
/// With fewer than two nodes there is nothing to connect and the graph is
/// returned unchanged.
pub fn add_path(
    g: &Digraph,
    rels: (Label, Label),
    nodes: &[NodeView<'_>],
    attrs: Attrs,
) -> Result<Digraph, GraphError> {
    let ids: Vec<NodeId> = nodes.iter().map(NodeView::id).collect();
    let mut cur = g.clone();
    for pair in ids.windows(2) {
        cur = link(&cur, &rels, pair[0], pair[1], &attrs)?;
    }
    Ok(cur)
}

/// [`add_path`] plus a closing edge from the last node back to the first.
pub fn add_cycle(
    g: &Digraph,
    rels: (Label, Label),
    nodes: &[NodeView<'_>],
    attrs: Attrs,
) -> Result<Digraph, GraphError> {
    let mut cur = add_path(g, rels.clone(), nodes, attrs.clone())?;
    if let (Some(first), Some(last)) = (nodes.first(), nodes.last()) {
        cur = link(&cur, &rels, last.id(), first.id(), &attrs)?;
    }
    Ok(cur)
}

fn link(
    g: &Digraph,
    rels: &(Label, Label),
    from: NodeId,
    to: NodeId,
    attrs: &Attrs,
) -> Result<Digraph, GraphError> {
    let mut edge_attrs = attrs.clone();
    edge_attrs.insert(rels.0.clone(), Value::Node(from));
    edge_attrs.insert(rels.1.clone(), Value::Node(to));
    add_edge(g, edge_attrs)
}

/// The set of nodes exactly `d` hops along `r` from the starting nodes.
///
/// `d = 0` returns the starting nodes verbatim. A negative `d` traverses
/// the opposite relation `-d` times; `r` must then be a known relation
/// label.
pub fn nodes_away<'g>(
    g: &'g Digraph,
    d: i64,
    r: impl Into<Label>,
    from: &[NodeView<'_>],
) -> Result<Vec<NodeView<'g>>, GraphError> {
    let mut r = r.into();
    let mut d = d;
    if d < 0 {
        r = g
            .opposite(&r)
            .ok_or_else(|| GraphError::InvalidQueryValue(r.clone()))?;
        d = -d;
    }
    if d == 0 {
        return Ok(from.iter().map(|v| g.node_view(v.id())).collect());
    }
    let mut current: im::OrdSet<NodeId> = from.iter().map(NodeView::id).collect();
    for _ in 0..d {
        let mut next = im::OrdSet::new();
        for n in &current {
            let mut q = Attrs::new();
            q.insert(r.clone(), Value::Node(*n));
            for v in nodes_where(g, &q)? {
                next.insert(v.id());
            }
        }
        current = next;
    }
    Ok(current.into_iter().map(|id| g.node_view(id)).collect())
}

/// Adds one node per combination of the cartesian product over every
/// `List`-valued attribute.
///
/// `add_nodes(g, {colour: [red blue], size: [big small]})` adds four
/// nodes. Non-list values are held fixed across the product. Combinations
/// are generated in sorted key order so id assignment is deterministic.
pub fn add_nodes(g: &Digraph, attrs: Attrs) -> Result<Digraph, GraphError> {
    let mut cur = g.clone();
    for combo in combinations(&attrs) {
        cur = add_node(&cur, combo)?;
    }
    Ok(cur)
}

/// Adds one edge per combination of the cartesian product over every
/// `List`-valued attribute (endpoint-valued relation keys included).
pub fn add_edges(g: &Digraph, attrs: Attrs) -> Result<Digraph, GraphError> {
    let mut cur = g.clone();
    for combo in combinations(&attrs) {
        cur = add_edge(&cur, combo)?;
    }
    Ok(cur)
}

/// Merges `attrs` into every listed node.
pub fn assoc_nodes(
    g: &Digraph,
    nodes: &[NodeView<'_>],
    attrs: Attrs,
) -> Result<Digraph, GraphError> {
    let mut cur = g.clone();
    for v in nodes {
        cur = assoc_node(&cur, &cur.node_view(v.id()), attrs.clone())?;
    }
    Ok(cur)
}

/// Removes the listed keys from every listed node.
pub fn dissoc_nodes(
    g: &Digraph,
    nodes: &[NodeView<'_>],
    keys: &[Label],
) -> Result<Digraph, GraphError> {
    let mut cur = g.clone();
    for v in nodes {
        cur = dissoc_node(&cur, &cur.node_view(v.id()), keys)?;
    }
    Ok(cur)
}

/// Merges `attrs` into every listed edge.
pub fn assoc_edges(
    g: &Digraph,
    edges: &[EdgeView<'_>],
    attrs: Attrs,
) -> Result<Digraph, GraphError> {
    let mut cur = g.clone();
    for e in edges {
        cur = assoc_edge(&cur, &cur.edge_view(e.id()), attrs.clone())?;
    }
    Ok(cur)
}

/// Removes the listed keys from every listed edge.
pub fn dissoc_edges(
    g: &Digraph,
    edges: &[EdgeView<'_>],
    keys: &[Label],
) -> Result<Digraph, GraphError> {
    let mut cur = g.clone();
    for e in edges {
        cur = dissoc_edge(&cur, &cur.edge_view(e.id()), keys)?;
    }
    Ok(cur)
}

/// Merges `attrs` into every listed element, nodes and edges mixed.
pub fn assoc_all(
    g: &Digraph,
    elements: &[Element],
    attrs: Attrs,
) -> Result<Digraph, GraphError> {
    let mut cur = g.clone();
    for el in elements {
        cur = match el {
            Element::Node(id) => assoc_node(&cur, &cur.node_view(*id), attrs.clone())?,
            Element::Edge(id) => assoc_edge(&cur, &cur.edge_view(*id), attrs.clone())?,
        };
    }
    Ok(cur)
}

/// The single node matching `query`, if exactly the first is wanted.
pub fn node_with<'g>(
    g: &'g Digraph,
    query: &Attrs,
) -> Result<Option<NodeView<'g>>, GraphError> {
    Ok(nodes_where(g, query)?.into_iter().next())
}

/// The single edge matching `query`, if exactly the first is wanted.
pub fn edge_with<'g>(
    g: &'g Digraph,
    query: &Attrs,
) -> Result<Option<EdgeView<'g>>, GraphError> {
    Ok(edges_where(g, query)?.into_iter().next())
}

/// Expands `List`-valued attributes into the cartesian product of
/// single-valued attribute maps, axes in sorted key order.
fn combinations(attrs: &Attrs) -> Vec<Attrs> {
    let mut entries: Vec<(&Label, &Value)> = attrs.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    let mut acc = vec![Attrs::new()];
    for (k, v) in entries {
        let alts = v.alternatives();
        let mut next = Vec::with_capacity(acc.len() * alts.len().max(1));
        for base in &acc {
            for alt in alts {
                let mut m = base.clone();
                m.insert(k.clone(), alt.clone());
                next.push(m);
            }
        }
        acc = next;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs;
    use crate::operations::add_node;
    use crate::query::nodes;

    fn l(s: &str) -> Label {
        Label::from(s)
    }

    fn next_graph() -> Digraph {
        Digraph::new().add_relation("next", "prev")
    }

    fn with_nodes(g: &Digraph, n: usize) -> (Digraph, Vec<NodeId>) {
        let mut cur = g.clone();
        for i in 0..n {
            cur = add_node(&cur, attrs! { "idx" => i as i64 }).unwrap();
        }
        let ids = cur.node_ids_iter().copied().collect();
        (cur, ids)
    }

    #[test]
    fn path_links_consecutive_nodes() {
        let (g, ids) = with_nodes(&next_graph(), 3);
        let views: Vec<NodeView> = ids.iter().map(|id| g.node_view(*id)).collect();
        let g2 = add_path(
            &g,
            (l("next"), l("prev")),
            &views,
            attrs! { "lane" => 1 },
        )
        .unwrap();
        assert_eq!(g2.edge_count(), 2);
        assert!(g2.is_well_formed());
        for e in crate::query::edges(&g2) {
            assert_eq!(e.attr(&l("lane")), Some(Value::Int(1)));
        }
        // Each hop along "next" reaches the node on the next-labeled side,
        // so two hops from the tail land on the head.
        let start = [g2.node_view(ids[2])];
        let two_away = nodes_away(&g2, 2, "next", &start).unwrap();
        assert_eq!(two_away.len(), 1);
        assert_eq!(two_away[0].id(), ids[0]);
    }

    #[test]
    fn short_paths_add_nothing() {
        let (g, ids) = with_nodes(&next_graph(), 1);
        let views = [g.node_view(ids[0])];
        let g2 = add_path(&g, (l("next"), l("prev")), &views, attrs! {}).unwrap();
        assert_eq!(g2.edge_count(), 0);
    }

    #[test]
    fn cycle_closes_back_to_the_first_node() {
        let (g, ids) = with_nodes(&next_graph(), 3);
        let views: Vec<NodeView> = ids.iter().map(|id| g.node_view(*id)).collect();
        let g2 = add_cycle(&g, (l("next"), l("prev")), &views, attrs! {}).unwrap();
        assert_eq!(g2.edge_count(), 3);
        // Three hops along the cycle is the identity.
        let start = [g2.node_view(ids[1])];
        let around = nodes_away(&g2, 3, "next", &start).unwrap();
        assert_eq!(around.len(), 1);
        assert_eq!(around[0].id(), ids[1]);
    }

    #[test]
    fn nodes_away_zero_and_negative() {
        let (g, ids) = with_nodes(&next_graph(), 3);
        let views: Vec<NodeView> = ids.iter().map(|id| g.node_view(*id)).collect();
        let g2 = add_path(&g, (l("next"), l("prev")), &views, attrs! {}).unwrap();

        let start = [g2.node_view(ids[0])];
        let zero = nodes_away(&g2, 0, "next", &start).unwrap();
        assert_eq!(zero.len(), 1);
        assert_eq!(zero[0].id(), ids[0]);

        // Minus two along "next" walks "prev" twice, head to tail.
        let back = nodes_away(&g2, -2, "next", &start).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].id(), ids[2]);
    }

    #[test]
    fn edges_touching_finds_both_directions() {
        let (g, ids) = with_nodes(&next_graph(), 3);
        let views: Vec<NodeView> = ids.iter().map(|id| g.node_view(*id)).collect();
        let g2 = add_path(&g, (l("next"), l("prev")), &views, attrs! {}).unwrap();
        // The middle node touches both edges, the ends touch one each.
        assert_eq!(edges_touching(&g2, &g2.node_view(ids[1])).unwrap().len(), 2);
        assert_eq!(edges_touching(&g2, &g2.node_view(ids[0])).unwrap().len(), 1);
        assert_eq!(edges_touching(&g2, &g2.node_view(ids[2])).unwrap().len(), 1);
    }

    #[test]
    fn cartesian_add_nodes() {
        let g = next_graph();
        let g2 = add_nodes(
            &g,
            attrs! {
                "colour" => vec![Value::from("red"), Value::from("blue")],
                "size" => vec![Value::from("big"), Value::from("small")],
            },
        )
        .unwrap();
        assert_eq!(g2.node_count(), 4);
        let mut combos: Vec<(Value, Value)> = nodes(&g2)
            .iter()
            .map(|v| {
                (
                    v.attr(&l("colour")).unwrap(),
                    v.attr(&l("size")).unwrap(),
                )
            })
            .collect();
        combos.sort();
        let mut expect = vec![
            (Value::from("red"), Value::from("big")),
            (Value::from("red"), Value::from("small")),
            (Value::from("blue"), Value::from("big")),
            (Value::from("blue"), Value::from("small")),
        ];
        expect.sort();
        assert_eq!(combos, expect);
    }

    #[test]
    fn cartesian_add_edges_over_endpoints() {
        let (g, ids) = with_nodes(&next_graph(), 3);
        // One hub, two spokes, in one call.
        let g2 = add_edges(
            &g,
            attrs! {
                "next" => ids[0],
                "prev" => vec![Value::Node(ids[1]), Value::Node(ids[2])],
            },
        )
        .unwrap();
        assert_eq!(g2.edge_count(), 2);
        assert!(g2.is_well_formed());
    }

    #[test]
    fn plural_assoc_and_dissoc_apply_to_every_element() {
        let (g, ids) = with_nodes(&next_graph(), 3);
        let views: Vec<NodeView> = ids.iter().map(|id| g.node_view(*id)).collect();
        let g2 = assoc_nodes(&g, &views, attrs! { "seen" => true }).unwrap();
        for v in nodes(&g2) {
            assert_eq!(v.attr(&l("seen")), Some(Value::Bool(true)));
        }
        let views2: Vec<NodeView> = ids.iter().map(|id| g2.node_view(*id)).collect();
        let g3 = dissoc_nodes(&g2, &views2, &[l("seen")]).unwrap();
        for v in nodes(&g3) {
            assert_eq!(v.attr(&l("seen")), None);
        }
    }

    #[test]
    fn assoc_all_mixes_nodes_and_edges() {
        let (g, ids) = with_nodes(&next_graph(), 2);
        let views: Vec<NodeView> = ids.iter().map(|id| g.node_view(*id)).collect();
        let g2 = add_path(&g, (l("next"), l("prev")), &views, attrs! {}).unwrap();
        let eid = *g2.edge_ids_iter().next().unwrap();
        let els = [Element::Node(ids[0]), Element::Edge(eid)];
        let g3 = assoc_all(&g2, &els, attrs! { "mark" => 7 }).unwrap();
        assert_eq!(g3.node_view(ids[0]).attr(&l("mark")), Some(Value::Int(7)));
        assert_eq!(g3.edge_view(eid).attr(&l("mark")), Some(Value::Int(7)));
        assert_eq!(g3.node_view(ids[1]).attr(&l("mark")), None);
    }

    #[test]
    fn single_result_selectors() {
        let (g, ids) = with_nodes(&next_graph(), 3);
        let hit = node_with(&g, &attrs! { "idx" => 1 }).unwrap().unwrap();
        assert_eq!(hit.id(), ids[1]);
        assert!(node_with(&g, &attrs! { "idx" => 9 }).unwrap().is_none());
    }
}
