//! The persistent graph value.
//!
//! A [`Digraph`] is an immutable value: every mutating operation (see
//! `crate::operations`) returns a new graph sharing unchanged substructure
//! with its predecessor, and the predecessor stays valid for any holder.
//! This module holds the value itself: the element sets, the attribute
//! maps with their reverse indices, the relation bijection, the id
//! sequences, the constraint chain, and the metadata channel — plus
//! relation and constraint management, equality, and the render surface.
//!
//! # Invariants
//! - `dom(nodes_map) ⊆ nodes`: the node set is the source of truth for
//!   existence; attribute records exist only for nodes with attributes.
//! - For every edge: its record carries exactly two relation-labeled keys,
//!   those labels are an opposite pair equal to `edges_relations[e]`, and
//!   both referenced endpoints are members of `nodes`.
//! - `relations` is symmetric: `opposite(opposite(r)) = r`.
//! - No node attribute key equals a known relation label.
//!
//! # Citations
//! - Value-semantic updates with structural sharing: Okasaki, "Purely
//!   Functional Data Structures" (1999)
//! - Persistence by path copying: Driscoll, Sarnak, Sleator & Tarjan,
//!   "Making Data Structures Persistent" (1989)

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use crate::constraint::{Constraint, ConstraintChain};
use crate::error::GraphError;
use crate::idgen::{EdgeId, IdSeq, NodeId};
use crate::index::{AttrMap, Bijection};
use crate::value::{Label, Value};

/// An immutable, attributed, relation-paired directed graph.
///
/// Equality is structural over the semantic fields only: node set, node
/// attributes, edge attributes, edge relation pairs, and the relation
/// bijection. Id sequences, the constraint chain, and metadata do not
/// participate.
#[derive(Debug, Clone)]
pub struct Digraph {
    pub(crate) nodes: im::OrdSet<NodeId>,
    pub(crate) nodes_map: AttrMap<NodeId>,
    pub(crate) edges_map: AttrMap<EdgeId>,
    /// Relation pair per live edge, normalised to `(min, max)` label order.
    pub(crate) edges_relations: im::OrdMap<EdgeId, (Label, Label)>,
    pub(crate) relations: Bijection<Label, Label>,
    pub(crate) node_ids: IdSeq,
    pub(crate) edge_ids: IdSeq,
    pub(crate) constraints: ConstraintChain,
    pub(crate) meta: Option<Value>,
}

impl Digraph {
    /// Creates an empty graph with the default id producers (even
    /// integers for nodes, odd for edges) and the identity constraint.
    pub fn new() -> Self {
        Self {
            nodes: im::OrdSet::new(),
            nodes_map: AttrMap::new(),
            edges_map: AttrMap::new(),
            edges_relations: im::OrdMap::new(),
            relations: Bijection::new(),
            node_ids: IdSeq::evens(),
            edge_ids: IdSeq::odds(),
            constraints: ConstraintChain::identity(),
            meta: None,
        }
    }

    /// Replaces both id sequences.
    ///
    /// Supplied producers must be infinite and non-repeating; collisions
    /// with live ids are refused at add time.
    pub fn with_id_seqs(&self, node_ids: IdSeq, edge_ids: IdSeq) -> Self {
        let mut next = self.clone();
        next.node_ids = node_ids;
        next.edge_ids = edge_ids;
        next
    }

    // ------------------------------------------------------------------
    // Membership and counts
    // ------------------------------------------------------------------

    /// True if `id` is a node of this graph.
    #[inline]
    pub fn has_node(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    /// True if `id` is an edge of this graph.
    #[inline]
    pub fn has_edge(&self, id: EdgeId) -> bool {
        self.edges_relations.contains_key(&id)
    }

    /// Number of nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges_relations.len()
    }

    /// Iterates node ids in ascending order.
    pub fn node_ids_iter(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter()
    }

    /// Iterates edge ids in ascending order.
    pub fn edge_ids_iter(&self) -> impl Iterator<Item = &EdgeId> {
        self.edges_relations.keys()
    }

    // ------------------------------------------------------------------
    // Relations
    // ------------------------------------------------------------------

    /// Returns a graph whose relation bijection also pairs `r1` with `r2`.
    ///
    /// Any existing pair touching either label is evicted first, so each
    /// label appears in at most one pair. No check is made that the labels
    /// are unused as node attributes; that collision is refused at node
    /// add/assoc time.
    pub fn add_relation(&self, r1: impl Into<Label>, r2: impl Into<Label>) -> Self {
        let r1 = r1.into();
        let r2 = r2.into();
        let mut rel = self.relations.clone();
        for r in [&r1, &r2] {
            rel = rel.dissoc_key(r).dissoc_val(r);
        }
        let mut next = self.clone();
        next.relations = rel.assoc(r1, r2);
        next
    }

    /// Removes the pair `r1 <-> r2`.
    ///
    /// Refused unless the labels are each other's opposites and no live
    /// edge uses either label.
    pub fn remove_relation(
        &self,
        r1: impl Into<Label>,
        r2: impl Into<Label>,
    ) -> Result<Self, GraphError> {
        let r1 = r1.into();
        let r2 = r2.into();
        if !self.related_in(&r1, &r2)
            || self.edges_map.has_attr(&r1)
            || self.edges_map.has_attr(&r2)
        {
            return Err(GraphError::RelationInUse(r1, r2));
        }
        let mut next = self.clone();
        next.relations = next.relations.dissoc_key(&r1).dissoc_key(&r2);
        Ok(next)
    }

    /// The opposite of `r`, if `r` is a known relation label.
    pub fn opposite(&self, r: &Label) -> Option<Label> {
        self.relations
            .get(r)
            .or_else(|| self.relations.inverse_get(r))
            .cloned()
    }

    /// True if `r1` and `r2` are each other's opposites.
    pub fn related_in(&self, r1: &Label, r2: &Label) -> bool {
        self.opposite(r1).as_ref() == Some(r2)
    }

    /// True if `r` appears on either side of the relation bijection.
    #[inline]
    pub fn has_relation(&self, r: &Label) -> bool {
        self.relations.contains_key(r) || self.relations.contains_val(r)
    }

    /// Every known relation label, both sides, in sorted order.
    pub fn relation_labels(&self) -> Vec<Label> {
        let mut labels: Vec<Label> = self
            .relations
            .iter()
            .flat_map(|(k, v)| [k.clone(), v.clone()])
            .collect();
        labels.sort();
        labels.dedup();
        labels
    }

    /// The relation pairs as unordered two-label sets, normalised to
    /// `(min, max)` and sorted.
    ///
    /// This surface deliberately loses which side a label was declared on;
    /// direction is recovered with [`Digraph::opposite`].
    pub fn relation_pairs(&self) -> Vec<(Label, Label)> {
        let mut pairs: Vec<(Label, Label)> = self
            .relations
            .iter()
            .map(|(k, v)| normalise_pair(k.clone(), v.clone()))
            .collect();
        pairs.sort();
        pairs
    }

    // ------------------------------------------------------------------
    // Constraints
    // ------------------------------------------------------------------

    /// Returns a graph whose constraint chain additionally runs `c` after
    /// every constraint already present, observing their output.
    pub fn add_constraint(&self, c: Constraint) -> Self {
        let mut next = self.clone();
        next.constraints = next.constraints.push(c);
        next
    }

    /// Returns a graph with the identity constraint.
    pub fn reset_constraints(&self) -> Self {
        let mut next = self.clone();
        next.constraints = ConstraintChain::identity();
        next
    }

    /// Number of constraints in the chain.
    #[inline]
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    // ------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------

    /// The graph's metadata bag, if any. Metadata never participates in
    /// equality or operation semantics.
    #[inline]
    pub fn meta(&self) -> Option<&Value> {
        self.meta.as_ref()
    }

    /// Returns a graph carrying `meta`, leaving semantics untouched.
    pub fn with_meta(&self, meta: Option<Value>) -> Self {
        let mut next = self.clone();
        next.meta = meta;
        next
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Checks the structural invariants.
    ///
    /// Returns true iff: node attribute records belong to live nodes and
    /// none of their keys is a relation label; every edge record carries
    /// exactly two relation-labeled keys forming the edge's recorded
    /// opposite pair, with both endpoints live nodes; and the relation
    /// bijection is symmetric.
    pub fn is_well_formed(&self) -> bool {
        // Node side.
        for id in self.nodes_map.ids() {
            if !self.nodes.contains(id) {
                return false;
            }
            let Some(attrs) = self.nodes_map.attrs(id) else {
                return false;
            };
            if attrs.keys().any(|k| self.has_relation(k)) {
                return false;
            }
        }
        // Edge side.
        for (eid, pair) in self.edges_relations.iter() {
            let Some(attrs) = self.edges_map.attrs(eid) else {
                return false;
            };
            let mut rel_keys: Vec<&Label> =
                attrs.keys().filter(|k| self.has_relation(k)).collect();
            rel_keys.sort();
            if rel_keys.len() != 2 {
                return false;
            }
            if (rel_keys[0], rel_keys[1]) != (&pair.0, &pair.1) {
                return false;
            }
            if !self.related_in(rel_keys[0], rel_keys[1]) {
                return false;
            }
            for k in rel_keys {
                match attrs.get(k).and_then(Value::as_node) {
                    Some(n) if self.nodes.contains(&n) => {}
                    _ => return false,
                }
            }
        }
        // Edge records without a relation entry are corrupt.
        if self.edges_map.len() != self.edges_relations.len() {
            return false;
        }
        // Relation symmetry.
        for (r1, r2) in self.relations.iter() {
            if self.opposite(r2).as_ref() != Some(r1) {
                return false;
            }
        }
        true
    }

    /// Cheap identity check: true if every semantic field of `other` is
    /// backed by the same structures as `self`. Used to notice constraint
    /// overrides without a semantic comparison.
    pub(crate) fn shares_structure(&self, other: &Self) -> bool {
        self.nodes.ptr_eq(&other.nodes)
            && self.nodes_map.ptr_eq(&other.nodes_map)
            && self.edges_map.ptr_eq(&other.edges_map)
            && self.edges_relations.ptr_eq(&other.edges_relations)
            && self.relations.ptr_eq(&other.relations)
    }

    /// Serialises the render surface (`{relations, nodes, edges}`) to
    /// CBOR bytes.
    ///
    /// Render-only: constraint chains and id producers are closures and do
    /// not round-trip.
    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        serde_cbor::to_vec(self)
    }
}

impl Default for Digraph {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Digraph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
            && self.nodes_map == other.nodes_map
            && self.edges_map == other.edges_map
            && self.edges_relations == other.edges_relations
            && self.relations == other.relations
    }
}

impl Eq for Digraph {}

/// Orders a label pair as `(min, max)`.
pub(crate) fn normalise_pair(a: Label, b: Label) -> (Label, Label) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

// ----------------------------------------------------------------------
// Render surface
// ----------------------------------------------------------------------

#[derive(Serialize)]
struct RenderNode {
    id: NodeId,
    attrs: BTreeMap<Label, Value>,
}

#[derive(Serialize)]
struct RenderEdge {
    id: EdgeId,
    relations: (Label, Label),
    attrs: BTreeMap<Label, Value>,
}

impl Serialize for Digraph {
    /// Renders as a three-entry record `{relations, nodes, edges}` with
    /// deterministic ordering throughout.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let nodes: Vec<RenderNode> = self
            .nodes
            .iter()
            .map(|id| RenderNode {
                id: *id,
                attrs: self
                    .nodes_map
                    .attrs(id)
                    .map(|a| a.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                    .unwrap_or_default(),
            })
            .collect();
        let edges: Vec<RenderEdge> = self
            .edges_relations
            .iter()
            .map(|(id, pair)| RenderEdge {
                id: *id,
                relations: pair.clone(),
                attrs: self
                    .edges_map
                    .attrs(id)
                    .map(|a| a.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                    .unwrap_or_default(),
            })
            .collect();
        let mut s = serializer.serialize_struct("Digraph", 3)?;
        s.serialize_field("relations", &self.relation_pairs())?;
        s.serialize_field("nodes", &nodes)?;
        s.serialize_field("edges", &edges)?;
        s.end()
    }
}
