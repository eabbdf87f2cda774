//! Ephemeral node and edge views.
//!
//! A view bundles a borrowed graph value with an element id and behaves as
//! a read-only mapping over that element's attributes. Views are allocated
//! per query (or per constraint invocation) and must not outlive the graph
//! they reference; the lifetime parameter enforces this at compile time,
//! so a view can never hold a dangling back-reference.
//!
//! A view may denote a nonexistent element: constraints receive such views
//! for the pre-state of an add and the post-state of a remove. Equality is
//! over (graph identity, id); the optional per-view metadata bag does not
//! participate.

use std::fmt;

use crate::core::Digraph;
use crate::idgen::{EdgeId, NodeId};
use crate::value::{Attrs, Label, Value};

/// A read-only handle on one node of one graph value.
#[derive(Clone)]
pub struct NodeView<'g> {
    graph: &'g Digraph,
    id: NodeId,
    meta: Option<Value>,
}

impl<'g> NodeView<'g> {
    /// The node id.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The graph this view reads from.
    #[inline]
    pub fn graph(&self) -> &'g Digraph {
        self.graph
    }

    /// True if the node exists in the referenced graph.
    #[inline]
    pub fn exists(&self) -> bool {
        self.graph.has_node(self.id)
    }

    /// Lazily looks up one attribute.
    pub fn attr(&self, k: &Label) -> Option<Value> {
        self.graph.nodes_map.get(&self.id, k).cloned()
    }

    /// The full attribute record (empty for an attribute-less or
    /// nonexistent node).
    pub fn attrs(&self) -> Attrs {
        self.graph
            .nodes_map
            .attrs(&self.id)
            .cloned()
            .unwrap_or_default()
    }

    /// The view's metadata bag, if any.
    #[inline]
    pub fn meta(&self) -> Option<&Value> {
        self.meta.as_ref()
    }

    /// Returns a view carrying `meta`. Metadata does not participate in
    /// equality.
    pub fn with_meta(mut self, meta: Option<Value>) -> Self {
        self.meta = meta;
        self
    }
}

impl PartialEq for NodeView<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.graph, other.graph) && self.id == other.id
    }
}

impl Eq for NodeView<'_> {}

impl fmt::Debug for NodeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeView")
            .field("id", &self.id)
            .field("exists", &self.exists())
            .finish()
    }
}

impl From<&NodeView<'_>> for Value {
    fn from(v: &NodeView<'_>) -> Self {
        Value::Node(v.id)
    }
}

/// A read-only handle on one edge of one graph value.
///
/// For a relation-labeled key, [`EdgeView::endpoint`] resolves the stored
/// endpoint id to a [`NodeView`] on the same graph; [`EdgeView::attr`]
/// returns the raw stored value.
#[derive(Clone)]
pub struct EdgeView<'g> {
    graph: &'g Digraph,
    id: EdgeId,
    meta: Option<Value>,
}

impl<'g> EdgeView<'g> {
    /// The edge id.
    #[inline]
    pub fn id(&self) -> EdgeId {
        self.id
    }

    /// The graph this view reads from.
    #[inline]
    pub fn graph(&self) -> &'g Digraph {
        self.graph
    }

    /// True if the edge exists in the referenced graph.
    #[inline]
    pub fn exists(&self) -> bool {
        self.graph.has_edge(self.id)
    }

    /// Lazily looks up one attribute (raw: relation keys yield the stored
    /// `Value::Node` endpoint reference).
    pub fn attr(&self, k: &Label) -> Option<Value> {
        self.graph.edges_map.get(&self.id, k).cloned()
    }

    /// Resolves the endpoint under relation label `k` to its node view.
    pub fn endpoint(&self, k: &Label) -> Option<NodeView<'g>> {
        let id = self.attr(k)?.as_node()?;
        Some(self.graph.node_view(id))
    }

    /// The edge's relation pair, as an unordered `(min, max)` pair.
    pub fn relations(&self) -> Option<(Label, Label)> {
        self.graph.edges_relations.get(&self.id).cloned()
    }

    /// The full attribute record, endpoints included.
    pub fn attrs(&self) -> Attrs {
        self.graph
            .edges_map
            .attrs(&self.id)
            .cloned()
            .unwrap_or_default()
    }

    /// The view's metadata bag, if any.
    #[inline]
    pub fn meta(&self) -> Option<&Value> {
        self.meta.as_ref()
    }

    /// Returns a view carrying `meta`. Metadata does not participate in
    /// equality.
    pub fn with_meta(mut self, meta: Option<Value>) -> Self {
        self.meta = meta;
        self
    }
}

impl PartialEq for EdgeView<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.graph, other.graph) && self.id == other.id
    }
}

impl Eq for EdgeView<'_> {}

impl fmt::Debug for EdgeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeView")
            .field("id", &self.id)
            .field("exists", &self.exists())
            .finish()
    }
}

impl From<&EdgeView<'_>> for Value {
    fn from(v: &EdgeView<'_>) -> Self {
        Value::Edge(v.id)
    }
}

impl Digraph {
    /// A view of node `id` on this graph. The node need not exist; use
    /// [`NodeView::exists`] to tell.
    pub fn node_view(&self, id: NodeId) -> NodeView<'_> {
        NodeView {
            graph: self,
            id,
            meta: None,
        }
    }

    /// A view of edge `id` on this graph. The edge need not exist; use
    /// [`EdgeView::exists`] to tell.
    pub fn edge_view(&self, id: EdgeId) -> EdgeView<'_> {
        EdgeView {
            graph: self,
            id,
            meta: None,
        }
    }
}
