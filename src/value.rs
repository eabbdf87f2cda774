//! Labels and attribute values.
//!
//! A `Label` names either a user attribute or a relation; the two share one
//! namespace, and the graph layer enforces their disjointness on nodes.
//! A `Value` is the payload stored under a label.
//!
//! # Hashing contract
//!
//! Attribute values double as reverse-index keys (`Value -> Set<Id>`), so the
//! value universe is a closed enum with total `Eq`, `Hash`, and `Ord`.
//! Floating-point payloads are deliberately excluded: IEEE 754 equality is
//! not an equivalence relation and would corrupt the index.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::idgen::{EdgeId, NodeId};

/// An attribute key or relation label.
///
/// Backed by `Arc<str>` so that cloning a label while threading it through
/// persistent maps is a reference-count bump, not an allocation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(Arc<str>);

impl Label {
    /// Creates a label from anything string-shaped.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Returns the label text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Self(Arc::from(s.as_str()))
    }
}

impl From<&Label> for Label {
    fn from(l: &Label) -> Self {
        l.clone()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

/// An attribute value.
///
/// `Node` and `Edge` variants reference graph elements; they are what a
/// relation-labeled key on an edge record stores (the endpoint), and what a
/// relation-keyed query accepts (the element to traverse from). `List` is
/// how plural operations and queries express "several alternatives".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
    /// The absent value; matches nothing in queries.
    Nil,
    Bool(bool),
    Int(i64),
    Str(Arc<str>),
    /// Reference to a node by id.
    Node(NodeId),
    /// Reference to an edge by id.
    Edge(EdgeId),
    /// An ordered sequence of values.
    List(Vec<Value>),
}

impl Value {
    /// Returns the node id if this value references a node.
    #[inline]
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Value::Node(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the edge id if this value references an edge.
    #[inline]
    pub fn as_edge(&self) -> Option<EdgeId> {
        match self {
            Value::Edge(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns true for the `Nil` value.
    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Splits a value into query alternatives: a `List` contributes each of
    /// its elements, anything else contributes itself.
    pub(crate) fn alternatives(&self) -> &[Value] {
        match self {
            Value::List(vs) => vs.as_slice(),
            other => std::slice::from_ref(other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Node(id) => write!(f, "{}", id),
            Value::Edge(id) => write!(f, "{}", id),
            Value::List(vs) => {
                write!(f, "[")?;
                for (i, v) in vs.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s.as_str()))
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Value::Node(id)
    }
}

impl From<EdgeId> for Value {
    fn from(id: EdgeId) -> Self {
        Value::Edge(id)
    }
}

impl From<Vec<Value>> for Value {
    fn from(vs: Vec<Value>) -> Self {
        Value::List(vs)
    }
}

/// An attribute record: label to value.
///
/// Also the shape of a query (see `crate::query`): there a `List` value
/// means "any of these".
pub type Attrs = im::HashMap<Label, Value>;

/// Literal builder for [`Attrs`].
///
/// ```
/// use obverse::attrs;
/// let a = attrs! { "name" => "a", "size" => 3 };
/// assert_eq!(a.len(), 2);
/// ```
#[macro_export]
macro_rules! attrs {
    () => { $crate::value::Attrs::new() };
    ($($k:expr => $v:expr),+ $(,)?) => {{
        let mut m = $crate::value::Attrs::new();
        $( m.insert($crate::value::Label::from($k), $crate::value::Value::from($v)); )+
        m
    }};
}
