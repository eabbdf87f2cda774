//! Error taxonomy for graph operations.
//!
//! Every failure is fatal to the in-progress call: validation runs before
//! the successor graph is constructed, so an `Err` never leaves behind a
//! partially-mutated value.

use thiserror::Error;

use crate::value::Label;

/// Errors raised by graph mutations, relation management, and queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A node attribute key coincides with a known relation label.
    #[error("attribute key `{0}` names a relation")]
    AttrIsRelation(Label),

    /// The number of relation-labeled keys on an edge is wrong.
    #[error("edge attributes carry {0} relation label(s), expected exactly 2")]
    EdgeRelationCount(usize),

    /// The two relation labels on a new edge are not each other's opposites.
    #[error("relation labels `{0}` and `{1}` are not opposites")]
    EdgeRelationsNotOpposite(Label, Label),

    /// An edge assoc would change the edge's relation pair.
    #[error("assoc would alter the edge's relation pair (offending label `{0}`)")]
    EdgeRelationAltered(Label),

    /// An endpoint referenced under a relation label is not a node of this
    /// graph (or is not a node reference at all).
    #[error("endpoint under `{0}` is not a node of this graph")]
    EdgeEndpointMissing(Label),

    /// An edge dissoc names a relation key.
    #[error("cannot dissociate relation key `{0}` from an edge")]
    EdgeRelationDissociation(Label),

    /// The view passed as a mutation target does not belong to the
    /// receiving graph.
    #[error("view does not belong to this graph")]
    ForeignView,

    /// A relation pair cannot be removed while edges still use it.
    #[error("relation pair `{0}`/`{1}` is still in use by edges")]
    RelationInUse(Label, Label),

    /// A relation-keyed query value is neither a node nor an edge.
    #[error("query value under relation `{0}` is neither a node nor an edge")]
    InvalidQueryValue(Label),

    /// The id producer yielded no next id.
    #[error("id producer is exhausted")]
    IdSeqExhausted,

    /// The id producer yielded an id that is already live.
    #[error("id producer yielded live id {0}")]
    IdSeqCollision(i64),
}
