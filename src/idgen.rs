//! Element identifiers and the id sequences that produce them.
//!
//! Every graph value carries two [`IdSeq`]s, one for nodes and one for
//! edges. A sequence is a pull-based producer (an indexed function, so the
//! consumed prefix is just a cursor that old graph values keep for
//! themselves) plus a push-back stack of ids reclaimed by removals. The
//! stack is consulted before the producer, so the next add after a removal
//! reuses the removed element's id on that lineage.
//!
//! Producers must be infinite and non-repeating; that is a caller contract.
//! Violations are detected at the consuming call site: a producer that
//! yields nothing is reported as exhausted, and a produced id colliding
//! with a live element is reported as a collision. Neither check is
//! performed lazily.
//!
//! # Citations
//! - Free-list reuse of dense identifiers: Knuth, "The Art of Computer
//!   Programming", Vol. 1, Section 2.2.3 (1968)
//! - Persistent sequence state: Okasaki, "Purely Functional Data
//!   Structures", Chapter 2 (1999)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Unique identifier for a node.
///
/// Opaque and totally ordered. The default producer yields even integers
/// (0, 2, 4, ...); callers may supply any non-repeating producer.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(i64);

impl NodeId {
    /// Creates a `NodeId` from a raw integer.
    #[inline]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw integer representation.
    #[inline]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Unique identifier for an edge.
///
/// The default producer yields odd integers (1, 3, 5, ...), disjoint from
/// the default node ids.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(i64);

impl EdgeId {
    /// Creates an `EdgeId` from a raw integer.
    #[inline]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw integer representation.
    #[inline]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

/// Indexed id producer: maps a cursor position to the id at that position,
/// or `None` if the sequence has run dry (a contract violation surfaced to
/// the caller as an exhaustion error).
pub type Producer = Arc<dyn Fn(u64) -> Option<i64> + Send + Sync>;

/// A pull-based id sequence with a push-back stack for reclaimed ids.
///
/// `IdSeq` is a value: consuming the head returns a new sequence, leaving
/// the original untouched, so every graph value owns its own sequence
/// state while sharing the producer itself.
#[derive(Clone)]
pub struct IdSeq {
    producer: Producer,
    cursor: u64,
    reclaimed: im::Vector<i64>,
}

impl IdSeq {
    /// Sequence of even integers 0, 2, 4, ... (default for nodes).
    pub fn evens() -> Self {
        Self::from_producer(Arc::new(|n| (n as i64).checked_mul(2)))
    }

    /// Sequence of odd integers 1, 3, 5, ... (default for edges).
    pub fn odds() -> Self {
        Self::from_producer(Arc::new(|n| (n as i64).checked_mul(2).map(|m| m + 1)))
    }

    /// Wraps a caller-supplied producer.
    ///
    /// The producer must be non-repeating over its whole domain; the graph
    /// layer refuses produced ids that collide with live elements.
    pub fn from_producer(producer: Producer) -> Self {
        Self {
            producer,
            cursor: 0,
            reclaimed: im::Vector::new(),
        }
    }

    /// Returns the next id without consuming it, or `None` if the producer
    /// is exhausted.
    pub fn peek(&self) -> Option<i64> {
        match self.reclaimed.front() {
            Some(id) => Some(*id),
            None => (self.producer)(self.cursor),
        }
    }

    /// Returns a sequence with the head consumed.
    ///
    /// Meaningful only after a successful [`IdSeq::peek`]; advancing an
    /// exhausted sequence is a no-op on the producer side.
    pub fn advance(&self) -> Self {
        let mut next = self.clone();
        if next.reclaimed.pop_front().is_none() {
            next.cursor += 1;
        }
        next
    }

    /// Returns a sequence with `id` prepended as the new head.
    ///
    /// Used by removals: the discarded id becomes the immediate next id on
    /// this lineage. Repeated push-backs stack in LIFO order.
    pub fn push_back_id(&self, id: i64) -> Self {
        let mut next = self.clone();
        next.reclaimed.push_front(id);
        next
    }

    /// Number of ids consumed from the producer so far.
    #[inline]
    pub fn consumed(&self) -> u64 {
        self.cursor
    }
}

impl fmt::Debug for IdSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdSeq")
            .field("cursor", &self.cursor)
            .field("reclaimed", &self.reclaimed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evens_and_odds() {
        let n = IdSeq::evens();
        assert_eq!(n.peek(), Some(0));
        assert_eq!(n.advance().peek(), Some(2));
        let e = IdSeq::odds();
        assert_eq!(e.peek(), Some(1));
        assert_eq!(e.advance().peek(), Some(3));
    }

    #[test]
    fn advance_leaves_original_untouched() {
        let s = IdSeq::evens();
        let _ = s.advance().advance();
        assert_eq!(s.peek(), Some(0));
    }

    #[test]
    fn push_back_takes_priority_and_stacks() {
        let s = IdSeq::evens().advance().advance(); // consumed 0, 2
        let s = s.push_back_id(0).push_back_id(2);
        assert_eq!(s.peek(), Some(2));
        let s = s.advance();
        assert_eq!(s.peek(), Some(0));
        let s = s.advance();
        assert_eq!(s.peek(), Some(4));
    }

    #[test]
    fn exhausted_producer_peeks_none() {
        let s = IdSeq::from_producer(Arc::new(|n| if n < 1 { Some(7) } else { None }));
        assert_eq!(s.peek(), Some(7));
        assert_eq!(s.advance().peek(), None);
    }
}
