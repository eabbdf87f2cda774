//! Deterministic structural fingerprints for graph values.
//!
//! A fingerprint is a SHA-256 digest over a canonical byte encoding of
//! exactly the fields that participate in graph equality: the relation
//! pairs, the node set with its attributes, and the edge records with
//! their relation pairs. Constraint chains, id sequences, and metadata are
//! excluded, so `g1 == g2` implies `fingerprint(g1) == fingerprint(g2)`.
//!
//! The encoding is domain-separated and length-prefixed so that fresh
//! builds and different platforms produce identical digests, and so that
//! adjacent fields can never alias.
//!
//! # Citations
//! - SHA-256: NIST FIPS 180-4 (2015)
//! - Domain separation & length prefixing: Bernstein et al., "How to hash
//!   into elliptic curves" (2009)

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::Digraph;
use crate::value::{Label, Value};

/// Domain separation constant for graph fingerprints (version 0).
const DOMAIN_DIGRAPH_V0: &[u8] = b"DIGRAPH_V0";

/// A 256-bit hash value.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashValue(pub [u8; 32]);

impl HashValue {
    /// The all-zero hash.
    #[inline]
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Wraps a raw byte array.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw byte array.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// SHA-256 of `data` under a domain tag, with a 64-bit little-endian
    /// length prefix.
    pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"OBV:");
        hasher.update(domain);
        hasher.update(b":v1");
        hasher.update((data.len() as u64).to_le_bytes());
        hasher.update(data);
        Self(hasher.finalize().into())
    }
}

impl std::fmt::Display for HashValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "HashValue({:02x}{:02x}{:02x}{:02x}…)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

/// Computes the structural fingerprint of a graph value.
pub fn fingerprint(g: &Digraph) -> HashValue {
    let bytes = canonical_bytes(g);
    HashValue::hash_with_domain(DOMAIN_DIGRAPH_V0, &bytes)
}

/// Canonical byte encoding of the semantic fields, fully sorted.
fn canonical_bytes(g: &Digraph) -> Vec<u8> {
    let mut out = Vec::with_capacity(1024);

    let pairs = g.relation_pairs();
    out.extend_from_slice(&(pairs.len() as u64).to_le_bytes());
    for (a, b) in &pairs {
        write_label(&mut out, a);
        write_label(&mut out, b);
    }

    out.extend_from_slice(&(g.node_count() as u64).to_le_bytes());
    for id in g.node_ids_iter() {
        out.extend_from_slice(&id.as_i64().to_le_bytes());
        write_attrs(&mut out, g.nodes_map.attrs(id).map(sorted_attrs).unwrap_or_default());
    }

    out.extend_from_slice(&(g.edge_count() as u64).to_le_bytes());
    for id in g.edge_ids_iter() {
        out.extend_from_slice(&id.as_i64().to_le_bytes());
        if let Some((a, b)) = g.edges_relations.get(id) {
            write_label(&mut out, a);
            write_label(&mut out, b);
        }
        write_attrs(&mut out, g.edges_map.attrs(id).map(sorted_attrs).unwrap_or_default());
    }

    out
}

fn sorted_attrs(attrs: &crate::value::Attrs) -> Vec<(&Label, &Value)> {
    let mut entries: Vec<(&Label, &Value)> = attrs.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

fn write_attrs(out: &mut Vec<u8>, entries: Vec<(&Label, &Value)>) {
    out.extend_from_slice(&(entries.len() as u64).to_le_bytes());
    for (k, v) in entries {
        write_label(out, k);
        write_value(out, v);
    }
}

fn write_label(out: &mut Vec<u8>, l: &Label) {
    let bytes = l.as_str().as_bytes();
    out.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    out.extend_from_slice(bytes);
}

fn write_value(out: &mut Vec<u8>, v: &Value) {
    match v {
        Value::Nil => out.push(0),
        Value::Bool(b) => {
            out.push(1);
            out.push(u8::from(*b));
        }
        Value::Int(i) => {
            out.push(2);
            out.extend_from_slice(&i.to_le_bytes());
        }
        Value::Str(s) => {
            out.push(3);
            out.extend_from_slice(&(s.len() as u64).to_le_bytes());
            out.extend_from_slice(s.as_bytes());
        }
        Value::Node(id) => {
            out.push(4);
            out.extend_from_slice(&id.as_i64().to_le_bytes());
        }
        Value::Edge(id) => {
            out.push(5);
            out.extend_from_slice(&id.as_i64().to_le_bytes());
        }
        Value::List(vs) => {
            out.push(6);
            out.extend_from_slice(&(vs.len() as u64).to_le_bytes());
            for v in vs {
                write_value(out, v);
            }
        }
    }
}
