//! Attribute records with a per-label reverse index.

use std::hash::Hash;

use super::surjection::Surjection;
use crate::value::{Attrs, Label, Value};

/// A persistent mapping `Id -> (Label -> Value)` where every label also
/// maintains a reverse index `Value -> Set<Id>`.
///
/// Conceptually one [`Surjection`] per label, all sharing the same id
/// domain, plus a materialised forward record per id so whole-record reads
/// are O(1).
///
/// # Invariants
/// - `records[id][k] == v` iff `index[k]` maps `id -> v`.
/// - No empty record is kept: an id whose last attribute is dissociated is
///   absent from `records` (and from every label's surjection domain).
/// - Equality is over `records` only; the index is a derived function of
///   the records, so equal records imply equal indices.
#[derive(Debug, Clone)]
pub struct AttrMap<I>
where
    I: Clone + Eq + Hash + Ord,
{
    records: im::HashMap<I, Attrs>,
    index: im::HashMap<Label, Surjection<I, Value>>,
}

impl<I> AttrMap<I>
where
    I: Clone + Eq + Hash + Ord,
{
    /// Creates an empty attribute map.
    pub fn new() -> Self {
        Self {
            records: im::HashMap::new(),
            index: im::HashMap::new(),
        }
    }

    /// Returns the value of attribute `k` on `id`.
    #[inline]
    pub fn get(&self, id: &I, k: &Label) -> Option<&Value> {
        self.records.get(id)?.get(k)
    }

    /// Returns the whole attribute record of `id`, if it has one.
    #[inline]
    pub fn attrs(&self, id: &I) -> Option<&Attrs> {
        self.records.get(id)
    }

    /// True if `id` has at least one attribute.
    #[inline]
    pub fn contains(&self, id: &I) -> bool {
        self.records.contains_key(id)
    }

    /// Sets attribute `k` on `id` to `v`, maintaining both indices.
    pub fn assoc(&self, id: I, k: Label, v: Value) -> Self {
        let mut next = self.clone();
        let mut record = next.records.get(&id).cloned().unwrap_or_default();
        record.insert(k.clone(), v.clone());
        next.records.insert(id.clone(), record);

        let surj = next.index.get(&k).cloned().unwrap_or_default();
        next.index.insert(k, surj.assoc(id, v));
        next
    }

    /// Sets every attribute in `attrs` on `id`.
    pub fn merge(&self, id: &I, attrs: &Attrs) -> Self {
        let mut next = self.clone();
        for (k, v) in attrs.iter() {
            next = next.assoc(id.clone(), k.clone(), v.clone());
        }
        next
    }

    /// Removes attribute `k` from `id`, maintaining both indices.
    ///
    /// A no-op if `id` has no such attribute. Drops the record entirely if
    /// it was the last attribute.
    pub fn dissoc(&self, id: &I, k: &Label) -> Self {
        let Some(record) = self.records.get(id) else {
            return self.clone();
        };
        if !record.contains_key(k) {
            return self.clone();
        }
        let mut next = self.clone();
        let mut record = record.clone();
        record.remove(k);
        if record.is_empty() {
            next.records.remove(id);
        } else {
            next.records.insert(id.clone(), record);
        }
        if let Some(surj) = next.index.get(k) {
            let surj = surj.dissoc(id);
            if surj.is_empty() {
                next.index.remove(k);
            } else {
                next.index.insert(k.clone(), surj);
            }
        }
        next
    }

    /// Removes the whole record of `id`, cleaning every label's index.
    pub fn remove_id(&self, id: &I) -> Self {
        let Some(record) = self.records.get(id) else {
            return self.clone();
        };
        let mut next = self.clone();
        for k in record.keys() {
            if let Some(surj) = next.index.get(k) {
                let surj = surj.dissoc(id);
                if surj.is_empty() {
                    next.index.remove(k);
                } else {
                    next.index.insert(k.clone(), surj);
                }
            }
        }
        next.records.remove(id);
        next
    }

    /// The ids whose attribute `k` equals `v`, in id order.
    ///
    /// O(1) hash steps plus the result size.
    pub fn keys_with(&self, k: &Label, v: &Value) -> im::OrdSet<I> {
        self.index
            .get(k)
            .and_then(|surj| surj.inverse_get(v).cloned())
            .unwrap_or_default()
    }

    /// The ids that have any value for `k`, in id order.
    pub fn keys_with_attr(&self, k: &Label) -> im::OrdSet<I> {
        self.index
            .get(k)
            .map(|surj| surj.domain())
            .unwrap_or_default()
    }

    /// True if any id carries attribute `k`.
    #[inline]
    pub fn has_attr(&self, k: &Label) -> bool {
        self.index.get(k).is_some_and(|surj| !surj.is_empty())
    }

    /// Iterates ids with at least one attribute.
    pub fn ids(&self) -> impl Iterator<Item = &I> {
        self.records.keys()
    }

    /// Number of ids with at least one attribute.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no id has attributes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Cheap identity check on the backing structures.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.records.ptr_eq(&other.records) && self.index.ptr_eq(&other.index)
    }
}

impl<I> Default for AttrMap<I>
where
    I: Clone + Eq + Hash + Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<I> PartialEq for AttrMap<I>
where
    I: Clone + Eq + Hash + Ord,
{
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records
    }
}

impl<I> Eq for AttrMap<I> where I: Clone + Eq + Hash + Ord {}
