//! Inverse-indexed map primitives.
//!
//! Three structures, all persistent (updates share structure with their
//! predecessor) and all maintaining their inverse index inside every
//! update, so a reverse lookup is O(1) hash steps plus result size:
//!
//! - [`Bijection`]: 1-1 `K <-> V` with an inverse view.
//! - [`Surjection`]: many-one `K -> V` with an inverse `V -> Set<K>`.
//! - [`AttrMap`]: `Id -> (Label -> Value)` with a per-label reverse index,
//!   built from one [`Surjection`] per label.
//!
//! None of these raise errors; misuse (dangling ids, relation collisions)
//! is detected by the graph layer on top.
//!
//! # Citations
//! - Hash array mapped tries: Bagwell, "Ideal Hash Trees" (2001)
//! - Persistence by path copying: Driscoll, Sarnak, Sleator & Tarjan,
//!   "Making Data Structures Persistent" (1989)

pub mod attr_map;
pub mod bijection;
pub mod surjection;

pub use attr_map::AttrMap;
pub use bijection::Bijection;
pub use surjection::Surjection;
