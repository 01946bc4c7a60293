//! Reference [`AlgebraOracle`] implementation for small permutation
//! groups.
//!
//! Everything enumerates elements and is capped accordingly; this crate
//! exists to make the engine runnable and testable end to end, not to
//! compete with a computer-algebra system. The engine talks only to the
//! trait and works unchanged against a stronger oracle.
//!
//! [`AlgebraOracle`]: isoclass_core::AlgebraOracle

pub mod catalog;
pub mod group;
pub mod iso;
pub mod naive;
pub mod perm;
pub mod subgroups;

pub use group::PermGroup;
pub use naive::{DEFAULT_CACHE_CAP, DEFAULT_ELEMENT_CAP, NaiveOracle};
pub use perm::Perm;
