//! The algebra-oracle seam.
//!
//! Every primitive algebraic operation the engine needs is behind the
//! [`AlgebraOracle`] trait: derived series, conjugacy classes, canonical
//! small-order identifiers, direct isomorphism and conjugacy tests. The
//! engine owns orchestration only and never assumes a particular oracle
//! implementation; `isoclass-oracle` provides a reference one for small
//! permutation groups.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::handle::GroupHandle;

/// One conjugacy class of a group, as the engine consumes it.
///
/// `fixed_points` is the number of ambient points fixed by the class
/// representative; it is a class invariant because conjugate permutations
/// have the same cycle type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub element_order: u64,
    pub fixed_points: u16,
    pub size: u64,
}

/// One indecomposable direct factor: its order, a structural label used for
/// canonical sorting, and generators as permutations of the parent's ambient
/// point set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorInfo {
    pub order: u64,
    pub label: String,
    pub generators: Vec<Vec<u16>>,
}

/// A generator-to-image correspondence between two groups.
///
/// Entry `i` of `images` is the proposed image of entry `i` of
/// `generators`. The map is a *claim*; nothing here is trusted until the
/// certificate verifier has run all seven checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneratorMap {
    pub generators: Vec<Vec<u16>>,
    pub images: Vec<Vec<u16>>,
}

impl GeneratorMap {
    #[must_use]
    pub fn new(generators: Vec<Vec<u16>>, images: Vec<Vec<u16>>) -> Self {
        Self { generators, images }
    }

    /// True when the two sides pair up one-to-one.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.generators.len() == self.images.len()
    }
}

/// Canonical identifier for a group of catalog-covered order.
///
/// Two groups whose orders lie in the catalog range are isomorphic iff
/// their identifiers are equal; this is authoritative and needs no
/// further testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CanonicalId {
    pub order: u64,
    pub id: u32,
}

impl std::fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}]", self.order, self.id)
    }
}

/// Result of a canonical-identifier lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogAnswer {
    Id(CanonicalId),
    /// The order is outside the oracle's catalog; the caller must fall
    /// through to the invariant cascade.
    NotApplicable,
}

/// Result of a direct isomorphism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IsoAnswer {
    /// A witness correspondence. It is still re-verified through the
    /// certificate path before any merge.
    Isomorphic(GeneratorMap),
    NonIsomorphic,
}

/// Result of extending a generator map to a homomorphism.
///
/// The extension runs from the subgroup generated by the map's left side
/// to the subgroup generated by its right side. `kernel_size == 1` means
/// injective; `image_size` is the order of the generated image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomExtension {
    NotWellDefined,
    WellDefined { kernel_size: u64, image_size: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("generator {position} is not a permutation of degree {degree}: {detail}")]
    MalformedGenerator {
        position: usize,
        degree: u16,
        detail: String,
    },
    #[error("cannot parse generator word {word:?}")]
    UnparsableWord { word: String },
    #[error("group closure exceeded the oracle's element cap of {cap}")]
    GroupTooLarge { cap: usize },
    #[error("{op} unsupported for this group: {detail}")]
    Unsupported { op: &'static str, detail: String },
    #[error("ambient degrees differ: {left} vs {right}")]
    AmbientMismatch { left: u16, right: u16 },
}

/// The primitive operations the engine is built on.
///
/// All operations are pure functions of the handles' stored generators, so
/// implementations are free to cache and evict internal representations at
/// will. Single-group invariants here mirror the fingerprint fields; the
/// pairwise operations back the certificate verifier, the cascade's final
/// rung, and the conjugacy check.
pub trait AlgebraOracle {
    fn order(&self, g: &GroupHandle) -> Result<u64, OracleError>;

    /// Sizes along the derived series, starting at `|G|` and ending at 1
    /// for solvable groups, or at the perfect core's size otherwise.
    fn derived_series_sizes(&self, g: &GroupHandle) -> Result<Vec<u64>, OracleError>;

    fn conjugacy_classes(&self, g: &GroupHandle) -> Result<Vec<ClassInfo>, OracleError>;

    /// Abelian invariants of `G / [G, G]`, sorted ascending, in
    /// prime-power form.
    fn abelian_invariants(&self, g: &GroupHandle) -> Result<Vec<u64>, OracleError>;

    fn center_size(&self, g: &GroupHandle) -> Result<u64, OracleError>;

    fn frattini_size(&self, g: &GroupHandle) -> Result<u64, OracleError>;

    fn normal_subgroup_count(&self, g: &GroupHandle) -> Result<u64, OracleError>;

    /// Sorted multiset of orders over all subgroups, with multiplicity.
    fn subgroup_order_profile(&self, g: &GroupHandle) -> Result<Vec<u64>, OracleError>;

    fn aut_group_order(&self, g: &GroupHandle) -> Result<u64, OracleError>;

    /// `None` for non-nilpotent groups.
    fn nilpotency_class(&self, g: &GroupHandle) -> Result<Option<u32>, OracleError>;

    /// Direct-factor decomposition, canonically sorted; `None` when the
    /// group is indecomposable.
    fn direct_factors(&self, g: &GroupHandle) -> Result<Option<Vec<FactorInfo>>, OracleError>;

    /// Canonical small-order identifier, or `NotApplicable` when the
    /// group's order is outside this oracle's catalog.
    fn canonical_id(&self, g: &GroupHandle) -> Result<CatalogAnswer, OracleError>;

    /// Membership test for a permutation of the handle's ambient degree.
    fn contains(&self, g: &GroupHandle, perm: &[u16]) -> Result<bool, OracleError>;

    /// Order of the subgroup of `g`'s ambient symmetric group generated by
    /// `gens`.
    fn generated_order(&self, g: &GroupHandle, gens: &[Vec<u16>]) -> Result<u64, OracleError>;

    /// Try to extend `map` to a homomorphism from the subgroup generated by
    /// its left side to the one generated by its right side.
    fn extend_homomorphism(
        &self,
        source: &GroupHandle,
        target: &GroupHandle,
        map: &GeneratorMap,
    ) -> Result<HomExtension, OracleError>;

    /// Full isomorphism test. The expensive last resort of the cascade.
    fn isomorphism(&self, a: &GroupHandle, b: &GroupHandle) -> Result<IsoAnswer, OracleError>;

    /// Are `a` and `b` conjugate inside the symmetric group on their shared
    /// ambient point set?
    fn conjugate_in_ambient(&self, a: &GroupHandle, b: &GroupHandle) -> Result<bool, OracleError>;

    /// Multiset of `(orbit length, induced group order key)` pairs for the
    /// group's action on its ambient point set, sorted ascending. Fixed
    /// points appear as `(1, 1)` entries.
    fn orbit_types(&self, g: &GroupHandle) -> Result<Vec<(u16, u32)>, OracleError>;
}
