//! Classification engine for finite groups given by permutation generators.
//!
//! The engine partitions a collection of groups into isomorphism types and
//! proves the resulting count from both sides: verified certificates bound it
//! from above, invariant separation bounds it from below. The same machinery,
//! pointed at a shared ambient point set, decides whether two permutation
//! representations are conjugate inside the ambient symmetric group.
//!
//! All algebraic primitives (derived subgroups, conjugacy classes, direct
//! isomorphism tests, ...) are obtained through the [`AlgebraOracle`] seam;
//! this crate owns only the orchestration: fingerprints, buckets, the
//! disjoint-set forest, certificate verification, and the two cascades.

pub mod audit;
pub mod bucket;
pub mod cascade;
pub mod certificate;
pub mod classify;
pub mod config;
pub mod conjugacy;
pub mod dsu;
pub mod error;
pub mod factors;
pub mod fingerprint;
pub mod handle;
pub mod oracle;
pub mod shard;
pub mod signature;

pub use audit::{TypeAudit, build_audit_fingerprints, verify_audit_fingerprints};
pub use bucket::BucketIndex;
pub use cascade::{CascadeOutcome, NonIsoCascade, RecordOutcome, compare_records};
pub use certificate::{CertificateVerifier, CheckFailure, ProofMap, ProofRecord, Verdict};
pub use classify::{Classification, Classifier, MergeRecord, RunStats};
pub use config::{CascadeConfig, CatalogRange, EngineConfig};
pub use conjugacy::{ConjugacyCascade, ConjugacyStats, HistogramKey, OrbitTypeKey};
pub use dsu::{DisjointSet, MergeEvidence};
pub use error::EngineError;
pub use factors::{FactorComparison, FactorDecomposer, FactorList};
pub use fingerprint::{
    FieldValue, Fingerprint, FingerprintBuilder, InvariantField, Nilpotency, Solvability,
};
pub use handle::{GeneratorSpec, GroupHandle, GroupIndex};
pub use oracle::{
    AlgebraOracle, CanonicalId, CatalogAnswer, ClassInfo, FactorInfo, GeneratorMap, HomExtension,
    IsoAnswer, OracleError,
};
pub use signature::SignatureKey;
