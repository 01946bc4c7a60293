//! Engine error taxonomy.
//!
//! Everything here is fatal to the run it occurs in; there is no silent
//! partial-success mode because an undetected error directly corrupts the
//! classification count.

use thiserror::Error;

use crate::certificate::CheckFailure;
use crate::fingerprint::InvariantField;
use crate::handle::GroupIndex;
use crate::oracle::OracleError;
use crate::signature::SignatureKey;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Upstream corruption: bad lengths, out-of-range indices, a proof
    /// referencing a nonexistent group.
    #[error("input integrity: {0}")]
    InputIntegrity(String),

    /// One of the seven certificate checks failed. A single rejection
    /// invalidates the whole upper-bound claim.
    #[error("certificate for proof {proof} rejected: {failure}")]
    CertificateRejected { proof: usize, failure: CheckFailure },

    /// A recomputed fingerprint field disagrees with its recorded value.
    #[error("recorded {field} for group {index} disagrees with recomputation")]
    InvariantMismatch {
        index: GroupIndex,
        field: InvariantField,
    },

    /// Two groups share a signature key, the full cascade cannot separate
    /// them, and no supplied certificate links them. Requires an
    /// externally supplied certificate, never a guess.
    #[error("groups {a} and {b} share signature {key} but were neither distinguished nor linked")]
    NotDistinguished {
        a: GroupIndex,
        b: GroupIndex,
        key: SignatureKey,
    },

    /// The direct conjugacy test returned true for a pair presumed
    /// distinct; fatal to the completeness claim.
    #[error("groups {a} and {b} are conjugate in the ambient group but were listed as distinct")]
    ConjugacyViolation { a: GroupIndex, b: GroupIndex },

    #[error(transparent)]
    Oracle(#[from] OracleError),
}
