//! Certificate verification.
//!
//! Proof records are untrusted input. A claimed isomorphism between groups
//! G and H is accepted only after seven ordered checks, any failure
//! rejecting immediately at the first check that fails. Only an accepted
//! certificate may merge the disjoint-set forest.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::handle::{GroupHandle, GroupIndex};
use crate::oracle::{AlgebraOracle, GeneratorMap, HomExtension, OracleError};

/// The correspondence a proof carries: one flat generator map, or one map
/// per direct factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofMap {
    Flat(GeneratorMap),
    PerFactor(Vec<GeneratorMap>),
}

/// A claimed isomorphism between two input groups.
///
/// The map's generators are elements of `duplicate` and its images are
/// elements of `representative`; verification replays it in that
/// direction. Nothing is trusted until verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofRecord {
    pub duplicate: GroupIndex,
    pub representative: GroupIndex,
    pub map: ProofMap,
}

/// The first check a rejected certificate failed, numbered as in the
/// verifier's fixed check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckFailure {
    #[error("check 1: group orders differ ({left} vs {right})")]
    OrderMismatch { left: u64, right: u64 },
    #[error("map pairs {generators} generators with {images} images")]
    UnbalancedMap { generators: usize, images: usize },
    #[error("check 2: proposed generator {position} is not an element of the source group")]
    GeneratorNotInSource { position: usize },
    #[error("check 3: proposed image {position} is not an element of the target group")]
    ImageNotInTarget { position: usize },
    #[error("check 4: proposed generators span {generated} of {expected} elements")]
    NotGenerating { generated: u64, expected: u64 },
    #[error("check 5: correspondence does not extend to a homomorphism")]
    NotHomomorphism,
    #[error("check 6: homomorphism has kernel of size {kernel_size}")]
    NotInjective { kernel_size: u64 },
    #[error("check 7: image has order {image_size}, target has order {expected}")]
    NotSurjective { image_size: u64, expected: u64 },
    #[error("factor orders multiply to {product}, group order is {expected}")]
    FactorOrderProduct { product: u64, expected: u64 },
}

/// Outcome of verifying one proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(CheckFailure),
}

impl Verdict {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Runs the seven checks against the oracle.
pub struct CertificateVerifier<'a, O: AlgebraOracle> {
    oracle: &'a O,
}

impl<'a, O: AlgebraOracle> CertificateVerifier<'a, O> {
    #[must_use]
    pub fn new(oracle: &'a O) -> Self {
        Self { oracle }
    }

    /// Verify a proof's map between `g` (the duplicate) and `h` (the
    /// representative). Oracle failures are errors, not rejections.
    pub fn verify(
        &self,
        g: &GroupHandle,
        h: &GroupHandle,
        map: &ProofMap,
    ) -> Result<Verdict, OracleError> {
        let order_g = self.oracle.order(g)?;
        let order_h = self.oracle.order(h)?;
        // Check 1 runs before anything touches the map; a proof linking
        // groups of different order is rejected with no further work.
        if order_g != order_h {
            return Ok(Verdict::Rejected(CheckFailure::OrderMismatch {
                left: order_g,
                right: order_h,
            }));
        }
        match map {
            ProofMap::Flat(m) => self.verify_flat(g, h, m, order_g),
            ProofMap::PerFactor(maps) => self.verify_factored(g, h, maps, order_g),
        }
    }

    fn verify_flat(
        &self,
        g: &GroupHandle,
        h: &GroupHandle,
        map: &GeneratorMap,
        order: u64,
    ) -> Result<Verdict, OracleError> {
        if let Some(failure) = self.membership_checks(g, h, map)? {
            return Ok(Verdict::Rejected(failure));
        }
        // Check 4: the proposed generators must span all of G.
        let generated = self.oracle.generated_order(g, &map.generators)?;
        if generated != order {
            return Ok(Verdict::Rejected(CheckFailure::NotGenerating {
                generated,
                expected: order,
            }));
        }
        // Checks 5-7 via one homomorphism extension.
        match self.oracle.extend_homomorphism(g, h, map)? {
            HomExtension::NotWellDefined => Ok(Verdict::Rejected(CheckFailure::NotHomomorphism)),
            HomExtension::WellDefined {
                kernel_size,
                image_size,
            } => {
                if kernel_size != 1 {
                    Ok(Verdict::Rejected(CheckFailure::NotInjective { kernel_size }))
                } else if image_size != order {
                    Ok(Verdict::Rejected(CheckFailure::NotSurjective {
                        image_size,
                        expected: order,
                    }))
                } else {
                    Ok(Verdict::Accepted)
                }
            }
        }
    }

    /// Per-factor proof: every sub-correspondence must pass on its own, and
    /// the factor orders must multiply out to both group orders.
    fn verify_factored(
        &self,
        g: &GroupHandle,
        h: &GroupHandle,
        maps: &[GeneratorMap],
        order: u64,
    ) -> Result<Verdict, OracleError> {
        let mut source_product = 1u64;
        let mut image_product = 1u64;
        for map in maps {
            if let Some(failure) = self.membership_checks(g, h, map)? {
                return Ok(Verdict::Rejected(failure));
            }
            let source_order = self.oracle.generated_order(g, &map.generators)?;
            match self.oracle.extend_homomorphism(g, h, map)? {
                HomExtension::NotWellDefined => {
                    return Ok(Verdict::Rejected(CheckFailure::NotHomomorphism));
                }
                HomExtension::WellDefined {
                    kernel_size,
                    image_size,
                } => {
                    if kernel_size != 1 {
                        return Ok(Verdict::Rejected(CheckFailure::NotInjective { kernel_size }));
                    }
                    // Within a factor, injective plus equal order is
                    // surjective onto the factor's image.
                    if image_size != source_order {
                        return Ok(Verdict::Rejected(CheckFailure::NotSurjective {
                            image_size,
                            expected: source_order,
                        }));
                    }
                    source_product = source_product.saturating_mul(source_order);
                    image_product = image_product.saturating_mul(image_size);
                }
            }
        }
        if source_product != order {
            return Ok(Verdict::Rejected(CheckFailure::FactorOrderProduct {
                product: source_product,
                expected: order,
            }));
        }
        if image_product != order {
            return Ok(Verdict::Rejected(CheckFailure::FactorOrderProduct {
                product: image_product,
                expected: order,
            }));
        }
        Ok(Verdict::Accepted)
    }

    /// Checks 2 and 3 (after the balance sanity check).
    fn membership_checks(
        &self,
        g: &GroupHandle,
        h: &GroupHandle,
        map: &GeneratorMap,
    ) -> Result<Option<CheckFailure>, OracleError> {
        if !map.is_balanced() {
            return Ok(Some(CheckFailure::UnbalancedMap {
                generators: map.generators.len(),
                images: map.images.len(),
            }));
        }
        for (position, generator) in map.generators.iter().enumerate() {
            if !self.oracle.contains(g, generator)? {
                return Ok(Some(CheckFailure::GeneratorNotInSource { position }));
            }
        }
        for (position, img) in map.images.iter().enumerate() {
            if !self.oracle.contains(h, img)? {
                return Ok(Some(CheckFailure::ImageNotInTarget { position }));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::GeneratorSpec;
    use crate::oracle::{
        CatalogAnswer, ClassInfo, FactorInfo, HomExtension, IsoAnswer,
    };

    /// Answers only what the verifier's flat path asks. The extension
    /// outcome is scripted so each rejection branch can be driven directly.
    struct ScriptedOracle {
        order: u64,
        extension: HomExtension,
    }

    impl AlgebraOracle for ScriptedOracle {
        fn order(&self, _g: &GroupHandle) -> Result<u64, OracleError> {
            Ok(self.order)
        }
        fn contains(&self, _g: &GroupHandle, _perm: &[u16]) -> Result<bool, OracleError> {
            Ok(true)
        }
        fn generated_order(
            &self,
            _g: &GroupHandle,
            _gens: &[Vec<u16>],
        ) -> Result<u64, OracleError> {
            Ok(self.order)
        }
        fn extend_homomorphism(
            &self,
            _source: &GroupHandle,
            _target: &GroupHandle,
            _map: &GeneratorMap,
        ) -> Result<HomExtension, OracleError> {
            Ok(self.extension)
        }
        fn derived_series_sizes(&self, _g: &GroupHandle) -> Result<Vec<u64>, OracleError> {
            unreachable!()
        }
        fn conjugacy_classes(&self, _g: &GroupHandle) -> Result<Vec<ClassInfo>, OracleError> {
            unreachable!()
        }
        fn abelian_invariants(&self, _g: &GroupHandle) -> Result<Vec<u64>, OracleError> {
            unreachable!()
        }
        fn center_size(&self, _g: &GroupHandle) -> Result<u64, OracleError> {
            unreachable!()
        }
        fn frattini_size(&self, _g: &GroupHandle) -> Result<u64, OracleError> {
            unreachable!()
        }
        fn normal_subgroup_count(&self, _g: &GroupHandle) -> Result<u64, OracleError> {
            unreachable!()
        }
        fn subgroup_order_profile(&self, _g: &GroupHandle) -> Result<Vec<u64>, OracleError> {
            unreachable!()
        }
        fn aut_group_order(&self, _g: &GroupHandle) -> Result<u64, OracleError> {
            unreachable!()
        }
        fn nilpotency_class(&self, _g: &GroupHandle) -> Result<Option<u32>, OracleError> {
            unreachable!()
        }
        fn direct_factors(
            &self,
            _g: &GroupHandle,
        ) -> Result<Option<Vec<FactorInfo>>, OracleError> {
            unreachable!()
        }
        fn canonical_id(&self, _g: &GroupHandle) -> Result<CatalogAnswer, OracleError> {
            unreachable!()
        }
        fn isomorphism(
            &self,
            _a: &GroupHandle,
            _b: &GroupHandle,
        ) -> Result<IsoAnswer, OracleError> {
            unreachable!()
        }
        fn conjugate_in_ambient(
            &self,
            _a: &GroupHandle,
            _b: &GroupHandle,
        ) -> Result<bool, OracleError> {
            unreachable!()
        }
        fn orbit_types(&self, _g: &GroupHandle) -> Result<Vec<(u16, u32)>, OracleError> {
            unreachable!()
        }
    }

    fn handle(index: usize) -> GroupHandle {
        GroupHandle::new(index, 4, GeneratorSpec::Images(vec![vec![2, 1]]))
    }

    fn flat_map() -> ProofMap {
        ProofMap::Flat(GeneratorMap::new(vec![vec![2, 1]], vec![vec![2, 1]]))
    }

    #[test]
    fn injective_but_not_surjective_extension_fails_check_seven() {
        let oracle = ScriptedOracle {
            order: 8,
            extension: HomExtension::WellDefined {
                kernel_size: 1,
                image_size: 4,
            },
        };
        let verifier = CertificateVerifier::new(&oracle);
        let verdict = verifier.verify(&handle(0), &handle(1), &flat_map()).unwrap();
        assert_eq!(
            verdict,
            Verdict::Rejected(CheckFailure::NotSurjective {
                image_size: 4,
                expected: 8,
            })
        );
    }

    #[test]
    fn kernel_is_checked_before_the_image() {
        // A map that is neither injective nor surjective reports the
        // injectivity failure, matching the fixed check order.
        let oracle = ScriptedOracle {
            order: 8,
            extension: HomExtension::WellDefined {
                kernel_size: 2,
                image_size: 4,
            },
        };
        let verifier = CertificateVerifier::new(&oracle);
        let verdict = verifier.verify(&handle(0), &handle(1), &flat_map()).unwrap();
        assert_eq!(
            verdict,
            Verdict::Rejected(CheckFailure::NotInjective { kernel_size: 2 })
        );
    }

    #[test]
    fn check_failures_name_their_check_number() {
        let f = CheckFailure::NotGenerating {
            generated: 4,
            expected: 8,
        };
        assert!(f.to_string().starts_with("check 4"));
        let f = CheckFailure::NotSurjective {
            image_size: 4,
            expected: 8,
        };
        assert!(f.to_string().starts_with("check 7"));
    }

    #[test]
    fn proof_record_roundtrips_through_json() {
        let proof = ProofRecord {
            duplicate: GroupIndex(12),
            representative: GroupIndex(3),
            map: ProofMap::Flat(GeneratorMap::new(vec![vec![2, 1]], vec![vec![1, 3, 2]])),
        };
        let json = serde_json::to_string(&proof).unwrap();
        let back: ProofRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, proof);
    }

    #[test]
    fn verdict_accepted_predicate() {
        assert!(Verdict::Accepted.is_accepted());
        assert!(!Verdict::Rejected(CheckFailure::NotHomomorphism).is_accepted());
    }
}
