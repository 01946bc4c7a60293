//! Invariant fingerprints.
//!
//! A [`Fingerprint`] records every algebraic invariant the engine ever
//! compares, with `order` required and everything else optional so that a
//! thinned audit record is the same type as a full one. The
//! [`FingerprintBuilder`] computes fields through the oracle, calling each
//! underlying primitive at most once: one conjugacy-class pass feeds five
//! fields, one derived-series pass feeds three.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::handle::GroupHandle;
use crate::oracle::{AlgebraOracle, OracleError};

/// Derived length, or the non-solvable sentinel as a typed case.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Solvability {
    Solvable { derived_length: u32 },
    NonSolvable,
}

/// Nilpotency class, or the non-nilpotent sentinel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Nilpotency {
    Nilpotent { class: u32 },
    NonNilpotent,
}

/// The invariant fields the cascade can walk, in no particular order here;
/// ordering lives in [`CascadeConfig`](crate::config::CascadeConfig).
///
/// `DirectIsomorphismTest` is not a record field; it names the cascade's
/// final, most expensive rung.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum InvariantField {
    DerivedSize,
    ClassCount,
    DerivedLength,
    AbelianInvariants,
    Exponent,
    ElementOrderHistogram,
    CenterSize,
    FrattiniSize,
    NilpotencyClass,
    NormalSubgroupCount,
    DerivedSeriesSizes,
    ClassSizes,
    AutGroupOrder,
    SubgroupProfile,
    DirectIsomorphismTest,
}

impl InvariantField {
    /// Every record-backed field, cheapest group first. Used when a full
    /// fingerprint is requested.
    pub const RECORD_FIELDS: [InvariantField; 14] = [
        InvariantField::DerivedSize,
        InvariantField::ClassCount,
        InvariantField::DerivedLength,
        InvariantField::AbelianInvariants,
        InvariantField::Exponent,
        InvariantField::ElementOrderHistogram,
        InvariantField::CenterSize,
        InvariantField::FrattiniSize,
        InvariantField::NilpotencyClass,
        InvariantField::NormalSubgroupCount,
        InvariantField::DerivedSeriesSizes,
        InvariantField::ClassSizes,
        InvariantField::AutGroupOrder,
        InvariantField::SubgroupProfile,
    ];
}

impl std::fmt::Display for InvariantField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::DerivedSize => "derived_size",
            Self::ClassCount => "class_count",
            Self::DerivedLength => "derived_length",
            Self::AbelianInvariants => "abelian_invariants",
            Self::Exponent => "exponent",
            Self::ElementOrderHistogram => "element_order_histogram",
            Self::CenterSize => "center_size",
            Self::FrattiniSize => "frattini_size",
            Self::NilpotencyClass => "nilpotency_class",
            Self::NormalSubgroupCount => "normal_subgroup_count",
            Self::DerivedSeriesSizes => "derived_series_sizes",
            Self::ClassSizes => "class_sizes",
            Self::AutGroupOrder => "aut_group_order",
            Self::SubgroupProfile => "subgroup_profile",
            Self::DirectIsomorphismTest => "direct_isomorphism_test",
        };
        f.write_str(name)
    }
}

/// A field value lifted into one comparable type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Int(u64),
    Seq(Vec<u64>),
    Histogram(BTreeMap<u64, u64>),
    Solvability(Solvability),
    Nilpotency(Nilpotency),
}

/// One group's recorded invariants. Created once, never mutated.
///
/// `order` is always present; an absent optional field means "not computed
/// for this record", which happens for thinned audit fingerprints and for
/// signature-only passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub order: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solvability: Option<Solvability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abelian_invariants: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exponent: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_element_order: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_size: Option<u64>,
    /// Element-order histogram weighted by class size: maps an element
    /// order to the number of elements of that order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_order_histogram: Option<BTreeMap<u64, u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_sizes: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived_series_sizes: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nilpotency: Option<Nilpotency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal_subgroup_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frattini_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aut_group_order: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subgroup_profile: Option<Vec<u64>>,
}

impl Fingerprint {
    /// The record's value for `field`, or `None` if the field was never
    /// computed for this record (or is not record-backed).
    #[must_use]
    pub fn field(&self, field: InvariantField) -> Option<FieldValue> {
        match field {
            InvariantField::DerivedSize => self.derived_size.map(FieldValue::Int),
            InvariantField::ClassCount => self.class_count.map(FieldValue::Int),
            InvariantField::DerivedLength => self.solvability.map(FieldValue::Solvability),
            InvariantField::AbelianInvariants => {
                self.abelian_invariants.clone().map(FieldValue::Seq)
            }
            InvariantField::Exponent => self.exponent.map(FieldValue::Int),
            InvariantField::ElementOrderHistogram => {
                self.element_order_histogram.clone().map(FieldValue::Histogram)
            }
            InvariantField::CenterSize => self.center_size.map(FieldValue::Int),
            InvariantField::FrattiniSize => self.frattini_size.map(FieldValue::Int),
            InvariantField::NilpotencyClass => self.nilpotency.map(FieldValue::Nilpotency),
            InvariantField::NormalSubgroupCount => {
                self.normal_subgroup_count.map(FieldValue::Int)
            }
            InvariantField::DerivedSeriesSizes => {
                self.derived_series_sizes.clone().map(FieldValue::Seq)
            }
            InvariantField::ClassSizes => self.class_sizes.clone().map(FieldValue::Seq),
            InvariantField::AutGroupOrder => self.aut_group_order.map(FieldValue::Int),
            InvariantField::SubgroupProfile => self.subgroup_profile.clone().map(FieldValue::Seq),
            InvariantField::DirectIsomorphismTest => None,
        }
    }

    /// A thinned copy keeping `order` plus only the listed fields. Used for
    /// minimal audit fingerprints.
    #[must_use]
    pub fn retain(&self, fields: &[InvariantField]) -> Fingerprint {
        let keep = |f: InvariantField| fields.contains(&f);
        Fingerprint {
            order: self.order,
            derived_size: self.derived_size.filter(|_| keep(InvariantField::DerivedSize)),
            class_count: self.class_count.filter(|_| keep(InvariantField::ClassCount)),
            solvability: self.solvability.filter(|_| keep(InvariantField::DerivedLength)),
            abelian_invariants: self
                .abelian_invariants
                .clone()
                .filter(|_| keep(InvariantField::AbelianInvariants)),
            exponent: self.exponent.filter(|_| keep(InvariantField::Exponent)),
            max_element_order: None,
            center_size: self.center_size.filter(|_| keep(InvariantField::CenterSize)),
            element_order_histogram: self
                .element_order_histogram
                .clone()
                .filter(|_| keep(InvariantField::ElementOrderHistogram)),
            class_sizes: self
                .class_sizes
                .clone()
                .filter(|_| keep(InvariantField::ClassSizes)),
            derived_series_sizes: self
                .derived_series_sizes
                .clone()
                .filter(|_| keep(InvariantField::DerivedSeriesSizes)),
            nilpotency: self.nilpotency.filter(|_| keep(InvariantField::NilpotencyClass)),
            normal_subgroup_count: self
                .normal_subgroup_count
                .filter(|_| keep(InvariantField::NormalSubgroupCount)),
            frattini_size: self.frattini_size.filter(|_| keep(InvariantField::FrattiniSize)),
            aut_group_order: self
                .aut_group_order
                .filter(|_| keep(InvariantField::AutGroupOrder)),
            subgroup_profile: self
                .subgroup_profile
                .clone()
                .filter(|_| keep(InvariantField::SubgroupProfile)),
        }
    }

    /// Fields actually present in this record.
    #[must_use]
    pub fn present_fields(&self) -> Vec<InvariantField> {
        InvariantField::RECORD_FIELDS
            .iter()
            .copied()
            .filter(|f| self.field(*f).is_some())
            .collect()
    }
}

/// Computes fingerprints through the oracle, sharing intermediates.
///
/// The class list and derived-series sizes are fetched at most once per
/// `build` call no matter how many requested fields draw on them.
pub struct FingerprintBuilder<'a, O: AlgebraOracle> {
    oracle: &'a O,
}

impl<'a, O: AlgebraOracle> FingerprintBuilder<'a, O> {
    #[must_use]
    pub fn new(oracle: &'a O) -> Self {
        Self { oracle }
    }

    /// Fingerprint with every record-backed field populated.
    pub fn build_full(&self, g: &GroupHandle) -> Result<Fingerprint, OracleError> {
        self.build(g, &InvariantField::RECORD_FIELDS)
    }

    /// Fingerprint with only the requested fields populated (plus `order`,
    /// which is always computed).
    pub fn build(
        &self,
        g: &GroupHandle,
        fields: &[InvariantField],
    ) -> Result<Fingerprint, OracleError> {
        let mut fp = Fingerprint {
            order: self.oracle.order(g)?,
            ..Fingerprint::default()
        };

        let wants = |f: InvariantField| fields.contains(&f);

        // One conjugacy-class pass covers five fields.
        if wants(InvariantField::ClassCount)
            || wants(InvariantField::ClassSizes)
            || wants(InvariantField::ElementOrderHistogram)
            || wants(InvariantField::Exponent)
        {
            let classes = self.oracle.conjugacy_classes(g)?;
            if wants(InvariantField::ClassCount) {
                fp.class_count = Some(classes.len() as u64);
            }
            if wants(InvariantField::ClassSizes) {
                let mut sizes: Vec<u64> = classes.iter().map(|c| c.size).collect();
                sizes.sort_unstable();
                fp.class_sizes = Some(sizes);
            }
            if wants(InvariantField::ElementOrderHistogram) {
                let mut hist = BTreeMap::new();
                for c in &classes {
                    *hist.entry(c.element_order).or_insert(0) += c.size;
                }
                fp.element_order_histogram = Some(hist);
            }
            if wants(InvariantField::Exponent) {
                let mut exponent = 1u64;
                let mut max_order = 1u64;
                for c in &classes {
                    exponent = lcm(exponent, c.element_order);
                    max_order = max_order.max(c.element_order);
                }
                fp.exponent = Some(exponent);
                fp.max_element_order = Some(max_order);
            }
        }

        // One derived-series pass covers three.
        if wants(InvariantField::DerivedSize)
            || wants(InvariantField::DerivedLength)
            || wants(InvariantField::DerivedSeriesSizes)
        {
            let series = self.oracle.derived_series_sizes(g)?;
            if wants(InvariantField::DerivedSize) {
                // A length-1 series means the group is trivial or perfect;
                // either way the derived subgroup is the group itself.
                fp.derived_size = Some(series.get(1).copied().unwrap_or(fp.order));
            }
            if wants(InvariantField::DerivedLength) {
                fp.solvability = Some(if series.last() == Some(&1) {
                    Solvability::Solvable {
                        derived_length: (series.len() - 1) as u32,
                    }
                } else {
                    Solvability::NonSolvable
                });
            }
            if wants(InvariantField::DerivedSeriesSizes) {
                let mut sorted = series.clone();
                sorted.sort_unstable();
                fp.derived_series_sizes = Some(sorted);
            }
        }

        if wants(InvariantField::AbelianInvariants) {
            fp.abelian_invariants = Some(self.oracle.abelian_invariants(g)?);
        }
        if wants(InvariantField::CenterSize) {
            fp.center_size = Some(self.oracle.center_size(g)?);
        }
        if wants(InvariantField::FrattiniSize) {
            fp.frattini_size = Some(self.oracle.frattini_size(g)?);
        }
        if wants(InvariantField::NilpotencyClass) {
            fp.nilpotency = Some(match self.oracle.nilpotency_class(g)? {
                Some(class) => Nilpotency::Nilpotent { class },
                None => Nilpotency::NonNilpotent,
            });
        }
        if wants(InvariantField::NormalSubgroupCount) {
            fp.normal_subgroup_count = Some(self.oracle.normal_subgroup_count(g)?);
        }
        if wants(InvariantField::AutGroupOrder) {
            fp.aut_group_order = Some(self.oracle.aut_group_order(g)?);
        }
        if wants(InvariantField::SubgroupProfile) {
            fp.subgroup_profile = Some(self.oracle.subgroup_order_profile(g)?);
        }

        Ok(fp)
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 { a } else { gcd(b, a % b) }
}

fn lcm(a: u64, b: u64) -> u64 {
    if a == 0 || b == 0 { 0 } else { a / gcd(a, b) * b }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Fingerprint {
        Fingerprint {
            order: 12,
            derived_size: Some(3),
            class_count: Some(6),
            solvability: Some(Solvability::Solvable { derived_length: 2 }),
            abelian_invariants: Some(vec![2, 2]),
            center_size: Some(2),
            element_order_histogram: Some(BTreeMap::from([(1, 1), (2, 7), (3, 2), (6, 2)])),
            ..Fingerprint::default()
        }
    }

    #[test]
    fn field_lookup_is_typed() {
        let fp = sample();
        assert_eq!(fp.field(InvariantField::DerivedSize), Some(FieldValue::Int(3)));
        assert_eq!(
            fp.field(InvariantField::DerivedLength),
            Some(FieldValue::Solvability(Solvability::Solvable {
                derived_length: 2
            }))
        );
        assert_eq!(fp.field(InvariantField::FrattiniSize), None);
        assert_eq!(fp.field(InvariantField::DirectIsomorphismTest), None);
    }

    #[test]
    fn retain_thins_to_the_listed_fields() {
        let fp = sample();
        let thin = fp.retain(&[InvariantField::CenterSize]);
        assert_eq!(thin.order, 12);
        assert_eq!(thin.center_size, Some(2));
        assert_eq!(thin.derived_size, None);
        assert_eq!(thin.present_fields(), vec![InvariantField::CenterSize]);
    }

    #[test]
    fn solvability_orders_solvable_before_nonsolvable() {
        let s = Solvability::Solvable { derived_length: 5 };
        assert!(s < Solvability::NonSolvable);
    }

    #[test]
    fn serde_skips_absent_fields() {
        let thin = sample().retain(&[InvariantField::CenterSize]);
        let json = serde_json::to_string(&thin).unwrap();
        assert!(json.contains("center_size"));
        assert!(!json.contains("derived_size"));
    }

    #[test]
    fn lcm_of_class_orders() {
        assert_eq!(lcm(4, 6), 12);
        assert_eq!(lcm(1, 7), 7);
        assert_eq!(gcd(12, 18), 6);
    }
}
