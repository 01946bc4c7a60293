//! Permutations on `1..=degree`, stored 0-based internally.

use std::fmt;

use isoclass_core::oracle::OracleError;

/// A permutation of fixed degree. `images[i]` is the 0-based image of
/// point `i`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Perm {
    images: Vec<u16>,
}

impl Perm {
    #[must_use]
    pub fn identity(degree: u16) -> Self {
        Self {
            images: (0..degree).collect(),
        }
    }

    /// Build from a 1-based image list as the input files carry them. A
    /// list shorter than `degree` is padded with fixed points.
    pub fn from_one_based(list: &[u16], degree: u16, position: usize) -> Result<Self, OracleError> {
        if list.len() > degree as usize {
            return Err(OracleError::MalformedGenerator {
                position,
                degree,
                detail: format!("{} images for degree {degree}", list.len()),
            });
        }
        let mut images: Vec<u16> = Vec::with_capacity(degree as usize);
        for &v in list {
            if v == 0 || v > degree {
                return Err(OracleError::MalformedGenerator {
                    position,
                    degree,
                    detail: format!("image {v} out of range 1..={degree}"),
                });
            }
            images.push(v - 1);
        }
        for p in list.len() as u16..degree {
            images.push(p);
        }
        let mut seen = vec![false; degree as usize];
        for &v in &images {
            if seen[v as usize] {
                return Err(OracleError::MalformedGenerator {
                    position,
                    degree,
                    detail: format!("image {} repeats", v + 1),
                });
            }
            seen[v as usize] = true;
        }
        Ok(Self { images })
    }

    /// Parse cycle notation like `"(1,2)(3,4,5)"`. The empty product `"()"`
    /// and `""` both mean the identity.
    pub fn from_cycles(word: &str, degree: u16, position: usize) -> Result<Self, OracleError> {
        let mut perm = Self::identity(degree);
        let bad = || OracleError::UnparsableWord {
            word: word.to_string(),
        };
        let trimmed = word.trim();
        if trimmed.is_empty() || trimmed == "()" {
            return Ok(perm);
        }
        // Every ')' closes one cycle, so after splitting on it the final
        // piece is whatever trails the last cycle and must be blank; a
        // non-blank tail is an unterminated cycle.
        let pieces: Vec<&str> = trimmed.split(')').collect();
        let (tail, cycles) = pieces.split_last().ok_or_else(bad)?;
        if !tail.trim().is_empty() {
            return Err(bad());
        }
        for cycle in cycles {
            let cycle = cycle.trim();
            let body = cycle.strip_prefix('(').ok_or_else(bad)?;
            let points: Vec<u16> = body
                .split(',')
                .map(|t| t.trim().parse::<u16>().map_err(|_| bad()))
                .collect::<Result<_, _>>()?;
            if points.iter().any(|&p| p == 0 || p > degree) {
                return Err(OracleError::MalformedGenerator {
                    position,
                    degree,
                    detail: format!("cycle point out of range in {word:?}"),
                });
            }
            for w in 0..points.len() {
                let from = points[w] - 1;
                let to = points[(w + 1) % points.len()] - 1;
                if perm.images[from as usize] != from {
                    return Err(bad());
                }
                perm.images[from as usize] = to;
            }
        }
        // moved points must still form a permutation
        let mut seen = vec![false; degree as usize];
        for &v in &perm.images {
            if seen[v as usize] {
                return Err(bad());
            }
            seen[v as usize] = true;
        }
        Ok(perm)
    }

    #[must_use]
    pub fn degree(&self) -> u16 {
        self.images.len() as u16
    }

    /// 0-based image of a 0-based point.
    #[inline]
    #[must_use]
    pub fn image(&self, point: u16) -> u16 {
        self.images[point as usize]
    }

    /// `self * other`: apply `self` first, then `other` (left-to-right, the
    /// convention of the upstream pipeline).
    #[must_use]
    pub fn compose(&self, other: &Perm) -> Perm {
        Perm {
            images: self
                .images
                .iter()
                .map(|&v| other.images[v as usize])
                .collect(),
        }
    }

    #[must_use]
    pub fn inverse(&self) -> Perm {
        let mut images = vec![0u16; self.images.len()];
        for (i, &v) in self.images.iter().enumerate() {
            images[v as usize] = i as u16;
        }
        Perm { images }
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.images.iter().enumerate().all(|(i, &v)| i as u16 == v)
    }

    /// Multiplicative order.
    #[must_use]
    pub fn order(&self) -> u64 {
        let mut power = self.clone();
        let mut n = 1u64;
        while !power.is_identity() {
            power = power.compose(self);
            n += 1;
        }
        n
    }

    #[must_use]
    pub fn fixed_points(&self) -> u16 {
        self.images
            .iter()
            .enumerate()
            .filter(|&(i, &v)| i as u16 == v)
            .count() as u16
    }

    /// Conjugate `self` by `s`, giving `s^-1 * self * s`.
    #[must_use]
    pub fn conjugate_by(&self, s: &Perm) -> Perm {
        s.inverse().compose(self).compose(s)
    }

    /// Commutator `self^-1 * other^-1 * self * other`.
    #[must_use]
    pub fn commutator(&self, other: &Perm) -> Perm {
        self.inverse()
            .compose(&other.inverse())
            .compose(self)
            .compose(other)
    }

    /// 1-based image list, the external representation.
    #[must_use]
    pub fn to_one_based(&self) -> Vec<u16> {
        self.images.iter().map(|&v| v + 1).collect()
    }
}

impl fmt::Display for Perm {
    /// Cycle notation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_identity() {
            return f.write_str("()");
        }
        let n = self.images.len();
        let mut seen = vec![false; n];
        for start in 0..n {
            if seen[start] || self.images[start] as usize == start {
                continue;
            }
            write!(f, "({}", start + 1)?;
            seen[start] = true;
            let mut cur = self.images[start] as usize;
            while cur != start {
                write!(f, ",{}", cur + 1)?;
                seen[cur] = true;
                cur = self.images[cur] as usize;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(list: &[u16], degree: u16) -> Perm {
        Perm::from_one_based(list, degree, 0).unwrap()
    }

    #[test]
    fn short_image_lists_pad_with_fixed_points() {
        let swap = p(&[2, 1], 5);
        assert_eq!(swap.to_one_based(), vec![2, 1, 3, 4, 5]);
        assert_eq!(swap.fixed_points(), 3);
    }

    #[test]
    fn composition_is_left_to_right() {
        let a = p(&[2, 1, 3], 3); // (1,2)
        let b = p(&[1, 3, 2], 3); // (2,3)
        // 1 -a-> 2 -b-> 3
        assert_eq!(a.compose(&b).image(0), 2);
    }

    #[test]
    fn inverse_undoes_composition() {
        let c = p(&[2, 3, 4, 1], 4);
        assert!(c.compose(&c.inverse()).is_identity());
    }

    #[test]
    fn order_of_a_four_cycle_is_four() {
        assert_eq!(p(&[2, 3, 4, 1], 4).order(), 4);
        assert_eq!(Perm::identity(6).order(), 1);
    }

    #[test]
    fn cycle_notation_parses_and_prints() {
        let g = Perm::from_cycles("(1,2)(3,4,5)", 5, 0).unwrap();
        assert_eq!(g.to_one_based(), vec![2, 1, 4, 5, 3]);
        assert_eq!(g.to_string(), "(1,2)(3,4,5)");
        assert!(Perm::from_cycles("()", 4, 0).unwrap().is_identity());
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        assert!(Perm::from_one_based(&[1, 1], 2, 0).is_err());
        assert!(Perm::from_one_based(&[3], 2, 0).is_err());
        assert!(Perm::from_cycles("(1,2", 4, 0).is_err());
        assert!(Perm::from_cycles("(1,2)(3,4", 4, 0).is_err());
        assert!(Perm::from_cycles("(1,2)x", 4, 0).is_err());
        assert!(Perm::from_cycles(")(1,2)", 4, 0).is_err());
        assert!(Perm::from_cycles("(1,1)", 4, 0).is_err());
    }

    #[test]
    fn conjugation_preserves_cycle_type() {
        let g = Perm::from_cycles("(1,2,3)", 4, 0).unwrap();
        let s = Perm::from_cycles("(1,4)", 4, 0).unwrap();
        let c = g.conjugate_by(&s);
        assert_eq!(c.order(), 3);
        assert_eq!(c.fixed_points(), 1);
    }
}
