//! Hybrid RNS gadget decomposition.
//!
//! The Q chain is cut into groups of `alpha` consecutive moduli, where
//! `alpha = |P| / gamma`. A key switching key at level `l` therefore has
//! `beta(l) = ceil((l + 1) / alpha)` components, one per group.
//!
//! The gadget element of group i is `P · (Q/Q_i) · [(Q/Q_i)^-1]_{Q_i}`. In
//! RNS form it is `P mod q_j` for every modulus q_j of the group and zero on
//! every other Q modulus and on all of P.

use std::ops::Range;

use crate::error::{MkError, Result};
use crate::math::{ModQ, RingQp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GadgetDecomposition {
    gamma: usize,
    alpha: usize,
}

impl GadgetDecomposition {
    /// Derives alpha from the P chain length and gamma.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when gamma is zero or exceeds `p_count` (alpha would
    /// be zero).
    pub fn new(p_count: usize, gamma: usize) -> Result<Self> {
        if gamma == 0 {
            return Err(MkError::InvalidConfig("gamma must be positive".into()));
        }
        let alpha = p_count / gamma;
        if alpha == 0 {
            return Err(MkError::InvalidConfig(format!(
                "gamma {gamma} leaves no P modulus per group (|P| = {p_count})"
            )));
        }
        Ok(Self { gamma, alpha })
    }

    pub fn gamma(&self) -> usize {
        self.gamma
    }

    /// Q moduli per decomposition group.
    pub fn alpha(&self) -> usize {
        self.alpha
    }

    /// Number of gadget components at `level`.
    pub fn beta(&self, level: usize) -> usize {
        (level + 1).div_ceil(self.alpha)
    }

    /// Indices of the Q moduli in group `i` at `level`.
    pub fn group(&self, i: usize, level: usize) -> Range<usize> {
        let start = i * self.alpha;
        let end = ((i + 1) * self.alpha).min(level + 1);
        start..end
    }

    /// Per-row scalars of the i-th gadget element, as (Q rows, P rows).
    pub fn scalars(&self, ring_qp: &RingQp, i: usize, level: usize) -> (Vec<u64>, Vec<u64>) {
        let q_moduli = ring_qp.ring_q().moduli();
        let p_moduli = ring_qp.ring_p().moduli();
        let group = self.group(i, level);
        let q_scalars = q_moduli
            .iter()
            .enumerate()
            .map(|(j, &q)| {
                if group.contains(&j) {
                    ModQ::product(p_moduli, q)
                } else {
                    0
                }
            })
            .collect();
        (q_scalars, vec![0; p_moduli.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_beta_for_production_chain() {
        // |Q| = 14, |P| = 2, gamma = 2
        let g = GadgetDecomposition::new(2, 2).unwrap();
        assert_eq!(g.alpha(), 1);
        assert_eq!(g.beta(13), 14);
        assert_eq!(g.beta(0), 1);
    }

    #[test]
    fn test_beta_rounds_up() {
        let g = GadgetDecomposition::new(4, 1).unwrap();
        assert_eq!(g.alpha(), 4);
        assert_eq!(g.beta(13), 4);
        assert_eq!(g.beta(3), 1);
        assert_eq!(g.beta(4), 2);
        assert_eq!(g.group(3, 13), 12..14);
    }

    #[test]
    fn test_rejects_zero_alpha() {
        assert!(matches!(
            GadgetDecomposition::new(2, 0),
            Err(MkError::InvalidConfig(_))
        ));
        assert!(matches!(
            GadgetDecomposition::new(2, 3),
            Err(MkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_scalars_cover_one_group() {
        let q = [0xfffffffff6a0001, 0x3fffffffd60001, 0x3fffffffca0001];
        let p = [0x7ffffffffe70001, 0x7ffffffffe10001];
        let ring_qp = RingQp::new(16, &q, &p).unwrap();
        let g = GadgetDecomposition::new(2, 2).unwrap();

        let (qs, ps) = g.scalars(&ring_qp, 1, 2);
        assert_eq!(qs[0], 0);
        assert_eq!(qs[1], ModQ::mul(p[0] % q[1], p[1] % q[1], q[1]));
        assert_eq!(qs[2], 0);
        assert!(ps.iter().all(|&x| x == 0));
    }
}
