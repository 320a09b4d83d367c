//! Galois elements for slot rotations and conjugation.
//!
//! Automorphisms τ_g: X -> X^g of R = Z[X]/(X^n + 1) exist for odd g. With
//! the CKKS slot layout, rotating the n/2 slots left by k is τ_{5^k mod 2n}
//! and complex conjugation is τ_{2n-1}. The polynomial map itself lives in
//! [`Ring::automorphism`](crate::math::Ring::automorphism).

use crate::math::ModQ;

/// Generator of the rotation subgroup of (Z/2nZ)^*.
pub const GALOIS_GEN: u64 = 5;

/// Galois element rotating slots left by `k` (negative rotates right).
pub fn galois_element_for_rotation(k: i64, n: usize) -> u64 {
    let slots = (n / 2) as i64;
    let steps = k.rem_euclid(slots) as u64;
    ModQ::pow(GALOIS_GEN, steps, 2 * n as u64)
}

/// Galois element for complex conjugation of the slots.
pub fn galois_element_for_conjugation(n: usize) -> u64 {
    2 * n as u64 - 1
}

/// `g` is an odd residue below 2n.
pub fn is_valid_galois_element(g: u64, n: usize) -> bool {
    g % 2 == 1 && g < 2 * n as u64
}

/// Multiplicative order of `g` in (Z/2nZ)^*, or `None` for an invalid element.
pub fn automorphism_order(g: u64, n: usize) -> Option<usize> {
    if !is_valid_galois_element(g, n) {
        return None;
    }
    let two_n = 2 * n as u64;
    let mut val = g;
    let mut order = 1;
    while val != 1 {
        val = ModQ::mul(val, g, two_n);
        order += 1;
        if order > 2 * n {
            return None;
        }
    }
    Some(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_elements() {
        let n = 32;
        assert_eq!(galois_element_for_rotation(0, n), 1);
        assert_eq!(galois_element_for_rotation(1, n), 5);
        assert_eq!(galois_element_for_rotation(2, n), 25);
        // 5^3 = 125 ≡ 61 (mod 64)
        assert_eq!(galois_element_for_rotation(3, n), 61);
        // rotating by the slot count is the identity
        assert_eq!(galois_element_for_rotation(16, n), 1);
        assert_eq!(
            galois_element_for_rotation(-1, n),
            galois_element_for_rotation(15, n)
        );
    }

    #[test]
    fn test_generator_order_matches_slot_count() {
        for log_n in 3..=12 {
            let n = 1usize << log_n;
            assert_eq!(automorphism_order(GALOIS_GEN, n), Some(n / 2));
            assert_eq!(automorphism_order(galois_element_for_conjugation(n), n), Some(2));
        }
    }

    #[test]
    fn test_invalid_elements() {
        assert!(!is_valid_galois_element(4, 16));
        assert!(!is_valid_galois_element(33, 16));
        assert_eq!(automorphism_order(2, 16), None);
    }
}
