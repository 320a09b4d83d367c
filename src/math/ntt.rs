//! Number-Theoretic Transform over an RNS modulus chain.
//!
//! Implements Cooley-Tukey radix-2 NTT for negacyclic convolution over
//! R_q = Z_q[X]/(X^n + 1), once per modulus of the chain. Each modulus keeps its
//! own twiddle tables and Montgomery constants, so a polynomial stored row by
//! row (one row per modulus) is transformed one row at a time.
//!
//! # Requirements
//!
//! Every modulus q must satisfy q ≡ 1 (mod 2n) for a primitive 2n-th root of
//! unity to exist, and must stay below 2^62 so lazy additions do not overflow.
//!
//! # Example
//!
//! ```
//! use mkckks::math::ntt::NttContext;
//!
//! let ctx = NttContext::with_moduli(16, &[0x3fffffffd60001]).unwrap();
//! let mut row: Vec<u64> = (0..16).collect();
//! ctx.forward_row(&mut row, 0);
//! ctx.inverse_row(&mut row, 0);
//! assert_eq!(row[3], 3);
//! ```

use crate::error::{MkError, Result};

/// Largest modulus bit size accepted by the Montgomery routines.
pub const MAX_MODULUS_BITS: u32 = 62;

/// Precomputed NTT tables for one ring degree and a chain of moduli.
#[derive(Clone)]
pub struct NttContext {
    n: usize,
    moduli: Vec<u64>,
    /// -q^(-1) mod 2^64, per modulus.
    q_inv_neg: Vec<u64>,
    /// 2^128 mod q, per modulus.
    r_squared: Vec<u64>,
    /// Forward twiddles in bit-reversed order (powers of ψ, Montgomery form).
    psi_powers: Vec<Vec<u64>>,
    /// Inverse twiddles in bit-reversed order (powers of ψ^(-1), Montgomery form).
    psi_inv_powers: Vec<Vec<u64>>,
    /// n^(-1) mod q in Montgomery form.
    n_inv: Vec<u64>,
}

impl std::fmt::Debug for NttContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NttContext")
            .field("n", &self.n)
            .field("moduli", &self.moduli)
            .finish()
    }
}

impl NttContext {
    /// Builds the tables for degree `n` and every modulus in `moduli`.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if `n` is not a power of two, the chain is empty, or a
    /// modulus is not an NTT-friendly prime of at most [`MAX_MODULUS_BITS`] bits.
    pub fn with_moduli(n: usize, moduli: &[u64]) -> Result<Self> {
        if n < 2 || !n.is_power_of_two() {
            return Err(MkError::InvalidConfig(format!(
                "ring degree {n} is not a power of two"
            )));
        }
        if moduli.is_empty() {
            return Err(MkError::InvalidConfig("empty modulus chain".into()));
        }

        let mut ctx = Self {
            n,
            moduli: moduli.to_vec(),
            q_inv_neg: Vec::with_capacity(moduli.len()),
            r_squared: Vec::with_capacity(moduli.len()),
            psi_powers: Vec::with_capacity(moduli.len()),
            psi_inv_powers: Vec::with_capacity(moduli.len()),
            n_inv: Vec::with_capacity(moduli.len()),
        };

        let two_n = 2 * n as u64;
        for &q in moduli {
            if q < 3 || 64 - q.leading_zeros() > MAX_MODULUS_BITS || q % two_n != 1 {
                return Err(MkError::InvalidConfig(format!(
                    "modulus {q:#x} is not ≡ 1 (mod {two_n}) or exceeds {MAX_MODULUS_BITS} bits"
                )));
            }

            let q_inv = compute_q_inv_neg(q);
            let r2 = compute_r_squared(q);

            let psi = find_primitive_root(two_n, q).ok_or_else(|| {
                MkError::InvalidConfig(format!("no primitive {two_n}-th root of unity mod {q:#x}"))
            })?;
            let psi_mont = to_montgomery(psi, q, r2, q_inv);
            let psi_inv = mod_pow(psi, q - 2, q);
            let psi_inv_mont = to_montgomery(psi_inv, q, r2, q_inv);
            let n_inv = mod_pow(n as u64, q - 2, q);

            ctx.psi_powers
                .push(compute_twiddle_factors(n, psi_mont, q, q_inv, r2));
            ctx.psi_inv_powers
                .push(compute_twiddle_factors(n, psi_inv_mont, q, q_inv, r2));
            ctx.n_inv.push(to_montgomery(n_inv, q, r2, q_inv));
            ctx.q_inv_neg.push(q_inv);
            ctx.r_squared.push(r2);
        }

        Ok(ctx)
    }

    /// Returns the ring dimension.
    pub fn dimension(&self) -> usize {
        self.n
    }

    /// Returns the moduli of the chain.
    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    /// Number of moduli in the chain.
    pub fn crt_count(&self) -> usize {
        self.moduli.len()
    }

    /// Forward NTT of one row reduced modulo `moduli[idx]`.
    ///
    /// The row is first lifted into Montgomery form, so the output is the NTT
    /// image in Montgomery representation.
    pub fn forward_row(&self, row: &mut [u64], idx: usize) {
        assert_eq!(row.len(), self.n, "row length must match dimension");
        let (q, r2, qinv) = (self.moduli[idx], self.r_squared[idx], self.q_inv_neg[idx]);
        for c in row.iter_mut() {
            *c = to_montgomery(*c, q, r2, qinv);
        }
        self.forward_inplace_at(row, idx);
    }

    fn forward_inplace_at(&self, coeffs: &mut [u64], idx: usize) {
        let n = self.n;
        let q = self.moduli[idx];
        let psi_powers = &self.psi_powers[idx];

        let mut t = n;
        let mut m = 1;

        while m < n {
            t >>= 1;
            for i in 0..m {
                let j1 = 2 * i * t;
                let j2 = j1 + t;
                let w = psi_powers[m + i];

                for j in j1..j2 {
                    let u = coeffs[j];
                    let v = self.montgomery_mul_at(coeffs[j + t], w, idx);

                    coeffs[j] = if u + v >= q { u + v - q } else { u + v };
                    coeffs[j + t] = if u >= v { u - v } else { q - v + u };
                }
            }
            m <<= 1;
        }
    }

    /// Inverse NTT of one row, leaving standard (non-Montgomery) coefficients.
    pub fn inverse_row(&self, row: &mut [u64], idx: usize) {
        assert_eq!(row.len(), self.n, "row length must match dimension");
        self.inverse_inplace_at(row, idx);
        for c in row.iter_mut() {
            *c = self.montgomery_mul_at(*c, 1, idx);
        }
    }

    fn inverse_inplace_at(&self, coeffs: &mut [u64], idx: usize) {
        let n = self.n;
        let q = self.moduli[idx];
        let psi_inv_powers = &self.psi_inv_powers[idx];

        let mut t = 1;
        let mut m = n;

        while m > 1 {
            m >>= 1;
            for i in 0..m {
                let j2 = i * 2 * t;
                let w = psi_inv_powers[m + i];

                for j in j2..(j2 + t) {
                    let u = coeffs[j];
                    let v = coeffs[j + t];

                    coeffs[j] = if u + v >= q { u + v - q } else { u + v };
                    let diff = if u >= v { u - v } else { q - v + u };
                    coeffs[j + t] = self.montgomery_mul_at(diff, w, idx);
                }
            }
            t <<= 1;
        }

        for c in coeffs.iter_mut() {
            *c = self.montgomery_mul_at(*c, self.n_inv[idx], idx);
        }
    }

    /// Pointwise Montgomery product of two NTT rows.
    pub fn pointwise_mul_row(&self, a: &[u64], b: &[u64], out: &mut [u64], idx: usize) {
        assert!(
            a.len() == self.n && b.len() == self.n && out.len() == self.n,
            "row length must match dimension"
        );
        for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
            *o = self.montgomery_mul_at(x, y, idx);
        }
    }

    /// Converts a reduced value to Montgomery form modulo `moduli[idx]`.
    #[inline]
    pub fn to_mont_at(&self, a: u64, idx: usize) -> u64 {
        to_montgomery(a, self.moduli[idx], self.r_squared[idx], self.q_inv_neg[idx])
    }

    /// Converts a Montgomery-form value back to standard form modulo `moduli[idx]`.
    #[inline]
    pub fn from_mont_at(&self, a: u64, idx: usize) -> u64 {
        self.montgomery_mul_at(a, 1, idx)
    }

    #[inline]
    fn montgomery_mul_at(&self, a: u64, b: u64, idx: usize) -> u64 {
        montgomery_reduce(
            (a as u128) * (b as u128),
            self.moduli[idx],
            self.q_inv_neg[idx],
        )
    }
}

#[inline]
fn montgomery_reduce(ab: u128, q: u64, q_inv_neg: u64) -> u64 {
    let m = ((ab as u64).wrapping_mul(q_inv_neg)) as u128;
    let t = ((ab + m * (q as u128)) >> 64) as u64;
    if t >= q {
        t - q
    } else {
        t
    }
}

fn to_montgomery(a: u64, q: u64, r_squared: u64, q_inv_neg: u64) -> u64 {
    montgomery_reduce((a as u128) * (r_squared as u128), q, q_inv_neg)
}

fn compute_q_inv_neg(q: u64) -> u64 {
    let mut y: u64 = 1;
    for i in 1..64 {
        let yi = y.wrapping_mul(q) & (1u64 << i);
        y |= yi;
    }
    y.wrapping_neg()
}

fn compute_r_squared(q: u64) -> u64 {
    let r_mod_q = (1u128 << 64) % (q as u128);
    ((r_mod_q * r_mod_q) % (q as u128)) as u64
}

pub(crate) fn mod_pow(mut base: u64, mut exp: u64, m: u64) -> u64 {
    let mut result = 1u64;
    base %= m;
    while exp > 0 {
        if exp & 1 == 1 {
            result = ((result as u128 * base as u128) % m as u128) as u64;
        }
        exp >>= 1;
        base = ((base as u128 * base as u128) % m as u128) as u64;
    }
    result
}

/// Primitive `order`-th root of unity modulo prime `q`, if one exists.
fn find_primitive_root(order: u64, q: u64) -> Option<u64> {
    let exp = (q - 1) / order;
    (2..q.min(1 << 20)).map(|g| mod_pow(g, exp, q)).find(|&candidate| {
        mod_pow(candidate, order, q) == 1 && mod_pow(candidate, order / 2, q) != 1
    })
}

/// Twiddles in bit-reversed order; entry `m` holds ψ^bitrev(m).
fn compute_twiddle_factors(
    n: usize,
    psi: u64,
    q: u64,
    q_inv_neg: u64,
    r_squared: u64,
) -> Vec<u64> {
    let mut factors = vec![0u64; n];
    let one = to_montgomery(1, q, r_squared, q_inv_neg);
    factors[1] = one;

    for m in 1..n {
        if m.is_power_of_two() {
            // ψ^(n/(2m))
            let mut pow = one;
            for _ in 0..n / (2 * m) {
                pow = montgomery_reduce((pow as u128) * (psi as u128), q, q_inv_neg);
            }
            factors[m] = pow;
        } else {
            let prev_idx = m & (m - 1);
            let step_idx = m & (!m + 1);
            factors[m] = montgomery_reduce(
                (factors[prev_idx] as u128) * (factors[step_idx] as u128),
                q,
                q_inv_neg,
            );
        }
    }

    factors
}
