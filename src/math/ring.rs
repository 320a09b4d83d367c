//! Ring contexts over an RNS modulus chain.
//!
//! A [`Ring`] owns the moduli and NTT tables for one chain and performs all
//! arithmetic on [`RnsPoly`] values. [`RingQp`] pairs the ciphertext chain Q
//! with the auxiliary key-switching chain P; [`PolyQp`] is an element split
//! across both.
//!
//! Operations work on the coefficient domain. Multiplication goes through the
//! NTT internally and returns coefficients again. Montgomery form is only a
//! storage representation (key material is kept in it), so callers convert
//! with [`Ring::inv_mform`] before computing and [`Ring::mform`] afterwards.

use std::fmt;

use rand::Rng;
use zeroize::Zeroize;

use super::modular::ModQ;
use super::ntt::NttContext;
use super::poly::RnsPoly;
use super::sampler::{uniform_vec, GaussianSampler, TernarySampler};
use crate::codec::{BinaryCodec, Reader};
use crate::error::Result;

#[derive(Clone, Debug)]
pub struct Ring {
    n: usize,
    moduli: Vec<u64>,
    ntt: NttContext,
}

impl Ring {
    pub fn new(n: usize, moduli: &[u64]) -> Result<Self> {
        let ntt = NttContext::with_moduli(n, moduli)?;
        Ok(Self {
            n,
            moduli: moduli.to_vec(),
            ntt,
        })
    }

    pub fn degree(&self) -> usize {
        self.n
    }

    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    pub fn modulus_count(&self) -> usize {
        self.moduli.len()
    }

    pub fn max_level(&self) -> usize {
        self.moduli.len() - 1
    }

    /// Zero polynomial at the top level.
    pub fn new_poly(&self) -> RnsPoly {
        self.new_poly_lvl(self.max_level())
    }

    pub fn new_poly_lvl(&self, level: usize) -> RnsPoly {
        RnsPoly::zero(self.n, level + 1)
    }

    fn check(&self, a: &RnsPoly) {
        assert_eq!(a.degree(), self.n, "polynomial degree does not match ring");
        assert!(
            a.row_count() <= self.moduli.len(),
            "polynomial level exceeds the modulus chain"
        );
    }

    fn check_pair(&self, a: &RnsPoly, b: &RnsPoly) {
        self.check(a);
        self.check(b);
        assert_eq!(a.level(), b.level(), "operands must share a level");
        assert_eq!(a.is_mform(), b.is_mform(), "operands must share Montgomery form");
        assert!(!a.is_ntt() && !b.is_ntt(), "operands must be in coefficient domain");
    }

    fn zip_rows(&self, a: &RnsPoly, b: &RnsPoly, op: impl Fn(u64, u64, u64) -> u64) -> RnsPoly {
        self.check_pair(a, b);
        let rows = a
            .rows()
            .iter()
            .zip(b.rows())
            .zip(&self.moduli)
            .map(|((ra, rb), &q)| ra.iter().zip(rb).map(|(&x, &y)| op(x, y, q)).collect())
            .collect();
        let mut out = RnsPoly::from_rows(rows);
        out.set_mform(a.is_mform());
        out
    }

    pub fn add(&self, a: &RnsPoly, b: &RnsPoly) -> RnsPoly {
        self.zip_rows(a, b, |x, y, q| {
            let s = x + y;
            if s >= q {
                s - q
            } else {
                s
            }
        })
    }

    pub fn sub(&self, a: &RnsPoly, b: &RnsPoly) -> RnsPoly {
        self.zip_rows(a, b, ModQ::sub)
    }

    pub fn neg(&self, a: &RnsPoly) -> RnsPoly {
        self.check(a);
        let rows = a
            .rows()
            .iter()
            .zip(&self.moduli)
            .map(|(r, &q)| r.iter().map(|&x| ModQ::negate(x, q)).collect())
            .collect();
        let mut out = RnsPoly::from_rows(rows);
        out.set_mform(a.is_mform());
        out
    }

    /// Negacyclic product of two standard-form polynomials.
    pub fn mul(&self, a: &RnsPoly, b: &RnsPoly) -> RnsPoly {
        self.check_pair(a, b);
        assert!(!a.is_mform(), "multiply operands must be in standard form");

        let mut out = self.new_poly_lvl(a.level());
        for idx in 0..a.row_count() {
            let mut fa = a.row(idx).to_vec();
            let mut fb = b.row(idx).to_vec();
            self.ntt.forward_row(&mut fa, idx);
            self.ntt.forward_row(&mut fb, idx);
            let row = out.row_mut(idx);
            self.ntt.pointwise_mul_row(&fa, &fb, row, idx);
            self.ntt.inverse_row(row, idx);
        }
        out
    }

    /// Multiplies row `i` by `scalars[i]`.
    pub fn mul_scalar_rows(&self, a: &RnsPoly, scalars: &[u64]) -> RnsPoly {
        self.check(a);
        assert_eq!(scalars.len(), a.row_count(), "one scalar per residue row");
        let rows = a
            .rows()
            .iter()
            .zip(scalars)
            .zip(&self.moduli)
            .map(|((r, &s), &q)| r.iter().map(|&x| ModQ::mul(x, s, q)).collect())
            .collect();
        let mut out = RnsPoly::from_rows(rows);
        out.set_mform(a.is_mform());
        out
    }

    /// Converts coefficients to Montgomery form.
    pub fn mform(&self, a: &RnsPoly) -> RnsPoly {
        self.check(a);
        assert!(!a.is_mform(), "polynomial already in Montgomery form");
        let mut out = a.clone();
        for idx in 0..out.row_count() {
            for c in out.row_mut(idx) {
                *c = self.ntt.to_mont_at(*c, idx);
            }
        }
        out.set_mform(true);
        out
    }

    /// Converts coefficients out of Montgomery form.
    pub fn inv_mform(&self, a: &RnsPoly) -> RnsPoly {
        self.check(a);
        assert!(a.is_mform(), "polynomial not in Montgomery form");
        let mut out = a.clone();
        for idx in 0..out.row_count() {
            for c in out.row_mut(idx) {
                *c = self.ntt.from_mont_at(*c, idx);
            }
        }
        out.set_mform(false);
        out
    }

    /// Lifts small signed coefficients into every row up to `level`.
    pub fn from_signed(&self, values: &[i64], level: usize) -> RnsPoly {
        assert_eq!(values.len(), self.n, "one value per coefficient");
        let rows = self.moduli[..=level]
            .iter()
            .map(|&q| values.iter().map(|&v| ModQ::from_signed(v, q)).collect())
            .collect();
        RnsPoly::from_rows(rows)
    }

    /// Whether every residue of `a` lies below the modulus of its row.
    pub fn is_reduced(&self, a: &RnsPoly) -> bool {
        a.row_count() <= self.moduli.len()
            && a
                .rows()
                .iter()
                .zip(&self.moduli)
                .all(|(row, &q)| row.iter().all(|&c| c < q))
    }

    /// Centered representative of each coefficient of row 0.
    pub fn to_signed_row0(&self, a: &RnsPoly) -> Vec<i64> {
        self.check(a);
        let q0 = self.moduli[0];
        a.row(0).iter().map(|&c| ModQ::to_signed(c, q0)).collect()
    }

    pub fn sample_uniform<R: Rng + ?Sized>(&self, rng: &mut R, level: usize) -> RnsPoly {
        let rows = self.moduli[..=level]
            .iter()
            .map(|&q| uniform_vec(self.n, q, rng))
            .collect();
        RnsPoly::from_rows(rows)
    }

    pub fn sample_gaussian<R: Rng + ?Sized>(
        &self,
        sampler: &GaussianSampler,
        rng: &mut R,
        level: usize,
    ) -> RnsPoly {
        self.from_signed(&sampler.sample_vec(self.n, rng), level)
    }

    pub fn sample_ternary<R: Rng + ?Sized>(&self, rng: &mut R, level: usize) -> RnsPoly {
        self.from_signed(&TernarySampler.sample_vec(self.n, rng), level)
    }

    /// X -> X^g on a coefficient-domain polynomial, for odd `g`.
    pub fn automorphism(&self, a: &RnsPoly, g: u64) -> RnsPoly {
        self.check(a);
        assert!(!a.is_ntt(), "automorphism expects coefficient domain");
        assert!(g % 2 == 1, "Galois element must be odd");

        let n = self.n;
        let two_n = 2 * n as u64;
        let mut out = self.new_poly_lvl(a.level());
        for idx in 0..a.row_count() {
            let q = self.moduli[idx];
            let src = a.row(idx);
            let dst = out.row_mut(idx);
            for (i, &c) in src.iter().enumerate() {
                let target = ((i as u64 * g) % two_n) as usize;
                if target < n {
                    dst[target] = c;
                } else {
                    dst[target - n] = ModQ::negate(c, q);
                }
            }
        }
        out.set_mform(a.is_mform());
        out
    }
}

/// The Q and P chains of one parameter set.
#[derive(Clone, Debug)]
pub struct RingQp {
    q: Ring,
    p: Ring,
}

impl RingQp {
    pub fn new(n: usize, q_moduli: &[u64], p_moduli: &[u64]) -> Result<Self> {
        Ok(Self {
            q: Ring::new(n, q_moduli)?,
            p: Ring::new(n, p_moduli)?,
        })
    }

    pub fn ring_q(&self) -> &Ring {
        &self.q
    }

    pub fn ring_p(&self) -> &Ring {
        &self.p
    }

    pub fn degree(&self) -> usize {
        self.q.degree()
    }

    /// Zero element at the top of both chains.
    pub fn new_poly(&self) -> PolyQp {
        PolyQp {
            q: self.q.new_poly(),
            p: self.p.new_poly(),
        }
    }

    pub fn is_reduced(&self, a: &PolyQp) -> bool {
        self.q.is_reduced(&a.q) && self.p.is_reduced(&a.p)
    }

    pub fn add(&self, a: &PolyQp, b: &PolyQp) -> PolyQp {
        PolyQp {
            q: self.q.add(&a.q, &b.q),
            p: self.p.add(&a.p, &b.p),
        }
    }

    pub fn sub(&self, a: &PolyQp, b: &PolyQp) -> PolyQp {
        PolyQp {
            q: self.q.sub(&a.q, &b.q),
            p: self.p.sub(&a.p, &b.p),
        }
    }

    pub fn neg(&self, a: &PolyQp) -> PolyQp {
        PolyQp {
            q: self.q.neg(&a.q),
            p: self.p.neg(&a.p),
        }
    }

    pub fn mul(&self, a: &PolyQp, b: &PolyQp) -> PolyQp {
        PolyQp {
            q: self.q.mul(&a.q, &b.q),
            p: self.p.mul(&a.p, &b.p),
        }
    }

    pub fn mul_scalar_rows(&self, a: &PolyQp, q_scalars: &[u64], p_scalars: &[u64]) -> PolyQp {
        PolyQp {
            q: self.q.mul_scalar_rows(&a.q, q_scalars),
            p: self.p.mul_scalar_rows(&a.p, p_scalars),
        }
    }

    pub fn mform(&self, a: &PolyQp) -> PolyQp {
        PolyQp {
            q: self.q.mform(&a.q),
            p: self.p.mform(&a.p),
        }
    }

    pub fn inv_mform(&self, a: &PolyQp) -> PolyQp {
        PolyQp {
            q: self.q.inv_mform(&a.q),
            p: self.p.inv_mform(&a.p),
        }
    }

    /// Lifts one vector of small signed values into both chains.
    pub fn from_signed(&self, values: &[i64]) -> PolyQp {
        PolyQp {
            q: self.q.from_signed(values, self.q.max_level()),
            p: self.p.from_signed(values, self.p.max_level()),
        }
    }

    pub fn sample_uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> PolyQp {
        PolyQp {
            q: self.q.sample_uniform(rng, self.q.max_level()),
            p: self.p.sample_uniform(rng, self.p.max_level()),
        }
    }

    /// Gaussian error with the same integer coefficients in both chains.
    pub fn sample_gaussian<R: Rng + ?Sized>(&self, sampler: &GaussianSampler, rng: &mut R) -> PolyQp {
        self.from_signed(&sampler.sample_vec(self.degree(), rng))
    }

    pub fn sample_ternary<R: Rng + ?Sized>(&self, rng: &mut R) -> PolyQp {
        self.from_signed(&TernarySampler.sample_vec(self.degree(), rng))
    }

    pub fn automorphism(&self, a: &PolyQp, g: u64) -> PolyQp {
        PolyQp {
            q: self.q.automorphism(&a.q, g),
            p: self.p.automorphism(&a.p, g),
        }
    }
}

/// Ring element over the joint Q·P modulus.
#[derive(Clone, PartialEq, Eq)]
pub struct PolyQp {
    pub q: RnsPoly,
    pub p: RnsPoly,
}

impl PolyQp {
    pub fn data_len(&self, with_metadata: bool) -> usize {
        self.q.data_len(with_metadata) + self.p.data_len(with_metadata)
    }
}

impl BinaryCodec for PolyQp {
    fn encoded_len(&self) -> usize {
        self.data_len(true)
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        self.q.encode_into(buf)?;
        self.p.encode_into(buf)
    }

    fn decode_from(reader: &mut Reader<'_>) -> Result<Self> {
        let q = RnsPoly::decode_from(reader)?;
        let p = RnsPoly::decode_from(reader)?;
        if q.degree() != p.degree() {
            return Err(crate::error::malformed!(
                "Q part has degree {} but P part has degree {}",
                q.degree(),
                p.degree()
            ));
        }
        Ok(Self { q, p })
    }
}

impl Zeroize for PolyQp {
    fn zeroize(&mut self) {
        self.q.zeroize();
        self.p.zeroize();
    }
}

impl fmt::Debug for PolyQp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolyQp")
            .field("degree", &self.q.degree())
            .field("level_q", &self.q.level())
            .field("level_p", &self.p.level())
            .finish()
    }
}
