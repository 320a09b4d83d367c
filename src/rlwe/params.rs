//! Base RLWE parameters: ring degree, the Q and P modulus chains and the
//! error distribution.
//!
//! These travel inside the multi-key parameter encoding as an opaque,
//! length-prefixed blob:
//!
//! ```text
//! [1 byte log2(n)][1 byte |Q|][1 byte |P|][8 bytes sigma, f64 BE]
//! [|Q| × 8 bytes Q moduli][|P| × 8 bytes P moduli]
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use byteorder::{BigEndian, WriteBytesExt};

use crate::codec::{write_u8_len, BinaryCodec, Reader};
use crate::error::{MkError, Result};
use crate::math::{Ring, RingQp};

/// Smallest supported ring degree exponent.
pub const MIN_LOG_N: u8 = 3;

/// Largest supported ring degree exponent.
pub const MAX_LOG_N: u8 = crate::math::poly::MAX_LOG_N;

#[derive(Clone)]
pub struct Parameters {
    log_n: u8,
    q: Vec<u64>,
    p: Vec<u64>,
    sigma: f64,
    ring_qp: Arc<RingQp>,
}

impl Parameters {
    /// Validates the chains and precomputes the ring contexts.
    pub fn new(log_n: u8, q: Vec<u64>, p: Vec<u64>, sigma: f64) -> Result<Self> {
        if !(MIN_LOG_N..=MAX_LOG_N).contains(&log_n) {
            return Err(MkError::InvalidConfig(format!(
                "log_n {log_n} outside {MIN_LOG_N}..={MAX_LOG_N}"
            )));
        }
        if q.is_empty() || p.is_empty() {
            return Err(MkError::InvalidConfig(
                "both the Q and the P chain need at least one modulus".into(),
            ));
        }
        if q.len() > u8::MAX as usize || p.len() > u8::MAX as usize {
            return Err(MkError::InvalidConfig("modulus chain longer than 255".into()));
        }
        let distinct: BTreeSet<u64> = q.iter().chain(&p).copied().collect();
        if distinct.len() != q.len() + p.len() {
            return Err(MkError::InvalidConfig("moduli must be pairwise distinct".into()));
        }
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(MkError::InvalidConfig(format!("sigma {sigma} must be positive")));
        }

        let ring_qp = RingQp::new(1 << log_n, &q, &p)?;
        Ok(Self {
            log_n,
            q,
            p,
            sigma,
            ring_qp: Arc::new(ring_qp),
        })
    }

    pub fn log_n(&self) -> u8 {
        self.log_n
    }

    /// Ring degree.
    pub fn n(&self) -> usize {
        1 << self.log_n
    }

    pub fn q(&self) -> &[u64] {
        &self.q
    }

    pub fn p(&self) -> &[u64] {
        &self.p
    }

    pub fn q_count(&self) -> usize {
        self.q.len()
    }

    pub fn p_count(&self) -> usize {
        self.p.len()
    }

    /// Highest ciphertext level, `q_count() - 1`.
    pub fn max_level(&self) -> usize {
        self.q.len() - 1
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn ring_qp(&self) -> &RingQp {
        &self.ring_qp
    }

    pub fn ring_q(&self) -> &Ring {
        self.ring_qp.ring_q()
    }

    pub fn ring_p(&self) -> &Ring {
        self.ring_qp.ring_p()
    }
}

impl PartialEq for Parameters {
    fn eq(&self, other: &Self) -> bool {
        self.log_n == other.log_n
            && self.q == other.q
            && self.p == other.p
            && self.sigma.to_bits() == other.sigma.to_bits()
    }
}

impl fmt::Debug for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("rlwe::Parameters")
            .field("log_n", &self.log_n)
            .field("q", &self.q)
            .field("p", &self.p)
            .field("sigma", &self.sigma)
            .finish()
    }
}

impl BinaryCodec for Parameters {
    fn encoded_len(&self) -> usize {
        3 + 8 + 8 * (self.q.len() + self.p.len())
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.write_u8(self.log_n)?;
        write_u8_len(buf, self.q.len(), "Q chain length")?;
        write_u8_len(buf, self.p.len(), "P chain length")?;
        buf.write_f64::<BigEndian>(self.sigma)?;
        for &m in self.q.iter().chain(&self.p) {
            buf.write_u64::<BigEndian>(m)?;
        }
        Ok(())
    }

    fn decode_from(reader: &mut Reader<'_>) -> Result<Self> {
        let log_n = reader.read_u8()?;
        let q_count = reader.read_u8()? as usize;
        let p_count = reader.read_u8()? as usize;
        let sigma = reader.read_f64()?;
        let q = (0..q_count)
            .map(|_| reader.read_u64())
            .collect::<Result<Vec<_>>>()?;
        let p = (0..p_count)
            .map(|_| reader.read_u64())
            .collect::<Result<Vec<_>>>()?;
        Self::new(log_n, q, p, sigma)
    }
}
