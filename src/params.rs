//! Parameter sets for multi-key CKKS
//!
//! A [`ParametersLiteral`] is the serializable description of a parameter set.
//! It is turned into live parameters (ring contexts plus a freshly sampled
//! CRS) by [`mkckks::Parameters::new`](crate::mkckks::Parameters::new).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MkError, Result};
use crate::ks::GadgetDecomposition;
use crate::math::DEFAULT_SIGMA;
use crate::rlwe::{MAX_LOG_N, MIN_LOG_N};

/// Default gadget parameter gamma.
pub const DEFAULT_GAMMA: usize = 2;

fn default_gamma() -> usize {
    DEFAULT_GAMMA
}

/// Serializable parameter set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametersLiteral {
    /// log2 of the ring degree N
    pub log_n: u8,

    /// log2 of the number of plaintext slots, at most log_n - 1
    pub log_slots: u32,

    /// Ciphertext moduli chain Q, each q ≡ 1 (mod 2N)
    pub q: Vec<u64>,

    /// Auxiliary key-switching moduli P, each p ≡ 1 (mod 2N)
    pub p: Vec<u64>,

    /// Default encoding scale
    pub scale: f64,

    /// Standard deviation of the error distribution
    pub sigma: f64,

    /// Gadget parameter: alpha = len(p) / gamma
    #[serde(default = "default_gamma")]
    pub gamma: usize,
}

impl ParametersLiteral {
    /// Production set: N = 2^15, 14 Q moduli, 2 P moduli, scale 2^54.
    pub fn pn15qp880() -> Self {
        Self {
            log_n: 15,
            log_slots: 14,
            q: vec![
                0xfffffffff6a0001,
                0x3fffffffd60001,
                0x3fffffffca0001,
                0x3fffffff6d0001,
                0x3fffffff5d0001,
                0x3fffffff550001,
                0x3fffffff390001,
                0x3fffffff360001,
                0x3fffffff2a0001,
                0x3fffffff000001,
                0x3ffffffefa0001,
                0x3ffffffef40001,
                0x3ffffffed70001,
                0x3ffffffed30001,
            ],
            p: vec![0x7ffffffffe70001, 0x7ffffffffe10001],
            scale: (1u64 << 54) as f64,
            sigma: DEFAULT_SIGMA,
            gamma: DEFAULT_GAMMA,
        }
    }

    /// Small ring for tests and examples. Not secure.
    pub fn toy() -> Self {
        Self {
            log_n: 5,
            log_slots: 4,
            q: vec![0xfffffffff6a0001, 0x3fffffffd60001, 0x3fffffffca0001],
            p: vec![0x7ffffffffe70001, 0x7ffffffffe10001],
            scale: (1u64 << 40) as f64,
            sigma: DEFAULT_SIGMA,
            gamma: DEFAULT_GAMMA,
        }
    }

    /// Ring degree N
    pub fn n(&self) -> usize {
        1 << self.log_n
    }

    /// Check if parameters are valid
    pub fn validate(&self) -> Result<()> {
        if !(MIN_LOG_N..=MAX_LOG_N).contains(&self.log_n) {
            return Err(MkError::InvalidConfig(format!(
                "log_n {} outside {MIN_LOG_N}..={MAX_LOG_N}",
                self.log_n
            )));
        }
        if self.log_slots + 1 > u32::from(self.log_n) {
            return Err(MkError::InvalidConfig(format!(
                "log_slots {} exceeds log_n - 1",
                self.log_slots
            )));
        }
        if self.q.is_empty() || self.p.is_empty() {
            return Err(MkError::InvalidConfig("empty moduli chain".into()));
        }

        // every modulus must be NTT-friendly: q ≡ 1 (mod 2N)
        let two_n = 2 * self.n() as u64;
        if let Some(q) = self.q.iter().chain(&self.p).find(|&&q| q % two_n != 1) {
            return Err(MkError::InvalidConfig(format!(
                "modulus {q:#x} is not ≡ 1 (mod {two_n})"
            )));
        }

        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(MkError::InvalidConfig(format!("scale {}", self.scale)));
        }
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(MkError::InvalidConfig(format!("sigma {}", self.sigma)));
        }

        GadgetDecomposition::new(self.p.len(), self.gamma).map(|_| ())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let literal: Self = serde_json::from_str(json)
            .map_err(|e| MkError::InvalidConfig(format!("parameter JSON: {e}")))?;
        literal.validate()?;
        Ok(literal)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| MkError::InvalidConfig(format!("parameter JSON: {e}")))
    }
}

impl Default for ParametersLiteral {
    fn default() -> Self {
        Self::pn15qp880()
    }
}
