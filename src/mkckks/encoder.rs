//! Fixed-point encoding of real vectors into plaintext polynomials.
//!
//! Values are placed directly in the coefficients, scaled and rounded:
//! `m_i = round(v_i · scale)`. Decoding lifts row 0 to its centered
//! representative and divides by the scale, so a plaintext decodes correctly
//! while `|m_i| < q_0 / 2`.

use crate::error::{MkError, Result};
use crate::math::{Ring, RnsPoly};

use super::params::Parameters;

/// Largest encodable magnitude after scaling.
const MAX_SCALED: f64 = (1u64 << 62) as f64;

/// An encoded message at a given level and scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Plaintext {
    value: RnsPoly,
    scale: f64,
}

impl Plaintext {
    pub fn new(value: RnsPoly, scale: f64) -> Self {
        Self { value, scale }
    }

    pub fn value(&self) -> &RnsPoly {
        &self.value
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn level(&self) -> usize {
        self.value.level()
    }
}

#[derive(Debug, Clone)]
pub struct Encoder {
    ring_q: Ring,
    scale: f64,
}

impl Encoder {
    pub fn new(params: &Parameters) -> Self {
        Self {
            ring_q: params.mk().ring_q().clone(),
            scale: params.scale(),
        }
    }

    /// Encodes at the top level with the default scale.
    pub fn encode(&self, values: &[f64]) -> Result<Plaintext> {
        self.encode_at(values, self.ring_q.max_level(), self.scale)
    }

    /// Encodes `values` (at most N of them; the rest are zero).
    pub fn encode_at(&self, values: &[f64], level: usize, scale: f64) -> Result<Plaintext> {
        let n = self.ring_q.degree();
        if values.len() > n {
            return Err(MkError::InvalidConfig(format!(
                "{} values exceed ring degree {n}",
                values.len()
            )));
        }
        if level > self.ring_q.max_level() {
            return Err(MkError::InvalidConfig(format!("level {level} above chain")));
        }

        let mut coeffs = vec![0i64; n];
        for (c, &v) in coeffs.iter_mut().zip(values) {
            let scaled = (v * scale).round();
            if !scaled.is_finite() || scaled.abs() >= MAX_SCALED {
                return Err(MkError::EncodingOverflow(format!(
                    "value {v} at scale {scale}"
                )));
            }
            *c = scaled as i64;
        }
        Ok(Plaintext::new(self.ring_q.from_signed(&coeffs, level), scale))
    }

    pub fn decode(&self, pt: &Plaintext) -> Vec<f64> {
        self.ring_q
            .to_signed_row0(pt.value())
            .into_iter()
            .map(|c| c as f64 / pt.scale())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParametersLiteral;

    #[test]
    fn test_encode_decode() {
        let params = Parameters::new(&ParametersLiteral::toy()).unwrap();
        let encoder = Encoder::new(&params);

        let values = [1.5, -2.25, 0.0, 3.0e3, -7.125];
        let pt = encoder.encode(&values).unwrap();
        assert_eq!(pt.level(), params.max_level());

        let decoded = encoder.decode(&pt);
        assert_eq!(decoded.len(), params.n());
        for (d, v) in decoded.iter().zip(&values) {
            assert!((d - v).abs() < 1e-9);
        }
        assert!(decoded[values.len()..].iter().all(|&d| d == 0.0));
    }

    #[test]
    fn test_encode_rejects_overflow() {
        let params = Parameters::new(&ParametersLiteral::toy()).unwrap();
        let encoder = Encoder::new(&params);
        assert!(matches!(
            encoder.encode(&[1e300]),
            Err(MkError::EncodingOverflow(_))
        ));
        assert!(encoder.encode(&[f64::NAN]).is_err());
        assert!(encoder.encode(&vec![0.0; params.n() + 1]).is_err());
    }
}
