//! Switching keys.
//!
//! A switching key is an ordered vector of `beta` QP ring elements in
//! Montgomery form. The same type carries CRS entries (uniform vectors) and
//! party keys (gadget encryptions):
//!
//! ```text
//! K[i] = -s·a_i + e_i + g_i·t        (i = 0..beta)
//! ```
//!
//! where `a` is a CRS entry, `s` the encrypting secret, `t` the encrypted
//! target and `g_i` the i-th gadget element.
//!
//! Wire format: `[1 byte beta][beta × QP element]`.

use rand::Rng;

use super::gadget::GadgetDecomposition;
use crate::codec::{write_u8_len, BinaryCodec, Reader};
use crate::error::{corrupted, malformed, MkError, Result};
use crate::math::{GaussianSampler, PolyQp, RingQp};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchingKey {
    value: Vec<PolyQp>,
}

impl SwitchingKey {
    /// Wraps `beta` components that share one shape.
    pub fn from_parts(value: Vec<PolyQp>) -> Result<Self> {
        if value.is_empty() {
            return Err(MkError::InvalidConfig("switching key without components".into()));
        }
        if value.len() > u8::MAX as usize {
            return Err(MkError::EncodingOverflow(format!(
                "switching key with {} components",
                value.len()
            )));
        }
        let first = &value[0];
        if !value
            .iter()
            .all(|v| v.q.is_compatible_with(&first.q) && v.p.is_compatible_with(&first.p))
        {
            return Err(corrupted!("switching key components differ in shape"));
        }
        Ok(Self { value })
    }

    /// Samples `beta` uniform elements over the full QP chain, in Montgomery form.
    pub fn sample_uniform<R: Rng + ?Sized>(ring_qp: &RingQp, beta: usize, rng: &mut R) -> Self {
        let value = (0..beta)
            .map(|_| ring_qp.mform(&ring_qp.sample_uniform(rng)))
            .collect();
        Self { value }
    }

    /// Number of gadget components.
    pub fn beta(&self) -> usize {
        self.value.len()
    }

    pub fn value(&self) -> &[PolyQp] {
        &self.value
    }

    pub fn get(&self, i: usize) -> Option<&PolyQp> {
        self.value.get(i)
    }

    /// Ciphertext level the key was built for.
    pub fn level_q(&self) -> usize {
        self.value[0].q.level()
    }
}

/// Gadget-encrypts `target` under `secret` against the CRS vector `crs`.
///
/// `secret` and `target` are standard-form QP elements; `crs` is a stored CRS
/// entry in Montgomery form. The result is in Montgomery form.
pub fn generate_switching_key<R: Rng + ?Sized>(
    ring_qp: &RingQp,
    gadget: &GadgetDecomposition,
    secret: &PolyQp,
    target: &PolyQp,
    crs: &SwitchingKey,
    sampler: &GaussianSampler,
    rng: &mut R,
) -> SwitchingKey {
    let level = crs.level_q();
    let value = crs
        .value()
        .iter()
        .enumerate()
        .map(|(i, a_mont)| {
            let a = ring_qp.inv_mform(a_mont);
            let e = ring_qp.sample_gaussian(sampler, rng);
            let (q_scalars, p_scalars) = gadget.scalars(ring_qp, i, level);
            let g_t = ring_qp.mul_scalar_rows(target, &q_scalars, &p_scalars);

            let k = ring_qp.sub(&ring_qp.add(&e, &g_t), &ring_qp.mul(secret, &a));
            ring_qp.mform(&k)
        })
        .collect();
    SwitchingKey { value }
}

impl BinaryCodec for SwitchingKey {
    fn encoded_len(&self) -> usize {
        1 + self.value.iter().map(|v| v.data_len(true)).sum::<usize>()
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        write_u8_len(buf, self.value.len(), "switching key beta")?;
        for v in &self.value {
            v.encode_into(buf)?;
        }
        Ok(())
    }

    fn decode_from(reader: &mut Reader<'_>) -> Result<Self> {
        let beta = reader.read_u8()? as usize;
        if beta == 0 {
            return Err(malformed!("switching key with beta = 0"));
        }
        let value = (0..beta)
            .map(|_| PolyQp::decode_from(reader))
            .collect::<Result<Vec<_>>>()?;
        Self::from_parts(value)
    }
}
