//! Per-party key material.
//!
//! All ring elements are stored in Montgomery form. Secret, public and
//! relinearization keys are top-level objects whose party identifier fills
//! the remainder of the encoding; rotation keys are embedded in sets and carry
//! a length-prefixed identifier instead.

use std::fmt;

use byteorder::{BigEndian, WriteBytesExt};
use zeroize::Zeroize;

use super::party::PartyId;
use crate::codec::{write_u8_len, BinaryCodec, Reader};
use crate::error::{MkError, Result};
use crate::ks::SwitchingKey;
use crate::math::PolyQp;

/// A party's secret `s`, with the same small coefficients in both chains.
///
/// Wire format: `[QP element][identifier to end of input]`.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey {
    id: PartyId,
    value: PolyQp,
}

impl SecretKey {
    pub fn new(id: PartyId, value: PolyQp) -> Self {
        Self { id, value }
    }

    pub fn id(&self) -> &PartyId {
        &self.id
    }

    pub fn value(&self) -> &PolyQp {
        &self.value
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("id", &self.id)
            .field("value", &"<redacted>")
            .finish()
    }
}

impl BinaryCodec for SecretKey {
    fn encoded_len(&self) -> usize {
        self.value.data_len(true) + self.id.byte_len()
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        self.value.encode_into(buf)?;
        self.id.encode_tail(buf);
        Ok(())
    }

    fn decode_from(reader: &mut Reader<'_>) -> Result<Self> {
        let value = PolyQp::decode_from(reader)?;
        let id = PartyId::decode_tail(reader)?;
        Ok(Self { id, value })
    }
}

/// Encryption key `(b, a)` with `b = -a·s + e` and `a` the first vector of
/// the relinearization CRS entry.
///
/// Wire format: `[QP element b][QP element a][identifier to end of input]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    id: PartyId,
    value: [PolyQp; 2],
}

impl PublicKey {
    pub fn new(id: PartyId, value: [PolyQp; 2]) -> Self {
        Self { id, value }
    }

    pub fn id(&self) -> &PartyId {
        &self.id
    }

    pub fn value(&self) -> &[PolyQp; 2] {
        &self.value
    }
}

impl BinaryCodec for PublicKey {
    fn encoded_len(&self) -> usize {
        self.value.iter().map(|v| v.data_len(true)).sum::<usize>() + self.id.byte_len()
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        for v in &self.value {
            v.encode_into(buf)?;
        }
        self.id.encode_tail(buf);
        Ok(())
    }

    fn decode_from(reader: &mut Reader<'_>) -> Result<Self> {
        let b = PolyQp::decode_from(reader)?;
        let a = PolyQp::decode_from(reader)?;
        let id = PartyId::decode_tail(reader)?;
        Ok(Self { id, value: [b, a] })
    }
}

/// Relinearization key `[d, v]`:
///
/// ```text
/// d_i = -r·a_i + s·g_i + e      (a = CRS[0])
/// v_i = -s·u_i - r·g_i + e      (u = CRS[-1])
/// ```
///
/// where `r` is the party's auxiliary secret.
///
/// Wire format: `[1 byte degree][degree × switching key][identifier to end of input]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelinearizationKey {
    id: PartyId,
    value: Vec<SwitchingKey>,
}

impl RelinearizationKey {
    /// Number of switching keys in a relinearization key.
    pub const DEGREE: usize = 2;

    pub fn new(id: PartyId, value: Vec<SwitchingKey>) -> Result<Self> {
        if value.len() != Self::DEGREE {
            return Err(MkError::InvalidConfig(format!(
                "relinearization key of degree {} (expected {})",
                value.len(),
                Self::DEGREE
            )));
        }
        Ok(Self { id, value })
    }

    pub fn id(&self) -> &PartyId {
        &self.id
    }

    pub fn value(&self) -> &[SwitchingKey] {
        &self.value
    }

    pub fn degree(&self) -> usize {
        self.value.len()
    }
}

impl BinaryCodec for RelinearizationKey {
    fn encoded_len(&self) -> usize {
        1 + self.value.iter().map(|k| k.encoded_len()).sum::<usize>() + self.id.byte_len()
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        write_u8_len(buf, self.value.len(), "relinearization key degree")?;
        for k in &self.value {
            k.encode_into(buf)?;
        }
        self.id.encode_tail(buf);
        Ok(())
    }

    fn decode_from(reader: &mut Reader<'_>) -> Result<Self> {
        let degree = reader.read_u8()? as usize;
        if degree != Self::DEGREE {
            return Err(MkError::InvalidConfig(format!(
                "decoded relinearization key degree {degree} (expected {})",
                Self::DEGREE
            )));
        }
        let value = (0..degree)
            .map(|_| SwitchingKey::decode_from(reader))
            .collect::<Result<Vec<_>>>()?;
        let id = PartyId::decode_tail(reader)?;
        Ok(Self { id, value })
    }
}

/// Switching key from τ_g(s) back to s for one rotation index (or the
/// conjugation index).
///
/// Wire format: `[1 byte id length][id][8 bytes signed index][switching key]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationKey {
    id: PartyId,
    rot_idx: i64,
    value: SwitchingKey,
}

impl RotationKey {
    pub fn new(id: PartyId, rot_idx: i64, value: SwitchingKey) -> Self {
        Self { id, rot_idx, value }
    }

    pub fn id(&self) -> &PartyId {
        &self.id
    }

    pub fn rot_idx(&self) -> i64 {
        self.rot_idx
    }

    pub fn value(&self) -> &SwitchingKey {
        &self.value
    }
}

impl BinaryCodec for RotationKey {
    fn encoded_len(&self) -> usize {
        self.id.prefixed_len() + 8 + self.value.encoded_len()
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        self.id.encode_prefixed(buf)?;
        buf.write_i64::<BigEndian>(self.rot_idx)?;
        self.value.encode_into(buf)
    }

    fn decode_from(reader: &mut Reader<'_>) -> Result<Self> {
        let id = PartyId::decode_prefixed(reader)?;
        let rot_idx = reader.read_i64()?;
        let value = SwitchingKey::decode_from(reader)?;
        Ok(Self { id, rot_idx, value })
    }
}
