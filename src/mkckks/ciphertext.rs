//! Multi-key ciphertexts.
//!
//! A ciphertext holds one ring element per participating party plus the body
//! component under [`PartyId::BODY`]. The identifiers present are exactly the
//! parties whose secrets are needed to decrypt.
//!
//! # Wire format
//!
//! ```text
//! [1 byte component count = degree + 1]
//! [8 bytes scale, little-endian f64]
//! [1 byte flags: bit 0 = NTT]
//! [count × (1 byte id length, id, ring element)]
//! ```
//!
//! Records appear in ascending identifier order and run to the end of the
//! input; the record count must equal the leading byte.

use byteorder::{LittleEndian, WriteBytesExt};

use crate::codec::{write_u8_len, BinaryCodec, Reader};
use crate::error::{corrupted, malformed, MkError, Result};
use crate::math::RnsPoly;
use crate::mkrlwe::{PartyId, PartyMap};

const FLAG_NTT: u8 = 1;

/// Bytes before the first component record.
pub const CIPHERTEXT_HEADER_LEN: usize = 1 + 8 + 1;

#[derive(Debug, Clone, PartialEq)]
pub struct Ciphertext {
    value: PartyMap<RnsPoly>,
    scale: f64,
    is_ntt: bool,
}

impl Ciphertext {
    /// Builds a ciphertext from its components.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if `value` is empty, has more than 255 components, or
    /// mixes ring degrees, levels or domains.
    pub fn new(value: PartyMap<RnsPoly>, scale: f64) -> Result<Self> {
        let is_ntt = check_components(&value).map_err(MkError::InvalidConfig)?;
        Ok(Self {
            value,
            scale,
            is_ntt,
        })
    }

    pub fn value(&self) -> &PartyMap<RnsPoly> {
        &self.value
    }

    /// Component of `id`, including [`PartyId::BODY`].
    pub fn get(&self, id: &str) -> Option<&RnsPoly> {
        self.value.get(id)
    }

    pub fn body(&self) -> Option<&RnsPoly> {
        self.value.get(PartyId::BODY)
    }

    /// Identifiers of the parties whose keys this ciphertext depends on.
    pub fn party_ids(&self) -> impl Iterator<Item = &PartyId> {
        self.value.ids().filter(|id| !id.is_body())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.value.contains(id)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    /// Number of components minus one.
    pub fn degree(&self) -> usize {
        self.value.len() - 1
    }

    pub fn level(&self) -> usize {
        self.value.values().next().map_or(0, RnsPoly::level)
    }

    pub fn ring_degree(&self) -> usize {
        self.value.values().next().map_or(0, RnsPoly::degree)
    }

    pub fn is_ntt(&self) -> bool {
        self.is_ntt
    }

    pub fn into_value(self) -> PartyMap<RnsPoly> {
        self.value
    }
}

/// Returns the shared NTT flag, or why the components cannot form a ciphertext.
fn check_components(value: &PartyMap<RnsPoly>) -> std::result::Result<bool, String> {
    let mut components = value.iter();
    let Some((_, first)) = components.next() else {
        return Err("ciphertext without components".into());
    };
    if value.len() > u8::MAX as usize {
        return Err(format!("{} components exceed 255", value.len()));
    }
    for (id, poly) in components {
        if !poly.is_compatible_with(first) || poly.is_ntt() != first.is_ntt() {
            return Err(format!("component `{id}` differs in degree, level or domain"));
        }
    }
    Ok(first.is_ntt())
}

impl BinaryCodec for Ciphertext {
    fn encoded_len(&self) -> usize {
        CIPHERTEXT_HEADER_LEN
            + self
                .value
                .iter()
                .map(|(id, poly)| id.prefixed_len() + poly.data_len(true))
                .sum::<usize>()
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        write_u8_len(buf, self.value.len(), "ciphertext component count")?;
        buf.write_f64::<LittleEndian>(self.scale)?;
        buf.write_u8(if self.is_ntt { FLAG_NTT } else { 0 })?;
        for (id, poly) in &self.value {
            id.encode_prefixed(buf)?;
            poly.encode_into(buf)?;
        }
        Ok(())
    }

    fn decode_from(reader: &mut Reader<'_>) -> Result<Self> {
        if reader.remaining() < CIPHERTEXT_HEADER_LEN {
            return Err(malformed!(
                "ciphertext header needs {CIPHERTEXT_HEADER_LEN} bytes, got {}",
                reader.remaining()
            ));
        }
        let count = reader.read_u8()? as usize;
        let scale = reader.read_f64_le()?;
        let flags = reader.read_u8()?;
        if flags & !FLAG_NTT != 0 {
            return Err(malformed!("unknown ciphertext flags {flags:#04x}"));
        }

        let mut value = PartyMap::new();
        while !reader.is_empty() {
            let id = PartyId::decode_prefixed(reader)?;
            let poly = RnsPoly::decode_from(reader)?;
            if value.contains(id.as_str()) {
                return Err(corrupted!("component `{id}` appears twice"));
            }
            value.insert(id, poly);
        }

        if value.len() != count {
            return Err(corrupted!(
                "header announces {count} components, found {}",
                value.len()
            ));
        }
        let is_ntt = check_components(&value).map_err(MkError::Corrupted)?;
        if is_ntt != (flags & FLAG_NTT != 0) {
            return Err(corrupted!("NTT flag disagrees with the components"));
        }
        Ok(Self {
            value,
            scale,
            is_ntt,
        })
    }
}
