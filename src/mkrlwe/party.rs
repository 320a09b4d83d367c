//! Party identifiers and party-indexed maps.

use std::borrow::Borrow;
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

use crate::codec::{write_u8_len, Reader};
use crate::error::{MkError, Result};

/// Name of one participant, 1 to 255 bytes of UTF-8.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartyId(String);

impl PartyId {
    pub const MAX_LEN: usize = 255;

    /// Identifier of the ciphertext body component, never a real party.
    pub const BODY: &'static str = "0";

    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(MkError::InvalidPartyId("empty identifier".into()));
        }
        if id.len() > Self::MAX_LEN {
            return Err(MkError::InvalidPartyId(format!(
                "{} bytes exceeds {}",
                id.len(),
                Self::MAX_LEN
            )));
        }
        Ok(Self(id))
    }

    pub fn body() -> Self {
        Self(Self::BODY.to_owned())
    }

    pub fn is_body(&self) -> bool {
        self.0 == Self::BODY
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Encoded size in bytes, without any length prefix.
    pub fn byte_len(&self) -> usize {
        self.0.len()
    }

    fn from_wire(bytes: &[u8]) -> Result<Self> {
        let id = std::str::from_utf8(bytes)
            .map_err(|e| MkError::InvalidPartyId(format!("not UTF-8: {e}")))?;
        Self::new(id)
    }

    pub(crate) fn prefixed_len(&self) -> usize {
        1 + self.byte_len()
    }

    /// `[1 byte length][bytes]`
    pub(crate) fn encode_prefixed(&self, buf: &mut Vec<u8>) -> Result<()> {
        write_u8_len(buf, self.byte_len(), "party identifier length")?;
        buf.extend_from_slice(self.0.as_bytes());
        Ok(())
    }

    pub(crate) fn decode_prefixed(reader: &mut Reader<'_>) -> Result<Self> {
        let len = reader.read_u8()? as usize;
        Self::from_wire(reader.read_bytes(len)?)
    }

    /// Identifier stored as the final bytes of a top-level object.
    pub(crate) fn encode_tail(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.0.as_bytes());
    }

    pub(crate) fn decode_tail(reader: &mut Reader<'_>) -> Result<Self> {
        Self::from_wire(reader.read_rest())
    }
}

impl TryFrom<&str> for PartyId {
    type Error = MkError;

    fn try_from(id: &str) -> Result<Self> {
        Self::new(id)
    }
}

impl AsRef<str> for PartyId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PartyId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PartyId({:?})", self.0)
    }
}

/// Ordered map keyed by party. Iteration order is the identifiers' byte
/// order, so encodings built from it are canonical.
#[derive(Clone, PartialEq, Eq)]
pub struct PartyMap<T> {
    entries: BTreeMap<PartyId, T>,
}

impl<T> PartyMap<T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Inserts or replaces; returns the previous entry.
    pub fn insert(&mut self, id: PartyId, value: T) -> Option<T> {
        self.entries.insert(id, value)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.entries.get_mut(id)
    }

    pub(crate) fn entry(&mut self, id: PartyId) -> btree_map::Entry<'_, PartyId, T> {
        self.entries.entry(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        self.entries.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &PartyId> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, PartyId, T> {
        self.entries.iter()
    }
}

impl<T> Default for PartyMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for PartyMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<T> FromIterator<(PartyId, T)> for PartyMap<T> {
    fn from_iter<I: IntoIterator<Item = (PartyId, T)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a, T> IntoIterator for &'a PartyMap<T> {
    type Item = (&'a PartyId, &'a T);
    type IntoIter = btree_map::Iter<'a, PartyId, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<T> IntoIterator for PartyMap<T> {
    type Item = (PartyId, T);
    type IntoIter = btree_map::IntoIter<PartyId, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_id_bounds() {
        assert!(PartyId::new("").is_err());
        assert!(PartyId::new("a".repeat(255)).is_ok());
        assert!(matches!(
            PartyId::new("a".repeat(256)),
            Err(MkError::InvalidPartyId(_))
        ));
        assert!(PartyId::body().is_body());
        assert!(!PartyId::new("alice").unwrap().is_body());
    }

    #[test]
    fn test_prefixed_roundtrip() {
        let id = PartyId::new("ålice").unwrap();
        let mut buf = Vec::new();
        id.encode_prefixed(&mut buf).unwrap();
        assert_eq!(buf.len(), id.prefixed_len());
        assert_eq!(buf[0] as usize, "ålice".len());

        let mut r = Reader::new(&buf);
        assert_eq!(PartyId::decode_prefixed(&mut r).unwrap(), id);
        assert!(r.is_empty());
    }

    #[test]
    fn test_decode_rejects_invalid_utf8_and_empty_tail() {
        let mut r = Reader::new(&[2, 0xff, 0xfe]);
        assert!(matches!(
            PartyId::decode_prefixed(&mut r),
            Err(MkError::InvalidPartyId(_))
        ));

        let mut r = Reader::new(&[]);
        assert!(PartyId::decode_tail(&mut r).is_err());
    }

    #[test]
    fn test_party_map_is_ordered_and_unique() {
        let mut map = PartyMap::new();
        map.insert(PartyId::new("carol").unwrap(), 3);
        map.insert(PartyId::new("alice").unwrap(), 1);
        assert_eq!(map.insert(PartyId::new("alice").unwrap(), 10), Some(1));

        let ids: Vec<&str> = map.ids().map(PartyId::as_str).collect();
        assert_eq!(ids, vec!["alice", "carol"]);
        assert_eq!(map.get("alice"), Some(&10));
        assert!(map.get("bob").is_none());
        assert_eq!(map.len(), 2);
    }
}
