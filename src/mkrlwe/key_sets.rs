//! Multi-party key collections.
//!
//! A set is a capability: an operation that needs party P's key asks the set
//! for it and gets [`MkError::MissingKey`] if P never contributed one. Keys
//! are filed under their own identifier, so the set cannot mislabel them.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use byteorder::{BigEndian, WriteBytesExt};

use super::keys::{RelinearizationKey, RotationKey, SecretKey};
use super::party::{PartyId, PartyMap};
use crate::codec::{write_u32_len, BinaryCodec, Reader};
use crate::error::{corrupted, MkError, Result};

/// Key types that identify their owner.
pub trait PartyKey {
    /// Human-readable kind, used in capability errors.
    const KIND: &'static str;

    fn party_id(&self) -> &PartyId;
}

impl PartyKey for SecretKey {
    const KIND: &'static str = "secret key";

    fn party_id(&self) -> &PartyId {
        self.id()
    }
}

impl PartyKey for RelinearizationKey {
    const KIND: &'static str = "relinearization key";

    fn party_id(&self) -> &PartyId {
        self.id()
    }
}

/// One key per party; a later key for the same party replaces the earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySet<K> {
    keys: PartyMap<K>,
}

pub type SecretKeySet = KeySet<SecretKey>;
pub type RelinearizationKeySet = KeySet<RelinearizationKey>;

impl<K: PartyKey> KeySet<K> {
    pub fn new() -> Self {
        Self {
            keys: PartyMap::new(),
        }
    }

    /// Files `key` under its own identifier, returning the key it replaced.
    pub fn add(&mut self, key: K) -> Option<K> {
        self.keys.insert(key.party_id().clone(), key)
    }

    pub fn get(&self, id: &str) -> Result<&K> {
        self.keys.get(id).ok_or_else(|| MkError::MissingKey {
            kind: K::KIND,
            party: id.to_owned(),
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.keys.contains(id)
    }

    /// Fails on the first party in `ids` without a key.
    pub fn require<'a>(&self, ids: impl IntoIterator<Item = &'a PartyId>) -> Result<()> {
        ids.into_iter().try_for_each(|id| self.get(id.as_str()).map(|_| ()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &PartyId> {
        self.keys.ids()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PartyId, &K)> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<K: PartyKey> Default for KeySet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartyKey> FromIterator<K> for KeySet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::new();
        for key in iter {
            set.add(key);
        }
        set
    }
}

/// Rotation keys per party and rotation index. A party may hold any subset
/// of indices.
///
/// Wire format: a party count, then one record per party in ascending
/// identifier order.
///
/// ```text
/// [4 bytes party count]
/// [parties × ([1 byte id length][id][8 bytes key count]
///             [count × (8 bytes signed index, rotation key)])]
/// ```
///
/// The leading count makes a buffer cut at a record boundary fail to decode
/// instead of yielding a smaller set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationKeySet {
    keys: PartyMap<BTreeMap<i64, RotationKey>>,
}

impl RotationKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files `key` under its identifier and index, returning the key it replaced.
    pub fn add(&mut self, key: RotationKey) -> Option<RotationKey> {
        self.keys
            .entry(key.id().clone())
            .or_default()
            .insert(key.rot_idx(), key)
    }

    pub fn get(&self, id: &str, rot_idx: i64) -> Result<&RotationKey> {
        self.keys
            .get(id)
            .and_then(|by_idx| by_idx.get(&rot_idx))
            .ok_or_else(|| MkError::MissingRotationKey {
                party: id.to_owned(),
                rot_idx,
            })
    }

    pub fn contains(&self, id: &str, rot_idx: i64) -> bool {
        self.get(id, rot_idx).is_ok()
    }

    /// Rotation indices held for `id`, ascending.
    pub fn indices(&self, id: &str) -> Vec<i64> {
        self.keys
            .get(id)
            .map(|by_idx| by_idx.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Fails unless every party in `ids` holds a key for `rot_idx`.
    pub fn require<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a PartyId>,
        rot_idx: i64,
    ) -> Result<()> {
        ids.into_iter()
            .try_for_each(|id| self.get(id.as_str(), rot_idx).map(|_| ()))
    }

    pub fn party_ids(&self) -> impl Iterator<Item = &PartyId> {
        self.keys.ids()
    }

    /// Total number of keys over all parties.
    pub fn len(&self) -> usize {
        self.keys.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RotationKey> {
        self.keys.values().flat_map(BTreeMap::values)
    }
}

impl BinaryCodec for RotationKeySet {
    fn encoded_len(&self) -> usize {
        4 + self
            .keys
            .iter()
            .map(|(id, by_idx)| {
                id.prefixed_len()
                    + 8
                    + by_idx
                        .values()
                        .map(|k| 8 + k.encoded_len())
                        .sum::<usize>()
            })
            .sum::<usize>()
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        write_u32_len(buf, self.keys.len(), "rotation key party count")?;
        for (id, by_idx) in &self.keys {
            id.encode_prefixed(buf)?;
            buf.write_u64::<BigEndian>(by_idx.len() as u64)?;
            for (&idx, key) in by_idx {
                buf.write_i64::<BigEndian>(idx)?;
                key.encode_into(buf)?;
            }
        }
        Ok(())
    }

    fn decode_from(reader: &mut Reader<'_>) -> Result<Self> {
        let parties = reader.read_u32()?;
        let mut keys = PartyMap::new();
        for _ in 0..parties {
            let id = PartyId::decode_prefixed(reader)?;
            let count = reader.read_u64()?;
            if count == 0 {
                return Err(corrupted!("party `{id}` listed with no rotation keys"));
            }

            let mut by_idx = BTreeMap::new();
            for _ in 0..count {
                let idx = reader.read_i64()?;
                let key = RotationKey::decode_from(reader)?;
                if key.rot_idx() != idx || key.id() != &id {
                    return Err(corrupted!(
                        "record ({id}, {idx}) holds the key of ({}, {})",
                        key.id(),
                        key.rot_idx()
                    ));
                }
                if by_idx.insert(idx, key).is_some() {
                    return Err(corrupted!("duplicate rotation index {idx} for `{id}`"));
                }
            }

            match keys.entry(id) {
                Entry::Vacant(slot) => {
                    slot.insert(by_idx);
                }
                Entry::Occupied(slot) => {
                    return Err(corrupted!("party `{}` appears twice", slot.key()));
                }
            }
        }
        Ok(Self { keys })
    }
}
