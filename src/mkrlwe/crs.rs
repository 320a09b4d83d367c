//! Common reference string.
//!
//! Every party derives its keys against the same uniformly random vectors,
//! indexed by a signed integer. Negative and zero indices are reserved for
//! relinearization and conjugation; positive indices are rotation amounts.
//! The CRS is public and is distributed inside the parameter encoding.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{corrupted, MkError, Result};
use crate::ks::SwitchingKey;

/// Uniform vector `a` of the public and relinearization keys.
pub const RELIN_CRS_IDX: i64 = 0;
/// Uniform vector `u` of the relinearization key.
pub const RELIN_AUX_CRS_IDX: i64 = -1;
/// Conjugation key vector.
pub const CONJUGATION_CRS_IDX: i64 = -2;
/// Vectors reserved for auxiliary relinearization.
pub const AUX_RELIN_CRS_IDX: [i64; 2] = [-3, -4];

/// Power-of-two rotation amounts 2^0 .. 2^(log_n - 2).
pub fn default_rotation_indices(log_n: u8) -> Vec<i64> {
    (0..log_n.saturating_sub(1)).map(|k| 1i64 << k).collect()
}

/// Indices populated when parameters are created.
pub fn default_crs_indices(log_n: u8) -> Vec<i64> {
    let mut indices = vec![RELIN_CRS_IDX, RELIN_AUX_CRS_IDX, CONJUGATION_CRS_IDX];
    indices.extend(AUX_RELIN_CRS_IDX);
    indices.extend(default_rotation_indices(log_n));
    indices
}

/// Shared, synchronized map from index to CRS vector.
///
/// Clones share the same entries. Entries are inserted whole and never
/// replaced, so a reader can never observe a partially written vector.
#[derive(Clone, Default)]
pub struct CrsStore {
    entries: Arc<RwLock<BTreeMap<i64, Arc<SwitchingKey>>>>,
}

impl CrsStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock happens before the insert, which leaves
    // the map intact.
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<i64, Arc<SwitchingKey>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<i64, Arc<SwitchingKey>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, idx: i64) -> Result<Arc<SwitchingKey>> {
        self.read().get(&idx).cloned().ok_or(MkError::MissingCrs(idx))
    }

    pub fn contains(&self, idx: i64) -> bool {
        self.read().contains_key(&idx)
    }

    pub fn indices(&self) -> Vec<i64> {
        self.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Entries in index order.
    pub fn snapshot(&self) -> Vec<(i64, Arc<SwitchingKey>)> {
        self.read()
            .iter()
            .map(|(&idx, swk)| (idx, Arc::clone(swk)))
            .collect()
    }

    /// Returns the entry at `idx`, sampling it with `sample` if absent. The
    /// flag is true when this call inserted the entry.
    pub fn get_or_insert_with(
        &self,
        idx: i64,
        sample: impl FnOnce() -> SwitchingKey,
    ) -> (Arc<SwitchingKey>, bool) {
        if let Some(existing) = self.read().get(&idx) {
            return (Arc::clone(existing), false);
        }
        let mut entries = self.write();
        if let Some(existing) = entries.get(&idx) {
            return (Arc::clone(existing), false);
        }
        let swk = Arc::new(sample());
        entries.insert(idx, Arc::clone(&swk));
        (swk, true)
    }

    /// Inserts a decoded entry; a second entry for the same index is corruption.
    pub(crate) fn insert_new(&self, idx: i64, swk: SwitchingKey) -> Result<()> {
        let mut entries = self.write();
        if entries.contains_key(&idx) {
            return Err(corrupted!("duplicate common reference string index {idx}"));
        }
        entries.insert(idx, Arc::new(swk));
        Ok(())
    }

    /// Same indices and vectors.
    pub fn same_entries(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.entries, &other.entries) {
            return true;
        }
        let (a, b) = (self.snapshot(), other.snapshot());
        a.len() == b.len()
            && a.iter()
                .zip(&b)
                .all(|((ia, ka), (ib, kb))| ia == ib && ka == kb)
    }
}

impl std::fmt::Debug for CrsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrsStore")
            .field("indices", &self.indices())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::RingQp;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn tiny_key(seed: u64) -> SwitchingKey {
        let rqp = RingQp::new(8, &[0x3fffffffd60001], &[0x7ffffffffe70001]).unwrap();
        SwitchingKey::sample_uniform(&rqp, 1, &mut ChaCha20Rng::seed_from_u64(seed))
    }

    #[test]
    fn test_default_indices() {
        assert_eq!(default_rotation_indices(5), vec![1, 2, 4, 8]);
        let all = default_crs_indices(15);
        assert_eq!(all.len(), 5 + 14);
        assert_eq!(&all[..5], &[0, -1, -2, -3, -4]);
        assert_eq!(*all.last().unwrap(), 1 << 13);
    }

    #[test]
    fn test_get_or_insert_is_idempotent() {
        let store = CrsStore::new();
        let (first, inserted) = store.get_or_insert_with(3, || tiny_key(1));
        assert!(inserted);
        let (second, inserted) = store.get_or_insert_with(3, || tiny_key(2));
        assert!(!inserted);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.indices(), vec![3]);
    }

    #[test]
    fn test_missing_and_duplicate() {
        let store = CrsStore::new();
        assert!(matches!(store.get(7), Err(MkError::MissingCrs(7))));
        store.insert_new(7, tiny_key(3)).unwrap();
        assert!(matches!(
            store.insert_new(7, tiny_key(4)),
            Err(MkError::Corrupted(_))
        ));
    }

    #[test]
    fn test_clones_share_entries() {
        let store = CrsStore::new();
        let shared = store.clone();
        store.get_or_insert_with(1, || tiny_key(5));
        assert!(shared.contains(1));
        assert!(shared.same_entries(&store));

        let other = CrsStore::new();
        other.insert_new(1, tiny_key(6)).unwrap();
        assert!(!other.same_entries(&store));
    }

    #[test]
    fn test_concurrent_add_keeps_one_value() {
        let store = CrsStore::new();
        let handles: Vec<_> = (0..8)
            .map(|seed| {
                let store = store.clone();
                std::thread::spawn(move || store.get_or_insert_with(42, || tiny_key(seed)).0)
            })
            .collect();
        let values: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
        assert_eq!(store.len(), 1);
    }
}
