//! Multi-key RLWE parameters: base ring parameters, gadget sizing and the
//! common reference string.
//!
//! # Wire format
//!
//! ```text
//! [4 bytes ring parameter length][ring parameters]
//! [4 bytes CRS record count]
//! [count × (4 bytes signed index, switching key)]   ascending index order
//! [4 bytes gamma]
//! ```

use std::sync::Arc;
use std::time::Instant;

use byteorder::{BigEndian, WriteBytesExt};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::crs::{default_crs_indices, CrsStore};
use crate::codec::{write_u32_len, BinaryCodec, Reader};
use crate::error::{corrupted, malformed, MkError, Result};
use crate::ks::{GadgetDecomposition, SwitchingKey};
use crate::math::{Ring, RingQp};
use crate::rlwe;

#[derive(Clone, Debug)]
pub struct Parameters {
    rlwe: rlwe::Parameters,
    gadget: GadgetDecomposition,
    crs: CrsStore,
}

impl Parameters {
    /// Derives alpha and beta from `gamma` and samples the default CRS.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if `gamma` is zero or larger than the P chain.
    pub fn new(rlwe: rlwe::Parameters, gamma: usize) -> Result<Self> {
        let gadget = GadgetDecomposition::new(rlwe.p_count(), gamma)?;
        let params = Self {
            rlwe,
            gadget,
            crs: CrsStore::new(),
        };

        let started = Instant::now();
        let indices = default_crs_indices(params.log_n());
        let beta = params.beta(params.max_level());
        let ring_qp = params.ring_qp();
        let sampled: Vec<(i64, SwitchingKey)> = indices
            .par_iter()
            .map(|&idx| {
                let mut rng = ChaCha20Rng::from_entropy();
                (idx, SwitchingKey::sample_uniform(ring_qp, beta, &mut rng))
            })
            .collect();
        for (idx, swk) in sampled {
            params.crs.insert_new(idx, swk)?;
        }

        info!(
            log_n = params.log_n(),
            q_count = params.q_count(),
            p_count = params.p_count(),
            gamma,
            alpha = params.alpha(),
            beta,
            entries = indices.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generated common reference string"
        );
        Ok(params)
    }

    pub fn rlwe(&self) -> &rlwe::Parameters {
        &self.rlwe
    }

    pub fn log_n(&self) -> u8 {
        self.rlwe.log_n()
    }

    pub fn n(&self) -> usize {
        self.rlwe.n()
    }

    pub fn q_count(&self) -> usize {
        self.rlwe.q_count()
    }

    pub fn p_count(&self) -> usize {
        self.rlwe.p_count()
    }

    pub fn max_level(&self) -> usize {
        self.rlwe.max_level()
    }

    pub fn sigma(&self) -> f64 {
        self.rlwe.sigma()
    }

    pub fn ring_qp(&self) -> &RingQp {
        self.rlwe.ring_qp()
    }

    pub fn ring_q(&self) -> &Ring {
        self.rlwe.ring_q()
    }

    pub fn gadget(&self) -> &GadgetDecomposition {
        &self.gadget
    }

    pub fn gamma(&self) -> usize {
        self.gadget.gamma()
    }

    /// `p_count / gamma`
    pub fn alpha(&self) -> usize {
        self.gadget.alpha()
    }

    /// `ceil((level + 1) / alpha)`
    pub fn beta(&self, level: usize) -> usize {
        self.gadget.beta(level)
    }

    pub fn crs(&self, idx: i64) -> Result<Arc<SwitchingKey>> {
        self.crs.get(idx)
    }

    pub fn has_crs(&self, idx: i64) -> bool {
        self.crs.contains(idx)
    }

    pub fn crs_indices(&self) -> Vec<i64> {
        self.crs.indices()
    }

    /// Makes sure a CRS vector exists at `idx` and returns it.
    ///
    /// An existing vector is returned untouched; it is never regenerated,
    /// since keys may already have been derived from it.
    pub fn add_crs(&self, idx: i64) -> Result<Arc<SwitchingKey>> {
        if i32::try_from(idx).is_err() {
            return Err(MkError::InvalidConfig(format!(
                "CRS index {idx} does not fit in 32 bits"
            )));
        }
        let beta = self.beta(self.max_level());
        let (swk, inserted) = self.crs.get_or_insert_with(idx, || {
            SwitchingKey::sample_uniform(self.ring_qp(), beta, &mut ChaCha20Rng::from_entropy())
        });
        if inserted {
            debug!(idx, beta, "added common reference string entry");
        } else {
            warn!(idx, "common reference string entry already exists, keeping it");
        }
        Ok(swk)
    }

    fn check_crs_entry(&self, idx: i64, swk: &SwitchingKey) -> Result<()> {
        let beta = self.beta(self.max_level());
        let n = self.n();
        let well_formed = swk.beta() == beta
            && swk.value().iter().all(|v| {
                v.q.degree() == n
                    && v.p.degree() == n
                    && v.q.row_count() == self.q_count()
                    && v.p.row_count() == self.p_count()
                    && v.q.is_mform()
                    && v.p.is_mform()
                    && self.ring_qp().is_reduced(v)
            });
        if !well_formed {
            return Err(corrupted!(
                "CRS entry {idx} does not match the parameters (beta {} expected {beta})",
                swk.beta()
            ));
        }
        Ok(())
    }
}

impl PartialEq for Parameters {
    fn eq(&self, other: &Self) -> bool {
        self.rlwe == other.rlwe && self.gadget == other.gadget && self.crs.same_entries(&other.crs)
    }
}

impl BinaryCodec for Parameters {
    fn encoded_len(&self) -> usize {
        let crs: usize = self
            .crs
            .snapshot()
            .iter()
            .map(|(_, swk)| 4 + swk.encoded_len())
            .sum();
        4 + self.rlwe.encoded_len() + 4 + crs + 4
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        write_u32_len(buf, self.rlwe.encoded_len(), "ring parameter length")?;
        self.rlwe.encode_into(buf)?;

        let entries = self.crs.snapshot();
        write_u32_len(buf, entries.len(), "CRS record count")?;
        for (idx, swk) in &entries {
            let idx = i32::try_from(*idx)
                .map_err(|_| MkError::EncodingOverflow(format!("CRS index {idx}")))?;
            buf.write_i32::<BigEndian>(idx)?;
            swk.encode_into(buf)?;
        }

        write_u32_len(buf, self.gamma(), "gamma")
    }

    fn decode_from(reader: &mut Reader<'_>) -> Result<Self> {
        let ring_len = reader.read_u32()? as usize;
        let mut ring_reader = Reader::new(reader.read_bytes(ring_len)?);
        let rlwe = rlwe::Parameters::decode_from(&mut ring_reader)?;
        if !ring_reader.is_empty() {
            return Err(malformed!(
                "ring parameter blob has {} unparsed bytes",
                ring_reader.remaining()
            ));
        }

        let count = reader.read_u32()? as usize;
        let mut records = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            let idx = reader.read_i32()? as i64;
            records.push((idx, SwitchingKey::decode_from(reader)?));
        }
        let gamma = reader.read_u32()? as usize;

        let params = Self {
            gadget: GadgetDecomposition::new(rlwe.p_count(), gamma)?,
            rlwe,
            crs: CrsStore::new(),
        };
        for (idx, swk) in records {
            params.check_crs_entry(idx, &swk)?;
            params.crs.insert_new(idx, swk)?;
        }
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mkrlwe::crs::default_rotation_indices;

    const Q: [u64; 3] = [0xfffffffff6a0001, 0x3fffffffd60001, 0x3fffffffca0001];
    const P: [u64; 2] = [0x7ffffffffe70001, 0x7ffffffffe10001];

    fn base(log_n: u8) -> rlwe::Parameters {
        rlwe::Parameters::new(log_n, Q.to_vec(), P.to_vec(), 3.2).unwrap()
    }

    #[test]
    fn test_default_crs_populated() {
        let params = Parameters::new(base(4), 2).unwrap();
        assert_eq!(params.alpha(), 1);
        assert_eq!(params.beta(params.max_level()), 3);

        let indices = params.crs_indices();
        assert_eq!(indices, vec![-4, -3, -2, -1, 0, 1, 2, 4]);
        for idx in indices {
            assert_eq!(params.crs(idx).unwrap().beta(), 3);
        }
        assert_eq!(default_rotation_indices(4), vec![1, 2, 4]);
    }

    #[test]
    fn test_gamma_validation() {
        assert!(matches!(
            Parameters::new(base(4), 0),
            Err(MkError::InvalidConfig(_))
        ));
        assert!(matches!(
            Parameters::new(base(4), 3),
            Err(MkError::InvalidConfig(_))
        ));
        let wide = Parameters::new(base(4), 1).unwrap();
        assert_eq!(wide.alpha(), 2);
        assert_eq!(wide.beta(2), 2);
    }

    #[test]
    fn test_add_crs_is_idempotent() {
        let params = Parameters::new(base(4), 2).unwrap();
        let before = params.crs(1).unwrap();
        let again = params.add_crs(1).unwrap();
        assert!(Arc::ptr_eq(&before, &again));

        let fresh = params.add_crs(3).unwrap();
        assert_eq!(fresh.beta(), 3);
        assert!(params.has_crs(3));
        assert!(matches!(
            params.add_crs(i64::from(i32::MAX) + 1),
            Err(MkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_crs_shared_between_clones() {
        let params = Parameters::new(base(4), 2).unwrap();
        let clone = params.clone();
        params.add_crs(5).unwrap();
        assert!(clone.has_crs(5));
    }

    #[test]
    fn test_roundtrip_preserves_crs() {
        let params = Parameters::new(base(4), 2).unwrap();
        params.add_crs(3).unwrap();

        let bytes = params.to_bytes().unwrap();
        assert_eq!(bytes.len(), params.encoded_len());

        let decoded = Parameters::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, params);
        for idx in params.crs_indices() {
            assert_eq!(*decoded.crs(idx).unwrap(), *params.crs(idx).unwrap());
        }
        assert_eq!(decoded.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_independent_generation_differs() {
        let a = Parameters::new(base(4), 2).unwrap();
        let b = Parameters::new(base(4), 2).unwrap();
        assert_ne!(a.crs(0).unwrap(), b.crs(0).unwrap());
        assert_ne!(a, b);
    }

    #[test]
    fn test_decode_detects_corruption() {
        let bytes = Parameters::new(base(4), 2).unwrap().to_bytes().unwrap();

        for cut in [1, 4, 5, bytes.len() / 2] {
            assert!(
                Parameters::from_bytes(&bytes[..bytes.len() - cut]).is_err(),
                "truncation by {cut} accepted"
            );
        }

        let mut extended = bytes.clone();
        extended.extend_from_slice(&[0, 0, 0, 2]);
        assert!(matches!(
            Parameters::from_bytes(&extended),
            Err(MkError::TrailingData(4))
        ));

        let mut bad_gamma = bytes.clone();
        let n = bad_gamma.len();
        bad_gamma[n - 4..].copy_from_slice(&0u32.to_be_bytes());
        assert!(matches!(
            Parameters::from_bytes(&bad_gamma),
            Err(MkError::InvalidConfig(_))
        ));
    }
}
