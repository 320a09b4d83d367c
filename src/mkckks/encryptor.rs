//! Public-key encryption for one party.
//!
//! ```text
//! c_0 = v·b + m + e_0
//! c_id = v·a + e_1
//! ```
//!
//! with `(b, a)` the party's public key, `v` ternary and `e_0, e_1` Gaussian.
//! The result has the body component and the encrypting party's component.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::error::{MkError, Result};
use crate::math::{GaussianSampler, Ring, RnsPoly};
use crate::mkrlwe::{PartyId, PartyMap, PublicKey};

use super::ciphertext::Ciphertext;
use super::encoder::Plaintext;
use super::params::Parameters;

pub struct Encryptor {
    ring_q: Ring,
    id: PartyId,
    b: RnsPoly,
    a: RnsPoly,
    sampler: GaussianSampler,
    rng: ChaCha20Rng,
}

impl Encryptor {
    /// # Errors
    ///
    /// `InvalidConfig` if `pk` does not belong to the ring of `params`.
    pub fn new(params: &Parameters, pk: &PublicKey) -> Result<Self> {
        Self::with_rng(params, pk, ChaCha20Rng::from_entropy())
    }

    pub fn with_seed(params: &Parameters, pk: &PublicKey, seed: u64) -> Result<Self> {
        Self::with_rng(params, pk, ChaCha20Rng::seed_from_u64(seed))
    }

    fn with_rng(params: &Parameters, pk: &PublicKey, rng: ChaCha20Rng) -> Result<Self> {
        let ring_q = params.mk().ring_q().clone();
        let [b, a] = pk.value();
        Ok(Self {
            b: standard_form(&ring_q, &b.q, pk.id())?,
            a: standard_form(&ring_q, &a.q, pk.id())?,
            ring_q,
            id: pk.id().clone(),
            sampler: GaussianSampler::new(params.mk().sigma()),
            rng,
        })
    }

    pub fn encrypt(&mut self, pt: &Plaintext) -> Result<Ciphertext> {
        let m = pt.value();
        if m.is_ntt()
            || m.is_mform()
            || m.degree() != self.ring_q.degree()
            || m.row_count() > self.ring_q.modulus_count()
            || !self.ring_q.is_reduced(m)
        {
            return Err(MkError::InvalidConfig(
                "plaintext must be a standard-form coefficient polynomial of the ring".into(),
            ));
        }
        let level = m.level();
        let mut b = self.b.clone();
        let mut a = self.a.clone();
        b.truncate_level(level);
        a.truncate_level(level);

        let ring = &self.ring_q;
        let v = ring.sample_ternary(&mut self.rng, level);
        let e0 = ring.sample_gaussian(&self.sampler, &mut self.rng, level);
        let e1 = ring.sample_gaussian(&self.sampler, &mut self.rng, level);

        let c0 = ring.add(&ring.add(&ring.mul(&v, &b), m), &e0);
        let c1 = ring.add(&ring.mul(&v, &a), &e1);

        let mut value = PartyMap::new();
        value.insert(PartyId::body(), c0);
        value.insert(self.id.clone(), c1);
        Ciphertext::new(value, pt.scale())
    }
}

fn standard_form(ring: &Ring, poly: &RnsPoly, id: &PartyId) -> Result<RnsPoly> {
    if poly.degree() != ring.degree()
        || poly.row_count() != ring.modulus_count()
        || poly.is_ntt()
        || !ring.is_reduced(poly)
    {
        return Err(MkError::InvalidConfig(format!(
            "public key of `{id}` does not match the parameters"
        )));
    }
    Ok(if poly.is_mform() {
        ring.inv_mform(poly)
    } else {
        poly.clone()
    })
}
