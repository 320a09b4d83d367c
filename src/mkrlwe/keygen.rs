//! Key generation against shared parameters.
//!
//! Every key a party produces uses the CRS vectors of the parameters it was
//! given, so keys of independent parties combine. A CRS index must exist
//! before a key at that index can be generated; the generator never extends
//! the CRS on its own.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::debug;

use super::crs::{
    default_rotation_indices, CONJUGATION_CRS_IDX, RELIN_AUX_CRS_IDX, RELIN_CRS_IDX,
};
use super::key_sets::RotationKeySet;
use super::keys::{PublicKey, RelinearizationKey, RotationKey, SecretKey};
use super::params::Parameters;
use super::party::PartyId;
use crate::error::{MkError, Result};
use crate::ks::{generate_switching_key, SwitchingKey};
use crate::math::{GaussianSampler, PolyQp};
use crate::rlwe::{galois_element_for_conjugation, galois_element_for_rotation};

pub struct KeyGenerator {
    params: Parameters,
    sampler: GaussianSampler,
    rng: ChaCha20Rng,
}

impl KeyGenerator {
    pub fn new(params: &Parameters) -> Self {
        Self::with_rng(params, ChaCha20Rng::from_entropy())
    }

    /// Deterministic generator for reproducible tests.
    pub fn with_seed(params: &Parameters, seed: u64) -> Self {
        Self::with_rng(params, ChaCha20Rng::seed_from_u64(seed))
    }

    fn with_rng(params: &Parameters, rng: ChaCha20Rng) -> Self {
        Self {
            params: params.clone(),
            sampler: GaussianSampler::new(params.sigma()),
            rng,
        }
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Samples a ternary secret for `id`. Also used for the auxiliary secret
    /// of the relinearization key.
    pub fn gen_secret_key(&mut self, id: &str) -> Result<SecretKey> {
        let id = PartyId::new(id)?;
        if id.is_body() {
            return Err(MkError::InvalidPartyId(format!(
                "`{}` is reserved for the ciphertext body",
                PartyId::BODY
            )));
        }
        let ring_qp = self.params.ring_qp();
        let s = ring_qp.sample_ternary(&mut self.rng);
        debug!(party = %id, "generated secret key");
        Ok(SecretKey::new(id, ring_qp.mform(&s)))
    }

    pub fn gen_key_pair(&mut self, id: &str) -> Result<(SecretKey, PublicKey)> {
        let sk = self.gen_secret_key(id)?;
        let pk = self.gen_public_key(&sk)?;
        Ok((sk, pk))
    }

    /// `(b, a) = (-a·s + e, a)` with `a` the first vector of CRS[0].
    pub fn gen_public_key(&mut self, sk: &SecretKey) -> Result<PublicKey> {
        let ring_qp = self.params.ring_qp();
        let crs = self.params.crs(RELIN_CRS_IDX)?;
        let a_mont = crs
            .get(0)
            .ok_or_else(|| MkError::InvalidConfig("empty CRS entry".into()))?;
        let a = ring_qp.inv_mform(a_mont);
        let s = self.secret(sk)?;
        let e = ring_qp.sample_gaussian(&self.sampler, &mut self.rng);

        let b = ring_qp.sub(&e, &ring_qp.mul(&a, &s));
        debug!(party = %sk.id(), "generated public key");
        Ok(PublicKey::new(
            sk.id().clone(),
            [ring_qp.mform(&b), a_mont.clone()],
        ))
    }

    /// Builds `[d, v]` from the secret `s` and auxiliary secret `r` of one party.
    pub fn gen_relinearization_key(
        &mut self,
        sk: &SecretKey,
        aux: &SecretKey,
    ) -> Result<RelinearizationKey> {
        if sk.id() != aux.id() {
            return Err(MkError::InvalidConfig(format!(
                "auxiliary secret of `{}` used for `{}`",
                aux.id(),
                sk.id()
            )));
        }
        let ring_qp = self.params.ring_qp();
        let a = self.params.crs(RELIN_CRS_IDX)?;
        let u = self.params.crs(RELIN_AUX_CRS_IDX)?;
        let s = self.secret(sk)?;
        let r = self.secret(aux)?;
        let neg_r = ring_qp.neg(&r);

        let d = self.switching_key(&r, &s, &a);
        let v = self.switching_key(&s, &neg_r, &u);
        debug!(party = %sk.id(), "generated relinearization key");
        RelinearizationKey::new(sk.id().clone(), vec![d, v])
    }

    /// Key for rotating slots left by `rot_idx`, or for conjugation when
    /// `rot_idx` is the conjugation index.
    pub fn gen_rotation_key(&mut self, sk: &SecretKey, rot_idx: i64) -> Result<RotationKey> {
        let n = self.params.n();
        let galois = match rot_idx {
            CONJUGATION_CRS_IDX => galois_element_for_conjugation(n),
            k if k > 0 => galois_element_for_rotation(k, n),
            k => {
                return Err(MkError::InvalidConfig(format!(
                    "index {k} is reserved and does not name a rotation"
                )))
            }
        };
        let crs = self.params.crs(rot_idx)?;
        let ring_qp = self.params.ring_qp();
        let s = self.secret(sk)?;
        let rotated = ring_qp.automorphism(&s, galois);

        let swk = self.switching_key(&s, &rotated, &crs);
        debug!(party = %sk.id(), rot_idx, galois, "generated rotation key");
        Ok(RotationKey::new(sk.id().clone(), rot_idx, swk))
    }

    pub fn gen_conjugation_key(&mut self, sk: &SecretKey) -> Result<RotationKey> {
        self.gen_rotation_key(sk, CONJUGATION_CRS_IDX)
    }

    /// Generates one key per index in `indices` into `set`.
    pub fn gen_rotation_keys(
        &mut self,
        sk: &SecretKey,
        indices: impl IntoIterator<Item = i64>,
        set: &mut RotationKeySet,
    ) -> Result<()> {
        for idx in indices {
            let key = self.gen_rotation_key(sk, idx)?;
            set.add(key);
        }
        Ok(())
    }

    /// Keys for the power-of-two rotations covered by the default CRS.
    pub fn gen_default_rotation_keys(
        &mut self,
        sk: &SecretKey,
        set: &mut RotationKeySet,
    ) -> Result<()> {
        let indices = default_rotation_indices(self.params.log_n());
        self.gen_rotation_keys(sk, indices, set)
    }

    /// Standard-form secret of `sk`, checked against the parameters.
    fn secret(&self, sk: &SecretKey) -> Result<PolyQp> {
        let ring_qp = self.params.ring_qp();
        let v = sk.value();
        let n = self.params.n();
        let fits = v.q.degree() == n
            && v.p.degree() == n
            && v.q.row_count() == self.params.q_count()
            && v.p.row_count() == self.params.p_count()
            && v.q.is_mform()
            && v.p.is_mform()
            && !v.q.is_ntt()
            && !v.p.is_ntt()
            && ring_qp.is_reduced(v);
        if !fits {
            return Err(MkError::InvalidConfig(format!(
                "secret key of `{}` does not match the parameters",
                sk.id()
            )));
        }
        Ok(ring_qp.inv_mform(v))
    }

    fn switching_key(&mut self, secret: &PolyQp, target: &PolyQp, crs: &SwitchingKey) -> SwitchingKey {
        generate_switching_key(
            self.params.ring_qp(),
            self.params.gadget(),
            secret,
            target,
            crs,
            &self.sampler,
            &mut self.rng,
        )
    }
}
