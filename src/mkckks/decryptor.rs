//! N-of-N decryption: `m = c_0 + Σ c_id · s_id` over every party present.

use tracing::warn;

use crate::error::{corrupted, MkError, Result};
use crate::math::{Ring, RnsPoly};
use crate::mkrlwe::SecretKeySet;

use super::ciphertext::Ciphertext;
use super::encoder::Plaintext;
use super::params::Parameters;

#[derive(Debug, Clone)]
pub struct Decryptor {
    ring_q: Ring,
}

impl Decryptor {
    pub fn new(params: &Parameters) -> Self {
        Self {
            ring_q: params.mk().ring_q().clone(),
        }
    }

    /// Decrypts `ct` with the secrets of every party it references.
    ///
    /// # Errors
    ///
    /// `MissingKey` if `sk_set` lacks any party of `ct`; `InvalidConfig` if
    /// `ct` has no body component or does not fit the ring, or if a secret
    /// key does not; `Corrupted` if a component has unreduced residues.
    pub fn decrypt(&self, ct: &Ciphertext, sk_set: &SecretKeySet) -> Result<Plaintext> {
        let body = ct.body().ok_or_else(|| {
            MkError::InvalidConfig("ciphertext has no body component".into())
        })?;
        if ct.is_ntt()
            || ct.ring_degree() != self.ring_q.degree()
            || ct.level() > self.ring_q.max_level()
            || ct.value().values().any(RnsPoly::is_mform)
        {
            return Err(MkError::InvalidConfig(
                "ciphertext does not match the decryption ring".into(),
            ));
        }
        if let Some((id, _)) = ct.value().iter().find(|(_, c)| !self.ring_q.is_reduced(c)) {
            return Err(corrupted!(
                "ciphertext component `{id}` has residues outside its modulus"
            ));
        }
        if let Err(e) = sk_set.require(ct.party_ids()) {
            warn!(error = %e, "refusing partial decryption");
            return Err(e);
        }

        let level = ct.level();
        let mut acc = body.clone();
        for (id, c) in ct.value().iter().filter(|(id, _)| !id.is_body()) {
            let sk = sk_set.get(id.as_str())?;
            let s = self.secret_at(&sk.value().q, level).ok_or_else(|| {
                MkError::InvalidConfig(format!("secret key of `{id}` does not match the ring"))
            })?;
            acc = self.ring_q.add(&acc, &self.ring_q.mul(c, &s));
        }
        Ok(Plaintext::new(acc, ct.scale()))
    }

    fn secret_at(&self, s: &RnsPoly, level: usize) -> Option<RnsPoly> {
        if s.degree() != self.ring_q.degree()
            || s.level() < level
            || s.row_count() > self.ring_q.modulus_count()
            || s.is_ntt()
            || !self.ring_q.is_reduced(s)
        {
            return None;
        }
        let mut s = if s.is_mform() {
            self.ring_q.inv_mform(s)
        } else {
            s.clone()
        };
        s.truncate_level(level);
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mkckks::{Encoder, Encryptor};
    use crate::mkrlwe::{KeyGenerator, PartyId, SecretKey};
    use crate::params::ParametersLiteral;

    fn setup() -> (Parameters, SecretKey, Ciphertext) {
        let params = Parameters::new(&ParametersLiteral::toy()).unwrap();
        let mut kg = KeyGenerator::with_seed(params.mk(), 21);
        let (sk, pk) = kg.gen_key_pair("alice").unwrap();
        let pt = Encoder::new(&params).encode(&[2.5, -1.0]).unwrap();
        let ct = Encryptor::with_seed(&params, &pk, 22).unwrap().encrypt(&pt).unwrap();
        (params, sk, ct)
    }

    #[test]
    fn test_decrypts_single_party() {
        let (params, sk, ct) = setup();
        let keys: SecretKeySet = [sk].into_iter().collect();
        let pt = Decryptor::new(&params).decrypt(&ct, &keys).unwrap();
        let out = Encoder::new(&params).decode(&pt);
        assert!((out[0] - 2.5).abs() < 1e-6);
        assert!((out[1] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_unreduced_component_is_corrupted() {
        let (params, sk, ct) = setup();
        let mut value = ct.value().clone();
        let mut c1 = ct.get("alice").unwrap().clone();
        c1.row_mut(0)[0] = u64::MAX;
        value.insert(PartyId::new("alice").unwrap(), c1);
        let bad = Ciphertext::new(value, ct.scale()).unwrap();

        let keys: SecretKeySet = [sk].into_iter().collect();
        assert!(matches!(
            Decryptor::new(&params).decrypt(&bad, &keys),
            Err(MkError::Corrupted(_))
        ));
    }

    #[test]
    fn test_unreduced_secret_is_rejected() {
        let (params, sk, ct) = setup();
        let mut value = sk.value().clone();
        value.q.row_mut(0)[1] = u64::MAX;
        let keys: SecretKeySet = [SecretKey::new(sk.id().clone(), value)].into_iter().collect();
        assert!(matches!(
            Decryptor::new(&params).decrypt(&ct, &keys),
            Err(MkError::InvalidConfig(_))
        ));
    }
}
