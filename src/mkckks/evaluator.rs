//! Component-wise combination of multi-key ciphertexts.
//!
//! The result of combining two ciphertexts carries the union of their party
//! sets: a component present in only one operand is copied (or negated, for
//! the right operand of a subtraction).

use crate::error::{corrupted, MkError, Result};
use crate::math::{Ring, RnsPoly};
use crate::mkrlwe::PartyMap;

use super::ciphertext::Ciphertext;
use super::params::Parameters;

#[derive(Debug, Clone)]
pub struct Evaluator {
    ring_q: Ring,
}

impl Evaluator {
    pub fn new(params: &Parameters) -> Self {
        Self {
            ring_q: params.mk().ring_q().clone(),
        }
    }

    pub fn add_new(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Result<Ciphertext> {
        self.combine(lhs, rhs, false)
    }

    pub fn sub_new(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Result<Ciphertext> {
        self.combine(lhs, rhs, true)
    }

    /// Sums all of `cts`, left to right.
    pub fn sum_all(&self, cts: &[Ciphertext]) -> Result<Ciphertext> {
        let (first, rest) = cts
            .split_first()
            .ok_or_else(|| MkError::InvalidConfig("nothing to sum".into()))?;
        rest.iter()
            .try_fold(first.clone(), |acc, ct| self.add_new(&acc, ct))
    }

    fn combine(&self, lhs: &Ciphertext, rhs: &Ciphertext, negate_rhs: bool) -> Result<Ciphertext> {
        self.check_operands(lhs, rhs)?;
        let ring = &self.ring_q;

        let mut value: PartyMap<RnsPoly> = lhs.value().clone();
        for (id, r) in rhs.value() {
            let combined = match value.get(id.as_str()) {
                Some(l) if negate_rhs => ring.sub(l, r),
                Some(l) => ring.add(l, r),
                None if negate_rhs => ring.neg(r),
                None => r.clone(),
            };
            value.insert(id.clone(), combined);
        }
        Ciphertext::new(value, lhs.scale())
    }

    fn check_operands(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Result<()> {
        if lhs.scale() != rhs.scale() {
            return Err(MkError::InvalidConfig(format!(
                "scales differ: {} vs {}",
                lhs.scale(),
                rhs.scale()
            )));
        }
        if lhs.level() != rhs.level() || lhs.is_ntt() != rhs.is_ntt() {
            return Err(MkError::InvalidConfig(
                "operands differ in level or domain".into(),
            ));
        }
        let fits = |ct: &Ciphertext| {
            !ct.is_ntt()
                && ct.ring_degree() == self.ring_q.degree()
                && ct.level() <= self.ring_q.max_level()
                && ct.value().values().all(|c| !c.is_mform())
        };
        if !fits(lhs) || !fits(rhs) {
            return Err(MkError::InvalidConfig(
                "operands do not match the evaluation ring".into(),
            ));
        }
        for (side, ct) in [("left", lhs), ("right", rhs)] {
            if let Some((id, _)) = ct.value().iter().find(|(_, c)| !self.ring_q.is_reduced(c)) {
                return Err(corrupted!(
                    "{side} operand component `{id}` has residues outside its modulus"
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mkrlwe::PartyId;
    use crate::params::ParametersLiteral;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn setup() -> (Parameters, Evaluator) {
        let params = Parameters::new(&ParametersLiteral::toy()).unwrap();
        let eval = Evaluator::new(&params);
        (params, eval)
    }

    fn ciphertext(params: &Parameters, ids: &[&str], seed: u64) -> Ciphertext {
        let ring = params.mk().ring_q();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let value = ids
            .iter()
            .map(|&id| {
                (
                    PartyId::new(id).unwrap(),
                    ring.sample_uniform(&mut rng, ring.max_level()),
                )
            })
            .collect();
        Ciphertext::new(value, params.scale()).unwrap()
    }

    #[test]
    fn test_union_of_parties() {
        let (params, eval) = setup();
        let a = ciphertext(&params, &["0", "alice"], 1);
        let b = ciphertext(&params, &["0", "bob"], 2);

        let sum = eval.add_new(&a, &b).unwrap();
        let ids: Vec<&str> = sum.value().ids().map(PartyId::as_str).collect();
        assert_eq!(ids, ["0", "alice", "bob"]);
        assert_eq!(sum.degree(), 2);
        assert_eq!(sum.get("alice"), a.get("alice"));

        let ring = params.mk().ring_q();
        let diff = eval.sub_new(&a, &b).unwrap();
        assert_eq!(diff.get("bob").unwrap(), &ring.neg(b.get("bob").unwrap()));
        assert_eq!(
            diff.body().unwrap(),
            &ring.sub(a.body().unwrap(), b.body().unwrap())
        );
    }

    #[test]
    fn test_scale_mismatch() {
        let (params, eval) = setup();
        let a = ciphertext(&params, &["0", "alice"], 3);
        let mut b = ciphertext(&params, &["0", "bob"], 4);
        b.set_scale(params.scale() * 2.0);
        assert!(eval.add_new(&a, &b).is_err());
    }

    #[test]
    fn test_unreduced_operand_is_corrupted() {
        let (params, eval) = setup();
        let good = ciphertext(&params, &["0", "alice"], 5);
        let mut value = good.value().clone();
        let mut body = good.body().unwrap().clone();
        body.row_mut(0)[0] = u64::MAX;
        value.insert(PartyId::body(), body);
        let bad = Ciphertext::new(value, params.scale()).unwrap();

        assert!(matches!(eval.add_new(&bad, &bad), Err(MkError::Corrupted(_))));
        assert!(matches!(eval.sub_new(&good, &bad), Err(MkError::Corrupted(_))));
        assert!(eval.add_new(&good, &good).is_ok());
    }

    #[test]
    fn test_sum_all() {
        let (params, eval) = setup();
        let cts: Vec<_> = ["alice", "bob", "carol"]
            .iter()
            .zip(10..)
            .map(|(&id, seed)| ciphertext(&params, &["0", id], seed))
            .collect();
        let total = eval.sum_all(&cts).unwrap();
        assert_eq!(total.party_ids().count(), 3);
        assert!(eval.sum_all(&[]).is_err());
    }
}
