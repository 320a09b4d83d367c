//! Wire-format properties of every encoded object
//!
//! Length law, exact round trips and corruption detection.

use mkckks::math::{Ring, RingQp};
use mkckks::mkrlwe::{self, KeyGenerator, RotationKeySet};
use mkckks::params::ParametersLiteral;
use mkckks::{
    rlwe, BinaryCodec, Ciphertext, Decryptor, Encoder, Encryptor, Evaluator, MkError, Parameters,
    PartyId, PartyMap, SecretKeySet,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

const Q14: [u64; 14] = [
    0xfffffffff6a0001,
    0x3fffffffd60001,
    0x3fffffffca0001,
    0x3fffffff6d0001,
    0x3fffffff5d0001,
    0x3fffffff550001,
    0x3fffffff390001,
    0x3fffffff360001,
    0x3fffffff2a0001,
    0x3fffffff000001,
    0x3ffffffefa0001,
    0x3ffffffef40001,
    0x3ffffffed70001,
    0x3ffffffed30001,
];
const P2: [u64; 2] = [0x7ffffffffe70001, 0x7ffffffffe10001];

fn toy_params() -> Parameters {
    Parameters::new(&ParametersLiteral::toy()).unwrap()
}

fn random_ciphertext(log_n: u32, rows: usize, ids: &[String], seed: u64) -> Ciphertext {
    let ring = Ring::new(1 << log_n, &Q14[..rows]).unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let value: PartyMap<_> = ids
        .iter()
        .map(|id| {
            (
                PartyId::new(id.as_str()).unwrap(),
                ring.sample_uniform(&mut rng, rows - 1),
            )
        })
        .collect();
    Ciphertext::new(value, 2f64.powi(30)).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn ciphertext_length_law(
        log_n in 3u32..=5,
        rows in 1usize..=3,
        ids in prop::collection::btree_set("[a-z0-9]{1,12}", 1..5),
        seed in any::<u64>(),
    ) {
        let ids: Vec<String> = ids.into_iter().collect();
        let ct = random_ciphertext(log_n, rows, &ids, seed);
        let bytes = ct.to_bytes().unwrap();
        prop_assert_eq!(bytes.len(), ct.encoded_len());

        let decoded = Ciphertext::from_bytes(&bytes).unwrap();
        prop_assert_eq!(decoded.degree(), ids.len() - 1);
        prop_assert_eq!(&decoded, &ct);
    }

    #[test]
    fn ciphertext_truncation_always_fails(cut in 1usize..200, seed in any::<u64>()) {
        let ids = vec!["alice".to_string(), "bob".to_string()];
        let bytes = random_ciphertext(3, 1, &ids, seed).to_bytes().unwrap();
        let cut = cut.min(bytes.len());
        prop_assert!(Ciphertext::from_bytes(&bytes[..bytes.len() - cut]).is_err());
    }
}

#[test]
fn alice_bob_ciphertext_scenario() {
    let ids = vec!["alice".to_string(), "bob".to_string()];
    let ct = random_ciphertext(4, 2, &ids, 42);
    let decoded = Ciphertext::from_bytes(&ct.to_bytes().unwrap()).unwrap();

    let keys: Vec<&str> = decoded.value().ids().map(PartyId::as_str).collect();
    assert_eq!(keys, ["alice", "bob"]);
    for id in ["alice", "bob"] {
        assert_eq!(decoded.get(id).unwrap().rows(), ct.get(id).unwrap().rows());
    }
    assert_eq!(decoded.scale().to_bits(), ct.scale().to_bits());
    assert_eq!(decoded.degree(), ct.degree());
    assert_eq!(decoded.is_ntt(), ct.is_ntt());
}

#[test]
fn gadget_sizing_for_the_production_chain() {
    let base = rlwe::Parameters::new(4, Q14.to_vec(), P2.to_vec(), 3.2).unwrap();
    let params = mkrlwe::Parameters::new(base, 2).unwrap();

    assert_eq!(params.alpha(), 1);
    assert_eq!(params.beta(13), 14);
    for idx in params.crs_indices() {
        assert_eq!(params.crs(idx).unwrap().beta(), 14);
    }

    let fresh = params.add_crs(5).unwrap();
    assert_eq!(fresh.beta(), 14);
}

#[test]
fn parameters_survive_encoding_with_their_crs() {
    let params = toy_params();
    params.mk().add_crs(6).unwrap();
    let bytes = params.to_bytes().unwrap();
    assert_eq!(bytes.len(), params.encoded_len());

    let decoded = Parameters::from_bytes(&bytes).unwrap();
    for idx in params.mk().crs_indices() {
        assert_eq!(decoded.mk().crs(idx).unwrap(), params.mk().crs(idx).unwrap());
    }
    assert_eq!(decoded.mk().crs_indices(), params.mk().crs_indices());

    // parameters generated independently have their own CRS
    assert_ne!(toy_params().mk().crs(0).unwrap(), params.mk().crs(0).unwrap());
}

#[test]
fn parameters_detect_corruption() {
    let bytes = toy_params().to_bytes().unwrap();
    for cut in [1, 3, 4, 9, bytes.len() / 2, bytes.len() - 1] {
        assert!(
            Parameters::from_bytes(&bytes[..bytes.len() - cut]).is_err(),
            "truncation by {cut} accepted"
        );
    }
    for extra in 1..=8 {
        let mut extended = bytes.clone();
        extended.extend(std::iter::repeat(0xa5).take(extra));
        assert!(matches!(
            Parameters::from_bytes(&extended),
            Err(MkError::TrailingData(n)) if n == extra
        ));
    }
}

#[test]
fn parameters_detect_corrupted_fields() {
    let bytes = toy_params().to_bytes().unwrap();
    let mut huge_slots = bytes.clone();
    huge_slots[..4].copy_from_slice(&u32::MAX.to_be_bytes());
    assert!(matches!(
        Parameters::from_bytes(&huge_slots),
        Err(MkError::InvalidConfig(_))
    ));

    // first Q modulus inside the ring blob: [logSlots][scale][len][log_n][#q][#p][sigma]
    let q0 = 4 + 8 + 4 + 3 + 8;
    let mut bad_modulus = bytes.clone();
    bad_modulus[q0..q0 + 8].copy_from_slice(&97u64.to_be_bytes());
    assert!(matches!(
        Parameters::from_bytes(&bad_modulus),
        Err(MkError::InvalidConfig(_))
    ));
}

#[test]
fn unreduced_ciphertext_residue_is_reported() {
    let params = toy_params();
    let mut kg = KeyGenerator::with_seed(params.mk(), 13);
    let (sk, pk) = kg.gen_key_pair("alice").unwrap();
    let pt = Encoder::new(&params).encode(&[1.5]).unwrap();
    let ct = Encryptor::with_seed(&params, &pk, 14).unwrap().encrypt(&pt).unwrap();

    // body record comes first: [count][scale][flags][1]["0"][log_n][rows][flags]
    let first_residue = mkckks::mkckks::CIPHERTEXT_HEADER_LEN + 2 + 3;
    let mut bytes = ct.to_bytes().unwrap();
    bytes[first_residue..first_residue + 8].copy_from_slice(&u64::MAX.to_be_bytes());

    // the codec does not know the moduli; the ring-aware consumers do
    let corrupted = Ciphertext::from_bytes(&bytes).unwrap();
    assert!(matches!(
        Evaluator::new(&params).add_new(&corrupted, &corrupted),
        Err(MkError::Corrupted(_))
    ));
    let keys: SecretKeySet = [sk].into_iter().collect();
    assert!(matches!(
        Decryptor::new(&params).decrypt(&corrupted, &keys),
        Err(MkError::Corrupted(_))
    ));
}

#[test]
fn rotation_key_set_scenario() {
    let params = toy_params();
    let mut kg = KeyGenerator::with_seed(params.mk(), 11);
    let mut set = RotationKeySet::new();
    for party in ["alice", "bob"] {
        let sk = kg.gen_secret_key(party).unwrap();
        kg.gen_rotation_keys(&sk, [1, 2, 4], &mut set).unwrap();
    }

    let bytes = set.to_bytes().unwrap();
    assert_eq!(bytes.len(), set.encoded_len());
    let decoded = RotationKeySet::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, set);
    for party in ["alice", "bob"] {
        assert_eq!(decoded.indices(party), vec![1, 2, 4]);
    }

    assert!(RotationKeySet::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    // cut right after alice's record
    let mut alice = RotationKeySet::new();
    for idx in [1, 2, 4] {
        alice.add(set.get("alice", idx).unwrap().clone());
    }
    assert!(RotationKeySet::from_bytes(&bytes[..alice.encoded_len()]).is_err());
    let mut extended = bytes.clone();
    extended.push(0);
    assert!(RotationKeySet::from_bytes(&extended).is_err());
}

#[test]
fn key_objects_round_trip() {
    let params = toy_params();
    let mut kg = KeyGenerator::with_seed(params.mk(), 12);
    let (sk, pk) = kg.gen_key_pair("carol").unwrap();
    let aux = kg.gen_secret_key("carol").unwrap();
    let rlk = kg.gen_relinearization_key(&sk, &aux).unwrap();
    let conj = kg.gen_conjugation_key(&sk).unwrap();

    assert_eq!(mkckks::SecretKey::from_bytes(&sk.to_bytes().unwrap()).unwrap(), sk);
    assert_eq!(mkckks::PublicKey::from_bytes(&pk.to_bytes().unwrap()).unwrap(), pk);
    assert_eq!(
        mkckks::RelinearizationKey::from_bytes(&rlk.to_bytes().unwrap()).unwrap(),
        rlk
    );
    assert_eq!(
        mkckks::RotationKey::from_bytes(&conj.to_bytes().unwrap()).unwrap(),
        conj
    );
    assert_eq!(sk.to_bytes().unwrap().len(), sk.encoded_len());
    assert_eq!(pk.to_bytes().unwrap().len(), pk.encoded_len());
    assert_eq!(rlk.to_bytes().unwrap().len(), rlk.encoded_len());
    assert_eq!(conj.to_bytes().unwrap().len(), conj.encoded_len());
}

#[test]
fn qp_element_encodes_q_then_p() {
    let rqp = RingQp::new(8, &Q14[..2], &P2).unwrap();
    let poly = rqp.sample_uniform(&mut ChaCha20Rng::seed_from_u64(3));
    let bytes = poly.to_bytes().unwrap();
    assert_eq!(bytes.len(), poly.data_len(true));
    // [logN][rows][flags] header of the Q part, then of the P part
    assert_eq!(&bytes[..3], &[3, 2, 0]);
    let p_offset = poly.q.data_len(true);
    assert_eq!(&bytes[p_offset..p_offset + 3], &[3, 2, 0]);
}
