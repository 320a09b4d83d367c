//! Multi-key RLWE: shared parameters with their common reference string,
//! per-party keys and the key sets an evaluator assembles from them.
//!
//! # Overview
//!
//! - [`Parameters`] fixes the ring, the gadget (`gamma`, `alpha`, `beta`) and
//!   holds the CRS, which is generated once and then shipped with the
//!   parameter encoding
//! - [`KeyGenerator`] derives a party's [`SecretKey`], [`PublicKey`],
//!   [`RelinearizationKey`] and [`RotationKey`]s against that CRS
//! - [`SecretKeySet`], [`RelinearizationKeySet`] and [`RotationKeySet`] collect
//!   keys of many parties; asking for an absent party is a typed error
//!
//! # Example
//!
//! ```
//! use mkckks::mkrlwe::{KeyGenerator, Parameters, SecretKeySet};
//! use mkckks::rlwe;
//!
//! let base = rlwe::Parameters::new(
//!     4,
//!     vec![0x3fffffffd60001],
//!     vec![0x7ffffffffe70001, 0x7ffffffffe10001],
//!     3.2,
//! )
//! .unwrap();
//! let params = Parameters::new(base, 2).unwrap();
//! let mut kg = KeyGenerator::new(&params);
//!
//! let (sk, _pk) = kg.gen_key_pair("alice").unwrap();
//! let mut set = SecretKeySet::new();
//! set.add(sk);
//! assert!(set.get("alice").is_ok());
//! assert!(set.get("bob").is_err());
//! ```

pub mod crs;
mod key_sets;
mod keygen;
mod keys;
mod params;
mod party;

pub use crs::{
    default_crs_indices, default_rotation_indices, CrsStore, AUX_RELIN_CRS_IDX,
    CONJUGATION_CRS_IDX, RELIN_AUX_CRS_IDX, RELIN_CRS_IDX,
};
pub use key_sets::{
    KeySet, PartyKey, RelinearizationKeySet, RotationKeySet, SecretKeySet,
};
pub use keygen::KeyGenerator;
pub use keys::{PublicKey, RelinearizationKey, RotationKey, SecretKey};
pub use params::Parameters;
pub use party::{PartyId, PartyMap};
