//! mkckks: key material and wire format for multi-key CKKS
//!
//! Every party encrypts under its own key. Ciphertexts and evaluation keys of
//! independent parties combine by party identifier, and decryption needs the
//! secrets of every party whose component is present (N-of-N).
//!
//! Key components:
//! - Parameters with the gadget sizing (gamma, alpha, beta) and the shared
//!   common reference string every party generates its keys against
//! - Secret, public, relinearization and rotation keys and their multi-party sets
//! - Multi-key ciphertexts as party-indexed maps of ring elements
//! - A canonical binary encoding for all of the above that detects truncation
//!   and trailing data

pub mod codec;
pub mod error;
pub mod params;
pub mod math;
pub mod rlwe;
pub mod ks;
pub mod mkrlwe;
pub mod mkckks;
pub mod store;

pub use codec::{BinaryCodec, Reader};
pub use error::{MkError, Result};

pub use mkckks::{Ciphertext, Decryptor, Encoder, Encryptor, Evaluator, Parameters, Plaintext};
pub use mkrlwe::{
    KeyGenerator, PartyId, PartyMap, PublicKey, RelinearizationKey, RelinearizationKeySet,
    RotationKey, RotationKeySet, SecretKey, SecretKeySet,
};
pub use params::ParametersLiteral;
pub use store::KeyStore;
