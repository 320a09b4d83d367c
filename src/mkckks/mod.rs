//! Multi-key CKKS: parameters with slots and scale, ciphertexts indexed by
//! party, and the encode/encrypt/decrypt/evaluate pipeline around them.
//!
//! # Example
//!
//! ```
//! use mkckks::mkckks::{Decryptor, Encoder, Encryptor, Evaluator, Parameters};
//! use mkckks::mkrlwe::{KeyGenerator, SecretKeySet};
//! use mkckks::params::ParametersLiteral;
//!
//! let params = Parameters::new(&ParametersLiteral::toy()).unwrap();
//! let mut kg = KeyGenerator::new(params.mk());
//! let (sk_a, pk_a) = kg.gen_key_pair("alice").unwrap();
//! let (sk_b, pk_b) = kg.gen_key_pair("bob").unwrap();
//!
//! let encoder = Encoder::new(&params);
//! let ct_a = Encryptor::new(&params, &pk_a).unwrap()
//!     .encrypt(&encoder.encode(&[1.0, 2.0]).unwrap())
//!     .unwrap();
//! let ct_b = Encryptor::new(&params, &pk_b).unwrap()
//!     .encrypt(&encoder.encode(&[0.5, -1.0]).unwrap())
//!     .unwrap();
//!
//! let sum = Evaluator::new(&params).add_new(&ct_a, &ct_b).unwrap();
//! let keys: SecretKeySet = [sk_a, sk_b].into_iter().collect();
//! let out = encoder.decode(&Decryptor::new(&params).decrypt(&sum, &keys).unwrap());
//! assert!((out[0] - 1.5).abs() < 1e-6);
//! assert!((out[1] - 1.0).abs() < 1e-6);
//! ```

mod ciphertext;
mod decryptor;
mod encoder;
mod encryptor;
mod evaluator;
mod params;

pub use ciphertext::{Ciphertext, CIPHERTEXT_HEADER_LEN};
pub use decryptor::Decryptor;
pub use encoder::{Encoder, Plaintext};
pub use encryptor::Encryptor;
pub use evaluator::Evaluator;
pub use params::Parameters;
