//! Single-key RLWE building blocks shared by the multi-key layer.
//!
//! # Overview
//!
//! - [`Parameters`]: ring degree n = 2^log_n, the ciphertext chain Q, the
//!   key-switching chain P and the error width sigma
//! - Galois elements: rotations by k use τ_{5^k}, conjugation uses τ_{2n-1}
//!
//! # Example
//!
//! ```
//! use mkckks::rlwe::{galois_element_for_rotation, Parameters};
//!
//! let params = Parameters::new(4, vec![0x3fffffffd60001], vec![0x7ffffffffe70001], 3.2).unwrap();
//! assert_eq!(params.n(), 16);
//! assert_eq!(galois_element_for_rotation(1, params.n()), 5);
//! ```

mod galois;
mod params;

pub use galois::{
    automorphism_order, galois_element_for_conjugation, galois_element_for_rotation,
    is_valid_galois_element, GALOIS_GEN,
};
pub use params::{Parameters, MAX_LOG_N, MIN_LOG_N};
