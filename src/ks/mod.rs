//! Key-switching material.
//!
//! # Overview
//!
//! A switching key from s' to s is a vector of gadget encryptions
//! ```text
//! K = [K_0, ..., K_{beta-1}],   K_i = -s·a_i + e_i + g_i·s'
//! ```
//! over the joint modulus Q·P. Multi-key CKKS shares the `a_i` between all
//! parties through the common reference string, so a party publishes only the
//! `K_i` and every party's key lines up with every other party's.
//!
//! [`GadgetDecomposition`] fixes the vector length from the P chain and gamma;
//! [`SwitchingKey`] is the stored vector and its wire codec.

mod gadget;
mod switching_key;

pub use gadget::GadgetDecomposition;
pub use switching_key::{generate_switching_key, SwitchingKey};
