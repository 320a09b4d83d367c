//! Ring arithmetic for the multi-key layer.
//!
//! - **Modular arithmetic** over Z_q (`modular`) and Montgomery/NTT tables (`ntt`)
//! - **RNS polynomials** and their wire codec (`poly`)
//! - **Ring contexts** for the Q chain, the P chain and QP elements (`ring`)
//! - **Sampling** of ternary secrets, Gaussian errors and uniform elements (`sampler`)
//!
//! # Example
//!
//! ```
//! use mkckks::math::Ring;
//!
//! let ring = Ring::new(16, &[0x3fffffffd60001]).unwrap();
//! let one = ring.from_signed(&[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0], 0);
//! assert_eq!(ring.mul(&one, &one), one);
//! ```

pub mod modular;
pub mod ntt;
pub mod poly;
pub mod ring;
pub mod sampler;

pub use modular::ModQ;
pub use ntt::NttContext;
pub use poly::RnsPoly;
pub use ring::{PolyQp, Ring, RingQp};
pub use sampler::{GaussianSampler, TernarySampler, DEFAULT_SIGMA};
