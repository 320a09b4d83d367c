//! RNS polynomials over R_Q = Z_Q[X]/(X^n + 1).
//!
//! A polynomial is stored row by row: row `i` holds the `n` residues modulo
//! the `i`-th modulus of its chain. The polynomial does not carry the moduli
//! themselves; arithmetic goes through a [`Ring`](super::ring::Ring) that owns
//! them, the same way a key or ciphertext only makes sense next to its
//! parameters.
//!
//! # Wire format
//!
//! ```text
//! [1 byte  log2(n)]
//! [1 byte  row count]
//! [1 byte  flags: bit 0 = NTT domain, bit 1 = Montgomery form]
//! [rows × n × 8 bytes, big-endian coefficients]
//! ```
//!
//! The three leading bytes are the metadata counted by
//! [`RnsPoly::data_len`] when `with_metadata` is set.

use std::fmt;

use byteorder::{BigEndian, WriteBytesExt};
use zeroize::Zeroize;

use crate::codec::{write_u8_len, BinaryCodec, Reader};
use crate::error::{malformed, Result};

/// Largest ring degree exponent the codec accepts.
pub const MAX_LOG_N: u8 = 17;

/// Metadata bytes preceding the coefficients.
pub const POLY_METADATA_LEN: usize = 3;

const FLAG_NTT: u8 = 0b01;
const FLAG_MFORM: u8 = 0b10;

#[derive(Clone, PartialEq, Eq)]
pub struct RnsPoly {
    coeffs: Vec<Vec<u64>>,
    is_ntt: bool,
    is_mform: bool,
}

impl RnsPoly {
    /// Zero polynomial of degree `n` with `rows` residue rows.
    pub fn zero(n: usize, rows: usize) -> Self {
        assert!(n.is_power_of_two(), "ring degree must be a power of two");
        assert!(rows > 0, "a polynomial needs at least one residue row");
        Self {
            coeffs: vec![vec![0; n]; rows],
            is_ntt: false,
            is_mform: false,
        }
    }

    /// Builds a polynomial from residue rows in the coefficient domain.
    ///
    /// # Panics
    ///
    /// Panics if `rows` is empty or the rows differ in length or the length is
    /// not a power of two.
    pub fn from_rows(rows: Vec<Vec<u64>>) -> Self {
        assert!(!rows.is_empty(), "a polynomial needs at least one residue row");
        let n = rows[0].len();
        assert!(n.is_power_of_two(), "ring degree must be a power of two");
        assert!(
            rows.iter().all(|r| r.len() == n),
            "all residue rows must have the same length"
        );
        Self {
            coeffs: rows,
            is_ntt: false,
            is_mform: false,
        }
    }

    /// Ring degree n.
    pub fn degree(&self) -> usize {
        self.coeffs[0].len()
    }

    /// Index of the last residue row.
    pub fn level(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn row_count(&self) -> usize {
        self.coeffs.len()
    }

    pub fn row(&self, i: usize) -> &[u64] {
        &self.coeffs[i]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [u64] {
        &mut self.coeffs[i]
    }

    pub fn rows(&self) -> &[Vec<u64>] {
        &self.coeffs
    }

    pub fn is_ntt(&self) -> bool {
        self.is_ntt
    }

    pub fn is_mform(&self) -> bool {
        self.is_mform
    }

    pub(crate) fn set_ntt(&mut self, is_ntt: bool) {
        self.is_ntt = is_ntt;
    }

    pub(crate) fn set_mform(&mut self, is_mform: bool) {
        self.is_mform = is_mform;
    }

    /// Same shape and representation flags as `other`.
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        self.degree() == other.degree()
            && self.row_count() == other.row_count()
            && self.is_ntt == other.is_ntt
            && self.is_mform == other.is_mform
    }

    /// Drops residue rows above `level`.
    pub fn truncate_level(&mut self, level: usize) {
        self.coeffs.truncate(level + 1);
    }

    /// Encoded size, optionally including the three metadata bytes.
    pub fn data_len(&self, with_metadata: bool) -> usize {
        let payload = 8 * self.row_count() * self.degree();
        if with_metadata {
            payload + POLY_METADATA_LEN
        } else {
            payload
        }
    }

    fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.is_ntt {
            flags |= FLAG_NTT;
        }
        if self.is_mform {
            flags |= FLAG_MFORM;
        }
        flags
    }
}

impl BinaryCodec for RnsPoly {
    fn encoded_len(&self) -> usize {
        self.data_len(true)
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.write_u8(self.degree().trailing_zeros() as u8)?;
        write_u8_len(buf, self.row_count(), "residue row count")?;
        buf.write_u8(self.flags())?;
        for row in &self.coeffs {
            for &c in row {
                buf.write_u64::<BigEndian>(c)?;
            }
        }
        Ok(())
    }

    fn decode_from(reader: &mut Reader<'_>) -> Result<Self> {
        let log_n = reader.read_u8()?;
        if log_n > MAX_LOG_N {
            return Err(malformed!("ring degree exponent {log_n} exceeds {MAX_LOG_N}"));
        }
        let rows = reader.read_u8()? as usize;
        if rows == 0 {
            return Err(malformed!("polynomial with zero residue rows"));
        }
        let flags = reader.read_u8()?;
        if flags & !(FLAG_NTT | FLAG_MFORM) != 0 {
            return Err(malformed!("unknown polynomial flags {flags:#04x}"));
        }

        let n = 1usize << log_n;
        let payload = reader.read_bytes(8 * n * rows)?;
        let coeffs = payload
            .chunks_exact(8 * n)
            .map(|row| {
                row.chunks_exact(8)
                    .map(|c| u64::from_be_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                    .collect()
            })
            .collect();

        Ok(Self {
            coeffs,
            is_ntt: flags & FLAG_NTT != 0,
            is_mform: flags & FLAG_MFORM != 0,
        })
    }
}

impl Zeroize for RnsPoly {
    fn zeroize(&mut self) {
        for row in self.coeffs.iter_mut() {
            row.as_mut_slice().zeroize();
        }
    }
}

impl fmt::Debug for RnsPoly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RnsPoly")
            .field("degree", &self.degree())
            .field("level", &self.level())
            .field("is_ntt", &self.is_ntt)
            .field("is_mform", &self.is_mform)
            .finish()
    }
}
