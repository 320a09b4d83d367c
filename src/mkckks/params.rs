//! CKKS parameters on top of the multi-key RLWE parameters.
//!
//! # Wire format
//!
//! ```text
//! [4 bytes log slots][8 bytes default scale, f64][multi-key RLWE parameters]
//! ```

use byteorder::{BigEndian, WriteBytesExt};

use crate::codec::{BinaryCodec, Reader};
use crate::error::{MkError, Result};
use crate::mkrlwe;
use crate::params::ParametersLiteral;
use crate::rlwe;

#[derive(Clone, Debug, PartialEq)]
pub struct Parameters {
    mk: mkrlwe::Parameters,
    log_slots: u32,
    scale: f64,
}

impl Parameters {
    /// Validates `literal`, builds the rings and samples the default CRS.
    pub fn new(literal: &ParametersLiteral) -> Result<Self> {
        literal.validate()?;
        let base = rlwe::Parameters::new(
            literal.log_n,
            literal.q.clone(),
            literal.p.clone(),
            literal.sigma,
        )?;
        let mk = mkrlwe::Parameters::new(base, literal.gamma)?;
        Self::from_mk(mk, literal.log_slots, literal.scale)
    }

    /// Wraps existing multi-key parameters, sharing their CRS.
    pub fn from_mk(mk: mkrlwe::Parameters, log_slots: u32, scale: f64) -> Result<Self> {
        if log_slots >= u32::from(mk.log_n()) {
            return Err(MkError::InvalidConfig(format!(
                "log_slots {log_slots} exceeds log_n - 1 = {}",
                mk.log_n() - 1
            )));
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(MkError::InvalidConfig(format!("scale {scale}")));
        }
        Ok(Self {
            mk,
            log_slots,
            scale,
        })
    }

    pub fn mk(&self) -> &mkrlwe::Parameters {
        &self.mk
    }

    pub fn log_slots(&self) -> u32 {
        self.log_slots
    }

    pub fn slots(&self) -> usize {
        1 << self.log_slots
    }

    /// Default encoding scale.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn log_n(&self) -> u8 {
        self.mk.log_n()
    }

    pub fn n(&self) -> usize {
        self.mk.n()
    }

    pub fn max_level(&self) -> usize {
        self.mk.max_level()
    }
}

impl BinaryCodec for Parameters {
    fn encoded_len(&self) -> usize {
        4 + 8 + self.mk.encoded_len()
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.write_u32::<BigEndian>(self.log_slots)?;
        buf.write_f64::<BigEndian>(self.scale)?;
        self.mk.encode_into(buf)
    }

    fn decode_from(reader: &mut Reader<'_>) -> Result<Self> {
        let log_slots = reader.read_u32()?;
        let scale = reader.read_f64()?;
        let mk = mkrlwe::Parameters::decode_from(reader)?;
        Self::from_mk(mk, log_slots, scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_literal() {
        let params = Parameters::new(&ParametersLiteral::toy()).unwrap();
        assert_eq!(params.n(), 32);
        assert_eq!(params.slots(), 16);
        assert_eq!(params.mk().alpha(), 1);
        assert_eq!(params.mk().beta(params.max_level()), 3);
        assert_eq!(params.scale(), (1u64 << 40) as f64);
    }

    #[test]
    fn test_roundtrip() {
        let params = Parameters::new(&ParametersLiteral::toy()).unwrap();
        params.mk().add_crs(3).unwrap();

        let bytes = params.to_bytes().unwrap();
        assert_eq!(bytes.len(), params.encoded_len());
        assert_eq!(&bytes[..4], &4u32.to_be_bytes());

        let decoded = Parameters::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, params);
        assert!(decoded.mk().has_crs(3));
    }

    #[test]
    fn test_rejects_bad_header() {
        let params = Parameters::new(&ParametersLiteral::toy()).unwrap();
        let mut bytes = params.to_bytes().unwrap();
        bytes[..4].copy_from_slice(&5u32.to_be_bytes());
        assert!(matches!(
            Parameters::from_bytes(&bytes),
            Err(MkError::InvalidConfig(_))
        ));

        assert!(matches!(
            Parameters::from_bytes(&bytes[..10]),
            Err(MkError::Truncated { .. })
        ));
    }

    #[test]
    fn test_corrupted_fields_detected() {
        let params = Parameters::new(&ParametersLiteral::toy()).unwrap();
        let bytes = params.to_bytes().unwrap();
        let corrupt = |offset: usize, field: &[u8]| {
            let mut b = bytes.clone();
            b[offset..offset + field.len()].copy_from_slice(field);
            Parameters::from_bytes(&b)
        };

        // [logSlots][scale][ring blob length][log_n][#q][#p][sigma][q...][p...]
        for log_slots in [5, u32::MAX - 1, u32::MAX] {
            assert!(matches!(
                corrupt(0, &log_slots.to_be_bytes()),
                Err(MkError::InvalidConfig(_))
            ));
        }
        for scale in [f64::NAN, f64::INFINITY, 0.0, -1.0] {
            assert!(matches!(
                corrupt(4, &scale.to_be_bytes()),
                Err(MkError::InvalidConfig(_))
            ));
        }
        assert!(corrupt(12, &u32::MAX.to_be_bytes()).is_err());
        assert!(corrupt(16, &[2]).is_err());
        assert!(corrupt(16, &[6]).is_err());

        let q = params.mk().ring_q().moduli();
        let q0_offset = 16 + 3 + 8;
        // duplicated modulus
        assert!(matches!(
            corrupt(q0_offset, &q[1].to_be_bytes()),
            Err(MkError::InvalidConfig(_))
        ));
        // modulus that is not NTT-friendly for this degree
        assert!(corrupt(q0_offset, &(q[0] + 2).to_be_bytes()).is_err());

        // first residue of the first CRS entry: [count][index][beta][log_n][rows][flags]
        let ring_len = u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]) as usize;
        let residue = 16 + ring_len + 4 + 4 + 1 + 3;
        assert!(Parameters::from_bytes(&bytes).is_ok());
        for value in [q[0], u64::MAX] {
            assert!(matches!(
                corrupt(residue, &value.to_be_bytes()),
                Err(MkError::Corrupted(_))
            ));
        }
    }
}
