//! Scalar arithmetic over Z_q for the slow paths (gadget constants, Galois
//! elements, centered lifts). Hot loops use the Montgomery routines in `ntt`.

/// Modular arithmetic operations over Z_q
pub struct ModQ;

impl ModQ {
    #[inline]
    pub fn add(a: u64, b: u64, q: u64) -> u64 {
        ((a as u128 + b as u128) % q as u128) as u64
    }

    #[inline]
    pub fn sub(a: u64, b: u64, q: u64) -> u64 {
        if a >= b {
            a - b
        } else {
            q - (b - a)
        }
    }

    #[inline]
    pub fn mul(a: u64, b: u64, q: u64) -> u64 {
        ((a as u128 * b as u128) % q as u128) as u64
    }

    #[inline]
    pub fn negate(a: u64, q: u64) -> u64 {
        if a == 0 {
            0
        } else {
            q - a
        }
    }

    /// Convert a signed integer to its representation in Z_q
    #[inline]
    pub fn from_signed(val: i64, q: u64) -> u64 {
        if val >= 0 {
            (val as u64) % q
        } else {
            Self::negate(val.unsigned_abs() % q, q)
        }
    }

    /// Convert from Z_q to the centered representative in (-q/2, q/2]
    #[inline]
    pub fn to_signed(val: u64, q: u64) -> i64 {
        if val <= q / 2 {
            val as i64
        } else {
            -((q - val) as i64)
        }
    }

    /// Product of `factors` reduced modulo `q`.
    pub fn product(factors: &[u64], q: u64) -> u64 {
        factors
            .iter()
            .fold(1 % q, |acc, &f| Self::mul(acc, f % q, q))
    }

    pub fn pow(mut base: u64, mut exp: u64, q: u64) -> u64 {
        let mut result = 1 % q;
        base %= q;
        while exp > 0 {
            if exp & 1 == 1 {
                result = Self::mul(result, base, q);
            }
            base = Self::mul(base, base, q);
            exp >>= 1;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const Q: u64 = 0x3fffffffd60001;

    #[test]
    fn test_add_sub() {
        assert_eq!(ModQ::add(Q - 1, 2, Q), 1);
        assert_eq!(ModQ::sub(3, 10, Q), Q - 7);
    }

    #[test]
    fn test_signed_lift() {
        assert_eq!(ModQ::from_signed(-5, Q), Q - 5);
        assert_eq!(ModQ::from_signed(0, Q), 0);
        assert_eq!(ModQ::to_signed(Q - 5, Q), -5);
        assert_eq!(ModQ::to_signed(ModQ::from_signed(-123_456, Q), Q), -123_456);
    }

    #[test]
    fn test_product_and_pow() {
        assert_eq!(ModQ::product(&[3, 5, 7], 11), 105 % 11);
        assert_eq!(ModQ::product(&[], 11), 1);
        assert_eq!(ModQ::pow(5, 3, 64), 125 % 64);
    }
}
