//! Arbitrary-precision scaled decimals.
//!
//! A `Decimal` is an unscaled integer mantissa plus a decimal scale; the wire
//! carries the mantissa only, rescaled to the column's declared scale. The
//! internal scale may differ from the column's: rescaling multiplies by a
//! power of ten (or divides, truncating toward zero, when narrowing), and the
//! fixed-width range check happens at encode time, not here.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};

use rowbin_common::{Result, error::Error};

/// Returns `10^exp` as a big integer.
pub fn pow10(exp: u32) -> BigInt {
    num_traits::pow(BigInt::from(10), exp as usize)
}

#[derive(Debug, Clone)]
pub struct Decimal {
    mantissa: BigInt,
    scale: u32,
}

impl Decimal {
    pub fn new(mantissa: impl Into<BigInt>, scale: u32) -> Decimal {
        Decimal {
            mantissa: mantissa.into(),
            scale,
        }
    }

    pub fn zero(scale: u32) -> Decimal {
        Decimal::new(0, scale)
    }

    pub fn mantissa(&self) -> &BigInt {
        &self.mantissa
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    /// The mantissa this decimal would have at `scale`. Widening multiplies
    /// by a power of ten; narrowing divides, truncating toward zero (the
    /// fractional tail is dropped, the integral part never is).
    pub fn scaled_mantissa(&self, scale: u32) -> BigInt {
        if scale >= self.scale {
            &self.mantissa * pow10(scale - self.scale)
        } else {
            &self.mantissa / pow10(self.scale - scale)
        }
    }

    /// This value re-expressed at `scale`.
    pub fn rescaled(&self, scale: u32) -> Decimal {
        Decimal::new(self.scaled_mantissa(scale), scale)
    }

    pub fn to_f64(&self) -> f64 {
        let m = self.mantissa.to_f64().unwrap_or(f64::NAN);
        m / 10f64.powi(self.scale as i32)
    }

    pub fn from_f64(value: f64, scale: u32) -> Result<Decimal> {
        if !value.is_finite() {
            return Err(Error::invalid_arg("value", "not a finite number"));
        }
        format!("{:.*}", scale as usize, value).parse()
    }

    /// Truncated integral part of the value.
    pub fn to_bigint(&self) -> BigInt {
        self.scaled_mantissa(0)
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Decimal) -> bool {
        // Numeric equality: 12.30 == 12.3.
        let scale = self.scale.max(other.scale);
        self.scaled_mantissa(scale) == other.scaled_mantissa(scale)
    }
}

impl Eq for Decimal {}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let sign = if self.mantissa.is_negative() { "-" } else { "" };
        let mut digits = self.mantissa.magnitude().to_string();
        if digits.len() <= self.scale as usize {
            let pad = self.scale as usize + 1 - digits.len();
            digits.insert_str(0, &"0".repeat(pad));
        }
        let point = digits.len() - self.scale as usize;
        write!(f, "{sign}{}.{}", &digits[..point], &digits[point..])
    }
}

impl FromStr for Decimal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Decimal> {
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        let digits: String = [int_part, frac_part].concat();
        let body = digits.strip_prefix(['-', '+']).unwrap_or(&digits);
        if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::invalid_arg("value", format!("not a decimal: '{s}'")));
        }
        let mantissa = BigInt::parse_bytes(digits.as_bytes(), 10)
            .ok_or_else(|| Error::invalid_arg("value", format!("not a decimal: '{s}'")))?;
        Ok(Decimal::new(mantissa, frac_part.len() as u32))
    }
}

impl From<i64> for Decimal {
    fn from(v: i64) -> Decimal {
        Decimal::new(v, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_render() {
        let d: Decimal = "12.345".parse().unwrap();
        assert_eq!(d.mantissa(), &BigInt::from(12345));
        assert_eq!(d.scale(), 3);
        assert_eq!(d.to_string(), "12.345");

        assert_eq!("-0.005".parse::<Decimal>().unwrap().to_string(), "-0.005");
        assert_eq!("42".parse::<Decimal>().unwrap().to_string(), "42");
        assert!("".parse::<Decimal>().is_err());
        assert!("1.2.3".parse::<Decimal>().is_err());
        assert!("12a".parse::<Decimal>().is_err());
    }

    #[test]
    fn rescale_widens_and_truncates() {
        let d: Decimal = "12.345".parse().unwrap();
        assert_eq!(d.scaled_mantissa(5), BigInt::from(1234500));
        assert_eq!(d.scaled_mantissa(3), BigInt::from(12345));
        // Narrowing drops the fractional tail, toward zero.
        assert_eq!(d.scaled_mantissa(1), BigInt::from(123));
        assert_eq!(
            "-12.345".parse::<Decimal>().unwrap().scaled_mantissa(1),
            BigInt::from(-123)
        );
    }

    #[test]
    fn numeric_equality() {
        let a: Decimal = "12.30".parse().unwrap();
        let b: Decimal = "12.3".parse().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, "12.31".parse().unwrap());
    }

    #[test]
    fn from_f64_rounds_at_scale() {
        assert_eq!(
            Decimal::from_f64(1.005, 2).unwrap(),
            // Binary 1.005 is slightly below the decimal one; formatting at
            // two digits keeps whatever the nearest representation was.
            format!("{:.2}", 1.005f64).parse().unwrap()
        );
        assert_eq!(Decimal::from_f64(2.5, 1).unwrap().to_string(), "2.5");
        assert!(Decimal::from_f64(f64::NAN, 2).is_err());
    }
}
