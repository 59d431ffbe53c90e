use std::io::Write;
use std::net::{Ipv4Addr, Ipv6Addr};

use num_bigint::{BigInt, Sign};
use uuid::Uuid;

use rowbin_common::{Result, error::Error};
use rowbin_format::defs::MAX_VARINT_BYTES;

macro_rules! raw_write_fixed {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[inline]
            fn $name(&mut self, value: $ty) -> Result<()> {
                self.write_all_buf(&value.to_le_bytes())
            }
        )*
    };
}

/// Primitive encoding over any `Write`.
pub trait RawWrite: Write {
    fn write_all_buf(&mut self, buf: &[u8]) -> Result<()> {
        self.write_all(buf).map_err(|e| Error::io("write", e))
    }

    raw_write_fixed! {
        write_i8 => i8,
        write_i16 => i16,
        write_i32 => i32,
        write_i64 => i64,
        write_i128 => i128,
        write_u8 => u8,
        write_u16 => u16,
        write_u32 => u32,
        write_u64 => u64,
        write_u128 => u128,
        write_f32 => f32,
        write_f64 => f64,
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(value as u8)
    }

    /// Writes a LEB128 varint with the minimal byte count, capped at 9 bytes.
    fn write_varint(&mut self, mut value: u64) -> Result<()> {
        for _ in 0..MAX_VARINT_BYTES {
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                return self.write_u8(byte);
            }
            self.write_u8(byte | 0x80)?;
        }
        Ok(())
    }

    /// Writes a 32-byte little-endian two's-complement integer.
    fn write_i256(&mut self, value: &BigInt) -> Result<()> {
        let bytes = value.to_signed_bytes_le();
        if bytes.len() > 32 {
            return Err(Error::out_of_range("value", value, "Int256"));
        }
        let fill = if value.sign() == Sign::Minus { 0xFF } else { 0x00 };
        self.write_all_buf(&bytes)?;
        self.write_all_buf(&[fill; 32][..32 - bytes.len()])
    }

    /// Writes a 32-byte little-endian unsigned integer; negative values are
    /// out of range, never reinterpreted.
    fn write_u256(&mut self, value: &BigInt) -> Result<()> {
        let (sign, bytes) = value.to_bytes_le();
        if sign == Sign::Minus || bytes.len() > 32 {
            return Err(Error::out_of_range("value", value, "UInt256"));
        }
        self.write_all_buf(&bytes)?;
        self.write_all_buf(&[0u8; 32][..32 - bytes.len()])
    }

    /// Writes a varint-length-prefixed byte string.
    fn write_bin_string(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_varint(bytes.len() as u64)?;
        self.write_all_buf(bytes)
    }

    /// Writes exactly `len` bytes: the value zero-padded, never truncated.
    fn write_fixed_string(&mut self, bytes: &[u8], len: usize) -> Result<()> {
        if bytes.len() > len {
            return Err(Error::out_of_range(
                "value",
                format!("{} bytes", bytes.len()),
                format!("FixedString({len})"),
            ));
        }
        self.write_all_buf(bytes)?;
        for _ in bytes.len()..len {
            self.write_u8(0)?;
        }
        Ok(())
    }

    fn write_uuid(&mut self, value: Uuid) -> Result<()> {
        let (hi, lo) = value.as_u64_pair();
        self.write_u64(hi)?;
        self.write_u64(lo)
    }

    fn write_ipv4(&mut self, value: Ipv4Addr) -> Result<()> {
        self.write_u32(u32::from(value))
    }

    fn write_ipv6(&mut self, value: Ipv6Addr) -> Result<()> {
        self.write_all_buf(&value.octets())
    }

    fn write_point(&mut self, value: [f64; 2]) -> Result<()> {
        self.write_f64(value[0])?;
        self.write_f64(value[1])
    }
}

impl<W: Write + ?Sized> RawWrite for W {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::RawRead;

    #[test]
    fn varint_lengths_match_the_formula() {
        for (value, len) in [
            (0u64, 1usize),
            (127, 1),
            (128, 2),
            (16383, 2),
            ((1 << 31) - 1, 5),
            (1 << 32, 5),
            (u64::MAX >> 1, 9),
        ] {
            let mut out = Vec::new();
            out.write_varint(value).unwrap();
            assert_eq!(out.len(), len, "varint({value})");
            let mut input: &[u8] = &out;
            assert_eq!(input.read_varint().unwrap(), value);
        }
    }

    #[test]
    fn int256_round_trips_at_boundaries() {
        let values = [
            BigInt::ZERO,
            BigInt::from(-1),
            BigInt::from(i64::MAX),
            (BigInt::from(1) << 255) - 1,
            -(BigInt::from(1) << 255usize),
        ];
        for v in &values {
            let mut out = Vec::new();
            out.write_i256(v).unwrap();
            assert_eq!(out.len(), 32);
            let mut input: &[u8] = &out;
            assert_eq!(&input.read_i256().unwrap(), v);
        }
    }

    #[test]
    fn int256_overflow_is_rejected() {
        let mut out = Vec::new();
        assert!(out.write_i256(&(BigInt::from(1) << 255)).is_err());
        assert!(out.write_u256(&(BigInt::from(1) << 256)).is_err());
        assert!(out.write_u256(&BigInt::from(-1)).is_err());
        // Range checks happen before any byte is emitted.
        assert!(out.is_empty());
    }

    #[test]
    fn uint256_round_trips_unsigned() {
        let max = (BigInt::from(1) << 256) - 1;
        let mut out = Vec::new();
        out.write_u256(&max).unwrap();
        let mut input: &[u8] = &out;
        assert_eq!(input.read_u256().unwrap(), max);
    }

    #[test]
    fn fixed_string_pads_and_rejects() {
        let mut out = Vec::new();
        out.write_fixed_string(b"ab", 4).unwrap();
        assert_eq!(out, b"ab\0\0");
        assert!(Vec::new().write_fixed_string(b"abcde", 4).is_err());
    }

    #[test]
    fn ipv4_writes_reversed_octets() {
        let mut out = Vec::new();
        out.write_ipv4(Ipv4Addr::new(1, 2, 3, 4)).unwrap();
        assert_eq!(out, [4, 3, 2, 1]);
    }
}
