use std::io::Read;
use std::net::{Ipv4Addr, Ipv6Addr};

use num_bigint::{BigInt, Sign};
use uuid::Uuid;

use rowbin_common::{Result, error::Error};
use rowbin_format::defs::MAX_VARINT_BYTES;

macro_rules! raw_read_fixed {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[inline]
            fn $name(&mut self) -> Result<$ty> {
                let mut buf = [0u8; size_of::<$ty>()];
                self.read_exact_buf(&mut buf)?;
                Ok(<$ty>::from_le_bytes(buf))
            }
        )*
    };
}

/// Primitive decoding over any `Read`.
///
/// A short read anywhere inside a value is malformed input: the stream is
/// desynchronized and must be abandoned.
pub trait RawRead: Read {
    fn read_exact_buf(&mut self, buf: &mut [u8]) -> Result<()> {
        self.read_exact(buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::unexpected_eof("value")
            } else {
                Error::io("read", e)
            }
        })
    }

    raw_read_fixed! {
        read_i8 => i8,
        read_i16 => i16,
        read_i32 => i32,
        read_i64 => i64,
        read_i128 => i128,
        read_u8 => u8,
        read_u16 => u16,
        read_u32 => u32,
        read_u64 => u64,
        read_u128 => u128,
        read_f32 => f32,
        read_f64 => f64,
    }

    /// Reads a boolean byte; anything other than 0 or 1 is malformed.
    fn read_bool_strict(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(Error::invalid_data(
                "boolean",
                format!("unexpected byte {b:#04x}"),
            )),
        }
    }

    /// Reads a LEB128 varint, at most 9 bytes (the 9th byte's continuation
    /// bit is ignored, matching the server's cap).
    fn read_varint(&mut self) -> Result<u64> {
        let mut result = 0u64;
        for i in 0..MAX_VARINT_BYTES {
            let b = self.read_u8()?;
            result |= ((b & 0x7F) as u64) << (7 * i as u32);
            if b & 0x80 == 0 {
                break;
            }
        }
        Ok(result)
    }

    /// Reads a varint used as an element count or byte length.
    fn read_varint_len(&mut self) -> Result<usize> {
        let v = self.read_varint()?;
        v.try_into()
            .map_err(|_| Error::invalid_data("length", format!("{v} does not fit in usize")))
    }

    /// Reads a 32-byte little-endian two's-complement integer.
    fn read_i256(&mut self) -> Result<BigInt> {
        let mut buf = [0u8; 32];
        self.read_exact_buf(&mut buf)?;
        Ok(BigInt::from_signed_bytes_le(&buf))
    }

    /// Reads a 32-byte little-endian unsigned integer.
    fn read_u256(&mut self) -> Result<BigInt> {
        let mut buf = [0u8; 32];
        self.read_exact_buf(&mut buf)?;
        Ok(BigInt::from_bytes_le(Sign::Plus, &buf))
    }

    /// Reads `len` raw bytes into `buf` (replacing its contents) without
    /// trusting `len` for preallocation.
    fn read_bytes_into(&mut self, len: usize, buf: &mut Vec<u8>) -> Result<()> {
        buf.clear();
        let mut chunk = [0u8; 4096];
        let mut remaining = len;
        while remaining > 0 {
            let want = remaining.min(chunk.len());
            match self.read(&mut chunk[..want]) {
                Ok(0) => return Err(Error::unexpected_eof("value")),
                Ok(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    remaining -= n;
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::io("read", e)),
            }
        }
        Ok(())
    }

    /// Reads a varint-length-prefixed byte string into `buf`.
    fn read_bin_string_into(&mut self, buf: &mut Vec<u8>) -> Result<()> {
        let len = self.read_varint_len()?;
        self.read_bytes_into(len, buf)
    }

    fn read_uuid(&mut self) -> Result<Uuid> {
        let hi = self.read_u64()?;
        let lo = self.read_u64()?;
        Ok(Uuid::from_u64_pair(hi, lo))
    }

    /// IPv4 travels as its numeric value in little-endian, i.e. the four
    /// octets reversed.
    fn read_ipv4(&mut self) -> Result<Ipv4Addr> {
        Ok(Ipv4Addr::from(self.read_u32()?))
    }

    fn read_ipv6(&mut self) -> Result<Ipv6Addr> {
        let mut buf = [0u8; 16];
        self.read_exact_buf(&mut buf)?;
        Ok(Ipv6Addr::from(buf))
    }

    fn read_point(&mut self) -> Result<[f64; 2]> {
        Ok([self.read_f64()?, self.read_f64()?])
    }
}

impl<R: Read + ?Sized> RawRead for R {}
