//! Compressed block framing.
//!
//! Each block on the wire is `[16B checksum][1B method magic][4B LE
//! compressed size incl. this 9-byte subheader][4B LE uncompressed size]
//! [payload]`. The checksum covers everything after itself. Corruption is
//! fatal: a block either verifies and decompresses whole, or the stream dies.

mod read;
mod write;

pub use read::BlockReader;
pub use write::BlockWriter;

use rowbin_common::{Result, error::Error};
use rowbin_format::defs::{METHOD_MAGIC_LZ4, METHOD_MAGIC_NONE, METHOD_MAGIC_ZSTD};

/// Block payload compression method, identified by the magic byte after the
/// checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionMethod {
    /// Payload stored verbatim.
    None,
    #[default]
    Lz4,
    Zstd,
}

impl CompressionMethod {
    pub fn magic(&self) -> u8 {
        match self {
            CompressionMethod::None => METHOD_MAGIC_NONE,
            CompressionMethod::Lz4 => METHOD_MAGIC_LZ4,
            CompressionMethod::Zstd => METHOD_MAGIC_ZSTD,
        }
    }

    pub fn from_magic(magic: u8) -> Result<CompressionMethod> {
        match magic {
            METHOD_MAGIC_NONE => Ok(CompressionMethod::None),
            METHOD_MAGIC_LZ4 => Ok(CompressionMethod::Lz4),
            METHOD_MAGIC_ZSTD => Ok(CompressionMethod::Zstd),
            other => Err(Error::invalid_data(
                "block",
                format!("unknown compression magic {other:#04x}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    fn roundtrip(method: CompressionMethod, data: &[u8], block_size: usize) -> Vec<u8> {
        let mut writer = BlockWriter::with_block_size(Vec::new(), method, block_size).unwrap();
        writer.write_all(data).unwrap();
        let framed = writer.finish().unwrap();

        let mut out = Vec::new();
        BlockReader::new(&framed[..])
            .read_to_end(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn all_methods_roundtrip() {
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        for method in [
            CompressionMethod::None,
            CompressionMethod::Lz4,
            CompressionMethod::Zstd,
        ] {
            // Forces multiple blocks plus a short partial tail.
            assert_eq!(roundtrip(method, &data, 1 << 14), data, "{method:?}");
            assert_eq!(roundtrip(method, b"x", 1 << 14), b"x", "{method:?}");
        }
    }

    #[test]
    fn random_data_roundtrips() {
        let mut rng = fastrand::Rng::with_seed(0x0bb1);
        let data: Vec<u8> = (0..65537).map(|_| rng.u8(..)).collect();
        assert_eq!(roundtrip(CompressionMethod::Lz4, &data, 4096), data);
    }

    #[test]
    fn magic_bytes_are_stable() {
        assert_eq!(CompressionMethod::Lz4.magic(), 0x82);
        assert_eq!(CompressionMethod::Zstd.magic(), 0x90);
        assert_eq!(CompressionMethod::None.magic(), 0x02);
        assert!(CompressionMethod::from_magic(0x55).is_err());
    }
}
