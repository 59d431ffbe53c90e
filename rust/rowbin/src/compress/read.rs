//! Block framing decoder.

use std::io::{BufRead, Read};

use super::CompressionMethod;
use rowbin_common::{Result, error::Error};
use rowbin_format::checksum;
use rowbin_format::defs::{BLOCK_SUBHEADER_SIZE, CHECKSUM_SIZE, MAX_BLOCK_SIZE};

/// Reads a stream of framed blocks, fully verifying and decompressing each
/// one before exposing any of its bytes.
///
/// A clean end of input at a block boundary is EOF; anything else mid-block
/// is malformed, and a checksum mismatch is fatal corruption.
pub struct BlockReader<R: Read> {
    source: R,
    block: Vec<u8>,
    pos: usize,
    eof: bool,
    blocks_read: u64,
}

impl<R: Read> BlockReader<R> {
    pub fn new(source: R) -> BlockReader<R> {
        BlockReader {
            source,
            block: Vec::new(),
            pos: 0,
            eof: false,
            blocks_read: 0,
        }
    }

    pub fn blocks_read(&self) -> u64 {
        self.blocks_read
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    /// Loads and verifies the next block; `false` on clean end of stream.
    fn load_block(&mut self) -> Result<bool> {
        let mut header = [0u8; CHECKSUM_SIZE + BLOCK_SUBHEADER_SIZE];
        if !self.read_header(&mut header)? {
            self.eof = true;
            return Ok(false);
        }

        let method = CompressionMethod::from_magic(header[CHECKSUM_SIZE])?;
        let compressed_incl = u32::from_le_bytes(
            header[CHECKSUM_SIZE + 1..CHECKSUM_SIZE + 5]
                .try_into()
                .expect("size bytes"),
        ) as usize;
        let uncompressed = u32::from_le_bytes(
            header[CHECKSUM_SIZE + 5..CHECKSUM_SIZE + 9]
                .try_into()
                .expect("size bytes"),
        ) as usize;
        if compressed_incl < BLOCK_SUBHEADER_SIZE
            || compressed_incl - BLOCK_SUBHEADER_SIZE > MAX_BLOCK_SIZE
            || uncompressed > MAX_BLOCK_SIZE
        {
            return Err(Error::invalid_data(
                "block",
                format!("insane block sizes: {compressed_incl}/{uncompressed}"),
            ));
        }
        let payload_len = compressed_incl - BLOCK_SUBHEADER_SIZE;

        // Reassemble subheader + payload so the checksum covers the framed
        // bytes exactly as written.
        let mut body = Vec::with_capacity(compressed_incl);
        body.extend_from_slice(&header[CHECKSUM_SIZE..]);
        let read = self
            .source
            .by_ref()
            .take(payload_len as u64)
            .read_to_end(&mut body)
            .map_err(|e| Error::io("read block", e))?;
        if read != payload_len {
            return Err(Error::unexpected_eof("block"));
        }

        let digest: [u8; CHECKSUM_SIZE] =
            header[..CHECKSUM_SIZE].try_into().expect("checksum bytes");
        checksum::validate_buffer(&body, &digest, Some("block"))?;

        let payload = &body[BLOCK_SUBHEADER_SIZE..];
        self.block = match method {
            CompressionMethod::None => payload.to_vec(),
            CompressionMethod::Lz4 => lz4::block::decompress(payload, Some(uncompressed as i32))
                .map_err(|e| Error::invalid_data("block", e.to_string()))?,
            CompressionMethod::Zstd => zstd::bulk::decompress(payload, uncompressed)
                .map_err(|e| Error::invalid_data("block", e.to_string()))?,
        };
        if self.block.len() != uncompressed {
            return Err(Error::invalid_data(
                "block",
                format!(
                    "declared {} uncompressed bytes, got {}",
                    uncompressed,
                    self.block.len()
                ),
            ));
        }
        self.pos = 0;
        self.blocks_read += 1;
        Ok(true)
    }

    /// Reads the fixed-size block header; `false` when the stream ends
    /// cleanly before its first byte.
    fn read_header(&mut self, header: &mut [u8]) -> Result<bool> {
        let mut filled = 0;
        while filled < header.len() {
            let n = self
                .source
                .read(&mut header[filled..])
                .map_err(|e| Error::io("read block header", e))?;
            if n == 0 {
                if filled == 0 {
                    return Ok(false);
                }
                return Err(Error::unexpected_eof("block header"));
            }
            filled += n;
        }
        Ok(true)
    }
}

impl<R: Read> Read for BlockReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl<R: Read> BufRead for BlockReader<R> {
    fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
        while self.pos == self.block.len() {
            if self.eof || !self.load_block()? {
                return Ok(&[]);
            }
        }
        Ok(&self.block[self.pos..])
    }

    fn consume(&mut self, amt: usize) {
        self.pos = (self.pos + amt).min(self.block.len());
    }
}
