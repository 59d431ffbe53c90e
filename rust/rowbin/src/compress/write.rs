//! Block framing encoder.

use std::io::Write;

use super::CompressionMethod;
use rowbin_common::{Result, error::Error, verify_arg};
use rowbin_format::checksum;
use rowbin_format::defs::{
    BLOCK_OVERHEAD, BLOCK_SUBHEADER_SIZE, CHECKSUM_SIZE, DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE,
};

const ZSTD_LEVEL: i32 = 3;

/// Accumulates bytes into fixed-capacity blocks and emits each one
/// compressed, checksummed and framed.
///
/// A block is emitted when the buffer fills, on `flush`, and for a non-empty
/// partial buffer on `finish`. Dropping the writer without `finish` flushes
/// best-effort; errors at that point are only logged.
pub struct BlockWriter<W: Write> {
    sink: Option<W>,
    method: CompressionMethod,
    buf: Vec<u8>,
    block_size: usize,
}

impl<W: Write> BlockWriter<W> {
    pub fn new(sink: W, method: CompressionMethod) -> BlockWriter<W> {
        Self::with_block_size(sink, method, DEFAULT_BLOCK_SIZE).expect("default block size")
    }

    pub fn with_block_size(
        sink: W,
        method: CompressionMethod,
        block_size: usize,
    ) -> Result<BlockWriter<W>> {
        verify_arg!(block_size, block_size > 0 && block_size <= MAX_BLOCK_SIZE);
        Ok(BlockWriter {
            sink: Some(sink),
            method,
            buf: Vec::with_capacity(block_size),
            block_size,
        })
    }

    /// Lets the caller fill the block buffer in place at the current write
    /// offset, without an intermediate copy. The closure receives the spare
    /// capacity of the current block and returns how many bytes it produced,
    /// or `None` when it needs more room than offered; the writer then seals
    /// the current block and retries with a fresh one.
    pub fn write_direct(
        &mut self,
        fill: &mut dyn FnMut(&mut [u8]) -> Option<usize>,
    ) -> Result<usize> {
        loop {
            if self.buf.len() == self.block_size {
                self.flush_block()?;
            }
            let offset = self.buf.len();
            self.buf.resize(self.block_size, 0);
            let produced = fill(&mut self.buf[offset..]);
            match produced {
                Some(n) => {
                    verify_arg!(n, offset + n <= self.block_size);
                    self.buf.truncate(offset + n);
                    return Ok(n);
                }
                None => {
                    self.buf.truncate(offset);
                    if offset == 0 {
                        return Err(Error::invalid_arg(
                            "fill",
                            "needs more than a whole empty block",
                        ));
                    }
                    self.flush_block()?;
                }
            }
        }
    }

    /// Compresses and frames the buffered bytes as one block.
    fn flush_block(&mut self) -> Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let uncompressed = self.buf.len();
        let compressed = match self.method {
            CompressionMethod::None => self.buf.clone(),
            CompressionMethod::Lz4 => {
                lz4::block::compress(&self.buf, None, false).map_err(|e| Error::io("lz4", e))?
            }
            CompressionMethod::Zstd => zstd::bulk::compress(&self.buf, ZSTD_LEVEL)
                .map_err(|e| Error::io("zstd", e))?,
        };

        let mut frame = Vec::with_capacity(BLOCK_OVERHEAD + compressed.len());
        frame.extend_from_slice(&[0u8; CHECKSUM_SIZE]);
        frame.push(self.method.magic());
        frame.extend_from_slice(&((compressed.len() + BLOCK_SUBHEADER_SIZE) as u32).to_le_bytes());
        frame.extend_from_slice(&(uncompressed as u32).to_le_bytes());
        frame.extend_from_slice(&compressed);
        let digest = checksum::compute(&frame[CHECKSUM_SIZE..]);
        frame[..CHECKSUM_SIZE].copy_from_slice(&digest);

        log::trace!(
            "block out: {} -> {} bytes ({:?})",
            self.buf.len(),
            compressed.len(),
            self.method
        );
        self.sink
            .as_mut()
            .ok_or_else(|| Error::invalid_operation("write after finish"))?
            .write_all(&frame)
            .map_err(|e| Error::io("write block", e))?;
        self.buf.clear();
        Ok(())
    }

    /// Flushes any partial block and returns the underlying sink.
    pub fn finish(mut self) -> Result<W> {
        self.flush_block()?;
        let mut sink = self
            .sink
            .take()
            .ok_or_else(|| Error::invalid_operation("finish after finish"))?;
        sink.flush().map_err(|e| Error::io("flush", e))?;
        Ok(sink)
    }
}

impl<W: Write> Write for BlockWriter<W> {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        let mut remaining = data;
        while !remaining.is_empty() {
            let spare = self.block_size - self.buf.len();
            let take = spare.min(remaining.len());
            self.buf.extend_from_slice(&remaining[..take]);
            remaining = &remaining[take..];
            if self.buf.len() == self.block_size {
                self.flush_block()?;
            }
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_block()?;
        match self.sink.as_mut() {
            Some(sink) => sink.flush(),
            None => Ok(()),
        }
    }
}

impl<W: Write> Drop for BlockWriter<W> {
    fn drop(&mut self) {
        if self.sink.is_some() && !self.buf.is_empty() {
            log::warn!(
                "block writer dropped with {} unflushed bytes; call finish()",
                self.buf.len()
            );
            let _ = self.flush_block();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference frames captured from a real client stream: blockSize 2,
    // payload bytes written one at a time.
    const FRAME_12: &[u8] = &[
        0xDC, 0xAA, 0x1F, 0x71, 0x96, 0x2C, 0x63, 0x60, 0x70, 0xF9, 0x2F, 0x0F, 0xC1, 0x27, 0xB7,
        0x98, 0x82, 0x0C, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x20, 0x01, 0x02,
    ];
    const FRAME_3: &[u8] = &[
        0x40, 0xD9, 0x15, 0x32, 0xB3, 0x84, 0x19, 0x49, 0xC5, 0x09, 0x70, 0xDA, 0x0C, 0x63, 0x47,
        0x4A, 0x82, 0x0B, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x10, 0x03,
    ];

    #[test]
    fn emits_reference_frames() {
        let mut writer = BlockWriter::with_block_size(Vec::new(), CompressionMethod::Lz4, 2).unwrap();
        writer.write(&[1]).unwrap();
        assert!(writer.sink.as_ref().unwrap().is_empty());
        writer.write(&[2]).unwrap();
        assert_eq!(writer.sink.as_deref().unwrap(), FRAME_12);
        writer.write(&[3]).unwrap();
        assert_eq!(writer.sink.as_deref().unwrap(), FRAME_12);
        let out = writer.finish().unwrap();
        let expected: Vec<u8> = [FRAME_12, FRAME_3].concat();
        assert_eq!(out, expected);
    }

    #[test]
    fn empty_writer_emits_nothing() {
        let writer = BlockWriter::new(Vec::new(), CompressionMethod::Lz4);
        assert!(writer.finish().unwrap().is_empty());
    }

    #[test]
    fn flush_seals_a_partial_block() {
        let mut writer =
            BlockWriter::with_block_size(Vec::new(), CompressionMethod::None, 16).unwrap();
        writer.write(b"abc").unwrap();
        assert!(writer.sink.as_ref().unwrap().is_empty());
        Write::flush(&mut writer).unwrap();
        assert_eq!(writer.sink.as_ref().unwrap().len(), BLOCK_OVERHEAD + 3);
        // Flushing with nothing buffered emits nothing more.
        Write::flush(&mut writer).unwrap();
        assert_eq!(writer.sink.as_ref().unwrap().len(), BLOCK_OVERHEAD + 3);
        writer.finish().unwrap();
    }

    #[test]
    fn write_direct_fills_in_place_and_rolls_over() {
        let mut writer =
            BlockWriter::with_block_size(Vec::new(), CompressionMethod::None, 8).unwrap();
        writer.write(b"abcde").unwrap();
        // Needs 6 bytes: does not fit the 3 spare bytes, so the current block
        // is sealed and the fill retries against a fresh one.
        let mut calls = 0;
        let n = writer
            .write_direct(&mut |spare| {
                calls += 1;
                if spare.len() < 6 {
                    return None;
                }
                spare[..6].copy_from_slice(b"fghijk");
                Some(6)
            })
            .unwrap();
        assert_eq!(n, 6);
        assert_eq!(calls, 2);
        let framed = writer.finish().unwrap();
        let mut out = Vec::new();
        std::io::Read::read_to_end(&mut super::super::BlockReader::new(&framed[..]), &mut out)
            .unwrap();
        assert_eq!(out, b"abcdefghijk");
    }
}
