//! Wire-level constants of the RowBin format.

/// Size of the 128-bit block checksum.
pub const CHECKSUM_SIZE: usize = 16;

/// Size of the block subheader covered by the compressed-size field:
/// 1 byte method magic + 4 bytes compressed size + 4 bytes uncompressed size.
pub const BLOCK_SUBHEADER_SIZE: usize = 9;

/// Total framing overhead per compressed block.
pub const BLOCK_OVERHEAD: usize = CHECKSUM_SIZE + BLOCK_SUBHEADER_SIZE;

/// Method magic bytes, first byte after the checksum.
pub const METHOD_MAGIC_NONE: u8 = 0x02;
pub const METHOD_MAGIC_LZ4: u8 = 0x82;
pub const METHOD_MAGIC_ZSTD: u8 = 0x90;

/// Default uncompressed capacity of one block.
pub const DEFAULT_BLOCK_SIZE: usize = 1024 * 1024;

/// Upper bound on a single block's declared sizes; anything larger is treated
/// as corruption rather than an allocation request.
pub const MAX_BLOCK_SIZE: usize = 1 << 30;

/// Longest varint the codec reads or writes (7 payload bits per byte).
pub const MAX_VARINT_BYTES: usize = 9;

/// Highest cardinality still encoded with the inline small-set bitmap layout.
pub const BITMAP_SMALL_SET_MAX: u64 = 32;

/// Default segment size of the cross-thread piped stream.
pub const DEFAULT_PIPE_SEGMENT_SIZE: usize = 8192;

/// Default queue depth of the cross-thread piped stream.
pub const DEFAULT_PIPE_QUEUE_DEPTH: usize = 512;

/// Epoch-day bounds of the `Date32` wire type (1900-01-01 ..= 2299-12-31).
pub const DATE32_MIN_DAYS: i32 = -25567;
pub const DATE32_MAX_DAYS: i32 = 120529;

/// Epoch-second bounds of the `DateTime64` wire type
/// (1900-01-01T00:00:00 ..= 2299-12-31T23:59:59).
pub const DATETIME64_MIN_SECONDS: i64 = -2208988800;
pub const DATETIME64_MAX_SECONDS: i64 = 10413791999;

/// Maximum sub-second scale of `DateTime64`.
pub const DATETIME64_MAX_SCALE: u32 = 9;
