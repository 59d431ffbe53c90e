//! RowBin codec: typed rows to and from the compressed, checksum-framed
//! native wire format.
//!
//! - `binary`: stateless read/write routines for the primitive encodings.
//! - `codec`: the per-column dispatch table and the row-level reader/writer.
//! - `compress`: block compression framing with integrity checksums.
//! - `pipe`: the bounded cross-thread byte pipe used on the write path.

pub mod binary;
pub mod codec;
pub mod compress;
pub mod pipe;

pub use codec::{FieldCodec, RowReader, RowWriter, build_codec};
pub use compress::{BlockReader, BlockWriter, CompressionMethod};
pub use pipe::{PipeOptions, PipeReader, PipeWriter, pipe};

pub use rowbin_common::{Result, error};
pub use rowbin_format as format;
pub use rowbin_values as values;
