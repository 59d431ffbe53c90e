//! Stateless read/write routines for the primitive binary encodings:
//! little-endian fixed widths, LEB128 varints, 256-bit integers, strings and
//! the small network/geo shapes.

mod read;
mod write;

pub use read::RawRead;
pub use write::RawWrite;
