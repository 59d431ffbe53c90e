//! The polymorphic value model of the RowBin codec.
//!
//! One [`Value`] slot is created per column of a streaming pass and reused
//! across rows: deserialization writes into the slot, `update` coerces a raw
//! payload into the slot's kind in place, and serialization reads without
//! mutating. Slots are not thread-safe; each consumer owns its own.

pub mod bitmap;
pub mod decimal;
mod literal;
pub mod value;

pub use bitmap::Bitmap;
pub use decimal::Decimal;
pub use value::{MultiPolygon, Point, Polygon, Ring, Value, ValueData};
