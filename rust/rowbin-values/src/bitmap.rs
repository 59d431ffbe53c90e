//! Bitmap aggregate state.
//!
//! The in-memory form of a bitmap-valued aggregate column. Elements of up to
//! four bytes live in a single roaring bitmap keyed by their sign-extended
//! 32-bit pattern; eight-byte elements live in a two-level map keyed by the
//! high 32 bits, each chunk a roaring bitmap of the low 32 bits. Element
//! width and signedness come from the column's declared base integer type,
//! never from the payload.
//!
//! The wire layouts (inline small set and serialized blob) are produced and
//! consumed by the codec crate; this module owns the container.

use std::collections::BTreeMap;

use roaring::RoaringBitmap;

use rowbin_common::{Result, error::Error, verify_arg};
use rowbin_format::TypeTag;

/// Physical representation, selected by the base type's width.
#[derive(Debug, Clone, PartialEq)]
pub enum BitmapRepr {
    /// Elements of 1, 2 or 4 bytes, as sign-extended 32-bit patterns.
    Plain(RoaringBitmap),
    /// 8-byte elements: high 32 bits -> bitmap of low 32 bits.
    Chunked(BTreeMap<u32, RoaringBitmap>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    base: TypeTag,
    repr: BitmapRepr,
}

impl Bitmap {
    /// An empty bitmap over the given base integer type.
    pub fn empty(base: TypeTag) -> Result<Bitmap> {
        let width = elem_width(base)?;
        let repr = if width == 8 {
            BitmapRepr::Chunked(BTreeMap::new())
        } else {
            BitmapRepr::Plain(RoaringBitmap::new())
        };
        Ok(Bitmap { base, repr })
    }

    /// Wraps an existing representation, verifying it agrees with the base
    /// type's width.
    pub fn from_repr(base: TypeTag, repr: BitmapRepr) -> Result<Bitmap> {
        let width = elem_width(base)?;
        match &repr {
            BitmapRepr::Plain(_) => verify_arg!(repr, width <= 4),
            BitmapRepr::Chunked(_) => verify_arg!(repr, width == 8),
        }
        Ok(Bitmap { base, repr })
    }

    pub fn of_u8(values: &[u8]) -> Bitmap {
        Self::collect(TypeTag::UInt8, values.iter().map(|&v| v as u64))
    }

    pub fn of_i8(values: &[i8]) -> Bitmap {
        Self::collect(TypeTag::Int8, values.iter().map(|&v| (v as i32) as u32 as u64))
    }

    pub fn of_u16(values: &[u16]) -> Bitmap {
        Self::collect(TypeTag::UInt16, values.iter().map(|&v| v as u64))
    }

    pub fn of_i16(values: &[i16]) -> Bitmap {
        Self::collect(TypeTag::Int16, values.iter().map(|&v| (v as i32) as u32 as u64))
    }

    pub fn of_u32(values: &[u32]) -> Bitmap {
        Self::collect(TypeTag::UInt32, values.iter().map(|&v| v as u64))
    }

    pub fn of_i32(values: &[i32]) -> Bitmap {
        Self::collect(TypeTag::Int32, values.iter().map(|&v| v as u32 as u64))
    }

    pub fn of_u64(values: &[u64]) -> Bitmap {
        Self::collect(TypeTag::UInt64, values.iter().copied())
    }

    pub fn of_i64(values: &[i64]) -> Bitmap {
        Self::collect(TypeTag::Int64, values.iter().map(|&v| v as u64))
    }

    fn collect(base: TypeTag, patterns: impl Iterator<Item = u64>) -> Bitmap {
        let mut bitmap = Bitmap::empty(base).expect("native integer base");
        for pattern in patterns {
            bitmap.insert(pattern).expect("pattern fits base width");
        }
        bitmap
    }

    pub fn base(&self) -> TypeTag {
        self.base
    }

    /// Byte width of one element on the wire.
    pub fn elem_width(&self) -> usize {
        elem_width(self.base).expect("validated on construction")
    }

    pub fn repr(&self) -> &BitmapRepr {
        &self.repr
    }

    pub fn cardinality(&self) -> u64 {
        match &self.repr {
            BitmapRepr::Plain(rb) => rb.len(),
            BitmapRepr::Chunked(chunks) => chunks.values().map(|rb| rb.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cardinality() == 0
    }

    /// Inserts one element given as its zero/sign-extended 64-bit pattern.
    pub fn insert(&mut self, pattern: u64) -> Result<()> {
        match &mut self.repr {
            BitmapRepr::Plain(rb) => {
                verify_arg!(pattern, pattern <= u32::MAX as u64);
                rb.insert(pattern as u32);
            }
            BitmapRepr::Chunked(chunks) => {
                chunks
                    .entry((pattern >> 32) as u32)
                    .or_default()
                    .insert(pattern as u32);
            }
        }
        Ok(())
    }

    pub fn contains(&self, pattern: u64) -> bool {
        match &self.repr {
            BitmapRepr::Plain(rb) => {
                pattern <= u32::MAX as u64 && rb.contains(pattern as u32)
            }
            BitmapRepr::Chunked(chunks) => chunks
                .get(&((pattern >> 32) as u32))
                .is_some_and(|rb| rb.contains(pattern as u32)),
        }
    }

    /// All elements as 64-bit patterns, in ascending unsigned order.
    pub fn to_patterns(&self) -> Vec<u64> {
        match &self.repr {
            BitmapRepr::Plain(rb) => rb.iter().map(|v| v as u64).collect(),
            BitmapRepr::Chunked(chunks) => chunks
                .iter()
                .flat_map(|(&high, rb)| {
                    rb.iter()
                        .map(move |low| ((high as u64) << 32) | low as u64)
                })
                .collect(),
        }
    }

    /// Renders a `bitmapBuild([...])` SQL expression producing this state.
    pub fn build_expression(&self) -> String {
        let base = self.base;
        let items = self
            .to_patterns()
            .iter()
            .map(|&p| format!("to{}({})", base.name(), render_elem(base, p)))
            .collect::<Vec<_>>()
            .join(",");
        if items.is_empty() {
            format!("bitmapBuild(cast([] as Array({})))", base.name())
        } else {
            format!("bitmapBuild([{items}])")
        }
    }
}

fn elem_width(base: TypeTag) -> Result<usize> {
    if !base.is_native_integer() {
        return Err(Error::unsupported_type(format!(
            "bitmap over {base}: only native integer base types are supported"
        )));
    }
    Ok(base.byte_width().expect("native integer width"))
}

fn render_elem(base: TypeTag, pattern: u64) -> String {
    if base.is_signed_integer() {
        match base.byte_width() {
            Some(8) => (pattern as i64).to_string(),
            _ => (pattern as u32 as i32).to_string(),
        }
    } else {
        pattern.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_signed_elements_are_sign_extended() {
        let bitmap = Bitmap::of_i8(&[-1, 3]);
        assert_eq!(bitmap.cardinality(), 2);
        assert!(bitmap.contains(3));
        assert!(bitmap.contains(0xFFFFFFFF));
        assert_eq!(bitmap.to_patterns(), vec![3, 0xFFFFFFFF]);
    }

    #[test]
    fn chunked_repr_splits_on_high_bits() {
        let bitmap = Bitmap::of_u64(&[1, 2, (5 << 32) | 7]);
        match bitmap.repr() {
            BitmapRepr::Chunked(chunks) => {
                assert_eq!(chunks.len(), 2);
                assert!(chunks[&0].contains(1) && chunks[&0].contains(2));
                assert!(chunks[&5].contains(7));
            }
            BitmapRepr::Plain(_) => panic!("expected chunked repr"),
        }
        assert_eq!(bitmap.cardinality(), 3);
        assert_eq!(bitmap.to_patterns(), vec![1, 2, (5 << 32) | 7]);
    }

    #[test]
    fn base_must_be_native_integer() {
        assert!(Bitmap::empty(TypeTag::UInt64).is_ok());
        assert!(Bitmap::empty(TypeTag::Float32).is_err());
        assert!(Bitmap::empty(TypeTag::UInt128).is_err());
        assert!(Bitmap::empty(TypeTag::String).is_err());
    }

    #[test]
    fn plain_rejects_wide_patterns() {
        let mut bitmap = Bitmap::empty(TypeTag::UInt32).unwrap();
        assert!(bitmap.insert(1 << 33).is_err());
        assert!(bitmap.insert(42).is_ok());
    }

    #[test]
    fn build_expression() {
        assert_eq!(
            Bitmap::of_i8(&[-1, 3]).build_expression(),
            "bitmapBuild([toInt8(3),toInt8(-1)])"
        );
        assert_eq!(
            Bitmap::of_u32(&[]).build_expression(),
            "bitmapBuild(cast([] as Array(UInt32)))"
        );
    }
}
