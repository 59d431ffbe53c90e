//! Aggregate-function-state codecs.
//!
//! `AggregateFunction(...)` columns reach a secondary dispatch keyed by the
//! aggregate kind. Only bitmap states have a wire codec; every other kind is
//! rejected when the table is built.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};

use roaring::RoaringBitmap;

use super::FieldCodec;
use crate::binary::{RawRead, RawWrite};
use rowbin_common::{Result, error::Error};
use rowbin_format::defs::BITMAP_SMALL_SET_MAX;
use rowbin_format::{AggregateKind, Column, TypeTag};
use rowbin_values::bitmap::{Bitmap, BitmapRepr};
use rowbin_values::{Value, ValueData};

pub(super) fn build_aggregate_codec(column: &Column) -> Result<Box<dyn FieldCodec>> {
    let kind = column
        .aggregate_kind()
        .ok_or_else(|| Error::invalid_arg("column", "AggregateFunction without a kind"))?;
    match kind {
        AggregateKind::GroupBitmap => {
            let base = column
                .nested_columns()
                .first()
                .map(Column::tag)
                .ok_or_else(|| Error::invalid_arg("column", "groupBitmap without a base type"))?;
            // Fail on a non-integer base now, not at row time.
            Bitmap::empty(base)?;
            Ok(Box::new(BitmapCodec { base }))
        }
        other => Err(Error::unsupported_type(format!(
            "AggregateFunction({other}, ...)"
        ))),
    }
}

struct BitmapCodec {
    base: TypeTag,
}

impl FieldCodec for BitmapCodec {
    fn deserialize(&self, slot: &mut Value, input: &mut dyn BufRead) -> Result<()> {
        slot.assign(ValueData::Bitmap(read_bitmap(input, self.base)?));
        Ok(())
    }

    fn serialize(&self, value: &Value, output: &mut dyn Write) -> Result<()> {
        if value.is_null_or_empty() {
            return write_bitmap(&Bitmap::empty(self.base)?, output);
        }
        let bitmap = value.as_bitmap()?;
        if bitmap.base() != self.base {
            return Err(Error::invalid_arg(
                "value",
                format!("bitmap over {}, column expects {}", bitmap.base(), self.base),
            ));
        }
        write_bitmap(bitmap, output)
    }
}

/// Writes a bitmap state: the inline small-set layout up to 32 elements, the
/// serialized roaring layout beyond.
pub fn write_bitmap(bitmap: &Bitmap, output: &mut dyn Write) -> Result<()> {
    let cardinality = bitmap.cardinality();
    if cardinality <= BITMAP_SMALL_SET_MAX {
        output.write_u8(0)?;
        output.write_u8(cardinality as u8)?;
        for pattern in bitmap.to_patterns() {
            match bitmap.elem_width() {
                1 => output.write_u8(pattern as u8)?,
                2 => output.write_u16(pattern as u16)?,
                4 => output.write_u32(pattern as u32)?,
                _ => output.write_u64(pattern)?,
            }
        }
        return Ok(());
    }

    output.write_u8(1)?;
    match bitmap.repr() {
        BitmapRepr::Plain(rb) => {
            output.write_varint(rb.serialized_size() as u64)?;
            rb.serialize_into(&mut *output)
                .map_err(|e| Error::io("bitmap", e))?;
        }
        BitmapRepr::Chunked(chunks) => {
            // The wire's chunk count is an 8-byte field whose upper half must
            // be zero; a count needing more than 32 bits cannot be encoded.
            if chunks.len() > u32::MAX as usize {
                return Err(Error::out_of_range(
                    "bitmap",
                    chunks.len(),
                    "a 32-bit chunk count",
                ));
            }
            let size: u64 = 8 + chunks
                .values()
                .map(|rb| 4 + rb.serialized_size() as u64)
                .sum::<u64>();
            output.write_varint(size)?;
            output.write_u64(chunks.len() as u64)?;
            for (&high, rb) in chunks {
                output.write_u32(high)?;
                rb.serialize_into(&mut *output)
                    .map_err(|e| Error::io("bitmap", e))?;
            }
        }
    }
    Ok(())
}

/// Reads a bitmap state for a column whose declared base integer type is
/// `base`; width and signedness come from the declaration, not the payload.
pub fn read_bitmap(input: &mut dyn BufRead, base: TypeTag) -> Result<Bitmap> {
    let mut bitmap = Bitmap::empty(base)?;
    let width = bitmap.elem_width();
    let signed = base.is_signed_integer();

    match input.read_u8()? {
        0 => {
            let cardinality = input.read_u8()?;
            for _ in 0..cardinality {
                let pattern = match (width, signed) {
                    (1, false) => input.read_u8()? as u64,
                    (1, true) => (input.read_i8()? as i32) as u32 as u64,
                    (2, false) => input.read_u16()? as u64,
                    (2, true) => (input.read_i16()? as i32) as u32 as u64,
                    (4, _) => input.read_u32()? as u64,
                    _ => input.read_u64()?,
                };
                bitmap.insert(pattern)?;
            }
            Ok(bitmap)
        }
        1 => {
            let len = input.read_varint_len()?;
            let mut blob = Vec::new();
            input.read_bytes_into(len, &mut blob)?;
            let mut cursor: &[u8] = &blob;
            let repr = if width <= 4 {
                let rb = RoaringBitmap::deserialize_from(&mut cursor)
                    .map_err(|e| Error::invalid_data("bitmap", e.to_string()))?;
                BitmapRepr::Plain(rb)
            } else {
                let count = cursor.read_u64()?;
                if count > u32::MAX as u64 {
                    return Err(Error::invalid_data(
                        "bitmap",
                        format!("chunk count {count} overflows the 32-bit field"),
                    ));
                }
                let mut chunks = BTreeMap::new();
                for _ in 0..count {
                    let high = cursor.read_u32()?;
                    let rb = RoaringBitmap::deserialize_from(&mut cursor)
                        .map_err(|e| Error::invalid_data("bitmap", e.to_string()))?;
                    chunks.insert(high, rb);
                }
                BitmapRepr::Chunked(chunks)
            };
            Bitmap::from_repr(base, repr)
        }
        flag => Err(Error::invalid_data(
            "bitmap",
            format!("unexpected layout flag {flag:#04x}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(bitmap: &Bitmap) -> Bitmap {
        let mut bytes = Vec::new();
        write_bitmap(bitmap, &mut bytes).unwrap();
        let mut input: &[u8] = &bytes;
        let back = read_bitmap(&mut input, bitmap.base()).unwrap();
        assert!(input.is_empty(), "bitmap codec must consume its payload");
        back
    }

    #[test]
    fn small_set_layout() {
        let bitmap = Bitmap::of_u32(&[9, 4, 2, 24, 100]);
        let mut bytes = Vec::new();
        write_bitmap(&bitmap, &mut bytes).unwrap();
        assert_eq!(bytes[0], 0);
        assert_eq!(bytes[1], 5);
        assert_eq!(bytes.len(), 2 + 5 * 4);
        // Elements are sorted, little-endian, at the declared width.
        assert_eq!(&bytes[2..6], &2u32.to_le_bytes());
        assert_eq!(roundtrip(&bitmap), bitmap);
    }

    #[test]
    fn small_set_signed_elements() {
        let bitmap = Bitmap::of_i16(&[-2, 7]);
        let mut bytes = Vec::new();
        write_bitmap(&bitmap, &mut bytes).unwrap();
        assert_eq!(bytes.len(), 2 + 2 * 2);
        assert!(bytes[2..].chunks(2).any(|c| c == (-2i16).to_le_bytes()));
        assert_eq!(roundtrip(&bitmap), bitmap);
    }

    #[test]
    fn serialized_layout_for_large_sets() {
        let values: Vec<u32> = (0..64).map(|i| i * 3).collect();
        let bitmap = Bitmap::of_u32(&values);
        let mut bytes = Vec::new();
        write_bitmap(&bitmap, &mut bytes).unwrap();
        assert_eq!(bytes[0], 1);
        let back = roundtrip(&bitmap);
        assert_eq!(back, bitmap);
        assert_eq!(
            back.to_patterns(),
            values.iter().map(|&v| v as u64).collect::<Vec<_>>()
        );
    }

    #[test]
    fn serialized_64_bit_layout_is_chunked() {
        let values: Vec<u64> = (0..40)
            .map(|i| (i as u64) << 32 | (i as u64))
            .collect();
        let bitmap = Bitmap::of_u64(&values);
        let mut bytes = Vec::new();
        write_bitmap(&bitmap, &mut bytes).unwrap();
        // Blob starts with the 8-byte LE chunk count, upper half zero.
        let mut input: &[u8] = &bytes;
        assert_eq!(input.read_u8().unwrap(), 1);
        let blob_len = input.read_varint().unwrap();
        assert_eq!(blob_len as usize, input.len());
        assert_eq!(input.read_u64().unwrap(), 40);
        assert_eq!(roundtrip(&bitmap), bitmap);
    }

    #[test]
    fn empty_bitmap_is_a_small_set() {
        let bitmap = Bitmap::empty(TypeTag::UInt64).unwrap();
        let mut bytes = Vec::new();
        write_bitmap(&bitmap, &mut bytes).unwrap();
        assert_eq!(bytes, [0, 0]);
        assert_eq!(roundtrip(&bitmap), bitmap);
    }

    #[test]
    fn bad_flag_is_malformed() {
        let mut input: &[u8] = &[7, 0, 0];
        assert!(read_bitmap(&mut input, TypeTag::UInt32).is_err());
    }

    #[test]
    fn oversized_chunk_count_is_rejected() {
        let mut blob = Vec::new();
        blob.write_u64(u32::MAX as u64 + 1).unwrap();
        let mut bytes = vec![1u8];
        bytes.write_varint(blob.len() as u64).unwrap();
        bytes.extend_from_slice(&blob);
        let mut input: &[u8] = &bytes;
        let err = read_bitmap(&mut input, TypeTag::UInt64).unwrap_err();
        assert!(err.is_fatal());
    }
}
