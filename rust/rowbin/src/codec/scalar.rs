//! Leaf codecs: fixed-width scalars, strings, temporal and network kinds.

use std::io::{BufRead, Write};

use jiff::Timestamp;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};

use super::FieldCodec;
use crate::binary::{RawRead, RawWrite};
use rowbin_common::{Result, error::Error, verify_arg};
use rowbin_format::defs::{
    DATE32_MAX_DAYS, DATE32_MIN_DAYS, DATETIME64_MAX_SCALE, DATETIME64_MAX_SECONDS,
    DATETIME64_MIN_SECONDS,
};
use rowbin_format::{Column, EnumDef, TypeTag};
use rowbin_values::decimal::pow10;
use rowbin_values::{Decimal, Value, ValueData};

type ReadFn = fn(&mut Value, &mut dyn BufRead) -> Result<()>;
type WriteFn = fn(&Value, &mut dyn Write) -> Result<()>;

/// A stateless (serializer, deserializer) function pair.
struct ScalarCodec {
    read: ReadFn,
    write: WriteFn,
}

impl FieldCodec for ScalarCodec {
    fn deserialize(&self, slot: &mut Value, input: &mut dyn BufRead) -> Result<()> {
        (self.read)(slot, input)
    }

    fn serialize(&self, value: &Value, output: &mut dyn Write) -> Result<()> {
        (self.write)(value, output)
    }
}

fn pair(read: ReadFn, write: WriteFn) -> Box<dyn FieldCodec> {
    Box::new(ScalarCodec { read, write })
}

macro_rules! int_pair {
    ($read:ident, $write:ident, $variant:ident, $as:ident) => {
        pair(
            |slot, input| {
                slot.assign(ValueData::$variant(input.$read()?));
                Ok(())
            },
            |value, output| output.$write(value.$as()?),
        )
    };
}

pub(super) fn bool_codec() -> Box<dyn FieldCodec> {
    pair(
        |slot, input| {
            slot.assign(ValueData::Bool(input.read_bool_strict()?));
            Ok(())
        },
        |value, output| output.write_bool(value.as_bool()?),
    )
}

pub(super) fn int_codec(tag: TypeTag) -> Box<dyn FieldCodec> {
    match tag {
        TypeTag::Int8 => int_pair!(read_i8, write_i8, Int8, as_i8),
        TypeTag::Int16 => int_pair!(read_i16, write_i16, Int16, as_i16),
        TypeTag::Int32 => int_pair!(read_i32, write_i32, Int32, as_i32),
        TypeTag::Int64 => int_pair!(read_i64, write_i64, Int64, as_i64),
        TypeTag::Int128 => int_pair!(read_i128, write_i128, Int128, as_i128),
        TypeTag::UInt8 => int_pair!(read_u8, write_u8, UInt8, as_u8),
        TypeTag::UInt16 => int_pair!(read_u16, write_u16, UInt16, as_u16),
        TypeTag::UInt32 => int_pair!(read_u32, write_u32, UInt32, as_u32),
        TypeTag::UInt64 => int_pair!(read_u64, write_u64, UInt64, as_u64),
        TypeTag::UInt128 => int_pair!(read_u128, write_u128, UInt128, as_u128),
        TypeTag::Int256 => pair(
            |slot, input| {
                slot.assign(ValueData::Int256(input.read_i256()?));
                Ok(())
            },
            |value, output| output.write_i256(&value.as_bigint()?),
        ),
        TypeTag::UInt256 => pair(
            |slot, input| {
                slot.assign(ValueData::UInt256(input.read_u256()?));
                Ok(())
            },
            |value, output| output.write_u256(&value.as_unsigned_bigint()?),
        ),
        _ => unreachable!("not an integer tag: {tag}"),
    }
}

pub(super) fn float_codec(tag: TypeTag) -> Box<dyn FieldCodec> {
    match tag {
        TypeTag::Float32 => pair(
            |slot, input| {
                slot.assign(ValueData::Float32(input.read_f32()?));
                Ok(())
            },
            |value, output| output.write_f32(value.as_f32()?),
        ),
        _ => pair(
            |slot, input| {
                slot.assign(ValueData::Float64(input.read_f64()?));
                Ok(())
            },
            |value, output| output.write_f64(value.as_f64()?),
        ),
    }
}

pub(super) fn string_codec() -> Box<dyn FieldCodec> {
    pair(
        |slot, input| input.read_bin_string_into(slot.string_buf_mut()),
        |value, output| output.write_bin_string(value.as_bytes()?),
    )
}

pub(super) fn fixed_string_codec(len: usize) -> Result<Box<dyn FieldCodec>> {
    verify_arg!(len, len > 0);
    Ok(Box::new(FixedStringCodec { len }))
}

struct FixedStringCodec {
    len: usize,
}

impl FieldCodec for FixedStringCodec {
    fn deserialize(&self, slot: &mut Value, input: &mut dyn BufRead) -> Result<()> {
        input.read_bytes_into(self.len, slot.string_buf_mut())
    }

    fn serialize(&self, value: &Value, output: &mut dyn Write) -> Result<()> {
        output.write_fixed_string(value.as_fixed_bytes(self.len)?, self.len)
    }
}

pub(super) fn uuid_codec() -> Box<dyn FieldCodec> {
    pair(
        |slot, input| {
            slot.assign(ValueData::Uuid(input.read_uuid()?));
            Ok(())
        },
        |value, output| output.write_uuid(value.as_uuid()?),
    )
}

pub(super) fn ipv4_codec() -> Box<dyn FieldCodec> {
    pair(
        |slot, input| {
            slot.assign(ValueData::Ipv4(input.read_ipv4()?));
            Ok(())
        },
        |value, output| output.write_ipv4(value.as_ipv4()?),
    )
}

pub(super) fn ipv6_codec() -> Box<dyn FieldCodec> {
    pair(
        |slot, input| {
            slot.assign(ValueData::Ipv6(input.read_ipv6()?));
            Ok(())
        },
        |value, output| output.write_ipv6(value.as_ipv6()?),
    )
}

pub(super) fn date_codec() -> Box<dyn FieldCodec> {
    pair(
        |slot, input| {
            slot.assign(ValueData::Date(input.read_u16()? as i32));
            Ok(())
        },
        |value, output| {
            let days = value.as_epoch_days()?;
            if !(0..=u16::MAX as i32).contains(&days) {
                return Err(Error::out_of_range("date", days, "Date"));
            }
            output.write_u16(days as u16)
        },
    )
}

pub(super) fn date32_codec() -> Box<dyn FieldCodec> {
    pair(
        |slot, input| {
            slot.assign(ValueData::Date(input.read_i32()?));
            Ok(())
        },
        |value, output| {
            let days = value.as_epoch_days()?;
            if !(DATE32_MIN_DAYS..=DATE32_MAX_DAYS).contains(&days) {
                return Err(Error::out_of_range("date", days, "Date32"));
            }
            output.write_i32(days)
        },
    )
}

pub(super) fn datetime_codec() -> Box<dyn FieldCodec> {
    pair(
        |slot, input| {
            let seconds = input.read_u32()?;
            let ts = Timestamp::from_second(seconds as i64)
                .map_err(|_| Error::out_of_range("datetime", seconds, "a timestamp"))?;
            slot.assign(ValueData::DateTime(ts));
            Ok(())
        },
        |value, output| {
            let seconds = value.as_timestamp()?.as_second();
            if !(0..=u32::MAX as i64).contains(&seconds) {
                return Err(Error::out_of_range("datetime", seconds, "DateTime"));
            }
            output.write_u32(seconds as u32)
        },
    )
}

pub(super) fn datetime64_codec(scale: u32) -> Result<Box<dyn FieldCodec>> {
    verify_arg!(scale, scale <= DATETIME64_MAX_SCALE);
    Ok(Box::new(DateTime64Codec { scale }))
}

/// `DateTime64(scale)`: one signed 64-bit integer carrying
/// `seconds * 10^scale + fraction`.
struct DateTime64Codec {
    scale: u32,
}

impl FieldCodec for DateTime64Codec {
    fn deserialize(&self, slot: &mut Value, input: &mut dyn BufRead) -> Result<()> {
        let raw = input.read_i64()?;
        let step = 10i128.pow(9 - self.scale);
        let ts = Timestamp::from_nanosecond(raw as i128 * step)
            .map_err(|_| Error::out_of_range("datetime", raw, "a timestamp"))?;
        slot.assign(ValueData::DateTime(ts));
        Ok(())
    }

    fn serialize(&self, value: &Value, output: &mut dyn Write) -> Result<()> {
        let ts = value.as_timestamp()?;
        let seconds = ts.as_second();
        if !(DATETIME64_MIN_SECONDS..=DATETIME64_MAX_SECONDS).contains(&seconds) {
            return Err(Error::out_of_range("datetime", ts, "DateTime64"));
        }
        let step = 10i128.pow(9 - self.scale);
        let raw = ts.as_nanosecond().div_euclid(step);
        let raw: i64 = raw
            .try_into()
            .map_err(|_| Error::out_of_range("datetime", ts, "DateTime64"))?;
        output.write_i64(raw)
    }
}

pub(super) fn enum_codec(column: &Column) -> Result<Box<dyn FieldCodec>> {
    let def = column
        .enum_values()
        .ok_or_else(|| Error::invalid_arg("column", "enum column without declared constants"))?
        .clone();
    Ok(Box::new(EnumCodec {
        wide: column.tag() == TypeTag::Enum16,
        def,
    }))
}

/// `Enum8`/`Enum16`: a small ordinal that must match one of the column's
/// declared constants, in both directions.
struct EnumCodec {
    wide: bool,
    def: EnumDef,
}

impl FieldCodec for EnumCodec {
    fn deserialize(&self, slot: &mut Value, input: &mut dyn BufRead) -> Result<()> {
        if self.wide {
            let ordinal = input.read_i16()?;
            self.def
                .name_of(ordinal as i32)
                .map_err(|_| Error::invalid_data("enum", format!("unknown ordinal {ordinal}")))?;
            slot.assign(ValueData::Enum16(ordinal));
        } else {
            let ordinal = input.read_i8()?;
            self.def
                .name_of(ordinal as i32)
                .map_err(|_| Error::invalid_data("enum", format!("unknown ordinal {ordinal}")))?;
            slot.assign(ValueData::Enum8(ordinal));
        }
        Ok(())
    }

    fn serialize(&self, value: &Value, output: &mut dyn Write) -> Result<()> {
        let ordinal = match value.data() {
            ValueData::String(_) => self.def.ordinal_of(value.as_str()?)?,
            _ => {
                let ordinal = value.as_enum_ordinal()?;
                self.def.name_of(ordinal)?;
                ordinal
            }
        };
        if self.wide {
            let ordinal: i16 = ordinal
                .try_into()
                .map_err(|_| Error::out_of_range("enum", ordinal, "Enum16"))?;
            output.write_i16(ordinal)
        } else {
            let ordinal: i8 = ordinal
                .try_into()
                .map_err(|_| Error::out_of_range("enum", ordinal, "Enum8"))?;
            output.write_i8(ordinal)
        }
    }
}

pub(super) fn decimal_codec(tag: TypeTag, scale: u32) -> Box<dyn FieldCodec> {
    Box::new(DecimalCodec { tag, scale })
}

/// Fixed-width decimals: the wire carries the scaled integer only; the scale
/// lives in the column metadata.
struct DecimalCodec {
    tag: TypeTag,
    scale: u32,
}

impl FieldCodec for DecimalCodec {
    fn deserialize(&self, slot: &mut Value, input: &mut dyn BufRead) -> Result<()> {
        let mantissa = match self.tag {
            TypeTag::Decimal32 => BigInt::from(input.read_i32()?),
            TypeTag::Decimal64 => BigInt::from(input.read_i64()?),
            TypeTag::Decimal128 => BigInt::from(input.read_i128()?),
            _ => input.read_i256()?,
        };
        slot.assign(ValueData::Decimal(Decimal::new(mantissa, self.scale)));
        Ok(())
    }

    fn serialize(&self, value: &Value, output: &mut dyn Write) -> Result<()> {
        let decimal = value.as_decimal(self.scale)?;
        let mantissa = decimal.mantissa();
        let digits = self.tag.max_precision().expect("a decimal tag");
        if mantissa.abs() > pow10(digits) {
            return Err(Error::out_of_range("decimal", &decimal, self.tag.name()));
        }
        match self.tag {
            TypeTag::Decimal32 => output.write_i32(
                mantissa
                    .to_i32()
                    .ok_or_else(|| Error::out_of_range("decimal", &decimal, "Decimal32"))?,
            ),
            TypeTag::Decimal64 => output.write_i64(
                mantissa
                    .to_i64()
                    .ok_or_else(|| Error::out_of_range("decimal", &decimal, "Decimal64"))?,
            ),
            TypeTag::Decimal128 => output.write_i128(
                mantissa
                    .to_i128()
                    .ok_or_else(|| Error::out_of_range("decimal", &decimal, "Decimal128"))?,
            ),
            _ => output.write_i256(mantissa),
        }
    }
}

pub(super) fn point_codec() -> Box<dyn FieldCodec> {
    pair(
        |slot, input| {
            slot.assign(ValueData::Point(input.read_point()?));
            Ok(())
        },
        |value, output| output.write_point(value.as_point()?),
    )
}

pub(super) fn ring_codec() -> Box<dyn FieldCodec> {
    pair(
        |slot, input| {
            slot.assign(ValueData::Ring(read_ring(input)?));
            Ok(())
        },
        |value, output| write_ring(value.as_ring()?, output),
    )
}

pub(super) fn polygon_codec() -> Box<dyn FieldCodec> {
    pair(
        |slot, input| {
            slot.assign(ValueData::Polygon(read_polygon(input)?));
            Ok(())
        },
        |value, output| {
            let polygon = value.as_polygon()?;
            output.write_varint(polygon.len() as u64)?;
            for ring in polygon {
                write_ring(ring, output)?;
            }
            Ok(())
        },
    )
}

pub(super) fn multi_polygon_codec() -> Box<dyn FieldCodec> {
    pair(
        |slot, input| {
            let count = input.read_varint_len()?;
            let mut polygons = Vec::new();
            for _ in 0..count {
                polygons.push(read_polygon(input)?);
            }
            slot.assign(ValueData::MultiPolygon(polygons));
            Ok(())
        },
        |value, output| {
            let multi = value.as_multi_polygon()?;
            output.write_varint(multi.len() as u64)?;
            for polygon in multi {
                output.write_varint(polygon.len() as u64)?;
                for ring in polygon {
                    write_ring(ring, output)?;
                }
            }
            Ok(())
        },
    )
}

fn read_ring(input: &mut dyn BufRead) -> Result<Vec<[f64; 2]>> {
    let count = input.read_varint_len()?;
    let mut ring = Vec::new();
    for _ in 0..count {
        ring.push(input.read_point()?);
    }
    Ok(ring)
}

fn read_polygon(input: &mut dyn BufRead) -> Result<Vec<Vec<[f64; 2]>>> {
    let count = input.read_varint_len()?;
    let mut polygon = Vec::new();
    for _ in 0..count {
        polygon.push(read_ring(input)?);
    }
    Ok(polygon)
}

fn write_ring(ring: &[[f64; 2]], output: &mut dyn Write) -> Result<()> {
    output.write_varint(ring.len() as u64)?;
    for point in ring {
        output.write_point(*point)?;
    }
    Ok(())
}
