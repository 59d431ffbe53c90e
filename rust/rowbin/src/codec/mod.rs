//! The type dispatch table: one immutable (serializer, deserializer) pair per
//! column, composed recursively for container types.

mod aggregate;
mod composite;
mod row;
mod scalar;

pub use aggregate::{read_bitmap, write_bitmap};
pub use row::{RowReader, RowWriter};

use std::io::{BufRead, Write};

use composite::{ArrayCodec, MapCodec, NestedCodec, NullableCodec, TupleCodec};
use rowbin_common::{Result, error::Error};
use rowbin_format::{Column, TypeTag};
use rowbin_values::Value;

/// A column's wire codec.
///
/// Built once per column and immutable afterwards; safe to share across
/// threads. `deserialize` writes into the caller's slot (reused across rows);
/// `serialize` never mutates the value it is given.
pub trait FieldCodec: Send + Sync {
    fn deserialize(&self, slot: &mut Value, input: &mut dyn BufRead) -> Result<()>;
    fn serialize(&self, value: &Value, output: &mut dyn Write) -> Result<()>;
}

/// Builds the codec for `column`, including the nullable envelope and the
/// codecs of all nested columns.
///
/// Any unsupported combination (an aggregate kind without a codec, a bitmap
/// over a non-integer base) fails here, before a single byte moves: skipping
/// a column silently would desynchronize every column after it.
pub fn build_codec(column: &Column) -> Result<Box<dyn FieldCodec>> {
    let codec = build_payload_codec(column)
        .map_err(|e| e.with_context(format!("column '{}' {}", column.name(), column.type_expr())))?;
    if column.is_nullable() {
        Ok(Box::new(NullableCodec::new(codec)))
    } else {
        Ok(codec)
    }
}

fn build_payload_codec(column: &Column) -> Result<Box<dyn FieldCodec>> {
    let codec: Box<dyn FieldCodec> = match column.tag() {
        TypeTag::Bool => scalar::bool_codec(),
        TypeTag::Int8 => scalar::int_codec(TypeTag::Int8),
        TypeTag::Int16 => scalar::int_codec(TypeTag::Int16),
        TypeTag::Int32 => scalar::int_codec(TypeTag::Int32),
        TypeTag::Int64 => scalar::int_codec(TypeTag::Int64),
        TypeTag::Int128 => scalar::int_codec(TypeTag::Int128),
        TypeTag::Int256 => scalar::int_codec(TypeTag::Int256),
        TypeTag::UInt8 => scalar::int_codec(TypeTag::UInt8),
        TypeTag::UInt16 => scalar::int_codec(TypeTag::UInt16),
        TypeTag::UInt32 => scalar::int_codec(TypeTag::UInt32),
        TypeTag::UInt64 => scalar::int_codec(TypeTag::UInt64),
        TypeTag::UInt128 => scalar::int_codec(TypeTag::UInt128),
        TypeTag::UInt256 => scalar::int_codec(TypeTag::UInt256),
        TypeTag::Float32 | TypeTag::Float64 => scalar::float_codec(column.tag()),
        TypeTag::Decimal32 | TypeTag::Decimal64 | TypeTag::Decimal128 | TypeTag::Decimal256 => {
            scalar::decimal_codec(column.tag(), column.scale())
        }
        TypeTag::String => scalar::string_codec(),
        TypeTag::FixedString => scalar::fixed_string_codec(column.fixed_len())?,
        TypeTag::Date => scalar::date_codec(),
        TypeTag::Date32 => scalar::date32_codec(),
        TypeTag::DateTime32 => scalar::datetime_codec(),
        TypeTag::DateTime64 => scalar::datetime64_codec(column.scale())?,
        TypeTag::Enum8 | TypeTag::Enum16 => scalar::enum_codec(column)?,
        TypeTag::Uuid => scalar::uuid_codec(),
        TypeTag::Ipv4 => scalar::ipv4_codec(),
        TypeTag::Ipv6 => scalar::ipv6_codec(),
        TypeTag::Point => scalar::point_codec(),
        TypeTag::Ring => scalar::ring_codec(),
        TypeTag::Polygon => scalar::polygon_codec(),
        TypeTag::MultiPolygon => scalar::multi_polygon_codec(),
        TypeTag::Array => {
            let element = nested_column(column, 0)?;
            Box::new(ArrayCodec::new(build_codec(element)?, element))
        }
        TypeTag::Map => {
            let key = nested_column(column, 0)?;
            let value = nested_column(column, 1)?;
            Box::new(MapCodec::new(
                build_codec(key)?,
                key,
                build_codec(value)?,
                value,
            ))
        }
        TypeTag::Tuple => {
            if column.nested_columns().is_empty() {
                return Err(Error::invalid_arg("column", "Tuple without elements"));
            }
            let items = column
                .nested_columns()
                .iter()
                .map(|c| Ok((build_codec(c)?, Value::empty_for(c))))
                .collect::<Result<Vec<_>>>()?;
            Box::new(TupleCodec::new(items))
        }
        TypeTag::Nested => {
            if column.nested_columns().is_empty() {
                return Err(Error::invalid_arg("column", "Nested without columns"));
            }
            let columns = column
                .nested_columns()
                .iter()
                .map(|c| Ok((build_codec(c)?, Value::empty_for(c))))
                .collect::<Result<Vec<_>>>()?;
            Box::new(NestedCodec::new(columns))
        }
        TypeTag::SimpleAggregateFunction => build_codec(nested_column(column, 0)?)?,
        TypeTag::AggregateFunction => aggregate::build_aggregate_codec(column)?,
    };
    Ok(codec)
}

fn nested_column(column: &Column, index: usize) -> Result<&Column> {
    column.nested_columns().get(index).ok_or_else(|| {
        Error::invalid_arg(
            "column",
            format!("{} requires a nested column #{index}", column.tag()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowbin_format::AggregateKind;

    fn roundtrip(column: &Column, value: &Value) -> Value {
        let codec = build_codec(column).unwrap();
        let mut bytes = Vec::new();
        codec.serialize(value, &mut bytes).unwrap();
        let mut slot = Value::empty_for(column);
        let mut input: &[u8] = &bytes;
        codec.deserialize(&mut slot, &mut input).unwrap();
        assert!(input.is_empty(), "codec must consume the whole payload");
        slot
    }

    #[test]
    fn array_of_uint32_scenario() {
        // The canonical layout: varint count then little-endian elements.
        let column = Column::array("a", Column::new("", TypeTag::UInt32));
        let value = Value::of(vec![Value::of(1u32), Value::of(2u32), Value::of(3u32)]);
        let codec = build_codec(&column).unwrap();
        let mut bytes = Vec::new();
        codec.serialize(&value, &mut bytes).unwrap();
        assert_eq!(
            bytes,
            [0x03, 0x01, 0, 0, 0, 0x02, 0, 0, 0, 0x03, 0, 0, 0]
        );
        assert_eq!(roundtrip(&column, &value), value);
    }

    #[test]
    fn nullable_envelope_is_one_flag_byte() {
        let column = Column::new("n", TypeTag::UInt16).nullable();
        let codec = build_codec(&column).unwrap();

        let mut bytes = Vec::new();
        codec.serialize(&Value::null(), &mut bytes).unwrap();
        assert_eq!(bytes, [0x01]);

        bytes.clear();
        codec.serialize(&Value::of(7u16), &mut bytes).unwrap();
        assert_eq!(bytes, [0x00, 0x07, 0x00]);

        let mut slot = Value::empty_for(&column);
        let mut input: &[u8] = &[0x01];
        codec.deserialize(&mut slot, &mut input).unwrap();
        assert!(slot.is_null_or_empty());
        assert!(input.is_empty());
    }

    #[test]
    fn unsupported_aggregate_kind_fails_at_build() {
        let column = Column::aggregate("s", AggregateKind::Sum, Column::new("", TypeTag::UInt64));
        assert!(build_codec(&column).is_err());
    }

    #[test]
    fn map_and_tuple_roundtrip() {
        let column = Column::map(
            "m",
            Column::new("", TypeTag::String),
            Column::new("", TypeTag::Int64),
        );
        let value = Value::of(rowbin_values::ValueData::Map(vec![
            (Value::of("a"), Value::of(-1i64)),
            (Value::of("b"), Value::of(2i64)),
        ]));
        assert_eq!(roundtrip(&column, &value), value);

        let column = Column::tuple(
            "t",
            [
                Column::new("", TypeTag::UInt8),
                Column::new("", TypeTag::String).nullable(),
            ],
        );
        let value = Value::of(rowbin_values::ValueData::Tuple(vec![
            Value::of(9u8),
            Value::null(),
        ]));
        let back = roundtrip(&column, &value);
        assert_eq!(back.as_tuple().unwrap()[0].as_u8().unwrap(), 9);
        assert!(back.as_tuple().unwrap()[1].is_null_or_empty());
    }

    #[test]
    fn nested_roundtrip_per_subcolumn_counts() {
        let column = Column::nested(
            "n",
            [
                Column::new("id", TypeTag::UInt32),
                Column::new("tag", TypeTag::String),
            ],
        );
        let rows = vec![
            vec![Value::of(1u32), Value::of("x")],
            vec![Value::of(2u32), Value::of("y")],
        ];
        let value = Value::of(rowbin_values::ValueData::Nested(rows.clone()));
        let codec = build_codec(&column).unwrap();
        let mut bytes = Vec::new();
        codec.serialize(&value, &mut bytes).unwrap();
        // Each sub-column is its own varint-counted sequence.
        assert_eq!(
            bytes,
            [
                0x02, 0x01, 0, 0, 0, 0x02, 0, 0, 0, // id: count, 1, 2
                0x02, 0x01, b'x', 0x01, b'y', // tag: count, 'x', 'y'
            ]
        );
        assert_eq!(roundtrip(&column, &value), value);
    }

    #[test]
    fn deeply_nested_containers() {
        let column = Column::array("aa", Column::array("", Column::new("", TypeTag::Int16)));
        let value = Value::of(vec![
            Value::of(vec![Value::of(-5i16)]),
            Value::of(Vec::<Value>::new()),
        ]);
        assert_eq!(roundtrip(&column, &value), value);
    }
}
