//! Codecs for the nullable envelope and the recursive container types.
//!
//! Container codecs hold the pre-built codecs of their nested columns plus an
//! empty template value per child; elements are decoded into clones of the
//! template, so the codec itself stays immutable and shareable.

use std::io::{BufRead, Write};

use super::FieldCodec;
use crate::binary::{RawRead, RawWrite};
use rowbin_common::{Result, error::Error, verify_arg, verify_data};
use rowbin_format::Column;
use rowbin_values::{Value, ValueData};

/// One flag byte before the payload; `1` means null and the payload is
/// entirely absent.
pub(super) struct NullableCodec {
    inner: Box<dyn FieldCodec>,
}

impl NullableCodec {
    pub(super) fn new(inner: Box<dyn FieldCodec>) -> NullableCodec {
        NullableCodec { inner }
    }
}

impl FieldCodec for NullableCodec {
    fn deserialize(&self, slot: &mut Value, input: &mut dyn BufRead) -> Result<()> {
        if input.read_bool_strict()? {
            slot.set_null();
            Ok(())
        } else {
            self.inner.deserialize(slot, input)
        }
    }

    fn serialize(&self, value: &Value, output: &mut dyn Write) -> Result<()> {
        if value.is_null_or_empty() {
            output.write_u8(1)
        } else {
            output.write_u8(0)?;
            self.inner.serialize(value, output)
        }
    }
}

/// `Array(T)`: varint count, then the elements.
pub(super) struct ArrayCodec {
    element: Box<dyn FieldCodec>,
    template: Value,
}

impl ArrayCodec {
    pub(super) fn new(element: Box<dyn FieldCodec>, element_column: &Column) -> ArrayCodec {
        ArrayCodec {
            element,
            template: Value::empty_for(element_column),
        }
    }
}

impl FieldCodec for ArrayCodec {
    fn deserialize(&self, slot: &mut Value, input: &mut dyn BufRead) -> Result<()> {
        let len = input.read_varint_len()?;
        let mut items = match slot.take_data() {
            ValueData::Array(mut items) => {
                items.clear();
                items
            }
            _ => Vec::new(),
        };
        for _ in 0..len {
            let mut item = self.template.clone();
            self.element.deserialize(&mut item, input)?;
            items.push(item);
        }
        slot.assign(ValueData::Array(items));
        Ok(())
    }

    fn serialize(&self, value: &Value, output: &mut dyn Write) -> Result<()> {
        let items = value.as_array()?;
        output.write_varint(items.len() as u64)?;
        for item in items {
            self.element.serialize(item, output)?;
        }
        Ok(())
    }
}

/// `Map(K, V)`: varint pair count, then alternating keys and values.
pub(super) struct MapCodec {
    key: Box<dyn FieldCodec>,
    key_template: Value,
    value: Box<dyn FieldCodec>,
    value_template: Value,
}

impl MapCodec {
    pub(super) fn new(
        key: Box<dyn FieldCodec>,
        key_column: &Column,
        value: Box<dyn FieldCodec>,
        value_column: &Column,
    ) -> MapCodec {
        MapCodec {
            key,
            key_template: Value::empty_for(key_column),
            value,
            value_template: Value::empty_for(value_column),
        }
    }
}

impl FieldCodec for MapCodec {
    fn deserialize(&self, slot: &mut Value, input: &mut dyn BufRead) -> Result<()> {
        let len = input.read_varint_len()?;
        let mut pairs = match slot.take_data() {
            ValueData::Map(mut pairs) => {
                pairs.clear();
                pairs
            }
            _ => Vec::new(),
        };
        for _ in 0..len {
            let mut key = self.key_template.clone();
            self.key.deserialize(&mut key, input)?;
            let mut value = self.value_template.clone();
            self.value.deserialize(&mut value, input)?;
            pairs.push((key, value));
        }
        slot.assign(ValueData::Map(pairs));
        Ok(())
    }

    fn serialize(&self, value: &Value, output: &mut dyn Write) -> Result<()> {
        let pairs = value.as_map()?;
        output.write_varint(pairs.len() as u64)?;
        for (k, v) in pairs {
            self.key.serialize(k, output)?;
            self.value.serialize(v, output)?;
        }
        Ok(())
    }
}

/// `Tuple(...)`: the element count is schema-known, so the wire carries the
/// elements back to back with no prefix.
pub(super) struct TupleCodec {
    items: Vec<(Box<dyn FieldCodec>, Value)>,
}

impl TupleCodec {
    pub(super) fn new(items: Vec<(Box<dyn FieldCodec>, Value)>) -> TupleCodec {
        TupleCodec { items }
    }
}

impl FieldCodec for TupleCodec {
    fn deserialize(&self, slot: &mut Value, input: &mut dyn BufRead) -> Result<()> {
        let mut values = Vec::with_capacity(self.items.len());
        for (codec, template) in &self.items {
            let mut value = template.clone();
            codec.deserialize(&mut value, input)?;
            values.push(value);
        }
        slot.assign(ValueData::Tuple(values));
        Ok(())
    }

    fn serialize(&self, value: &Value, output: &mut dyn Write) -> Result<()> {
        let values = value.as_tuple()?;
        verify_arg!(value, values.len() == self.items.len());
        for ((codec, _), value) in self.items.iter().zip(values) {
            codec.serialize(value, output)?;
        }
        Ok(())
    }
}

/// `Nested(...)`: per sub-column, a varint count followed by that column's
/// values. All sub-columns must agree on the count.
pub(super) struct NestedCodec {
    columns: Vec<(Box<dyn FieldCodec>, Value)>,
}

impl NestedCodec {
    pub(super) fn new(columns: Vec<(Box<dyn FieldCodec>, Value)>) -> NestedCodec {
        NestedCodec { columns }
    }
}

impl FieldCodec for NestedCodec {
    fn deserialize(&self, slot: &mut Value, input: &mut dyn BufRead) -> Result<()> {
        let mut rows: Vec<Vec<Value>> = Vec::new();
        for (index, (codec, template)) in self.columns.iter().enumerate() {
            let count = input.read_varint_len()?;
            if index == 0 {
                rows = (0..count)
                    .map(|_| Vec::with_capacity(self.columns.len()))
                    .collect();
            } else {
                verify_data!("nested", count == rows.len());
            }
            for row in rows.iter_mut() {
                let mut value = template.clone();
                codec.deserialize(&mut value, input)?;
                row.push(value);
            }
        }
        slot.assign(ValueData::Nested(rows));
        Ok(())
    }

    fn serialize(&self, value: &Value, output: &mut dyn Write) -> Result<()> {
        let rows = value.as_nested()?;
        for (index, (codec, _)) in self.columns.iter().enumerate() {
            output.write_varint(rows.len() as u64)?;
            for row in rows {
                let item = row.get(index).ok_or_else(|| {
                    Error::invalid_arg(
                        "value",
                        format!("nested row has {} values, expected {}", row.len(), self.columns.len()),
                    )
                })?;
                codec.serialize(item, output)?;
            }
        }
        Ok(())
    }
}
