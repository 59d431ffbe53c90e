//! Row-level streaming over a column schema.

use std::io::{BufRead, Write};

use super::{FieldCodec, build_codec};
use rowbin_common::{Result, error::Error};
use rowbin_format::Column;
use rowbin_values::Value;

/// Decodes rows from a byte stream into one reused `Value` slot per column.
///
/// A clean end of input between rows is the end of the stream; running dry in
/// the middle of a row is malformed input.
pub struct RowReader<R> {
    input: R,
    columns: Vec<Column>,
    codecs: Vec<Box<dyn FieldCodec>>,
    slots: Vec<Value>,
    rows_read: u64,
}

impl<R: BufRead> RowReader<R> {
    /// Builds the dispatch table for `columns` up front; an unsupported
    /// column fails here, before any byte is consumed.
    pub fn new(input: R, columns: &[Column]) -> Result<RowReader<R>> {
        rowbin_common::verify_arg!(columns, !columns.is_empty());
        let codecs = columns.iter().map(build_codec).collect::<Result<Vec<_>>>()?;
        let slots = columns.iter().map(Value::empty_for).collect();
        Ok(RowReader {
            input,
            columns: columns.to_vec(),
            codecs,
            slots,
            rows_read: 0,
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Decodes the next row into the internal slots and returns a view of
    /// them, or `None` at the end of the stream.
    ///
    /// The returned slice borrows the reused slots: clone whatever must
    /// outlive the next call.
    pub fn next_row(&mut self) -> Result<Option<&[Value]>> {
        let more = !self
            .input
            .fill_buf()
            .map_err(|e| Error::io("read", e))?
            .is_empty();
        if !more {
            return Ok(None);
        }
        for (index, codec) in self.codecs.iter().enumerate() {
            codec
                .deserialize(&mut self.slots[index], &mut self.input)
                .map_err(|e| {
                    e.with_context(format!(
                        "row {}, column {} '{}'",
                        self.rows_read,
                        index,
                        self.columns[index].name()
                    ))
                })?;
        }
        self.rows_read += 1;
        Ok(Some(&self.slots))
    }

    pub fn into_inner(self) -> R {
        self.input
    }
}

/// Encodes caller-supplied rows onto a byte stream.
pub struct RowWriter<W> {
    output: W,
    columns: Vec<Column>,
    codecs: Vec<Box<dyn FieldCodec>>,
    rows_written: u64,
}

impl<W: Write> RowWriter<W> {
    pub fn new(output: W, columns: &[Column]) -> Result<RowWriter<W>> {
        rowbin_common::verify_arg!(columns, !columns.is_empty());
        let codecs = columns.iter().map(build_codec).collect::<Result<Vec<_>>>()?;
        Ok(RowWriter {
            output,
            columns: columns.to_vec(),
            codecs,
            rows_written: 0,
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Serializes one row; the values are read, never mutated.
    pub fn write_row(&mut self, row: &[Value]) -> Result<()> {
        if row.len() != self.codecs.len() {
            return Err(Error::invalid_arg(
                "row",
                format!("{} values for {} columns", row.len(), self.codecs.len()),
            ));
        }
        for (index, (codec, value)) in self.codecs.iter().zip(row).enumerate() {
            codec.serialize(value, &mut self.output).map_err(|e| {
                e.with_context(format!(
                    "row {}, column {} '{}'",
                    self.rows_written,
                    index,
                    self.columns[index].name()
                ))
            })?;
        }
        self.rows_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.output.flush().map_err(|e| Error::io("flush", e))
    }

    pub fn into_inner(self) -> W {
        self.output
    }
}
