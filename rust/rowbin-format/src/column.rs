//! Per-stream column metadata.
//!
//! A `Column` is created once per result schema by the surrounding adapter
//! (schema-header parsing lives there, not here) and is immutable for the
//! lifetime of the stream.

use jiff::tz::TimeZone;

use crate::types::{AggregateKind, TypeTag};
use rowbin_common::{Result, error::Error, verify_arg};

/// Declared constants of an `Enum8`/`Enum16` column: name <-> ordinal pairs.
///
/// An ordinal or name outside the declared set is an error on every lookup,
/// never a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    entries: Vec<(String, i32)>,
}

impl EnumDef {
    pub fn new<N: Into<String>>(entries: impl IntoIterator<Item = (N, i32)>) -> Result<EnumDef> {
        let entries: Vec<(String, i32)> = entries
            .into_iter()
            .map(|(name, ordinal)| (name.into(), ordinal))
            .collect();
        verify_arg!(entries, !entries.is_empty());
        for (i, (name, ordinal)) in entries.iter().enumerate() {
            for (other_name, other_ordinal) in &entries[..i] {
                if name == other_name || ordinal == other_ordinal {
                    return Err(Error::invalid_arg(
                        "entries",
                        format!("duplicate enum constant '{name}' = {ordinal}"),
                    ));
                }
            }
        }
        Ok(EnumDef { entries })
    }

    pub fn entries(&self) -> &[(String, i32)] {
        &self.entries
    }

    pub fn name_of(&self, ordinal: i32) -> Result<&str> {
        self.entries
            .iter()
            .find(|(_, o)| *o == ordinal)
            .map(|(n, _)| n.as_str())
            .ok_or_else(|| {
                Error::invalid_arg("ordinal", format!("no enum constant with ordinal {ordinal}"))
            })
    }

    pub fn ordinal_of(&self, name: &str) -> Result<i32> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, o)| *o)
            .ok_or_else(|| Error::invalid_arg("name", format!("no enum constant named '{name}'")))
    }
}

/// Static metadata of one column in a row stream: name, type tag, nullability,
/// precision/scale, timezone, nested columns and (for aggregate-state
/// columns) the aggregate-function kind.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    tag: TypeTag,
    nullable: bool,
    precision: u32,
    scale: u32,
    fixed_len: usize,
    timezone: Option<TimeZone>,
    nested: Vec<Column>,
    enum_values: Option<EnumDef>,
    aggregate: Option<AggregateKind>,
}

impl Column {
    /// A plain column of the given tag, without parameters.
    pub fn new(name: impl Into<String>, tag: TypeTag) -> Column {
        Column {
            name: name.into(),
            tag,
            nullable: false,
            precision: 0,
            scale: 0,
            fixed_len: 0,
            timezone: None,
            nested: Vec::new(),
            enum_values: None,
            aggregate: None,
        }
    }

    /// Marks the column nullable: the codec adds the one-byte null envelope.
    pub fn nullable(mut self) -> Column {
        self.nullable = true;
        self
    }

    pub fn with_timezone(mut self, tz: TimeZone) -> Column {
        self.timezone = Some(tz);
        self
    }

    /// A decimal column; the tag is chosen by precision, the scale travels
    /// out-of-band with this metadata (the wire carries scaled integers only).
    pub fn decimal(name: impl Into<String>, precision: u32, scale: u32) -> Result<Column> {
        let tag = TypeTag::decimal_for_precision(precision).ok_or_else(|| {
            Error::invalid_arg("precision", format!("{precision} is not within 1..=76"))
        })?;
        verify_arg!(scale, scale <= precision);
        let mut column = Column::new(name, tag);
        column.precision = precision;
        column.scale = scale;
        Ok(column)
    }

    /// A `FixedString(len)` column.
    pub fn fixed_string(name: impl Into<String>, len: usize) -> Result<Column> {
        verify_arg!(len, len > 0);
        let mut column = Column::new(name, TypeTag::FixedString);
        column.fixed_len = len;
        Ok(column)
    }

    /// A `DateTime` column (whole seconds), optionally zoned.
    pub fn datetime(name: impl Into<String>, tz: Option<TimeZone>) -> Column {
        let mut column = Column::new(name, TypeTag::DateTime32);
        column.timezone = tz;
        column
    }

    /// A `DateTime64(scale)` column, scale in 0..=9.
    pub fn datetime64(name: impl Into<String>, scale: u32, tz: Option<TimeZone>) -> Result<Column> {
        verify_arg!(scale, scale <= crate::defs::DATETIME64_MAX_SCALE);
        let mut column = Column::new(name, TypeTag::DateTime64);
        column.scale = scale;
        column.timezone = tz;
        Ok(column)
    }

    pub fn enum8<N: Into<String>>(
        name: impl Into<String>,
        entries: impl IntoIterator<Item = (N, i32)>,
    ) -> Result<Column> {
        let def = EnumDef::new(entries)?;
        for (_, ordinal) in def.entries() {
            verify_arg!(ordinal, (i8::MIN as i32..=i8::MAX as i32).contains(ordinal));
        }
        let mut column = Column::new(name, TypeTag::Enum8);
        column.enum_values = Some(def);
        Ok(column)
    }

    pub fn enum16<N: Into<String>>(
        name: impl Into<String>,
        entries: impl IntoIterator<Item = (N, i32)>,
    ) -> Result<Column> {
        let def = EnumDef::new(entries)?;
        for (_, ordinal) in def.entries() {
            verify_arg!(ordinal, (i16::MIN as i32..=i16::MAX as i32).contains(ordinal));
        }
        let mut column = Column::new(name, TypeTag::Enum16);
        column.enum_values = Some(def);
        Ok(column)
    }

    /// An `Array(T)` column.
    pub fn array(name: impl Into<String>, element: Column) -> Column {
        let mut column = Column::new(name, TypeTag::Array);
        column.nested = vec![element];
        column
    }

    /// A `Map(K, V)` column.
    pub fn map(name: impl Into<String>, key: Column, value: Column) -> Column {
        let mut column = Column::new(name, TypeTag::Map);
        column.nested = vec![key, value];
        column
    }

    /// A `Tuple(...)` column; the element count is part of the schema and is
    /// never written to the wire.
    pub fn tuple(name: impl Into<String>, elements: impl IntoIterator<Item = Column>) -> Column {
        let mut column = Column::new(name, TypeTag::Tuple);
        column.nested = elements.into_iter().collect();
        column
    }

    /// A `Nested(...)` column.
    pub fn nested(name: impl Into<String>, columns: impl IntoIterator<Item = Column>) -> Column {
        let mut column = Column::new(name, TypeTag::Nested);
        column.nested = columns.into_iter().collect();
        column
    }

    /// A `SimpleAggregateFunction(kind, T)` column; the codec is the inner
    /// column's codec.
    pub fn simple_aggregate(
        name: impl Into<String>,
        kind: AggregateKind,
        inner: Column,
    ) -> Column {
        let mut column = Column::new(name, TypeTag::SimpleAggregateFunction);
        column.aggregate = Some(kind);
        column.nested = vec![inner];
        column
    }

    /// An `AggregateFunction(kind, T)` state column.
    pub fn aggregate(name: impl Into<String>, kind: AggregateKind, inner: Column) -> Column {
        let mut column = Column::new(name, TypeTag::AggregateFunction);
        column.aggregate = Some(kind);
        column.nested = vec![inner];
        column
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Byte length of a `FixedString` column, zero otherwise.
    pub fn fixed_len(&self) -> usize {
        self.fixed_len
    }

    pub fn timezone(&self) -> Option<&TimeZone> {
        self.timezone.as_ref()
    }

    pub fn nested_columns(&self) -> &[Column] {
        &self.nested
    }

    pub fn enum_values(&self) -> Option<&EnumDef> {
        self.enum_values.as_ref()
    }

    pub fn aggregate_kind(&self) -> Option<AggregateKind> {
        self.aggregate
    }

    /// Renders the full type expression, e.g. `Nullable(Decimal64(4))` or
    /// `Array(Map(String, UInt32))`.
    pub fn type_expr(&self) -> String {
        let inner = match self.tag {
            TypeTag::Decimal32 | TypeTag::Decimal64 | TypeTag::Decimal128 | TypeTag::Decimal256 => {
                format!("Decimal({}, {})", self.precision, self.scale)
            }
            TypeTag::FixedString => format!("FixedString({})", self.fixed_len),
            TypeTag::DateTime32 => match &self.timezone {
                Some(tz) => format!("DateTime('{}')", tz.iana_name().unwrap_or("UTC")),
                None => "DateTime".to_string(),
            },
            TypeTag::DateTime64 => match &self.timezone {
                Some(tz) => format!(
                    "DateTime64({}, '{}')",
                    self.scale,
                    tz.iana_name().unwrap_or("UTC")
                ),
                None => format!("DateTime64({})", self.scale),
            },
            TypeTag::Enum8 | TypeTag::Enum16 => {
                let entries = self
                    .enum_values
                    .as_ref()
                    .map(|def| {
                        def.entries()
                            .iter()
                            .map(|(n, o)| format!("'{n}' = {o}"))
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                    .unwrap_or_default();
                format!("{}({})", self.tag.name(), entries)
            }
            TypeTag::Array | TypeTag::Map | TypeTag::Tuple | TypeTag::Nested => {
                let items = self
                    .nested
                    .iter()
                    .map(|c| c.type_expr())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}({})", self.tag.name(), items)
            }
            TypeTag::SimpleAggregateFunction | TypeTag::AggregateFunction => {
                let kind = self.aggregate.map(|k| k.name()).unwrap_or("?");
                let items = self
                    .nested
                    .iter()
                    .map(|c| c.type_expr())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}({}, {})", self.tag.name(), kind, items)
            }
            tag => tag.name().to_string(),
        };
        if self.nullable {
            format!("Nullable({inner})")
        } else {
            inner
        }
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.type_expr())
    }
}
