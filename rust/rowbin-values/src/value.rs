//! The `Value` slot: one per column, reused across rows.

use std::net::{Ipv4Addr, Ipv6Addr};

use jiff::Timestamp;
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};
use uuid::Uuid;

use crate::bitmap::Bitmap;
use crate::decimal::{Decimal, pow10};
use rowbin_common::{Result, error::Error};
use rowbin_format::{Column, TypeTag};

pub type Point = [f64; 2];
pub type Ring = Vec<Point>;
pub type Polygon = Vec<Ring>;
pub type MultiPolygon = Vec<Polygon>;

/// Kind-tagged payload of a [`Value`].
#[derive(Debug, Clone, PartialEq)]
pub enum ValueData {
    /// Kind-less empty payload; a freshly constructed null has no kind yet.
    Nothing,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Int128(i128),
    Int256(BigInt),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    UInt128(u128),
    UInt256(BigInt),
    Float32(f32),
    Float64(f64),
    Decimal(Decimal),
    /// Binary-safe string bytes; UTF-8 is checked on `as_str`, not here.
    String(Vec<u8>),
    /// Days since the Unix epoch.
    Date(i32),
    /// An absolute instant: epoch seconds plus nanoseconds.
    DateTime(Timestamp),
    Enum8(i8),
    Enum16(i16),
    Uuid(Uuid),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    Point(Point),
    Ring(Ring),
    Polygon(Polygon),
    MultiPolygon(MultiPolygon),
    Array(Vec<Value>),
    /// Insertion-ordered key/value pairs.
    Map(Vec<(Value, Value)>),
    Tuple(Vec<Value>),
    /// Rows of sub-column values.
    Nested(Vec<Vec<Value>>),
    Bitmap(Bitmap),
}

impl ValueData {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ValueData::Nothing => "Nothing",
            ValueData::Bool(_) => "Bool",
            ValueData::Int8(_) => "Int8",
            ValueData::Int16(_) => "Int16",
            ValueData::Int32(_) => "Int32",
            ValueData::Int64(_) => "Int64",
            ValueData::Int128(_) => "Int128",
            ValueData::Int256(_) => "Int256",
            ValueData::UInt8(_) => "UInt8",
            ValueData::UInt16(_) => "UInt16",
            ValueData::UInt32(_) => "UInt32",
            ValueData::UInt64(_) => "UInt64",
            ValueData::UInt128(_) => "UInt128",
            ValueData::UInt256(_) => "UInt256",
            ValueData::Float32(_) => "Float32",
            ValueData::Float64(_) => "Float64",
            ValueData::Decimal(_) => "Decimal",
            ValueData::String(_) => "String",
            ValueData::Date(_) => "Date",
            ValueData::DateTime(_) => "DateTime",
            ValueData::Enum8(_) => "Enum8",
            ValueData::Enum16(_) => "Enum16",
            ValueData::Uuid(_) => "UUID",
            ValueData::Ipv4(_) => "IPv4",
            ValueData::Ipv6(_) => "IPv6",
            ValueData::Point(_) => "Point",
            ValueData::Ring(_) => "Ring",
            ValueData::Polygon(_) => "Polygon",
            ValueData::MultiPolygon(_) => "MultiPolygon",
            ValueData::Array(_) => "Array",
            ValueData::Map(_) => "Map",
            ValueData::Tuple(_) => "Tuple",
            ValueData::Nested(_) => "Nested",
            ValueData::Bitmap(_) => "Bitmap",
        }
    }
}

/// One column's datum: a nullability flag plus a kind-tagged payload.
///
/// Within a streaming pass a single `Value` per column is reused for every
/// row: `update` and the deserializers mutate it in place and hand back the
/// same identity. Do not keep a borrow across the next row if the previous
/// row's datum is still needed; take a `clone()` snapshot instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    null: bool,
    data: ValueData,
}

impl Value {
    /// A kind-less null.
    pub fn null() -> Value {
        Value {
            null: true,
            data: ValueData::Nothing,
        }
    }

    /// A non-null value holding `data`.
    pub fn of(data: impl Into<ValueData>) -> Value {
        let data = data.into();
        Value {
            null: matches!(data, ValueData::Nothing),
            data,
        }
    }

    /// An empty (null) slot of the kind matching `column`, ready to be filled
    /// by the column's deserializer.
    pub fn empty_for(column: &Column) -> Value {
        let data = match column.tag() {
            TypeTag::Bool => ValueData::Bool(false),
            TypeTag::Int8 => ValueData::Int8(0),
            TypeTag::Int16 => ValueData::Int16(0),
            TypeTag::Int32 => ValueData::Int32(0),
            TypeTag::Int64 => ValueData::Int64(0),
            TypeTag::Int128 => ValueData::Int128(0),
            TypeTag::Int256 => ValueData::Int256(BigInt::ZERO),
            TypeTag::UInt8 => ValueData::UInt8(0),
            TypeTag::UInt16 => ValueData::UInt16(0),
            TypeTag::UInt32 => ValueData::UInt32(0),
            TypeTag::UInt64 => ValueData::UInt64(0),
            TypeTag::UInt128 => ValueData::UInt128(0),
            TypeTag::UInt256 => ValueData::UInt256(BigInt::ZERO),
            TypeTag::Float32 => ValueData::Float32(0.0),
            TypeTag::Float64 => ValueData::Float64(0.0),
            TypeTag::Decimal32
            | TypeTag::Decimal64
            | TypeTag::Decimal128
            | TypeTag::Decimal256 => ValueData::Decimal(Decimal::zero(column.scale())),
            TypeTag::String | TypeTag::FixedString => ValueData::String(Vec::new()),
            TypeTag::Date | TypeTag::Date32 => ValueData::Date(0),
            TypeTag::DateTime32 | TypeTag::DateTime64 => {
                ValueData::DateTime(Timestamp::UNIX_EPOCH)
            }
            TypeTag::Enum8 => ValueData::Enum8(0),
            TypeTag::Enum16 => ValueData::Enum16(0),
            TypeTag::Uuid => ValueData::Uuid(Uuid::nil()),
            TypeTag::Ipv4 => ValueData::Ipv4(Ipv4Addr::UNSPECIFIED),
            TypeTag::Ipv6 => ValueData::Ipv6(Ipv6Addr::UNSPECIFIED),
            TypeTag::Point => ValueData::Point([0.0, 0.0]),
            TypeTag::Ring => ValueData::Ring(Vec::new()),
            TypeTag::Polygon => ValueData::Polygon(Vec::new()),
            TypeTag::MultiPolygon => ValueData::MultiPolygon(Vec::new()),
            TypeTag::Array => ValueData::Array(Vec::new()),
            TypeTag::Map => ValueData::Map(Vec::new()),
            TypeTag::Tuple => ValueData::Tuple(
                column
                    .nested_columns()
                    .iter()
                    .map(Value::empty_for)
                    .collect(),
            ),
            TypeTag::Nested => ValueData::Nested(Vec::new()),
            TypeTag::SimpleAggregateFunction => {
                return match column.nested_columns().first() {
                    Some(inner) => Value::empty_for(inner),
                    None => Value::null(),
                };
            }
            TypeTag::AggregateFunction => column
                .nested_columns()
                .first()
                .and_then(|inner| Bitmap::empty(inner.tag()).ok())
                .map(ValueData::Bitmap)
                .unwrap_or(ValueData::Nothing),
        };
        Value { null: true, data }
    }

    pub fn is_null_or_empty(&self) -> bool {
        self.null
    }

    pub fn set_null(&mut self) {
        self.null = true;
    }

    pub fn data(&self) -> &ValueData {
        &self.data
    }

    /// Replaces the payload and clears the null flag. Used by deserializers;
    /// does not coerce.
    pub fn assign(&mut self, data: ValueData) {
        self.null = matches!(data, ValueData::Nothing);
        self.data = data;
    }

    /// Takes the payload out, leaving a kind-less null behind. Lets codecs
    /// reuse container allocations across rows.
    pub fn take_data(&mut self) -> ValueData {
        self.null = true;
        std::mem::replace(&mut self.data, ValueData::Nothing)
    }

    /// Clears and returns the slot's string buffer, installing one if the
    /// slot held another kind. Clears the null flag.
    pub fn string_buf_mut(&mut self) -> &mut Vec<u8> {
        self.null = false;
        match &mut self.data {
            ValueData::String(buf) => {
                buf.clear();
            }
            data => *data = ValueData::String(Vec::new()),
        }
        match &mut self.data {
            ValueData::String(buf) => buf,
            _ => unreachable!("just installed a string payload"),
        }
    }

    /// Coerces `raw` into this slot's kind, mutates the slot in place and
    /// returns the same identity. A kind-less slot adopts the raw kind; a
    /// kind-less raw turns the slot null. Numeric coercions range-check and
    /// fail with `OutOfRange` instead of truncating.
    pub fn update(&mut self, raw: impl Into<ValueData>) -> Result<&mut Value> {
        let raw = raw.into();
        if matches!(raw, ValueData::Nothing) {
            self.null = true;
            return Ok(self);
        }
        if matches!(self.data, ValueData::Nothing)
            || std::mem::discriminant(&self.data) == std::mem::discriminant(&raw)
        {
            self.assign(raw);
            return Ok(self);
        }

        let incoming = Value::of(raw);
        let coerced = match &self.data {
            ValueData::Bool(_) => ValueData::Bool(incoming.as_bool()?),
            ValueData::Int8(_) => ValueData::Int8(incoming.as_i8()?),
            ValueData::Int16(_) => ValueData::Int16(incoming.as_i16()?),
            ValueData::Int32(_) => ValueData::Int32(incoming.as_i32()?),
            ValueData::Int64(_) => ValueData::Int64(incoming.as_i64()?),
            ValueData::Int128(_) => ValueData::Int128(incoming.as_i128()?),
            ValueData::Int256(_) => ValueData::Int256(incoming.as_bigint()?),
            ValueData::UInt8(_) => ValueData::UInt8(incoming.as_u8()?),
            ValueData::UInt16(_) => ValueData::UInt16(incoming.as_u16()?),
            ValueData::UInt32(_) => ValueData::UInt32(incoming.as_u32()?),
            ValueData::UInt64(_) => ValueData::UInt64(incoming.as_u64()?),
            ValueData::UInt128(_) => ValueData::UInt128(incoming.as_u128()?),
            ValueData::UInt256(_) => ValueData::UInt256(incoming.as_unsigned_bigint()?),
            ValueData::Float32(_) => ValueData::Float32(incoming.as_f32()?),
            ValueData::Float64(_) => ValueData::Float64(incoming.as_f64()?),
            ValueData::Decimal(d) => ValueData::Decimal(incoming.as_decimal(d.scale())?),
            ValueData::Date(_) => ValueData::Date(incoming.as_epoch_days()?),
            ValueData::DateTime(_) => ValueData::DateTime(incoming.as_timestamp()?),
            ValueData::Enum8(_) => ValueData::Enum8(incoming.as_i8()?),
            ValueData::Enum16(_) => ValueData::Enum16(incoming.as_i16()?),
            ValueData::Uuid(_) => ValueData::Uuid(incoming.as_uuid()?),
            ValueData::Ipv4(_) => ValueData::Ipv4(incoming.as_ipv4()?),
            ValueData::Ipv6(_) => ValueData::Ipv6(incoming.as_ipv6()?),
            current => {
                return Err(Error::invalid_arg(
                    "raw",
                    format!(
                        "cannot convert {} into {}",
                        incoming.data.kind_name(),
                        current.kind_name()
                    ),
                ));
            }
        };
        self.assign(coerced);
        Ok(self)
    }

    fn mismatch(&self, wanted: &str) -> Error {
        Error::invalid_arg(
            "value",
            format!("cannot read {} as {wanted}", self.data.kind_name()),
        )
    }

    pub fn as_bool(&self) -> Result<bool> {
        if self.null {
            return Ok(false);
        }
        match &self.data {
            ValueData::Bool(v) => Ok(*v),
            _ => Ok(self.as_i128()? != 0),
        }
    }

    /// Signed 128-bit view of any numeric kind; the base of the narrower
    /// signed accessors.
    pub fn as_i128(&self) -> Result<i128> {
        if self.null {
            return Ok(0);
        }
        match &self.data {
            ValueData::Bool(v) => Ok(*v as i128),
            ValueData::Int8(v) => Ok(*v as i128),
            ValueData::Int16(v) => Ok(*v as i128),
            ValueData::Int32(v) => Ok(*v as i128),
            ValueData::Int64(v) => Ok(*v as i128),
            ValueData::Int128(v) => Ok(*v),
            ValueData::UInt8(v) => Ok(*v as i128),
            ValueData::UInt16(v) => Ok(*v as i128),
            ValueData::UInt32(v) => Ok(*v as i128),
            ValueData::UInt64(v) => Ok(*v as i128),
            ValueData::UInt128(v) => (*v)
                .try_into()
                .map_err(|_| Error::out_of_range("value", v, "Int128")),
            ValueData::Int256(v) | ValueData::UInt256(v) => v
                .to_i128()
                .ok_or_else(|| Error::out_of_range("value", v, "Int128")),
            ValueData::Float32(v) => Ok(*v as i128),
            ValueData::Float64(v) => Ok(*v as i128),
            ValueData::Decimal(d) => d
                .to_bigint()
                .to_i128()
                .ok_or_else(|| Error::out_of_range("value", d, "Int128")),
            ValueData::Enum8(v) => Ok(*v as i128),
            ValueData::Enum16(v) => Ok(*v as i128),
            ValueData::Date(v) => Ok(*v as i128),
            ValueData::DateTime(ts) => Ok(ts.as_second() as i128),
            _ => Err(self.mismatch("an integer")),
        }
    }

    /// Unsigned 128-bit view; negative values are out of range, never
    /// reinterpreted.
    pub fn as_u128(&self) -> Result<u128> {
        let v = match &self.data {
            ValueData::UInt128(v) if !self.null => return Ok(*v),
            ValueData::Int256(v) | ValueData::UInt256(v) if !self.null => {
                return v
                    .to_u128()
                    .ok_or_else(|| Error::out_of_range("value", v, "UInt128"));
            }
            _ => self.as_i128()?,
        };
        v.try_into()
            .map_err(|_| Error::out_of_range("value", v, "UInt128"))
    }

    pub fn as_i8(&self) -> Result<i8> {
        narrow_signed(self.as_i128()?, "Int8")
    }

    pub fn as_i16(&self) -> Result<i16> {
        narrow_signed(self.as_i128()?, "Int16")
    }

    pub fn as_i32(&self) -> Result<i32> {
        narrow_signed(self.as_i128()?, "Int32")
    }

    pub fn as_i64(&self) -> Result<i64> {
        narrow_signed(self.as_i128()?, "Int64")
    }

    pub fn as_u8(&self) -> Result<u8> {
        narrow_unsigned(self.as_u128()?, "UInt8")
    }

    pub fn as_u16(&self) -> Result<u16> {
        narrow_unsigned(self.as_u128()?, "UInt16")
    }

    pub fn as_u32(&self) -> Result<u32> {
        narrow_unsigned(self.as_u128()?, "UInt32")
    }

    pub fn as_u64(&self) -> Result<u64> {
        narrow_unsigned(self.as_u128()?, "UInt64")
    }

    /// Arbitrary-precision view; exact for every integer kind, truncating for
    /// decimals and floats.
    pub fn as_bigint(&self) -> Result<BigInt> {
        if self.null {
            return Ok(BigInt::ZERO);
        }
        match &self.data {
            ValueData::Int256(v) | ValueData::UInt256(v) => Ok(v.clone()),
            ValueData::UInt128(v) => Ok(BigInt::from(*v)),
            ValueData::Decimal(d) => Ok(d.to_bigint()),
            ValueData::Float32(v) => float_to_bigint(*v as f64),
            ValueData::Float64(v) => float_to_bigint(*v),
            _ => Ok(BigInt::from(self.as_i128()?)),
        }
    }

    /// Arbitrary-precision view that rejects negative values.
    pub fn as_unsigned_bigint(&self) -> Result<BigInt> {
        let v = self.as_bigint()?;
        if v.sign() == num_bigint::Sign::Minus {
            return Err(Error::out_of_range("value", &v, "an unsigned integer"));
        }
        Ok(v)
    }

    pub fn as_f32(&self) -> Result<f32> {
        Ok(self.as_f64()? as f32)
    }

    pub fn as_f64(&self) -> Result<f64> {
        if self.null {
            return Ok(0.0);
        }
        match &self.data {
            ValueData::Float32(v) => Ok(*v as f64),
            ValueData::Float64(v) => Ok(*v),
            ValueData::Decimal(d) => Ok(d.to_f64()),
            ValueData::Int256(v) | ValueData::UInt256(v) => Ok(v.to_f64().unwrap_or(f64::NAN)),
            _ => Ok(self.as_i128()? as f64),
        }
    }

    /// This value as a decimal at exactly `scale` digits.
    pub fn as_decimal(&self, scale: u32) -> Result<Decimal> {
        if self.null {
            return Ok(Decimal::zero(scale));
        }
        match &self.data {
            ValueData::Decimal(d) => Ok(d.rescaled(scale)),
            ValueData::Float32(v) => Decimal::from_f64(*v as f64, scale),
            ValueData::Float64(v) => Decimal::from_f64(*v, scale),
            ValueData::Int256(v) | ValueData::UInt256(v) => {
                Ok(Decimal::new(v * pow10(scale), scale))
            }
            _ => Ok(Decimal::new(
                BigInt::from(self.as_i128()?) * pow10(scale),
                scale,
            )),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8]> {
        if self.null {
            return Ok(&[]);
        }
        match &self.data {
            ValueData::String(v) => Ok(v),
            _ => Err(self.mismatch("bytes")),
        }
    }

    /// String view with the charset check: the bytes must be valid UTF-8.
    pub fn as_str(&self) -> Result<&str> {
        std::str::from_utf8(self.as_bytes()?)
            .map_err(|e| Error::invalid_data("string", e.to_string()))
    }

    /// Byte view checked against a fixed column width.
    pub fn as_fixed_bytes(&self, len: usize) -> Result<&[u8]> {
        let bytes = self.as_bytes()?;
        if bytes.len() > len {
            return Err(Error::out_of_range(
                "value",
                format!("{} bytes", bytes.len()),
                format!("FixedString({len})"),
            ));
        }
        Ok(bytes)
    }

    pub fn as_epoch_days(&self) -> Result<i32> {
        if self.null {
            return Ok(0);
        }
        match &self.data {
            ValueData::Date(v) => Ok(*v),
            ValueData::DateTime(ts) => {
                let days = ts.as_second().div_euclid(86400);
                days.try_into()
                    .map_err(|_| Error::out_of_range("value", days, "an epoch day count"))
            }
            _ => self.as_i32(),
        }
    }

    pub fn as_timestamp(&self) -> Result<Timestamp> {
        if self.null {
            return Ok(Timestamp::UNIX_EPOCH);
        }
        match &self.data {
            ValueData::DateTime(ts) => Ok(*ts),
            ValueData::Date(days) => Timestamp::from_second(*days as i64 * 86400)
                .map_err(|_| Error::out_of_range("value", days, "a timestamp")),
            _ => {
                let seconds = self.as_i64()?;
                Timestamp::from_second(seconds)
                    .map_err(|_| Error::out_of_range("value", seconds, "a timestamp"))
            }
        }
    }

    /// The instant rebased into a display timezone, typically the owning
    /// column's. The stored payload stays an absolute instant; only the
    /// civil rendering changes.
    pub fn as_zoned(&self, tz: jiff::tz::TimeZone) -> Result<jiff::Zoned> {
        Ok(self.as_timestamp()?.to_zoned(tz))
    }

    pub fn as_enum_ordinal(&self) -> Result<i32> {
        if self.null {
            return Ok(0);
        }
        match &self.data {
            ValueData::Enum8(v) => Ok(*v as i32),
            ValueData::Enum16(v) => Ok(*v as i32),
            _ => self.as_i32(),
        }
    }

    pub fn as_uuid(&self) -> Result<Uuid> {
        if self.null {
            return Ok(Uuid::nil());
        }
        match &self.data {
            ValueData::Uuid(v) => Ok(*v),
            ValueData::String(_) => Uuid::parse_str(self.as_str()?)
                .map_err(|e| Error::invalid_arg("value", e.to_string())),
            _ => Err(self.mismatch("UUID")),
        }
    }

    pub fn as_ipv4(&self) -> Result<Ipv4Addr> {
        if self.null {
            return Ok(Ipv4Addr::UNSPECIFIED);
        }
        match &self.data {
            ValueData::Ipv4(v) => Ok(*v),
            ValueData::UInt32(v) => Ok(Ipv4Addr::from(*v)),
            ValueData::String(_) => self
                .as_str()?
                .parse()
                .map_err(|_| Error::invalid_arg("value", "not an IPv4 address")),
            _ => Err(self.mismatch("IPv4")),
        }
    }

    pub fn as_ipv6(&self) -> Result<Ipv6Addr> {
        if self.null {
            return Ok(Ipv6Addr::UNSPECIFIED);
        }
        match &self.data {
            ValueData::Ipv6(v) => Ok(*v),
            ValueData::Ipv4(v) => Ok(v.to_ipv6_mapped()),
            ValueData::String(_) => self
                .as_str()?
                .parse()
                .map_err(|_| Error::invalid_arg("value", "not an IPv6 address")),
            _ => Err(self.mismatch("IPv6")),
        }
    }

    pub fn as_point(&self) -> Result<Point> {
        if self.null {
            return Ok([0.0, 0.0]);
        }
        match &self.data {
            ValueData::Point(v) => Ok(*v),
            _ => Err(self.mismatch("Point")),
        }
    }

    pub fn as_ring(&self) -> Result<&Ring> {
        static EMPTY: Ring = Vec::new();
        if self.null {
            return Ok(&EMPTY);
        }
        match &self.data {
            ValueData::Ring(v) => Ok(v),
            _ => Err(self.mismatch("Ring")),
        }
    }

    pub fn as_polygon(&self) -> Result<&Polygon> {
        static EMPTY: Polygon = Vec::new();
        if self.null {
            return Ok(&EMPTY);
        }
        match &self.data {
            ValueData::Polygon(v) => Ok(v),
            _ => Err(self.mismatch("Polygon")),
        }
    }

    pub fn as_multi_polygon(&self) -> Result<&MultiPolygon> {
        static EMPTY: MultiPolygon = Vec::new();
        if self.null {
            return Ok(&EMPTY);
        }
        match &self.data {
            ValueData::MultiPolygon(v) => Ok(v),
            _ => Err(self.mismatch("MultiPolygon")),
        }
    }

    pub fn as_array(&self) -> Result<&[Value]> {
        if self.null {
            return Ok(&[]);
        }
        match &self.data {
            ValueData::Array(v) => Ok(v),
            _ => Err(self.mismatch("Array")),
        }
    }

    pub fn as_map(&self) -> Result<&[(Value, Value)]> {
        if self.null {
            return Ok(&[]);
        }
        match &self.data {
            ValueData::Map(v) => Ok(v),
            _ => Err(self.mismatch("Map")),
        }
    }

    pub fn as_tuple(&self) -> Result<&[Value]> {
        if self.null {
            return Ok(&[]);
        }
        match &self.data {
            ValueData::Tuple(v) => Ok(v),
            _ => Err(self.mismatch("Tuple")),
        }
    }

    pub fn as_nested(&self) -> Result<&[Vec<Value>]> {
        if self.null {
            return Ok(&[]);
        }
        match &self.data {
            ValueData::Nested(v) => Ok(v),
            _ => Err(self.mismatch("Nested")),
        }
    }

    pub fn as_bitmap(&self) -> Result<&Bitmap> {
        match &self.data {
            ValueData::Bitmap(v) => Ok(v),
            _ => Err(self.mismatch("Bitmap")),
        }
    }
}

fn narrow_signed<T>(v: i128, target: &str) -> Result<T>
where
    T: TryFrom<i128>,
{
    T::try_from(v).map_err(|_| Error::out_of_range("value", v, target))
}

fn narrow_unsigned<T>(v: u128, target: &str) -> Result<T>
where
    T: TryFrom<u128>,
{
    T::try_from(v).map_err(|_| Error::out_of_range("value", v, target))
}

fn float_to_bigint(v: f64) -> Result<BigInt> {
    BigInt::from_f64(v.trunc()).ok_or_else(|| Error::out_of_range("value", v, "an integer"))
}

impl Default for Value {
    fn default() -> Value {
        Value::null()
    }
}

macro_rules! value_data_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ValueData {
                fn from(v: $ty) -> ValueData {
                    ValueData::$variant(v.into())
                }
            }
        )*
    };
}

value_data_from! {
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    i128 => Int128,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    u128 => UInt128,
    f32 => Float32,
    f64 => Float64,
    Decimal => Decimal,
    Vec<u8> => String,
    Timestamp => DateTime,
    Uuid => Uuid,
    Ipv4Addr => Ipv4,
    Ipv6Addr => Ipv6,
    Bitmap => Bitmap,
    Vec<Value> => Array,
}

impl From<&str> for ValueData {
    fn from(v: &str) -> ValueData {
        ValueData::String(v.as_bytes().to_vec())
    }
}

impl From<String> for ValueData {
    fn from(v: String) -> ValueData {
        ValueData::String(v.into_bytes())
    }
}

impl<T: Into<ValueData>> From<Option<T>> for ValueData {
    fn from(v: Option<T>) -> ValueData {
        match v {
            Some(v) => v.into(),
            None => ValueData::Nothing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_slot_keeps_its_kind() {
        let col = Column::new("n", TypeTag::UInt32);
        let mut slot = Value::empty_for(&col);
        assert!(slot.is_null_or_empty());
        assert_eq!(slot.as_u32().unwrap(), 0);

        slot.update(7u32).unwrap();
        assert!(!slot.is_null_or_empty());
        slot.set_null();
        assert!(slot.is_null_or_empty());
        assert!(matches!(slot.data(), ValueData::UInt32(_)));
    }

    #[test]
    fn update_returns_same_slot_and_coerces() {
        let mut slot = Value::of(0u16);
        slot.update(300i64).unwrap();
        assert_eq!(slot.as_u16().unwrap(), 300);
        // Too wide for the slot's kind: error, not truncation.
        assert!(slot.update(70000i64).is_err());
        // Negative into unsigned: error, not reinterpretation.
        assert!(slot.update(-1i32).is_err());
        // The failed updates left the last good value in place.
        assert_eq!(slot.as_u16().unwrap(), 300);
    }

    #[test]
    fn update_with_none_turns_null() {
        let mut slot = Value::of(5i32);
        slot.update(Option::<i32>::None).unwrap();
        assert!(slot.is_null_or_empty());
        assert!(matches!(slot.data(), ValueData::Int32(_)));
    }

    #[test]
    fn unsigned_widening_is_exact() {
        let v = Value::of(u64::MAX);
        assert_eq!(v.as_u128().unwrap(), u64::MAX as u128);
        assert_eq!(v.as_bigint().unwrap(), BigInt::from(u64::MAX));
        assert!(v.as_i64().is_err());
        assert_eq!(v.as_i128().unwrap(), u64::MAX as i128);
    }

    #[test]
    fn numeric_defaults_when_null() {
        let v = Value::null();
        assert_eq!(v.as_i32().unwrap(), 0);
        assert_eq!(v.as_u64().unwrap(), 0);
        assert_eq!(v.as_f64().unwrap(), 0.0);
        assert_eq!(v.as_bytes().unwrap(), b"");
        assert_eq!(v.as_array().unwrap().len(), 0);
    }

    #[test]
    fn decimal_views() {
        let v = Value::of(ValueData::Decimal("12.345".parse().unwrap()));
        assert_eq!(v.as_decimal(5).unwrap().to_string(), "12.34500");
        assert_eq!(v.as_i32().unwrap(), 12);
        let from_int = Value::of(5i32);
        assert_eq!(from_int.as_decimal(3).unwrap().to_string(), "5.000");
    }

    #[test]
    fn string_charset_check() {
        let ok = Value::of("héllo");
        assert_eq!(ok.as_str().unwrap(), "héllo");
        let bad = Value::of(ValueData::String(vec![0xFF, 0xFE]));
        assert!(bad.as_str().is_err());
        assert_eq!(bad.as_bytes().unwrap(), &[0xFF, 0xFE]);
    }

    #[test]
    fn fixed_bytes_length_check() {
        let v = Value::of("abc");
        assert_eq!(v.as_fixed_bytes(4).unwrap(), b"abc");
        assert_eq!(v.as_fixed_bytes(3).unwrap(), b"abc");
        assert!(v.as_fixed_bytes(2).is_err());
    }

    #[test]
    fn timestamp_views() {
        let ts = Timestamp::from_second(86400 * 3 + 7).unwrap();
        let v = Value::of(ts);
        assert_eq!(v.as_epoch_days().unwrap(), 3);
        assert_eq!(v.as_timestamp().unwrap(), ts);

        let d = Value::of(ValueData::Date(3));
        assert_eq!(d.as_timestamp().unwrap().as_second(), 86400 * 3);
    }

    #[test]
    fn zoned_view_rebases_through_the_instant() {
        let ts = Timestamp::from_second(3600).unwrap();
        let v = Value::of(ts);
        let zoned = v
            .as_zoned(jiff::tz::TimeZone::fixed(jiff::tz::offset(9)))
            .unwrap();
        assert_eq!(zoned.hour(), 10);
        assert_eq!(zoned.timestamp(), ts);
    }

    #[test]
    fn ip_views() {
        let v = Value::of(0x01020304u32);
        assert_eq!(v.as_ipv4().unwrap(), Ipv4Addr::new(1, 2, 3, 4));
        let s = Value::of("10.0.0.1");
        assert_eq!(s.as_ipv4().unwrap(), Ipv4Addr::new(10, 0, 0, 1));
    }
}
