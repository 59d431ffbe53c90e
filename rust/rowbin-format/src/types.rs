//! The closed set of column type tags understood by the codec.

/// Type tag of a single column, as declared by the server-side schema.
///
/// The set is closed: the dispatch table is built by an exhaustive match over
/// this enum, so a tag without a codec cannot exist at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    Int256,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    UInt128,
    UInt256,
    Float32,
    Float64,
    Decimal32,
    Decimal64,
    Decimal128,
    Decimal256,
    String,
    FixedString,
    Date,
    Date32,
    DateTime32,
    DateTime64,
    Enum8,
    Enum16,
    Uuid,
    Ipv4,
    Ipv6,
    Point,
    Ring,
    Polygon,
    MultiPolygon,
    Array,
    Map,
    Tuple,
    Nested,
    SimpleAggregateFunction,
    AggregateFunction,
}

impl TypeTag {
    /// The SQL-facing name of the type.
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Bool => "Bool",
            TypeTag::Int8 => "Int8",
            TypeTag::Int16 => "Int16",
            TypeTag::Int32 => "Int32",
            TypeTag::Int64 => "Int64",
            TypeTag::Int128 => "Int128",
            TypeTag::Int256 => "Int256",
            TypeTag::UInt8 => "UInt8",
            TypeTag::UInt16 => "UInt16",
            TypeTag::UInt32 => "UInt32",
            TypeTag::UInt64 => "UInt64",
            TypeTag::UInt128 => "UInt128",
            TypeTag::UInt256 => "UInt256",
            TypeTag::Float32 => "Float32",
            TypeTag::Float64 => "Float64",
            TypeTag::Decimal32 => "Decimal32",
            TypeTag::Decimal64 => "Decimal64",
            TypeTag::Decimal128 => "Decimal128",
            TypeTag::Decimal256 => "Decimal256",
            TypeTag::String => "String",
            TypeTag::FixedString => "FixedString",
            TypeTag::Date => "Date",
            TypeTag::Date32 => "Date32",
            TypeTag::DateTime32 => "DateTime",
            TypeTag::DateTime64 => "DateTime64",
            TypeTag::Enum8 => "Enum8",
            TypeTag::Enum16 => "Enum16",
            TypeTag::Uuid => "UUID",
            TypeTag::Ipv4 => "IPv4",
            TypeTag::Ipv6 => "IPv6",
            TypeTag::Point => "Point",
            TypeTag::Ring => "Ring",
            TypeTag::Polygon => "Polygon",
            TypeTag::MultiPolygon => "MultiPolygon",
            TypeTag::Array => "Array",
            TypeTag::Map => "Map",
            TypeTag::Tuple => "Tuple",
            TypeTag::Nested => "Nested",
            TypeTag::SimpleAggregateFunction => "SimpleAggregateFunction",
            TypeTag::AggregateFunction => "AggregateFunction",
        }
    }

    /// Byte width of the wire payload for fixed-width scalar tags.
    pub fn byte_width(&self) -> Option<usize> {
        let width = match self {
            TypeTag::Bool | TypeTag::Int8 | TypeTag::UInt8 | TypeTag::Enum8 => 1,
            TypeTag::Int16 | TypeTag::UInt16 | TypeTag::Enum16 | TypeTag::Date => 2,
            TypeTag::Int32
            | TypeTag::UInt32
            | TypeTag::Float32
            | TypeTag::Decimal32
            | TypeTag::Date32
            | TypeTag::DateTime32
            | TypeTag::Ipv4 => 4,
            TypeTag::Int64
            | TypeTag::UInt64
            | TypeTag::Float64
            | TypeTag::Decimal64
            | TypeTag::DateTime64 => 8,
            TypeTag::Int128 | TypeTag::UInt128 | TypeTag::Decimal128 | TypeTag::Uuid
            | TypeTag::Ipv6 => 16,
            TypeTag::Int256 | TypeTag::UInt256 | TypeTag::Decimal256 => 32,
            _ => return None,
        };
        Some(width)
    }

    /// `true` for the 1/2/4/8-byte machine integers, the only kinds allowed
    /// as a bitmap aggregate's base type.
    pub fn is_native_integer(&self) -> bool {
        matches!(
            self,
            TypeTag::Int8
                | TypeTag::Int16
                | TypeTag::Int32
                | TypeTag::Int64
                | TypeTag::UInt8
                | TypeTag::UInt16
                | TypeTag::UInt32
                | TypeTag::UInt64
        )
    }

    pub fn is_signed_integer(&self) -> bool {
        matches!(
            self,
            TypeTag::Int8
                | TypeTag::Int16
                | TypeTag::Int32
                | TypeTag::Int64
                | TypeTag::Int128
                | TypeTag::Int256
        )
    }

    /// `true` for tags whose codec recurses into nested columns.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            TypeTag::Array | TypeTag::Map | TypeTag::Tuple | TypeTag::Nested
        )
    }

    pub fn is_decimal(&self) -> bool {
        matches!(
            self,
            TypeTag::Decimal32 | TypeTag::Decimal64 | TypeTag::Decimal128 | TypeTag::Decimal256
        )
    }

    /// Maximum number of decimal digits a value of this width can carry.
    pub fn max_precision(&self) -> Option<u32> {
        match self {
            TypeTag::Decimal32 => Some(9),
            TypeTag::Decimal64 => Some(18),
            TypeTag::Decimal128 => Some(38),
            TypeTag::Decimal256 => Some(76),
            _ => None,
        }
    }

    /// Narrowest decimal tag able to hold `precision` digits.
    pub fn decimal_for_precision(precision: u32) -> Option<TypeTag> {
        match precision {
            1..=9 => Some(TypeTag::Decimal32),
            10..=18 => Some(TypeTag::Decimal64),
            19..=38 => Some(TypeTag::Decimal128),
            39..=76 => Some(TypeTag::Decimal256),
            _ => None,
        }
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Aggregate-function kind carried by an `AggregateFunction(...)` column.
///
/// Only `GroupBitmap` states have a wire codec; the rest are representable in
/// column metadata but rejected when the dispatch table is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    Any,
    AnyLast,
    Avg,
    Count,
    GroupBitmap,
    GroupArray,
    GroupUniqArray,
    Max,
    Min,
    Quantile,
    Sum,
    Uniq,
}

impl AggregateKind {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateKind::Any => "any",
            AggregateKind::AnyLast => "anyLast",
            AggregateKind::Avg => "avg",
            AggregateKind::Count => "count",
            AggregateKind::GroupBitmap => "groupBitmap",
            AggregateKind::GroupArray => "groupArray",
            AggregateKind::GroupUniqArray => "groupUniqArray",
            AggregateKind::Max => "max",
            AggregateKind::Min => "min",
            AggregateKind::Quantile => "quantile",
            AggregateKind::Sum => "sum",
            AggregateKind::Uniq => "uniq",
        }
    }
}

impl std::fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_widths() {
        assert_eq!(TypeTag::UInt8.byte_width(), Some(1));
        assert_eq!(TypeTag::Date.byte_width(), Some(2));
        assert_eq!(TypeTag::Ipv4.byte_width(), Some(4));
        assert_eq!(TypeTag::DateTime64.byte_width(), Some(8));
        assert_eq!(TypeTag::Uuid.byte_width(), Some(16));
        assert_eq!(TypeTag::UInt256.byte_width(), Some(32));
        assert_eq!(TypeTag::String.byte_width(), None);
        assert_eq!(TypeTag::Array.byte_width(), None);
    }

    #[test]
    fn decimal_selection() {
        assert_eq!(TypeTag::decimal_for_precision(9), Some(TypeTag::Decimal32));
        assert_eq!(TypeTag::decimal_for_precision(10), Some(TypeTag::Decimal64));
        assert_eq!(
            TypeTag::decimal_for_precision(38),
            Some(TypeTag::Decimal128)
        );
        assert_eq!(
            TypeTag::decimal_for_precision(76),
            Some(TypeTag::Decimal256)
        );
        assert_eq!(TypeTag::decimal_for_precision(77), None);
        assert_eq!(TypeTag::decimal_for_precision(0), None);
    }

    #[test]
    fn native_integers() {
        assert!(TypeTag::UInt64.is_native_integer());
        assert!(TypeTag::Int8.is_native_integer());
        assert!(!TypeTag::UInt128.is_native_integer());
        assert!(!TypeTag::Float32.is_native_integer());
    }
}
