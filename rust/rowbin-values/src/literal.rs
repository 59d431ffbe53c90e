//! SQL literal rendering of values.

use crate::value::{Value, ValueData};

pub const NULL_EXPR: &str = "NULL";

impl Value {
    /// Renders a SQL-safe literal expression for this value: `NULL` when
    /// empty, quoted and escaped text for strings and string-like kinds.
    pub fn to_literal(&self) -> String {
        if self.is_null_or_empty() {
            return NULL_EXPR.to_string();
        }
        render(self.data())
    }
}

fn render(data: &ValueData) -> String {
    match data {
        ValueData::Nothing => NULL_EXPR.to_string(),
        ValueData::Bool(v) => v.to_string(),
        ValueData::Int8(v) => v.to_string(),
        ValueData::Int16(v) => v.to_string(),
        ValueData::Int32(v) => v.to_string(),
        ValueData::Int64(v) => v.to_string(),
        ValueData::Int128(v) => v.to_string(),
        ValueData::Int256(v) => v.to_string(),
        ValueData::UInt8(v) => v.to_string(),
        ValueData::UInt16(v) => v.to_string(),
        ValueData::UInt32(v) => v.to_string(),
        ValueData::UInt64(v) => v.to_string(),
        ValueData::UInt128(v) => v.to_string(),
        ValueData::UInt256(v) => v.to_string(),
        ValueData::Float32(v) => v.to_string(),
        ValueData::Float64(v) => v.to_string(),
        ValueData::Decimal(v) => v.to_string(),
        ValueData::String(v) => quote(&String::from_utf8_lossy(v)),
        ValueData::Date(days) => quote(&render_date(*days)),
        ValueData::DateTime(ts) => {
            quote(&ts.strftime("%Y-%m-%d %H:%M:%S%.f").to_string())
        }
        // Ordinals render faster than escaped names and compare equal
        // server-side.
        ValueData::Enum8(v) => v.to_string(),
        ValueData::Enum16(v) => v.to_string(),
        ValueData::Uuid(v) => quote(&v.to_string()),
        ValueData::Ipv4(v) => quote(&v.to_string()),
        ValueData::Ipv6(v) => quote(&v.to_string()),
        ValueData::Point(p) => render_point(p),
        ValueData::Ring(r) => render_seq(r.iter().map(render_point)),
        ValueData::Polygon(p) => {
            render_seq(p.iter().map(|r| render_seq(r.iter().map(render_point))))
        }
        ValueData::MultiPolygon(m) => render_seq(
            m.iter()
                .map(|p| render_seq(p.iter().map(|r| render_seq(r.iter().map(render_point))))),
        ),
        ValueData::Array(items) => render_seq(items.iter().map(Value::to_literal)),
        ValueData::Map(pairs) => {
            let body = pairs
                .iter()
                .map(|(k, v)| format!("{} : {}", k.to_literal(), v.to_literal()))
                .collect::<Vec<_>>()
                .join(",");
            format!("{{{body}}}")
        }
        ValueData::Tuple(items) => {
            let body = items
                .iter()
                .map(Value::to_literal)
                .collect::<Vec<_>>()
                .join(",");
            format!("({body})")
        }
        ValueData::Nested(rows) => render_seq(rows.iter().map(|row| {
            let body = row
                .iter()
                .map(Value::to_literal)
                .collect::<Vec<_>>()
                .join(",");
            format!("({body})")
        })),
        ValueData::Bitmap(bitmap) => bitmap.build_expression(),
    }
}

fn render_date(days: i32) -> String {
    match jiff::Timestamp::from_second(days as i64 * 86400) {
        Ok(ts) => ts.strftime("%Y-%m-%d").to_string(),
        Err(_) => days.to_string(),
    }
}

fn render_point(p: &[f64; 2]) -> String {
    format!("({},{})", p[0], p[1])
}

fn render_seq(items: impl Iterator<Item = String>) -> String {
    let body = items.collect::<Vec<_>>().join(",");
    format!("[{body}]")
}

/// Single-quotes `s`, backslash-escaping quotes and backslashes.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}
