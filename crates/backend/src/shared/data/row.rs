//! Conversion of PostgreSQL rows with an unknown shape into tagged [`QueryRow`]s.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use contracts::shared::query_row::{CellValue, QueryRow};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::PgRow;
use sqlx::types::{JsonValue, Uuid};
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// Normalize every column of a driver row into a [`CellValue`], keeping column order.
pub fn normalize_row(row: &PgRow) -> QueryRow {
    let mut out = QueryRow::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let value = decode_cell(row, idx, column.type_info().name());
        out.push(column.name(), value);
    }
    out
}

/// How a PostgreSQL column type is turned into a [`CellValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Numeric,
    Date,
    Timestamp,
    TimestampTz,
    Bool,
    Text,
    Json,
    Uuid,
    Interval,
    /// User-defined enum; the binary protocol sends the label as text
    Label,
    /// Arrays and builtins without a cell representation
    Unsupported,
}

impl ColumnKind {
    fn of(type_name: &str) -> Self {
        match type_name {
            "INT2" => Self::Int2,
            "INT4" => Self::Int4,
            "INT8" => Self::Int8,
            "FLOAT4" => Self::Float4,
            "FLOAT8" => Self::Float8,
            "NUMERIC" => Self::Numeric,
            "DATE" => Self::Date,
            "TIMESTAMP" => Self::Timestamp,
            "TIMESTAMPTZ" => Self::TimestampTz,
            "BOOL" => Self::Bool,
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" => Self::Text,
            "JSON" | "JSONB" => Self::Json,
            "UUID" => Self::Uuid,
            "INTERVAL" => Self::Interval,
            // Builtin names are upper case; declared types keep their own name
            name if name.ends_with("[]") => Self::Unsupported,
            name if name.chars().any(|c| c.is_ascii_lowercase()) => Self::Label,
            _ => Self::Unsupported,
        }
    }
}

fn decode_cell(row: &PgRow, idx: usize, type_name: &str) -> CellValue {
    match row.try_get_raw(idx) {
        Ok(raw) if raw.is_null() => return CellValue::Null,
        Ok(_) => {}
        Err(e) => {
            tracing::warn!("Column #{} ({}) could not be read: {}", idx, type_name, e);
            return CellValue::Null;
        }
    }

    let decoded: Result<CellValue, sqlx::Error> = match ColumnKind::of(type_name) {
        ColumnKind::Int2 => row.try_get::<i16, _>(idx).map(|v| CellValue::Number(v as f64)),
        ColumnKind::Int4 => row.try_get::<i32, _>(idx).map(|v| CellValue::Number(v as f64)),
        ColumnKind::Int8 => row.try_get::<i64, _>(idx).map(normalize_i64),
        ColumnKind::Float4 => row.try_get::<f32, _>(idx).map(|v| CellValue::Number(v as f64)),
        ColumnKind::Float8 => row.try_get::<f64, _>(idx).map(CellValue::Number),
        ColumnKind::Numeric => row.try_get::<Decimal, _>(idx).map(normalize_decimal),
        ColumnKind::Date => row.try_get::<NaiveDate, _>(idx).map(CellValue::Date),
        ColumnKind::Timestamp => row
            .try_get::<NaiveDateTime, _>(idx)
            .map(|v| CellValue::Date(v.date())),
        ColumnKind::TimestampTz => row
            .try_get::<DateTime<Utc>, _>(idx)
            .map(|v| CellValue::Date(v.date_naive())),
        ColumnKind::Bool => row
            .try_get::<bool, _>(idx)
            .map(|v| CellValue::Text(v.to_string())),
        ColumnKind::Text => row.try_get::<String, _>(idx).map(CellValue::Text),
        ColumnKind::Json => row
            .try_get::<JsonValue, _>(idx)
            .map(|v| CellValue::Text(v.to_string())),
        ColumnKind::Uuid => row
            .try_get::<Uuid, _>(idx)
            .map(|v| CellValue::Text(v.to_string())),
        ColumnKind::Interval => row
            .try_get::<PgInterval, _>(idx)
            .map(|v| CellValue::Text(format_interval(&v))),
        ColumnKind::Label => row.try_get_unchecked::<String, _>(idx).map(CellValue::Text),
        ColumnKind::Unsupported => {
            tracing::warn!("Column #{} of type {} is not supported, as null", idx, type_name);
            return CellValue::Null;
        }
    };

    decoded.unwrap_or_else(|e| {
        tracing::warn!("Column #{} of type {} decoded as null: {}", idx, type_name, e);
        CellValue::Null
    })
}

/// Render an interval the way `psql` does, e.g. `1 mon 3 days 04:05:06`.
fn format_interval(v: &PgInterval) -> String {
    let mut parts = Vec::new();
    let (years, months) = (v.months / 12, v.months % 12);
    let plural = |n: i32, unit: &str| {
        if n.abs() == 1 {
            format!("{} {}", n, unit)
        } else {
            format!("{} {}s", n, unit)
        }
    };
    if years != 0 {
        parts.push(plural(years, "year"));
    }
    if months != 0 {
        parts.push(format!("{} mon{}", months, if months.abs() == 1 { "" } else { "s" }));
    }
    if v.days != 0 {
        parts.push(plural(v.days, "day"));
    }
    if v.microseconds != 0 || parts.is_empty() {
        let sign = if v.microseconds < 0 { "-" } else { "" };
        let total = v.microseconds.unsigned_abs();
        let secs = total / 1_000_000;
        let micros = total % 1_000_000;
        let (h, m, s) = (secs / 3600, secs / 60 % 60, secs % 60);
        let mut clock = format!("{}{:02}:{:02}:{:02}", sign, h, m, s);
        if micros != 0 {
            clock.push_str(format!(".{:06}", micros).trim_end_matches('0'));
        }
        parts.push(clock);
    }
    parts.join(" ")
}

/// BIGINT results (COUNT(*), SUM of integers) become plain numbers.
/// Values beyond 2^53 lose precision, same as any JSON number consumer would.
pub fn normalize_i64(v: i64) -> CellValue {
    CellValue::Number(v as f64)
}

/// NUMERIC results become plain numbers.
pub fn normalize_decimal(v: Decimal) -> CellValue {
    v.to_f64().map_or(CellValue::Null, CellValue::Number)
}
