use chrono::NaiveDate;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Value of a single cell returned by an ad-hoc query.
///
/// Driver specific types (wide integers, NUMERIC, timestamps) are normalized
/// into one of these variants before any formatting happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    /// Serialized as `YYYY-MM-DD`
    Date(NaiveDate),
    Text(String),
    Null,
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Text(v)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(v: NaiveDate) -> Self {
        CellValue::Date(v)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Null)
    }
}

/// One result row: column name -> value, in the column order of the query.
///
/// Serialized as a JSON object whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRow {
    cells: Vec<(String, CellValue)>,
}

impl QueryRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: Vec::with_capacity(capacity),
        }
    }

    /// Builder-style insert, mostly handy in tests.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        self.cells.push((column.into(), value.into()));
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn first_value(&self) -> Option<&CellValue> {
        self.cells.first().map(|(_, value)| value)
    }
}

impl Serialize for QueryRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for QueryRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = QueryRow;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of column name to cell value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<QueryRow, A::Error> {
                let mut row = QueryRow::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, value)) = access.next_entry::<String, CellValue>()? {
                    row.cells.push((name, value));
                }
                Ok(row)
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_serializes_in_column_order() {
        let row = QueryRow::new()
            .with("zeta", 1.5)
            .with("alpha", "x")
            .with("day", NaiveDate::from_ymd_opt(2025, 3, 9).unwrap())
            .with("missing", CellValue::Null);

        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"zeta":1.5,"alpha":"x","day":"2025-03-09","missing":null}"#
        );
    }

    #[test]
    fn test_row_deserializes_dates_and_text() {
        let row: QueryRow =
            serde_json::from_str(r#"{"d":"2024-01-31","name":"Aurora Sdn Bhd","n":3}"#).unwrap();
        assert_eq!(
            row.get("d"),
            Some(&CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()))
        );
        assert_eq!(row.get("name"), Some(&CellValue::Text("Aurora Sdn Bhd".into())));
        assert_eq!(
            row.first_value(),
            Some(&CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()))
        );
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"d":"2024-01-31","name":"Aurora Sdn Bhd","n":3.0}"#
        );
    }
}
