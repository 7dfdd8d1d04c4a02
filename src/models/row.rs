//! Row and cell models for query results.
//!
//! A row keeps its columns in result order; serialization writes them out in
//! that order regardless of how the JSON map type orders keys.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// A single decoded column value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
    /// Textual rendering of a type with no JSON equivalent (timestamps, numerics, ...).
    Raw(String),
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Text(s) | CellValue::Raw(s) => serializer.serialize_str(s),
            CellValue::Integer(v) => serializer.serialize_i64(*v),
            // NaN and infinities have no JSON number form
            CellValue::Float(v) if !v.is_finite() => serializer.serialize_str(&v.to_string()),
            CellValue::Float(v) => serializer.serialize_f64(*v),
            CellValue::Boolean(b) => serializer.serialize_bool(*b),
            CellValue::Null => serializer.serialize_unit(),
        }
    }
}

/// One result row: ordered `(column name, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    /// Look up a value by column name (first match wins).
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl FromIterator<(String, CellValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, CellValue)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: Vec<(&str, CellValue)>) -> Row {
        cells
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }

    #[test]
    fn test_cell_values_serialize_by_tag() {
        let r = row(vec![
            ("t", CellValue::Text("hi".into())),
            ("i", CellValue::Integer(-7)),
            ("f", CellValue::Float(1.5)),
            ("b", CellValue::Boolean(true)),
            ("n", CellValue::Null),
            ("ts", CellValue::Raw("2024-01-01 12:00:00".into())),
        ]);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(
            json,
            r#"{"t":"hi","i":-7,"f":1.5,"b":true,"n":null,"ts":"2024-01-01 12:00:00"}"#
        );
    }

    #[test]
    fn test_row_preserves_column_order() {
        let r = row(vec![
            ("zeta", CellValue::Integer(1)),
            ("alpha", CellValue::Integer(2)),
        ]);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"zeta":1,"alpha":2}"#);
        assert_eq!(r.columns().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_non_finite_float_falls_back_to_text() {
        let json = serde_json::to_string(&CellValue::Float(f64::NAN)).unwrap();
        assert_eq!(json, r#""NaN""#);
        let json = serde_json::to_string(&CellValue::Float(f64::INFINITY)).unwrap();
        assert_eq!(json, r#""inf""#);
    }

    #[test]
    fn test_row_get() {
        let r = row(vec![("x", CellValue::Integer(1))]);
        assert_eq!(r.get("x"), Some(&CellValue::Integer(1)));
        assert_eq!(r.get("y"), None);
        assert_eq!(r.len(), 1);
        assert!(!r.is_empty());
    }
}
