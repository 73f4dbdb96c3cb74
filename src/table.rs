/// GridTable Table Implementation
///
/// A Table is an immutable snapshot of loosely-typed records. It owns the
/// record set for one or more pipeline passes and derives the column list:
/// the union of all field names, in the order they were first seen.
///
/// # Examples
///
/// ```
/// use gridtable::{record, Table};
///
/// let table = Table::new("orders", vec![
///     record! { "id" => 1, "customer" => "Alice" },
///     record! { "id" => 2, "total" => 19.5 },
/// ]);
///
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.columns(), &["id", "customer", "total"]);
/// ```

use crate::error::Result;
use crate::value::CellValue;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of leading records used for type inference and width estimation.
pub const SAMPLE_SIZE: usize = 100;

static NEXT_SNAPSHOT_ID: AtomicU64 = AtomicU64::new(1);

static NULL: CellValue = CellValue::Null;

/// One row: field names mapped to values, in insertion order.
///
/// Records are small and field lookups are linear; the order matters because
/// column discovery follows it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, CellValue)>,
}

impl Record {
    pub fn new() -> Self {
        Record { fields: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Set a field, replacing the value in place if the name already exists.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<CellValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Field value, with absent fields read as null.
    pub fn value(&self, name: &str) -> &CellValue {
        self.get(name).unwrap_or(&NULL)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Build a record from a JSON object, keeping its key order.
    pub fn from_json_object(obj: serde_json::Map<String, serde_json::Value>) -> Self {
        obj.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Immutable record set for a pipeline pass.
///
/// Every constructed table gets a fresh `snapshot_id`; the pipeline uses it as
/// the identity of the record set when deciding whether cached stages are
/// still valid. Clones share the id because they share the content.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    records: Vec<Record>,
    columns: Vec<String>,
    snapshot_id: u64,
}

impl Table {
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        let columns = discover_columns(&records);
        Table {
            name: name.into(),
            records,
            columns,
            snapshot_id: NEXT_SNAPSHOT_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// An empty table with no columns.
    pub fn empty(name: impl Into<String>) -> Self {
        Table::new(name, Vec::new())
    }

    /// Parse JSON text into a table.
    ///
    /// Only text that is not JSON at all is an error. Any other shape is
    /// normalised, see [`Table::from_json_value`].
    pub fn from_json(name: &str, json: &str) -> Result<Table> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Ok(Table::from_json_value(name, value))
    }

    /// Build a table from an already parsed JSON value.
    ///
    /// A non-array becomes an empty table and non-object rows are dropped.
    pub fn from_json_value(name: &str, value: serde_json::Value) -> Table {
        let items = match value {
            serde_json::Value::Array(items) => items,
            other => {
                log::warn!("table '{}': expected an array of records, got {}", name, json_kind(&other));
                return Table::empty(name);
            }
        };

        let total = items.len();
        let records: Vec<Record> = items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::Object(obj) => Some(Record::from_json_object(obj)),
                _ => None,
            })
            .collect();

        if records.len() < total {
            log::warn!("table '{}': dropped {} non-object rows", name, total - records.len());
        }

        Table::new(name, records)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn snapshot_id(&self) -> u64 {
        self.snapshot_id
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ordered union of field names across all records.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get_row(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn get_value(&self, row: usize, column: &str) -> Option<&CellValue> {
        self.records.get(row).map(|r| r.value(column))
    }

    /// The bounded sample used by type inference and width estimation.
    pub fn sample(&self) -> &[Record] {
        &self.records[..self.records.len().min(SAMPLE_SIZE)]
    }

    pub fn iter_rows(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }
}

fn discover_columns(records: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for record in records {
        for key in record.keys() {
            if seen.insert(key) {
                columns.push(key.to_string());
            }
        }
    }
    columns
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_follow_first_appearance() {
        let table = Table::new("t", vec![
            Record::from_iter([("b", 1), ("a", 2)]),
            Record::from_iter([("c", 3), ("a", 4)]),
            Record::from_iter([("d", 5), ("b", 6)]),
        ]);
        assert_eq!(table.columns(), &["b", "a", "c", "d"]);
    }

    #[test]
    fn test_record_insert_replaces() {
        let mut record = Record::new();
        record.insert("x", 1);
        record.insert("y", "two");
        record.insert("x", 3);
        assert_eq!(record.len(), 2);
        assert_eq!(record.value("x"), &CellValue::Number(3.0));
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["x", "y"]);
        assert!(record.value("missing").is_null());
    }

    #[test]
    fn test_from_json_keeps_key_order() {
        let table = Table::from_json("t", r#"[{"z": 1, "a": "x"}, {"m": true}]"#).unwrap();
        assert_eq!(table.columns(), &["z", "a", "m"]);
        assert_eq!(table.get_value(1, "m"), Some(&CellValue::Bool(true)));
        assert_eq!(table.get_value(1, "z"), Some(&CellValue::Null));
    }

    #[test]
    fn test_from_json_normalises_shapes() {
        let table = Table::from_json("t", r#"{"not": "an array"}"#).unwrap();
        assert!(table.is_empty());
        assert!(table.columns().is_empty());

        let table = Table::from_json("t", r#"[1, null, {"a": 1}, "x"]"#).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.columns(), &["a"]);

        assert!(Table::from_json("t", "{broken").is_err());
    }

    #[test]
    fn test_sample_is_bounded() {
        let records: Vec<Record> = (0..250).map(|i| Record::from_iter([("i", i)])).collect();
        let table = Table::new("t", records);
        assert_eq!(table.sample().len(), SAMPLE_SIZE);
        assert_eq!(Table::empty("e").sample().len(), 0);
    }

    #[test]
    fn test_snapshot_ids_are_unique() {
        let a = Table::empty("a");
        let b = Table::empty("b");
        assert_ne!(a.snapshot_id(), b.snapshot_id());
        assert_eq!(a.clone().snapshot_id(), a.snapshot_id());
    }
}
