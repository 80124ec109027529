//! Cell values, datasets, and the tablize pipeline

use std::borrow::Cow;
use std::iter::Peekable;

use anyhow::Result;
use serde_json::{Number, Value};

use super::record::{flatten_data, Flatten, Record};

/// A cell value ready for export
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Missing or null cell
    Empty,
    Bool(bool),
    Number(Number),
    Text(String),
}

impl CellValue {
    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Convert to a display string
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            CellValue::Empty => Cow::Borrowed(""),
            CellValue::Bool(b) => Cow::Owned(b.to_string()),
            CellValue::Number(n) => Cow::Owned(n.to_string()),
            CellValue::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

/// Read a record's cell for a column, defaulting a missing or null key to
/// an empty cell. A nested mapping or sequence comes back as its compact
/// JSON string, never as a structure.
pub fn get_value<R: Record + ?Sized>(record: &R, key: &str) -> CellValue {
    match record.value(key) {
        None | Some(Value::Null) => CellValue::Empty,
        Some(Value::Bool(b)) => CellValue::Bool(*b),
        Some(Value::Number(n)) => CellValue::Number(n.clone()),
        Some(Value::String(s)) => CellValue::Text(s.clone()),
        Some(nested) => CellValue::Text(nested.to_string()),
    }
}

/// A sequence of records plus any column order it carries itself
#[derive(Debug, Clone)]
pub struct Dataset<'a> {
    records: &'a [Value],
    header: Option<Vec<String>>,
}

impl<'a> Dataset<'a> {
    /// Dataset over a slice of records
    pub fn new(records: &'a [Value]) -> Self {
        Self {
            records,
            header: None,
        }
    }

    /// Attach the column order this dataset advertises
    pub fn with_header(mut self, header: Vec<String>) -> Self {
        self.header = Some(header);
        self
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the dataset has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Re-shape records into a table: the header row first, then one value row
/// per record, aligned positionally to the header.
///
/// An explicit `header` wins over one the dataset advertises; with neither,
/// the column order of the first record is used. Once established the header
/// is fixed: keys that only appear in later records are not added, and a
/// record missing a header key contributes an empty cell. Rows are produced
/// on demand; at most one record is inspected ahead of consumption, and only
/// when the header must be inferred.
pub fn tablize<'a>(data: Dataset<'a>, header: Option<Vec<String>>) -> Tablized<'a> {
    Tablized {
        records: flatten_data(data.records).peekable(),
        header: header.or(data.header),
        started: false,
        done: false,
    }
}

/// Lazy row sequence produced by [`tablize`]
pub struct Tablized<'a> {
    records: Peekable<Flatten<'a>>,
    header: Option<Vec<String>>,
    started: bool,
    done: bool,
}

impl<'a> Tablized<'a> {
    fn header_row(&self) -> Vec<CellValue> {
        self.header
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|name| CellValue::Text(name.clone()))
            .collect()
    }
}

impl<'a> Iterator for Tablized<'a> {
    type Item = Result<Vec<CellValue>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if !self.started {
            self.started = true;

            if self.header.is_none() {
                // Peek the first record for its key order; it is not
                // consumed here and still becomes the first data row.
                match self.records.peek() {
                    None => {
                        // No data and no header: not even a header row
                        self.done = true;
                        return None;
                    }
                    Some(Ok(record)) => self.header = Some(record.columns()),
                    Some(Err(err)) => {
                        let err = err.clone();
                        self.done = true;
                        return Some(Err(err.into()));
                    }
                }
            }

            if self.records.peek().is_none() {
                // Header-only table
                self.done = true;
            }
            return Some(Ok(self.header_row()));
        }

        match self.records.next() {
            None => {
                self.done = true;
                None
            }
            Some(Err(err)) => {
                self.done = true;
                Some(Err(err.into()))
            }
            Some(Ok(record)) => {
                let row = self
                    .header
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .map(|key| get_value(record, key))
                    .collect();
                Some(Ok(row))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(data: &[Value], header: Option<Vec<String>>) -> Vec<Vec<CellValue>> {
        tablize(Dataset::new(data), header)
            .collect::<Result<_>>()
            .unwrap()
    }

    fn texts(row: &[CellValue]) -> Vec<String> {
        row.iter().map(|c| c.display().into_owned()).collect()
    }

    #[test]
    fn test_header_inferred_from_first_record() {
        let data = vec![json!({"a": 1, "b": 2}), json!({"a": 3, "b": 4})];
        let table = rows(&data, None);

        assert_eq!(table.len(), 3);
        assert_eq!(texts(&table[0]), vec!["a", "b"]);
        assert_eq!(texts(&table[1]), vec!["1", "2"]);
        assert_eq!(texts(&table[2]), vec!["3", "4"]);
    }

    #[test]
    fn test_rows_match_header_length() {
        let data = vec![json!({"a": 1, "b": 2, "c": 3}), json!({"b": 5})];
        let table = rows(&data, None);

        for row in &table {
            assert_eq!(row.len(), 3);
        }
    }

    #[test]
    fn test_empty_data_no_header_yields_nothing() {
        let table = rows(&[], None);
        assert!(table.is_empty());
    }

    #[test]
    fn test_empty_data_with_header_yields_header_only() {
        let header = vec!["a".to_string(), "b".to_string()];
        let table = rows(&[], Some(header));

        assert_eq!(table.len(), 1);
        assert_eq!(texts(&table[0]), vec!["a", "b"]);
    }

    #[test]
    fn test_missing_key_renders_empty() {
        let data = vec![json!({"a": 1, "b": 2}), json!({"a": 3})];
        let table = rows(&data, None);

        assert_eq!(table[2][1], CellValue::Empty);
        assert_eq!(texts(&table[2]), vec!["3", ""]);
    }

    #[test]
    fn test_nested_values_stringified() {
        let data = vec![json!({"a": [1, 2], "b": {"x": 1}})];
        let table = rows(&data, None);

        assert_eq!(table[1][0], CellValue::Text("[1,2]".to_string()));
        assert_eq!(table[1][1], CellValue::Text("{\"x\":1}".to_string()));
    }

    #[test]
    fn test_header_fixed_after_first_record() {
        // Keys that only appear in later records never join the header
        let data = vec![json!({"a": 1}), json!({"a": 2, "extra": 9})];
        let table = rows(&data, None);

        assert_eq!(texts(&table[0]), vec!["a"]);
        assert_eq!(table[1].len(), 1);
        assert_eq!(table[2].len(), 1);
    }

    #[test]
    fn test_explicit_header_wins_over_dataset_header() {
        let data = vec![json!({"a": 1, "b": 2})];
        let dataset = Dataset::new(&data).with_header(vec!["b".to_string()]);
        let table: Vec<_> = tablize(dataset, Some(vec!["a".to_string()]))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(texts(&table[0]), vec!["a"]);
    }

    #[test]
    fn test_dataset_header_used_when_none_supplied() {
        let data = vec![json!({"a": 1, "b": 2})];
        let dataset = Dataset::new(&data).with_header(vec!["b".to_string()]);
        let table: Vec<_> = tablize(dataset, None).collect::<Result<_>>().unwrap();

        assert_eq!(texts(&table[0]), vec!["b"]);
        assert_eq!(texts(&table[1]), vec!["2"]);
    }

    #[test]
    fn test_null_value_renders_empty() {
        let data = vec![json!({"a": null})];
        let table = rows(&data, None);

        assert_eq!(table[1][0], CellValue::Empty);
    }

    #[test]
    fn test_malformed_record_propagates() {
        let data = vec![json!([1, 2, 3])];
        let mut table = tablize(Dataset::new(&data), None);

        assert!(table.next().unwrap().is_err());
        assert!(table.next().is_none());
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Empty.display(), "");
        assert_eq!(CellValue::Bool(true).display(), "true");
        assert_eq!(CellValue::Number(Number::from(42)).display(), "42");
        assert_eq!(CellValue::from("hi").display(), "hi");
    }
}
