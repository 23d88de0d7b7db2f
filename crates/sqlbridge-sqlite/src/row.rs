//! Materialized query output

use indexmap::IndexMap;
use sqlbridge_vm::{ArrayRef, ClassDefinition, ObjectRef, Value};

/// One result row: column name to coerced value, in column order.
///
/// Column names are map keys, so when a query returns the same name twice
/// the later value replaces the earlier one and keeps the earlier position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRow {
    columns: IndexMap<String, Value>,
}

impl ResultRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.columns.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build a script object of `class` with one property per column.
    pub fn into_object(self, class: &ClassDefinition) -> ObjectRef {
        let obj = class.create_instance(None);
        for (column, value) in self.columns {
            obj.set(column, value);
        }
        obj
    }
}

/// Every row of a query, in the order the engine produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    rows: Vec<ResultRow>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: ResultRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Build a `result_class` object with `rows` (array of `row_class`
    /// objects) and `rowCount`.
    pub fn into_object(self, result_class: &ClassDefinition, row_class: &ClassDefinition) -> ObjectRef {
        let row_count = self.row_count();
        let rows: ArrayRef = self
            .rows
            .into_iter()
            .map(|row| Value::Object(row.into_object(row_class)))
            .collect();

        let obj = result_class.create_instance(None);
        obj.set("rows", rows);
        obj.set("rowCount", row_count);
        obj
    }
}
