use std::fmt::Display;
use std::fmt::Formatter;

use crate::catalog::r#type::LogicalType;
use crate::catalog::value::Value;
use crate::driver::display::TabularDisplay;

/// A fully materialized query result.
#[derive(Debug, Clone, Default)]
pub struct Rows {
    columns: Vec<String>,
    types: Vec<LogicalType>,
    rows: Vec<Vec<Value>>,
}

impl Rows {
    pub(crate) fn new(columns: Vec<String>, types: Vec<LogicalType>, rows: Vec<Vec<Value>>) -> Rows {
        Rows { columns, types, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn types(&self) -> &[LogicalType] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&[Value]> {
        self.rows.get(row).map(|r| r.as_slice())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Vec<Value>> {
        self.rows.iter()
    }

    /// The values of one column, top to bottom.
    pub fn column(&self, index: usize) -> Option<Vec<Value>> {
        if index >= self.columns.len() {
            return None;
        }
        Some(self.rows.iter().map(|r| r[index].clone()).collect())
    }
}

impl IntoIterator for Rows {
    type Item = Vec<Value>;
    type IntoIter = std::vec::IntoIter<Vec<Value>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a Rows {
    type Item = &'a Vec<Value>;
    type IntoIter = std::slice::Iter<'a, Vec<Value>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl Display for Rows {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        TabularDisplay::new(&self.columns, &self.rows).fmt(f)
    }
}
