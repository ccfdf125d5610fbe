//! Ordered-column table built row by row.
//!
//! Columns are discovered while the first row is written and are frozen
//! afterwards. Later rows address cells by column name. The JSON encoding is
//! an array of objects whose keys follow column order.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::HashMap;

use crate::error::{ConvertError, ConvertResult};

#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column names in order of first appearance.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in row `row`, `""` when the cell was never written.
    #[cfg(test)]
    fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = *self.index.get(column)?;
        self.rows.get(row).map(|cells| cells[col].as_str())
    }

    /// Append a row of `(column, value)` cells.
    ///
    /// While the table has no rows, unknown columns are appended to the
    /// schema. Afterwards an unknown column is an error. A repeated column
    /// keeps the last value written.
    pub fn push_row<I>(&mut self, line: usize, cells: I) -> ConvertResult<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let sealed = !self.rows.is_empty();
        let mut row = vec![String::new(); self.columns.len()];

        for (column, value) in cells {
            let col = match self.index.get(&column) {
                Some(&col) => col,
                None if !sealed => {
                    let col = self.columns.len();
                    self.index.insert(column.clone(), col);
                    self.columns.push(column);
                    row.push(String::new());
                    col
                }
                None => {
                    return Err(ConvertError::parse(
                        line,
                        format!("column '{}' does not belong to the table", column),
                    ));
                }
            };
            row[col] = value;
        }

        self.rows.push(row);
        Ok(())
    }
}

struct RowRef<'a> {
    columns: &'a [String],
    cells: &'a [String],
}

impl Serialize for RowRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.cells) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for cells in &self.rows {
            seq.serialize_element(&RowRef {
                columns: &self.columns,
                cells,
            })?;
        }
        seq.end()
    }
}
