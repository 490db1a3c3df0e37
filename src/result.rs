//! Tabular query results.
//!
//! A [`ResultSet`] owns its rows and shares its column descriptors through an
//! `Arc`, so cloning a result set does not copy the schema.

use std::collections::BTreeMap;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::cell::Cell;
use crate::error::{Error, Result};
use crate::pg::Oid;

/// Name, declared type and nullability of one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub type_oid: Oid,
    pub nullable: bool,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, type_oid: Oid) -> Self {
        Self {
            name: name.into(),
            type_oid,
            nullable: true,
        }
    }

    /// Mark the column as NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Shared column descriptions.
type SharedColumns = Arc<Vec<ColumnDescriptor>>;

/// A row stored as column values.
/// Uses SmallVec to inline storage for rows with ≤16 columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: SmallVec<[Cell; 16]>,
}

impl Row {
    pub fn new(cells: impl IntoIterator<Item = Cell>) -> Self {
        Self {
            cells: cells.into_iter().collect(),
        }
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Ordered rows of one query, all aligned to the same column list.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    columns: SharedColumns,
    rows: Vec<Row>,
}

impl ResultSet {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            columns: Arc::new(columns),
            rows: Vec::new(),
        }
    }

    /// Append a row, checking it against the column list.
    pub fn push_row(&mut self, cells: impl IntoIterator<Item = Cell>) -> Result<()> {
        let row = Row::new(cells);
        if row.len() != self.columns.len() {
            return Err(Error::Shape(format!(
                "row {} has {} cells, expected {}",
                self.rows.len(),
                row.len(),
                self.columns.len()
            )));
        }
        if let Some(col) = self
            .columns
            .iter()
            .zip(row.cells())
            .find(|(col, cell)| !col.nullable && cell.is_null())
            .map(|(col, _)| col)
        {
            return Err(Error::Shape(format!(
                "row {}: NULL in NOT NULL column '{}'",
                self.rows.len(),
                col.name
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Builder-style [`push_row`](Self::push_row).
    pub fn with_row(mut self, cells: impl IntoIterator<Item = Cell>) -> Result<Self> {
        self.push_row(cells)?;
        Ok(self)
    }

    #[inline]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    #[inline]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Index of the first column with this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Every row as a column-name → cell map. Later duplicate names win.
    pub fn to_maps(&self) -> Vec<BTreeMap<String, Cell>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row.cells())
                    .map(|(col, cell)| (col.name.clone(), cell.clone()))
                    .collect()
            })
            .collect()
    }
}
