//! Indexed edge store: the tabular resource a graph view is built over.
//!
//! `EdgeTable` is the seam to whatever actually holds the edge rows.
//! `MemoryEdgeTable` is the in-process implementation used by the bench
//! and the tests; its secondary indexes are built on first use and cached
//! inside the table.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Position of a row in an edge table.
pub type RowId = u64;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("row {row} is out of range (table has {rows} rows)")]
    RowOutOfRange { row: RowId, rows: u64 },

    #[error("column {column} is out of range (table has {columns} columns)")]
    ColumnOutOfRange { column: usize, columns: usize },

    #[error("row {row}, column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        row: RowId,
        column: String,
        expected: ColumnType,
        found: String,
    },

    #[error("row has {got} values but the table has {expected} columns")]
    Arity { expected: usize, got: usize },

    #[error("index key has {got} values but {expected} columns were given")]
    KeyArity { expected: usize, got: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int,
    Double,
    Text,
    Geometry,
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ColumnType::Int => "int",
            ColumnType::Double => "double",
            ColumnType::Text => "text",
            ColumnType::Geometry => "geometry",
        };
        f.write_str(name)
    }
}

/// A single cell. Geometries are carried as WKT text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    Null,
    Int(i64),
    Double(f64),
    Text(String),
    Geometry(String),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Integers widen to doubles so an integer cost column can carry weights.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::Text(_) => "text",
            Value::Geometry(_) => "geometry",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self { name: name.into(), ty }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Index of the first geometry column, if any.
    pub fn spatial_field_index(&self) -> Option<usize> {
        self.columns.iter().position(|c| c.ty == ColumnType::Geometry)
    }

    pub fn column_name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(|c| c.name.as_str())
    }
}

/// Read-only access to a table of edge rows with point lookups on
/// integer-valued columns.
///
/// Every method may block on I/O. Implementations must be shareable across
/// threads: several traversals can read the same table concurrently.
pub trait EdgeTable: Send + Sync {
    fn schema(&self) -> &Schema;

    fn row_count(&self) -> Result<u64, StoreError>;

    fn value(&self, row: RowId, column: usize) -> Result<Value, StoreError>;

    /// Row ids whose `columns` equal `key`, in ascending row order.
    /// Builds the index over `columns` if it does not exist yet.
    fn lookup(&self, columns: &[usize], key: &[i64]) -> Result<Vec<RowId>, StoreError>;

    /// Build the secondary index over `columns` if absent. Idempotent.
    fn ensure_indexed(&self, columns: &[usize]) -> Result<(), StoreError>;

    fn is_indexed(&self, columns: &[usize]) -> bool;

    fn int(&self, row: RowId, column: usize) -> Result<i64, StoreError> {
        let value = self.value(row, column)?;
        value
            .as_int()
            .ok_or_else(|| self.mismatch(row, column, ColumnType::Int, &value))
    }

    fn double(&self, row: RowId, column: usize) -> Result<f64, StoreError> {
        let value = self.value(row, column)?;
        value
            .as_double()
            .ok_or_else(|| self.mismatch(row, column, ColumnType::Double, &value))
    }

    #[doc(hidden)]
    fn mismatch(&self, row: RowId, column: usize, expected: ColumnType, found: &Value) -> StoreError {
        StoreError::TypeMismatch {
            row,
            column: self
                .schema()
                .column_name(column)
                .unwrap_or("?")
                .to_string(),
            expected,
            found: found.type_name().to_string(),
        }
    }
}

type ColumnIndex = BTreeMap<Vec<i64>, Vec<RowId>>;

/// Edge rows held in memory, with lazily built secondary indexes.
pub struct MemoryEdgeTable {
    schema: Schema,
    rows: Vec<Vec<Value>>,
    indexes: RwLock<HashMap<Vec<usize>, Arc<ColumnIndex>>>,
}

impl MemoryEdgeTable {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
            indexes: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_capacity(schema: Schema, rows: usize) -> Self {
        Self {
            schema,
            rows: Vec::with_capacity(rows),
            indexes: RwLock::new(HashMap::new()),
        }
    }

    /// Standard three-column edge schema: `start_node`, `end_node`, `weight`.
    pub fn edge_schema() -> Schema {
        Schema::new(vec![
            Column::new("start_node", ColumnType::Int),
            Column::new("end_node", ColumnType::Int),
            Column::new("weight", ColumnType::Double),
        ])
    }

    /// Bulk load `(start, end, weight)` triples into the standard edge schema.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (i64, i64, f64)>,
    {
        let mut table = Self::new(Self::edge_schema());
        for (start, end, weight) in edges {
            table
                .rows
                .push(vec![Value::Int(start), Value::Int(end), Value::Double(weight)]);
        }
        table
    }

    /// Append a row, returning its id. Cached indexes are dropped.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<RowId, StoreError> {
        if row.len() != self.schema.len() {
            return Err(StoreError::Arity {
                expected: self.schema.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        self.indexes.get_mut().clear();
        Ok(self.rows.len() as RowId - 1)
    }

    fn row(&self, row: RowId) -> Result<&[Value], StoreError> {
        self.rows
            .get(row as usize)
            .map(|r| r.as_slice())
            .ok_or(StoreError::RowOutOfRange {
                row,
                rows: self.rows.len() as u64,
            })
    }

    fn check_columns(&self, columns: &[usize]) -> Result<(), StoreError> {
        match columns.iter().find(|&&c| c >= self.schema.len()) {
            Some(&column) => Err(StoreError::ColumnOutOfRange {
                column,
                columns: self.schema.len(),
            }),
            None => Ok(()),
        }
    }

    fn build_index(&self, columns: &[usize]) -> ColumnIndex {
        let mut index = ColumnIndex::new();
        for (row_id, row) in self.rows.iter().enumerate() {
            // Rows with a non-integer in any key column are not indexed.
            let key: Option<Vec<i64>> = columns.iter().map(|&c| row[c].as_int()).collect();
            if let Some(key) = key {
                index.entry(key).or_default().push(row_id as RowId);
            }
        }
        index
    }

    fn index_for(&self, columns: &[usize]) -> Result<Arc<ColumnIndex>, StoreError> {
        self.check_columns(columns)?;
        if let Some(index) = self.indexes.read().get(columns) {
            return Ok(Arc::clone(index));
        }

        let mut indexes = self.indexes.write();
        // Another reader may have built it while we waited for the write lock.
        if let Some(index) = indexes.get(columns) {
            return Ok(Arc::clone(index));
        }
        let index = Arc::new(self.build_index(columns));
        info!(
            columns = ?columns,
            keys = index.len(),
            rows = self.rows.len(),
            "built secondary index"
        );
        indexes.insert(columns.to_vec(), Arc::clone(&index));
        Ok(index)
    }
}

impl EdgeTable for MemoryEdgeTable {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn row_count(&self) -> Result<u64, StoreError> {
        Ok(self.rows.len() as u64)
    }

    fn value(&self, row: RowId, column: usize) -> Result<Value, StoreError> {
        let cells = self.row(row)?;
        cells
            .get(column)
            .cloned()
            .ok_or(StoreError::ColumnOutOfRange {
                column,
                columns: cells.len(),
            })
    }

    fn lookup(&self, columns: &[usize], key: &[i64]) -> Result<Vec<RowId>, StoreError> {
        if columns.len() != key.len() {
            return Err(StoreError::KeyArity {
                expected: columns.len(),
                got: key.len(),
            });
        }
        let index = self.index_for(columns)?;
        Ok(index.get(key).cloned().unwrap_or_default())
    }

    fn ensure_indexed(&self, columns: &[usize]) -> Result<(), StoreError> {
        self.index_for(columns).map(|_| ())
    }

    fn is_indexed(&self, columns: &[usize]) -> bool {
        self.indexes.read().contains_key(columns)
    }
}
