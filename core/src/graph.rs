use std::collections::BTreeSet;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::FieldNames;
use crate::error::{Error, Result};
use crate::store::{ColumnType, EdgeTable, RowId, Value};

/// Vertex identifier: any integer appearing as a start or end node value.
pub type VertexId = i64;

/// A weighted edge tied to the row it was read from.
///
/// Parallel edges between the same pair of vertices are distinct edges:
/// identity is the row id, not the endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Edge {
    pub source: VertexId,
    pub target: VertexId,
    pub weight: f64,
    pub row_id: RowId,
}

impl Edge {
    /// The endpoint that is not `vertex`. For a self-loop, `vertex` itself.
    pub fn opposite(&self, vertex: VertexId) -> VertexId {
        if self.source == vertex {
            self.target
        } else {
            self.source
        }
    }

    fn reversed(self) -> Self {
        Self {
            source: self.target,
            target: self.source,
            ..self
        }
    }
}

/// How stored rows are read as graph edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// start_node → end_node.
    #[default]
    Directed,
    /// end_node → start_node, without copying any row.
    DirectedReversed,
    /// Both ways: a vertex's neighbors are the union of its in- and out-edges.
    Undirected,
}

impl Orientation {
    /// Parse the numeric graph type used by the SQL functions:
    /// 1 directed, 2 directed with edges reversed, 3 undirected.
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(Orientation::Directed),
            2 => Ok(Orientation::DirectedReversed),
            3 => Ok(Orientation::Undirected),
            other => Err(Error::UnsupportedOrientation(other)),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Orientation::Directed => 1,
            Orientation::DirectedReversed => 2,
            Orientation::Undirected => 3,
        }
    }

    /// Boolean form: `undirected` wins over `reversed`.
    pub fn from_flags(undirected: bool, reversed: bool) -> Self {
        match (undirected, reversed) {
            (true, _) => Orientation::Undirected,
            (false, true) => Orientation::DirectedReversed,
            (false, false) => Orientation::Directed,
        }
    }
}

/// Edge direction relative to a vertex, under the view's orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// Column positions resolved against the table schema when a view is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldBinding {
    start: usize,
    end: usize,
    weight: Option<usize>,
    geometry: Option<usize>,
}

impl FieldBinding {
    fn resolve<T: EdgeTable + ?Sized>(
        table: &T,
        names: &FieldNames,
        weight_field: Option<&str>,
    ) -> Result<Self> {
        let schema = table.schema();
        let int_field = |name: &str| -> Result<usize> {
            let index = schema
                .field_index(name)
                .ok_or_else(|| Error::missing_field(name))?;
            match schema.columns()[index].ty {
                ColumnType::Int => Ok(index),
                other => Err(Error::Configuration(format!(
                    "field '{}' must be an int column, found {}",
                    name, other
                ))),
            }
        };

        let start = int_field(&names.start_node)?;
        let end = int_field(&names.end_node)?;

        let weight = match weight_field {
            Some(name) => {
                let index = schema
                    .field_index(name)
                    .ok_or_else(|| Error::missing_field(name))?;
                match schema.columns()[index].ty {
                    ColumnType::Int | ColumnType::Double => Some(index),
                    other => {
                        return Err(Error::Configuration(format!(
                            "weight field '{}' must be numeric, found {}",
                            name, other
                        )))
                    }
                }
            }
            None => None,
        };

        let geometry = match &names.geometry {
            Some(name) => Some(
                schema
                    .field_index(name)
                    .ok_or_else(|| Error::missing_field(name))?,
            ),
            None => schema.spatial_field_index(),
        };

        Ok(Self {
            start,
            end,
            weight,
            geometry,
        })
    }
}

/// A read-only, orientation-specific graph over an edge table.
///
/// Nothing is materialized: every query is one or more index lookups on the
/// table, translated through the orientation. The only cached state is the
/// optional full vertex set, filled on first call to [`GraphView::vertex_set`].
pub struct GraphView<'t, T: EdgeTable + ?Sized> {
    table: &'t T,
    fields: FieldBinding,
    orientation: Orientation,
    vertices: OnceLock<BTreeSet<VertexId>>,
}

impl<'t, T: EdgeTable + ?Sized> GraphView<'t, T> {
    /// Bind the schema and make sure the start, end and (start, end)
    /// indexes exist.
    ///
    /// Without a weight field the view still answers membership and degree
    /// queries; anything that reads an edge fails with a configuration error.
    pub fn open(
        table: &'t T,
        names: &FieldNames,
        weight_field: Option<&str>,
        orientation: Orientation,
    ) -> Result<Self> {
        let fields = FieldBinding::resolve(table, names, weight_field)?;
        table.ensure_indexed(&[fields.start])?;
        table.ensure_indexed(&[fields.end])?;
        table.ensure_indexed(&[fields.start, fields.end])?;
        debug!(?orientation, ?weight_field, "opened graph view");
        Ok(Self {
            table,
            fields,
            orientation,
            vertices: OnceLock::new(),
        })
    }

    /// Same table and binding, different orientation.
    pub fn with_orientation(&self, orientation: Orientation) -> Self {
        Self {
            table: self.table,
            fields: self.fields,
            orientation,
            vertices: OnceLock::new(),
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn table(&self) -> &'t T {
        self.table
    }

    // --- index access ---

    fn lookup_by_start(&self, vertex: VertexId) -> Result<Vec<RowId>> {
        Ok(self.table.lookup(&[self.fields.start], &[vertex])?)
    }

    fn lookup_by_end(&self, vertex: VertexId) -> Result<Vec<RowId>> {
        Ok(self.table.lookup(&[self.fields.end], &[vertex])?)
    }

    fn lookup_by_start_and_end(&self, start: VertexId, end: VertexId) -> Result<Vec<RowId>> {
        Ok(self
            .table
            .lookup(&[self.fields.start, self.fields.end], &[start, end])?)
    }

    fn weight_field(&self) -> Result<usize> {
        self.fields
            .weight
            .ok_or_else(|| Error::Configuration("weight field not set".to_string()))
    }

    /// The row as stored: start → end.
    fn stored_edge(&self, row: RowId) -> Result<Edge> {
        let weight_field = self.weight_field()?;
        Ok(Edge {
            source: self.table.int(row, self.fields.start)?,
            target: self.table.int(row, self.fields.end)?,
            weight: self.table.double(row, weight_field)?,
            row_id: row,
        })
    }

    fn oriented(&self, edge: Edge) -> Edge {
        match self.orientation {
            Orientation::DirectedReversed => edge.reversed(),
            Orientation::Directed | Orientation::Undirected => edge,
        }
    }

    /// Which index answers a direction under this orientation:
    /// (use the start index, use the end index).
    fn index_sides(&self, dir: Direction) -> (bool, bool) {
        match (self.orientation, dir) {
            (Orientation::Directed, Direction::Outgoing)
            | (Orientation::DirectedReversed, Direction::Incoming) => (true, false),
            (Orientation::Directed, Direction::Incoming)
            | (Orientation::DirectedReversed, Direction::Outgoing) => (false, true),
            (Orientation::Undirected, _) => (true, true),
        }
    }

    // --- graph queries ---

    /// Edges leaving (`Outgoing`) or entering (`Incoming`) `vertex` under
    /// this view's orientation, ordered by row id within each index.
    ///
    /// Undirected views return every incident edge once, in stored
    /// orientation; use [`Edge::opposite`] to find the neighbor.
    pub fn neighbor_edges(&self, vertex: VertexId, dir: Direction) -> Result<Vec<Edge>> {
        let (use_start, use_end) = self.index_sides(dir);
        let mut edges = Vec::new();

        if use_start {
            for row in self.lookup_by_start(vertex)? {
                edges.push(self.oriented(self.stored_edge(row)?));
            }
        }
        if use_end {
            for row in self.lookup_by_end(vertex)? {
                let edge = self.stored_edge(row)?;
                // Self-loop already came back from the start index
                if use_start && edge.source == vertex {
                    continue;
                }
                edges.push(self.oriented(edge));
            }
        }
        Ok(edges)
    }

    pub fn out_edges(&self, vertex: VertexId) -> Result<Vec<Edge>> {
        self.neighbor_edges(vertex, Direction::Outgoing)
    }

    pub fn in_edges(&self, vertex: VertexId) -> Result<Vec<Edge>> {
        self.neighbor_edges(vertex, Direction::Incoming)
    }

    /// True if `vertex` is a start or end value of some row.
    pub fn contains_vertex(&self, vertex: VertexId) -> Result<bool> {
        if let Some(vertices) = self.vertices.get() {
            return Ok(vertices.contains(&vertex));
        }
        Ok(!self.lookup_by_start(vertex)?.is_empty() || !self.lookup_by_end(vertex)?.is_empty())
    }

    /// Every vertex of the table. Scans all rows on first call, then
    /// answers from the cached set. Non-integer node cells are skipped, as
    /// the indexes skip them.
    pub fn vertex_set(&self) -> Result<&BTreeSet<VertexId>> {
        if let Some(vertices) = self.vertices.get() {
            return Ok(vertices);
        }
        let mut vertices = BTreeSet::new();
        for row in 0..self.table.row_count()? {
            for field in [self.fields.start, self.fields.end] {
                if let Some(v) = self.table.value(row, field)?.as_int() {
                    vertices.insert(v);
                }
            }
        }
        debug!(vertices = vertices.len(), "scanned vertex set");
        Ok(self.vertices.get_or_init(|| vertices))
    }

    /// All edges from `u` to `v` under this orientation, ascending row id.
    pub fn edges_between(&self, u: VertexId, v: VertexId) -> Result<Vec<Edge>> {
        let mut rows = match self.orientation {
            Orientation::Directed => self.lookup_by_start_and_end(u, v)?,
            Orientation::DirectedReversed => self.lookup_by_start_and_end(v, u)?,
            Orientation::Undirected => {
                let mut rows = self.lookup_by_start_and_end(u, v)?;
                if u != v {
                    rows.extend(self.lookup_by_start_and_end(v, u)?);
                }
                rows
            }
        };
        rows.sort_unstable();

        rows.into_iter()
            .map(|row| self.stored_edge(row).map(|e| self.oriented(e)))
            .collect()
    }

    /// One edge from `u` to `v`: the one with the lowest row id.
    pub fn edge_between(&self, u: VertexId, v: VertexId) -> Result<Option<Edge>> {
        Ok(self.edges_between(u, v)?.into_iter().next())
    }

    pub fn contains_edge(&self, u: VertexId, v: VertexId) -> Result<bool> {
        let found = match self.orientation {
            Orientation::Directed => !self.lookup_by_start_and_end(u, v)?.is_empty(),
            Orientation::DirectedReversed => !self.lookup_by_start_and_end(v, u)?.is_empty(),
            Orientation::Undirected => {
                !self.lookup_by_start_and_end(u, v)?.is_empty()
                    || !self.lookup_by_start_and_end(v, u)?.is_empty()
            }
        };
        Ok(found)
    }

    /// Count of edges in `dir`, from index lookups only.
    fn count(&self, vertex: VertexId, dir: Direction) -> Result<usize> {
        let (use_start, use_end) = self.index_sides(dir);
        let mut n = 0;
        if use_start {
            n += self.lookup_by_start(vertex)?.len();
        }
        if use_end {
            n += self.lookup_by_end(vertex)?.len();
        }
        if use_start && use_end {
            n -= self.lookup_by_start_and_end(vertex, vertex)?.len();
        }
        Ok(n)
    }

    pub fn out_degree(&self, vertex: VertexId) -> Result<usize> {
        self.count(vertex, Direction::Outgoing)
    }

    pub fn in_degree(&self, vertex: VertexId) -> Result<usize> {
        self.count(vertex, Direction::Incoming)
    }

    /// Number of incident edges. Undirected views count each edge once.
    pub fn degree(&self, vertex: VertexId) -> Result<usize> {
        match self.orientation {
            Orientation::Undirected => self.out_degree(vertex),
            Orientation::Directed | Orientation::DirectedReversed => {
                Ok(self.out_degree(vertex)? + self.in_degree(vertex)?)
            }
        }
    }

    pub fn edge_count(&self) -> Result<u64> {
        Ok(self.table.row_count()?)
    }

    /// The edge stored at `row`, under this orientation.
    pub fn edge_at(&self, row: RowId) -> Result<Edge> {
        self.stored_edge(row).map(|e| self.oriented(e))
    }

    /// Every edge in row order.
    pub fn edges(&self) -> Result<Vec<Edge>> {
        (0..self.table.row_count()?)
            .map(|row| self.edge_at(row))
            .collect()
    }

    /// `(start_node, end_node)` as stored in the edge's row, undoing the
    /// view's orientation.
    pub fn stored_endpoints(&self, edge: &Edge) -> (VertexId, VertexId) {
        match self.orientation {
            Orientation::DirectedReversed => (edge.target, edge.source),
            Orientation::Directed | Orientation::Undirected => (edge.source, edge.target),
        }
    }

    pub fn weight(&self, edge: &Edge) -> f64 {
        edge.weight
    }

    /// Row holding the edge's geometry, if the table has a geometry field.
    pub fn geometry_ref(&self, edge: &Edge) -> Option<RowId> {
        self.fields.geometry.map(|_| edge.row_id)
    }

    /// The edge's geometry value. `None` when the table has no geometry
    /// field or the cell is null.
    pub fn geometry(&self, edge: &Edge) -> Result<Option<Value>> {
        let Some(field) = self.fields.geometry else {
            return Ok(None);
        };
        match self.table.value(edge.row_id, field)? {
            Value::Null => Ok(None),
            value => Ok(Some(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Column, MemoryEdgeTable, Schema};

    fn open(table: &MemoryEdgeTable, orientation: Orientation) -> GraphView<'_, MemoryEdgeTable> {
        GraphView::open(table, &FieldNames::default(), Some("weight"), orientation).unwrap()
    }

    fn targets(edges: &[Edge]) -> Vec<VertexId> {
        edges.iter().map(|e| e.target).collect()
    }

    /// 1→2 (1.0), 2→3 (2.0), 1→3 (5.0), 1→2 (7.0), 3→3 (1.0)
    fn sample() -> MemoryEdgeTable {
        MemoryEdgeTable::from_edges(vec![
            (1, 2, 1.0),
            (2, 3, 2.0),
            (1, 3, 5.0),
            (1, 2, 7.0),
            (3, 3, 1.0),
        ])
    }

    #[test]
    fn test_open_builds_indexes() {
        let t = sample();
        let _g = open(&t, Orientation::Directed);
        assert!(t.is_indexed(&[0]));
        assert!(t.is_indexed(&[1]));
        assert!(t.is_indexed(&[0, 1]));
    }

    #[test]
    fn test_directed_out_and_in() {
        let t = sample();
        let g = open(&t, Orientation::Directed);
        assert_eq!(targets(&g.out_edges(1).unwrap()), vec![2, 3, 2]);
        let ins = g.in_edges(3).unwrap();
        let sources: Vec<VertexId> = ins.iter().map(|e| e.source).collect();
        assert_eq!(sources, vec![2, 1, 3]);
        assert!(g.out_edges(99).unwrap().is_empty());
    }

    #[test]
    fn test_reversed_swaps_endpoints() {
        let t = sample();
        let g = open(&t, Orientation::DirectedReversed);
        let out = g.out_edges(3).unwrap();
        // Reversed out-edges of 3 are the stored in-edges of 3
        assert_eq!(targets(&out), vec![2, 1, 3]);
        assert!(out.iter().all(|e| e.source == 3));
        let e = out[0];
        assert_eq!(e.row_id, 1);
        assert_eq!(e.weight, 2.0);
        assert!(g.out_edges(1).unwrap().is_empty());
        assert_eq!(g.in_edges(1).unwrap().len(), 3);
    }

    #[test]
    fn test_undirected_union() {
        let t = MemoryEdgeTable::from_edges(vec![(10, 20, 3.5)]);
        let g = open(&t, Orientation::Undirected);
        let from_a = g.out_edges(10).unwrap();
        let from_b = g.out_edges(20).unwrap();
        assert_eq!(from_a.len(), 1);
        assert_eq!(from_b.len(), 1);
        assert_eq!(from_a[0].opposite(10), 20);
        assert_eq!(from_b[0].opposite(20), 10);
        assert_eq!(from_a[0].weight, from_b[0].weight);
        assert_eq!(g.in_edges(10).unwrap().len(), 1);
        assert_eq!(g.in_edges(20).unwrap().len(), 1);
    }

    #[test]
    fn test_undirected_self_loop_once() {
        let t = sample();
        let g = open(&t, Orientation::Undirected);
        let edges = g.out_edges(3).unwrap();
        let loops = edges.iter().filter(|e| e.row_id == 4).count();
        assert_eq!(loops, 1);
        assert_eq!(edges.len(), 3);
        assert_eq!(g.degree(3).unwrap(), 3);
    }

    #[test]
    fn test_degrees() {
        let t = sample();
        let g = open(&t, Orientation::Directed);
        assert_eq!(g.out_degree(1).unwrap(), 3);
        assert_eq!(g.in_degree(1).unwrap(), 0);
        assert_eq!(g.in_degree(3).unwrap(), 3);
        assert_eq!(g.degree(2).unwrap(), 3);
        assert_eq!(g.out_degree(42).unwrap(), 0);

        let r = g.with_orientation(Orientation::DirectedReversed);
        assert_eq!(r.out_degree(1).unwrap(), 0);
        assert_eq!(r.in_degree(1).unwrap(), 3);
    }

    #[test]
    fn test_contains_vertex() {
        let t = sample();
        let g = open(&t, Orientation::Directed);
        assert!(g.contains_vertex(1).unwrap());
        assert!(g.contains_vertex(3).unwrap());
        assert!(!g.contains_vertex(4).unwrap());
        let all: Vec<VertexId> = g.vertex_set().unwrap().iter().copied().collect();
        assert_eq!(all, vec![1, 2, 3]);
        // Answered from the cached set now
        assert!(!g.contains_vertex(4).unwrap());
    }

    #[test]
    fn test_vertex_set_skips_null_nodes() {
        let mut t = MemoryEdgeTable::new(MemoryEdgeTable::edge_schema());
        t.push_row(vec![Value::Int(1), Value::Int(2), Value::Double(1.0)]).unwrap();
        t.push_row(vec![Value::Null, Value::Int(3), Value::Double(1.0)]).unwrap();
        let g = open(&t, Orientation::Directed);
        let scanned: Vec<VertexId> = g.vertex_set().unwrap().iter().copied().collect();
        assert_eq!(scanned, vec![1, 2, 3]);

        // The index path agrees with the scan
        let fresh = open(&t, Orientation::Directed);
        for v in [1, 2, 3] {
            assert!(fresh.contains_vertex(v).unwrap());
        }
    }

    #[test]
    fn test_stored_endpoints_undo_orientation() {
        let t = MemoryEdgeTable::from_edges(vec![(5, 6, 1.0)]);
        for orientation in [
            Orientation::Directed,
            Orientation::DirectedReversed,
            Orientation::Undirected,
        ] {
            let g = open(&t, orientation);
            let e = g.edge_at(0).unwrap();
            assert_eq!(g.stored_endpoints(&e), (5, 6), "{:?}", orientation);
        }
    }

    #[test]
    fn test_edges_between_parallel() {
        let t = sample();
        let g = open(&t, Orientation::Directed);
        let edges = g.edges_between(1, 2).unwrap();
        assert_eq!(edges.iter().map(|e| e.row_id).collect::<Vec<_>>(), vec![0, 3]);
        assert_eq!(g.edge_between(1, 2).unwrap().unwrap().row_id, 0);
        assert!(g.edge_between(2, 1).unwrap().is_none());
        assert!(g.contains_edge(1, 2).unwrap());
        assert!(!g.contains_edge(2, 1).unwrap());
    }

    #[test]
    fn test_edges_between_reversed_and_undirected() {
        let t = sample();
        let r = open(&t, Orientation::DirectedReversed);
        let e = r.edge_between(2, 1).unwrap().unwrap();
        assert_eq!((e.source, e.target, e.row_id), (2, 1, 0));
        assert!(r.edge_between(1, 2).unwrap().is_none());

        let u = open(&t, Orientation::Undirected);
        let rows: Vec<RowId> = u.edges_between(3, 2).unwrap().iter().map(|e| e.row_id).collect();
        assert_eq!(rows, vec![1]);
        assert!(u.contains_edge(2, 1).unwrap());
        assert_eq!(u.edges_between(3, 3).unwrap().len(), 1);
    }

    #[test]
    fn test_edge_at_and_edges() {
        let t = sample();
        let g = open(&t, Orientation::DirectedReversed);
        let e = g.edge_at(2).unwrap();
        assert_eq!((e.source, e.target), (3, 1));
        assert_eq!(g.edge_count().unwrap(), 5);
        let all = g.edges().unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[4].row_id, 4);
    }

    #[test]
    fn test_missing_start_field() {
        let t = MemoryEdgeTable::new(Schema::new(vec![
            Column::new("from", ColumnType::Int),
            Column::new("end_node", ColumnType::Int),
        ]));
        let err = GraphView::open(&t, &FieldNames::default(), None, Orientation::Directed)
            .err()
            .unwrap();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("start_node"));
    }

    #[test]
    fn test_missing_weight_field() {
        let t = sample();
        let err = GraphView::open(&t, &FieldNames::default(), Some("cost"), Orientation::Directed)
            .err()
            .unwrap();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("cost"));
    }

    #[test]
    fn test_weight_not_set() {
        let t = sample();
        let g = GraphView::open(&t, &FieldNames::default(), None, Orientation::Directed).unwrap();
        // Index-only queries still work
        assert!(g.contains_vertex(1).unwrap());
        assert_eq!(g.out_degree(1).unwrap(), 3);
        // Reading an edge needs the weight
        let err = g.out_edges(1).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("weight field not set"));
    }

    #[test]
    fn test_custom_field_names_and_geometry() {
        let mut t = MemoryEdgeTable::new(Schema::new(vec![
            Column::new("the_geom", ColumnType::Geometry),
            Column::new("a", ColumnType::Int),
            Column::new("b", ColumnType::Int),
            Column::new("len", ColumnType::Int),
        ]));
        t.push_row(vec![
            Value::Geometry("LINESTRING(0 0, 1 1)".into()),
            Value::Int(1),
            Value::Int(2),
            Value::Int(4),
        ])
        .unwrap();
        t.push_row(vec![Value::Null, Value::Int(2), Value::Int(3), Value::Int(1)])
            .unwrap();
        let names = FieldNames {
            start_node: "a".into(),
            end_node: "b".into(),
            geometry: None,
        };
        let g = GraphView::open(&t, &names, Some("len"), Orientation::Directed).unwrap();
        let e = g.out_edges(1).unwrap()[0];
        assert_eq!(g.weight(&e), 4.0);
        assert_eq!(g.geometry_ref(&e), Some(0));
        assert_eq!(
            g.geometry(&e).unwrap(),
            Some(Value::Geometry("LINESTRING(0 0, 1 1)".into()))
        );
        let e2 = g.out_edges(2).unwrap()[0];
        assert_eq!(g.geometry(&e2).unwrap(), None);
    }

    #[test]
    fn test_no_geometry_field() {
        let t = sample();
        let g = open(&t, Orientation::Directed);
        let e = g.out_edges(1).unwrap()[0];
        assert_eq!(g.geometry_ref(&e), None);
        assert_eq!(g.geometry(&e).unwrap(), None);
    }

    #[test]
    fn test_orientation_codes() {
        assert_eq!(Orientation::from_code(1).unwrap(), Orientation::Directed);
        assert_eq!(Orientation::from_code(2).unwrap(), Orientation::DirectedReversed);
        assert_eq!(Orientation::from_code(3).unwrap(), Orientation::Undirected);
        let err = Orientation::from_code(4).unwrap_err();
        assert!(err.is_graph());
        assert!(err.to_string().contains('4'));
        for o in [
            Orientation::Directed,
            Orientation::DirectedReversed,
            Orientation::Undirected,
        ] {
            assert_eq!(Orientation::from_code(o.code()).unwrap(), o);
        }
        assert_eq!(Orientation::from_flags(true, true), Orientation::Undirected);
        assert_eq!(Orientation::from_flags(false, true), Orientation::DirectedReversed);
        assert_eq!(Orientation::from_flags(false, false), Orientation::Directed);
    }
}
