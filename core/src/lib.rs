//! topo-accel-core: closest-first graph traversal over indexed edge tables.
//!
//! Presents a table of `(start_node, end_node, weight[, geometry])` rows as
//! a directed, reversed or undirected multigraph without building adjacency
//! lists: every neighbor query is an index lookup on the table. On top of
//! that sits a lazy Dijkstra traversal and the query operations that drive
//! it (shortest path, shortest path lengths, radius-bounded reachability).
//!
//! The table itself is behind the [`EdgeTable`] trait; [`MemoryEdgeTable`]
//! is the in-process implementation.

mod config;
mod error;
mod graph;
mod query;
mod store;
mod traversal;

pub use config::{FieldNames, QueryConfig};
pub use error::{Error, Result};
pub use graph::{Direction, Edge, GraphView, Orientation, VertexId};
pub use query::{
    multi_reachable_edges, multi_reachable_edges_par, reachable_edges, shortest_path,
    shortest_path_length_all, source_vertices, MultiReachableEdgeRow, MultiReachableEdges,
    PathLengthRow, PathLengths, PathRow, ReachableEdgeRow, ReachableEdges, ShortestPath,
    SOURCE_COLUMN,
};
pub use store::{Column, ColumnType, EdgeTable, MemoryEdgeTable, RowId, Schema, StoreError, Value};
pub use traversal::{
    CancelFlag, Cancellation, ClosestFirst, NeverCancel, TraversalState, Visit,
    CANCEL_CHECK_INTERVAL,
};
