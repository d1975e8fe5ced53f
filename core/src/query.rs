//! Query operations built on a closest-first traversal: shortest path,
//! shortest path lengths to every vertex, and radius-bounded reachability
//! from one or many sources.
//!
//! Row-producing operations are lazy iterators of `Result<row>`; the first
//! error ends the sequence. Cancellation ends it silently.

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::config::checked_radius;
use crate::error::{Error, Result};
use crate::graph::{Edge, GraphView, VertexId};
use crate::store::{EdgeTable, RowId, Value};
use crate::traversal::{Cancellation, ClosestFirst, TraversalState};

/// Name of the column holding source vertices in a multi-source query.
pub const SOURCE_COLUMN: &str = "source";

/// One edge of a shortest path, in the edge table's own schema: `start_node`
/// and `end_node` are the stored values whatever the view's orientation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathRow {
    pub geometry: Option<Value>,
    pub row_id: RowId,
    pub start_node: VertexId,
    pub end_node: VertexId,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ShortestPath {
    /// Path edges from source to target. Empty when source == target.
    Found { edges: Vec<PathRow>, cost: f64 },
    Unreachable,
    Cancelled,
}

/// `(id, start_node, end_node, weight)` row of a path-length query:
/// `id` is the source, `end_node` the reached vertex, `start_node` the
/// vertex produced just before it, and `weight` the cumulative distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathLengthRow {
    pub id: VertexId,
    pub start_node: VertexId,
    pub end_node: VertexId,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReachableEdgeRow {
    pub geometry: Option<Value>,
    pub edge_id: RowId,
    pub weight: f64,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiReachableEdgeRow {
    pub geometry: Option<Value>,
    pub edge_id: RowId,
    pub source: VertexId,
    pub weight: f64,
    pub distance: f64,
}

fn require_vertex<T: EdgeTable + ?Sized>(view: &GraphView<'_, T>, vertex: VertexId) -> Result<()> {
    if view.contains_vertex(vertex)? {
        Ok(())
    } else {
        Err(Error::VertexNotFound(vertex))
    }
}

/// Cheapest path from `source` to `target`.
///
/// Expands closest-first until `target` is finalized, then walks the
/// spanning tree back to `source`.
pub fn shortest_path<'a, T, C>(
    view: &'a GraphView<'a, T>,
    source: VertexId,
    target: VertexId,
    cancel: C,
) -> Result<ShortestPath>
where
    T: EdgeTable + ?Sized,
    C: Cancellation,
{
    require_vertex(view, source)?;
    require_vertex(view, target)?;

    if source == target {
        return Ok(ShortestPath::Found {
            edges: Vec::new(),
            cost: 0.0,
        });
    }

    let mut traversal = ClosestFirst::new(view, source).with_cancellation(cancel);
    while let Some(visit) = traversal.next() {
        let visit = visit?;
        if visit.vertex != target {
            continue;
        }
        let path = traversal.path_to(target).unwrap_or_default();
        let mut edges = Vec::with_capacity(path.len());
        for edge in path {
            let (start_node, end_node) = view.stored_endpoints(&edge);
            edges.push(PathRow {
                geometry: view.geometry(&edge)?,
                row_id: edge.row_id,
                start_node,
                end_node,
                weight: edge.weight,
            });
        }
        debug!(source, target, hops = edges.len(), cost = visit.distance, "shortest path found");
        return Ok(ShortestPath::Found {
            edges,
            cost: visit.distance,
        });
    }

    match traversal.state() {
        TraversalState::Cancelled => Ok(ShortestPath::Cancelled),
        _ => Ok(ShortestPath::Unreachable),
    }
}

/// Shortest path length from `source` to every reachable vertex.
///
/// Always starts with the `(source, source, source, 0)` row, even when
/// `source` has no edges. Note that `start_node` of each following row is
/// the previously produced vertex, which is not necessarily the vertex's
/// parent on its shortest path. Use [`shortest_path`] to reconstruct
/// actual paths.
pub fn shortest_path_length_all<'a, T, C>(
    view: &'a GraphView<'a, T>,
    source: VertexId,
    radius: Option<f64>,
    cancel: C,
) -> Result<PathLengths<'a, T, C>>
where
    T: EdgeTable + ?Sized,
    C: Cancellation,
{
    let radius = checked_radius(radius)?;
    Ok(PathLengths {
        traversal: ClosestFirst::new(view, source)
            .radius(radius)
            .with_cancellation(cancel),
        source,
        previous: source,
        started: false,
        failed: false,
    })
}

pub struct PathLengths<'a, T: EdgeTable + ?Sized, C: Cancellation> {
    traversal: ClosestFirst<'a, T, C>,
    source: VertexId,
    previous: VertexId,
    started: bool,
    failed: bool,
}

impl<T: EdgeTable + ?Sized, C: Cancellation> Iterator for PathLengths<'_, T, C> {
    type Item = Result<PathLengthRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            return Some(Ok(PathLengthRow {
                id: self.source,
                start_node: self.source,
                end_node: self.source,
                weight: 0.0,
            }));
        }
        if self.failed {
            return None;
        }

        loop {
            let visit = match self.traversal.next()? {
                Ok(visit) => visit,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            };
            if visit.vertex == self.source {
                continue;
            }
            let row = PathLengthRow {
                id: self.source,
                start_node: self.previous,
                end_node: visit.vertex,
                weight: visit.distance,
            };
            self.previous = visit.vertex;
            return Some(Ok(row));
        }
    }
}

/// Every edge of the shortest-path tree rooted at `source`, limited to
/// vertices within `radius`. One row per reached vertex other than `source`.
pub fn reachable_edges<'a, T, C>(
    view: &'a GraphView<'a, T>,
    source: VertexId,
    radius: Option<f64>,
    cancel: C,
) -> Result<ReachableEdges<'a, T, C>>
where
    T: EdgeTable + ?Sized,
    C: Cancellation,
{
    let radius = checked_radius(radius)?;
    require_vertex(view, source)?;
    Ok(ReachableEdges {
        view,
        traversal: ClosestFirst::new(view, source)
            .radius(radius)
            .with_cancellation(cancel),
        failed: false,
    })
}

pub struct ReachableEdges<'a, T: EdgeTable + ?Sized, C: Cancellation> {
    view: &'a GraphView<'a, T>,
    traversal: ClosestFirst<'a, T, C>,
    failed: bool,
}

impl<'a, T: EdgeTable + ?Sized, C: Cancellation> ReachableEdges<'a, T, C> {
    pub fn state(&self) -> TraversalState {
        self.traversal.state()
    }

    fn row(&self, edge: Edge, distance: f64) -> Result<ReachableEdgeRow> {
        Ok(ReachableEdgeRow {
            geometry: self.view.geometry(&edge)?,
            edge_id: edge.row_id,
            weight: edge.weight,
            distance,
        })
    }
}

impl<T: EdgeTable + ?Sized, C: Cancellation> Iterator for ReachableEdges<'_, T, C> {
    type Item = Result<ReachableEdgeRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let result = match self.traversal.next()? {
                Ok(visit) => match visit.edge {
                    Some(edge) => self.row(edge, visit.distance),
                    // The source itself
                    None => continue,
                },
                Err(e) => Err(e),
            };
            self.failed = result.is_err();
            return Some(result);
        }
    }
}

/// Read the source vertices of a multi-source query from `table`'s
/// `source` column (matched case-insensitively).
pub fn source_vertices<S: EdgeTable + ?Sized>(table: &S) -> Result<Vec<VertexId>> {
    let column = table
        .schema()
        .columns()
        .iter()
        .position(|c| c.name.eq_ignore_ascii_case(SOURCE_COLUMN))
        .ok_or_else(|| Error::MissingSourceColumn(SOURCE_COLUMN.to_string()))?;

    let mut sources = Vec::new();
    for row in 0..table.row_count()? {
        sources.push(table.int(row, column)?);
    }
    Ok(sources)
}

/// [`reachable_edges`] from each vertex of `sources`, in table order, rows
/// tagged with their source.
///
/// Traversals run one after another. A cancelled flag also stops the
/// remaining sources from starting.
pub fn multi_reachable_edges<'a, T, S, C>(
    view: &'a GraphView<'a, T>,
    sources: &S,
    radius: Option<f64>,
    cancel: C,
) -> Result<MultiReachableEdges<'a, T, C>>
where
    T: EdgeTable + ?Sized,
    S: EdgeTable + ?Sized,
    C: Cancellation + Clone,
{
    checked_radius(radius)?;
    let sources = source_vertices(sources)?;
    debug!(sources = sources.len(), "multi-source reachability");
    Ok(MultiReachableEdges {
        view,
        sources: sources.into_iter(),
        radius,
        cancel,
        current: None,
        failed: false,
    })
}

pub struct MultiReachableEdges<'a, T: EdgeTable + ?Sized, C: Cancellation + Clone> {
    view: &'a GraphView<'a, T>,
    sources: std::vec::IntoIter<VertexId>,
    radius: Option<f64>,
    cancel: C,
    current: Option<(VertexId, ReachableEdges<'a, T, C>)>,
    failed: bool,
}

impl<T: EdgeTable + ?Sized, C: Cancellation + Clone> Iterator for MultiReachableEdges<'_, T, C> {
    type Item = Result<MultiReachableEdgeRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some((source, rows)) = &mut self.current {
                match rows.next() {
                    Some(Ok(row)) => return Some(Ok(tag(*source, row))),
                    Some(Err(e)) => {
                        self.failed = true;
                        return Some(Err(e));
                    }
                    None => self.current = None,
                }
            }

            if self.cancel.is_cancelled() {
                return None;
            }
            let source = self.sources.next()?;
            match reachable_edges(self.view, source, self.radius, self.cancel.clone()) {
                Ok(rows) => self.current = Some((source, rows)),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

fn tag(source: VertexId, row: ReachableEdgeRow) -> MultiReachableEdgeRow {
    MultiReachableEdgeRow {
        geometry: row.geometry,
        edge_id: row.edge_id,
        source,
        weight: row.weight,
        distance: row.distance,
    }
}

/// Parallel form of [`multi_reachable_edges`]: one traversal per source on
/// the rayon pool. Rows come back grouped by source in table order, the
/// same sequence the sequential form produces.
pub fn multi_reachable_edges_par<'a, T, S, C>(
    view: &'a GraphView<'a, T>,
    sources: &S,
    radius: Option<f64>,
    cancel: &C,
) -> Result<Vec<MultiReachableEdgeRow>>
where
    T: EdgeTable + ?Sized,
    S: EdgeTable + ?Sized,
    C: Cancellation,
{
    checked_radius(radius)?;
    let sources = source_vertices(sources)?;
    debug!(sources = sources.len(), "parallel multi-source reachability");

    let per_source: Vec<Vec<MultiReachableEdgeRow>> = sources
        .par_iter()
        .map(|&source| -> Result<Vec<MultiReachableEdgeRow>> {
            if cancel.is_cancelled() {
                return Ok(Vec::new());
            }
            reachable_edges(view, source, radius, cancel)?
                .map(|row| row.map(|r| tag(source, r)))
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<_>>()?;

    Ok(per_source.into_iter().flatten().collect())
}
