use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::graph::{Direction, Edge, GraphView, VertexId};
use crate::store::EdgeTable;

/// Cancellation is polled once every this many produced vertices.
pub const CANCEL_CHECK_INTERVAL: usize = 100;

/// Cooperative cancellation signal, polled by a running traversal.
pub trait Cancellation: Send + Sync {
    fn is_cancelled(&self) -> bool;
}

impl<C: Cancellation + ?Sized> Cancellation for &C {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

/// Never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl Cancellation for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Shared flag: clone it into the traversal, call `cancel()` from anywhere.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, AtomicOrdering::Relaxed);
    }
}

impl Cancellation for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.0.load(AtomicOrdering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalState {
    Ready,
    Expanding,
    Exhausted,
    Cancelled,
}

/// A finalized vertex: its shortest distance from the nearest source and
/// the spanning-tree edge that reached it (`None` for a source).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visit {
    pub vertex: VertexId,
    pub distance: f64,
    pub edge: Option<Edge>,
}

/// Frontier entry. Ordered so that `BinaryHeap` pops the smallest
/// distance first, and among equal distances the earliest insertion.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f64,
    seq: u64,
    vertex: VertexId,
    edge: Option<Edge>,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lazy closest-first (Dijkstra) traversal over a graph view.
///
/// Each `next()` finalizes one vertex and yields it; distances come out in
/// non-decreasing order. Stopping early costs nothing beyond the work
/// already done. Entries whose distance would exceed the radius never enter
/// the frontier, so a bounded traversal ends by itself once everything
/// within the radius is finalized.
///
/// Superseded frontier entries are left in the heap and skipped when popped.
pub struct ClosestFirst<'a, T: EdgeTable + ?Sized, C: Cancellation = NeverCancel> {
    view: &'a GraphView<'a, T>,
    radius: f64,
    cancel: C,
    frontier: BinaryHeap<Candidate>,
    tentative: HashMap<VertexId, f64>,
    finalized: HashMap<VertexId, f64>,
    tree: HashMap<VertexId, Edge>,
    seq: u64,
    produced: usize,
    state: TraversalState,
}

impl<'a, T: EdgeTable + ?Sized> ClosestFirst<'a, T, NeverCancel> {
    pub fn new(view: &'a GraphView<'a, T>, source: VertexId) -> Self {
        Self::from_sources(view, [source])
    }

    /// Seed several sources at distance 0. Each vertex is reached from
    /// whichever source is closest.
    pub fn from_sources<I>(view: &'a GraphView<'a, T>, sources: I) -> Self
    where
        I: IntoIterator<Item = VertexId>,
    {
        let mut traversal = Self {
            view,
            radius: f64::INFINITY,
            cancel: NeverCancel,
            frontier: BinaryHeap::new(),
            tentative: HashMap::new(),
            finalized: HashMap::new(),
            tree: HashMap::new(),
            seq: 0,
            produced: 0,
            state: TraversalState::Ready,
        };
        for source in sources {
            if !traversal.tentative.contains_key(&source) {
                traversal.push(source, 0.0, None);
            }
        }
        traversal
    }
}

impl<'a, T: EdgeTable + ?Sized, C: Cancellation> ClosestFirst<'a, T, C> {
    /// Bound the traversal to vertices within `radius` of a source.
    pub fn radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_cancellation<D: Cancellation>(self, cancel: D) -> ClosestFirst<'a, T, D> {
        ClosestFirst {
            view: self.view,
            radius: self.radius,
            cancel,
            frontier: self.frontier,
            tentative: self.tentative,
            finalized: self.finalized,
            tree: self.tree,
            seq: self.seq,
            produced: self.produced,
            state: self.state,
        }
    }

    pub fn state(&self) -> TraversalState {
        self.state
    }

    /// Number of vertices produced so far.
    pub fn produced(&self) -> usize {
        self.produced
    }

    /// Finalized shortest distance to `vertex`, if it has been produced.
    pub fn shortest_path_length(&self, vertex: VertexId) -> Option<f64> {
        self.finalized.get(&vertex).copied()
    }

    /// Edge that established `vertex`'s finalized distance. `None` for
    /// sources and for vertices not produced yet.
    pub fn spanning_tree_edge(&self, vertex: VertexId) -> Option<Edge> {
        self.tree.get(&vertex).copied()
    }

    /// Spanning-tree edges from a source to `target`, in path order.
    /// `None` if `target` has not been produced.
    pub fn path_to(&self, target: VertexId) -> Option<Vec<Edge>> {
        if !self.finalized.contains_key(&target) {
            return None;
        }
        let mut path = Vec::new();
        let mut current = target;
        while let Some(edge) = self.tree.get(&current) {
            path.push(*edge);
            current = edge.opposite(current);
        }
        path.reverse();
        Some(path)
    }

    fn push(&mut self, vertex: VertexId, distance: f64, edge: Option<Edge>) {
        self.tentative.insert(vertex, distance);
        self.frontier.push(Candidate {
            distance,
            seq: self.seq,
            vertex,
            edge,
        });
        self.seq += 1;
    }

    fn relax(&mut self, vertex: VertexId, distance: f64) -> Result<()> {
        for edge in self.view.neighbor_edges(vertex, Direction::Outgoing)? {
            if edge.weight.is_nan() || edge.weight < 0.0 {
                return Err(Error::InvalidWeight {
                    row: edge.row_id,
                    weight: edge.weight,
                });
            }
            let neighbor = edge.opposite(vertex);
            if self.finalized.contains_key(&neighbor) {
                continue;
            }
            let candidate = distance + edge.weight;
            if candidate > self.radius {
                continue;
            }
            match self.tentative.get(&neighbor) {
                Some(&known) if known <= candidate => {}
                _ => self.push(neighbor, candidate, Some(edge)),
            }
        }
        Ok(())
    }

    fn step(&mut self) -> Option<Result<Visit>> {
        match self.state {
            TraversalState::Exhausted | TraversalState::Cancelled => return None,
            TraversalState::Ready => {
                debug!(
                    sources = self.frontier.len(),
                    radius = self.radius,
                    "closest-first traversal started"
                );
                self.state = TraversalState::Expanding;
            }
            TraversalState::Expanding => {}
        }

        if self.produced > 0
            && self.produced % CANCEL_CHECK_INTERVAL == 0
            && self.cancel.is_cancelled()
        {
            warn!(produced = self.produced, "traversal cancelled");
            self.state = TraversalState::Cancelled;
            return None;
        }

        while let Some(entry) = self.frontier.pop() {
            if self.finalized.contains_key(&entry.vertex) {
                continue;
            }
            self.finalized.insert(entry.vertex, entry.distance);
            if let Some(edge) = entry.edge {
                self.tree.insert(entry.vertex, edge);
            }

            if let Err(e) = self.relax(entry.vertex, entry.distance) {
                // A failed lookup ends the traversal; the caller sees the error once.
                self.state = TraversalState::Exhausted;
                return Some(Err(e));
            }

            self.produced += 1;
            return Some(Ok(Visit {
                vertex: entry.vertex,
                distance: entry.distance,
                edge: entry.edge,
            }));
        }

        debug!(produced = self.produced, "closest-first traversal exhausted");
        self.state = TraversalState::Exhausted;
        None
    }
}

impl<T: EdgeTable + ?Sized, C: Cancellation> Iterator for ClosestFirst<'_, T, C> {
    type Item = Result<Visit>;

    fn next(&mut self) -> Option<Self::Item> {
        self.step()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldNames;
    use crate::graph::Orientation;
    use crate::store::MemoryEdgeTable;

    fn view(table: &MemoryEdgeTable, orientation: Orientation) -> GraphView<'_, MemoryEdgeTable> {
        GraphView::open(table, &FieldNames::default(), Some("weight"), orientation).unwrap()
    }

    fn make_chain(n: i64) -> MemoryEdgeTable {
        MemoryEdgeTable::from_edges((0..n - 1).map(|i| (i, i + 1, 1.0)))
    }

    fn make_star(center: i64, leaves: i64) -> MemoryEdgeTable {
        MemoryEdgeTable::from_edges((1..=leaves).map(|i| (center, center + i, i as f64)))
    }

    fn make_cycle(n: i64) -> MemoryEdgeTable {
        MemoryEdgeTable::from_edges((0..n).map(|i| (i, (i + 1) % n, 1.0)))
    }

    /// 1→2 (1), 2→3 (1), 1→3 (5), 3→4 (1)
    fn make_shortcut() -> MemoryEdgeTable {
        MemoryEdgeTable::from_edges(vec![(1, 2, 1.0), (2, 3, 1.0), (1, 3, 5.0), (3, 4, 1.0)])
    }

    fn collect<C: Cancellation>(t: ClosestFirst<'_, MemoryEdgeTable, C>) -> Vec<Visit> {
        t.collect::<Result<Vec<_>>>().unwrap()
    }

    #[test]
    fn test_chain_distances() {
        let t = make_chain(6);
        let g = view(&t, Orientation::Directed);
        let visits = collect(ClosestFirst::new(&g, 0));
        let order: Vec<VertexId> = visits.iter().map(|v| v.vertex).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(visits[5].distance, 5.0);
        assert!(visits[0].edge.is_none());
        assert_eq!(visits[3].edge.unwrap().row_id, 2);
    }

    #[test]
    fn test_shortcut_not_taken() {
        let t = make_shortcut();
        let g = view(&t, Orientation::Directed);
        let mut cf = ClosestFirst::new(&g, 1);
        let visits: Vec<Visit> = cf.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(visits.len(), 4);
        assert_eq!(cf.shortest_path_length(3), Some(2.0));
        assert_eq!(cf.shortest_path_length(4), Some(3.0));
        assert_eq!(cf.spanning_tree_edge(3).unwrap().row_id, 1);
        let rows: Vec<u64> = cf.path_to(4).unwrap().iter().map(|e| e.row_id).collect();
        assert_eq!(rows, vec![0, 1, 3]);
        assert!(cf.path_to(1).unwrap().is_empty());
        assert!(cf.path_to(99).is_none());
        assert_eq!(cf.state(), TraversalState::Exhausted);
    }

    #[test]
    fn test_non_decreasing_order() {
        let t = make_star(0, 50);
        let g = view(&t, Orientation::Undirected);
        let visits = collect(ClosestFirst::new(&g, 0));
        assert_eq!(visits.len(), 51);
        assert!(visits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_cycle_terminates() {
        let t = make_cycle(5);
        let g = view(&t, Orientation::Undirected);
        let visits = collect(ClosestFirst::new(&g, 0));
        assert_eq!(visits.len(), 5);
        let far = visits.iter().map(|v| v.distance).fold(0.0, f64::max);
        assert_eq!(far, 2.0);
    }

    #[test]
    fn test_directed_respects_direction() {
        let t = make_chain(4);
        let g = view(&t, Orientation::Directed);
        assert_eq!(collect(ClosestFirst::new(&g, 3)).len(), 1);

        let r = g.with_orientation(Orientation::DirectedReversed);
        let visits = collect(ClosestFirst::new(&r, 3));
        let order: Vec<VertexId> = visits.iter().map(|v| v.vertex).collect();
        assert_eq!(order, vec![3, 2, 1, 0]);
        // Reversed tree edges point from the traversal side
        let e = visits[1].edge.unwrap();
        assert_eq!((e.source, e.target), (3, 2));
    }

    #[test]
    fn test_radius_cutoff() {
        let t = make_chain(10);
        let g = view(&t, Orientation::Directed);
        let visits = collect(ClosestFirst::new(&g, 0).radius(3.0));
        assert_eq!(visits.len(), 4);
        assert!(visits.iter().all(|v| v.distance <= 3.0));

        let visits = collect(ClosestFirst::new(&g, 0).radius(0.0));
        assert_eq!(visits.len(), 1);
    }

    #[test]
    fn test_radius_keeps_cheaper_detour() {
        // Direct 0→2 costs 10, detour 0→1→2 costs 2: both within radius 5 only via detour
        let t = MemoryEdgeTable::from_edges(vec![(0, 2, 10.0), (0, 1, 1.0), (1, 2, 1.0)]);
        let g = view(&t, Orientation::Directed);
        let visits = collect(ClosestFirst::new(&g, 0).radius(5.0));
        let two = visits.iter().find(|v| v.vertex == 2).unwrap();
        assert_eq!(two.distance, 2.0);
        assert_eq!(two.edge.unwrap().row_id, 2);
    }

    #[test]
    fn test_tie_broken_by_insertion_order() {
        // 1 and 2 are both at distance 1; 2 was pushed first (lower row id)
        let t = MemoryEdgeTable::from_edges(vec![(0, 2, 1.0), (0, 1, 1.0)]);
        let g = view(&t, Orientation::Directed);
        let order: Vec<VertexId> = collect(ClosestFirst::new(&g, 0))
            .iter()
            .map(|v| v.vertex)
            .collect();
        assert_eq!(order, vec![0, 2, 1]);
    }

    #[test]
    fn test_parallel_edges_pick_cheapest() {
        let t = MemoryEdgeTable::from_edges(vec![(0, 1, 3.0), (0, 1, 1.0), (0, 1, 2.0)]);
        let g = view(&t, Orientation::Directed);
        let visits = collect(ClosestFirst::new(&g, 0));
        assert_eq!(visits.len(), 2);
        assert_eq!(visits[1].distance, 1.0);
        assert_eq!(visits[1].edge.unwrap().row_id, 1);
    }

    #[test]
    fn test_self_loop_ignored() {
        let t = MemoryEdgeTable::from_edges(vec![(0, 0, 1.0), (0, 1, 1.0)]);
        let g = view(&t, Orientation::Undirected);
        let visits = collect(ClosestFirst::new(&g, 0));
        assert_eq!(visits.len(), 2);
        assert!(visits[0].edge.is_none());
    }

    #[test]
    fn test_unknown_source_yields_only_itself() {
        let t = make_chain(3);
        let g = view(&t, Orientation::Directed);
        let visits = collect(ClosestFirst::new(&g, 999));
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].vertex, 999);
    }

    #[test]
    fn test_multi_source_seeds() {
        let t = make_chain(10);
        let g = view(&t, Orientation::Undirected);
        let mut cf = ClosestFirst::from_sources(&g, [0, 9, 9]);
        let visits: Vec<Visit> = cf.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(visits.len(), 10);
        assert_eq!(cf.shortest_path_length(4), Some(4.0));
        assert_eq!(cf.shortest_path_length(6), Some(3.0));
        assert!(cf.spanning_tree_edge(9).is_none());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let t = MemoryEdgeTable::from_edges(vec![(0, 1, 1.0), (1, 2, -4.0)]);
        let g = view(&t, Orientation::Directed);
        let mut cf = ClosestFirst::new(&g, 0);
        assert!(cf.next().unwrap().is_ok());
        let err = cf.next().unwrap().unwrap_err();
        assert!(matches!(err, Error::InvalidWeight { row: 1, .. }));
        assert!(cf.next().is_none());
    }

    #[test]
    fn test_cancellation_at_interval() {
        let t = make_chain(500);
        let g = view(&t, Orientation::Directed);
        let flag = CancelFlag::new();
        flag.cancel();
        let mut cf = ClosestFirst::new(&g, 0).with_cancellation(flag.clone());
        let visits: Vec<Visit> = cf.by_ref().collect::<Result<_>>().unwrap();
        // Checked only once 100 vertices have been produced
        assert_eq!(visits.len(), CANCEL_CHECK_INTERVAL);
        assert_eq!(cf.state(), TraversalState::Cancelled);
        assert!(cf.next().is_none());
    }

    #[test]
    fn test_cancel_mid_traversal() {
        let t = make_chain(1000);
        let g = view(&t, Orientation::Directed);
        let flag = CancelFlag::new();
        let mut cf = ClosestFirst::new(&g, 0).with_cancellation(&flag);
        let mut seen = 0;
        while let Some(v) = cf.next() {
            v.unwrap();
            seen += 1;
            if seen == 250 {
                flag.cancel();
            }
        }
        assert_eq!(seen, 300);
        assert_eq!(cf.state(), TraversalState::Cancelled);
    }

    #[test]
    fn test_state_transitions() {
        let t = make_chain(2);
        let g = view(&t, Orientation::Directed);
        let mut cf = ClosestFirst::new(&g, 0);
        assert_eq!(cf.state(), TraversalState::Ready);
        cf.next();
        assert_eq!(cf.state(), TraversalState::Expanding);
        cf.next();
        assert!(cf.next().is_none());
        assert_eq!(cf.state(), TraversalState::Exhausted);
        assert_eq!(cf.produced(), 2);
    }

    #[test]
    fn test_weight_not_set_fails() {
        let t = make_chain(3);
        let g = GraphView::open(&t, &FieldNames::default(), None, Orientation::Directed).unwrap();
        let err = ClosestFirst::new(&g, 0).next().unwrap().unwrap_err();
        assert!(err.is_configuration());
    }
}
