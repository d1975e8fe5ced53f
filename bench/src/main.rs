use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use serde_json::json;
use topo_accel_core::{
    multi_reachable_edges, multi_reachable_edges_par, reachable_edges, shortest_path,
    shortest_path_length_all, Column, ColumnType, EdgeTable, MemoryEdgeTable, NeverCancel,
    Orientation, QueryConfig, Schema, ShortestPath, Value, SOURCE_COLUMN,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "topo-accel-bench", about = "Time closest-first queries on generated or loaded edge tables")]
struct Args {
    /// Graph generator to run. Ignored with --edges.
    #[arg(value_enum, default_value_t = Mode::All)]
    mode: Mode,

    /// Target vertex count for generated graphs.
    #[arg(default_value_t = 100_000)]
    node_count: u64,

    /// Load a CSV edge table instead of generating one.
    /// Header row: start_node,end_node,<weight field>[,...]
    #[arg(long)]
    edges: Option<PathBuf>,

    #[arg(long, default_value = "weight")]
    weight_field: String,

    /// Only run this orientation. Default: all three.
    #[arg(long, value_enum)]
    orientation: Option<OrientationArg>,

    /// Radius for the reachability queries. Default: unbounded.
    #[arg(long)]
    radius: Option<f64>,

    #[arg(long, default_value_t = 0)]
    source: i64,

    /// Shortest path target. Default: highest vertex id.
    #[arg(long)]
    target: Option<i64>,

    /// Number of sources for the multi-source query.
    #[arg(long, default_value_t = 8)]
    sources: i64,

    /// Print result rows as JSON instead of a timing table.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    All,
    Lsystem,
    Scalefree,
    Smallworld,
    Random,
    Barbell,
    Dla,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OrientationArg {
    Directed,
    Reversed,
    Undirected,
}

impl From<OrientationArg> for Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Directed => Orientation::Directed,
            OrientationArg::Reversed => Orientation::DirectedReversed,
            OrientationArg::Undirected => Orientation::Undirected,
        }
    }
}

type Generator = fn(u64) -> Vec<(i64, i64, f64)>;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Some(r) = args.radius {
        if r.is_nan() || r < 0.0 {
            bail!("--radius must be a non-negative number");
        }
    }

    if let Some(path) = &args.edges {
        let t = Instant::now();
        let table = load_csv(path, &args.weight_field)?;
        info!(rows = table.row_count()?, elapsed_ms = t.elapsed().as_millis() as u64, "loaded edge table");
        return run_benchmark(&path.display().to_string(), &table, &args);
    }

    let generators: Vec<(&str, Generator)> = match args.mode {
        Mode::Lsystem => vec![("L-system tree", gen_lsystem)],
        Mode::Scalefree => vec![("Scale-free (edge sampling)", gen_scale_free)],
        Mode::Smallworld => vec![("Small-world (Watts-Strogatz)", gen_small_world)],
        Mode::Random => vec![("Erdos-Renyi random", gen_random)],
        Mode::Barbell => vec![("Barbell (clique-bridge-clique)", gen_barbell)],
        Mode::Dla => vec![("DLA (organic branching)", gen_dla)],
        Mode::All => vec![
            ("L-system tree", gen_lsystem as Generator),
            ("Scale-free (edge sampling)", gen_scale_free),
            ("Small-world (Watts-Strogatz)", gen_small_world),
            ("Erdos-Renyi random", gen_random),
            ("Barbell (clique-bridge-clique)", gen_barbell),
            ("DLA (organic branching)", gen_dla),
        ],
    };

    for (name, generator) in generators {
        let t = Instant::now();
        let table = MemoryEdgeTable::from_edges(generator(args.node_count));
        info!(graph = name, rows = table.row_count()?, elapsed_ms = t.elapsed().as_millis() as u64, "generated edge table");
        run_benchmark(name, &table, &args)?;
    }
    Ok(())
}

/// Reads a CSV edge table. The node columns become ints, the weight column
/// a double, anything else is kept as text.
fn load_csv(path: &Path, weight_field: &str) -> anyhow::Result<MemoryEdgeTable> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers = reader.headers()?.clone();

    let columns: Vec<Column> = headers
        .iter()
        .map(|name| {
            let ty = match name {
                "start_node" | "end_node" => ColumnType::Int,
                n if n == weight_field => ColumnType::Double,
                _ => ColumnType::Text,
            };
            Column::new(name, ty)
        })
        .collect();
    let mut table = MemoryEdgeTable::new(Schema::new(columns.clone()));

    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let mut row = Vec::with_capacity(columns.len());
        for (column, field) in columns.iter().zip(record.iter()) {
            let value = match (column.ty, field.trim()) {
                (_, "") => Value::Null,
                (ColumnType::Int, s) => Value::Int(
                    s.parse()
                        .with_context(|| format!("line {}: bad {} {:?}", line + 2, column.name, s))?,
                ),
                (ColumnType::Double, s) => Value::Double(
                    s.parse()
                        .with_context(|| format!("line {}: bad {} {:?}", line + 2, column.name, s))?,
                ),
                (_, s) => Value::Text(s.to_string()),
            };
            row.push(value);
        }
        table.push_row(row)?;
    }
    Ok(table)
}

fn source_table(view_vertices: impl Iterator<Item = i64>) -> anyhow::Result<MemoryEdgeTable> {
    let mut table = MemoryEdgeTable::new(Schema::new(vec![Column::new(SOURCE_COLUMN, ColumnType::Int)]));
    for v in view_vertices {
        table.push_row(vec![Value::Int(v)])?;
    }
    Ok(table)
}

fn run_benchmark(name: &str, table: &MemoryEdgeTable, args: &Args) -> anyhow::Result<()> {
    let orientations: Vec<Orientation> = match args.orientation {
        Some(o) => vec![o.into()],
        None => vec![
            Orientation::Directed,
            Orientation::DirectedReversed,
            Orientation::Undirected,
        ],
    };

    if !args.json {
        println!("--- {} ---", name);
        println!("{} edge rows", table.row_count()?);
        println!();
        println!("{:>18} {:>24} {:>12} {:>10}", "orientation", "query", "rows", "time");
        println!("{:->18} {:->24} {:->12} {:->10}", "", "", "", "");
    }

    for orientation in orientations {
        let mut config = QueryConfig::new(args.weight_field.as_str()).orientation(orientation);
        config.radius = args.radius;
        let view = config.open(table)?;

        let vertices = view.vertex_set()?;
        let Some(&last) = vertices.iter().next_back() else {
            bail!("edge table {} has no vertices", name);
        };
        let target = args.target.unwrap_or(last);
        let sources = source_table(vertices.iter().copied().take(args.sources.max(0) as usize))?;

        let report = |query: &str, rows: usize, ms: f64, payload: serde_json::Value| {
            if args.json {
                let line = json!({
                    "graph": name,
                    "orientation": orientation,
                    "query": query,
                    "rows": rows,
                    "millis": ms,
                    "result": payload,
                });
                println!("{}", line);
            } else {
                println!("{:>18} {:>24} {:>12} {:>8.1}ms", format!("{:?}", orientation), query, rows, ms);
            }
        };

        let t = Instant::now();
        let path = shortest_path(&view, args.source, target, NeverCancel)?;
        let ms = t.elapsed().as_secs_f64() * 1000.0;
        let hops = match &path {
            ShortestPath::Found { edges, .. } => edges.len(),
            _ => 0,
        };
        report("shortest_path", hops, ms, serde_json::to_value(&path)?);

        let t = Instant::now();
        let lengths = shortest_path_length_all(&view, args.source, config.radius, NeverCancel)?
            .collect::<topo_accel_core::Result<Vec<_>>>()?;
        let ms = t.elapsed().as_secs_f64() * 1000.0;
        report("shortest_path_length", lengths.len(), ms, serde_json::to_value(&lengths)?);

        let t = Instant::now();
        let reached = reachable_edges(&view, args.source, config.radius, NeverCancel)?
            .collect::<topo_accel_core::Result<Vec<_>>>()?;
        let ms = t.elapsed().as_secs_f64() * 1000.0;
        report("reachable_edges", reached.len(), ms, serde_json::to_value(&reached)?);

        let t = Instant::now();
        let multi = multi_reachable_edges(&view, &sources, config.radius, NeverCancel)?
            .collect::<topo_accel_core::Result<Vec<_>>>()?;
        let ms = t.elapsed().as_secs_f64() * 1000.0;
        report("multi_reachable_edges", multi.len(), ms, serde_json::to_value(&multi)?);

        let t = Instant::now();
        let multi_par = multi_reachable_edges_par(&view, &sources, config.radius, &NeverCancel)?;
        let ms = t.elapsed().as_secs_f64() * 1000.0;
        if multi_par != multi {
            bail!("parallel multi-source result differs from sequential ({:?})", orientation);
        }
        report("multi_reachable_par", multi_par.len(), ms, serde_json::Value::Null);
    }

    if !args.json {
        println!();
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Generators: deterministic, single pass, emit (start, end, weight) rows
// ---------------------------------------------------------------------------

/// Linear congruential generator, good enough for synthetic topologies.
struct FastRng(u64);

impl FastRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next(&mut self, max: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 33) % max
    }

    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Edge weight in [0.5, 10.5).
    fn weight(&mut self) -> f64 {
        0.5 + self.next_f64() * 10.0
    }
}

/// Each vertex spawns three children, breadth first. Deep paths with
/// exponential width.
fn gen_lsystem(node_count: u64) -> Vec<(i64, i64, f64)> {
    let mut rng = FastRng::new(42);
    let mut edges = Vec::with_capacity(node_count as usize);
    let branching = 3;

    let mut next_id: u64 = 1;
    let mut frontier: Vec<u64> = vec![0];
    while next_id < node_count && !frontier.is_empty() {
        let mut next_frontier = Vec::with_capacity(frontier.len() * branching);
        for &parent in &frontier {
            for _ in 0..branching {
                if next_id >= node_count {
                    break;
                }
                edges.push((parent as i64, next_id as i64, rng.weight()));
                next_frontier.push(next_id);
                next_id += 1;
            }
        }
        frontier = next_frontier;
    }
    edges
}

/// Preferential attachment by sampling an endpoint of an existing edge.
fn gen_scale_free(node_count: u64) -> Vec<(i64, i64, f64)> {
    let per_node = 10u64;
    let mut rng = FastRng::new(12345);
    let mut edges = Vec::with_capacity((node_count * per_node) as usize);
    let mut endpoints: Vec<u64> = Vec::with_capacity((node_count * per_node * 2) as usize);

    let seed = 5u64.min(node_count);
    for i in 0..seed {
        for j in (i + 1)..seed {
            edges.push((i as i64, j as i64, rng.weight()));
            endpoints.extend([i, j]);
        }
    }

    for v in seed..node_count {
        if endpoints.is_empty() {
            break;
        }
        for _ in 0..per_node.min(v) {
            let target = endpoints[rng.next(endpoints.len() as u64) as usize];
            if target != v {
                edges.push((v as i64, target as i64, rng.weight()));
                endpoints.extend([v, target]);
            }
        }
    }
    edges
}

/// Ring lattice with `k` forward neighbors, each edge rewired with probability `p`.
fn gen_small_world(node_count: u64) -> Vec<(i64, i64, f64)> {
    let k = 10u64;
    let p = 0.05;
    let mut rng = FastRng::new(67890);
    let mut edges = Vec::with_capacity((node_count * k) as usize);

    for i in 0..node_count {
        for j in 1..=k {
            let mut target = (i + j) % node_count;
            if rng.next_f64() < p {
                let rewired = rng.next(node_count);
                if rewired != i {
                    target = rewired;
                }
            }
            edges.push((i as i64, target as i64, rng.weight()));
        }
    }
    edges
}

/// Uniform random edges, about ten per vertex.
fn gen_random(node_count: u64) -> Vec<(i64, i64, f64)> {
    let mut rng = FastRng::new(54321);
    let mut edges = Vec::with_capacity((node_count * 10) as usize);
    for _ in 0..node_count * 10 {
        let from = rng.next(node_count);
        let to = rng.next(node_count);
        if from != to {
            edges.push((from as i64, to as i64, rng.weight()));
        }
    }
    edges
}

/// Two dense clusters joined by a ten-vertex chain. Every cross-cluster
/// path goes through the bridge.
fn gen_barbell(node_count: u64) -> Vec<(i64, i64, f64)> {
    let bridge_len = 10u64;
    let clique = node_count.saturating_sub(bridge_len) / 2;
    let mut rng = FastRng::new(99999);
    let mut edges = Vec::with_capacity((clique * 40 + bridge_len) as usize);

    let mut cluster = |offset: u64, edges: &mut Vec<(i64, i64, f64)>| {
        for i in 0..clique {
            for _ in 0..20u64.min(clique.saturating_sub(1)) {
                let target = rng.next(clique);
                if target != i {
                    edges.push(((offset + i) as i64, (offset + target) as i64, 1.0 + rng.next_f64()));
                }
            }
        }
    };

    cluster(0, &mut edges);
    let bridge_start = clique;
    let b_start = bridge_start + bridge_len;
    if clique > 0 {
        edges.push(((clique - 1) as i64, bridge_start as i64, 1.0));
    }
    for id in bridge_start + 1..b_start {
        edges.push(((id - 1) as i64, id as i64, 1.0));
    }
    edges.push(((b_start - 1) as i64, b_start as i64, 1.0));
    cluster(b_start, &mut edges);
    edges
}

/// Growth at a bounded surface of recent vertices, with a 10% chance of a
/// second long-range edge per vertex.
fn gen_dla(node_count: u64) -> Vec<(i64, i64, f64)> {
    let surface_max = 10_000usize;
    let mut rng = FastRng::new(77777);
    let mut edges = Vec::with_capacity((node_count + node_count / 10) as usize);
    let mut surface: VecDeque<u64> = VecDeque::with_capacity(surface_max + 1);
    surface.push_back(0);

    for v in 1..node_count {
        let attach = surface[rng.next(surface.len() as u64) as usize];
        edges.push((v as i64, attach as i64, rng.weight()));

        if v > 1 && rng.next(10) == 0 {
            let other = rng.next(v);
            if other != attach {
                edges.push((v as i64, other as i64, rng.weight()));
            }
        }

        surface.push_back(v);
        if surface.len() > surface_max {
            surface.pop_front();
        }
    }
    edges
}
