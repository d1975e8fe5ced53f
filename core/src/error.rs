use crate::graph::VertexId;
use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while opening a graph view or running a query.
///
/// `Configuration` aborts before any traversal starts. The graph variants
/// are fatal for the query that raised them. `Store` carries lookup failures
/// from the edge table unchanged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("graph error: vertex {0} is not in the graph")]
    VertexNotFound(VertexId),

    #[error(
        "graph error: unsupported orientation code {0}; use 1 (directed), \
         2 (directed, edges reversed) or 3 (undirected)"
    )]
    UnsupportedOrientation(i64),

    #[error("graph error: the vertex table must contain a column named '{0}'")]
    MissingSourceColumn(String),

    #[error("graph error: edge at row {row} has weight {weight}; weights must be non-negative")]
    InvalidWeight { row: u64, weight: f64 },

    #[error("edge store: {0}")]
    Store(#[from] StoreError),
}

impl Error {
    pub(crate) fn missing_field(field: &str) -> Self {
        Error::Configuration(format!("the table must contain a field named '{}'", field))
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    /// True for the graph-shape errors: unknown vertex, bad orientation code,
    /// malformed vertex table, or an invalid edge weight.
    pub fn is_graph(&self) -> bool {
        matches!(
            self,
            Error::VertexNotFound(_)
                | Error::UnsupportedOrientation(_)
                | Error::MissingSourceColumn(_)
                | Error::InvalidWeight { .. }
        )
    }
}
