use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::{GraphView, Orientation};
use crate::store::EdgeTable;

/// Names of the edge table fields a graph view binds to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    pub start_node: String,
    pub end_node: String,
    /// Geometry column. Unset = first geometry-typed column, if any.
    pub geometry: Option<String>,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            start_node: "start_node".to_string(),
            end_node: "end_node".to_string(),
            geometry: None,
        }
    }
}

/// Per-query settings shared by every query operation.
///
/// ```json
/// { "weight_field": "length", "orientation": "undirected", "radius": 500.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub fields: FieldNames,
    pub weight_field: Option<String>,
    #[serde(default)]
    pub orientation: Orientation,
    /// Maximum cumulative distance. Unset = unbounded.
    #[serde(default)]
    pub radius: Option<f64>,
}

impl QueryConfig {
    pub fn new(weight_field: impl Into<String>) -> Self {
        Self {
            fields: FieldNames::default(),
            weight_field: Some(weight_field.into()),
            orientation: Orientation::Directed,
            radius: None,
        }
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Configuration(format!("invalid query config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        checked_radius(self.radius).map(|_| ())
    }

    /// Validate, then open a view of `table` with these settings.
    pub fn open<'t, T: EdgeTable + ?Sized>(&self, table: &'t T) -> Result<GraphView<'t, T>> {
        self.validate()?;
        GraphView::open(
            table,
            &self.fields,
            self.weight_field.as_deref(),
            self.orientation,
        )
    }
}

/// Radius as a traversal bound: `None` is unbounded, NaN and negative
/// values are configuration errors.
pub(crate) fn checked_radius(radius: Option<f64>) -> Result<f64> {
    match radius {
        None => Ok(f64::INFINITY),
        Some(r) if r.is_nan() || r < 0.0 => Err(Error::Configuration(format!(
            "radius must be a non-negative number, got {}",
            r
        ))),
        Some(r) => Ok(r),
    }
}
