//! Manager configuration, loadable from JSON.
//!
//! ```json
//! {
//!   "default_weight": 0.5,
//!   "write": { "compression": { "algorithm": "zstd", "level": 3 } },
//!   "histograms": {
//!     "pt":      { "kind": "h1", "x": { "bins": 50, "min": 0.0, "max": 250.0 } },
//!     "eta_phi": { "kind": "h2", "x": [-2.5, 0.0, 2.5], "y": { "bins": 8, "min": -3.2, "max": 3.2 } },
//!     "resp":    { "kind": "profile", "x": { "bins": 10, "min": 0.0, "max": 100.0 }, "y_min": 0.0, "y_max": 2.0 }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use hm_root::{AxisSpec, Hist1D, Hist2D, HistObject, Profile, WriteOptions};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Initial state of a [`crate::HistManager`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Weight for fills and increments that omit one.
    pub default_weight: Option<f64>,
    /// How `save` writes containers.
    pub write: WriteOptions,
    /// Histograms to create up front, by name.
    pub histograms: BTreeMap<String, HistDecl>,
}

impl ManagerConfig {
    /// Read a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Declaration of one histogram in a [`ManagerConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum HistDecl {
    /// 1-D histogram.
    H1 {
        /// x binning.
        x: AxisSpec,
    },
    /// 2-D histogram.
    H2 {
        /// x binning.
        x: AxisSpec,
        /// y binning.
        y: AxisSpec,
    },
    /// Profile; `y_min == y_max` accepts every `y`.
    Profile {
        /// x binning.
        x: AxisSpec,
        /// Lower bound of accepted `y`.
        #[serde(default)]
        y_min: f64,
        /// Upper bound of accepted `y`.
        #[serde(default)]
        y_max: f64,
    },
}

impl HistDecl {
    /// Build an empty object named (and titled) `name`.
    pub fn build(&self, name: &str) -> Result<HistObject> {
        let obj = match self {
            HistDecl::H1 { x } => Hist1D::new(name, name, x.to_axis()?).into(),
            HistDecl::H2 { x, y } => Hist2D::new(name, name, x.to_axis()?, y.to_axis()?)?.into(),
            HistDecl::Profile { x, y_min, y_max } => {
                Profile::new(name, name, x.to_axis()?, *y_min, *y_max)?.into()
            }
        };
        Ok(obj)
    }
}
