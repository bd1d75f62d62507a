//! # histmgr
//!
//! Bookkeeping for named histograms: create 1-D, 2-D and profile histograms
//! by name, fill them with an optional default weight, and save or load the
//! whole collection as a keyed container.
//!
//! ## Example
//!
//! ```no_run
//! use histmgr::HistManager;
//!
//! let mut m = HistManager::new();
//! m.create_1d("pt", 50, 0.0, 250.0).unwrap();
//! m.set_default_weight(0.8);
//! m.fill_1d("pt", 42.0, None).unwrap();
//! m.fill_1d("pt", 17.0, Some(1.2)).unwrap();
//! m.save("out/hists.hmrt").unwrap();
//!
//! let back = HistManager::open("out/hists.hmrt").unwrap();
//! assert!(back.contains("pt"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod manager;
pub mod weight;

pub use config::{HistDecl, ManagerConfig};
pub use error::{Error, Result};
pub use manager::HistManager;
pub use weight::resolve_weight;

pub use hm_root::{AxisSpec, BinStore, Hist1D, Hist2D, HistObject, Profile, RootError};
