//! # hm-root
//!
//! Histograms with ROOT bin conventions, and a ROOT-style keyed container to
//! store them in.
//!
//! Objects are `TH1D`, `TH2D` and `TProfile` look-alikes. The container holds
//! big-endian TKey records in nested directories, with optional zlib, LZ4,
//! ZSTD or XZ compression of each payload.
//!
//! ## Example
//!
//! ```no_run
//! use hm_root::{Axis, Hist1D, HistObject, RootFile, RootWriter, WriteOptions};
//!
//! let mut h = Hist1D::new("pt", "p_{T}", Axis::uniform(50, 0.0, 250.0).unwrap());
//! h.fill(42.0, 1.0);
//!
//! let mut w = RootWriter::new(WriteOptions::default());
//! w.mkdir("jets").put(&HistObject::from(h)).unwrap();
//! w.write("out/hists.hmrt").unwrap();
//!
//! let f = RootFile::open("out/hists.hmrt").unwrap();
//! let pt = f.get_object("jets/pt").unwrap();
//! println!("{} entries", pt.entries());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod axis;
pub mod compress;
pub mod directory;
pub mod error;
pub mod file;
pub mod histogram;
pub mod key;
pub mod objects;
pub mod rbuffer;
pub mod wbuffer;
pub mod writer;

pub use axis::{Axis, AxisSpec};
pub use compress::{Algorithm, Compression};
pub use directory::Directory;
pub use error::{Result, RootError};
pub use file::RootFile;
pub use histogram::{
    BinStore, CLASS_TH1D, CLASS_TH2D, CLASS_TPROFILE, Hist1D, Hist2D, HistObject, Profile,
};
pub use key::{Key, KeyInfo};
pub use writer::{DirBuilder, RootWriter, WriteOptions};
