//! Statistical objects held in a container: 1-D and 2-D histograms and profiles.
//!
//! All kinds follow ROOT's bin numbering (see [`crate::axis`]) and always track
//! the per-bin sum of squared weights, so bin errors are available from the
//! moment a histogram is created.

mod hist1d;
mod hist2d;
mod profile;

pub use hist1d::Hist1D;
pub use hist2d::Hist2D;
pub use profile::Profile;
pub(crate) use profile::ProfileSums;

use crate::error::{Result, RootError};

/// Stored class name of [`Hist1D`].
pub const CLASS_TH1D: &str = "TH1D";
/// Stored class name of [`Hist2D`].
pub const CLASS_TH2D: &str = "TH2D";
/// Stored class name of [`Profile`].
pub const CLASS_TPROFILE: &str = "TProfile";

/// Per-bin access shared by every histogram kind, addressed by global bin index.
///
/// For 1-D objects the global bin is the axis bin. For 2-D objects it is
/// `i + (nx + 2) * j`.
pub trait BinStore {
    /// Number of addressable cells, under/overflow included.
    fn n_cells(&self) -> usize;

    /// Content of `bin`.
    fn bin_content(&self, bin: usize) -> Result<f64>;

    /// Statistical uncertainty of `bin`.
    fn bin_error(&self, bin: usize) -> Result<f64>;

    /// Overwrite the content of `bin`.
    fn set_bin_content(&mut self, bin: usize, value: f64) -> Result<()>;

    /// Overwrite the uncertainty of `bin`.
    fn set_bin_error(&mut self, bin: usize, error: f64) -> Result<()>;

    /// Increment the content of `bin` by `weight`.
    fn add_bin_content(&mut self, bin: usize, weight: f64) -> Result<()>;
}

pub(crate) fn check_bin(bin: usize, n_cells: usize) -> Result<()> {
    if bin >= n_cells {
        return Err(RootError::BinOutOfRange { bin, n_cells });
    }
    Ok(())
}

/// A named statistical object of one of the supported kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum HistObject {
    /// 1-D histogram.
    H1(Hist1D),
    /// 2-D histogram.
    H2(Hist2D),
    /// Profile histogram.
    Profile(Profile),
}

impl HistObject {
    /// Object name.
    pub fn name(&self) -> &str {
        match self {
            HistObject::H1(h) => h.name(),
            HistObject::H2(h) => h.name(),
            HistObject::Profile(p) => p.name(),
        }
    }

    /// Object title.
    pub fn title(&self) -> &str {
        match self {
            HistObject::H1(h) => h.title(),
            HistObject::H2(h) => h.title(),
            HistObject::Profile(p) => p.title(),
        }
    }

    /// Class name used when the object is stored.
    pub fn class_name(&self) -> &'static str {
        match self {
            HistObject::H1(_) => CLASS_TH1D,
            HistObject::H2(_) => CLASS_TH2D,
            HistObject::Profile(_) => CLASS_TPROFILE,
        }
    }

    /// Number of fill calls (and direct content overwrites) recorded.
    pub fn entries(&self) -> f64 {
        match self {
            HistObject::H1(h) => h.entries(),
            HistObject::H2(h) => h.entries(),
            HistObject::Profile(p) => p.entries(),
        }
    }

    /// The 1-D histogram, if this is one.
    pub fn as_1d(&self) -> Option<&Hist1D> {
        match self {
            HistObject::H1(h) => Some(h),
            _ => None,
        }
    }

    /// The 2-D histogram, if this is one.
    pub fn as_2d(&self) -> Option<&Hist2D> {
        match self {
            HistObject::H2(h) => Some(h),
            _ => None,
        }
    }

    /// The profile, if this is one.
    pub fn as_profile(&self) -> Option<&Profile> {
        match self {
            HistObject::Profile(p) => Some(p),
            _ => None,
        }
    }

    /// Fill a 1-D histogram at `x` with weight `w`.
    pub fn fill_1d(&mut self, x: f64, w: f64) -> Result<()> {
        match self {
            HistObject::H1(h) => {
                h.fill(x, w);
                Ok(())
            }
            other => Err(other.mismatch("1-D fill")),
        }
    }

    /// Fill a 2-D histogram at `(x, y)` with weight `w`.
    pub fn fill_2d(&mut self, x: f64, y: f64, w: f64) -> Result<()> {
        match self {
            HistObject::H2(h) => {
                h.fill(x, y, w);
                Ok(())
            }
            other => Err(other.mismatch("2-D fill")),
        }
    }

    /// Fill a profile with dependent value `y` at `x` and weight `w`.
    pub fn fill_profile(&mut self, x: f64, y: f64, w: f64) -> Result<()> {
        match self {
            HistObject::Profile(p) => {
                p.fill(x, y, w);
                Ok(())
            }
            other => Err(other.mismatch("profile fill")),
        }
    }

    /// Content of 2-D cell `(i, j)`.
    pub fn bin_content_2d(&self, i: usize, j: usize) -> Result<f64> {
        match self {
            HistObject::H2(h) => h.bin_content_2d(i, j),
            other => Err(other.mismatch("2-D bin access")),
        }
    }

    /// Uncertainty of 2-D cell `(i, j)`.
    pub fn bin_error_2d(&self, i: usize, j: usize) -> Result<f64> {
        match self {
            HistObject::H2(h) => h.bin_error_2d(i, j),
            other => Err(other.mismatch("2-D bin access")),
        }
    }

    /// Overwrite the content of 2-D cell `(i, j)`.
    pub fn set_bin_content_2d(&mut self, i: usize, j: usize, value: f64) -> Result<()> {
        match self {
            HistObject::H2(h) => h.set_bin_content_2d(i, j, value),
            other => Err(other.mismatch("2-D set content")),
        }
    }

    /// Overwrite the uncertainty of 2-D cell `(i, j)`.
    pub fn set_bin_error_2d(&mut self, i: usize, j: usize, error: f64) -> Result<()> {
        match self {
            HistObject::H2(h) => h.set_bin_error_2d(i, j, error),
            other => Err(other.mismatch("2-D set error")),
        }
    }

    fn mismatch(&self, op: &str) -> RootError {
        RootError::TypeMismatch(format!(
            "{op} is not supported by '{}' ({})",
            self.name(),
            self.class_name()
        ))
    }

    fn store(&self) -> &dyn BinStore {
        match self {
            HistObject::H1(h) => h,
            HistObject::H2(h) => h,
            HistObject::Profile(p) => p,
        }
    }

    fn store_mut(&mut self) -> &mut dyn BinStore {
        match self {
            HistObject::H1(h) => h,
            HistObject::H2(h) => h,
            HistObject::Profile(p) => p,
        }
    }
}

impl BinStore for HistObject {
    fn n_cells(&self) -> usize {
        self.store().n_cells()
    }

    fn bin_content(&self, bin: usize) -> Result<f64> {
        self.store().bin_content(bin)
    }

    fn bin_error(&self, bin: usize) -> Result<f64> {
        self.store().bin_error(bin)
    }

    fn set_bin_content(&mut self, bin: usize, value: f64) -> Result<()> {
        self.store_mut().set_bin_content(bin, value)
    }

    fn set_bin_error(&mut self, bin: usize, error: f64) -> Result<()> {
        self.store_mut().set_bin_error(bin, error)
    }

    fn add_bin_content(&mut self, bin: usize, weight: f64) -> Result<()> {
        self.store_mut().add_bin_content(bin, weight)
    }
}

impl From<Hist1D> for HistObject {
    fn from(h: Hist1D) -> Self {
        HistObject::H1(h)
    }
}

impl From<Hist2D> for HistObject {
    fn from(h: Hist2D) -> Self {
        HistObject::H2(h)
    }
}

impl From<Profile> for HistObject {
    fn from(p: Profile) -> Self {
        HistObject::Profile(p)
    }
}
