use crate::axis::Axis;
use crate::error::{Result, RootError};

use super::{BinStore, check_bin};

/// Per-bin running sums of a profile.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProfileSums {
    /// Σ w·y per cell.
    pub sum_wy: Vec<f64>,
    /// Σ w·y² per cell.
    pub sum_wy2: Vec<f64>,
    /// Σ w per cell (bin entries).
    pub sum_w: Vec<f64>,
    /// Σ w² per cell.
    pub sum_w2: Vec<f64>,
}

impl ProfileSums {
    fn zeros(n_cells: usize) -> Self {
        Self {
            sum_wy: vec![0.0; n_cells],
            sum_wy2: vec![0.0; n_cells],
            sum_w: vec![0.0; n_cells],
            sum_w2: vec![0.0; n_cells],
        }
    }
}

/// Mean and spread of a dependent variable `y` per bin of `x`.
///
/// When `y_min < y_max`, fills with `y` outside `[y_min, y_max]` are dropped.
/// `y_min == y_max` accepts every `y`.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    name: String,
    title: String,
    axis: Axis,
    y_min: f64,
    y_max: f64,
    sums: ProfileSums,
    entries: f64,
}

impl Profile {
    /// Create an empty profile over `axis` with the given `y` acceptance range.
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        axis: Axis,
        y_min: f64,
        y_max: f64,
    ) -> Result<Self> {
        check_y_range(y_min, y_max)?;
        let sums = ProfileSums::zeros(axis.n_cells());
        Ok(Self { name: name.into(), title: title.into(), axis, y_min, y_max, sums, entries: 0.0 })
    }

    pub(crate) fn from_parts(
        name: String,
        title: String,
        axis: Axis,
        (y_min, y_max): (f64, f64),
        sums: ProfileSums,
        entries: f64,
    ) -> Result<Self> {
        check_y_range(y_min, y_max)?;
        let n_cells = axis.n_cells();
        let lens = [sums.sum_wy.len(), sums.sum_wy2.len(), sums.sum_w.len(), sums.sum_w2.len()];
        if lens.iter().any(|&l| l != n_cells) {
            return Err(RootError::Deserialization(format!(
                "TProfile '{name}': array lengths {lens:?} for {n_cells} cells"
            )));
        }
        Ok(Self { name, title, axis, y_min, y_max, sums, entries })
    }

    /// Profile name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Profile title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The x axis.
    pub fn axis(&self) -> &Axis {
        &self.axis
    }

    /// Accepted `y` range.
    pub fn y_range(&self) -> (f64, f64) {
        (self.y_min, self.y_max)
    }

    /// Entry count.
    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub(crate) fn sums(&self) -> &ProfileSums {
        &self.sums
    }

    /// Sum of weights in `bin` (the bin's effective entry count).
    pub fn bin_entries(&self, bin: usize) -> Result<f64> {
        check_bin(bin, self.n_cells())?;
        Ok(self.sums.sum_w[bin])
    }

    /// Record `y` with weight `w` in the bin containing `x`.
    ///
    /// Returns `false` when `y` falls outside the accepted range.
    pub fn fill(&mut self, x: f64, y: f64, w: f64) -> bool {
        if self.y_min < self.y_max && !(self.y_min..=self.y_max).contains(&y) {
            return false;
        }
        let bin = self.axis.find_bin(x);
        let s = &mut self.sums;
        s.sum_wy[bin] += w * y;
        s.sum_wy2[bin] += w * y * y;
        s.sum_w[bin] += w;
        s.sum_w2[bin] += w * w;
        self.entries += 1.0;
        true
    }
}

fn check_y_range(y_min: f64, y_max: f64) -> Result<()> {
    if !y_min.is_finite() || !y_max.is_finite() || y_min > y_max {
        return Err(RootError::InvalidBinning(format!(
            "profile y range [{y_min}, {y_max}] is invalid"
        )));
    }
    Ok(())
}

impl BinStore for Profile {
    fn n_cells(&self) -> usize {
        self.sums.sum_w.len()
    }

    /// Weighted mean of `y` in `bin`; 0 for an empty bin.
    fn bin_content(&self, bin: usize) -> Result<f64> {
        check_bin(bin, self.n_cells())?;
        let w = self.sums.sum_w[bin];
        Ok(if w == 0.0 { 0.0 } else { self.sums.sum_wy[bin] / w })
    }

    /// Standard error of the mean: spread / sqrt(effective entries).
    fn bin_error(&self, bin: usize) -> Result<f64> {
        check_bin(bin, self.n_cells())?;
        let s = &self.sums;
        let (w, w2) = (s.sum_w[bin], s.sum_w2[bin]);
        if w == 0.0 || w2 == 0.0 {
            return Ok(0.0);
        }
        let mean = s.sum_wy[bin] / w;
        let spread = (s.sum_wy2[bin] / w - mean * mean).abs().sqrt();
        let n_eff = w * w / w2;
        Ok(spread / n_eff.sqrt())
    }

    /// Overwrites Σ w·y of `bin`, as ROOT does for profiles.
    ///
    /// The mean read back is `value / Σ w`, so a bin with no fills still
    /// reads 0 after this call.
    fn set_bin_content(&mut self, bin: usize, value: f64) -> Result<()> {
        check_bin(bin, self.n_cells())?;
        self.sums.sum_wy[bin] = value;
        self.entries += 1.0;
        Ok(())
    }

    /// Always a `TypeMismatch`: profile errors are derived from the fill sums.
    fn set_bin_error(&mut self, _bin: usize, _error: f64) -> Result<()> {
        Err(RootError::TypeMismatch(format!(
            "profile '{}' derives bin errors from its fills; they cannot be set",
            self.name
        )))
    }

    fn add_bin_content(&mut self, bin: usize, weight: f64) -> Result<()> {
        check_bin(bin, self.n_cells())?;
        self.sums.sum_wy[bin] += weight;
        Ok(())
    }
}
