//! Histogram axis: uniform or variable-width binning with ROOT bin numbering.
//!
//! Bin `0` is the underflow, bins `1..=n_bins` are in range and bin
//! `n_bins + 1` is the overflow.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RootError};

/// Largest in-range bin count: cells (bins plus both flows) must fit `fNbins`.
pub const MAX_BINS: usize = i32::MAX as usize - 2;

/// Binning of one histogram axis.
#[derive(Debug, Clone, PartialEq)]
pub enum Axis {
    /// `n_bins` equal-width bins spanning `[min, max)`.
    Uniform {
        /// Number of in-range bins.
        n_bins: usize,
        /// Lower edge of the first bin.
        min: f64,
        /// Upper edge of the last bin.
        max: f64,
    },
    /// Explicit, strictly increasing bin edges (`n_bins + 1` values).
    Variable {
        /// Bin edges.
        edges: Vec<f64>,
    },
}

/// Requested binning of one axis, validated into an [`Axis`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisSpec {
    /// `(bins, min, max)` uniform binning.
    Uniform {
        /// Number of bins.
        bins: usize,
        /// Range lower edge.
        min: f64,
        /// Range upper edge.
        max: f64,
    },
    /// Explicit bin edges.
    Variable(Vec<f64>),
}

impl AxisSpec {
    /// Validate into an [`Axis`].
    pub fn to_axis(&self) -> Result<Axis> {
        match self {
            AxisSpec::Uniform { bins, min, max } => Axis::uniform(*bins, *min, *max),
            AxisSpec::Variable(edges) => Axis::variable(edges.clone()),
        }
    }
}

impl From<(usize, f64, f64)> for AxisSpec {
    fn from((bins, min, max): (usize, f64, f64)) -> Self {
        AxisSpec::Uniform { bins, min, max }
    }
}

impl From<Vec<f64>> for AxisSpec {
    fn from(edges: Vec<f64>) -> Self {
        AxisSpec::Variable(edges)
    }
}

impl From<&[f64]> for AxisSpec {
    fn from(edges: &[f64]) -> Self {
        AxisSpec::Variable(edges.to_vec())
    }
}

impl Axis {
    /// Uniform binning; requires `1 <= n_bins <= MAX_BINS` and finite `min < max`.
    pub fn uniform(n_bins: usize, min: f64, max: f64) -> Result<Self> {
        if n_bins == 0 {
            return Err(RootError::InvalidBinning("bin count must be at least 1".into()));
        }
        check_bin_count(n_bins)?;
        if !min.is_finite() || !max.is_finite() {
            return Err(RootError::InvalidBinning(format!(
                "axis range must be finite, got [{min}, {max}]"
            )));
        }
        if min >= max {
            return Err(RootError::InvalidBinning(format!(
                "axis range is empty: min {min} >= max {max}"
            )));
        }
        Ok(Axis::Uniform { n_bins, min, max })
    }

    /// Variable binning; requires at least two finite, strictly increasing edges.
    pub fn variable(edges: Vec<f64>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(RootError::InvalidBinning(format!(
                "need at least 2 bin edges, got {}",
                edges.len()
            )));
        }
        check_bin_count(edges.len() - 1)?;
        if let Some(bad) = edges.iter().find(|e| !e.is_finite()) {
            return Err(RootError::InvalidBinning(format!("bin edge {bad} is not finite")));
        }
        if let Some(i) = edges.windows(2).position(|w| w[0] >= w[1]) {
            return Err(RootError::InvalidBinning(format!(
                "bin edges not strictly increasing at index {}: {} >= {}",
                i + 1,
                edges[i],
                edges[i + 1]
            )));
        }
        Ok(Axis::Variable { edges })
    }

    /// Number of in-range bins.
    pub fn n_bins(&self) -> usize {
        match self {
            Axis::Uniform { n_bins, .. } => *n_bins,
            Axis::Variable { edges } => edges.len() - 1,
        }
    }

    /// Number of cells including underflow and overflow.
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.n_bins() + 2
    }

    /// Lower edge of the axis range.
    pub fn min(&self) -> f64 {
        match self {
            Axis::Uniform { min, .. } => *min,
            Axis::Variable { edges } => edges[0],
        }
    }

    /// Upper edge of the axis range.
    pub fn max(&self) -> f64 {
        match self {
            Axis::Uniform { max, .. } => *max,
            Axis::Variable { edges } => edges[edges.len() - 1],
        }
    }

    /// Whether the axis uses explicit edges.
    pub fn is_variable(&self) -> bool {
        matches!(self, Axis::Variable { .. })
    }

    /// Bin containing `x`.
    ///
    /// Values below the range go to the underflow (0); values at or above the
    /// upper edge, and NaN, go to the overflow (`n_bins + 1`).
    pub fn find_bin(&self, x: f64) -> usize {
        let n = self.n_bins();
        if x < self.min() {
            return 0;
        }
        if !(x < self.max()) {
            return n + 1;
        }
        match self {
            Axis::Uniform { min, max, .. } => {
                let bin = 1 + (n as f64 * (x - min) / (max - min)) as usize;
                // Rounding can push values just below `max` onto `n + 1`.
                bin.min(n)
            }
            Axis::Variable { edges } => edges.partition_point(|&e| e <= x),
        }
    }

    /// Lower edge of bin `bin` (1-based). The underflow's low edge is `-inf`.
    pub fn bin_low_edge(&self, bin: usize) -> f64 {
        if bin == 0 {
            return f64::NEG_INFINITY;
        }
        if bin > self.n_bins() {
            return self.max();
        }
        match self {
            Axis::Uniform { n_bins, min, max } => {
                min + (bin - 1) as f64 * (max - min) / *n_bins as f64
            }
            Axis::Variable { edges } => edges[bin - 1],
        }
    }

    /// Upper edge of bin `bin` (1-based). The overflow's upper edge is `+inf`.
    pub fn bin_up_edge(&self, bin: usize) -> f64 {
        if bin > self.n_bins() {
            return f64::INFINITY;
        }
        if bin == 0 {
            return self.min();
        }
        match self {
            Axis::Uniform { n_bins, min, max } => min + bin as f64 * (max - min) / *n_bins as f64,
            Axis::Variable { edges } => edges[bin],
        }
    }

    /// Center of in-range bin `bin`.
    pub fn bin_center(&self, bin: usize) -> f64 {
        0.5 * (self.bin_low_edge(bin) + self.bin_up_edge(bin))
    }

    /// Width of in-range bin `bin`.
    pub fn bin_width(&self, bin: usize) -> f64 {
        self.bin_up_edge(bin) - self.bin_low_edge(bin)
    }

    /// All `n_bins + 1` edges.
    pub fn edges(&self) -> Vec<f64> {
        match self {
            Axis::Uniform { n_bins, min, max } => {
                let width = (max - min) / *n_bins as f64;
                (0..=*n_bins).map(|i| min + i as f64 * width).collect()
            }
            Axis::Variable { edges } => edges.clone(),
        }
    }
}

fn check_bin_count(n_bins: usize) -> Result<()> {
    if n_bins > MAX_BINS {
        return Err(RootError::InvalidBinning(format!(
            "{n_bins} bins exceed the limit of {MAX_BINS}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn uniform_find_bin() {
        let ax = Axis::uniform(10, 0.0, 10.0).unwrap();
        assert_eq!(ax.find_bin(-0.1), 0);
        assert_eq!(ax.find_bin(0.0), 1);
        assert_eq!(ax.find_bin(5.5), 6);
        assert_eq!(ax.find_bin(9.999_999), 10);
        assert_eq!(ax.find_bin(10.0), 11);
        assert_eq!(ax.find_bin(f64::NAN), 11);
        assert_eq!(ax.find_bin(f64::NEG_INFINITY), 0);
    }

    #[test]
    fn variable_find_bin() {
        let ax = Axis::variable(vec![0.0, 1.0, 5.0, 20.0]).unwrap();
        assert_eq!(ax.n_bins(), 3);
        assert_eq!(ax.find_bin(-1.0), 0);
        assert_eq!(ax.find_bin(0.0), 1);
        assert_eq!(ax.find_bin(1.0), 2);
        assert_eq!(ax.find_bin(4.99), 2);
        assert_eq!(ax.find_bin(19.0), 3);
        assert_eq!(ax.find_bin(20.0), 4);
    }

    #[test]
    fn edges_and_centers() {
        let ax = Axis::uniform(4, -2.0, 2.0).unwrap();
        assert_eq!(ax.edges(), vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
        assert_relative_eq!(ax.bin_center(1), -1.5);
        assert_relative_eq!(ax.bin_width(3), 1.0);
        assert_eq!(ax.bin_low_edge(0), f64::NEG_INFINITY);
        assert_eq!(ax.bin_up_edge(5), f64::INFINITY);

        let var = Axis::variable(vec![0.0, 1.0, 5.0]).unwrap();
        assert_relative_eq!(var.bin_center(2), 3.0);
        assert_relative_eq!(var.bin_width(2), 4.0);
    }

    #[test]
    fn invalid_binning_is_rejected() {
        assert!(matches!(Axis::uniform(0, 0.0, 1.0), Err(RootError::InvalidBinning(_))));
        assert!(matches!(Axis::uniform(5, 1.0, 1.0), Err(RootError::InvalidBinning(_))));
        assert!(matches!(Axis::uniform(5, 2.0, 1.0), Err(RootError::InvalidBinning(_))));
        assert!(matches!(Axis::uniform(5, 0.0, f64::INFINITY), Err(RootError::InvalidBinning(_))));
        assert!(matches!(Axis::variable(vec![1.0]), Err(RootError::InvalidBinning(_))));
        assert!(matches!(Axis::variable(vec![0.0, 2.0, 2.0]), Err(RootError::InvalidBinning(_))));
        assert!(matches!(Axis::variable(vec![0.0, 3.0, 1.0]), Err(RootError::InvalidBinning(_))));
        assert!(matches!(Axis::variable(vec![0.0, f64::NAN]), Err(RootError::InvalidBinning(_))));
    }

    #[test]
    fn huge_bin_counts_are_rejected() {
        assert!(matches!(Axis::uniform(usize::MAX, 0.0, 1.0), Err(RootError::InvalidBinning(_))));
        assert!(matches!(
            Axis::uniform(MAX_BINS + 1, 0.0, 1.0),
            Err(RootError::InvalidBinning(_))
        ));
        assert_eq!(Axis::uniform(MAX_BINS, 0.0, 1.0).unwrap().n_cells(), i32::MAX as usize);
    }

    #[test]
    fn uniform_and_variable_agree_at_bin_centers() {
        let uni = Axis::uniform(10, 0.0, 10.0).unwrap();
        let var = Axis::variable((0..=10).map(f64::from).collect()).unwrap();
        for bin in 1..=10 {
            let x = uni.bin_center(bin);
            assert_eq!(uni.find_bin(x), bin);
            assert_eq!(var.find_bin(x), bin);
        }
    }

    #[test]
    fn axis_spec_conversions() {
        let u: AxisSpec = (5, 0.0, 5.0).into();
        assert_eq!(u.to_axis().unwrap(), Axis::uniform(5, 0.0, 5.0).unwrap());
        let v: AxisSpec = vec![0.0, 0.5, 3.0].into();
        assert_eq!(v.to_axis().unwrap().n_bins(), 2);
    }

    proptest! {
        #[test]
        fn find_bin_lands_inside_bin_edges(x in -5.0f64..15.0, n in 1usize..50) {
            let ax = Axis::uniform(n, 0.0, 10.0).unwrap();
            let bin = ax.find_bin(x);
            prop_assert!(bin <= n + 1);
            if (1..=n).contains(&bin) {
                prop_assert!(ax.bin_low_edge(bin) <= x + 1e-9);
                prop_assert!(x < ax.bin_up_edge(bin) + 1e-9);
            }
        }
    }
}
