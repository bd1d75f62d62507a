use crate::axis::Axis;
use crate::error::{Result, RootError};

use super::{BinStore, check_bin};

/// A 1-D histogram with per-bin sum of squared weights.
#[derive(Debug, Clone, PartialEq)]
pub struct Hist1D {
    name: String,
    title: String,
    axis: Axis,
    /// `n_bins + 2` cells: `[underflow, bin1, ..., binN, overflow]`.
    content: Vec<f64>,
    sumw2: Vec<f64>,
    entries: f64,
}

impl Hist1D {
    /// Create an empty histogram over `axis`.
    pub fn new(name: impl Into<String>, title: impl Into<String>, axis: Axis) -> Self {
        let n_cells = axis.n_cells();
        Self {
            name: name.into(),
            title: title.into(),
            axis,
            content: vec![0.0; n_cells],
            sumw2: vec![0.0; n_cells],
            entries: 0.0,
        }
    }

    /// Rebuild from stored arrays; both must cover every cell.
    pub(crate) fn from_parts(
        name: String,
        title: String,
        axis: Axis,
        content: Vec<f64>,
        sumw2: Vec<f64>,
        entries: f64,
    ) -> Result<Self> {
        let n_cells = axis.n_cells();
        if content.len() != n_cells || sumw2.len() != n_cells {
            return Err(RootError::Deserialization(format!(
                "TH1D '{}': {} contents / {} sumw2 for {} cells",
                name,
                content.len(),
                sumw2.len(),
                n_cells
            )));
        }
        Ok(Self { name, title, axis, content, sumw2, entries })
    }

    /// Histogram name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Histogram title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The x axis.
    pub fn axis(&self) -> &Axis {
        &self.axis
    }

    /// Number of in-range bins.
    pub fn n_bins(&self) -> usize {
        self.axis.n_bins()
    }

    /// All cell contents, under/overflow included.
    pub fn contents(&self) -> &[f64] {
        &self.content
    }

    /// All cell sums of squared weights, under/overflow included.
    pub fn sumw2(&self) -> &[f64] {
        &self.sumw2
    }

    /// Entry count.
    pub fn entries(&self) -> f64 {
        self.entries
    }

    /// Add `w` to the bin containing `x`.
    pub fn fill(&mut self, x: f64, w: f64) {
        let bin = self.axis.find_bin(x);
        self.content[bin] += w;
        self.sumw2[bin] += w * w;
        self.entries += 1.0;
    }

    /// Sum of in-range bin contents.
    pub fn integral(&self) -> f64 {
        self.content[1..=self.n_bins()].iter().sum()
    }
}

impl BinStore for Hist1D {
    fn n_cells(&self) -> usize {
        self.content.len()
    }

    fn bin_content(&self, bin: usize) -> Result<f64> {
        check_bin(bin, self.n_cells())?;
        Ok(self.content[bin])
    }

    fn bin_error(&self, bin: usize) -> Result<f64> {
        check_bin(bin, self.n_cells())?;
        Ok(self.sumw2[bin].sqrt())
    }

    fn set_bin_content(&mut self, bin: usize, value: f64) -> Result<()> {
        check_bin(bin, self.n_cells())?;
        self.content[bin] = value;
        self.entries += 1.0;
        Ok(())
    }

    fn set_bin_error(&mut self, bin: usize, error: f64) -> Result<()> {
        check_bin(bin, self.n_cells())?;
        self.sumw2[bin] = error * error;
        Ok(())
    }

    fn add_bin_content(&mut self, bin: usize, weight: f64) -> Result<()> {
        check_bin(bin, self.n_cells())?;
        self.content[bin] += weight;
        self.sumw2[bin] += weight * weight;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn hist() -> Hist1D {
        Hist1D::new("h", "a title", Axis::uniform(10, 0.0, 10.0).unwrap())
    }

    #[test]
    fn unweighted_fills_accumulate() {
        let mut h = hist();
        for _ in 0..3 {
            h.fill(5.5, 1.0);
        }
        assert_eq!(h.bin_content(6).unwrap(), 3.0);
        assert_relative_eq!(h.bin_error(6).unwrap(), 3.0f64.sqrt());
        assert_eq!(h.entries(), 3.0);
        assert_eq!(h.integral(), 3.0);
    }

    #[test]
    fn weighted_fills_track_sumw2() {
        let mut h = hist();
        h.fill(1.2, 2.0);
        h.fill(1.7, 0.5);
        assert_relative_eq!(h.bin_content(2).unwrap(), 2.5);
        assert_relative_eq!(h.sumw2()[2], 4.25);
        assert_relative_eq!(h.bin_error(2).unwrap(), 4.25f64.sqrt());
    }

    #[test]
    fn flows_are_kept_out_of_integral() {
        let mut h = hist();
        h.fill(-3.0, 1.0);
        h.fill(42.0, 1.0);
        h.fill(f64::NAN, 1.0);
        h.fill(0.5, 1.0);
        assert_eq!(h.bin_content(0).unwrap(), 1.0);
        assert_eq!(h.bin_content(11).unwrap(), 2.0);
        assert_eq!(h.integral(), 1.0);
    }

    #[test]
    fn direct_bin_access() {
        let mut h = hist();
        h.fill(3.5, 1.0);
        h.set_bin_content(4, 10.0).unwrap();
        assert_eq!(h.bin_content(4).unwrap(), 10.0);
        // Content overwrite leaves the error untouched.
        assert_eq!(h.bin_error(4).unwrap(), 1.0);

        h.set_bin_error(4, 0.25).unwrap();
        assert_eq!(h.bin_error(4).unwrap(), 0.25);
        assert_eq!(h.bin_content(4).unwrap(), 10.0);

        h.add_bin_content(4, 2.0).unwrap();
        assert_eq!(h.bin_content(4).unwrap(), 12.0);
        assert_relative_eq!(h.sumw2()[4], 0.0625 + 4.0);
    }

    #[test]
    fn out_of_range_bins_error() {
        let mut h = hist();
        assert!(h.bin_content(11).is_ok());
        assert!(matches!(
            h.set_bin_content(12, 1.0),
            Err(RootError::BinOutOfRange { bin: 12, n_cells: 12 })
        ));
        assert!(h.add_bin_content(100, 1.0).is_err());
        assert!(h.set_bin_error(12, 1.0).is_err());
    }

    #[test]
    fn from_parts_validates_lengths() {
        let axis = Axis::uniform(2, 0.0, 1.0).unwrap();
        let ok = Hist1D::from_parts("h".into(), "".into(), axis.clone(), vec![0.0; 4], vec![0.0; 4], 0.0);
        assert!(ok.is_ok());
        let bad = Hist1D::from_parts("h".into(), "".into(), axis, vec![0.0; 3], vec![0.0; 4], 0.0);
        assert!(matches!(bad, Err(RootError::Deserialization(_))));
    }
}
