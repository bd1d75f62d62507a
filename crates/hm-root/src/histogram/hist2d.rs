use crate::axis::Axis;
use crate::error::{Result, RootError};

use super::{BinStore, check_bin};

/// A 2-D histogram with per-cell sum of squared weights.
///
/// Cells are stored x-fastest: global bin `i + (nx + 2) * j`.
#[derive(Debug, Clone, PartialEq)]
pub struct Hist2D {
    name: String,
    title: String,
    x_axis: Axis,
    y_axis: Axis,
    content: Vec<f64>,
    sumw2: Vec<f64>,
    entries: f64,
}

impl Hist2D {
    /// Create an empty histogram over the two axes.
    ///
    /// Fails with `InvalidBinning` when the cell grid does not fit `fNcells`.
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        x_axis: Axis,
        y_axis: Axis,
    ) -> Result<Self> {
        let n_cells = x_axis
            .n_cells()
            .checked_mul(y_axis.n_cells())
            .filter(|&n| n <= i32::MAX as usize)
            .ok_or_else(|| {
                RootError::InvalidBinning(format!(
                    "{} x {} cells exceed the 2-D cell limit",
                    x_axis.n_cells(),
                    y_axis.n_cells()
                ))
            })?;
        Ok(Self {
            name: name.into(),
            title: title.into(),
            x_axis,
            y_axis,
            content: vec![0.0; n_cells],
            sumw2: vec![0.0; n_cells],
            entries: 0.0,
        })
    }

    pub(crate) fn from_parts(
        name: String,
        title: String,
        x_axis: Axis,
        y_axis: Axis,
        content: Vec<f64>,
        sumw2: Vec<f64>,
        entries: f64,
    ) -> Result<Self> {
        let n_cells = x_axis.n_cells().checked_mul(y_axis.n_cells());
        if n_cells != Some(content.len()) || n_cells != Some(sumw2.len()) {
            return Err(RootError::Deserialization(format!(
                "TH2D '{}': {} contents / {} sumw2 for {} cells",
                name,
                content.len(),
                sumw2.len(),
                x_axis.n_cells().saturating_mul(y_axis.n_cells())
            )));
        }
        Ok(Self { name, title, x_axis, y_axis, content, sumw2, entries })
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
    pub fn x_axis(&self) -> &Axis {
        &self.x_axis
    }

    /// The y axis.
    pub fn y_axis(&self) -> &Axis {
        &self.y_axis
    }

    /// All cell contents in global-bin order.
    pub fn contents(&self) -> &[f64] {
        &self.content
    }

    /// All cell sums of squared weights in global-bin order.
    pub fn sumw2(&self) -> &[f64] {
        &self.sumw2
    }

    /// Entry count.
    pub fn entries(&self) -> f64 {
        self.entries
    }

    /// Global bin of cell `(i, j)`.
    pub fn global_bin(&self, i: usize, j: usize) -> Result<usize> {
        let (nx_cells, ny_cells) = (self.x_axis.n_cells(), self.y_axis.n_cells());
        if i >= nx_cells || j >= ny_cells {
            return Err(RootError::CellOutOfRange { i, j, nx_cells, ny_cells });
        }
        Ok(i + nx_cells * j)
    }

    /// Add `w` to the cell containing `(x, y)`.
    pub fn fill(&mut self, x: f64, y: f64, w: f64) {
        let i = self.x_axis.find_bin(x);
        let j = self.y_axis.find_bin(y);
        let bin = i + self.x_axis.n_cells() * j;
        self.content[bin] += w;
        self.sumw2[bin] += w * w;
        self.entries += 1.0;
    }

    /// Content of cell `(i, j)`.
    pub fn bin_content_2d(&self, i: usize, j: usize) -> Result<f64> {
        Ok(self.content[self.global_bin(i, j)?])
    }

    /// Uncertainty of cell `(i, j)`.
    pub fn bin_error_2d(&self, i: usize, j: usize) -> Result<f64> {
        Ok(self.sumw2[self.global_bin(i, j)?].sqrt())
    }

    /// Overwrite the content of cell `(i, j)`.
    pub fn set_bin_content_2d(&mut self, i: usize, j: usize, value: f64) -> Result<()> {
        let bin = self.global_bin(i, j)?;
        self.set_bin_content(bin, value)
    }

    /// Overwrite the uncertainty of cell `(i, j)`.
    pub fn set_bin_error_2d(&mut self, i: usize, j: usize, error: f64) -> Result<()> {
        let bin = self.global_bin(i, j)?;
        self.set_bin_error(bin, error)
    }

    /// Sum of contents over in-range cells.
    pub fn integral(&self) -> f64 {
        let nx_cells = self.x_axis.n_cells();
        (1..=self.y_axis.n_bins())
            .flat_map(|j| (1..=self.x_axis.n_bins()).map(move |i| i + nx_cells * j))
            .map(|bin| self.content[bin])
            .sum()
    }
}

impl BinStore for Hist2D {
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

    fn hist() -> Hist2D {
        let ax = Axis::uniform(5, 0.0, 5.0).unwrap();
        Hist2D::new("h2", "", ax.clone(), ax).unwrap()
    }

    #[test]
    fn set_content_is_independent_of_fills() {
        let mut h = hist();
        h.fill(1.0, 1.0, 1.0);
        h.set_bin_content_2d(2, 2, 99.0).unwrap();
        assert_eq!(h.bin_content_2d(2, 2).unwrap(), 99.0);
        // x = 1.0 lands in bin 2 of [0, 5) with 5 bins, so (1,1) is untouched
        // and the fill sits in (2,2) until overwritten.
        assert_eq!(h.bin_content_2d(1, 1).unwrap(), 0.0);
    }

    #[test]
    fn fill_lands_in_joint_bin() {
        let mut h = hist();
        h.fill(0.5, 3.5, 2.0);
        h.fill(0.5, 3.5, 1.0);
        assert_relative_eq!(h.bin_content_2d(1, 4).unwrap(), 3.0);
        assert_relative_eq!(h.bin_error_2d(1, 4).unwrap(), 5.0f64.sqrt());
        assert_eq!(h.integral(), 3.0);
        assert_eq!(h.entries(), 2.0);
    }

    #[test]
    fn flows_per_axis() {
        let mut h = hist();
        h.fill(-1.0, 2.5, 1.0);
        h.fill(2.5, 9.0, 1.0);
        assert_eq!(h.bin_content_2d(0, 3).unwrap(), 1.0);
        assert_eq!(h.bin_content_2d(3, 6).unwrap(), 1.0);
        assert_eq!(h.integral(), 0.0);
    }

    #[test]
    fn variable_and_uniform_axes_mix() {
        let x = Axis::variable(vec![0.0, 1.0, 10.0]).unwrap();
        let y = Axis::uniform(3, -1.0, 2.0).unwrap();
        let mut h = Hist2D::new("mix", "", x, y).unwrap();
        h.fill(5.0, 0.5, 1.0);
        assert_eq!(h.bin_content_2d(2, 2).unwrap(), 1.0);
        assert_eq!(h.n_cells(), 4 * 5);
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let wide = Axis::uniform(100_000, 0.0, 1.0).unwrap();
        assert!(matches!(
            Hist2D::new("big", "", wide.clone(), wide),
            Err(RootError::InvalidBinning(_))
        ));
    }

    #[test]
    fn set_error_2d() {
        let mut h = hist();
        h.set_bin_error_2d(3, 4, 0.5).unwrap();
        assert_eq!(h.bin_error_2d(3, 4).unwrap(), 0.5);
        assert_eq!(h.bin_content_2d(3, 4).unwrap(), 0.0);
    }

    #[test]
    fn cell_out_of_range() {
        let mut h = hist();
        assert!(matches!(
            h.set_bin_content_2d(7, 0, 1.0),
            Err(RootError::CellOutOfRange { i: 7, j: 0, nx_cells: 7, ny_cells: 7 })
        ));
        assert!(h.bin_content_2d(6, 6).is_ok());
        assert!(h.set_bin_error_2d(0, 7, 1.0).is_err());
    }
}
