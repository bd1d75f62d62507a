//! Pieces shared by every histogram streamer.
//!
//! ```text
//! TAxis
//!   ├─ version header (byte count)
//!   ├─ TNamed (axis name, empty title)
//!   ├─ fNbins (i32), fXmin (f64), fXmax (f64)
//!   └─ fXbins (TArrayD, empty for uniform binning)
//!
//! TH1 (base of every histogram class)
//!   ├─ version header (byte count)
//!   ├─ TNamed (name, title)
//!   ├─ fNcells (i32)
//!   ├─ fXaxis (TAxis)
//!   ├─ fEntries (f64)
//!   └─ fSumw2 (TArrayD, one value per cell)
//! ```

use crate::axis::Axis;
use crate::error::{Result, RootError};
use crate::rbuffer::RBuffer;
use crate::wbuffer::WBuffer;

const AXIS_VERSION: u16 = 1;
const TH1_VERSION: u16 = 1;

/// Fields of the TH1 base class.
pub(super) struct Th1Base {
    pub name: String,
    pub title: String,
    pub n_cells: usize,
    pub x_axis: Axis,
    pub entries: f64,
    pub sumw2: Vec<f64>,
}

pub(super) fn write_taxis(w: &mut WBuffer, name: &str, axis: &Axis) -> Result<()> {
    let mark = w.begin_object(AXIS_VERSION);
    w.write_tnamed(name, "")?;
    let n_bins = i32::try_from(axis.n_bins())
        .map_err(|_| RootError::Serialization(format!("{} bins do not fit fNbins", axis.n_bins())))?;
    w.write_i32(n_bins);
    w.write_f64(axis.min());
    w.write_f64(axis.max());
    match axis {
        Axis::Uniform { .. } => w.write_tarray_d(&[])?,
        Axis::Variable { edges } => w.write_tarray_d(edges)?,
    }
    w.end_object(mark)
}

pub(super) fn read_taxis(r: &mut RBuffer) -> Result<Axis> {
    let (_ver, end) = r.read_version()?;
    let (axis_name, _title) = r.read_tnamed()?;

    let n_bins = r.read_i32()?;
    let x_min = r.read_f64()?;
    let x_max = r.read_f64()?;
    let edges = r.read_tarray_d()?;
    r.finish_object(end, "TAxis")?;

    let n_bins = usize::try_from(n_bins).map_err(|_| {
        RootError::Deserialization(format!("axis '{axis_name}': negative bin count {n_bins}"))
    })?;
    let axis = if edges.is_empty() {
        Axis::uniform(n_bins, x_min, x_max)
    } else if edges.len() == n_bins + 1 {
        Axis::variable(edges)
    } else {
        return Err(RootError::Deserialization(format!(
            "axis '{axis_name}': {} edges for {n_bins} bins",
            edges.len()
        )));
    };
    axis.map_err(|e| RootError::Deserialization(format!("axis '{axis_name}': {e}")))
}

pub(super) fn write_th1_base(
    w: &mut WBuffer,
    name: &str,
    title: &str,
    n_cells: usize,
    x_axis: &Axis,
    entries: f64,
    sumw2: &[f64],
) -> Result<()> {
    let mark = w.begin_object(TH1_VERSION);
    w.write_tnamed(name, title)?;
    let n_cells = i32::try_from(n_cells)
        .map_err(|_| RootError::Serialization(format!("'{name}': {n_cells} cells do not fit fNcells")))?;
    w.write_i32(n_cells);
    write_taxis(w, "xaxis", x_axis)?;
    w.write_f64(entries);
    w.write_tarray_d(sumw2)?;
    w.end_object(mark)
}

pub(super) fn read_th1_base(r: &mut RBuffer) -> Result<Th1Base> {
    let (_ver, end) = r.read_version()?;
    let (name, title) = r.read_tnamed()?;
    let n_cells = r.read_i32()?;
    let x_axis = read_taxis(r)?;
    let entries = r.read_f64()?;
    let sumw2 = r.read_tarray_d()?;
    r.finish_object(end, "TH1")?;

    let n_cells = usize::try_from(n_cells)
        .map_err(|_| RootError::Deserialization(format!("'{name}': negative fNcells {n_cells}")))?;
    Ok(Th1Base { name, title, n_cells, x_axis, entries, sumw2 })
}

/// Read the trailing TArrayD of cell values and check it against fNcells.
pub(super) fn read_cells(r: &mut RBuffer, class: &str, name: &str, n_cells: usize) -> Result<Vec<f64>> {
    let values = r.read_tarray_d()?;
    if values.len() != n_cells {
        return Err(RootError::Deserialization(format!(
            "{class} '{name}': array size {} != fNcells {}",
            values.len(),
            n_cells
        )));
    }
    Ok(values)
}
