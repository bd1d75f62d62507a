//! TH2D serialization.
//!
//! ```text
//! TH2D
//!   ├─ version header (byte count)
//!   ├─ TH1 (base: name, title, fNcells, fXaxis, fEntries, fSumw2)
//!   ├─ fYaxis (TAxis)
//!   └─ TArrayD (cell contents, x-fastest, under/overflow included)
//! ```

use crate::error::Result;
use crate::histogram::Hist2D;
use crate::rbuffer::RBuffer;
use crate::wbuffer::WBuffer;

use super::streamer::{read_cells, read_taxis, read_th1_base, write_taxis, write_th1_base};

const TH2D_VERSION: u16 = 1;

/// Read a TH2D from decompressed object bytes.
pub fn read_th2d(data: &[u8]) -> Result<Hist2D> {
    let mut r = RBuffer::new(data);
    let (_ver, end) = r.read_version()?;
    let base = read_th1_base(&mut r)?;
    let y_axis = read_taxis(&mut r)?;
    let content = read_cells(&mut r, "TH2D", &base.name, base.n_cells)?;
    r.finish_object(end, "TH2D")?;

    Hist2D::from_parts(
        base.name,
        base.title,
        base.x_axis,
        y_axis,
        content,
        base.sumw2,
        base.entries,
    )
}

/// Write a TH2D.
pub fn write_th2d(w: &mut WBuffer, h: &Hist2D) -> Result<()> {
    let mark = w.begin_object(TH2D_VERSION);
    write_th1_base(w, h.name(), h.title(), h.contents().len(), h.x_axis(), h.entries(), h.sumw2())?;
    write_taxis(w, "yaxis", h.y_axis())?;
    w.write_tarray_d(h.contents())?;
    w.end_object(mark)
}
