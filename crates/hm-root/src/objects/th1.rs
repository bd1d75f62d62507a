//! TH1D serialization.
//!
//! ```text
//! TH1D
//!   ├─ version header (byte count)
//!   ├─ TH1 (base: name, title, fNcells, fXaxis, fEntries, fSumw2)
//!   └─ TArrayD (bin contents, fNcells entries including under/overflow)
//! ```

use crate::error::Result;
use crate::histogram::Hist1D;
use crate::rbuffer::RBuffer;
use crate::wbuffer::WBuffer;

use super::streamer::{read_cells, read_th1_base, write_th1_base};

const TH1D_VERSION: u16 = 1;

/// Read a TH1D from decompressed object bytes.
pub fn read_th1d(data: &[u8]) -> Result<Hist1D> {
    let mut r = RBuffer::new(data);
    let (_ver, end) = r.read_version()?;
    let base = read_th1_base(&mut r)?;
    let content = read_cells(&mut r, "TH1D", &base.name, base.n_cells)?;
    r.finish_object(end, "TH1D")?;

    Hist1D::from_parts(base.name, base.title, base.x_axis, content, base.sumw2, base.entries)
}

/// Write a TH1D.
pub fn write_th1d(w: &mut WBuffer, h: &Hist1D) -> Result<()> {
    let mark = w.begin_object(TH1D_VERSION);
    write_th1_base(w, h.name(), h.title(), h.contents().len(), h.axis(), h.entries(), h.sumw2())?;
    w.write_tarray_d(h.contents())?;
    w.end_object(mark)
}
