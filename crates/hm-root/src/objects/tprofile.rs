//! TProfile serialization.
//!
//! ```text
//! TProfile
//!   ├─ version header (byte count)
//!   ├─ TH1 (base: name, title, fNcells, fXaxis, fEntries, fSumw2 = Σw·y²)
//!   ├─ fBinEntries (TArrayD, Σw)
//!   ├─ fBinSumw2 (TArrayD, Σw²)
//!   ├─ fYmin, fYmax (f64)
//!   └─ TArrayD (Σw·y per cell)
//! ```

use crate::error::Result;
use crate::histogram::{Profile, ProfileSums};
use crate::rbuffer::RBuffer;
use crate::wbuffer::WBuffer;

use super::streamer::{read_cells, read_th1_base, write_th1_base};

const TPROFILE_VERSION: u16 = 1;

/// Read a TProfile from decompressed object bytes.
pub fn read_tprofile(data: &[u8]) -> Result<Profile> {
    let mut r = RBuffer::new(data);
    let (_ver, end) = r.read_version()?;
    let base = read_th1_base(&mut r)?;
    let sum_w = r.read_tarray_d()?;
    let sum_w2 = r.read_tarray_d()?;
    let y_min = r.read_f64()?;
    let y_max = r.read_f64()?;
    let sum_wy = read_cells(&mut r, "TProfile", &base.name, base.n_cells)?;
    r.finish_object(end, "TProfile")?;

    let sums = ProfileSums { sum_wy, sum_wy2: base.sumw2, sum_w, sum_w2 };
    Profile::from_parts(base.name, base.title, base.x_axis, (y_min, y_max), sums, base.entries)
}

/// Write a TProfile.
pub fn write_tprofile(w: &mut WBuffer, p: &Profile) -> Result<()> {
    let sums = p.sums();
    let mark = w.begin_object(TPROFILE_VERSION);
    write_th1_base(w, p.name(), p.title(), sums.sum_w.len(), p.axis(), p.entries(), &sums.sum_wy2)?;
    w.write_tarray_d(&sums.sum_w)?;
    w.write_tarray_d(&sums.sum_w2)?;
    let (y_min, y_max) = p.y_range();
    w.write_f64(y_min);
    w.write_f64(y_max);
    w.write_tarray_d(&sums.sum_wy)?;
    w.end_object(mark)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::Axis;
    use crate::histogram::BinStore;
    use approx::assert_relative_eq;

    #[test]
    fn round_trip_keeps_means_and_errors() {
        let mut p = Profile::new("resp", "response", Axis::uniform(3, 0.0, 3.0).unwrap(), -10.0, 10.0)
            .unwrap();
        for (x, y, w) in [(0.5, 1.0, 1.0), (0.5, 3.0, 2.0), (2.5, -4.0, 0.5), (2.5, 9.0, 1.0)] {
            p.fill(x, y, w);
        }

        let mut w = WBuffer::new();
        write_tprofile(&mut w, &p).unwrap();
        let back = read_tprofile(&w.into_inner()).unwrap();
        assert_eq!(back, p);
        for bin in 0..back.n_cells() {
            assert_relative_eq!(back.bin_content(bin).unwrap(), p.bin_content(bin).unwrap());
            assert_relative_eq!(back.bin_error(bin).unwrap(), p.bin_error(bin).unwrap());
        }
        assert_eq!(back.y_range(), (-10.0, 10.0));
    }
}
