//! Object streamers: encode/decode histogram payloads by stored class name.

mod streamer;
mod th1;
mod th2;
mod tprofile;

use crate::error::{Result, RootError};
use crate::histogram::{CLASS_TH1D, CLASS_TH2D, CLASS_TPROFILE, HistObject};
use crate::wbuffer::WBuffer;

/// Decode an object from a decompressed payload, given its class name.
pub fn read_object(payload: &[u8], class_name: &str) -> Result<HistObject> {
    match class_name {
        CLASS_TH1D => th1::read_th1d(payload).map(HistObject::H1),
        CLASS_TH2D => th2::read_th2d(payload).map(HistObject::H2),
        CLASS_TPROFILE => tprofile::read_tprofile(payload).map(HistObject::Profile),
        _ => Err(RootError::UnsupportedClass(class_name.to_string())),
    }
}

/// Encode an object into an uncompressed payload.
pub fn write_object(obj: &HistObject) -> Result<Vec<u8>> {
    let mut w = WBuffer::new();
    match obj {
        HistObject::H1(h) => th1::write_th1d(&mut w, h)?,
        HistObject::H2(h) => th2::write_th2d(&mut w, h)?,
        HistObject::Profile(p) => tprofile::write_tprofile(&mut w, p)?,
    }
    Ok(w.into_inner())
}
