//! Binary writer mirroring [`RBuffer`](crate::rbuffer::RBuffer).

use crate::error::{Result, RootError};
use crate::rbuffer::BYTE_COUNT_MASK;

/// Position of an open streamed object whose byte count is patched on close.
#[derive(Debug, Clone, Copy)]
#[must_use = "an opened object must be closed with `end_object`"]
pub struct ObjectMark(usize);

/// Growable big-endian output buffer.
#[derive(Debug, Default)]
pub struct WBuffer {
    data: Vec<u8>,
}

impl WBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current write position (= length).
    #[inline]
    pub fn pos(&self) -> usize {
        self.data.len()
    }

    /// Consume the buffer, returning the bytes written.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, b: &[u8]) {
        self.data.extend_from_slice(b);
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    /// Write a big-endian u16.
    pub fn write_u16(&mut self, v: u16) {
        self.write_bytes(&v.to_be_bytes());
    }

    /// Write a big-endian u32.
    pub fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_be_bytes());
    }

    /// Write a big-endian i32.
    pub fn write_i32(&mut self, v: i32) {
        self.write_bytes(&v.to_be_bytes());
    }

    /// Write a big-endian u64.
    pub fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_be_bytes());
    }

    /// Write a big-endian f64.
    pub fn write_f64(&mut self, v: f64) {
        self.write_bytes(&v.to_be_bytes());
    }

    /// Write a ROOT-encoded string (short form below 255 bytes, long form otherwise).
    pub fn write_string(&mut self, s: &str) -> Result<()> {
        let bytes = s.as_bytes();
        if bytes.len() < 255 {
            self.write_u8(bytes.len() as u8);
        } else {
            let len = u32::try_from(bytes.len()).map_err(|_| {
                RootError::Serialization(format!("string of {} bytes too long", bytes.len()))
            })?;
            self.write_u8(255);
            self.write_u32(len);
        }
        self.write_bytes(bytes);
        Ok(())
    }

    /// Open a streamed object: placeholder byte count followed by `version`.
    pub fn begin_object(&mut self, version: u16) -> ObjectMark {
        let mark = ObjectMark(self.pos());
        self.write_u32(0);
        self.write_u16(version);
        mark
    }

    /// Close a streamed object by patching its byte count.
    pub fn end_object(&mut self, mark: ObjectMark) -> Result<()> {
        let byte_count = self.pos() - mark.0 - 4;
        let byte_count = u32::try_from(byte_count)
            .ok()
            .filter(|&n| n & BYTE_COUNT_MASK == 0)
            .ok_or_else(|| {
                RootError::Serialization(format!("streamed object of {byte_count} bytes too large"))
            })?;
        self.patch_u32(mark.0, byte_count | BYTE_COUNT_MASK);
        Ok(())
    }

    /// Overwrite a previously written big-endian u32 at `pos`.
    pub fn patch_u32(&mut self, pos: usize, v: u32) {
        self.data[pos..pos + 4].copy_from_slice(&v.to_be_bytes());
    }

    /// Overwrite a previously written big-endian u64 at `pos`.
    pub fn patch_u64(&mut self, pos: usize, v: u64) {
        self.data[pos..pos + 8].copy_from_slice(&v.to_be_bytes());
    }

    /// Write a `TObject` header with no unique id and no referenced bit.
    pub fn write_tobject(&mut self) {
        self.write_u16(1);
        self.write_u32(0);
        self.write_u32(0x0300_0000);
    }

    /// Write a `TNamed`: TObject + fName + fTitle.
    pub fn write_tnamed(&mut self, name: &str, title: &str) -> Result<()> {
        let mark = self.begin_object(1);
        self.write_tobject();
        self.write_string(name)?;
        self.write_string(title)?;
        self.end_object(mark)
    }

    /// Write a `TArrayD`: u32 length followed by the values.
    pub fn write_tarray_d(&mut self, values: &[f64]) -> Result<()> {
        let n = u32::try_from(values.len()).map_err(|_| {
            RootError::Serialization(format!("array of {} values too long", values.len()))
        })?;
        self.write_u32(n);
        for &v in values {
            self.write_f64(v);
        }
        Ok(())
    }
}
