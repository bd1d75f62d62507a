//! TKey records: the header placed in front of every stored object.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{Result, RootError};
use crate::rbuffer::RBuffer;
use crate::wbuffer::WBuffer;

/// Key version written by this crate; above 1000 means 64-bit seek pointers.
pub const KEY_VERSION: u16 = 1004;

/// Fixed-size part of a large key header, before the three strings.
const FIXED_LEN: usize = 4 + 2 + 4 + 4 + 2 + 2 + 8 + 8;

/// A parsed TKey record.
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    /// Total number of bytes in the (possibly compressed) object + key header.
    pub n_bytes: u32,
    /// Version of key class.
    pub version: u16,
    /// Uncompressed object length.
    pub obj_len: u32,
    /// Key creation time (ROOT packed datime).
    pub datime: u32,
    /// Length of the key header itself.
    pub key_len: u16,
    /// Cycle number (versioning within a directory).
    pub cycle: u16,
    /// Absolute position of this key in the file.
    pub seek_key: u64,
    /// Parent directory seek position.
    pub seek_pdir: u64,
    /// Class name of the stored object.
    pub class_name: String,
    /// Object name.
    pub name: String,
    /// Object title.
    pub title: String,
}

/// Public info about a key (for `list_keys()`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    /// Object name.
    pub name: String,
    /// Object class name (e.g. "TH1D", "TDirectoryFile").
    pub class_name: String,
    /// Cycle number.
    pub cycle: u16,
    /// When the record was written, if the stored datime is valid.
    pub written: Option<NaiveDateTime>,
}

impl KeyInfo {
    /// Create from an internal Key.
    pub fn from_key(key: &Key) -> Self {
        Self {
            name: key.name.clone(),
            class_name: key.class_name.clone(),
            cycle: key.cycle,
            written: unpack_datime(key.datime),
        }
    }
}

/// Pack a timestamp into ROOT's 32-bit datime:
/// `(year-1995)<<26 | month<<22 | day<<17 | hour<<12 | minute<<6 | second`.
///
/// Years before 1995 clamp to 1995.
pub fn pack_datime(t: NaiveDateTime) -> u32 {
    let year = (t.year() - 1995).clamp(0, 63) as u32;
    year << 26 | t.month() << 22 | t.day() << 17 | t.hour() << 12 | t.minute() << 6 | t.second()
}

/// Inverse of [`pack_datime`]; `None` for a zero or malformed datime.
pub fn unpack_datime(datime: u32) -> Option<NaiveDateTime> {
    let year = (datime >> 26) as i32 + 1995;
    let date = NaiveDate::from_ymd_opt(year, (datime >> 22) & 0xF, (datime >> 17) & 0x1F)?;
    date.and_hms_opt((datime >> 12) & 0x1F, (datime >> 6) & 0x3F, datime & 0x3F)
}

impl Key {
    /// Read a TKey from the buffer at the current position.
    pub fn read(r: &mut RBuffer, is_large: bool) -> Result<Self> {
        let n_bytes = r.read_u32()?;
        let version = r.read_u16()?;
        let obj_len = r.read_u32()?;
        let datime = r.read_u32()?;
        let key_len = r.read_u16()?;
        let cycle = r.read_u16()?;

        let (seek_key, seek_pdir) = if version > 1000 || is_large {
            (r.read_u64()?, r.read_u64()?)
        } else {
            (r.read_u32()? as u64, r.read_u32()? as u64)
        };

        let class_name = r.read_string()?;
        let name = r.read_string()?;
        let title = r.read_string()?;

        if (key_len as u32) > n_bytes {
            return Err(RootError::Deserialization(format!(
                "key '{}': header length {} exceeds record length {}",
                name, key_len, n_bytes
            )));
        }

        Ok(Key {
            n_bytes,
            version,
            obj_len,
            datime,
            key_len,
            cycle,
            seek_key,
            seek_pdir,
            class_name,
            name,
            title,
        })
    }

    /// Header length of a large key carrying these strings.
    pub fn header_len(class_name: &str, name: &str, title: &str) -> Result<u16> {
        let strings: usize = [class_name, name, title]
            .iter()
            .map(|s| s.len() + if s.len() < 255 { 1 } else { 5 })
            .sum();
        u16::try_from(FIXED_LEN + strings).map_err(|_| {
            RootError::Serialization(format!("key header for '{name}' exceeds 65535 bytes"))
        })
    }

    /// Write this key header (always in the 64-bit seek layout).
    pub fn write(&self, w: &mut WBuffer) -> Result<()> {
        let start = w.pos();
        w.write_u32(self.n_bytes);
        w.write_u16(KEY_VERSION);
        w.write_u32(self.obj_len);
        w.write_u32(self.datime);
        w.write_u16(self.key_len);
        w.write_u16(self.cycle);
        w.write_u64(self.seek_key);
        w.write_u64(self.seek_pdir);
        w.write_string(&self.class_name)?;
        w.write_string(&self.name)?;
        w.write_string(&self.title)?;
        debug_assert_eq!(w.pos() - start, self.key_len as usize);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Key {
        let key_len = Key::header_len("TH1D", "pt", "transverse momentum").unwrap();
        Key {
            n_bytes: key_len as u32 + 100,
            version: KEY_VERSION,
            obj_len: 120,
            datime: 0x7654_3210,
            key_len,
            cycle: 1,
            seek_key: 1 << 33,
            seek_pdir: 64,
            class_name: "TH1D".into(),
            name: "pt".into(),
            title: "transverse momentum".into(),
        }
    }

    #[test]
    fn write_then_read() {
        let key = sample();
        let mut w = WBuffer::new();
        key.write(&mut w).unwrap();
        let bytes = w.into_inner();
        assert_eq!(bytes.len(), key.key_len as usize);

        let mut r = RBuffer::new(&bytes);
        let back = Key::read(&mut r, false).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn small_key_layout_uses_32_bit_seeks() {
        let mut w = WBuffer::new();
        w.write_u32(60);
        w.write_u16(4);
        w.write_u32(10);
        w.write_u32(0);
        w.write_u16(34);
        w.write_u16(2);
        w.write_u32(100);
        w.write_u32(64);
        w.write_string("TH1D").unwrap();
        w.write_string("h").unwrap();
        w.write_string("").unwrap();
        let bytes = w.into_inner();

        let key = Key::read(&mut RBuffer::new(&bytes), false).unwrap();
        assert_eq!(key.seek_key, 100);
        assert_eq!(key.seek_pdir, 64);
        assert_eq!(key.cycle, 2);
        let info = KeyInfo::from_key(&key);
        assert_eq!(info.name, "h");
        assert_eq!(info.written, None);
    }

    #[test]
    fn datime_packing() {
        let t = NaiveDate::from_ymd_opt(2024, 11, 3).unwrap().and_hms_opt(17, 5, 59).unwrap();
        let packed = pack_datime(t);
        assert_eq!(packed >> 26, 29);
        assert_eq!(unpack_datime(packed), Some(t));
        assert_eq!(unpack_datime(0), None);
    }

    #[test]
    fn header_longer_than_record_is_rejected() {
        let mut key = sample();
        key.n_bytes = 10;
        let mut w = WBuffer::new();
        key.write(&mut w).unwrap();
        let bytes = w.into_inner();
        assert!(Key::read(&mut RBuffer::new(&bytes), false).is_err());
    }
}
