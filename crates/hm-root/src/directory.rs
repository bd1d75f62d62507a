//! TDirectory records and key-list navigation.

use crate::error::{Result, RootError};
use crate::key::Key;
use crate::rbuffer::RBuffer;
use crate::wbuffer::WBuffer;

/// Class name of a stored sub-directory.
pub const CLASS_DIRECTORY: &str = "TDirectoryFile";
/// Class name of a key list record.
pub const CLASS_KEYS_LIST: &str = "KeysList";

/// TDirectory streamer version written by this crate (> 1000: 64-bit seeks).
const DIRECTORY_VERSION: u16 = 1005;

/// Whether a stored class name denotes a sub-directory.
pub fn is_directory_class(class_name: &str) -> bool {
    class_name == CLASS_DIRECTORY || class_name == "TDirectory"
}

/// The TDirectory streamer: where a directory's key list lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryRecord {
    /// Creation/modification time (ROOT packed datime).
    pub datime: u32,
    /// Length of the key list record.
    pub nbytes_keys: u32,
    /// Length of the directory's own key header.
    pub nbytes_name: u32,
    /// Position of the directory record's key.
    pub seek_dir: u64,
    /// Position of the parent directory (0 at top level).
    pub seek_parent: u64,
    /// Position of the key list record (0 when empty).
    pub seek_keys: u64,
}

impl DirectoryRecord {
    /// Parse the streamer from the start of `r`.
    pub fn read(r: &mut RBuffer) -> Result<Self> {
        let version = r.read_u16()?;
        let datime = r.read_u32()?;
        let _datime_m = r.read_u32()?;
        let nbytes_keys = r.read_u32()?;
        let nbytes_name = r.read_u32()?;

        let (seek_dir, seek_parent, seek_keys) = if version > 1000 {
            (r.read_u64()?, r.read_u64()?, r.read_u64()?)
        } else {
            (r.read_u32()? as u64, r.read_u32()? as u64, r.read_u32()? as u64)
        };

        Ok(Self { datime, nbytes_keys, nbytes_name, seek_dir, seek_parent, seek_keys })
    }

    /// Write the streamer in the 64-bit layout.
    pub fn write(&self, w: &mut WBuffer) {
        w.write_u16(DIRECTORY_VERSION);
        w.write_u32(self.datime);
        w.write_u32(self.datime);
        w.write_u32(self.nbytes_keys);
        w.write_u32(self.nbytes_name);
        w.write_u64(self.seek_dir);
        w.write_u64(self.seek_parent);
        w.write_u64(self.seek_keys);
    }
}

/// A parsed directory: an ordered list of TKeys.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    keys: Vec<Key>,
}

impl Directory {
    /// Read the key list from the file at `seek_keys`.
    ///
    /// The key list starts with a TKey header for the list itself, then
    /// a u32 `nkeys`, followed by `nkeys` TKey records.
    pub fn read_key_list(
        file_data: &[u8],
        seek_keys: usize,
        nbytes_keys: usize,
    ) -> Result<Self> {
        if seek_keys.saturating_add(nbytes_keys) > file_data.len() {
            return Err(RootError::BufferUnderflow {
                offset: seek_keys,
                need: nbytes_keys,
                have: file_data.len().saturating_sub(seek_keys),
            });
        }
        let mut r = RBuffer::new(&file_data[..seek_keys + nbytes_keys]);
        r.set_pos(seek_keys);

        let list_key = Key::read(&mut r, true)?;
        if list_key.class_name != CLASS_KEYS_LIST {
            return Err(RootError::Deserialization(format!(
                "expected a key list at {}, found class '{}'",
                seek_keys, list_key.class_name
            )));
        }

        let nkeys = r.read_u32()? as usize;
        let mut keys = Vec::with_capacity(nkeys.min(r.remaining()));
        for _ in 0..nkeys {
            keys.push(Key::read(&mut r, true)?);
        }

        Ok(Directory { keys })
    }

    /// Read a sub-directory from the decompressed payload of a `TDirectoryFile` key.
    pub fn read_from_payload(payload: &[u8], file_data: &[u8]) -> Result<Self> {
        let record = DirectoryRecord::read(&mut RBuffer::new(payload))?;
        if record.seek_keys == 0 {
            return Ok(Directory::default());
        }
        Self::read_key_list(file_data, record.seek_keys as usize, record.nbytes_keys as usize)
    }

    /// Access the list of keys.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Find a key by name (returns the highest cycle).
    pub fn find_key(&self, name: &str) -> Option<&Key> {
        self.keys.iter().filter(|k| k.name == name).max_by_key(|k| k.cycle)
    }

    /// Split keys into leaf records and sub-directories, preserving order.
    pub fn partition(&self) -> (Vec<&Key>, Vec<&Key>) {
        self.keys.iter().partition(|k| !is_directory_class(&k.class_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_round_trip() {
        let rec = DirectoryRecord {
            datime: 7,
            nbytes_keys: 120,
            nbytes_name: 50,
            seek_dir: 300,
            seek_parent: 0,
            seek_keys: 5_000_000_000,
        };
        let mut w = WBuffer::new();
        rec.write(&mut w);
        let bytes = w.into_inner();
        assert_eq!(DirectoryRecord::read(&mut RBuffer::new(&bytes)).unwrap(), rec);
    }

    #[test]
    fn empty_subdirectory_payload() {
        let rec = DirectoryRecord {
            datime: 0,
            nbytes_keys: 0,
            nbytes_name: 0,
            seek_dir: 0,
            seek_parent: 0,
            seek_keys: 0,
        };
        let mut w = WBuffer::new();
        rec.write(&mut w);
        let dir = Directory::read_from_payload(&w.into_inner(), &[]).unwrap();
        assert!(dir.keys().is_empty());
    }

    #[test]
    fn key_list_past_end_of_file() {
        let err = Directory::read_key_list(&[0u8; 16], 8, 64).unwrap_err();
        assert!(matches!(err, RootError::BufferUnderflow { .. }));
    }

    #[test]
    fn directory_classes() {
        assert!(is_directory_class("TDirectoryFile"));
        assert!(is_directory_class("TDirectory"));
        assert!(!is_directory_class("TH1D"));
    }
}
