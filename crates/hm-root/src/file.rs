//! Container header parsing and the read-side interface.

use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use crate::compress::{Compression, decompress};
use crate::directory::{Directory, is_directory_class};
use crate::error::{Result, RootError};
use crate::histogram::HistObject;
use crate::key::{Key, KeyInfo};
use crate::objects;
use crate::rbuffer::RBuffer;

/// Magic bytes at offset 0 of every container.
pub const MAGIC: &[u8; 4] = b"hmrt";
/// Container format version written by this crate.
pub const FORMAT_VERSION: u32 = 1;
/// Offset of the first record; the header is zero-padded up to it.
pub const BEGIN: u64 = 64;

/// Container header layout:
/// ```text
/// offset  size  field
///    0      4   magic "hmrt"
///    4      4   format version
///    8      8   begin (first record)
///   16      8   end (file length)
///   24      8   seek_keys (top-level key list)
///   32      4   nbytes_keys
///   36      4   compression setting (algorithm * 100 + level)
///   40     24   zero padding
/// ```
#[derive(Debug, Clone, Copy)]
struct FileHeader {
    seek_keys: u64,
    nbytes_keys: u32,
    compression: Compression,
}

/// Owned or memory-mapped file bytes.
enum DataSource {
    Owned(Vec<u8>),
    Mmap(memmap2::Mmap),
}

impl Deref for DataSource {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        match self {
            DataSource::Owned(v) => v,
            DataSource::Mmap(m) => m,
        }
    }
}

/// A container opened for reading.
pub struct RootFile {
    data: DataSource,
    header: FileHeader,
    path: Option<PathBuf>,
}

impl RootFile {
    /// Open and parse a container from disk using memory mapping.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = fs::File::open(&path)?;
        // SAFETY: the map is read-only and dropped with `RootFile`; concurrent
        // truncation by another process is outside what this reader guards.
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        Self::from_source(DataSource::Mmap(mmap), Some(path))
    }

    /// Parse a container held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_source(DataSource::Owned(data), None)
    }

    fn from_source(data: DataSource, path: Option<PathBuf>) -> Result<Self> {
        if data.len() < BEGIN as usize || &data[0..4] != MAGIC {
            return Err(RootError::BadMagic);
        }
        let header = parse_header(&data)?;
        log::debug!(
            "opened container {} ({} bytes, compression {:?})",
            path.as_deref().map_or_else(|| "<memory>".into(), |p| p.display().to_string()),
            data.len(),
            header.compression
        );
        Ok(Self { data, header, path })
    }

    /// Path the container was opened from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Compression setting recorded by the writer.
    pub fn compression(&self) -> Compression {
        self.header.compression
    }

    /// List all keys in the top-level directory.
    pub fn list_keys(&self) -> Result<Vec<KeyInfo>> {
        Ok(self.top_directory()?.keys().iter().map(KeyInfo::from_key).collect())
    }

    /// Parse the top-level key list.
    pub fn top_directory(&self) -> Result<Directory> {
        if self.header.seek_keys == 0 {
            return Ok(Directory::default());
        }
        Directory::read_key_list(
            &self.data,
            to_usize(self.header.seek_keys)?,
            self.header.nbytes_keys as usize,
        )
    }

    /// Parse the key list of the sub-directory stored under `key`.
    pub fn read_subdirectory(&self, key: &Key) -> Result<Directory> {
        if !is_directory_class(&key.class_name) {
            return Err(RootError::TypeMismatch(format!(
                "'{}' is not a directory (class: {})",
                key.name, key.class_name
            )));
        }
        let payload = self.read_key_payload(key)?;
        Directory::read_from_payload(&payload, &self.data)
    }

    /// Decode the object stored under `key` into an owned histogram.
    pub fn read_object(&self, key: &Key) -> Result<HistObject> {
        let payload = self.read_key_payload(key)?;
        objects::read_object(&payload, &key.class_name)
    }

    /// Get an object by its `/`-separated path (e.g. `"jets/pt"`).
    pub fn get_object(&self, path: &str) -> Result<HistObject> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((&leaf, dirs)) = parts.split_last() else {
            return Err(RootError::KeyNotFound(path.to_string()));
        };

        let mut dir = self.top_directory()?;
        for &part in dirs {
            let key = dir
                .find_key(part)
                .ok_or_else(|| RootError::KeyNotFound(format!("{part} (in path {path})")))?;
            dir = self.read_subdirectory(key)?;
        }

        let key = dir.find_key(leaf).ok_or_else(|| RootError::KeyNotFound(path.to_string()))?;
        self.read_object(key)
    }

    /// Read and, if needed, decompress the payload following a key header.
    pub fn read_key_payload(&self, key: &Key) -> Result<Vec<u8>> {
        let record = self.read_file_range(key.seek_key, key.n_bytes as u64)?;
        let payload = &record[key.key_len as usize..];
        let obj_len = key.obj_len as usize;
        if payload.len() == obj_len {
            return Ok(payload.to_vec());
        }
        decompress(payload, obj_len)
    }

    fn read_file_range(&self, seek: u64, n_bytes: u64) -> Result<&[u8]> {
        let start = to_usize(seek)?;
        let len = to_usize(n_bytes)?;
        let end = start.checked_add(len).ok_or_else(|| {
            RootError::Deserialization(format!("range overflow for seek={seek} n_bytes={n_bytes}"))
        })?;
        if end > self.data.len() {
            return Err(RootError::BufferUnderflow {
                offset: start,
                need: len,
                have: self.data.len().saturating_sub(start),
            });
        }
        Ok(&self.data[start..end])
    }
}

fn parse_header(data: &[u8]) -> Result<FileHeader> {
    let mut r = RBuffer::new(data);
    r.skip(4)?;
    let version = r.read_u32()?;
    if version != FORMAT_VERSION {
        return Err(RootError::UnsupportedVersion(version));
    }
    let begin = r.read_u64()?;
    let end = r.read_u64()?;
    let seek_keys = r.read_u64()?;
    let nbytes_keys = r.read_u32()?;
    let compression = Compression::from_setting(r.read_u32()?)?;

    if begin != BEGIN || end != data.len() as u64 {
        return Err(RootError::Deserialization(format!(
            "header claims records in {begin}..{end}, file has {} bytes",
            data.len()
        )));
    }
    Ok(FileHeader { seek_keys, nbytes_keys, compression })
}

fn to_usize(v: u64) -> Result<usize> {
    usize::try_from(v).map_err(|_| RootError::Deserialization(format!("offset too large: {v}")))
}
