//! Building containers: an in-memory directory tree serialized in one pass.
//!
//! Record layout produced by [`RootWriter::to_bytes`]:
//! ```text
//! header (64 bytes)
//! for each directory, depth first:
//!   object records  (TKey header + payload, compressed when it shrinks)
//!   sub-directory   (TKey header + TDirectory record, then its own records)
//!   key list        (KeysList TKey + nkeys + copies of every key header)
//! ```
//! A sub-directory's TDirectory record is written before its children and
//! patched with the position of their key list once that is known.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compress::{Compression, compress};
use crate::directory::{CLASS_DIRECTORY, CLASS_KEYS_LIST, DirectoryRecord};
use crate::error::{Result, RootError};
use crate::file::{BEGIN, FORMAT_VERSION, MAGIC};
use crate::histogram::HistObject;
use crate::key::{KEY_VERSION, Key, pack_datime};
use crate::objects;
use crate::wbuffer::WBuffer;

/// Offsets of patched fields inside a [`DirectoryRecord`].
const DIR_NBYTES_KEYS_AT: usize = 2 + 4 + 4;
const DIR_SEEK_KEYS_AT: usize = DIR_NBYTES_KEYS_AT + 4 + 4 + 8 + 8;

/// Options controlling how a container is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Compression applied to object payloads.
    pub compression: Compression,
}

/// A stored record waiting to be written.
#[derive(Debug, Clone)]
struct Record {
    class_name: String,
    name: String,
    title: String,
    payload: Vec<u8>,
}

#[derive(Debug, Clone)]
enum Entry {
    Object(Record),
    Dir(String, DirBuilder),
}

impl Entry {
    fn name(&self) -> &str {
        match self {
            Entry::Object(rec) => &rec.name,
            Entry::Dir(name, _) => name,
        }
    }
}

/// Contents of one directory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct DirBuilder {
    entries: Vec<Entry>,
}

impl DirBuilder {
    /// Encode `obj` and store it under its own name.
    ///
    /// An entry with the same name is replaced in place.
    pub fn put(&mut self, obj: &HistObject) -> Result<()> {
        self.put_named(obj.name(), obj)
    }

    /// Encode `obj` and store it under `name`, which may differ from the
    /// object's own name.
    pub fn put_named(&mut self, name: &str, obj: &HistObject) -> Result<()> {
        let payload = objects::write_object(obj)?;
        self.put_record(obj.class_name(), name, obj.title(), payload);
        Ok(())
    }

    /// Store an already-encoded record of any class.
    ///
    /// Readers that do not know `class_name` see it as an unsupported class.
    pub fn put_record(&mut self, class_name: &str, name: &str, title: &str, payload: Vec<u8>) {
        let rec = Record {
            class_name: class_name.to_string(),
            name: name.to_string(),
            title: title.to_string(),
            payload,
        };
        self.upsert(Entry::Object(rec));
    }

    /// Get (creating if absent) the sub-directory `name`.
    pub fn mkdir(&mut self, name: &str) -> &mut DirBuilder {
        let idx = match self.entries.iter().position(|e| matches!(e, Entry::Dir(n, _) if n == name)) {
            Some(idx) => idx,
            None => self.upsert(Entry::Dir(name.to_string(), DirBuilder::default())),
        };
        match &mut self.entries[idx] {
            Entry::Dir(_, dir) => dir,
            Entry::Object(_) => unreachable!("mkdir index always points at a directory"),
        }
    }

    /// Number of entries (objects and sub-directories).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directory holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn upsert(&mut self, entry: Entry) -> usize {
        match self.entries.iter().position(|e| e.name() == entry.name()) {
            Some(idx) => {
                log::debug!("replacing record '{}'", entry.name());
                self.entries[idx] = entry;
                idx
            }
            None => {
                self.entries.push(entry);
                self.entries.len() - 1
            }
        }
    }
}

/// Writes a directory tree of histograms to a container.
#[derive(Debug, Clone, Default)]
pub struct RootWriter {
    root: DirBuilder,
    options: WriteOptions,
}

impl RootWriter {
    /// Empty container with the given options.
    pub fn new(options: WriteOptions) -> Self {
        Self { root: DirBuilder::default(), options }
    }

    /// The top-level directory.
    pub fn root(&mut self) -> &mut DirBuilder {
        &mut self.root
    }

    /// Shorthand for `root().put(obj)`.
    pub fn put(&mut self, obj: &HistObject) -> Result<()> {
        self.root.put(obj)
    }

    /// Shorthand for `root().mkdir(name)`.
    pub fn mkdir(&mut self, name: &str) -> &mut DirBuilder {
        self.root.mkdir(name)
    }

    /// Serialize the whole tree.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut w = WBuffer::new();
        w.write_bytes(MAGIC);
        w.write_u32(FORMAT_VERSION);
        w.write_u64(BEGIN);
        let end_at = w.pos();
        w.write_u64(0);
        let seek_keys_at = w.pos();
        w.write_u64(0);
        let nbytes_keys_at = w.pos();
        w.write_u32(0);
        w.write_u32(self.options.compression.setting());
        while (w.pos() as u64) < BEGIN {
            w.write_u8(0);
        }

        let datime = pack_datime(chrono::Local::now().naive_local());
        let mut ctx = WriteContext { w, compression: self.options.compression, datime };
        let (seek_keys, nbytes_keys) = ctx.write_dir(&self.root, "", 0)?;

        let mut w = ctx.w;
        w.patch_u64(seek_keys_at, seek_keys);
        w.patch_u32(nbytes_keys_at, nbytes_keys);
        let end = w.pos() as u64;
        w.patch_u64(end_at, end);
        Ok(w.into_inner())
    }

    /// Write the container to `path`, replacing any existing file.
    ///
    /// Bytes go to a temporary file next to `path` that is renamed over it
    /// once complete; on error the temporary file is removed.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| RootError::Io(e.error))?;
        log::debug!("wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

struct WriteContext {
    w: WBuffer,
    compression: Compression,
    datime: u32,
}

/// Strings of a key header.
struct KeyStrings<'a> {
    class_name: &'a str,
    name: &'a str,
    title: &'a str,
}

impl WriteContext {
    /// Write every entry of `dir`, then its key list. Returns the list's
    /// position and length.
    fn write_dir(&mut self, dir: &DirBuilder, name: &str, seek_pdir: u64) -> Result<(u64, u32)> {
        let mut keys = Vec::with_capacity(dir.entries.len());
        for entry in &dir.entries {
            let key = match entry {
                Entry::Object(rec) => {
                    let stored = compress(&rec.payload, self.compression)?;
                    let strings = KeyStrings {
                        class_name: &rec.class_name,
                        name: &rec.name,
                        title: &rec.title,
                    };
                    let body = stored.as_deref().unwrap_or(&rec.payload);
                    self.write_record(&strings, rec.payload.len(), body, seek_pdir)?
                }
                Entry::Dir(sub_name, sub) => self.write_subdir(sub_name, sub, seek_pdir)?,
            };
            keys.push(key);
        }

        let mut list = WBuffer::new();
        list.write_u32(to_u32(keys.len(), name)?);
        for key in &keys {
            key.write(&mut list)?;
        }
        let list = list.into_inner();
        let strings = KeyStrings { class_name: CLASS_KEYS_LIST, name, title: "" };
        let list_key = self.write_record(&strings, list.len(), &list, seek_pdir)?;
        Ok((list_key.seek_key, list_key.n_bytes))
    }

    fn write_subdir(&mut self, name: &str, dir: &DirBuilder, seek_pdir: u64) -> Result<Key> {
        let strings = KeyStrings { class_name: CLASS_DIRECTORY, name, title: "" };
        let seek_dir = self.w.pos() as u64;
        let key_len = Key::header_len(strings.class_name, name, "")?;

        let mut body = WBuffer::new();
        DirectoryRecord {
            datime: self.datime,
            nbytes_keys: 0,
            nbytes_name: key_len as u32,
            seek_dir,
            seek_parent: seek_pdir,
            seek_keys: 0,
        }
        .write(&mut body);
        let body = body.into_inner();
        let key = self.write_record(&strings, body.len(), &body, seek_pdir)?;
        let record_at = seek_dir as usize + key_len as usize;

        let (seek_keys, nbytes_keys) = self.write_dir(dir, name, seek_dir)?;
        self.w.patch_u32(record_at + DIR_NBYTES_KEYS_AT, nbytes_keys);
        self.w.patch_u64(record_at + DIR_SEEK_KEYS_AT, seek_keys);
        Ok(key)
    }

    /// Write a key header followed by `body`, the stored form of an
    /// `obj_len`-byte object.
    fn write_record(
        &mut self,
        strings: &KeyStrings<'_>,
        obj_len: usize,
        body: &[u8],
        seek_pdir: u64,
    ) -> Result<Key> {
        let key_len = Key::header_len(strings.class_name, strings.name, strings.title)?;
        let key = Key {
            n_bytes: to_u32(key_len as usize + body.len(), strings.name)?,
            version: KEY_VERSION,
            obj_len: to_u32(obj_len, strings.name)?,
            datime: self.datime,
            key_len,
            cycle: 1,
            seek_key: self.w.pos() as u64,
            seek_pdir,
            class_name: strings.class_name.to_string(),
            name: strings.name.to_string(),
            title: strings.title.to_string(),
        };
        key.write(&mut self.w)?;
        self.w.write_bytes(body);
        log::trace!(
            "record '{}' ({}) at {}: {} bytes",
            key.name,
            key.class_name,
            key.seek_key,
            key.n_bytes
        );
        Ok(key)
    }
}

fn to_u32(len: usize, name: &str) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| RootError::Serialization(format!("record '{name}': {len} does not fit in 32 bits")))
}
