//! Compression blocks (ZL = zlib, L4 = LZ4, ZS = ZSTD, XZ = LZMA).
//!
//! Compressed payloads are one or more blocks, each with a 9-byte header:
//! ```text
//! bytes 0-1:  algorithm tag ("ZL", "XZ", "L4", "ZS")
//! byte  2:    method (ignored on read)
//! bytes 3-5:  compressed size   (3-byte little-endian)
//! bytes 6-8:  uncompressed size (3-byte little-endian)
//! ```
//! The compressed payload immediately follows the header. LZ4 payloads start
//! with an 8-byte big-endian XXH64 checksum of the LZ4 bytes that follow.

use std::hash::Hasher;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RootError};

/// Largest uncompressed (and compressed) block size a 24-bit header can express.
pub const MAX_BLOCK_LEN: usize = 0xFF_FFFF;

const HEADER_LEN: usize = 9;
const LZ4_CHECKSUM_LEN: usize = 8;

std::thread_local! {
    static ZSTD_DECODER: std::cell::RefCell<ruzstd::decoding::FrameDecoder> =
        std::cell::RefCell::new(ruzstd::decoding::FrameDecoder::new());
}

/// Compression algorithm for written payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Store payloads uncompressed.
    None,
    /// zlib (deflate).
    #[default]
    Zlib,
    /// LZ4 block format with XXH64 checksum.
    Lz4,
    /// Zstandard.
    Zstd,
    /// XZ / LZMA.
    Xz,
}

impl Algorithm {
    /// ROOT algorithm code used in the `algorithm * 100 + level` setting.
    pub fn code(self) -> u32 {
        match self {
            Algorithm::None => 0,
            Algorithm::Zlib => 1,
            Algorithm::Xz => 2,
            Algorithm::Lz4 => 4,
            Algorithm::Zstd => 5,
        }
    }

    fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Algorithm::None),
            1 => Some(Algorithm::Zlib),
            2 => Some(Algorithm::Xz),
            4 => Some(Algorithm::Lz4),
            5 => Some(Algorithm::Zstd),
            _ => None,
        }
    }

    fn tag(self) -> &'static [u8; 2] {
        match self {
            Algorithm::None => b"\0\0",
            Algorithm::Zlib => b"ZL",
            Algorithm::Lz4 => b"L4",
            Algorithm::Zstd => b"ZS",
            Algorithm::Xz => b"XZ",
        }
    }
}

/// Compression settings for written payloads.
///
/// Levels are clamped to `0..=9`; level 0 or [`Algorithm::None`] normalize to
/// [`Compression::NONE`], so every value survives the packed header setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CompressionFields", into = "CompressionFields")]
pub struct Compression {
    algorithm: Algorithm,
    level: u32,
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
struct CompressionFields {
    algorithm: Algorithm,
    level: u32,
}

impl Default for CompressionFields {
    fn default() -> Self {
        Self { algorithm: Algorithm::Zlib, level: 1 }
    }
}

impl From<CompressionFields> for Compression {
    fn from(f: CompressionFields) -> Self {
        Compression::new(f.algorithm, f.level)
    }
}

impl From<Compression> for CompressionFields {
    fn from(c: Compression) -> Self {
        Self { algorithm: c.algorithm, level: c.level }
    }
}

impl Default for Compression {
    fn default() -> Self {
        Self { algorithm: Algorithm::Zlib, level: 1 }
    }
}

impl Compression {
    /// No compression.
    pub const NONE: Compression = Compression { algorithm: Algorithm::None, level: 0 };

    /// Highest accepted level.
    pub const MAX_LEVEL: u32 = 9;

    /// Settings with the given algorithm and level (clamped to `0..=9`).
    pub fn new(algorithm: Algorithm, level: u32) -> Self {
        let level = level.min(Self::MAX_LEVEL);
        if algorithm == Algorithm::None || level == 0 {
            return Self::NONE;
        }
        Self { algorithm, level }
    }

    /// Algorithm.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Level (1-9; 0 when disabled).
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Whether payloads are compressed at all.
    pub fn is_enabled(&self) -> bool {
        self.algorithm != Algorithm::None
    }

    /// Packed `algorithm * 100 + level` setting stored in the file header.
    pub fn setting(&self) -> u32 {
        self.algorithm.code() * 100 + self.level
    }

    /// Unpack a stored setting.
    pub fn from_setting(setting: u32) -> Result<Self> {
        let bad = || RootError::Deserialization(format!("unknown compression setting {setting}"));
        let algorithm = Algorithm::from_code(setting / 100).ok_or_else(bad)?;
        let level = setting % 100;
        if level > Self::MAX_LEVEL {
            return Err(bad());
        }
        Ok(Self::new(algorithm, level))
    }
}

/// Compress `src` into blocks.
///
/// Returns `None` when compression is disabled or does not shrink the payload;
/// the caller then stores `src` as is.
pub fn compress(src: &[u8], settings: Compression) -> Result<Option<Vec<u8>>> {
    if !settings.is_enabled() || src.is_empty() {
        return Ok(None);
    }

    let mut out = Vec::with_capacity(src.len());
    for chunk in src.chunks(MAX_BLOCK_LEN) {
        let (method, body) = match settings.algorithm {
            Algorithm::Zlib => (8, compress_zlib(chunk, settings.level)?),
            Algorithm::Lz4 => (1, compress_lz4(chunk)),
            Algorithm::Zstd => (1, compress_zstd(chunk)),
            Algorithm::Xz => (0, compress_xz(chunk)?),
            Algorithm::None => return Ok(None),
        };
        if body.len() > MAX_BLOCK_LEN {
            return Ok(None);
        }
        out.extend_from_slice(settings.algorithm.tag());
        out.push(method);
        write_le24(&mut out, body.len());
        write_le24(&mut out, chunk.len());
        out.extend_from_slice(&body);
        if out.len() >= src.len() {
            return Ok(None);
        }
    }
    Ok(Some(out))
}

/// Decompress block-compressed data into `expected_len` bytes.
///
/// `expected_len` comes from the key header and is not trusted for the
/// up-front allocation; the buffer grows one block at a time.
pub fn decompress(src: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected_len.min(MAX_BLOCK_LEN));
    let mut offset = 0;

    while out.len() < expected_len && offset + HEADER_LEN <= src.len() {
        let tag = &src[offset..offset + 2];
        let c_size = read_le24(&src[offset + 3..offset + 6]);
        let u_size = read_le24(&src[offset + 6..offset + 9]);
        offset += HEADER_LEN;

        let end = offset + c_size;
        if end > src.len() {
            return Err(RootError::Decompression(format!(
                "compressed block claims {} bytes but only {} remain",
                c_size,
                src.len() - offset
            )));
        }

        let compressed = &src[offset..end];

        let decompressed = match tag {
            b"ZL" => decompress_zlib(compressed, u_size)?,
            b"L4" => decompress_lz4(compressed, u_size)?,
            b"ZS" => decompress_zstd(compressed, u_size)?,
            b"XZ" => decompress_xz(compressed, u_size)?,
            _ => {
                return Err(RootError::Decompression(format!(
                    "unsupported compression algorithm: {:?}",
                    String::from_utf8_lossy(tag)
                )));
            }
        };

        if decompressed.len() != u_size {
            return Err(RootError::Decompression(format!(
                "expected {} uncompressed bytes, got {}",
                u_size,
                decompressed.len()
            )));
        }

        out.extend_from_slice(&decompressed);
        offset = end;
    }

    if out.len() != expected_len {
        return Err(RootError::Decompression(format!(
            "total decompressed length {} != expected {}",
            out.len(),
            expected_len
        )));
    }

    Ok(out)
}

fn compress_zlib(data: &[u8], level: u32) -> Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;

    let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::new(level));
    encoder.write_all(data).map_err(|e| RootError::Compression(format!("zlib: {}", e)))?;
    encoder.finish().map_err(|e| RootError::Compression(format!("zlib: {}", e)))
}

fn compress_lz4(data: &[u8]) -> Vec<u8> {
    let body = lz4_flex::compress(data);
    let mut out = Vec::with_capacity(LZ4_CHECKSUM_LEN + body.len());
    out.extend_from_slice(&xxh64(&body).to_be_bytes());
    out.extend_from_slice(&body);
    out
}

fn compress_zstd(data: &[u8]) -> Vec<u8> {
    ruzstd::encoding::compress_to_vec(data, ruzstd::encoding::CompressionLevel::Fastest)
}

fn compress_xz(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    lzma_rs::xz_compress(&mut std::io::BufReader::new(data), &mut out)
        .map_err(|e| RootError::Compression(format!("xz: {}", e)))?;
    Ok(out)
}

fn decompress_zlib(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    use flate2::read::ZlibDecoder;

    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::with_capacity(expected);
    decoder.read_to_end(&mut out).map_err(|e| RootError::Decompression(format!("zlib: {}", e)))?;
    Ok(out)
}

fn decompress_lz4(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    if data.len() < LZ4_CHECKSUM_LEN {
        return Err(RootError::Decompression("LZ4 block too small for checksum header".into()));
    }
    let (checksum, lz4_data) = data.split_at(LZ4_CHECKSUM_LEN);
    let mut stored = [0u8; LZ4_CHECKSUM_LEN];
    stored.copy_from_slice(checksum);
    if u64::from_be_bytes(stored) != xxh64(lz4_data) {
        return Err(RootError::Decompression("lz4: checksum mismatch".into()));
    }
    lz4_flex::decompress(lz4_data, expected)
        .map_err(|e| RootError::Decompression(format!("lz4: {}", e)))
}

fn decompress_zstd(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut out = vec![0u8; expected];
    let bytes_written = ZSTD_DECODER
        .with(|cell| cell.borrow_mut().decode_all(data, &mut out))
        .map_err(|e| RootError::Decompression(format!("zstd: {}", e)))?;

    if bytes_written != expected {
        return Err(RootError::Decompression(format!(
            "zstd: expected {} uncompressed bytes, got {}",
            expected, bytes_written
        )));
    }
    Ok(out)
}

fn decompress_xz(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut input = std::io::BufReader::new(data);
    let mut out = Vec::with_capacity(expected);
    lzma_rs::xz_decompress(&mut input, &mut out)
        .map_err(|e| RootError::Decompression(format!("xz: {}", e)))?;
    Ok(out)
}

fn xxh64(data: &[u8]) -> u64 {
    let mut hasher = twox_hash::XxHash64::with_seed(0);
    hasher.write(data);
    hasher.finish()
}

/// Read a 3-byte little-endian unsigned integer.
fn read_le24(b: &[u8]) -> usize {
    b[0] as usize | ((b[1] as usize) << 8) | ((b[2] as usize) << 16)
}

fn write_le24(out: &mut Vec<u8>, v: usize) {
    out.push((v & 0xFF) as u8);
    out.push(((v >> 8) & 0xFF) as u8);
    out.push(((v >> 16) & 0xFF) as u8);
}
