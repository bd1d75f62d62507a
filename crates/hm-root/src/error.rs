//! Error types for histogram objects and container I/O.

use thiserror::Error;

/// Errors raised by histogram operations and container reads/writes.
#[derive(Error, Debug)]
pub enum RootError {
    /// I/O error reading or writing the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid container magic bytes.
    #[error("not a histogram container (bad magic)")]
    BadMagic,

    /// Unsupported container format version.
    #[error("unsupported container version: {0}")]
    UnsupportedVersion(u32),

    /// Buffer underflow (tried to read past end).
    #[error("unexpected end of buffer at offset {offset}, need {need} bytes, have {have}")]
    BufferUnderflow {
        /// Current offset in buffer.
        offset: usize,
        /// Bytes requested.
        need: usize,
        /// Bytes remaining.
        have: usize,
    },

    /// Key not found in directory.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Stored object class that cannot be decoded into a histogram.
    #[error("unsupported class: {0}")]
    UnsupportedClass(String),

    /// Decompression failure.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// Compression failure while writing.
    #[error("compression error: {0}")]
    Compression(String),

    /// Object deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Object or record could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Operation incompatible with the object's kind (e.g. a 2-D fill on a 1-D histogram).
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Malformed binning: zero bins, empty range, non-increasing edges.
    #[error("invalid binning: {0}")]
    InvalidBinning(String),

    /// Bin index outside the histogram's cell range (including under/overflow).
    #[error("bin {bin} out of range (histogram has {n_cells} cells)")]
    BinOutOfRange {
        /// Requested global bin index.
        bin: usize,
        /// Number of addressable cells.
        n_cells: usize,
    },

    /// 2-D cell index outside the histogram's `(x, y)` cell grid.
    #[error("cell ({i}, {j}) out of range (grid is {nx_cells} x {ny_cells})")]
    CellOutOfRange {
        /// Requested x bin.
        i: usize,
        /// Requested y bin.
        j: usize,
        /// Number of x cells including under/overflow.
        nx_cells: usize,
        /// Number of y cells including under/overflow.
        ny_cells: usize,
    },
}

/// Result alias for histogram and container operations.
pub type Result<T> = std::result::Result<T, RootError>;
