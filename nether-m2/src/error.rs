//! Error types for M2 model decoding

use std::io;

/// Errors that abort an M2 load.
///
/// Recoverable conditions (missing `.anim` companions, out-of-window
/// indices, count mismatches) are logged through `tracing` instead.
#[derive(Debug, thiserror::Error)]
pub enum M2Error {
    /// Stream is too small to hold the fixed header
    #[error("file too small to be a valid M2 model ({0} bytes)")]
    TooSmall(usize),

    /// Magic bytes are not "MD20"
    #[error("invalid magic bytes {0:?} (expected 'MD20')")]
    InvalidMagic([u8; 4]),

    /// Version scalar outside the legacy and modern ranges
    #[error("unsupported M2 version: 0x{0:X}")]
    UnsupportedVersion(u32),

    /// A typed read ran past the end of the stream
    #[error("unexpected end of stream at offset 0x{0:X}")]
    UnexpectedEof(usize),

    /// A chunk reference points outside its stream
    #[error(
        "corrupt chunk reference: {count} x {element_size} bytes at 0x{offset:X} exceeds stream length {stream_len}"
    )]
    CorruptChunk {
        count: u32,
        offset: u32,
        element_size: usize,
        stream_len: usize,
    },

    /// Submesh geometry references data outside the view buffers
    #[error("corrupt view: submesh {submesh}: {reason}")]
    CorruptView { submesh: usize, reason: String },

    /// Companion skin file for a modern model could not be opened
    #[error("companion skin file '{name}' unavailable: {source}")]
    MissingSkin {
        name: String,
        #[source]
        source: io::Error,
    },

    /// I/O error on the primary stream
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Loader configuration could not be parsed
    #[error("invalid loader configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, M2Error>;
