//! Error types for the save codec.
//!
//! Load-time structural failures abort the whole load; per-record anomalies
//! degrade to skipped records; per-field validation failures reject only the
//! offending write and leave the buffer untouched.

use thiserror::Error;

/// No decompression strategy accepted the payload. Fatal at load; the probe
/// list is fixed, so there is nothing further to retry.
#[derive(Debug, Error)]
#[error(
    "unrecognized compression framing: none of zlib (default), zlib (15-bit window), raw deflate \
     decompressed the payload"
)]
pub struct UnrecognizedFraming;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    UnrecognizedFraming(#[from] UnrecognizedFraming),

    /// The payload decompressed but contained no player marker, which usually
    /// means the file is not a skirmish save.
    #[error("no player records found in {decompressed_len} bytes of decompressed save data")]
    NoPlayersFound { decompressed_len: usize },
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("player index {index} out of range, save has {count} players")]
    UnknownPlayer { index: usize, count: usize },

    #[error("{resource} value {value} out of range, expected a finite value between 0 and {max}")]
    OutOfRangeValue {
        resource: &'static str,
        value: f32,
        max: f32,
    },
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("recompression failed: {0}")]
    RecompressionFailed(#[source] std::io::Error),
}
