//! Compression framing detection for `.ga2` payloads.
//!
//! The entire save file is one compressed stream, but the writer's exact
//! parameters are unknown: some saves carry a zlib wrapper, others are bare
//! deflate with no header or checksum. The only robust way to recover the
//! framing is to probe a fixed list of strategies and remember which one
//! succeeded, so the rewritten file can be re-encoded the same way.

use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::{DeflateEncoder, ZlibEncoder};
use serde::{Deserialize, Serialize};

use crate::error::UnrecognizedFraming;

/// The framing variant a save file was decompressed with. Determined once at
/// load and immutable afterward; write-back must use the same variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionFraming {
    /// zlib wrapper, decoder-default window.
    ZlibDefault,
    /// zlib wrapper, explicit 15-bit window.
    ZlibWindow15,
    /// Headerless deflate, no checksum trailer.
    RawDeflate,
}

impl CompressionFraming {
    /// Probe order. First success wins; the list is never extended at runtime.
    pub const PROBE_ORDER: [CompressionFraming; 3] = [
        CompressionFraming::ZlibDefault,
        CompressionFraming::ZlibWindow15,
        CompressionFraming::RawDeflate,
    ];

    /// Window-bits parameter in the zlib `wbits` convention the original
    /// writer used (negative means headerless).
    pub fn window_bits(self) -> i8 {
        match self {
            CompressionFraming::ZlibDefault | CompressionFraming::ZlibWindow15 => 15,
            CompressionFraming::RawDeflate => -15,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CompressionFraming::ZlibDefault => "zlib",
            CompressionFraming::ZlibWindow15 => "zlib-15",
            CompressionFraming::RawDeflate => "raw-deflate",
        }
    }

    fn decompress(self, raw: &[u8]) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        match self {
            CompressionFraming::ZlibDefault | CompressionFraming::ZlibWindow15 => {
                ZlibDecoder::new(raw).read_to_end(&mut out)?;
            }
            CompressionFraming::RawDeflate => {
                DeflateDecoder::new(raw).read_to_end(&mut out)?;
            }
        }
        Ok(out)
    }
}

/// Tries each framing variant in [`CompressionFraming::PROBE_ORDER`] and
/// returns the first buffer that decompresses cleanly, together with the
/// variant that produced it.
///
/// A strategy only counts as a success if it yields non-empty output; an
/// empty payload decompressing to nothing tells us nothing about the framing.
pub fn detect_and_decompress(
    raw: &[u8],
) -> Result<(Vec<u8>, CompressionFraming), UnrecognizedFraming> {
    for framing in CompressionFraming::PROBE_ORDER {
        match framing.decompress(raw) {
            Ok(buffer) if !buffer.is_empty() => return Ok((buffer, framing)),
            Ok(_) | Err(_) => continue,
        }
    }
    Err(UnrecognizedFraming)
}

/// Re-encodes `buffer` with the same framing the file was detected with.
///
/// Output is not required to bit-match the original compressed bytes, only to
/// decompress to identical content; level is pinned to best so repeated saves
/// of the same buffer are deterministic.
pub fn recompress(buffer: &[u8], framing: CompressionFraming) -> io::Result<Vec<u8>> {
    match framing {
        CompressionFraming::ZlibDefault | CompressionFraming::ZlibWindow15 => {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
            encoder.write_all(buffer)?;
            encoder.finish()
        }
        CompressionFraming::RawDeflate => {
            // DeflateEncoder emits headerless deflate directly, matching what
            // the game's reader expects for this variant.
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
            encoder.write_all(buffer)?;
            encoder.finish()
        }
    }
}
