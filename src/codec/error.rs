//! The closed set of failures the codec can raise.
//!
//! Every variant is fatal for the file being decoded. Skipped groups
//! (non-dense nodes, changesets) are not errors; they are logged and
//! counted in [`BlockStats`](crate::codec::block::BlockStats).

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    /// The byte stream does not frame into `[len][BlobHeader][Blob]` units.
    #[error("framing error at offset {offset}: {reason} (expected {expected} bytes, have {actual})")]
    Framing {
        offset: u64,
        expected: usize,
        actual: usize,
        reason: &'static str,
    },

    /// A message could not be decoded, or violates a structural invariant.
    #[error("malformed {message}: {reason}")]
    MalformedMessage {
        message: &'static str,
        reason: String,
    },

    /// The blob carries raw, lzma or bzip2 data instead of zlib data.
    #[error("unsupported compression in blob at offset {offset}: found {found}")]
    UnsupportedCompression { offset: u64, found: &'static str },

    #[error("failed to inflate blob at offset {offset}: {source}")]
    Decompression {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The consumer refused a batch.
    #[error("sink rejected batch: {0}")]
    Sink(String),
}

impl CodecError {
    #[inline]
    pub(crate) fn malformed(message: &'static str, reason: impl Into<String>) -> Self {
        CodecError::MalformedMessage {
            message,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
