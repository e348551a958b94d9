//! The framing state machine.
//!
//! Consumes an arbitrarily chunked byte stream and lifts complete
//! `[u32 BE length][BlobHeader][Blob]` units off it:
//! - `AwaitLength`: need 4 bytes, the header length
//! - `AwaitHeader`: need that many bytes, decoded into a `BlobHeader`
//! - `AwaitPayload`: need `datasize` bytes, decoded into a `Blob`
//!
//! Unconsumed bytes stay buffered between calls, and every satisfied
//! state immediately retries on the remainder, so one `feed` can yield
//! any number of blobs.

use bytes::{Buf, BytesMut};
use log::trace;

use crate::codec::blob::header::{Blob, BlobHeader};
use crate::codec::blob::item::RawBlob;
use crate::codec::config::DecoderConfig;
use crate::codec::consts::HEADER_LEN_SIZE;
use crate::codec::error::{CodecError, Result};
use crate::codec::wire::WireMessage;

#[derive(Debug, Clone)]
enum State {
    AwaitLength,
    AwaitHeader { len: usize },
    AwaitPayload { header: BlobHeader, len: usize },
}

pub struct FramedBlobReader {
    buffer: BytesMut,
    state: State,
    /// Stream position of `buffer[0]`.
    position: u64,
    /// Stream position of the current unit's length prefix.
    unit_offset: u64,
    max_header_size: usize,
    max_blob_size: usize,
}

impl FramedBlobReader {
    pub fn new() -> Self {
        Self::with_config(&DecoderConfig::default())
    }

    pub fn with_config(config: &DecoderConfig) -> Self {
        FramedBlobReader {
            buffer: BytesMut::with_capacity(config.chunk_size),
            state: State::AwaitLength,
            position: 0,
            unit_offset: 0,
            max_header_size: config.max_header_size,
            max_blob_size: config.max_blob_size,
        }
    }

    /// Buffers `chunk` and returns every unit it completes.
    ///
    /// An error leaves the reader unusable; there is no resynchronisation.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<RawBlob>> {
        self.extend(chunk);

        let mut blobs = Vec::new();
        while let Some(blob) = self.next_blob()? {
            blobs.push(blob);
        }

        Ok(blobs)
    }

    /// Buffers `chunk` without extracting anything.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Extracts the next complete unit, if the buffer holds one.
    pub fn next_blob(&mut self) -> Result<Option<RawBlob>> {
        loop {
            let needed = self.needed();
            if self.buffer.len() < needed {
                return Ok(None);
            }

            let state = std::mem::replace(&mut self.state, State::AwaitLength);
            self.state = match state {
                State::AwaitLength => {
                    self.unit_offset = self.position;
                    let len = self.buffer.get_u32() as usize;
                    self.position += HEADER_LEN_SIZE as u64;

                    if len > self.max_header_size {
                        return Err(self.framing(
                            "implausible BlobHeader length prefix",
                            self.max_header_size,
                            len,
                        ));
                    }

                    State::AwaitHeader { len }
                }
                State::AwaitHeader { len } => {
                    let header = BlobHeader::decode(self.take(len))?;
                    trace!(
                        "BlobHeader at {}: type={}, datasize={}",
                        self.unit_offset,
                        header.r#type,
                        header.datasize
                    );

                    let len = usize::try_from(header.datasize)
                        .ok()
                        .filter(|len| *len <= self.max_blob_size)
                        .ok_or_else(|| {
                            self.framing(
                                "implausible Blob datasize",
                                self.max_blob_size,
                                header.datasize.max(0) as usize,
                            )
                        })?;

                    State::AwaitPayload { header, len }
                }
                State::AwaitPayload { header, len } => {
                    let blob = Blob::decode(self.take(len))?;
                    return self.complete(header, blob).map(Some);
                }
            };
        }
    }

    /// Declares the end of input. Succeeds only when no unit is half read.
    pub fn finish(&self) -> Result<()> {
        match self.state {
            State::AwaitLength if self.buffer.is_empty() => Ok(()),
            _ => Err(self.framing(
                "input ended inside a frame",
                self.needed(),
                self.buffer.len(),
            )),
        }
    }

    /// Bytes buffered but not yet consumed by a completed state.
    #[inline]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Total bytes consumed from the stream so far.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Drops buffered bytes and returns to `AwaitLength` at offset zero.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = State::AwaitLength;
        self.position = 0;
        self.unit_offset = 0;
    }

    #[inline]
    fn needed(&self) -> usize {
        match &self.state {
            State::AwaitLength => HEADER_LEN_SIZE,
            State::AwaitHeader { len } => *len,
            State::AwaitPayload { len, .. } => *len,
        }
    }

    #[inline]
    fn take(&mut self, len: usize) -> bytes::Bytes {
        self.position += len as u64;
        self.buffer.split_to(len).freeze()
    }

    fn complete(&self, header: BlobHeader, blob: Blob) -> Result<RawBlob> {
        let found = blob.compression();
        let Some(zlib_data) = blob.zlib_data else {
            return Err(CodecError::UnsupportedCompression {
                offset: self.unit_offset,
                found,
            });
        };

        Ok(RawBlob {
            r#type: header.r#type.into(),
            offset: self.unit_offset,
            zlib_data,
            raw_size: blob.raw_size,
        })
    }

    fn framing(&self, reason: &'static str, expected: usize, actual: usize) -> CodecError {
        CodecError::Framing {
            offset: self.unit_offset,
            expected,
            actual,
            reason,
        }
    }
}

impl Default for FramedBlobReader {
    fn default() -> Self {
        Self::new()
    }
}
