//! The write path: wraps `(type, zlib_data)` back into a framed unit.
//!
//! The round trip through [`FramedBlobReader`](super::FramedBlobReader)
//! reproduces `type` and `zlib_data`. `indexdata` and the source
//! offset are not carried.

use bytes::{BufMut, Bytes, BytesMut};
use log::trace;
use std::io::Write;

use crate::codec::blob::header::{Blob, BlobHeader};
use crate::codec::blob::item::{BlobType, RawBlob};
use crate::codec::consts::HEADER_LEN_SIZE;
use crate::codec::error::{CodecError, Result};

pub struct BlobEncoder;

impl BlobEncoder {
    /// Encodes one unit: `[u32 BE header length][BlobHeader][Blob]`.
    pub fn encode(blob_type: &BlobType, zlib_data: Bytes) -> Result<Bytes> {
        let mut out = BytesMut::new();
        Self::encode_into(blob_type, zlib_data, &mut out)?;
        Ok(out.freeze())
    }

    #[inline]
    pub fn encode_raw(blob: &RawBlob) -> Result<Bytes> {
        Self::encode(&blob.r#type, blob.zlib_data.clone())
    }

    /// Appends one unit to `out`, returning the number of bytes written.
    pub fn encode_into(blob_type: &BlobType, zlib_data: Bytes, out: &mut BytesMut) -> Result<usize> {
        let blob = Blob::zlib(zlib_data);
        let blob_len = blob.encoded_len();
        let datasize = i32::try_from(blob_len).map_err(|_| CodecError::Framing {
            offset: 0,
            expected: i32::MAX as usize,
            actual: blob_len,
            reason: "Blob too large for an int32 datasize",
        })?;

        let header = BlobHeader::new(blob_type.as_str(), datasize);
        let header_len = header.encoded_len();

        let total = HEADER_LEN_SIZE + header_len + blob_len;
        out.reserve(total);
        out.put_u32(header_len as u32);
        header.encode(out);
        blob.encode(out);

        trace!("Encoded {blob_type} unit: header={header_len}, datasize={datasize}");
        Ok(total)
    }
}

/// Writes encoded units to any `Write`, tracking unit offsets.
pub struct BlobWriter<W: Write> {
    inner: W,
    offset: u64,
    scratch: BytesMut,
}

impl<W: Write> BlobWriter<W> {
    pub fn new(inner: W) -> Self {
        BlobWriter {
            inner,
            offset: 0,
            scratch: BytesMut::new(),
        }
    }

    /// Writes one unit and returns the offset of its length prefix.
    pub fn write_blob(&mut self, blob_type: &BlobType, zlib_data: Bytes) -> Result<u64> {
        self.scratch.clear();
        let written = BlobEncoder::encode_into(blob_type, zlib_data, &mut self.scratch)?;
        self.inner.write_all(&self.scratch)?;

        let offset = self.offset;
        self.offset += written as u64;
        Ok(offset)
    }

    /// Bytes written so far.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn flush(&mut self) -> Result<()> {
        Ok(self.inner.flush()?)
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
