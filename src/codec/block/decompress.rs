//! Inflates the zlib payload of a framed blob.

use std::io::{self, Read};

use flate2::read::ZlibDecoder;
use log::trace;

use crate::codec::blob::{DecodedBlob, RawBlob};
use crate::codec::error::{CodecError, Result};

/// Inflates `blob.zlib_data` into the plain block bytes.
///
/// When the producer announced a `raw_size`, the buffer is sized up front
/// and the inflated length must match it exactly. Output longer than
/// `max_size` is rejected.
pub fn decompress(blob: RawBlob, max_size: usize) -> Result<DecodedBlob> {
    let RawBlob {
        r#type,
        offset,
        zlib_data,
        raw_size,
    } = blob;

    let capacity = raw_size
        .and_then(|size| usize::try_from(size).ok())
        .unwrap_or(zlib_data.len() * 4)
        .min(max_size);

    let mut data = Vec::with_capacity(capacity);
    ZlibDecoder::new(zlib_data.as_ref())
        .take(max_size as u64 + 1)
        .read_to_end(&mut data)
        .map_err(|source| CodecError::Decompression { offset, source })?;

    if data.len() > max_size {
        return Err(invalid(
            offset,
            format!("inflated payload exceeds {max_size} bytes"),
        ));
    }

    if let Some(size) = raw_size {
        if usize::try_from(size).map_or(true, |size| size != data.len()) {
            return Err(invalid(
                offset,
                format!("inflated {} bytes, header announced raw_size {size}", data.len()),
            ));
        }
    }

    trace!(
        "Inflated {} blob at {offset}: {} -> {} bytes",
        r#type,
        zlib_data.len(),
        data.len()
    );

    Ok(DecodedBlob {
        r#type,
        offset,
        data: data.into(),
    })
}

fn invalid(offset: u64, reason: String) -> CodecError {
    CodecError::Decompression {
        offset,
        source: io::Error::new(io::ErrorKind::InvalidData, reason),
    }
}
