//! The `BlobHeader` and `Blob` envelope messages.
//!
//! ```protobuf
//! message BlobHeader {
//!   required string type = 1;
//!   optional bytes indexdata = 2;
//!   required int32 datasize = 3;
//! }
//!
//! message Blob {
//!   optional bytes raw = 1;
//!   optional int32 raw_size = 2;
//!   optional bytes zlib_data = 3;
//!   optional bytes lzma_data = 4;
//!   optional bytes OBSOLETE_bzip2_data = 5;
//! }
//! ```

use bytes::{BufMut, Bytes};

use crate::codec::error::{CodecError, Result};
use crate::codec::wire::{
    bytes_field_len, put_bytes_field, put_varint_field, varint_field_len, WireMessage, WireReader,
    WireType,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobHeader {
    pub r#type: String,
    pub indexdata: Option<Bytes>,
    pub datasize: i32,
}

impl BlobHeader {
    const NAME: &'static str = "BlobHeader";

    pub fn new(r#type: impl Into<String>, datasize: i32) -> Self {
        BlobHeader {
            r#type: r#type.into(),
            indexdata: None,
            datasize,
        }
    }

    /// Decodes the header, failing if `type` or `datasize` is absent.
    pub fn decode(buf: Bytes) -> Result<Self> {
        let mut reader = WireReader::new(Self::NAME, buf);
        let mut r#type = None;
        let mut indexdata = None;
        let mut datasize = None;

        while reader.has_remaining() {
            let (tag, wire_type) = reader.read_key()?;
            match tag {
                1 => {
                    reader.expect(tag, wire_type, WireType::LengthDelimited)?;
                    r#type = Some(reader.read_string()?);
                }
                2 => {
                    reader.expect(tag, wire_type, WireType::LengthDelimited)?;
                    indexdata = Some(reader.read_bytes()?);
                }
                3 => {
                    reader.expect(tag, wire_type, WireType::Varint)?;
                    datasize = Some(reader.read_int32()?);
                }
                _ => reader.skip(tag, wire_type)?,
            }
        }

        match (r#type, datasize) {
            (Some(r#type), Some(datasize)) => Ok(BlobHeader {
                r#type,
                indexdata,
                datasize,
            }),
            (None, _) => Err(CodecError::malformed(Self::NAME, "missing required field `type`")),
            (_, None) => Err(CodecError::malformed(
                Self::NAME,
                "missing required field `datasize`",
            )),
        }
    }

    pub fn encode(&self, buf: &mut impl BufMut) {
        put_bytes_field(1, self.r#type.as_bytes(), buf);
        if let Some(indexdata) = &self.indexdata {
            put_bytes_field(2, indexdata, buf);
        }
        put_varint_field(3, self.datasize as i64 as u64, buf);
    }

    pub fn encoded_len(&self) -> usize {
        bytes_field_len(1, self.r#type.len())
            + self
                .indexdata
                .as_ref()
                .map_or(0, |indexdata| bytes_field_len(2, indexdata.len()))
            + varint_field_len(3, self.datasize as i64 as u64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob {
    pub raw: Option<Bytes>,
    pub raw_size: Option<i32>,
    pub zlib_data: Option<Bytes>,
    pub lzma_data: Option<Bytes>,
    pub obsolete_bzip2_data: Option<Bytes>,
}

impl WireMessage for Blob {
    const NAME: &'static str = "Blob";

    fn merge_field(&mut self, tag: u32, wire_type: WireType, reader: &mut WireReader) -> Result<()> {
        let slot = match tag {
            1 => &mut self.raw,
            2 => {
                reader.expect(tag, wire_type, WireType::Varint)?;
                self.raw_size = Some(reader.read_int32()?);
                return Ok(());
            }
            3 => &mut self.zlib_data,
            4 => &mut self.lzma_data,
            5 => &mut self.obsolete_bzip2_data,
            _ => return reader.skip(tag, wire_type),
        };

        reader.expect(tag, wire_type, WireType::LengthDelimited)?;
        *slot = Some(reader.read_bytes()?);
        Ok(())
    }
}

impl Blob {
    /// A blob holding only zlib data, as the encoder writes it.
    pub fn zlib(zlib_data: Bytes) -> Self {
        Blob {
            zlib_data: Some(zlib_data),
            ..Blob::default()
        }
    }

    /// Names the payload field actually present, for diagnostics.
    pub fn compression(&self) -> &'static str {
        if self.zlib_data.is_some() {
            "zlib_data"
        } else if self.raw.is_some() {
            "raw"
        } else if self.lzma_data.is_some() {
            "lzma_data"
        } else if self.obsolete_bzip2_data.is_some() {
            "OBSOLETE_bzip2_data"
        } else {
            "no data"
        }
    }

    pub fn encode(&self, buf: &mut impl BufMut) {
        if let Some(raw) = &self.raw {
            put_bytes_field(1, raw, buf);
        }
        if let Some(raw_size) = self.raw_size {
            put_varint_field(2, raw_size as i64 as u64, buf);
        }
        for (tag, data) in [
            (3, &self.zlib_data),
            (4, &self.lzma_data),
            (5, &self.obsolete_bzip2_data),
        ] {
            if let Some(data) = data {
                put_bytes_field(tag, data, buf);
            }
        }
    }

    pub fn encoded_len(&self) -> usize {
        let bytes_len = |tag, data: &Option<Bytes>| {
            data.as_ref()
                .map_or(0, |data| bytes_field_len(tag, data.len()))
        };

        bytes_len(1, &self.raw)
            + self
                .raw_size
                .map_or(0, |raw_size| varint_field_len(2, raw_size as i64 as u64))
            + bytes_len(3, &self.zlib_data)
            + bytes_len(4, &self.lzma_data)
            + bytes_len(5, &self.obsolete_bzip2_data)
    }
}
