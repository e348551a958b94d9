//! Describes the `RawBlob`, one framed unit lifted off the byte stream,
//! and the `DecodedBlob` it becomes once inflated.

use bytes::Bytes;
use std::fmt::{Display, Formatter};

use crate::codec::consts::{OSM_DATA, OSM_HEADER};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlobType {
    OsmHeader,
    OsmData,
    Unknown(String),
}

impl BlobType {
    pub fn as_str(&self) -> &str {
        match self {
            BlobType::OsmHeader => OSM_HEADER,
            BlobType::OsmData => OSM_DATA,
            BlobType::Unknown(other) => other.as_str(),
        }
    }
}

impl From<&str> for BlobType {
    fn from(value: &str) -> Self {
        match value {
            OSM_HEADER => BlobType::OsmHeader,
            OSM_DATA => BlobType::OsmData,
            other => BlobType::Unknown(other.to_string()),
        }
    }
}

impl From<String> for BlobType {
    fn from(value: String) -> Self {
        match value.as_str() {
            OSM_HEADER => BlobType::OsmHeader,
            OSM_DATA => BlobType::OsmData,
            _ => BlobType::Unknown(value),
        }
    }
}

impl Display for BlobType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A framed unit whose payload is still zlib-compressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlob {
    pub r#type: BlobType,
    /// Stream position of the unit's 4-byte length prefix.
    pub offset: u64,
    pub zlib_data: Bytes,
    /// Inflated size announced by the producer, if any.
    pub raw_size: Option<i32>,
}

impl RawBlob {
    #[inline]
    pub fn new(r#type: impl Into<BlobType>, offset: u64, zlib_data: Bytes) -> Self {
        RawBlob {
            r#type: r#type.into(),
            offset,
            zlib_data,
            raw_size: None,
        }
    }
}

/// A unit whose payload holds the plain `HeaderBlock` or `PrimitiveBlock`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBlob {
    pub r#type: BlobType,
    pub offset: u64,
    pub data: Bytes,
}
