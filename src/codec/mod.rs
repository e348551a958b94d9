pub mod blob;
pub mod block;
pub mod config;
pub mod consts;
pub mod element;
pub mod error;
pub mod stream;
pub mod wire;

#[cfg(feature = "tokio")]
pub mod channel;

#[cfg(any(test, feature = "fixtures"))]
#[doc(hidden)]
pub mod test;

pub use blob::{BlobEncoder, BlobType, BlobWriter, FramedBlobReader, RawBlob};
pub use block::{Batch, BlockDecoder, BlockStats};
pub use config::DecoderConfig;
pub use element::{Element, Kind};
pub use error::{CodecError, Result};
pub use stream::{decode_files, decode_reader, BatchSink, DecodeSummary, ElementStream};

#[cfg(feature = "tokio")]
pub use channel::decode_async;
