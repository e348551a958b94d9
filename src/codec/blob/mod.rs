//! Blob framing: the envelope codec, the streaming reader and the encoder

pub mod encoder;
pub mod header;
pub mod item;
pub mod reader;

#[doc(hidden)]
mod test;

#[doc(inline)]
pub use encoder::{BlobEncoder, BlobWriter};
#[doc(inline)]
pub use header::{Blob, BlobHeader};
#[doc(inline)]
pub use item::{BlobType, DecodedBlob, RawBlob};
#[doc(inline)]
pub use reader::FramedBlobReader;
