//! End-to-end decoding over `std::io::Read`

pub mod pipeline;
pub mod sink;

#[doc(hidden)]
mod test;

#[doc(inline)]
pub use pipeline::{decode_files, decode_reader, DecodeSummary, ElementStream, FileSummary, StreamSummary};
#[doc(inline)]
pub use sink::BatchSink;
