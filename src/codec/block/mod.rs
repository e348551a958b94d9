//! Block decoding: inflation, the fixed block records and delta reconstruction

pub mod decoder;
pub mod decompress;
pub mod model;


#[doc(inline)]
pub use decoder::{Batch, BlockDecoder, BlockOptions, BlockStats};
#[doc(inline)]
pub use decompress::decompress;
#[doc(inline)]
pub use model::{HeaderBlock, PrimitiveBlock, StringTable};
