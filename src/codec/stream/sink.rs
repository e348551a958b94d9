use crate::codec::block::Batch;
use crate::codec::element::Element;
use crate::codec::error::Result;

/// The external consumer of decoded batches.
///
/// Returning an error stops the pipeline; it surfaces unchanged from
/// the decode call.
pub trait BatchSink {
    fn accept(&mut self, batch: Batch) -> Result<()>;
}

impl<F> BatchSink for F
where
    F: FnMut(Batch) -> Result<()>,
{
    #[inline]
    fn accept(&mut self, batch: Batch) -> Result<()> {
        self(batch)
    }
}

/// Collects every element, discarding batch boundaries.
impl BatchSink for Vec<Element> {
    #[inline]
    fn accept(&mut self, batch: Batch) -> Result<()> {
        self.extend(batch.elements);
        Ok(())
    }
}
