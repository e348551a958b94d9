//! The synchronous pipeline: bytes in, batches out, in stream order.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::codec::blob::FramedBlobReader;
use crate::codec::block::{Batch, BlockDecoder, BlockStats};
use crate::codec::config::DecoderConfig;
use crate::codec::error::Result;
use crate::codec::stream::sink::BatchSink;

/// Counters for one decoded stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Framed units, of any type.
    pub blobs: usize,
    /// Non-empty `OSMData` units delivered.
    pub batches: usize,
    /// Bytes consumed from the input.
    pub bytes: u64,
    pub stats: BlockStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub path: PathBuf,
    pub summary: StreamSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeSummary {
    pub files: Vec<FileSummary>,
}

impl DecodeSummary {
    pub fn totals(&self) -> BlockStats {
        self.files.iter().fold(BlockStats::default(), |mut acc, file| {
            acc += file.summary.stats;
            acc
        })
    }
}

/// Pulls fixed-size chunks from `R` and yields one [`Batch`] per
/// non-empty `OSMData` unit.
///
/// Batches decoded before a failure are still delivered; the failure is
/// yielded last and the iterator is fused afterwards. End of input is
/// clean only when no partial unit is buffered.
pub struct ElementStream<R: Read> {
    reader: R,
    framer: FramedBlobReader,
    decoder: BlockDecoder,
    chunk: Vec<u8>,
    blobs: usize,
    batches: usize,
    done: bool,
}

impl<R: Read> ElementStream<R> {
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, &DecoderConfig::default())
    }

    pub fn with_config(reader: R, config: &DecoderConfig) -> Self {
        ElementStream {
            reader,
            framer: FramedBlobReader::with_config(config),
            decoder: BlockDecoder::with_config(config),
            chunk: vec![0; config.chunk_size.max(1)],
            blobs: 0,
            batches: 0,
            done: false,
        }
    }

    pub fn decoder(&self) -> &BlockDecoder {
        &self.decoder
    }

    pub fn summary(&self) -> StreamSummary {
        StreamSummary {
            blobs: self.blobs,
            batches: self.batches,
            bytes: self.framer.position(),
            stats: self.decoder.totals(),
        }
    }

    /// Feeds every batch into `sink`, stopping at the first error.
    pub fn drain<S: BatchSink + ?Sized>(mut self, sink: &mut S) -> Result<StreamSummary> {
        while let Some(batch) = self.next() {
            sink.accept(batch?)?;
        }

        Ok(self.summary())
    }

    fn advance(&mut self) -> Result<Option<Batch>> {
        loop {
            while let Some(blob) = self.framer.next_blob()? {
                self.blobs += 1;
                if let Some(batch) = self.decoder.process(blob)? {
                    self.batches += 1;
                    return Ok(Some(batch));
                }
            }

            let read = match self.reader.read(&mut self.chunk) {
                Ok(read) => read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };

            if read == 0 {
                self.framer.finish()?;
                return Ok(None);
            }

            self.framer.extend(&self.chunk[..read]);
        }
    }
}

impl<R: Read> Iterator for ElementStream<R> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.advance() {
            Ok(Some(batch)) => Some(Ok(batch)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<R: Read> FusedIterator for ElementStream<R> {}

/// Decodes one stream into `sink`.
pub fn decode_reader<R: Read, S: BatchSink + ?Sized>(
    reader: R,
    config: &DecoderConfig,
    sink: &mut S,
) -> Result<StreamSummary> {
    ElementStream::with_config(reader, config).drain(sink)
}

/// Decodes each file in turn, with fresh framing and header state per
/// file. The first failure aborts the remaining files.
pub fn decode_files<P, S>(
    paths: impl IntoIterator<Item = P>,
    config: &DecoderConfig,
    sink: &mut S,
) -> Result<DecodeSummary>
where
    P: AsRef<Path>,
    S: BatchSink + ?Sized,
{
    let mut summary = DecodeSummary::default();

    for path in paths {
        let path = path.as_ref();
        debug!("Decoding {}", path.display());

        let file = File::open(path)?;
        let stream = decode_reader(file, config, sink)?;

        info!(
            "Decoded {}: {} blobs, {} batches, {} elements",
            path.display(),
            stream.blobs,
            stream.batches,
            stream.stats.elements()
        );

        summary.files.push(FileSummary {
            path: path.to_path_buf(),
            summary: stream,
        });
    }

    Ok(summary)
}
