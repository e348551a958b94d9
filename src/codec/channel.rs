//! The asynchronous pipeline.
//!
//! A spawned task reads an `AsyncRead`, frames synchronously, inflates
//! each unit on the blocking pool and sends batches into a bounded
//! channel. The task suspends only on input, inflation and a full
//! channel, so a slow consumer holds back reading.

use std::io;

use log::{debug, trace};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::{spawn_blocking, JoinHandle};

use crate::codec::blob::{BlobType, DecodedBlob, FramedBlobReader, RawBlob};
use crate::codec::block::{decompress, Batch, BlockDecoder};
use crate::codec::config::DecoderConfig;
use crate::codec::error::{CodecError, Result};
use crate::codec::stream::StreamSummary;

/// Default number of batches buffered between the task and the consumer.
pub const DEFAULT_CAPACITY: usize = 1;

/// Spawns the decoding task.
///
/// Batches arrive in stream order. A failure is delivered as the last
/// message before the channel closes. Dropping the receiver stops the
/// task at its next send. The handle resolves to the counters of what
/// was decoded.
pub fn decode_async<R>(
    reader: R,
    config: DecoderConfig,
    capacity: usize,
) -> (mpsc::Receiver<Result<Batch>>, JoinHandle<StreamSummary>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));

    let handle = tokio::spawn(async move {
        let mut pump = Pump::new(&config);
        if let Err(err) = pump.run(reader, &tx).await {
            debug!("Async decode stopped: {err}");
            let _ = tx.send(Err(err)).await;
        }

        pump.summary
    });

    (rx, handle)
}

struct Pump {
    framer: FramedBlobReader,
    decoder: BlockDecoder,
    chunk: Vec<u8>,
    summary: StreamSummary,
}

impl Pump {
    fn new(config: &DecoderConfig) -> Self {
        Pump {
            framer: FramedBlobReader::with_config(config),
            decoder: BlockDecoder::with_config(config),
            chunk: vec![0; config.chunk_size.max(1)],
            summary: StreamSummary::default(),
        }
    }

    async fn run<R>(&mut self, mut reader: R, tx: &mpsc::Sender<Result<Batch>>) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            while let Some(blob) = self.framer.next_blob()? {
                self.summary.blobs += 1;

                let batch = match blob.r#type {
                    BlobType::Unknown(_) => self.decoder.process(blob)?,
                    _ => {
                        let decoded = inflate(blob, self.decoder.max_blob_size()).await?;
                        self.decoder.decode(decoded)?
                    }
                };

                self.summary.stats = self.decoder.totals();
                self.summary.bytes = self.framer.position();

                let Some(batch) = batch else {
                    continue;
                };

                self.summary.batches += 1;
                if tx.send(Ok(batch)).await.is_err() {
                    debug!("Receiver dropped, stopping after {} batches", self.summary.batches);
                    return Ok(());
                }
            }

            let read = reader.read(&mut self.chunk).await?;
            if read == 0 {
                self.framer.finish()?;
                self.summary.bytes = self.framer.position();
                return Ok(());
            }

            trace!("Read {read} bytes");
            self.framer.extend(&self.chunk[..read]);
        }
    }
}

async fn inflate(blob: RawBlob, max_size: usize) -> Result<DecodedBlob> {
    spawn_blocking(move || decompress(blob, max_size))
        .await
        .map_err(|err| CodecError::Io(io::Error::new(io::ErrorKind::Other, err)))?
}
