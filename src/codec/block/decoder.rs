//! Turns inflated blobs into batches of elements.
//!
//! The decoder is stateful across one file: the `OSMHeader` unit decides
//! whether `visible` flags are surfaced for every later `OSMData` unit.

use std::ops::AddAssign;

use log::{debug, trace, warn};

use crate::codec::blob::{BlobType, DecodedBlob, RawBlob};
use crate::codec::block::decompress::decompress;
use crate::codec::block::model::{HeaderBlock, PrimitiveBlock, PrimitiveGroup};
use crate::codec::config::DecoderConfig;
use crate::codec::consts::{HISTORICAL_INFORMATION, MAX_BLOB_SIZE, NANO};
use crate::codec::element::{Element, Node, Relation, Way};
use crate::codec::error::Result;
use crate::codec::wire::WireMessage;

/// Scaling parameters of one `PrimitiveBlock`, already in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockOptions {
    pub lat_offset: f64,
    pub lon_offset: f64,
    pub granularity: f64,
    pub date_granularity: i64,
    pub historical: bool,
}

impl BlockOptions {
    pub fn from_block(block: &PrimitiveBlock, historical: bool) -> Self {
        BlockOptions {
            lat_offset: NANO * block.lat_offset.unwrap_or(0) as f64,
            lon_offset: NANO * block.lon_offset.unwrap_or(0) as f64,
            granularity: NANO * block.granularity() as f64,
            date_granularity: block.date_granularity() as i64,
            historical,
        }
    }

    #[inline]
    pub fn lat(&self, sum: i64) -> f64 {
        self.lat_offset + self.granularity * sum as f64
    }

    #[inline]
    pub fn lon(&self, sum: i64) -> f64 {
        self.lon_offset + self.granularity * sum as f64
    }

    /// Milliseconds since epoch.
    #[inline]
    pub fn timestamp(&self, sum: i64) -> i64 {
        self.date_granularity.wrapping_mul(sum)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockStats {
    pub nodes: usize,
    pub ways: usize,
    pub relations: usize,
    /// Non-dense `Node` messages, which are not decoded.
    pub skipped_nodes: usize,
    pub skipped_changesets: usize,
}

impl BlockStats {
    pub fn elements(&self) -> usize {
        self.nodes + self.ways + self.relations
    }
}

impl AddAssign for BlockStats {
    fn add_assign(&mut self, rhs: Self) {
        self.nodes += rhs.nodes;
        self.ways += rhs.ways;
        self.relations += rhs.relations;
        self.skipped_nodes += rhs.skipped_nodes;
        self.skipped_changesets += rhs.skipped_changesets;
    }
}

/// The elements of one `OSMData` unit, in wire order.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Stream position of the unit the batch was decoded from.
    pub offset: u64,
    pub elements: Vec<Element>,
    pub stats: BlockStats,
}

#[derive(Debug)]
pub struct BlockDecoder {
    header: Option<HeaderBlock>,
    totals: BlockStats,
    max_blob_size: usize,
}

impl Default for BlockDecoder {
    fn default() -> Self {
        BlockDecoder {
            header: None,
            totals: BlockStats::default(),
            max_blob_size: MAX_BLOB_SIZE,
        }
    }
}

impl BlockDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps inflated payloads at `config.max_blob_size`, the same limit
    /// the framer applies to `datasize`.
    pub fn with_config(config: &DecoderConfig) -> Self {
        BlockDecoder {
            max_blob_size: config.max_blob_size,
            ..Self::default()
        }
    }

    /// Forgets the file header and totals, for reuse on a new stream.
    pub fn reset(&mut self) {
        self.header = None;
        self.totals = BlockStats::default();
    }

    pub fn max_blob_size(&self) -> usize {
        self.max_blob_size
    }

    pub fn header(&self) -> Option<&HeaderBlock> {
        self.header.as_ref()
    }

    /// Whether the file declared `HistoricalInformation`. False until a
    /// header has been seen.
    pub fn historical(&self) -> bool {
        self.header
            .as_ref()
            .is_some_and(|header| header.requires(HISTORICAL_INFORMATION))
    }

    /// Running totals over every block decoded so far.
    pub fn totals(&self) -> BlockStats {
        self.totals
    }

    /// Inflates and decodes a framed unit. Units of unknown type are
    /// dropped before inflation.
    pub fn process(&mut self, blob: RawBlob) -> Result<Option<Batch>> {
        if let BlobType::Unknown(other) = &blob.r#type {
            skip_unknown(other, blob.offset);
            return Ok(None);
        }

        self.decode(decompress(blob, self.max_blob_size)?)
    }

    /// Decodes an inflated unit. Returns a batch only for `OSMData`
    /// units that produced at least one element.
    pub fn decode(&mut self, blob: DecodedBlob) -> Result<Option<Batch>> {
        match &blob.r#type {
            BlobType::OsmHeader => {
                let header = HeaderBlock::decode(blob.data)?;
                debug!(
                    "File header at {}: required={:?}, optional={:?}",
                    blob.offset, header.required_features, header.optional_features
                );

                self.header = Some(header);
                Ok(None)
            }
            BlobType::OsmData => {
                let block = PrimitiveBlock::decode(blob.data)?;
                let (elements, stats) = self.decode_block(&block)?;
                self.totals += stats;

                trace!(
                    "Decoded block at {}: {} elements from {} groups",
                    blob.offset,
                    elements.len(),
                    block.primitivegroup.len()
                );

                Ok((!elements.is_empty()).then_some(Batch {
                    offset: blob.offset,
                    elements,
                    stats,
                }))
            }
            BlobType::Unknown(other) => {
                skip_unknown(other, blob.offset);
                Ok(None)
            }
        }
    }

    fn decode_block(&self, block: &PrimitiveBlock) -> Result<(Vec<Element>, BlockStats)> {
        let options = BlockOptions::from_block(block, self.historical());

        if block.lat_offset.is_some() || block.lon_offset.is_some() || block.granularity.is_some() {
            debug!(
                "Block scaling: +Lat={:?}, +Lon={:?}, Granularity={}",
                block.lat_offset,
                block.lon_offset,
                block.granularity()
            );
        }

        let mut elements = Vec::new();
        let mut stats = BlockStats::default();

        for group in &block.primitivegroup {
            decode_group(group, block, &options, &mut elements, &mut stats)?;
        }

        Ok((elements, stats))
    }
}

/// Appends a group's elements in wire order: dense nodes, then ways,
/// then relations.
fn decode_group(
    group: &PrimitiveGroup,
    block: &PrimitiveBlock,
    options: &BlockOptions,
    elements: &mut Vec<Element>,
    stats: &mut BlockStats,
) -> Result<()> {
    let table = &block.stringtable;

    if let Some(dense) = &group.dense {
        let nodes = Node::from_dense(dense, table, options)?;
        stats.nodes += nodes.len();
        elements.extend(nodes.into_iter().map(Element::Node));
    }

    for way in &group.ways {
        elements.push(Element::Way(Way::from_raw(way, table, options)?));
    }
    stats.ways += group.ways.len();

    for relation in &group.relations {
        elements.push(Element::Relation(Relation::from_raw(relation, table, options)?));
    }
    stats.relations += group.relations.len();

    if group.nodes > 0 {
        warn!("{} unimplemented nodes", group.nodes);
        stats.skipped_nodes += group.nodes;
    }

    if group.changesets > 0 {
        warn!("{} unimplemented changesets", group.changesets);
        stats.skipped_changesets += group.changesets;
    }

    Ok(())
}

fn skip_unknown(blob_type: &str, offset: u64) {
    warn!("Skipping blob of unknown type {blob_type:?} at offset {offset}");
}
