#![cfg(test)]

use std::io::{Read, Write};

use bytes::Bytes;

use crate::codec::blob::{Blob, BlobType};
use crate::codec::block::model::{DenseInfo, DenseNodes, PrimitiveBlock, PrimitiveGroup, Relation, Way};
use crate::codec::block::Batch;
use crate::codec::config::DecoderConfig;
use crate::codec::consts::HISTORICAL_INFORMATION;
use crate::codec::element::{Element, Kind};
use crate::codec::error::{CodecError, Result};
use crate::codec::stream::{decode_files, decode_reader, ElementStream};
use crate::codec::test::fixture;

fn nodes_block(first_id: i64, count: usize, visible: bool) -> PrimitiveBlock {
    let mut id = vec![1; count];
    id[0] = first_id;

    PrimitiveBlock {
        stringtable: fixture::table(&["name", "x"]),
        primitivegroup: vec![PrimitiveGroup {
            dense: Some(DenseNodes {
                id,
                lat: vec![10; count],
                lon: vec![-10; count],
                keys_vals: (0..count).flat_map(|_| [1, 2, 0]).collect(),
                denseinfo: Some(DenseInfo {
                    version: vec![1; count],
                    timestamp: vec![1; count],
                    changeset: vec![1; count],
                    uid: vec![0; count],
                    user_sid: vec![0; count],
                    visible: vec![visible; count],
                }),
            }),
            ..PrimitiveGroup::default()
        }],
        ..PrimitiveBlock::default()
    }
}

fn ways_block() -> PrimitiveBlock {
    PrimitiveBlock {
        stringtable: fixture::table(&["highway", "residential", "outer"]),
        primitivegroup: vec![PrimitiveGroup {
            ways: vec![Way {
                id: 42,
                keys: vec![1],
                vals: vec![2],
                refs: vec![100, 5, -3],
                ..Way::default()
            }],
            relations: vec![Relation {
                id: 9,
                roles_sid: vec![3],
                memids: vec![42],
                types: vec![1],
                ..Relation::default()
            }],
            ..PrimitiveGroup::default()
        }],
        ..PrimitiveBlock::default()
    }
}

fn skipped_block() -> PrimitiveBlock {
    PrimitiveBlock {
        primitivegroup: vec![PrimitiveGroup {
            nodes: 3,
            ..PrimitiveGroup::default()
        }],
        ..PrimitiveBlock::default()
    }
}

fn sample_file(required: &[&str]) -> Vec<u8> {
    fixture::file([
        fixture::header_unit(&fixture::header(required)),
        fixture::data_unit(&nodes_block(1, 3, true)),
        fixture::data_unit(&skipped_block()),
        fixture::unit("OSMIndex", b"opaque"),
        fixture::data_unit(&ways_block()),
    ])
}

fn collect(bytes: &[u8], config: &DecoderConfig) -> Vec<Batch> {
    ElementStream::with_config(bytes, config)
        .collect::<Result<Vec<_>>>()
        .expect("stream decodes")
}

#[test_log::test]
fn batches_follow_block_order() {
    let bytes = sample_file(&[]);
    let mut stream = ElementStream::new(bytes.as_slice());

    let first = stream.next().unwrap().unwrap();
    let second = stream.next().unwrap().unwrap();
    assert!(stream.next().is_none());

    assert_eq!(first.elements.len(), 3);
    assert!(first.elements.iter().all(|e| e.kind() == Kind::Node));
    assert_eq!(
        first.elements.iter().map(Element::id).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(
        second.elements.iter().map(Element::kind).collect::<Vec<_>>(),
        vec![Kind::Way, Kind::Relation]
    );
    assert!(second.offset > first.offset);

    let summary = stream.summary();
    assert_eq!(summary.blobs, 5);
    assert_eq!(summary.batches, 2);
    assert_eq!(summary.bytes, bytes.len() as u64);
    assert_eq!(summary.stats.skipped_nodes, 3);
    assert_eq!(summary.stats.elements(), 5);
}

#[test_log::test]
fn chunking_does_not_change_the_output() {
    let bytes = sample_file(&[HISTORICAL_INFORMATION]);
    let expected = collect(&bytes, &DecoderConfig::default());

    for chunk_size in [1, 2, 3, 7, 64, 1000, bytes.len(), bytes.len() + 1] {
        let config = DecoderConfig::default().with_chunk_size(chunk_size);
        assert_eq!(collect(&bytes, &config), expected, "chunk size {chunk_size}");
    }
}

#[test_log::test]
fn every_split_offset_decodes_identically() {
    let bytes = sample_file(&[]);
    let expected = collect(&bytes, &DecoderConfig::default());

    for split in 0..=bytes.len() {
        let reader = (&bytes[..split]).chain(&bytes[split..]);
        let batches = ElementStream::new(reader)
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(batches, expected, "split at {split}");
    }
}

#[test_log::test]
fn earlier_batches_survive_a_later_failure() {
    let unsupported = Blob {
        lzma_data: Some(Bytes::from_static(b"xz")),
        ..Blob::default()
    };
    let bytes = fixture::file([
        fixture::data_unit(&ways_block()),
        fixture::frame(&BlobType::OsmData, &unsupported),
        fixture::data_unit(&ways_block()),
    ]);

    let mut stream = ElementStream::new(bytes.as_slice());
    assert!(stream.next().unwrap().is_ok());

    let err = stream.next().unwrap().unwrap_err();
    let offset = fixture::data_unit(&ways_block()).len() as u64;
    assert!(matches!(
        err,
        CodecError::UnsupportedCompression { offset: o, found: "lzma_data" } if o == offset
    ));

    assert!(stream.next().is_none());
}

#[test_log::test]
fn truncated_input_is_a_framing_error() {
    let bytes = sample_file(&[]);
    let truncated = &bytes[..bytes.len() - 1];

    let results = ElementStream::new(truncated).collect::<Vec<_>>();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(CodecError::Framing { .. })));
}

#[test_log::test]
fn empty_input_yields_nothing() {
    assert_eq!(ElementStream::new(&[0u8; 0][..]).count(), 0);
}

#[test_log::test]
fn sink_errors_stop_the_pipeline() {
    let bytes = sample_file(&[]);
    let mut seen = 0;

    let mut sink = |_: Batch| -> Result<()> {
        seen += 1;
        Err(CodecError::Sink("full".into()))
    };

    let err = decode_reader(bytes.as_slice(), &DecoderConfig::default(), &mut sink).unwrap_err();
    assert!(matches!(err, CodecError::Sink(reason) if reason == "full"));
    assert_eq!(seen, 1);
}

#[test_log::test]
fn files_do_not_share_header_state() {
    let dir = tempfile::tempdir().unwrap();
    let historical = dir.path().join("historical.osm.pbf");
    let plain = dir.path().join("plain.osm.pbf");

    std::fs::File::create(&historical)
        .unwrap()
        .write_all(&sample_file(&[HISTORICAL_INFORMATION]))
        .unwrap();

    // No header unit at all in the second file.
    std::fs::write(&plain, fixture::file([fixture::data_unit(&nodes_block(100, 2, true))])).unwrap();

    let mut elements: Vec<Element> = Vec::new();
    let summary = decode_files([&historical, &plain], &DecoderConfig::default(), &mut elements).unwrap();

    let visible = elements
        .iter()
        .filter(|e| e.kind() == Kind::Node)
        .map(|e| (e.id(), e.info().and_then(|info| info.visible)))
        .collect::<Vec<_>>();
    assert_eq!(
        visible,
        vec![
            (1, Some(true)),
            (2, Some(true)),
            (3, Some(true)),
            (100, None),
            (101, None),
        ]
    );

    assert_eq!(summary.files.len(), 2);
    assert_eq!(summary.files[0].path, historical);
    assert_eq!(summary.files[1].summary.blobs, 1);
    assert_eq!(summary.totals().nodes, 5);
}

#[test_log::test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut elements: Vec<Element> = Vec::new();

    let err = decode_files(
        [dir.path().join("absent.osm.pbf")],
        &DecoderConfig::default(),
        &mut elements,
    )
    .unwrap_err();
    assert!(matches!(err, CodecError::Io(_)));
}
