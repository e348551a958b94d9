#![cfg(test)]

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::blob::{Blob, BlobEncoder, BlobHeader, BlobType, BlobWriter, FramedBlobReader};
use crate::codec::config::DecoderConfig;
use crate::codec::error::CodecError;
use crate::codec::wire::{put_bytes_field, put_varint_field, WireMessage};

fn unit(blob_type: BlobType, payload: &'static [u8]) -> Bytes {
    BlobEncoder::encode(&blob_type, Bytes::from_static(payload)).expect("encodable")
}

fn stream() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&unit(BlobType::OsmHeader, b"header-payload"));
    bytes.extend_from_slice(&unit(BlobType::OsmData, b"first data payload"));
    bytes.extend_from_slice(&unit(BlobType::OsmData, &[0x80, 0x80, 0x01, 0x00]));
    bytes
}

/// Frames a `Blob` built by hand, so tests can omit `zlib_data`.
fn unit_with_blob(blob: &Blob) -> Vec<u8> {
    let header = BlobHeader::new("OSMData", blob.encoded_len() as i32);

    let mut out = BytesMut::new();
    out.put_u32(header.encoded_len() as u32);
    header.encode(&mut out);
    blob.encode(&mut out);
    out.to_vec()
}

#[test_log::test]
fn header_requires_type() {
    let mut buf = BytesMut::new();
    put_varint_field(3, 10, &mut buf);

    let err = BlobHeader::decode(buf.freeze()).unwrap_err();
    assert!(matches!(err, CodecError::MalformedMessage { message: "BlobHeader", .. }));
    assert!(err.to_string().contains("`type`"));
}

#[test_log::test]
fn header_requires_datasize() {
    let mut buf = BytesMut::new();
    put_bytes_field(1, b"OSMData", &mut buf);

    let err = BlobHeader::decode(buf.freeze()).unwrap_err();
    assert!(err.to_string().contains("`datasize`"));
}

#[test_log::test]
fn header_keeps_zero_datasize_and_skips_unknown_fields() {
    let mut buf = BytesMut::new();
    put_bytes_field(1, b"OSMData", &mut buf);
    put_bytes_field(2, b"index", &mut buf);
    put_varint_field(9, 1234, &mut buf);
    put_varint_field(3, 0, &mut buf);

    let header = BlobHeader::decode(buf.freeze()).unwrap();
    assert_eq!(header.r#type, "OSMData");
    assert_eq!(header.datasize, 0);
    assert_eq!(header.indexdata.as_deref(), Some(&b"index"[..]));
}

#[test_log::test]
fn blob_encoding_matches_its_length() {
    let blob = Blob {
        raw_size: Some(77),
        zlib_data: Some(Bytes::from_static(b"deflated")),
        ..Blob::default()
    };

    let mut buf = BytesMut::new();
    blob.encode(&mut buf);
    assert_eq!(buf.len(), blob.encoded_len());
    assert_eq!(Blob::decode(buf.freeze()).unwrap(), blob);
}

#[test_log::test]
fn encoder_round_trips_type_and_payload() {
    let payloads: [&[u8]; 4] = [b"", b"x", &[0u8; 300], &[0xFF, 0x80, 0x7F]];

    for payload in payloads {
        let encoded = BlobEncoder::encode(&BlobType::OsmData, Bytes::copy_from_slice(payload)).unwrap();

        let mut reader = FramedBlobReader::new();
        let blobs = reader.feed(&encoded).unwrap();
        reader.finish().unwrap();

        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].r#type, BlobType::OsmData);
        assert_eq!(blobs[0].zlib_data.as_ref(), payload);
        assert_eq!(blobs[0].offset, 0);
    }
}

#[test_log::test]
fn single_feed_yields_every_unit_with_prefix_offsets() {
    let bytes = stream();
    let first = unit(BlobType::OsmHeader, b"header-payload").len() as u64;
    let second = unit(BlobType::OsmData, b"first data payload").len() as u64;

    let mut reader = FramedBlobReader::new();
    let blobs = reader.feed(&bytes).unwrap();

    assert_eq!(blobs.len(), 3);
    assert_eq!(blobs[0].r#type, BlobType::OsmHeader);
    assert_eq!(
        blobs.iter().map(|b| b.offset).collect::<Vec<_>>(),
        vec![0, first, first + second]
    );
    assert_eq!(reader.position(), bytes.len() as u64);
    assert_eq!(reader.pending(), 0);
}

#[test_log::test]
fn every_split_offset_yields_the_same_units() {
    let bytes = stream();
    let expected = FramedBlobReader::new().feed(&bytes).unwrap();

    for split in 0..=bytes.len() {
        let mut reader = FramedBlobReader::new();
        let mut blobs = reader.feed(&bytes[..split]).unwrap();
        blobs.extend(reader.feed(&bytes[split..]).unwrap());
        reader.finish().unwrap();

        assert_eq!(blobs, expected, "split at {split}");
    }
}

#[test_log::test]
fn byte_at_a_time() {
    let bytes = stream();
    let mut reader = FramedBlobReader::new();

    let mut blobs = Vec::new();
    for byte in &bytes {
        blobs.extend(reader.feed(&[*byte]).unwrap());
    }

    reader.finish().unwrap();
    assert_eq!(blobs, FramedBlobReader::new().feed(&bytes).unwrap());
}

#[test_log::test]
fn missing_zlib_data_is_unsupported() {
    let blob = Blob {
        raw: Some(Bytes::from_static(b"uncompressed")),
        raw_size: Some(12),
        ..Blob::default()
    };

    let mut bytes = unit(BlobType::OsmHeader, b"fine").to_vec();
    let second_offset = bytes.len() as u64;
    bytes.extend_from_slice(&unit_with_blob(&blob));

    let mut reader = FramedBlobReader::new();
    reader.extend(&bytes);
    assert!(reader.next_blob().unwrap().is_some());

    match reader.next_blob() {
        Err(CodecError::UnsupportedCompression { offset, found }) => {
            assert_eq!(offset, second_offset);
            assert_eq!(found, "raw");
        }
        other => panic!("expected UnsupportedCompression, got {other:?}"),
    }
}

#[test_log::test]
fn truncated_frame_fails_at_finish() {
    let bytes = stream();

    for cut in [1, 3, 4, 10, bytes.len() - 1] {
        let mut reader = FramedBlobReader::new();
        reader.feed(&bytes[..cut]).unwrap();

        let err = reader.finish().unwrap_err();
        assert!(matches!(err, CodecError::Framing { .. }), "cut at {cut}");
    }
}

#[test_log::test]
fn empty_input_finishes_cleanly() {
    let reader = FramedBlobReader::new();
    reader.finish().unwrap();
}

#[test_log::test]
fn implausible_header_length_is_framing_error() {
    let config = DecoderConfig {
        max_header_size: 16,
        ..DecoderConfig::default()
    };

    let mut reader = FramedBlobReader::with_config(&config);
    let err = reader.feed(&[0x00, 0x00, 0x01, 0x00]).unwrap_err();

    match err {
        CodecError::Framing { expected, actual, .. } => {
            assert_eq!(expected, 16);
            assert_eq!(actual, 256);
        }
        other => panic!("expected Framing, got {other:?}"),
    }
}

#[test_log::test]
fn negative_datasize_is_framing_error() {
    let header = BlobHeader::new("OSMData", -5);
    let mut bytes = BytesMut::new();
    bytes.put_u32(header.encoded_len() as u32);
    header.encode(&mut bytes);

    let err = FramedBlobReader::new().feed(&bytes).unwrap_err();
    assert!(matches!(err, CodecError::Framing { reason: "implausible Blob datasize", .. }));
}

#[test_log::test]
fn writer_tracks_unit_offsets() {
    let mut writer = BlobWriter::new(Vec::new());
    let first = writer
        .write_blob(&BlobType::OsmHeader, Bytes::from_static(b"abc"))
        .unwrap();
    let second = writer
        .write_blob(&BlobType::Unknown("Custom".into()), Bytes::from_static(b"defg"))
        .unwrap();
    writer.flush().unwrap();

    let total = writer.offset();
    let bytes = writer.into_inner();
    assert_eq!(total, bytes.len() as u64);

    let blobs = FramedBlobReader::new().feed(&bytes).unwrap();
    assert_eq!(blobs[0].offset, first);
    assert_eq!(blobs[1].offset, second);
    assert_eq!(blobs[1].r#type, BlobType::Unknown("Custom".into()));
}
