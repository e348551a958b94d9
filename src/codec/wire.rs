//! Protocol buffer wire primitives shared by every message codec.
//!
//! Varints, keys and unknown-field skipping are delegated to
//! `prost::encoding`; this module adds bounds-checked length-delimited
//! reads, zigzag helpers, packed/unpacked repeated fields and the
//! [`WireMessage`] trait the fixed PBF records decode through.

use bytes::{Buf, BufMut, Bytes};
use prost::encoding::{self, DecodeContext};
use prost::DecodeError;

use crate::codec::error::{CodecError, Result};

pub use prost::encoding::WireType;

/// Maps a signed value onto the unsigned varint space (`sint64`).
#[inline]
pub const fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode`].
#[inline]
pub const fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

#[inline]
pub fn encode_varint(value: u64, buf: &mut impl BufMut) {
    encoding::encode_varint(value, buf)
}

#[inline]
pub fn decode_varint(buf: &mut impl Buf) -> std::result::Result<u64, DecodeError> {
    encoding::decode_varint(buf)
}

/// Writes a varint-typed field (`int32`, `int64`, `uint32`, `bool`, `enum`).
#[inline]
pub fn put_varint_field(tag: u32, value: u64, buf: &mut impl BufMut) {
    encoding::encode_key(tag, WireType::Varint, buf);
    encoding::encode_varint(value, buf);
}

/// Writes a length-delimited field (`bytes`, `string`, sub-message).
#[inline]
pub fn put_bytes_field(tag: u32, value: &[u8], buf: &mut impl BufMut) {
    encoding::encode_key(tag, WireType::LengthDelimited, buf);
    encoding::encode_varint(value.len() as u64, buf);
    buf.put_slice(value);
}

#[inline]
pub fn varint_field_len(tag: u32, value: u64) -> usize {
    encoding::key_len(tag) + encoding::encoded_len_varint(value)
}

#[inline]
pub fn bytes_field_len(tag: u32, len: usize) -> usize {
    encoding::key_len(tag) + encoding::encoded_len_varint(len as u64) + len
}

/// A cursor over one serialized message.
///
/// Every failure is reported as [`CodecError::MalformedMessage`] naming
/// the message and the byte position within it.
pub struct WireReader {
    buf: Bytes,
    len: usize,
    message: &'static str,
}

impl WireReader {
    pub fn new(message: &'static str, buf: Bytes) -> Self {
        WireReader {
            len: buf.len(),
            buf,
            message,
        }
    }

    #[inline]
    pub fn has_remaining(&self) -> bool {
        self.buf.has_remaining()
    }

    /// Byte position relative to the start of this message.
    #[inline]
    pub fn position(&self) -> usize {
        self.len - self.buf.remaining()
    }

    pub fn malformed(&self, reason: impl std::fmt::Display) -> CodecError {
        CodecError::malformed(
            self.message,
            format!("at byte {}: {reason}", self.position()),
        )
    }

    #[inline]
    fn wire<T>(&self, result: std::result::Result<T, DecodeError>) -> Result<T> {
        result.map_err(|err| self.malformed(err))
    }

    pub fn read_key(&mut self) -> Result<(u32, WireType)> {
        let key = encoding::decode_key(&mut self.buf);
        self.wire(key)
    }

    pub fn read_varint(&mut self) -> Result<u64> {
        let value = encoding::decode_varint(&mut self.buf);
        self.wire(value)
    }

    #[inline]
    pub fn read_int32(&mut self) -> Result<i32> {
        self.read_varint().map(|v| v as i32)
    }

    #[inline]
    pub fn read_int64(&mut self) -> Result<i64> {
        self.read_varint().map(|v| v as i64)
    }

    #[inline]
    pub fn read_uint32(&mut self) -> Result<u32> {
        self.read_varint().map(|v| v as u32)
    }

    #[inline]
    pub fn read_sint32(&mut self) -> Result<i32> {
        self.read_varint().map(|v| zigzag_decode(v as u32 as u64) as i32)
    }

    #[inline]
    pub fn read_sint64(&mut self) -> Result<i64> {
        self.read_varint().map(zigzag_decode)
    }

    #[inline]
    pub fn read_bool(&mut self) -> Result<bool> {
        self.read_varint().map(|v| v != 0)
    }

    /// Reads a length-delimited payload without copying.
    pub fn read_bytes(&mut self) -> Result<Bytes> {
        let len = self.read_varint()?;
        if len > self.buf.remaining() as u64 {
            return Err(self.malformed(format_args!(
                "declared length {len} exceeds the {} remaining bytes",
                self.buf.remaining()
            )));
        }

        Ok(self.buf.copy_to_bytes(len as usize))
    }

    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(|err| self.malformed(err))
    }

    /// Reads a nested message as its own cursor.
    pub fn read_message(&mut self, message: &'static str) -> Result<WireReader> {
        Ok(WireReader::new(message, self.read_bytes()?))
    }

    /// Reads one occurrence of a repeated scalar field, accepting both the
    /// packed (length-delimited) and the unpacked (one value per key) forms.
    pub fn read_repeated<T>(
        &mut self,
        wire_type: WireType,
        out: &mut Vec<T>,
        read: fn(&mut WireReader) -> Result<T>,
    ) -> Result<()> {
        match wire_type {
            WireType::LengthDelimited => {
                let mut packed = WireReader::new(self.message, self.read_bytes()?);
                while packed.has_remaining() {
                    out.push(read(&mut packed)?);
                }
                Ok(())
            }
            WireType::Varint => {
                out.push(read(self)?);
                Ok(())
            }
            other => Err(self.malformed(format_args!(
                "repeated varint field cannot use wire type {other:?}"
            ))),
        }
    }

    /// Fails unless the field was written with the expected wire type.
    pub fn expect(&self, tag: u32, actual: WireType, expected: WireType) -> Result<()> {
        if actual == expected {
            return Ok(());
        }

        Err(self.malformed(format_args!(
            "field {tag} has wire type {actual:?}, expected {expected:?}"
        )))
    }

    /// Skips over an unknown field of the given wire type.
    pub fn skip(&mut self, tag: u32, wire_type: WireType) -> Result<()> {
        let skipped = encoding::skip_field(wire_type, tag, &mut self.buf, DecodeContext::default());
        self.wire(skipped)
    }
}

/// A fixed record decoded field by field from the wire.
///
/// Unknown fields are skipped by the implementation's fallback arm,
/// which keeps newer producers readable.
pub trait WireMessage: Default {
    const NAME: &'static str;

    /// `(tag, name)` of the proto2 `required` fields, all below tag 64.
    const REQUIRED: &'static [(u32, &'static str)] = &[];

    fn merge_field(&mut self, tag: u32, wire_type: WireType, reader: &mut WireReader) -> Result<()>;

    fn decode(buf: Bytes) -> Result<Self> {
        Self::decode_from(WireReader::new(Self::NAME, buf))
    }

    fn decode_from(mut reader: WireReader) -> Result<Self> {
        let mut message = Self::default();
        let mut seen = 0u64;

        while reader.has_remaining() {
            let (tag, wire_type) = reader.read_key()?;
            if tag < 64 {
                seen |= 1u64 << tag;
            }
            message.merge_field(tag, wire_type, &mut reader)?;
        }

        match Self::REQUIRED.iter().find(|(tag, _)| seen & (1u64 << *tag) == 0) {
            Some((_, name)) => Err(CodecError::malformed(
                Self::NAME,
                format!("missing required field `{name}`"),
            )),
            None => Ok(message),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use bytes::BytesMut;

    fn encoded(value: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_varint(value, &mut buf);
        buf
    }

    #[test_log::test]
    fn varint_uses_seven_bit_groups() {
        assert_eq!(encoded(1), vec![0x01]);
        assert_eq!(encoded(300), vec![0xAC, 0x02]);
        assert_eq!(encoded(u64::MAX).len(), 10);

        let mut buf = Bytes::from(vec![0xAC, 0x02, 0x07]);
        assert_eq!(decode_varint(&mut buf).unwrap(), 300);
        assert_eq!(buf.as_ref(), &[0x07]);
    }

    #[test_log::test]
    fn zigzag_interleaves_signs() {
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
        assert_eq!(zigzag_encode(-2), 3);
        assert_eq!(zigzag_encode(i64::MIN), u64::MAX);

        for value in [0, 1, -1, 63, -64, 1 << 40, i64::MAX, i64::MIN] {
            assert_eq!(zigzag_decode(zigzag_encode(value)), value);
        }
    }

    #[test_log::test]
    fn sint32_reads_zigzag() {
        let mut reader = WireReader::new("Test", Bytes::from(encoded(zigzag_encode(-5))));
        assert_eq!(reader.read_sint32().unwrap(), -5);
        assert!(!reader.has_remaining());
    }

    #[test_log::test]
    fn truncated_varint_is_malformed() {
        let mut reader = WireReader::new("Test", Bytes::from_static(&[0x96, 0x81]));
        let err = reader.read_varint().unwrap_err();
        assert!(matches!(err, CodecError::MalformedMessage { message: "Test", .. }));
    }

    #[test_log::test]
    fn length_overrun_is_malformed() {
        let mut buf = BytesMut::new();
        encode_varint(10, &mut buf);
        buf.put_slice(b"short");

        let mut reader = WireReader::new("Test", buf.freeze());
        let err = reader.read_bytes().unwrap_err();
        assert!(err.to_string().contains("exceeds the 5 remaining bytes"));
    }

    #[test_log::test]
    fn skips_every_scalar_wire_type() {
        let mut buf = BytesMut::new();
        put_varint_field(7, 150, &mut buf);
        encoding::encode_key(8, WireType::SixtyFourBit, &mut buf);
        buf.put_u64_le(42);
        put_bytes_field(9, b"ignored", &mut buf);
        encoding::encode_key(10, WireType::ThirtyTwoBit, &mut buf);
        buf.put_u32_le(7);
        put_varint_field(1, 99, &mut buf);

        let mut reader = WireReader::new("Test", buf.freeze());
        loop {
            let (tag, wire_type) = reader.read_key().unwrap();
            if tag == 1 {
                assert_eq!(reader.read_varint().unwrap(), 99);
                break;
            }
            reader.skip(tag, wire_type).unwrap();
        }
        assert!(!reader.has_remaining());
    }

    #[test_log::test]
    fn repeated_accepts_packed_and_unpacked() {
        let mut packed = BytesMut::new();
        for v in [1i64, -1, 2] {
            encode_varint(zigzag_encode(v), &mut packed);
        }

        let mut buf = BytesMut::new();
        put_bytes_field(1, &packed, &mut buf);
        put_varint_field(1, zigzag_encode(-3), &mut buf);

        let mut reader = WireReader::new("Test", buf.freeze());
        let mut out = Vec::new();
        while reader.has_remaining() {
            let (_, wire_type) = reader.read_key().unwrap();
            reader
                .read_repeated(wire_type, &mut out, WireReader::read_sint64)
                .unwrap();
        }

        assert_eq!(out, vec![1, -1, 2, -3]);
    }

    #[test_log::test]
    fn field_lengths_match_encoding() {
        let mut buf = Vec::new();
        put_varint_field(3, 1 << 20, &mut buf);
        assert_eq!(buf.len(), varint_field_len(3, 1 << 20));

        let mut buf = Vec::new();
        put_bytes_field(17, &[0u8; 200], &mut buf);
        assert_eq!(buf.len(), bytes_field_len(17, 200));
    }
}
