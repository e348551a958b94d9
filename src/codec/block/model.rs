//! Fixed records for the `osmformat.proto` messages the decoder reads.
//!
//! Scalars with a proto default are kept as `Option` so that a field
//! written as zero is never confused with an absent one. Fields the
//! decoder never consults (bbox, writing program, replication data,
//! non-dense node bodies, changesets) are skipped on the wire; of the
//! unsupported groups only the count is kept.

use crate::codec::consts::{DEFAULT_DATE_GRANULARITY, DEFAULT_GRANULARITY, DEFAULT_VERSION};
use crate::codec::error::{CodecError, Result};
use crate::codec::wire::{WireMessage, WireReader, WireType};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderBlock {
    pub required_features: Vec<String>,
    pub optional_features: Vec<String>,
}

impl WireMessage for HeaderBlock {
    const NAME: &'static str = "HeaderBlock";

    fn merge_field(&mut self, tag: u32, wire_type: WireType, reader: &mut WireReader) -> Result<()> {
        let features = match tag {
            4 => &mut self.required_features,
            5 => &mut self.optional_features,
            _ => return reader.skip(tag, wire_type),
        };

        reader.expect(tag, wire_type, WireType::LengthDelimited)?;
        features.push(reader.read_string()?);
        Ok(())
    }
}

impl HeaderBlock {
    #[inline]
    pub fn requires(&self, feature: &str) -> bool {
        self.required_features.iter().any(|f| f == feature)
    }
}

/// The per-block string pool. Index 0 is conventionally the empty string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringTable(Vec<String>);

impl WireMessage for StringTable {
    const NAME: &'static str = "StringTable";

    fn merge_field(&mut self, tag: u32, wire_type: WireType, reader: &mut WireReader) -> Result<()> {
        if tag != 1 {
            return reader.skip(tag, wire_type);
        }

        reader.expect(tag, wire_type, WireType::LengthDelimited)?;
        let raw = reader.read_bytes()?;
        self.0.push(String::from_utf8_lossy(&raw).into_owned());
        Ok(())
    }
}

impl StringTable {
    pub fn new(strings: Vec<String>) -> Self {
        StringTable(strings)
    }

    /// Resolves a string id, failing when it lies outside the table.
    pub fn get(&self, sid: i64) -> Result<&str> {
        usize::try_from(sid)
            .ok()
            .and_then(|index| self.0.get(index))
            .map(String::as_str)
            .ok_or_else(|| {
                CodecError::malformed(
                    "StringTable",
                    format!("string id {sid} outside table of {} entries", self.0.len()),
                )
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimitiveBlock {
    pub stringtable: StringTable,
    pub primitivegroup: Vec<PrimitiveGroup>,
    pub granularity: Option<i32>,
    pub date_granularity: Option<i32>,
    pub lat_offset: Option<i64>,
    pub lon_offset: Option<i64>,
}

impl WireMessage for PrimitiveBlock {
    const NAME: &'static str = "PrimitiveBlock";

    fn merge_field(&mut self, tag: u32, wire_type: WireType, reader: &mut WireReader) -> Result<()> {
        match tag {
            1 => {
                reader.expect(tag, wire_type, WireType::LengthDelimited)?;
                let table = StringTable::decode_from(reader.read_message(StringTable::NAME)?)?;
                // A repeated message field merges; keep appending.
                self.stringtable.0.extend(table.0);
            }
            2 => {
                reader.expect(tag, wire_type, WireType::LengthDelimited)?;
                self.primitivegroup.push(PrimitiveGroup::decode_from(
                    reader.read_message(PrimitiveGroup::NAME)?,
                )?);
            }
            17 => {
                reader.expect(tag, wire_type, WireType::Varint)?;
                self.granularity = Some(reader.read_int32()?);
            }
            18 => {
                reader.expect(tag, wire_type, WireType::Varint)?;
                self.date_granularity = Some(reader.read_int32()?);
            }
            19 => {
                reader.expect(tag, wire_type, WireType::Varint)?;
                self.lat_offset = Some(reader.read_int64()?);
            }
            20 => {
                reader.expect(tag, wire_type, WireType::Varint)?;
                self.lon_offset = Some(reader.read_int64()?);
            }
            _ => reader.skip(tag, wire_type)?,
        }

        Ok(())
    }
}

impl PrimitiveBlock {
    #[inline]
    pub fn granularity(&self) -> i32 {
        self.granularity.unwrap_or(DEFAULT_GRANULARITY)
    }

    #[inline]
    pub fn date_granularity(&self) -> i32 {
        self.date_granularity.unwrap_or(DEFAULT_DATE_GRANULARITY)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimitiveGroup {
    /// Count of non-dense `Node` messages, which are not decoded.
    pub nodes: usize,
    pub dense: Option<DenseNodes>,
    pub ways: Vec<Way>,
    pub relations: Vec<Relation>,
    /// Count of `ChangeSet` messages, which are not decoded.
    pub changesets: usize,
}

impl WireMessage for PrimitiveGroup {
    const NAME: &'static str = "PrimitiveGroup";

    fn merge_field(&mut self, tag: u32, wire_type: WireType, reader: &mut WireReader) -> Result<()> {
        match tag {
            1 => {
                reader.expect(tag, wire_type, WireType::LengthDelimited)?;
                reader.read_bytes()?;
                self.nodes += 1;
            }
            2 => {
                reader.expect(tag, wire_type, WireType::LengthDelimited)?;
                let dense = DenseNodes::decode_from(reader.read_message(DenseNodes::NAME)?)?;
                self.dense = Some(match self.dense.take() {
                    Some(prior) => prior.merge(dense),
                    None => dense,
                });
            }
            3 => {
                reader.expect(tag, wire_type, WireType::LengthDelimited)?;
                self.ways
                    .push(Way::decode_from(reader.read_message(Way::NAME)?)?);
            }
            4 => {
                reader.expect(tag, wire_type, WireType::LengthDelimited)?;
                self.relations
                    .push(Relation::decode_from(reader.read_message(Relation::NAME)?)?);
            }
            5 => {
                reader.expect(tag, wire_type, WireType::LengthDelimited)?;
                reader.read_bytes()?;
                self.changesets += 1;
            }
            _ => reader.skip(tag, wire_type)?,
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DenseNodes {
    pub id: Vec<i64>,
    pub denseinfo: Option<DenseInfo>,
    pub lat: Vec<i64>,
    pub lon: Vec<i64>,
    pub keys_vals: Vec<i32>,
}

impl WireMessage for DenseNodes {
    const NAME: &'static str = "DenseNodes";

    fn merge_field(&mut self, tag: u32, wire_type: WireType, reader: &mut WireReader) -> Result<()> {
        match tag {
            1 => reader.read_repeated(wire_type, &mut self.id, WireReader::read_sint64),
            5 => {
                reader.expect(tag, wire_type, WireType::LengthDelimited)?;
                let info = DenseInfo::decode_from(reader.read_message(DenseInfo::NAME)?)?;
                self.denseinfo = Some(match self.denseinfo.take() {
                    Some(prior) => prior.merge(info),
                    None => info,
                });
                Ok(())
            }
            8 => reader.read_repeated(wire_type, &mut self.lat, WireReader::read_sint64),
            9 => reader.read_repeated(wire_type, &mut self.lon, WireReader::read_sint64),
            10 => reader.read_repeated(wire_type, &mut self.keys_vals, WireReader::read_int32),
            _ => reader.skip(tag, wire_type),
        }
    }
}

impl DenseNodes {
    /// Protobuf merge semantics for a singular message field seen twice.
    fn merge(mut self, other: DenseNodes) -> DenseNodes {
        self.id.extend(other.id);
        self.lat.extend(other.lat);
        self.lon.extend(other.lon);
        self.keys_vals.extend(other.keys_vals);
        self.denseinfo = match (self.denseinfo, other.denseinfo) {
            (Some(a), Some(b)) => Some(a.merge(b)),
            (a, b) => a.or(b),
        };
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DenseInfo {
    pub version: Vec<i32>,
    pub timestamp: Vec<i64>,
    pub changeset: Vec<i64>,
    pub uid: Vec<i32>,
    pub user_sid: Vec<i32>,
    pub visible: Vec<bool>,
}

impl WireMessage for DenseInfo {
    const NAME: &'static str = "DenseInfo";

    fn merge_field(&mut self, tag: u32, wire_type: WireType, reader: &mut WireReader) -> Result<()> {
        match tag {
            1 => reader.read_repeated(wire_type, &mut self.version, WireReader::read_int32),
            2 => reader.read_repeated(wire_type, &mut self.timestamp, WireReader::read_sint64),
            3 => reader.read_repeated(wire_type, &mut self.changeset, WireReader::read_sint64),
            4 => reader.read_repeated(wire_type, &mut self.uid, WireReader::read_sint32),
            5 => reader.read_repeated(wire_type, &mut self.user_sid, WireReader::read_sint32),
            6 => reader.read_repeated(wire_type, &mut self.visible, WireReader::read_bool),
            _ => reader.skip(tag, wire_type),
        }
    }
}

impl DenseInfo {
    fn merge(mut self, other: DenseInfo) -> DenseInfo {
        self.version.extend(other.version);
        self.timestamp.extend(other.timestamp);
        self.changeset.extend(other.changeset);
        self.uid.extend(other.uid);
        self.user_sid.extend(other.user_sid);
        self.visible.extend(other.visible);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Info {
    pub version: Option<i32>,
    pub timestamp: Option<i64>,
    pub changeset: Option<i64>,
    pub uid: Option<i32>,
    pub user_sid: Option<u32>,
    pub visible: Option<bool>,
}

impl WireMessage for Info {
    const NAME: &'static str = "Info";

    fn merge_field(&mut self, tag: u32, wire_type: WireType, reader: &mut WireReader) -> Result<()> {
        if !(1..=6).contains(&tag) {
            return reader.skip(tag, wire_type);
        }

        reader.expect(tag, wire_type, WireType::Varint)?;
        match tag {
            1 => self.version = Some(reader.read_int32()?),
            2 => self.timestamp = Some(reader.read_int64()?),
            3 => self.changeset = Some(reader.read_int64()?),
            4 => self.uid = Some(reader.read_int32()?),
            5 => self.user_sid = Some(reader.read_uint32()?),
            _ => self.visible = Some(reader.read_bool()?),
        }

        Ok(())
    }
}

impl Info {
    #[inline]
    pub fn version(&self) -> i32 {
        self.version.unwrap_or(DEFAULT_VERSION)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Way {
    pub id: i64,
    pub keys: Vec<u32>,
    pub vals: Vec<u32>,
    pub info: Option<Info>,
    pub refs: Vec<i64>,
}

impl WireMessage for Way {
    const NAME: &'static str = "Way";
    const REQUIRED: &'static [(u32, &'static str)] = &[(1, "id")];

    fn merge_field(&mut self, tag: u32, wire_type: WireType, reader: &mut WireReader) -> Result<()> {
        match tag {
            1 => {
                reader.expect(tag, wire_type, WireType::Varint)?;
                self.id = reader.read_int64()?;
                Ok(())
            }
            2 => reader.read_repeated(wire_type, &mut self.keys, WireReader::read_uint32),
            3 => reader.read_repeated(wire_type, &mut self.vals, WireReader::read_uint32),
            4 => {
                reader.expect(tag, wire_type, WireType::LengthDelimited)?;
                self.info = Some(Info::decode_from(reader.read_message(Info::NAME)?)?);
                Ok(())
            }
            8 => reader.read_repeated(wire_type, &mut self.refs, WireReader::read_sint64),
            _ => reader.skip(tag, wire_type),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Relation {
    pub id: i64,
    pub keys: Vec<u32>,
    pub vals: Vec<u32>,
    pub info: Option<Info>,
    pub roles_sid: Vec<i32>,
    pub memids: Vec<i64>,
    pub types: Vec<i32>,
}

impl WireMessage for Relation {
    const NAME: &'static str = "Relation";
    const REQUIRED: &'static [(u32, &'static str)] = &[(1, "id")];

    fn merge_field(&mut self, tag: u32, wire_type: WireType, reader: &mut WireReader) -> Result<()> {
        match tag {
            1 => {
                reader.expect(tag, wire_type, WireType::Varint)?;
                self.id = reader.read_int64()?;
                Ok(())
            }
            2 => reader.read_repeated(wire_type, &mut self.keys, WireReader::read_uint32),
            3 => reader.read_repeated(wire_type, &mut self.vals, WireReader::read_uint32),
            4 => {
                reader.expect(tag, wire_type, WireType::LengthDelimited)?;
                self.info = Some(Info::decode_from(reader.read_message(Info::NAME)?)?);
                Ok(())
            }
            8 => reader.read_repeated(wire_type, &mut self.roles_sid, WireReader::read_int32),
            9 => reader.read_repeated(wire_type, &mut self.memids, WireReader::read_sint64),
            10 => reader.read_repeated(wire_type, &mut self.types, WireReader::read_int32),
            _ => reader.skip(tag, wire_type),
        }
    }
}

