//! Nodes, reconstructed from the `DenseNodes` delta arrays.

use super::common::{Info, Position, Tags};
use crate::codec::block::model::{DenseInfo, DenseNodes, StringTable};
use crate::codec::block::BlockOptions;
use crate::codec::error::{CodecError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub position: Position,
    pub tags: Tags,
    pub info: Option<Info>,
}

/// Running sums over the delta-coded `DenseInfo` columns.
#[derive(Default)]
struct InfoCursor {
    timestamp: i64,
    changeset: i64,
    uid: i32,
    user_sid: i32,
}

impl Node {
    /// Takes an `osm::DenseNodes` group and reconstructs absolute nodes.
    ///
    /// `id`, `lat` and `lon` (and the delta columns of `DenseInfo`) are
    /// running sums from zero, so the group must be walked in order.
    /// `keys_vals` is one cursor shared by the whole group: each node
    /// consumes `(key, value)` pairs up to its `0` terminator.
    pub fn from_dense(
        dense: &DenseNodes,
        table: &StringTable,
        options: &BlockOptions,
    ) -> Result<Vec<Node>> {
        let len = dense.id.len();
        if dense.lat.len() != len || dense.lon.len() != len {
            return Err(CodecError::malformed(
                "DenseNodes",
                format!(
                    "parallel arrays differ in length: id={len}, lat={}, lon={}",
                    dense.lat.len(),
                    dense.lon.len()
                ),
            ));
        }

        if let Some(info) = &dense.denseinfo {
            check_dense_info(info, len)?;
        }

        let mut nodes = Vec::with_capacity(len);
        let mut keys_vals = dense.keys_vals.iter().copied();
        let (mut id, mut lat, mut lon) = (0i64, 0i64, 0i64);
        let mut cursor = InfoCursor::default();

        for index in 0..len {
            id = id.wrapping_add(dense.id[index]);
            lat = lat.wrapping_add(dense.lat[index]);
            lon = lon.wrapping_add(dense.lon[index]);

            let mut tags = Tags::default();
            while let Some(key) = keys_vals.next().filter(|key| *key != 0) {
                let Some(value) = keys_vals.next() else {
                    break;
                };
                tags.insert(table.get(key as i64)?, table.get(value as i64)?);
            }

            let info = match &dense.denseinfo {
                Some(dense_info) => Some(cursor.advance(dense_info, index, table, options)?),
                None => None,
            };

            nodes.push(Node {
                id,
                position: Position {
                    lat: options.lat(lat),
                    lon: options.lon(lon),
                },
                tags,
                info,
            });
        }

        Ok(nodes)
    }
}

impl InfoCursor {
    fn advance(
        &mut self,
        info: &DenseInfo,
        index: usize,
        table: &StringTable,
        options: &BlockOptions,
    ) -> Result<Info> {
        self.timestamp = self.timestamp.wrapping_add(info.timestamp[index]);
        self.changeset = self.changeset.wrapping_add(info.changeset[index]);
        self.uid = self.uid.wrapping_add(info.uid[index]);
        self.user_sid = self.user_sid.wrapping_add(info.user_sid[index]);

        let visible = if options.historical && !info.visible.is_empty() {
            Some(info.visible[index])
        } else {
            None
        };

        Ok(Info {
            version: info.version[index],
            timestamp: options.timestamp(self.timestamp),
            changeset: self.changeset,
            uid: self.uid,
            user: table.get(self.user_sid as i64)?.to_string(),
            visible,
        })
    }
}

fn check_dense_info(info: &DenseInfo, len: usize) -> Result<()> {
    let columns = [
        ("version", info.version.len()),
        ("timestamp", info.timestamp.len()),
        ("changeset", info.changeset.len()),
        ("uid", info.uid.len()),
        ("user_sid", info.user_sid.len()),
    ];

    let visible = (!info.visible.is_empty()).then_some(("visible", info.visible.len()));

    match columns
        .into_iter()
        .chain(visible)
        .find(|(_, column)| *column != len)
    {
        Some((name, column)) => Err(CodecError::malformed(
            "DenseInfo",
            format!("column `{name}` has {column} entries for {len} nodes"),
        )),
        None => Ok(()),
    }
}
