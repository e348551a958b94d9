//! Describes the decoded `Way`: tags plus absolute node references.

use super::common::{Info, Taggable, Tags};
use crate::codec::block::model::{self, StringTable};
use crate::codec::block::BlockOptions;
use crate::codec::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: i64,
    pub tags: Tags,
    pub refs: Vec<i64>,
    pub info: Option<Info>,
}

impl Way {
    #[inline]
    pub fn from_raw(value: &model::Way, table: &StringTable, options: &BlockOptions) -> Result<Self> {
        Ok(Way {
            id: value.id,
            tags: value.tags(table)?,
            refs: value
                .refs
                .iter()
                .scan(0i64, |sum, delta| {
                    *sum = sum.wrapping_add(*delta);
                    Some(*sum)
                })
                .collect(),
            info: value
                .info
                .as_ref()
                .map(|info| Info::from_raw(info, table, options))
                .transpose()?,
        })
    }
}

impl Taggable for model::Way {
    fn indices(&self) -> impl Iterator<Item = (&u32, &u32)> {
        self.keys.iter().zip(self.vals.iter())
    }
}
