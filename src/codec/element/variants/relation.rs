use super::common::{Info, Member, MemberType, Taggable, Tags};
use crate::codec::block::model::{self, StringTable};
use crate::codec::block::BlockOptions;
use crate::codec::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub id: i64,
    pub tags: Tags,
    pub members: Vec<Member>,
    pub info: Option<Info>,
}

impl Relation {
    pub fn from_raw(
        relation: &model::Relation,
        table: &StringTable,
        options: &BlockOptions,
    ) -> Result<Self> {
        Ok(Self {
            id: relation.id,
            tags: relation.tags(table)?,
            members: relation.members(table)?,
            info: relation
                .info
                .as_ref()
                .map(|info| Info::from_raw(info, table, options))
                .transpose()?,
        })
    }
}

impl Taggable for model::Relation {
    fn indices(&self) -> impl Iterator<Item = (&u32, &u32)> {
        self.keys.iter().zip(self.vals.iter())
    }
}

impl model::Relation {
    /// Member ids are delta coded from zero within each relation.
    fn members(&self, table: &StringTable) -> Result<Vec<Member>> {
        let mut id = 0i64;

        self.roles_sid
            .iter()
            .zip(self.memids.iter())
            .zip(self.types.iter())
            .map(|((role, delta), member_type)| {
                id = id.wrapping_add(*delta);
                Ok(Member {
                    member_type: MemberType::from(*member_type),
                    id,
                    role: table.get(*role as i64)?.to_string(),
                })
            })
            .collect()
    }
}
