//! Decoded element variants

pub mod node;
pub mod relation;
pub mod way;

pub use node::*;
pub use relation::*;
pub use way::*;

pub mod common {
    use std::collections::HashMap;
    use std::ops::Deref;
    use strum::{AsRefStr, Display, EnumString};

    use crate::codec::block::model::{self, StringTable};
    use crate::codec::block::BlockOptions;
    use crate::codec::error::Result;

    /// Position in degrees.
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct Position {
        pub lat: f64,
        pub lon: f64,
    }

    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct Tags(HashMap<String, String>);

    impl Tags {
        pub fn new(map: HashMap<String, String>) -> Self {
            Tags(map)
        }

        #[inline]
        pub(crate) fn insert(&mut self, key: &str, value: &str) {
            self.0.insert(key.to_string(), value.to_string());
        }

        /// Takes an iterator of (key, value) indices into the block's
        /// string table and resolves them into a tag map.
        ///
        /// Pairs stop at the shorter of the two index arrays; a key
        /// without a value is dropped rather than rejected.
        pub fn from_block<'a>(
            iter: impl Iterator<Item = (&'a u32, &'a u32)>,
            table: &StringTable,
        ) -> Result<Self> {
            iter.map(|(&k, &v)| {
                Ok((
                    table.get(k as i64)?.to_string(),
                    table.get(v as i64)?.to_string(),
                ))
            })
            .collect::<Result<HashMap<_, _>>>()
            .map(Tags)
        }

        pub fn get(&self, key: &str) -> Option<&str> {
            self.0.get(key).map(String::as_str)
        }
    }

    impl Deref for Tags {
        type Target = HashMap<String, String>;

        fn deref(&self) -> &Self::Target {
            &self.0
        }
    }

    impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
        fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
            Tags(
                iter.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            )
        }
    }

    pub trait Taggable {
        fn indices(&self) -> impl Iterator<Item = (&u32, &u32)>;

        fn tags(&self, table: &StringTable) -> Result<Tags> {
            Tags::from_block(self.indices(), table)
        }
    }

    /// Entity metadata, with the timestamp in milliseconds since epoch.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Info {
        pub version: i32,
        pub timestamp: i64,
        pub changeset: i64,
        pub uid: i32,
        pub user: String,
        /// Present only for files declaring `HistoricalInformation`.
        pub visible: Option<bool>,
    }

    impl Info {
        /// Non-dense metadata carries absolute values; only the
        /// timestamp is scaled.
        pub fn from_raw(raw: &model::Info, table: &StringTable, options: &BlockOptions) -> Result<Self> {
            Ok(Info {
                version: raw.version(),
                timestamp: options.timestamp(raw.timestamp.unwrap_or(0)),
                changeset: raw.changeset.unwrap_or(0),
                uid: raw.uid.unwrap_or(0),
                user: match raw.user_sid {
                    Some(sid) => table.get(sid as i64)?.to_string(),
                    None => String::new(),
                },
                visible: raw.visible.filter(|_| options.historical),
            })
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
    #[strum(serialize_all = "lowercase")]
    pub enum MemberType {
        Node,
        Way,
        Relation,
        /// Any wire value outside 0..=2.
        #[strum(serialize = "?")]
        Unknown,
    }

    impl From<i32> for MemberType {
        fn from(value: i32) -> Self {
            match value {
                0 => MemberType::Node,
                1 => MemberType::Way,
                2 => MemberType::Relation,
                _ => MemberType::Unknown,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Member {
        pub member_type: MemberType,
        pub id: i64,
        pub role: String,
    }
}

pub use common::*;
