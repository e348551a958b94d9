//! The `Element` item, the decoded form of every entity
//! a primitive block can carry.

use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

use crate::codec::element::variants::{Info, Node, Relation, Tags, Way};

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Node(Node),
    Way(Way),
    Relation(Relation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Kind {
    Node,
    Way,
    Relation,
}

impl Element {
    pub fn kind(&self) -> Kind {
        match self {
            Element::Node(_) => Kind::Node,
            Element::Way(_) => Kind::Way,
            Element::Relation(_) => Kind::Relation,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Element::Node(node) => node.id,
            Element::Way(way) => way.id,
            Element::Relation(relation) => relation.id,
        }
    }

    pub fn tags(&self) -> &Tags {
        match self {
            Element::Node(node) => &node.tags,
            Element::Way(way) => &way.tags,
            Element::Relation(relation) => &relation.tags,
        }
    }

    pub fn info(&self) -> Option<&Info> {
        match self {
            Element::Node(node) => node.info.as_ref(),
            Element::Way(way) => way.info.as_ref(),
            Element::Relation(relation) => relation.info.as_ref(),
        }
    }

    pub fn str_type(&self) -> &'static str {
        self.kind().into()
    }
}
