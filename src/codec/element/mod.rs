//! Decoded elements, and the delta reconstruction that produces them

pub mod item;
pub mod variants;


#[doc(inline)]
pub use item::{Element, Kind};
#[doc(inline)]
pub use variants::{Info, Member, MemberType, Node, Position, Relation, Tags, Way};
