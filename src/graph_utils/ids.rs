use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

// Raw ids are host-chosen and share a single space across nodes, pins and links.
// Zero is reserved as "no object".
macro_rules! raw_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const INVALID: Self = Self(0);

            pub fn is_valid(self) -> bool { self.0 != 0 }
            pub fn raw(self) -> u64 { self.0 }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self { Self(raw) }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

raw_id!(
    /// Identity of a node as chosen by the host.
    NodeId, "Node"
);
raw_id!(
    /// Identity of a pin as chosen by the host.
    PinId, "Pin"
);
raw_id!(
    /// Identity of a link as chosen by the host.
    LinkId, "Link"
);

/// Kind-tagged identity of any editor object.
///
/// Comparison, hashing and ordering only look at the raw value: `Node(7)` and `Pin(7)`
/// are the same object as far as the editor is concerned. Keeping raw ids unique across
/// kinds is up to the host.
#[derive(Clone, Copy, Default, Serialize, Deserialize)]
pub enum ObjectId {
    #[default]
    None,
    Node(NodeId),
    Pin(PinId),
    Link(LinkId),
}

impl ObjectId {
    pub fn raw(self) -> u64 {
        match self {
            ObjectId::None => 0,
            ObjectId::Node(id) => id.0,
            ObjectId::Pin(id) => id.0,
            ObjectId::Link(id) => id.0,
        }
    }

    pub fn is_none(self) -> bool { self.raw() == 0 }
    pub fn is_some(self) -> bool { !self.is_none() }

    pub fn as_node(self) -> Option<NodeId> {
        match self { ObjectId::Node(id) if id.is_valid() => Some(id), _ => None }
    }

    pub fn as_pin(self) -> Option<PinId> {
        match self { ObjectId::Pin(id) if id.is_valid() => Some(id), _ => None }
    }

    pub fn as_link(self) -> Option<LinkId> {
        match self { ObjectId::Link(id) if id.is_valid() => Some(id), _ => None }
    }

    pub fn is_node(self) -> bool { self.as_node().is_some() }
    pub fn is_pin(self) -> bool { self.as_pin().is_some() }
    pub fn is_link(self) -> bool { self.as_link().is_some() }
}

impl PartialEq for ObjectId {
    fn eq(&self, other: &Self) -> bool { self.raw() == other.raw() }
}

impl Eq for ObjectId {}

impl Hash for ObjectId {
    fn hash<H: Hasher>(&self, state: &mut H) { self.raw().hash(state) }
}

impl PartialOrd for ObjectId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ObjectId {
    fn cmp(&self, other: &Self) -> Ordering { self.raw().cmp(&other.raw()) }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectId::None => write!(f, "None"),
            ObjectId::Node(id) => write!(f, "{id:?}"),
            ObjectId::Pin(id) => write!(f, "{id:?}"),
            ObjectId::Link(id) => write!(f, "{id:?}"),
        }
    }
}

impl From<NodeId> for ObjectId {
    fn from(id: NodeId) -> Self { ObjectId::Node(id) }
}

impl From<PinId> for ObjectId {
    fn from(id: PinId) -> Self { ObjectId::Pin(id) }
}

impl From<LinkId> for ObjectId {
    fn from(id: LinkId) -> Self { ObjectId::Link(id) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equality_uses_raw_identity_only() {
        let node = ObjectId::from(NodeId(7));
        let pin = ObjectId::from(PinId(7));
        assert_eq!(node, pin);
        assert_ne!(node, ObjectId::from(NodeId(8)));

        let mut set = HashSet::new();
        set.insert(node);
        assert!(set.contains(&pin));
    }

    #[test]
    fn facets_only_match_their_tag() {
        let link = ObjectId::from(LinkId(3));
        assert_eq!(link.as_link(), Some(LinkId(3)));
        assert_eq!(link.as_node(), None);
        assert_eq!(link.as_pin(), None);
        assert!(ObjectId::Node(NodeId::INVALID).is_none());
        assert_eq!(ObjectId::Node(NodeId::INVALID).as_node(), None);
    }

    #[test]
    fn ordering_follows_raw_value() {
        let mut ids = vec![ObjectId::from(LinkId(9)), ObjectId::from(NodeId(2)), ObjectId::from(PinId(5))];
        ids.sort();
        let raws: Vec<u64> = ids.iter().map(|id| id.raw()).collect();
        assert_eq!(raws, vec![2, 5, 9]);
    }
}
