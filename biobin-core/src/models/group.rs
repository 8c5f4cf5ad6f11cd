use std::collections::BTreeSet;

use super::region::RegionId;

/// Handle of a [`Group`] inside a [`KnowledgeBase`](crate::knowledge::KnowledgeBase).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub(crate) u32);

impl GroupId {
    pub fn index(&self) -> u32 {
        self.0
    }
}

/// Identifier of the knowledge source (pathway database, custom archive) a group came from.
pub type SourceId = u32;

/// A pathway or other collection of regions, possibly nested.
#[derive(Debug, Clone)]
pub struct Group {
    pub(crate) id: GroupId,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) source: SourceId,
    pub(crate) regions: BTreeSet<RegionId>,
    pub(crate) children: BTreeSet<GroupId>,
    pub(crate) parents: BTreeSet<GroupId>,
}

impl Group {
    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn regions(&self) -> &BTreeSet<RegionId> {
        &self.regions
    }

    pub fn children(&self) -> &BTreeSet<GroupId> {
        &self.children
    }

    pub fn parents(&self) -> &BTreeSet<GroupId> {
        &self.parents
    }
}
