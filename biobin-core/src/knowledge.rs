//! The in-memory knowledge base: regions, groups and the links between them.
//!
//! Regions and groups live in id-keyed arenas and refer to each other only
//! through [`RegionId`] and [`GroupId`] handles. Every link is stored on both
//! sides, and the `add_*`/`remove_*` operations keep the two sides in step.
use std::collections::{BTreeMap, BTreeSet};

use fxhash::FxHashMap as HashMap;
use log::debug;

use crate::errors::{CoreError, CoreResult};
use crate::models::{Boundary, Chromosome, Group, GroupId, LocusId, Region, RegionId, SourceId};

#[derive(Debug, Default, Clone)]
pub struct KnowledgeBase {
    regions: BTreeMap<RegionId, Region>,
    groups: BTreeMap<GroupId, Group>,
    aliases: HashMap<String, BTreeSet<RegionId>>,
    group_names: HashMap<String, GroupId>,
    sources: Vec<String>,
    next_region: u32,
    next_group: u32,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a knowledge source by name, returning its id. Repeated names share an id.
    pub fn add_source(&mut self, name: &str) -> SourceId {
        if let Some(pos) = self.sources.iter().position(|s| s == name) {
            return pos as SourceId;
        }
        self.sources.push(name.to_string());
        (self.sources.len() - 1) as SourceId
    }

    pub fn source_name(&self, source: SourceId) -> Option<&str> {
        self.sources.get(source as usize).map(String::as_str)
    }

    ///
    /// Add a region with its default boundary. The canonical name is also
    /// registered as an alias.
    ///
    pub fn add_region(
        &mut self,
        name: &str,
        chrom: Chromosome,
        start: u32,
        end: u32,
    ) -> CoreResult<RegionId> {
        if start > end {
            return Err(CoreError::InvalidBoundary {
                name: name.to_string(),
                start,
                end,
            });
        }

        let id = RegionId(self.next_region);
        self.next_region += 1;

        self.regions.insert(
            id,
            Region {
                id,
                name: name.to_string(),
                chrom,
                aliases: BTreeSet::new(),
                bounds: Boundary { start, end },
                effective: None,
                loci: BTreeSet::new(),
                groups: BTreeMap::new(),
            },
        );
        self.add_alias(id, name);

        Ok(id)
    }

    pub fn set_effective_bounds(&mut self, id: RegionId, start: u32, end: u32) -> CoreResult<()> {
        let Some(region) = self.regions.get_mut(&id) else {
            return Ok(());
        };
        if start > end {
            return Err(CoreError::InvalidBoundary {
                name: region.name.clone(),
                start,
                end,
            });
        }
        region.effective = Some(Boundary { start, end });
        Ok(())
    }

    pub fn add_alias(&mut self, id: RegionId, alias: &str) -> bool {
        let Some(region) = self.regions.get_mut(&id) else {
            return false;
        };
        region.aliases.insert(alias.to_string());
        self.aliases.entry(alias.to_string()).or_default().insert(id);
        true
    }

    /// Record that `locus` lies inside region `id`.
    pub fn add_locus(&mut self, id: RegionId, locus: LocusId) -> bool {
        match self.regions.get_mut(&id) {
            Some(region) => region.loci.insert(locus),
            None => false,
        }
    }

    ///
    /// Add a group, or return the existing id when a group with the same
    /// name is already known.
    ///
    pub fn add_group(&mut self, name: &str, description: &str, source: SourceId) -> GroupId {
        if let Some(id) = self.group_names.get(name) {
            return *id;
        }

        let id = GroupId(self.next_group);
        self.next_group += 1;

        self.groups.insert(
            id,
            Group {
                id,
                name: name.to_string(),
                description: description.to_string(),
                source,
                regions: BTreeSet::new(),
                children: BTreeSet::new(),
                parents: BTreeSet::new(),
            },
        );
        self.group_names.insert(name.to_string(), id);
        id
    }

    /// Link `parent` to `child` in both directions. Unknown ids are ignored.
    pub fn add_relationship(&mut self, parent: GroupId, child: GroupId) -> bool {
        if !self.groups.contains_key(&parent) || !self.groups.contains_key(&child) {
            return false;
        }
        if let Some(p) = self.groups.get_mut(&parent) {
            p.children.insert(child);
        }
        if let Some(c) = self.groups.get_mut(&child) {
            c.parents.insert(parent);
        }
        true
    }

    /// Make `region` a member of `group`, in both directions. Unknown ids are ignored.
    pub fn add_association(&mut self, group: GroupId, region: RegionId) -> bool {
        let Some(g) = self.groups.get_mut(&group) else {
            return false;
        };
        let Some(r) = self.regions.get_mut(&region) else {
            return false;
        };
        g.regions.insert(region);
        r.groups.entry(g.source).or_default().insert(group);
        true
    }

    /// Remove a group and every back-reference to it.
    pub fn remove_group(&mut self, id: GroupId) -> Option<Group> {
        let group = self.groups.remove(&id)?;

        for rid in &group.regions {
            if let Some(region) = self.regions.get_mut(rid) {
                if let Some(set) = region.groups.get_mut(&group.source) {
                    set.remove(&id);
                    if set.is_empty() {
                        region.groups.remove(&group.source);
                    }
                }
            }
        }
        for child in &group.children {
            if let Some(c) = self.groups.get_mut(child) {
                c.parents.remove(&id);
            }
        }
        for parent in &group.parents {
            if let Some(p) = self.groups.get_mut(parent) {
                p.children.remove(&id);
            }
        }
        self.group_names.remove(&group.name);

        debug!("Removed group {}", group.name);
        Some(group)
    }

    /// Remove a region, unlinking it from its groups and aliases.
    pub fn remove_region(&mut self, id: RegionId) -> Option<Region> {
        let region = self.regions.remove(&id)?;

        for gid in region.groups.values().flatten() {
            if let Some(group) = self.groups.get_mut(gid) {
                group.regions.remove(&id);
            }
        }
        for alias in &region.aliases {
            if let Some(ids) = self.aliases.get_mut(alias) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.aliases.remove(alias);
                }
            }
        }

        debug!("Removed region {}", region.name);
        Some(region)
    }

    ///
    /// Collect the regions of a group and of all groups below it.
    ///
    /// The traversal keeps a visited set, so cyclic or self-referencing
    /// group hierarchies terminate.
    ///
    pub fn descendant_regions(&self, id: GroupId) -> BTreeSet<RegionId> {
        let mut regions = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut worklist = vec![id];

        while let Some(gid) = worklist.pop() {
            if !visited.insert(gid) {
                continue;
            }
            let Some(group) = self.groups.get(&gid) else {
                continue;
            };
            regions.extend(group.regions.iter().copied());
            worklist.extend(group.children.iter().filter(|c| !visited.contains(*c)));
        }

        regions
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(&id)
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    pub fn group_by_name(&self, name: &str) -> Option<GroupId> {
        self.group_names.get(name).copied()
    }

    /// Regions carrying `alias`, in id order.
    pub fn regions_by_alias(&self, alias: &str) -> impl Iterator<Item = RegionId> + '_ {
        self.aliases.get(alias).into_iter().flatten().copied()
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn num_regions(&self) -> usize {
        self.regions.len()
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }
}
