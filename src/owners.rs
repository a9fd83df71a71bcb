//! Owner / group lookup consulted for border classification.
//!
//! Owners never influence geometry; they only decide whether a border
//! separates two regions of the same group or of different groups.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BorderError;
use crate::raster::RegionId;

/// Identifier of an owner group (a coarser grouping over regions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u32);

/// Read-only owner lookup supplied by the caller.
pub trait OwnerLookup: Sync {
    /// Owner of `region`, or `None` if unowned.
    fn owner_of(&self, region: RegionId) -> Option<GroupId>;

    /// Display colour of a group, if known.
    fn group_color(&self, _group: GroupId) -> Option<[u8; 3]> {
        None
    }
}

/// Lookup for maps without ownership: every region is unowned.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOwners;

impl OwnerLookup for NoOwners {
    fn owner_of(&self, _region: RegionId) -> Option<GroupId> {
        None
    }
}

/// `HashMap`-backed owner table.
#[derive(Debug, Clone, Default)]
pub struct OwnerTable {
    owners: HashMap<RegionId, GroupId>,
    colors: HashMap<GroupId, [u8; 3]>,
    tags: HashMap<GroupId, String>,
}

#[derive(Debug, Deserialize)]
struct OwnerFile {
    groups: Vec<GroupEntry>,
}

#[derive(Debug, Deserialize)]
struct GroupEntry {
    tag: String,
    #[serde(default)]
    color: Option<[u8; 3]>,
    #[serde(default)]
    regions: Vec<RegionId>,
}

impl OwnerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, region: RegionId, group: GroupId) {
        self.owners.insert(region, group);
    }

    pub fn set_color(&mut self, group: GroupId, rgb: [u8; 3]) {
        self.colors.insert(group, rgb);
    }

    pub fn tag_of(&self, group: GroupId) -> Option<&str> {
        self.tags.get(&group).map(String::as_str)
    }

    /// Parse `{"groups": [{"tag": "RED", "color": [200,50,50], "regions": [1,2]}]}`.
    ///
    /// Groups are numbered in file order starting at 1.
    pub fn from_json(text: &str) -> Result<Self, BorderError> {
        let file: OwnerFile = serde_json::from_str(text)?;
        let mut table = OwnerTable::new();
        for (i, entry) in file.groups.into_iter().enumerate() {
            let group = GroupId(i as u32 + 1);
            for region in entry.regions {
                if region.is_background() {
                    return Err(BorderError::Owners(format!(
                        "group '{}' lists background region 0",
                        entry.tag
                    )));
                }
                if let Some(prev) = table.owners.insert(region, group) {
                    let prev_tag = table.tags.get(&prev).cloned().unwrap_or_default();
                    return Err(BorderError::Owners(format!(
                        "region {region} owned by both '{prev_tag}' and '{}'",
                        entry.tag
                    )));
                }
            }
            if let Some(rgb) = entry.color {
                table.colors.insert(group, rgb);
            }
            table.tags.insert(group, entry.tag);
        }
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self, BorderError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

impl OwnerLookup for OwnerTable {
    fn owner_of(&self, region: RegionId) -> Option<GroupId> {
        self.owners.get(&region).copied()
    }

    fn group_color(&self, group: GroupId) -> Option<[u8; 3]> {
        self.colors.get(&group).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_groups_in_file_order() {
        let table = OwnerTable::from_json(
            r#"{"groups": [
                {"tag": "RED", "color": [200, 50, 50], "regions": [1, 2]},
                {"tag": "BLU", "regions": [3]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(table.owner_of(RegionId(2)), Some(GroupId(1)));
        assert_eq!(table.owner_of(RegionId(3)), Some(GroupId(2)));
        assert_eq!(table.owner_of(RegionId(4)), None);
        assert_eq!(table.group_color(GroupId(1)), Some([200, 50, 50]));
        assert_eq!(table.tag_of(GroupId(2)), Some("BLU"));
    }

    #[test]
    fn rejects_double_ownership() {
        let err = OwnerTable::from_json(
            r#"{"groups": [{"tag": "A", "regions": [1]}, {"tag": "B", "regions": [1]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, BorderError::Owners(_)));
    }
}
