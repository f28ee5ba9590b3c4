//! Deals each role's host list into numbered patch groups.
//!
//! 1. Non-reserved roles are transposed: group `i+1` gets host `i` of every
//!    role long enough to have one.
//! 2. The reserved role is confined to groups 1 and 2: a single host joins
//!    group 1, otherwise the first half (floor) joins group 2 and the rest
//!    joins group 1.
//! 3. Empty groups are never materialized.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use patchgrid_core::{HostRoster, RoleHosts, group_name};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

/// Patch groups of one region, keyed by 1-based index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchGroups {
    groups: BTreeMap<u32, Vec<String>>,
}

impl PatchGroups {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, index: u32, host: &str) {
        self.groups.entry(index).or_default().push(host.to_string());
    }

    fn extend(&mut self, index: u32, hosts: &[String]) {
        if hosts.is_empty() {
            return;
        }
        self.groups.entry(index).or_default().extend_from_slice(hosts);
    }

    /// Hosts of group `index`, if the group has any.
    pub fn get(&self, index: u32) -> Option<&[String]> {
        self.groups.get(&index).map(Vec::as_slice)
    }

    /// Number of non-empty groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn host_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Group indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.groups.keys().copied()
    }

    /// `(pg<N>, hosts)` in ascending group order.
    pub fn iter(&self) -> impl Iterator<Item = (String, &[String])> + '_ {
        self.groups
            .iter()
            .map(|(index, hosts)| (group_name(*index), hosts.as_slice()))
    }
}

impl Serialize for PatchGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (name, hosts) in self.iter() {
            map.serialize_entry(&name, hosts)?;
        }
        map.end()
    }
}

/// Partition one region's role → hosts mapping into patch groups.
pub fn create_patch_groups(hosts_by_role: &RoleHosts, reserved_role: &str) -> PatchGroups {
    let regular: Vec<&Vec<String>> = hosts_by_role
        .iter()
        .filter(|(role, _)| role.as_str() != reserved_role)
        .map(|(_, hosts)| hosts)
        .collect();

    let max_hosts = regular.iter().map(|hosts| hosts.len()).max().unwrap_or(0);
    let mut groups = PatchGroups::new();

    for i in 0..max_hosts {
        let index = i as u32 + 1;
        for hosts in &regular {
            if let Some(host) = hosts.get(i) {
                groups.push(index, host);
            }
        }
    }

    if let Some(reserved) = hosts_by_role.get(reserved_role) {
        match reserved.len() {
            0 => {}
            1 => groups.extend(1, reserved),
            n => {
                let mid = n / 2;
                groups.extend(2, &reserved[..mid]);
                groups.extend(1, &reserved[mid..]);
            }
        }
        debug!(role = reserved_role, hosts = reserved.len(), "placed reserved role");
    }

    debug!(
        groups = groups.len(),
        hosts = groups.host_count(),
        "computed patch groups"
    );
    groups
}

/// Partition every region of a roster.
pub fn partition_roster(roster: &HostRoster, reserved_role: &str) -> IndexMap<String, PatchGroups> {
    roster
        .iter()
        .map(|(region, hosts_by_role)| {
            (region.clone(), create_patch_groups(hosts_by_role, reserved_role))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const RESERVED: &str = "be-sharddb";

    fn roles(entries: &[(&str, &[&str])]) -> RoleHosts {
        entries
            .iter()
            .map(|(role, hosts)| {
                (
                    role.to_string(),
                    hosts.iter().map(|h| h.to_string()).collect(),
                )
            })
            .collect()
    }

    fn group(groups: &PatchGroups, index: u32) -> Vec<&str> {
        groups
            .get(index)
            .unwrap_or_default()
            .iter()
            .map(String::as_str)
            .collect()
    }

    #[test]
    fn round_robin_transpose() {
        let input = roles(&[("web", &["a", "b", "c"]), ("db", &["x"])]);
        let groups = create_patch_groups(&input, RESERVED);

        assert_eq!(groups.len(), 3);
        assert_eq!(group(&groups, 1), vec!["a", "x"]);
        assert_eq!(group(&groups, 2), vec!["b"]);
        assert_eq!(group(&groups, 3), vec!["c"]);
    }

    #[test]
    fn group_i_holds_ith_host_of_each_role() {
        let input = roles(&[
            ("web", &["w1", "w2", "w3", "w4"]),
            ("api", &["a1", "a2"]),
            ("cache", &["c1", "c2", "c3"]),
        ]);
        let groups = create_patch_groups(&input, RESERVED);

        assert_eq!(group(&groups, 1), vec!["w1", "a1", "c1"]);
        assert_eq!(group(&groups, 2), vec!["w2", "a2", "c2"]);
        assert_eq!(group(&groups, 3), vec!["w3", "c3"]);
        assert_eq!(group(&groups, 4), vec!["w4"]);
    }

    #[test]
    fn every_host_in_exactly_one_group() {
        let input = roles(&[
            ("web", &["w1", "w2", "w3", "w4", "w5"]),
            ("api", &["a1"]),
            (RESERVED, &["s1", "s2", "s3", "s4"]),
            ("queue", &["q1", "q2"]),
        ]);
        let groups = create_patch_groups(&input, RESERVED);

        let mut seen = HashSet::new();
        for (_, hosts) in groups.iter() {
            for host in hosts {
                assert!(seen.insert(host.clone()), "{host} placed twice");
            }
        }
        let expected: usize = input.values().map(Vec::len).sum();
        assert_eq!(seen.len(), expected);
        assert_eq!(groups.host_count(), expected);
    }

    #[test]
    fn indices_are_contiguous_from_one() {
        let input = roles(&[("web", &["a", "b", "c", "d"]), (RESERVED, &["s1", "s2"])]);
        let groups = create_patch_groups(&input, RESERVED);

        let indices: Vec<u32> = groups.indices().collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
    }

    #[test]
    fn reserved_single_host_goes_to_group_one() {
        let input = roles(&[("web", &["a", "b"]), (RESERVED, &["s1"])]);
        let groups = create_patch_groups(&input, RESERVED);

        assert_eq!(group(&groups, 1), vec!["a", "s1"]);
        assert_eq!(group(&groups, 2), vec!["b"]);
    }

    #[test]
    fn reserved_single_host_alone() {
        let input = roles(&[(RESERVED, &["s1"])]);
        let groups = create_patch_groups(&input, RESERVED);

        assert_eq!(groups.len(), 1);
        assert_eq!(group(&groups, 1), vec!["s1"]);
        assert!(groups.get(2).is_none());
    }

    #[test]
    fn reserved_odd_split() {
        // mid = 1: first half to pg2, the rest to pg1.
        let input = roles(&[(RESERVED, &["h1", "h2", "h3"])]);
        let groups = create_patch_groups(&input, RESERVED);

        assert_eq!(group(&groups, 2), vec!["h1"]);
        assert_eq!(group(&groups, 1), vec!["h2", "h3"]);
    }

    #[test]
    fn reserved_appended_after_regular_roles() {
        let input = roles(&[
            (RESERVED, &["h1", "h2", "h3", "h4"]),
            ("web", &["a", "b", "c"]),
        ]);
        let groups = create_patch_groups(&input, RESERVED);

        assert_eq!(group(&groups, 1), vec!["a", "h3", "h4"]);
        assert_eq!(group(&groups, 2), vec!["b", "h1", "h2"]);
        assert_eq!(group(&groups, 3), vec!["c"]);
    }

    #[test]
    fn reserved_confined_to_first_two_groups() {
        let input = roles(&[
            ("web", &["w1", "w2", "w3", "w4", "w5", "w6"]),
            (RESERVED, &["s1", "s2", "s3", "s4", "s5", "s6", "s7"]),
        ]);
        let groups = create_patch_groups(&input, RESERVED);

        for (name, hosts) in groups.iter() {
            if name != "pg1" && name != "pg2" {
                assert!(hosts.iter().all(|h| !h.starts_with('s')), "{name}: {hosts:?}");
            }
        }
        assert_eq!(group(&groups, 2), vec!["w2", "s1", "s2", "s3"]);
        assert_eq!(group(&groups, 1), vec!["w1", "s4", "s5", "s6", "s7"]);
    }

    #[test]
    fn reserved_role_with_no_hosts_adds_nothing() {
        let input = roles(&[("web", &["a"]), (RESERVED, &[])]);
        let groups = create_patch_groups(&input, RESERVED);

        assert_eq!(groups.len(), 1);
        assert_eq!(group(&groups, 1), vec!["a"]);
    }

    #[test]
    fn empty_roles_yield_no_groups() {
        let groups = create_patch_groups(&RoleHosts::new(), RESERVED);
        assert!(groups.is_empty());

        let only_empty = roles(&[("web", &[]), ("db", &[])]);
        assert!(create_patch_groups(&only_empty, RESERVED).is_empty());
    }

    #[test]
    fn reserved_role_name_is_configurable() {
        let input = roles(&[("shard", &["s1", "s2"]), ("be-sharddb", &["b1", "b2", "b3"])]);
        let groups = create_patch_groups(&input, "shard");

        // be-sharddb is an ordinary role here.
        assert_eq!(group(&groups, 1), vec!["b1", "s2"]);
        assert_eq!(group(&groups, 2), vec!["b2", "s1"]);
        assert_eq!(group(&groups, 3), vec!["b3"]);
    }

    #[test]
    fn partition_roster_per_region() {
        let mut roster = HostRoster::new();
        roster.insert("us-east1".to_string(), roles(&[("web", &["e1", "e2"])]));
        roster.insert("europe-west4".to_string(), roles(&[(RESERVED, &["s1"])]));

        let by_region = partition_roster(&roster, RESERVED);
        let regions: Vec<&str> = by_region.keys().map(String::as_str).collect();
        assert_eq!(regions, vec!["us-east1", "europe-west4"]);
        assert_eq!(by_region["us-east1"].len(), 2);
        assert_eq!(group(&by_region["europe-west4"], 1), vec!["s1"]);
    }

    #[test]
    fn serializes_as_named_groups() {
        let input = roles(&[("web", &["a", "b"])]);
        let groups = create_patch_groups(&input, RESERVED);
        let json = serde_json::to_string(&groups).unwrap();
        assert_eq!(json, r#"{"pg1":["a"],"pg2":["b"]}"#);
    }
}
