//! Instance listing → region/role roster.

use indexmap::IndexMap;
use patchgrid_core::config::InventoryConfig;
use patchgrid_core::{HostRoster, Instance};
use serde::Deserialize;
use tracing::debug;

use crate::error::InventoryError;

/// Region assigned to instances without a region label.
pub const UNKNOWN_REGION: &str = "unknown";

/// The subset of `gcloud compute instances list --format=json` we read.
#[derive(Debug, Deserialize)]
struct ListedInstance {
    name: String,
    /// Kept in listing order: the first `role*` key wins.
    labels: IndexMap<String, String>,
}

/// Parse a JSON instance listing.
///
/// Every instance must carry a `labels` object; anything else is malformed
/// label data and fails the whole listing.
pub fn parse_instances(
    json: &str,
    config: &InventoryConfig,
) -> Result<Vec<Instance>, InventoryError> {
    let listed: Vec<ListedInstance> = serde_json::from_str(json)?;

    Ok(listed
        .into_iter()
        .map(|instance| {
            let role = instance
                .labels
                .iter()
                .find(|(key, _)| key.starts_with(&config.role_label_prefix))
                .map(|(_, value)| value.clone());
            let region = instance
                .labels
                .get(&config.region_label)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_REGION.to_string());
            Instance {
                name: instance.name,
                region,
                role,
            }
        })
        .collect())
}

/// Bucket instances by region and role, then reverse each host list.
///
/// The input is expected in the provider's name-sorted order, so after the
/// reversal the most recently listed host of each role comes first.
/// Instances without a role are left out.
pub fn build_roster(instances: &[Instance]) -> HostRoster {
    let mut roster = HostRoster::new();

    for instance in instances {
        let Some(role) = &instance.role else {
            debug!(host = %instance.name, "no role label, skipping");
            continue;
        };
        roster
            .entry(instance.region.clone())
            .or_default()
            .entry(role.clone())
            .or_default()
            .push(instance.name.clone());
    }

    for hosts_by_role in roster.values_mut() {
        for hosts in hosts_by_role.values_mut() {
            hosts.reverse();
        }
    }

    roster
}
