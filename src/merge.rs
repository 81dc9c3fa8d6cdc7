//! Deduplication of records harvested from multiple discovery sources.

use crate::models::AddinMetadata;
use tracing::debug;

/// Collapses per-source record lists into one record per distinct name
/// (case-insensitive).
///
/// Within a name group the first **linked** member wins; group order is
/// source-list order, so the tie-break is deterministic. A group with no
/// linked member survives only through its first member that still carries
/// a fallback URL (typically a package-registry link) — fully empty
/// duplicates are dropped.
pub fn merge_addins(discovered: Vec<AddinMetadata>) -> Vec<AddinMetadata> {
    let mut groups: Vec<(String, Vec<AddinMetadata>)> = Vec::new();

    for addin in discovered {
        let key = addin.name.to_lowercase();
        match groups.iter_mut().find(|(name, _)| *name == key) {
            Some((_, group)) => group.push(addin),
            None => groups.push((key, vec![addin])),
        }
    }

    let mut merged = Vec::new();
    for (name, mut group) in groups {
        let keep = match group.iter().position(|a| a.is_linked()) {
            Some(index) => Some(group.swap_remove(index)),
            None => group
                .iter()
                .position(|a| a.repository_url.is_some())
                .map(|index| group.swap_remove(index)),
        };

        match keep {
            Some(addin) => merged.push(addin),
            None => debug!(name = %name, "dropping duplicate group with no usable URL"),
        }
    }

    merged
}
