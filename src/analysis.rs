//! Compliance classification of a fully-enriched addin record.

use crate::config::{CAKE_COMMON_PACKAGE, CAKE_CORE_PACKAGE};
use crate::models::{AddinMetadata, AnalysisResult, CakeVersion, PackageReference};
use crate::version::{is_up_to_date, SemVersion};

/// Computes the compliance flags for one record against one Cake release.
///
/// Pure: the result depends only on the record's current metadata and the
/// configured target, never on a previous run's analysis. The caller is
/// responsible for carrying over the record's diagnostic notes.
pub fn classify(
    addin: &AddinMetadata,
    cake: &CakeVersion,
    expected_icon_url: &str,
) -> AnalysisResult {
    let references = addin.references.as_deref().unwrap_or(&[]);

    let core = classify_dependency(references, CAKE_CORE_PACKAGE, cake);
    let common = classify_dependency(references, CAKE_COMMON_PACKAGE, cake);

    let frameworks = addin.frameworks.as_deref().unwrap_or(&[]);

    AnalysisResult {
        cake_core_version: core.version,
        cake_core_is_private: core.is_private,
        cake_core_is_up_to_date: core.is_up_to_date,
        cake_common_version: common.version,
        cake_common_is_private: common.is_private,
        cake_common_is_up_to_date: common.is_up_to_date,
        targets_expected_framework: cake.frameworks_conform(frameworks),
        uses_expected_icon: addin.icon_url.as_deref() == Some(expected_icon_url),
        notes: Vec::new(),
    }
}

struct DependencyFlags {
    version: Option<String>,
    is_private: bool,
    is_up_to_date: bool,
}

/// Flags for one tracked dependency. The least-upgraded matching reference
/// determines freshness; privacy holds only when every match is private.
/// No matching reference at all is compliant by default.
fn classify_dependency(
    references: &[PackageReference],
    package_id: &str,
    cake: &CakeVersion,
) -> DependencyFlags {
    let matches: Vec<&PackageReference> =
        references.iter().filter(|r| r.id == package_id).collect();

    if matches.is_empty() {
        return DependencyFlags {
            version: None,
            is_private: true,
            is_up_to_date: true,
        };
    }

    let version = matches
        .iter()
        .filter_map(|r| r.version.as_deref())
        .min_by(|a, b| match (SemVersion::parse(a), SemVersion::parse(b)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => a.cmp(b),
        })
        .map(str::to_string);

    DependencyFlags {
        is_private: matches.iter().all(|r| r.is_private),
        is_up_to_date: is_up_to_date(version.as_deref(), cake.version),
        version,
    }
}
