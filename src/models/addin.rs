use crate::util::derive_repo_info;
use crate::version::{format_version, SemVersion};
use serde::{Deserialize, Serialize};

/// Which listing a record was first harvested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscoverySource {
    YamlListing,
    CuratedListing,
}

/// A package reference declared in a build descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageReference {
    pub id: String,
    pub version: Option<String>,
    pub is_private: bool,
}

/// Derived compliance flags, recomputed from scratch each run.
///
/// `notes` is the record's diagnostic log: one line per recoverable error
/// encountered while enriching this record, tagged with the stage that
/// produced it. A record with any note is reported in the exceptions
/// section instead of the audit tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub cake_core_version: Option<String>,
    pub cake_core_is_private: bool,
    pub cake_core_is_up_to_date: bool,
    pub cake_common_version: Option<String>,
    pub cake_common_is_private: bool,
    pub cake_common_is_up_to_date: bool,
    pub targets_expected_framework: bool,
    pub uses_expected_icon: bool,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl AnalysisResult {
    pub fn has_notes(&self) -> bool {
        !self.notes.is_empty()
    }
}

/// One row per discovered addin, progressively enriched by the pipeline.
///
/// Optional fields distinguish "not yet searched" (`None`) from "searched
/// and found empty" (`Some` with an empty collection); downstream stages
/// only ever fill absent fields in, never clear them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddinMetadata {
    pub name: String,
    pub source: DiscoverySource,
    pub repository_url: Option<String>,
    pub repository_owner: Option<String>,
    pub repository_name: Option<String>,
    pub solution_path: Option<String>,
    pub project_paths: Option<Vec<String>>,
    pub references: Option<Vec<PackageReference>>,
    pub frameworks: Option<Vec<String>>,
    pub icon_url: Option<String>,
    pub open_issues_count: Option<u32>,
    pub open_pull_requests_count: Option<u32>,
    #[serde(default)]
    pub analysis: AnalysisResult,
}

impl AddinMetadata {
    pub fn new(name: impl Into<String>, source: DiscoverySource) -> Self {
        Self {
            name: name.into(),
            source,
            repository_url: None,
            repository_owner: None,
            repository_name: None,
            solution_path: None,
            project_paths: None,
            references: None,
            frameworks: None,
            icon_url: None,
            open_issues_count: None,
            open_pull_requests_count: None,
            analysis: AnalysisResult::default(),
        }
    }

    /// A record is linked once its source repository owner and name are
    /// both known.
    pub fn is_linked(&self) -> bool {
        self.repository_owner.as_deref().is_some_and(|o| !o.is_empty())
            && self.repository_name.as_deref().is_some_and(|n| !n.is_empty())
    }

    /// Derives `repository_owner`/`repository_name` from `repository_url`
    /// when the URL points at a known source host. Already-derived fields
    /// are left alone.
    pub fn link_from_url(&mut self) {
        if self.is_linked() {
            return;
        }
        if let Some((owner, name)) = self.repository_url.as_deref().and_then(derive_repo_info) {
            self.repository_owner = Some(owner);
            self.repository_name = Some(name);
        }
    }

    /// Appends a diagnostic note tagged with the stage that produced it.
    pub fn add_note(&mut self, stage: &str, message: impl AsRef<str>) {
        self.analysis
            .notes
            .push(format!("{}: {}", stage, message.as_ref()));
    }

    /// Collapses raw references into one entry per package id, keeping the
    /// lowest declared version and marking the result private only when
    /// every occurrence is private.
    pub fn set_references(&mut self, raw: Vec<PackageReference>) {
        let mut deduped: Vec<PackageReference> = Vec::new();

        for reference in raw {
            match deduped.iter_mut().find(|r| r.id == reference.id) {
                Some(existing) => {
                    existing.is_private = existing.is_private && reference.is_private;
                    if is_lower_version(reference.version.as_deref(), existing.version.as_deref()) {
                        existing.version = reference.version;
                    }
                }
                None => deduped.push(reference),
            }
        }

        for reference in &mut deduped {
            if let Some(v) = &reference.version {
                reference.version = Some(format_version(v));
            }
        }

        self.references = Some(deduped);
    }
}

/// True when `candidate` sorts below `current`. Versions compare
/// numerically where possible, falling back to string order; an absent
/// version never replaces a present one.
fn is_lower_version(candidate: Option<&str>, current: Option<&str>) -> bool {
    match (candidate, current) {
        (Some(c), Some(e)) => match (SemVersion::parse(c), SemVersion::parse(e)) {
            (Some(c), Some(e)) => c < e,
            _ => c < e,
        },
        (Some(_), None) | (None, _) => false,
    }
}
