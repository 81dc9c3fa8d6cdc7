//! Version parsing and "is at least" comparison.
//!
//! Package references in the wild carry two to four dot-separated components
//! (`0.26.0`, `0.26.0.0`). Only the first three matter for the audit; a
//! fourth component is dropped during parsing.

use std::fmt;

/// A version truncated to at most three numeric components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SemVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemVersion {
    /// Parses up to three numeric components, ignoring anything after the
    /// third. Returns `None` when any of the first three components is not
    /// a plain integer.
    pub fn parse(version: &str) -> Option<Self> {
        let mut components = version.trim().split('.').take(3);

        let major = components.next()?.parse().ok()?;
        let minor = components.next().map_or(Some(0), |c| c.parse().ok())?;
        let patch = components.next().map_or(Some(0), |c| c.parse().ok())?;

        Some(Self {
            major,
            minor,
            patch,
        })
    }

    /// True when `self` is the same as or newer than `desired`.
    ///
    /// Comparison is strict left-to-right: the first differing component
    /// decides, so `1.0.0` is at least `0.99.99`.
    pub fn is_at_least(&self, desired: &SemVersion) -> bool {
        self >= desired
    }
}

impl fmt::Display for SemVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Truncates a version string to its first three components.
///
/// Unparseable input is returned unchanged so report cells still show what
/// the descriptor declared.
pub fn format_version(version: &str) -> String {
    match SemVersion::parse(version) {
        Some(v) => v.to_string(),
        None => version.trim().to_string(),
    }
}

/// True when `current` is up to date relative to `desired`.
///
/// An absent current version is vacuously up to date: no reference means
/// there is nothing to violate.
pub fn is_up_to_date(current: Option<&str>, desired: &str) -> bool {
    let Some(current) = current else {
        return true;
    };
    if current.trim().is_empty() {
        return true;
    }

    match (SemVersion::parse(current), SemVersion::parse(desired)) {
        (Some(cur), Some(des)) => cur.is_at_least(&des),
        // Give the addin the benefit of the doubt when either side is
        // unparseable; the raw string still shows up in the report.
        _ => true,
    }
}
