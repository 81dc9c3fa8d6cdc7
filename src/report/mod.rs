//! Report collaborators.
//!
//! Renderers consume the final, fully-classified record collection
//! read-only and produce a text artifact. Records carrying diagnostic
//! notes are excluded from the classified tables and listed separately, so
//! audit statistics cover cleanly-processed addins only.

mod markdown;
mod spreadsheet;

use crate::models::{AddinMetadata, CakeVersion};

pub use markdown::MarkdownRenderer;
pub use spreadsheet::SpreadsheetRenderer;

pub trait ReportRenderer: Send + Sync {
    /// File name of the produced artifact, relative to the work dir.
    fn file_name(&self) -> &'static str;

    fn render(&self, addins: &[AddinMetadata], cake: &CakeVersion) -> String;
}

/// Records in report order: audited addins sorted by name.
fn sorted<'a>(addins: &'a [AddinMetadata]) -> Vec<&'a AddinMetadata> {
    let mut sorted: Vec<&AddinMetadata> = addins.iter().collect();
    sorted.sort_by_key(|a| a.name.to_lowercase());
    sorted
}

fn audited<'a>(addins: &'a [AddinMetadata]) -> Vec<&'a AddinMetadata> {
    sorted(addins)
        .into_iter()
        .filter(|a| !a.analysis.has_notes())
        .collect()
}

fn exceptions<'a>(addins: &'a [AddinMetadata]) -> Vec<&'a AddinMetadata> {
    sorted(addins)
        .into_iter()
        .filter(|a| a.analysis.has_notes())
        .collect()
}
