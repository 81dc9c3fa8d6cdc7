//! Data model threaded through the audit pipeline.

mod addin;
mod cake;

pub use addin::{AddinMetadata, AnalysisResult, DiscoverySource, PackageReference};
pub use cake::CakeVersion;
