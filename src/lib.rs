//! cake-addin-audit - ecosystem audit for Cake addins
//!
//! This library discovers Cake addins across multiple listings, crawls each
//! addin's source repository for its build metadata, and classifies every
//! addin against the recommended Cake version.
//!
//! # Core Concepts
//!
//! - **Discovery**: harvesting addin records from the website's YAML
//!   listing and the curated markdown status page, then merging them into
//!   one record per addin
//! - **Enrichment**: an ordered pipeline of steps that each fan out over
//!   the record set concurrently, fill in missing fields, and isolate
//!   per-record failures into that record's note log
//! - **Snapshots**: the full record set is persisted after every mutating
//!   step so an interrupted crawl resumes where it stopped
//! - **Classification**: pure derivation of compliance flags (reference
//!   freshness, reference privacy, target framework, packaged icon) from
//!   the finished records
//!
//! # Project Structure
//!
//! - [`pipeline`]: the step orchestrator and the steps themselves
//! - [`github`]: the repository-host abstraction and its REST client
//! - [`descriptor`]: static MSBuild project-file parsing
//! - [`report`]: markdown and spreadsheet renderers

pub mod analysis;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod github;
pub mod locator;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod snapshot;
pub mod util;
pub mod version;

pub use config::{AuditOptions, ConfigError};
pub use error::HostError;
pub use github::{GithubHost, MockRepositoryHost, RepositoryHost};
pub use models::{AddinMetadata, AnalysisResult, CakeVersion, DiscoverySource, PackageReference};
pub use pipeline::{Orchestrator, RunContext, RunServices};
pub use registry::{NugetNormalizer, UrlNormalizer};
pub use snapshot::SnapshotStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
