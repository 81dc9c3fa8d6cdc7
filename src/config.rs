use crate::models::CakeVersion;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

pub const PRODUCT_NAME: &str = "cake-addin-audit";

/// Tracked core dependencies; the audit reports freshness and privacy for
/// each of them individually.
pub const CAKE_CORE_PACKAGE: &str = "Cake.Core";
pub const CAKE_COMMON_PACKAGE: &str = "Cake.Common";

/// The icon every addin package is expected to declare, byte for byte.
pub const EXPECTED_ICON_URL: &str =
    "https://cdn.jsdelivr.net/gh/cake-contrib/graphics/png/cake-contrib-medium.png";

/// Where the YAML discovery source lives: one `.yml` file per addin.
pub const YAML_LISTING_OWNER: &str = "cake-build";
pub const YAML_LISTING_REPO: &str = "website";
pub const YAML_LISTING_PATH: &str = "addins";

/// Where the curated markdown listing lives and which of its sections are
/// harvested.
pub const CURATED_LISTING_OWNER: &str = "cake-contrib";
pub const CURATED_LISTING_REPO: &str = "home";
pub const CURATED_LISTING_PATH: &str = "Status.md";
pub const CURATED_LISTING_SECTIONS: &[&str] = &["Recipes", "Modules", "Addins"];

/// Audited Cake releases, oldest first. The audit classifies against the
/// last entry unless `--cake-version` selects another.
pub const CAKE_VERSIONS: &[CakeVersion] = &[
    CakeVersion {
        version: "0.26.0",
        required_framework: "netstandard2.0",
        optional_frameworks: &["net46", "net461"],
    },
    CakeVersion {
        version: "0.33.0",
        required_framework: "netstandard2.0",
        optional_frameworks: &["net461", "net462"],
    },
    CakeVersion {
        version: "1.0.0",
        required_framework: "netstandard2.0",
        optional_frameworks: &["net461", "net5.0"],
    },
];

const DEFAULT_CONCURRENCY: usize = 16;
const DEFAULT_OP_TIMEOUT_SECS: u64 = 30;
const SNAPSHOT_FILE_NAME: &str = "addins.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Unknown Cake version: {0}. Known versions: {1}")]
    UnknownCakeVersion(String, String),
}

/// Run options, built from CLI arguments with environment fallbacks.
#[derive(Debug, Clone)]
pub struct AuditOptions {
    pub github_token: Option<String>,
    /// Login the remediation stage files issues and pull requests as.
    pub github_user: Option<String>,
    pub work_dir: PathBuf,
    pub clear_cache: bool,
    pub concurrency: usize,
    pub op_timeout_secs: u64,
    pub cake_version: CakeVersion,
    pub create_issues: bool,
    pub submit_prs: bool,
    pub markdown_report: bool,
    pub spreadsheet_report: bool,
}

impl Default for AuditOptions {
    fn default() -> Self {
        let github_token = env::var("CAKE_AUDIT_GITHUB_TOKEN")
            .or_else(|_| env::var("GITHUB_TOKEN"))
            .ok();

        let github_user = env::var("CAKE_AUDIT_GITHUB_USER").ok();

        let work_dir = env::var("CAKE_AUDIT_WORK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::cache_dir()
                    .unwrap_or_else(env::temp_dir)
                    .join(PRODUCT_NAME)
            });

        let concurrency = env::var("CAKE_AUDIT_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CONCURRENCY);

        let op_timeout_secs = env::var("CAKE_AUDIT_OP_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_OP_TIMEOUT_SECS);

        Self {
            github_token,
            github_user,
            work_dir,
            clear_cache: false,
            concurrency,
            op_timeout_secs,
            cake_version: CAKE_VERSIONS[CAKE_VERSIONS.len() - 1],
            create_issues: false,
            submit_prs: false,
            markdown_report: true,
            spreadsheet_report: true,
        }
    }
}

impl AuditOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ValidationFailed(
                "Concurrency must be at least 1".to_string(),
            ));
        }
        if self.concurrency > 256 {
            return Err(ConfigError::ValidationFailed(
                "Concurrency cannot exceed 256".to_string(),
            ));
        }

        if self.op_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Operation timeout must be at least 1 second".to_string(),
            ));
        }
        if self.op_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Operation timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        if self.submit_prs && !self.create_issues {
            return Err(ConfigError::ValidationFailed(
                "Submitting pull requests requires issue creation to be enabled".to_string(),
            ));
        }
        if (self.create_issues || self.submit_prs) && self.github_user.is_none() {
            return Err(ConfigError::ValidationFailed(
                "Remediation requires a GitHub user (set CAKE_AUDIT_GITHUB_USER)".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolves a `--cake-version` argument against the known versions.
    pub fn select_cake_version(&mut self, version: &str) -> Result<(), ConfigError> {
        match CAKE_VERSIONS.iter().find(|v| v.version == version) {
            Some(found) => {
                self.cake_version = *found;
                Ok(())
            }
            None => Err(ConfigError::UnknownCakeVersion(
                version.to_string(),
                CAKE_VERSIONS
                    .iter()
                    .map(|v| v.version)
                    .collect::<Vec<_>>()
                    .join(", "),
            )),
        }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.work_dir.join(SNAPSHOT_FILE_NAME)
    }

    /// Folder the descriptor files of one addin are downloaded into.
    pub fn addin_folder(&self, addin_name: &str) -> PathBuf {
        let safe_name = addin_name.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");
        self.work_dir.join(safe_name)
    }
}
