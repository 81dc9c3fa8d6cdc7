use super::{audited, ReportRenderer};
use crate::models::{AddinMetadata, CakeVersion};

/// CSV rendition of the audit table; opens in any spreadsheet tool.
pub struct SpreadsheetRenderer;

fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row(cells: &[String]) -> String {
    cells
        .iter()
        .map(|c| csv_escape(c))
        .collect::<Vec<_>>()
        .join(",")
}

impl ReportRenderer for SpreadsheetRenderer {
    fn file_name(&self) -> &'static str {
        "AuditReport.csv"
    }

    fn render(&self, addins: &[AddinMetadata], _cake: &CakeVersion) -> String {
        let mut lines = vec![csv_row(&[
            "Addin".to_string(),
            "Repository".to_string(),
            "Cake Core Version".to_string(),
            "Cake Core IsPrivate".to_string(),
            "Cake Core IsUpToDate".to_string(),
            "Cake Common Version".to_string(),
            "Cake Common IsPrivate".to_string(),
            "Cake Common IsUpToDate".to_string(),
            "Framework".to_string(),
            "Expected Framework".to_string(),
            "Expected Icon".to_string(),
            "Open Issues".to_string(),
            "Open PRs".to_string(),
        ])];

        for addin in audited(addins) {
            let analysis = &addin.analysis;
            let count = |value: Option<u32>| {
                value.map(|v| v.to_string()).unwrap_or_default()
            };

            lines.push(csv_row(&[
                addin.name.clone(),
                addin.repository_url.clone().unwrap_or_default(),
                analysis.cake_core_version.clone().unwrap_or_default(),
                analysis.cake_core_is_private.to_string(),
                analysis.cake_core_is_up_to_date.to_string(),
                analysis.cake_common_version.clone().unwrap_or_default(),
                analysis.cake_common_is_private.to_string(),
                analysis.cake_common_is_up_to_date.to_string(),
                addin.frameworks.as_deref().unwrap_or(&[]).join(", "),
                analysis.targets_expected_framework.to_string(),
                analysis.uses_expected_icon.to_string(),
                count(addin.open_issues_count),
                count(addin.open_pull_requests_count),
            ]));
        }

        lines.join("\n") + "\n"
    }
}
