use super::{audited, exceptions, ReportRenderer};
use crate::models::{AddinMetadata, AnalysisResult, CakeVersion};
use chrono::Utc;
use std::fmt::Write;

const PASS_EMOJI: &str = ":heavy_check_mark:";
const FAIL_EMOJI: &str = ":x:";

pub struct MarkdownRenderer;

fn flagged(value: &str, meets_expectation: bool) -> String {
    format!(
        "{value} {}",
        if meets_expectation { PASS_EMOJI } else { FAIL_EMOJI }
    )
}

fn version_cells(version: Option<&str>, is_up_to_date: bool, is_private: bool) -> (String, String) {
    match version {
        // No tracked reference: nothing to grade, leave both cells blank.
        None => (String::new(), String::new()),
        Some(version) => (
            flagged(version, is_up_to_date),
            flagged(&is_private.to_string(), is_private),
        ),
    }
}

fn addin_row(addin: &AddinMetadata, analysis: &AnalysisResult) -> String {
    let name_cell = match addin.repository_url.as_deref() {
        Some(url) => format!("[{}]({url})", addin.name),
        None => addin.name.clone(),
    };

    let (core_version, core_private) = version_cells(
        analysis.cake_core_version.as_deref(),
        analysis.cake_core_is_up_to_date,
        analysis.cake_core_is_private,
    );
    let (common_version, common_private) = version_cells(
        analysis.cake_common_version.as_deref(),
        analysis.cake_common_is_up_to_date,
        analysis.cake_common_is_private,
    );

    let frameworks = addin.frameworks.as_deref().unwrap_or(&[]).join(", ");
    let framework_cell = if frameworks.is_empty() {
        String::new()
    } else {
        flagged(&frameworks, analysis.targets_expected_framework)
    };

    let icon_cell = flagged(
        &analysis.uses_expected_icon.to_string(),
        analysis.uses_expected_icon,
    );

    format!(
        "| {name_cell} | {core_version} | {core_private} | {common_version} | {common_private} | {framework_cell} | {icon_cell} |"
    )
}

impl ReportRenderer for MarkdownRenderer {
    fn file_name(&self) -> &'static str {
        "AuditReport.md"
    }

    fn render(&self, addins: &[AddinMetadata], cake: &CakeVersion) -> String {
        let audited = audited(addins);
        let exceptions = exceptions(addins);
        let now = Utc::now();

        let mut markdown = String::new();
        let _ = writeln!(markdown, "# Audit Report for Cake {}", cake.version);
        let _ = writeln!(markdown);
        let _ = writeln!(
            markdown,
            "This report was generated by cake-addin-audit {} on {} GMT",
            env!("CARGO_PKG_VERSION"),
            now.format("%B %e, %Y at %H:%M:%S")
        );
        let _ = writeln!(markdown);

        let _ = writeln!(markdown, "## Statistics");
        let _ = writeln!(markdown);
        let _ = writeln!(
            markdown,
            "- The analysis discovered {} addins",
            addins.len()
        );
        let _ = writeln!(
            markdown,
            "  - {} were successfully audited",
            audited.len()
        );
        let _ = writeln!(
            markdown,
            "  - {} could not be audited (see the 'Exceptions' section)",
            exceptions.len()
        );
        let _ = writeln!(markdown);

        let referencing_core: Vec<_> = audited
            .iter()
            .filter(|a| a.analysis.cake_core_version.is_some())
            .collect();
        let _ = writeln!(
            markdown,
            "- Of the {} audited addins that reference Cake.Core:",
            referencing_core.len()
        );
        let _ = writeln!(
            markdown,
            "  - {} target the desired version of Cake.Core",
            referencing_core
                .iter()
                .filter(|a| a.analysis.cake_core_is_up_to_date)
                .count()
        );
        let _ = writeln!(
            markdown,
            "  - {} have marked the reference to Cake.Core as private",
            referencing_core
                .iter()
                .filter(|a| a.analysis.cake_core_is_private)
                .count()
        );
        let _ = writeln!(markdown);

        let referencing_common: Vec<_> = audited
            .iter()
            .filter(|a| a.analysis.cake_common_version.is_some())
            .collect();
        let _ = writeln!(
            markdown,
            "- Of the {} audited addins that reference Cake.Common:",
            referencing_common.len()
        );
        let _ = writeln!(
            markdown,
            "  - {} target the desired version of Cake.Common",
            referencing_common
                .iter()
                .filter(|a| a.analysis.cake_common_is_up_to_date)
                .count()
        );
        let _ = writeln!(
            markdown,
            "  - {} have marked the reference to Cake.Common as private",
            referencing_common
                .iter()
                .filter(|a| a.analysis.cake_common_is_private)
                .count()
        );
        let _ = writeln!(markdown);

        let _ = writeln!(markdown, "## Addins");
        let _ = writeln!(markdown);
        let _ = writeln!(
            markdown,
            "| Addin | Cake Core Version | Cake Core IsPrivate | Cake Common Version | Cake Common IsPrivate | Framework | Icon |"
        );
        let _ = writeln!(
            markdown,
            "| --- | :---: | :---: | :---: | :---: | --- | :---: |"
        );
        for addin in &audited {
            let _ = writeln!(markdown, "{}", addin_row(addin, &addin.analysis));
        }

        let _ = writeln!(markdown);
        let _ = writeln!(markdown, "## Exceptions");
        let _ = writeln!(markdown);
        for addin in &exceptions {
            let first_note = addin
                .analysis
                .notes
                .first()
                .map(String::as_str)
                .unwrap_or_default();
            let _ = writeln!(markdown, "**{}**: {}", addin.name, first_note);
            let _ = writeln!(markdown);
        }

        markdown
    }
}
