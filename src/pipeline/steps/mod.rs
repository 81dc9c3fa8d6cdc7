// Audit pipeline steps, in execution order.
//
// Discovery populates the record set, merge collapses duplicates, the
// enrichment steps progressively fill in per-record fields, analyze derives
// the compliance flags and the trailing steps act on the finished set.

use super::step::Step;

#[path = "01_discover_yaml.rs"]
pub mod discover_yaml;
#[path = "02_discover_curated.rs"]
pub mod discover_curated;
#[path = "03_merge.rs"]
pub mod merge;
#[path = "04_reset_analysis.rs"]
pub mod reset_analysis;
#[path = "05_normalize_urls.rs"]
pub mod normalize_urls;
#[path = "06_find_solution.rs"]
pub mod find_solution;
#[path = "07_find_projects.rs"]
pub mod find_projects;
#[path = "08_download_projects.rs"]
pub mod download_projects;
#[path = "09_find_references.rs"]
pub mod find_references;
#[path = "10_find_frameworks.rs"]
pub mod find_frameworks;
#[path = "11_github_activity.rs"]
pub mod github_activity;
#[path = "12_find_icon.rs"]
pub mod find_icon;
#[path = "13_analyze.rs"]
pub mod analyze;
#[path = "14_create_issues.rs"]
pub mod create_issues;
#[path = "15_markdown_report.rs"]
pub mod markdown_report;
#[path = "16_spreadsheet_report.rs"]
pub mod spreadsheet_report;

pub fn standard_steps() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(discover_yaml::DiscoverByYamlStep),
        Box::new(discover_curated::DiscoverByCuratedListStep),
        Box::new(merge::MergeAddinsStep),
        Box::new(reset_analysis::ResetAnalysisStep),
        Box::new(normalize_urls::NormalizeUrlStep),
        Box::new(find_solution::FindSolutionStep),
        Box::new(find_projects::FindProjectsStep),
        Box::new(download_projects::DownloadProjectsStep),
        Box::new(find_references::FindReferencesStep),
        Box::new(find_frameworks::FindFrameworksStep),
        Box::new(github_activity::GithubActivityStep),
        Box::new(find_icon::FindIconStep),
        Box::new(analyze::AnalyzeStep),
        Box::new(create_issues::CreateIssuesStep),
        Box::new(markdown_report::MarkdownReportStep),
        Box::new(spreadsheet_report::SpreadsheetReportStep),
    ]
}
