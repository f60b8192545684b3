use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_sarif::sarif::{ReportingDescriptor, Result as SarifResult, Sarif};
use thiserror::Error;
use tracing::info;

/// Raised when a report carries rules without results or results without
/// rules.
#[derive(Debug, Error)]
#[error("SARIF report contains rules without results or results without rules")]
pub(crate) struct InvalidSarifViolationData;

/// Driver name, rule set, and findings extracted from a report's single run.
#[derive(Debug)]
pub(crate) struct ViolationData {
    pub(crate) driver_name: String,
    pub(crate) rules: Vec<ReportingDescriptor>,
    pub(crate) results: Vec<SarifResult>,
}

/// Read and deserialize a SARIF report. The report is not re-validated
/// against the SARIF schema.
pub(crate) fn load_report(path: &Path) -> Result<Sarif> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read SARIF report {}", path.display()))?;
    let mut deserializer = serde_json::Deserializer::from_str(&content);
    let report = serde_path_to_error::deserialize(&mut deserializer)
        .with_context(|| format!("failed to parse SARIF report {}", path.display()))?;
    Ok(report)
}

/// Extract the rules and findings from the report's single run.
///
/// Returns `None` when there is nothing to annotate: the report has no run
/// (or more than one), or both rules and results are empty. A report where
/// exactly one of the two is empty is malformed.
pub(crate) fn violation_data(
    report: &Sarif,
) -> Result<Option<ViolationData>, InvalidSarifViolationData> {
    if report.runs.len() != 1 {
        info!("report does not contain exactly one run, nothing to annotate");
        return Ok(None);
    }
    let run = &report.runs[0];
    let driver = &run.tool.driver;
    let rules = driver.rules.clone().unwrap_or_default();
    let results = run.results.clone().unwrap_or_default();
    if rules.is_empty() && results.is_empty() {
        info!("no violations found, nothing to annotate");
        return Ok(None);
    }
    if rules.is_empty() || results.is_empty() {
        return Err(InvalidSarifViolationData);
    }
    Ok(Some(ViolationData {
        driver_name: driver.name.clone(),
        rules,
        results,
    }))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;
    use serde_sarif::sarif::{Message, Run, Tool, ToolComponent};

    use super::*;

    fn sample_rule() -> ReportingDescriptor {
        ReportingDescriptor::builder().id("no-unused-vars").build()
    }

    fn sample_result() -> SarifResult {
        SarifResult::builder()
            .message(Message::builder().text("unused variable").build())
            .build()
    }

    fn report(rules: Vec<ReportingDescriptor>, results: Vec<SarifResult>) -> Sarif {
        let driver = if rules.is_empty() {
            ToolComponent::builder().name("eslint").build()
        } else {
            ToolComponent::builder().name("eslint").rules(rules).build()
        };
        let tool = Tool {
            driver,
            extensions: None,
            properties: None,
        };
        let run = Run::builder().tool(tool).results(results).build();
        Sarif::builder()
            .version(json!("2.1.0"))
            .runs(vec![run])
            .build()
    }

    #[test]
    fn report_with_rules_and_results_yields_violation_data() {
        let report = report(vec![sample_rule()], vec![sample_result()]);

        let data = violation_data(&report)
            .expect("extract data")
            .expect("data present");

        assert_eq!(data.driver_name, "eslint");
        assert_eq!(data.rules.len(), 1);
        assert_eq!(data.results.len(), 1);
    }

    #[test]
    fn empty_report_is_a_no_op() {
        let report = report(Vec::new(), Vec::new());

        assert!(violation_data(&report).expect("extract data").is_none());
    }

    #[test]
    fn report_without_runs_is_a_no_op() {
        let report = Sarif::builder()
            .version(json!("2.1.0"))
            .runs(Vec::new())
            .build();

        assert!(violation_data(&report).expect("extract data").is_none());
    }

    #[test]
    fn rules_without_results_are_rejected() {
        let report = report(vec![sample_rule()], Vec::new());

        violation_data(&report).expect_err("rules without results");
    }

    #[test]
    fn results_without_rules_are_rejected() {
        let report = report(Vec::new(), vec![sample_result()]);

        violation_data(&report).expect_err("results without rules");
    }

    #[test]
    fn load_report_reads_a_report_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("create report file");
        let report = report(vec![sample_rule()], vec![sample_result()]);
        let content = serde_json::to_string(&report).expect("serialize report");
        file.write_all(content.as_bytes()).expect("write report");

        let loaded = load_report(file.path()).expect("load report");

        assert_eq!(loaded.runs.len(), 1);
        assert_eq!(loaded.runs[0].tool.driver.name, "eslint");
    }

    #[test]
    fn load_report_fails_on_missing_file() {
        let dir = tempfile::tempdir().expect("create temp dir");

        let err = load_report(&dir.path().join("missing.sarif")).expect_err("missing report");

        assert!(err.to_string().contains("failed to read SARIF report"));
    }

    #[test]
    fn load_report_fails_on_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().expect("create report file");
        file.write_all(b"{not json").expect("write report");

        let err = load_report(file.path()).expect_err("invalid report");

        assert!(err.to_string().contains("failed to parse SARIF report"));
    }
}
