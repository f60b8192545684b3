use serde_sarif::sarif::{Location, ReportingDescriptor, Result as SarifResult};
use tracing::info;

use crate::annotation::{Annotation, AnnotationSource};
use crate::driver::Driver;

/// Converts SARIF results into normalized annotation records.
///
/// Results are processed in report order; each physical location of an
/// eligible result yields one record. Malformed results and locations are
/// dropped silently.
pub(crate) struct AnnotationBuilder {
    driver: Driver,
    rules: Vec<ReportingDescriptor>,
    results: Vec<SarifResult>,
    only_changed_files: bool,
    changed_files: Vec<String>,
    workspace_root: String,
}

impl AnnotationBuilder {
    pub(crate) fn new(
        driver: Driver,
        rules: Vec<ReportingDescriptor>,
        results: Vec<SarifResult>,
        only_changed_files: bool,
        changed_files: Vec<String>,
        workspace_root: &str,
    ) -> Self {
        // Reported URIs never carry the leading separator, so drop it from
        // the workspace root before prefix matching.
        let workspace_root = workspace_root
            .strip_prefix('/')
            .unwrap_or(workspace_root)
            .to_string();
        Self {
            driver,
            rules,
            results,
            only_changed_files,
            changed_files,
            workspace_root,
        }
    }

    pub(crate) fn build(&self) -> Vec<AnnotationSource> {
        let mut annotations = Vec::new();
        for result in &self.results {
            self.collect_result(result, &mut annotations);
        }
        annotations
    }

    fn collect_result(&self, result: &SarifResult, annotations: &mut Vec<AnnotationSource>) {
        let Some(rule) = result
            .rule_index
            .and_then(|index| usize::try_from(index).ok())
            .and_then(|index| self.rules.get(index))
        else {
            return;
        };
        let Some(locations) = result
            .locations
            .as_ref()
            .filter(|locations| !locations.is_empty())
        else {
            return;
        };
        let Some(title) = result.message.text.as_deref().filter(|text| !text.is_empty()) else {
            return;
        };

        let priority = self.driver.priority(rule, result);
        let description = self.driver.description(rule);

        for location in locations {
            let Some(annotation) = self.location_annotation(title, location) else {
                continue;
            };
            if self.only_changed_files && !self.changed_files.contains(&annotation.file) {
                info!(
                    "{}:{} '{}' - the file has not changed, annotation omitted",
                    annotation.file, annotation.start_line, annotation.title
                );
                continue;
            }
            annotations.push(AnnotationSource {
                rule_id: rule.id.clone(),
                priority,
                annotation,
                description: description.clone(),
            });
        }
    }

    fn location_annotation(&self, title: &str, location: &Location) -> Option<Annotation> {
        let physical = location.physical_location.as_ref()?;
        let uri = physical
            .artifact_location
            .as_ref()?
            .uri
            .as_deref()
            .filter(|uri| !uri.is_empty())?;
        let region = physical.region.as_ref()?;
        let start_line = region.start_line.filter(|line| *line > 0)?;
        Some(Annotation {
            title: title.to_string(),
            file: normalize_path(&self.workspace_root, uri),
            start_line,
            end_line: region.end_line.filter(|line| *line > 0),
            start_column: region.start_column.unwrap_or(0),
            end_column: region.end_column.filter(|column| *column > 0),
        })
    }
}

/// Canonicalize a reported artifact URI relative to the workspace root:
/// strip one `file:///` scheme prefix, one leading separator, one leading
/// occurrence of the workspace root, and one remaining separator.
/// Idempotent.
pub(crate) fn normalize_path(workspace_root: &str, path: &str) -> String {
    let path = path.strip_prefix("file:///").unwrap_or(path);
    // The stored workspace root is separator-less, so absolute paths must
    // shed theirs before the prefix can match.
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = if workspace_root.is_empty() {
        path
    } else {
        path.strip_prefix(workspace_root).unwrap_or(path)
    };
    let path = path.strip_prefix('/').unwrap_or(path);
    path.to_string()
}
