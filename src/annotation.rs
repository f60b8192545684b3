use serde::Serialize;

/// Normalized severity of a finding. `None` maps to the SARIF "none" level:
/// it is still published through the check-run API (as a notice) but the
/// fallback channel skips it and no counter bucket tracks it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Priority {
    Notice,
    Warning,
    Error,
    None,
}

impl Priority {
    /// Annotation level accepted by the check-run API.
    pub(crate) fn wire_level(self) -> &'static str {
        match self {
            Self::Error => "failure",
            Self::Warning => "warning",
            Self::Notice | Self::None => "notice",
        }
    }
}

/// Location payload shared by the check-run API and the fallback channel.
/// A zero `start_column` means the report did not carry one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Annotation {
    pub(crate) title: String,
    pub(crate) file: String,
    pub(crate) start_line: i64,
    pub(crate) end_line: Option<i64>,
    pub(crate) start_column: i64,
    pub(crate) end_column: Option<i64>,
}

/// One finding normalized for publication. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AnnotationSource {
    pub(crate) rule_id: String,
    pub(crate) priority: Priority,
    pub(crate) annotation: Annotation,
    pub(crate) description: String,
}

/// Wire shape of one annotation in a check-run update request.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub(crate) struct ApiAnnotation {
    pub(crate) path: String,
    pub(crate) start_line: i64,
    pub(crate) end_line: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) start_column: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) end_column: Option<i64>,
    pub(crate) annotation_level: &'static str,
    pub(crate) message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) title: Option<String>,
}

impl From<&AnnotationSource> for ApiAnnotation {
    fn from(source: &AnnotationSource) -> Self {
        let annotation = &source.annotation;
        Self {
            path: annotation.file.clone(),
            start_line: annotation.start_line,
            end_line: annotation.end_line.unwrap_or(annotation.start_line),
            start_column: (annotation.start_column > 0).then_some(annotation.start_column),
            end_column: annotation.end_column,
            annotation_level: source.priority.wire_level(),
            message: source.description.clone(),
            title: Some(annotation.title.clone()),
        }
    }
}

/// Running tally of published or logged findings per priority.
/// Incremented exactly once per record, never decremented.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ViolationCounter {
    pub(crate) errors: u64,
    pub(crate) warnings: u64,
    pub(crate) notices: u64,
}

impl ViolationCounter {
    pub(crate) fn record(&mut self, priority: Priority) {
        match priority {
            Priority::Error => self.errors += 1,
            Priority::Warning => self.warnings += 1,
            Priority::Notice => self.notices += 1,
            Priority::None => {}
        }
    }

    pub(crate) fn merge(&mut self, other: Self) {
        self.errors += other.errors;
        self.warnings += other.warnings;
        self.notices += other.notices;
    }

    pub(crate) fn total(&self) -> u64 {
        self.errors + self.warnings + self.notices
    }

    pub(crate) fn has_failures(&self) -> bool {
        self.errors + self.warnings > 0
    }
}
