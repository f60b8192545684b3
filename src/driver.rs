use std::fmt;
use std::str::FromStr;

use serde_sarif::sarif::{ReportingDescriptor, Result as SarifResult, ResultLevel};
use thiserror::Error;

use crate::annotation::Priority;

/// Analyzer family that produced the SARIF report. Each driver supplies its
/// own severity mapping and rule-description formatting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Driver {
    Pmd,
    Eslint,
}

/// Raised when the report's tool name is not a supported driver.
#[derive(Debug, Error)]
#[error("unsupported SARIF driver '{0}'")]
pub(crate) struct InvalidDriver(pub(crate) String);

impl FromStr for Driver {
    type Err = InvalidDriver;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_lowercase().as_str() {
            "pmd" => Ok(Self::Pmd),
            "eslint" => Ok(Self::Eslint),
            _ => Err(InvalidDriver(name.to_string())),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Driver {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Pmd => "pmd",
            Self::Eslint => "eslint",
        }
    }

    /// Map one finding to its normalized priority.
    pub(crate) fn priority(self, rule: &ReportingDescriptor, result: &SarifResult) -> Priority {
        match self {
            // PMD reports its numeric priority in the rule property bag
            // rather than the result level.
            Self::Pmd => match rule_priority(rule) {
                1 | 2 => Priority::Error,
                3 | 4 => Priority::Warning,
                _ => Priority::Notice,
            },
            Self::Eslint => match result.level {
                Some(ResultLevel::Error) => Priority::Error,
                Some(ResultLevel::Warning) => Priority::Warning,
                Some(ResultLevel::None) => Priority::None,
                _ => Priority::Notice,
            },
        }
    }

    /// Derive the description published alongside each annotation.
    ///
    /// PMD rules carry a multi-line full description which is trimmed line by
    /// line, stripped of one leading and one trailing blank line, and followed
    /// by the rule's help URI. ESLint rules contribute the help URI alone.
    pub(crate) fn description(self, rule: &ReportingDescriptor) -> String {
        let help_uri = rule.help_uri.as_deref().map(str::trim).unwrap_or_default();
        match self {
            Self::Pmd => {
                let mut description = clean_full_description(rule);
                if !description.is_empty() {
                    description.push_str("\n\n");
                }
                description.push_str(help_uri);
                description
            }
            Self::Eslint => help_uri.to_string(),
        }
    }
}

fn rule_priority(rule: &ReportingDescriptor) -> i64 {
    rule.properties
        .as_ref()
        .and_then(|bag| bag.additional_properties.get("priority"))
        .and_then(|value| value.as_i64())
        .unwrap_or(5)
}

fn clean_full_description(rule: &ReportingDescriptor) -> String {
    let Some(text) = rule
        .full_description
        .as_ref()
        .map(|description| description.text.as_str())
    else {
        return String::new();
    };
    let mut lines: Vec<&str> = text.lines().map(str::trim).collect();
    if lines.first() == Some(&"") {
        lines.remove(0);
    }
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines.join("\n")
}
