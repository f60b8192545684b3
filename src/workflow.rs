use std::io::{self, Write};

use crate::annotation::{Annotation, Priority};
use crate::pusher::AnnotationSink;

/// Fallback annotation channel: GitHub Actions workflow commands written to
/// stdout, one `::error|warning|notice` line per finding.
pub(crate) struct WorkflowCommands<W: Write> {
    out: W,
}

impl WorkflowCommands<io::Stdout> {
    pub(crate) fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> WorkflowCommands<W> {
    #[cfg(test)]
    fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> AnnotationSink for WorkflowCommands<W> {
    fn annotate(&mut self, priority: Priority, message: &str, annotation: &Annotation) {
        let command = match priority {
            Priority::Error => "error",
            Priority::Warning => "warning",
            Priority::Notice => "notice",
            Priority::None => return,
        };
        // The runner parses these lines from stdout; a write failure has no
        // recovery path worth failing the whole run for.
        let _ = writeln!(self.out, "{}", format_command(command, annotation, message));
    }
}

fn format_command(command: &str, annotation: &Annotation, message: &str) -> String {
    let mut properties = vec![
        format!("file={}", escape_property(&annotation.file)),
        format!("line={}", annotation.start_line),
    ];
    if let Some(end_line) = annotation.end_line {
        properties.push(format!("endLine={end_line}"));
    }
    if annotation.start_column > 0 {
        properties.push(format!("col={}", annotation.start_column));
    }
    if let Some(end_column) = annotation.end_column {
        properties.push(format!("endColumn={end_column}"));
    }
    properties.push(format!("title={}", escape_property(&annotation.title)));
    format!("::{command} {}::{}", properties.join(","), escape_data(message))
}

fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation() -> Annotation {
        Annotation {
            title: "Avoid unused variables".to_string(),
            file: "src/app.js".to_string(),
            start_line: 3,
            end_line: None,
            start_column: 0,
            end_column: None,
        }
    }

    fn emitted(priority: Priority, message: &str, annotation: &Annotation) -> String {
        let mut sink = WorkflowCommands::new(Vec::new());
        sink.annotate(priority, message, annotation);
        String::from_utf8(sink.out).expect("utf8 output")
    }

    #[test]
    fn error_annotation_emits_an_error_command() {
        let output = emitted(Priority::Error, "see the rule docs", &annotation());

        assert_eq!(
            output,
            "::error file=src/app.js,line=3,title=Avoid unused variables::see the rule docs\n"
        );
    }

    #[test]
    fn optional_region_fields_are_included_when_present() {
        let annotation = Annotation {
            end_line: Some(4),
            start_column: 7,
            end_column: Some(11),
            ..annotation()
        };

        let output = emitted(Priority::Warning, "message", &annotation);

        assert_eq!(
            output,
            "::warning file=src/app.js,line=3,endLine=4,col=7,endColumn=11,title=Avoid unused variables::message\n"
        );
    }

    #[test]
    fn none_priority_emits_nothing() {
        let output = emitted(Priority::None, "message", &annotation());

        assert!(output.is_empty());
    }

    #[test]
    fn message_newlines_and_property_commas_are_escaped() {
        let annotation = Annotation {
            title: "a,b:c".to_string(),
            ..annotation()
        };

        let output = emitted(Priority::Notice, "line one\nline two", &annotation);

        assert_eq!(
            output,
            "::notice file=src/app.js,line=3,title=a%2Cb%3Ac::line one%0Aline two\n"
        );
    }

    #[test]
    fn percent_signs_are_escaped_first() {
        let output = emitted(Priority::Notice, "50% done", &annotation());

        assert!(output.contains("::50%25 done\n"));
    }
}
