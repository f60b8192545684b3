use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

use crate::annotation::ViolationCounter;

/// Expose the per-priority counts as step outputs by appending `name=value`
/// lines to the file named by `GITHUB_OUTPUT`. Called once after either
/// publish path.
pub(crate) fn specify_outputs(counter: ViolationCounter) -> Result<()> {
    match std::env::var_os("GITHUB_OUTPUT") {
        Some(path) => write_outputs(Path::new(&path), counter),
        None => {
            warn!("GITHUB_OUTPUT is not set, skipping step outputs");
            Ok(())
        }
    }
}

fn write_outputs(path: &Path, counter: ViolationCounter) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open step output file {}", path.display()))?;
    writeln!(
        file,
        "violation_error_number={}\nviolation_warning_number={}\nviolation_notice_number={}\nviolation_total_number={}",
        counter.errors,
        counter.warnings,
        counter.notices,
        counter.total(),
    )
    .context("failed to write step outputs")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn outputs_append_all_four_counters() {
        let file = tempfile::NamedTempFile::new().expect("create output file");
        let counter = ViolationCounter {
            errors: 2,
            warnings: 1,
            notices: 4,
        };

        write_outputs(file.path(), counter).expect("write outputs");

        let content = fs::read_to_string(file.path()).expect("read outputs");
        assert_eq!(
            content,
            "violation_error_number=2\nviolation_warning_number=1\nviolation_notice_number=4\nviolation_total_number=7\n"
        );
    }

    #[test]
    fn outputs_append_to_existing_content() {
        let file = tempfile::NamedTempFile::new().expect("create output file");
        fs::write(file.path(), "existing=1\n").expect("seed output file");

        write_outputs(file.path(), ViolationCounter::default()).expect("write outputs");

        let content = fs::read_to_string(file.path()).expect("read outputs");
        assert!(content.starts_with("existing=1\n"));
        assert!(content.contains("violation_total_number=0\n"));
    }
}
