use anyhow::Result;
use tracing::info;

use crate::annotation::{Annotation, AnnotationSource, ApiAnnotation, Priority, ViolationCounter};
use crate::checks::{ChecksService, Conclusion};
use crate::driver::Driver;

/// Maximum number of annotations accepted per check-run update call.
const CHUNK_SIZE: usize = 50;

/// Per-severity sink for the fallback annotation channel.
pub(crate) trait AnnotationSink {
    fn annotate(&mut self, priority: Priority, message: &str, annotation: &Annotation);
}

/// Publishes annotation records to a check-run, degrading to plain
/// per-finding annotations when the check path fails.
pub(crate) struct AnnotationPusher {
    driver: Driver,
    title: String,
    annotations: Vec<AnnotationSource>,
    counter: ViolationCounter,
}

impl AnnotationPusher {
    pub(crate) fn new(driver: Driver, head_sha: &str, annotations: Vec<AnnotationSource>) -> Self {
        Self {
            driver,
            title: format!("{driver} at {head_sha}"),
            annotations,
            counter: ViolationCounter::default(),
        }
    }

    pub(crate) fn counter(&self) -> ViolationCounter {
        self.counter
    }

    /// Create the check-run, stream annotation chunks into it, close it.
    ///
    /// The check is always closed once created: an update failure stops the
    /// chunk loop, the close still runs with whatever counts accumulated,
    /// and the captured error is then re-raised so the caller can degrade to
    /// the fallback channel. A create failure propagates unchanged since
    /// there is nothing to close yet.
    pub(crate) fn publish_as_check(&mut self, service: &dyn ChecksService) -> Result<()> {
        let check_id = service.create(&self.title)?;

        let total = self.annotations.len();
        let total_chunks = total / CHUNK_SIZE + 1;
        let mut update_error = None;
        for chunk_index in 0..total_chunks {
            let start = chunk_index * CHUNK_SIZE;
            let end = usize::min(start + CHUNK_SIZE, total);
            let (api_annotations, counts) = convert_chunk(&self.annotations[start..end]);
            self.counter.merge(counts);
            let summary =
                format!("Found {total} violations, processing chunk {chunk_index} of {total_chunks}...");
            info!("{summary}");
            if let Err(err) = service.update(check_id, &self.title, &summary, &api_annotations) {
                update_error = Some(err);
                break;
            }
        }

        let conclusion = if self.counter.has_failures() {
            Conclusion::Failure
        } else {
            Conclusion::Success
        };
        service.close(check_id, conclusion, &self.title, &self.result_summary())?;

        match update_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Emit every record through the fallback channel. Never touches the
    /// check-run API and never fails on record content; `none`-priority
    /// records are logged but not annotated or counted.
    pub(crate) fn publish_as_annotations(&mut self, sink: &mut dyn AnnotationSink) {
        for source in &self.annotations {
            info!(
                "{}:{} '{}'",
                source.annotation.file, source.annotation.start_line, source.annotation.title
            );
            if source.priority == Priority::None {
                continue;
            }
            sink.annotate(source.priority, &source.description, &source.annotation);
            self.counter.record(source.priority);
        }
    }

    fn result_summary(&self) -> String {
        format!(
            "# {} run results:\n- Errors: __{}__\n- Warnings: __{}__\n- Notices: __{}__",
            self.driver.as_str().to_uppercase(),
            self.counter.errors,
            self.counter.warnings,
            self.counter.notices,
        )
    }
}

/// Convert one chunk to the wire format. Counts are returned as a value and
/// merged by the caller so the conversion itself stays pure.
fn convert_chunk(chunk: &[AnnotationSource]) -> (Vec<ApiAnnotation>, ViolationCounter) {
    let mut counts = ViolationCounter::default();
    let mut api_annotations = Vec::with_capacity(chunk.len());
    for source in chunk {
        api_annotations.push(ApiAnnotation::from(source));
        counts.record(source.priority);
    }
    (api_annotations, counts)
}
