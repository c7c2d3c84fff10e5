use crate::progress::{ProgressEvent, ProgressReporter};
use async_trait::async_trait;

/// Reporter used when no progress store is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

#[async_trait]
impl ProgressReporter for NoopReporter {
    fn report(&self, external_ref: &str, event: ProgressEvent) {
        tracing::trace!("Dropping {} event for {}", event.name(), external_ref);
    }

    async fn shutdown(&self) {}
}
