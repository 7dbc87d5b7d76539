/// Observer of extension-loop progress.
///
/// Every method defaults to a no-op so sinks only implement what they display.
pub trait ProgressSink {
    /// Service queue status changed.
    fn on_status(&mut self, _queue_remaining: Option<u64>) {}
    /// A node of the running job advanced.
    fn on_progress(&mut self, _node: &str, _value: u64, _max: u64) {}
    /// The service started executing a node.
    fn on_executing(&mut self, _node: &str) {}
    /// Extension step `step` of `total` finished and its outputs were ingested.
    fn on_step_done(&mut self, _step: usize, _total: usize) {}
}

/// Forwards progress to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn on_status(&mut self, queue_remaining: Option<u64>) {
        tracing::debug!(?queue_remaining, "service status");
    }

    fn on_progress(&mut self, node: &str, value: u64, max: u64) {
        tracing::debug!(node, value, max, "node progress");
    }

    fn on_executing(&mut self, node: &str) {
        tracing::debug!(node, "executing");
    }

    fn on_step_done(&mut self, step: usize, total: usize) {
        tracing::info!(step, total, "extension step complete");
    }
}
