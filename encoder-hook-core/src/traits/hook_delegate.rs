use crate::models::error::HookError;

/// Event delegate for per-sample notifications.
///
/// Called from the sink's delivery thread after the hook callback has run.
/// `sequence` counts completions from zero for the lifetime of the hook.
pub trait HookDelegate: Send + Sync {
    /// Called after a sample was handed to the hook callback.
    fn on_sample_delivered(&self, sequence: u64, timestamp: i64);

    /// Called when a sample could not be delivered, or when its own metadata
    /// could not be cached for the next sample in shift mode. A sample that
    /// was delivered but not cached gets both calls. The session continues.
    fn on_sample_error(&self, sequence: u64, error: &HookError);
}
