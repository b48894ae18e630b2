/// Counters for debugging a hook session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookDiagnostics {
    pub samples_delivered: u64,
    pub samples_dropped: u64,
    pub bytes_delivered: u64,
    pub samples_written: u64,
    pub metadata_captures: u64,
    pub concurrent_completions: u64,
}

impl HookDiagnostics {
    /// Completions seen so far, delivered or not.
    pub fn completions(&self) -> u64 {
        self.samples_delivered + self.samples_dropped
    }
}
