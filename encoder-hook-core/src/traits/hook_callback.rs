use std::sync::Arc;

/// Callback invoked with every completed sample and its paired metadata.
///
/// Parameters:
/// - `frame`: The compressed payload.
/// - `timestamp`: Presentation time in 100 ns ticks.
/// - `metadata`: The paired metadata blob, always exactly `metadata_size` bytes.
///
/// Runs synchronously on the sink's delivery thread and blocks it until it
/// returns. Both slices are only valid for the duration of the call; copy
/// what you need and hand heavy work to another thread.
pub type HookCallback = Arc<dyn Fn(&[u8], i64, &[u8]) + Send + Sync + 'static>;
