use crate::models::error::HookError;

/// A compressed sample handed back by an encoding sink.
///
/// Implemented by `Sample` for in-process sinks. Platform backends wrap
/// their native sample object and map native failures onto `HookError`.
pub trait CompletedSample {
    /// Presentation time in 100 ns ticks.
    fn sample_time(&self) -> Result<i64, HookError>;

    /// Copy the attached metadata blob into `dest`.
    ///
    /// A blob shorter than `dest` fills its prefix; a longer one is a
    /// `MetadataSizeMismatch`; no blob at all is `MetadataUnavailable`.
    fn read_metadata(&self, dest: &mut [u8]) -> Result<(), HookError>;

    /// Lock a contiguous view of the payload for reading and pass it to `f`.
    ///
    /// The view is unlocked before this returns, on every path. `f` must not
    /// keep the slice.
    fn with_payload(&self, f: &mut dyn FnMut(&[u8])) -> Result<(), HookError>;
}
