use crate::models::error::HookError;
use crate::traits::completed_sample::CompletedSample;

/// Fixed-size store for the metadata snapshot paired with the next delivery.
///
/// The length is set at construction and never changes. Content is either
/// the latest captured snapshot or all zeroes after consumption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataBuffer {
    bytes: Box<[u8]>,
}

impl MetadataBuffer {
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size].into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Zero the snapshot so it can never be delivered twice.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    pub fn is_zeroed(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }

    /// Replace the snapshot with the blob attached to `sample`.
    ///
    /// A zero-sized buffer never reads from the sample. On failure the
    /// buffer is left zeroed.
    pub fn capture_from(&mut self, sample: &dyn CompletedSample) -> Result<(), HookError> {
        if self.bytes.is_empty() {
            return Ok(());
        }
        self.clear();
        let result = sample.read_metadata(&mut self.bytes);
        if result.is_err() {
            self.clear();
        }
        result
    }
}
