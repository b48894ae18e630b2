use std::borrow::Cow;

use super::error::HookError;
use crate::traits::completed_sample::CompletedSample;

/// Owned media bytes with a valid-data length.
///
/// Only the first `current_length` bytes are considered payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBuffer {
    data: Vec<u8>,
    current_length: usize,
}

impl MediaBuffer {
    /// Allocate `size` zeroed bytes, all of them marked valid.
    pub fn with_length(size: usize) -> Self {
        Self {
            data: vec![0; size],
            current_length: size,
        }
    }

    pub fn from_vec(data: Vec<u8>) -> Self {
        let current_length = data.len();
        Self { data, current_length }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn current_length(&self) -> usize {
        self.current_length
    }

    pub fn set_current_length(&mut self, length: usize) -> Result<(), HookError> {
        if length > self.data.len() {
            return Err(HookError::BufferUnavailable(format!(
                "length {} exceeds capacity {}",
                length,
                self.data.len()
            )));
        }
        self.current_length = length;
        Ok(())
    }

    /// The valid bytes.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.current_length]
    }

    /// The whole allocation, for filling before `set_current_length`.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// A media sample: buffers, timing and the attached metadata blob.
///
/// Times and durations are in 100 ns ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sample {
    buffers: Vec<MediaBuffer>,
    sample_time: Option<i64>,
    duration: Option<i64>,
    user_data: Option<Vec<u8>>,
}

impl Sample {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_buffer(&mut self, buffer: MediaBuffer) {
        self.buffers.push(buffer);
    }

    pub fn buffers(&self) -> &[MediaBuffer] {
        &self.buffers
    }

    pub fn set_sample_time(&mut self, time: i64) {
        self.sample_time = Some(time);
    }

    pub fn time(&self) -> Option<i64> {
        self.sample_time
    }

    pub fn set_sample_duration(&mut self, duration: i64) {
        self.duration = Some(duration);
    }

    pub fn duration(&self) -> Option<i64> {
        self.duration
    }

    pub fn set_user_data(&mut self, blob: &[u8]) {
        self.user_data = Some(blob.to_vec());
    }

    pub fn user_data(&self) -> Option<&[u8]> {
        self.user_data.as_deref()
    }

    pub fn take_user_data(&mut self) -> Option<Vec<u8>> {
        self.user_data.take()
    }

    /// Total valid bytes across all buffers.
    pub fn total_length(&self) -> usize {
        self.buffers.iter().map(MediaBuffer::current_length).sum()
    }

    /// All buffers as one slice, copying only when there is more than one.
    pub fn contiguous(&self) -> Result<Cow<'_, [u8]>, HookError> {
        match self.buffers.as_slice() {
            [] => Err(HookError::BufferUnavailable("sample has no buffers".into())),
            [single] => Ok(Cow::Borrowed(single.data())),
            many => {
                let mut joined = Vec::with_capacity(self.total_length());
                for buffer in many {
                    joined.extend_from_slice(buffer.data());
                }
                Ok(Cow::Owned(joined))
            }
        }
    }
}

impl CompletedSample for Sample {
    fn sample_time(&self) -> Result<i64, HookError> {
        self.sample_time.ok_or(HookError::TimestampUnavailable)
    }

    fn read_metadata(&self, dest: &mut [u8]) -> Result<(), HookError> {
        let blob = self
            .user_data
            .as_deref()
            .ok_or_else(|| HookError::MetadataUnavailable("sample carries no user data".into()))?;
        if blob.len() > dest.len() {
            return Err(HookError::MetadataSizeMismatch {
                expected: dest.len(),
                actual: blob.len(),
            });
        }
        dest[..blob.len()].copy_from_slice(blob);
        Ok(())
    }

    fn with_payload(&self, f: &mut dyn FnMut(&[u8])) -> Result<(), HookError> {
        let payload = self.contiguous()?;
        f(&payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_length_is_zeroed_and_valid() {
        let buffer = MediaBuffer::with_length(8);
        assert_eq!(buffer.current_length(), 8);
        assert_eq!(buffer.data(), &[0u8; 8]);
    }

    #[test]
    fn current_length_limits_data() {
        let mut buffer = MediaBuffer::with_length(8);
        buffer.data_mut()[..3].copy_from_slice(&[1, 2, 3]);
        buffer.set_current_length(3).unwrap();
        assert_eq!(buffer.data(), &[1, 2, 3]);
        assert!(buffer.set_current_length(9).is_err());
    }

    #[test]
    fn contiguous_joins_multiple_buffers() {
        let mut sample = Sample::new();
        sample.add_buffer(MediaBuffer::from_vec(vec![1, 2]));
        sample.add_buffer(MediaBuffer::from_vec(vec![3]));

        let joined = sample.contiguous().unwrap();
        assert!(matches!(joined, Cow::Owned(_)));
        assert_eq!(&*joined, &[1, 2, 3]);
    }

    #[test]
    fn contiguous_borrows_single_buffer() {
        let mut sample = Sample::new();
        sample.add_buffer(MediaBuffer::from_vec(vec![9, 9]));
        assert!(matches!(sample.contiguous().unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn empty_sample_has_no_payload() {
        let sample = Sample::new();
        let mut called = false;
        let result = sample.with_payload(&mut |_| called = true);
        assert!(matches!(result, Err(HookError::BufferUnavailable(_))));
        assert!(!called);
    }

    #[test]
    fn missing_time_is_reported() {
        assert_eq!(Sample::new().sample_time(), Err(HookError::TimestampUnavailable));
    }

    #[test]
    fn read_metadata_copies_prefix() {
        let mut sample = Sample::new();
        sample.set_user_data(&[7, 7]);

        let mut dest = [0u8; 4];
        sample.read_metadata(&mut dest).unwrap();
        assert_eq!(dest, [7, 7, 0, 0]);
    }

    #[test]
    fn read_metadata_rejects_oversized_blob() {
        let mut sample = Sample::new();
        sample.set_user_data(&[1, 2, 3, 4, 5]);

        let mut dest = [0u8; 4];
        assert_eq!(
            sample.read_metadata(&mut dest),
            Err(HookError::MetadataSizeMismatch { expected: 4, actual: 5 })
        );
        assert_eq!(dest, [0; 4]);
    }

    #[test]
    fn read_metadata_without_blob_fails() {
        let mut dest = [0u8; 4];
        assert!(matches!(
            Sample::new().read_metadata(&mut dest),
            Err(HookError::MetadataUnavailable(_))
        ));
    }
}
