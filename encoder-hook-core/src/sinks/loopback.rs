//! In-process software encoding sink.
//!
//! Completes every written sample synchronously on the writing thread.
//! Useful for encode-then-remux chains that already hold compressed data
//! and for exercising metadata pairing without a platform encoder.

use crate::models::error::HookError;
use crate::models::format::{AacFormat, AudioSubtype, H26xFormat, VideoSubtype};
use crate::models::sample::Sample;
use crate::traits::completed_sample::CompletedSample;
use crate::traits::encoding_sink::{EncodingSink, SampleCallback, SinkFactory};

/// How the loopback maps input samples to output samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopbackMode {
    /// Output `i` is input `i`, blob included.
    Passthrough,
    /// Output `i` carries payload and time of input `i` but the blob of
    /// input `i + 1`, the way a reordering encoder propagates attributes.
    /// Each output is held back until the next input arrives.
    DelayedAttributes,
}

pub struct LoopbackSink {
    on_sample: SampleCallback,
    mode: LoopbackMode,
    pending: Option<Sample>,
    completed: u64,
    failed: u64,
}

impl LoopbackSink {
    pub fn new(on_sample: SampleCallback, mode: LoopbackMode) -> Self {
        Self {
            on_sample,
            mode,
            pending: None,
            completed: 0,
            failed: 0,
        }
    }

    pub fn mode(&self) -> LoopbackMode {
        self.mode
    }

    /// Samples handed to the completion callback.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Completions the callback reported as failed.
    pub fn failed(&self) -> u64 {
        self.failed
    }

    fn complete(&mut self, sample: &Sample) {
        self.completed += 1;
        if let Err(e) = (self.on_sample)(sample as &dyn CompletedSample) {
            self.failed += 1;
            log::warn!("loopback completion {} failed: {}", self.completed - 1, e);
        }
    }
}

impl EncodingSink for LoopbackSink {
    fn write_sample(&mut self, sample: Sample) -> Result<(), HookError> {
        if sample.buffers().is_empty() {
            return Err(HookError::SubmissionFailed("sample has no buffers".into()));
        }

        match self.mode {
            LoopbackMode::Passthrough => self.complete(&sample),
            LoopbackMode::DelayedAttributes => {
                if let Some(mut previous) = self.pending.take() {
                    match sample.user_data() {
                        Some(blob) => previous.set_user_data(blob),
                        None => {
                            previous.take_user_data();
                        }
                    }
                    self.complete(&previous);
                }
                self.pending = Some(sample);
            }
        }
        Ok(())
    }

    /// Emit the held-back sample, if any, with its own blob.
    fn finalize(&mut self) -> Result<(), HookError> {
        if let Some(last) = self.pending.take() {
            self.complete(&last);
        }
        log::debug!("loopback finalized after {} completions ({} failed)", self.completed, self.failed);
        Ok(())
    }
}

/// Creates loopback sinks. Video sessions whose profile permits reordering
/// get `video_mode`; everything else is passthrough.
#[derive(Debug, Clone, Copy)]
pub struct LoopbackFactory {
    video_mode: LoopbackMode,
}

impl LoopbackFactory {
    pub fn new() -> Self {
        Self {
            video_mode: LoopbackMode::Passthrough,
        }
    }

    /// Factory whose reordering-capable video sinks delay attributes.
    pub fn reordering() -> Self {
        Self {
            video_mode: LoopbackMode::DelayedAttributes,
        }
    }
}

impl Default for LoopbackFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SinkFactory for LoopbackFactory {
    type Sink = LoopbackSink;

    fn create_for_audio(
        &self,
        on_sample: SampleCallback,
        _subtype: AudioSubtype,
        format: &AacFormat,
    ) -> Result<LoopbackSink, HookError> {
        format.validate().map_err(HookError::SinkCreationFailed)?;
        Ok(LoopbackSink::new(on_sample, LoopbackMode::Passthrough))
    }

    fn create_for_video(
        &self,
        on_sample: SampleCallback,
        _subtype: VideoSubtype,
        format: &H26xFormat,
        _stride: u32,
        _options: &[u64],
    ) -> Result<LoopbackSink, HookError> {
        format.validate().map_err(HookError::SinkCreationFailed)?;
        let mode = if format.profile.permits_reordering() {
            self.video_mode
        } else {
            LoopbackMode::Passthrough
        };
        Ok(LoopbackSink::new(on_sample, mode))
    }
}
