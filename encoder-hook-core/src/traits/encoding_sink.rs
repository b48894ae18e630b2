use std::sync::Arc;

use crate::models::error::HookError;
use crate::models::format::{AacFormat, AudioSubtype, H26xFormat, VideoSubtype};
use crate::models::sample::Sample;
use crate::traits::completed_sample::CompletedSample;

/// Completion notification registered with a sink at creation time.
///
/// Called once per produced sample, serially and in submission order, on
/// whatever thread the sink delivers from. The returned error is the
/// per-sample outcome; the sink decides whether to log it or stop.
pub type SampleCallback =
    Arc<dyn Fn(&dyn CompletedSample) -> Result<(), HookError> + Send + Sync + 'static>;

/// An encoder and/or muxer that accepts samples.
pub trait EncodingSink: Send {
    /// Submit one sample. Encoding sinks answer through the completion
    /// callback; muxing sinks append it to their output.
    fn write_sample(&mut self, sample: Sample) -> Result<(), HookError>;

    /// Flush pending output. Called at most once, before release.
    fn finalize(&mut self) -> Result<(), HookError> {
        Ok(())
    }
}

/// Creates encoding sinks for audio or video sessions.
pub trait SinkFactory {
    type Sink: EncodingSink;

    /// Metadata size the created sinks are bound to, if any. Muxing sinks
    /// that store blobs at a fixed width report it here.
    fn expected_metadata_size(&self) -> Option<usize> {
        None
    }

    fn create_for_audio(
        &self,
        on_sample: SampleCallback,
        subtype: AudioSubtype,
        format: &AacFormat,
    ) -> Result<Self::Sink, HookError>;

    fn create_for_video(
        &self,
        on_sample: SampleCallback,
        subtype: VideoSubtype,
        format: &H26xFormat,
        stride: u32,
        options: &[u64],
    ) -> Result<Self::Sink, HookError>;
}
