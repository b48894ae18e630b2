use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::models::config::{EncoderConfig, StreamKind};
use crate::models::diagnostics::HookDiagnostics;
use crate::models::error::HookError;
use crate::models::format::{AacFormat, AudioSubtype, H26xFormat, VideoSubtype};
use crate::models::sample::{MediaBuffer, Sample};
use crate::processing::metadata_buffer::MetadataBuffer;
use crate::traits::completed_sample::CompletedSample;
use crate::traits::encoding_sink::{EncodingSink, SampleCallback, SinkFactory};
use crate::traits::hook_callback::HookCallback;
use crate::traits::hook_delegate::HookDelegate;

/// State shared between the hook and the completion closure registered with
/// its sink.
///
/// Completions must arrive one at a time and in submission order; the
/// one-step metadata shift is only correct under that ordering. `state` is
/// taken with `try_lock`, so an overlapping completion is rejected instead
/// of silently pairing the wrong snapshot.
struct HookShared {
    shift: bool,
    callback: HookCallback,
    state: Mutex<MetadataBuffer>,
    diagnostics: Mutex<HookDiagnostics>,
    delegate: RwLock<Option<Arc<dyn HookDelegate>>>,
    sequence: AtomicU64,
}

/// What happened to one completed sample.
struct CompletionOutcome {
    delivery: Result<(i64, usize), HookError>,
    captured: bool,
    capture_error: Option<HookError>,
}

impl HookShared {
    fn new(metadata_size: usize, shift: bool, callback: HookCallback) -> Self {
        Self {
            shift,
            callback,
            state: Mutex::new(MetadataBuffer::new(metadata_size)),
            diagnostics: Mutex::new(HookDiagnostics::default()),
            delegate: RwLock::new(None),
            sequence: AtomicU64::new(0),
        }
    }

    fn on_completion(&self, sample: &dyn CompletedSample) -> Result<(), HookError> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);

        let Some(mut metadata) = self.state.try_lock() else {
            log::error!("sample {} completed while another completion was in flight", sequence);
            self.diagnostics.lock().concurrent_completions += 1;
            let err = HookError::ConcurrentCompletion;
            self.notify_error(sequence, &err);
            return Err(err);
        };
        let outcome = self.process_sample(&mut metadata, sample);
        drop(metadata);

        {
            let mut d = self.diagnostics.lock();
            match &outcome.delivery {
                Ok((_, bytes)) => {
                    d.samples_delivered += 1;
                    d.bytes_delivered += *bytes as u64;
                }
                Err(_) => d.samples_dropped += 1,
            }
            if outcome.captured {
                d.metadata_captures += 1;
            }
        }

        match &outcome.delivery {
            Ok((timestamp, _)) => self.notify_delivered(sequence, *timestamp),
            Err(e) => {
                log::warn!("dropped sample {}: {}", sequence, e);
                self.notify_error(sequence, e);
            }
        }
        if let Some(ref e) = outcome.capture_error {
            log::warn!("no metadata captured from sample {}: {}", sequence, e);
            self.notify_error(sequence, e);
        }

        match (outcome.delivery, outcome.capture_error) {
            (Err(e), _) | (Ok(_), Some(e)) => Err(e),
            (Ok(_), None) => Ok(()),
        }
    }

    /// Pair `sample` with a metadata snapshot, deliver it, then consume the
    /// snapshot. In shift mode this sample's own blob is cached afterwards
    /// for the next completion, even when delivery failed.
    fn process_sample(&self, metadata: &mut MetadataBuffer, sample: &dyn CompletedSample) -> CompletionOutcome {
        let mut captured = false;
        let delivery = self.deliver(metadata, sample, &mut captured);

        metadata.clear();

        let mut capture_error = None;
        if self.shift {
            match metadata.capture_from(sample) {
                Ok(()) => captured = !metadata.is_empty(),
                Err(e) => capture_error = Some(e),
            }
        }

        CompletionOutcome {
            delivery,
            captured,
            capture_error,
        }
    }

    fn deliver(
        &self,
        metadata: &mut MetadataBuffer,
        sample: &dyn CompletedSample,
        captured: &mut bool,
    ) -> Result<(i64, usize), HookError> {
        let timestamp = sample.sample_time()?;

        if !self.shift {
            metadata.capture_from(sample)?;
            *captured = !metadata.is_empty();
        }

        let snapshot: &MetadataBuffer = metadata;
        let mut delivered = 0;
        sample.with_payload(&mut |frame: &[u8]| {
            (self.callback)(frame, timestamp, snapshot.as_slice());
            delivered = frame.len();
        })?;

        Ok((timestamp, delivered))
    }

    fn notify_delivered(&self, sequence: u64, timestamp: i64) {
        if let Some(ref delegate) = *self.delegate.read() {
            delegate.on_sample_delivered(sequence, timestamp);
        }
    }

    fn notify_error(&self, sequence: u64, error: &HookError) {
        if let Some(ref delegate) = *self.delegate.read() {
            delegate.on_sample_error(sequence, error);
        }
    }
}

/// Encoder hook: pairs every compressed sample an encoding sink produces
/// with the metadata blob that was attached to the raw sample it came from.
///
/// ```text
/// raw sample + blob → [EncodingSink] → completion → [HookedEncoder] → HookCallback(frame, ts, metadata)
/// ```
///
/// Metadata for output `i` is read from output `i` itself (no shift) or from
/// output `i - 1` (shift, for encoders that reorder frames). The hook owns
/// its sink and its metadata buffer; both are released when it is dropped.
pub struct HookedEncoder<S: EncodingSink> {
    sink: S,
    shared: Arc<HookShared>,
    config: EncoderConfig,
    metadata_size: usize,
    finalized: bool,
}

impl<S: EncodingSink> HookedEncoder<S> {
    /// Create a hook and the sink it intercepts.
    ///
    /// Fails if the configuration is invalid, if the factory is bound to a
    /// different metadata size, or if it cannot create the sink.
    pub fn new<F>(factory: &F, config: EncoderConfig, metadata_size: usize, callback: HookCallback) -> Result<Self, HookError>
    where
        F: SinkFactory<Sink = S>,
    {
        config.validate().map_err(HookError::InvalidConfiguration)?;
        if let Some(expected) = factory.expected_metadata_size() {
            if expected != metadata_size {
                return Err(HookError::InvalidConfiguration(format!(
                    "sink stores {} byte metadata, hook was given {}",
                    expected, metadata_size
                )));
            }
        }

        let shared = Arc::new(HookShared::new(metadata_size, config.shift_mode(), callback));
        let on_sample = Self::completion_for(&shared);

        let sink = match &config {
            EncoderConfig::Audio { subtype, format } => factory.create_for_audio(on_sample, *subtype, format)?,
            EncoderConfig::Video {
                subtype,
                format,
                stride,
                options,
            } => factory.create_for_video(on_sample, *subtype, format, *stride, options)?,
        };

        log::debug!(
            "created {} hook: {} (shift: {}, metadata: {} bytes)",
            config.stream_kind(),
            config.codec_description(),
            shared.shift,
            metadata_size
        );

        Ok(Self {
            sink,
            shared,
            config,
            metadata_size,
            finalized: false,
        })
    }

    /// Audio hook. Audio frames are never reordered, so shift mode is off.
    pub fn new_audio<F>(
        factory: &F,
        callback: HookCallback,
        metadata_size: usize,
        subtype: AudioSubtype,
        format: AacFormat,
    ) -> Result<Self, HookError>
    where
        F: SinkFactory<Sink = S>,
    {
        Self::new(factory, EncoderConfig::Audio { subtype, format }, metadata_size, callback)
    }

    /// Video hook. Shift mode is on whenever `format.profile` is not `None`.
    pub fn new_video<F>(
        factory: &F,
        callback: HookCallback,
        metadata_size: usize,
        subtype: VideoSubtype,
        format: H26xFormat,
        stride: u32,
        options: Vec<u64>,
    ) -> Result<Self, HookError>
    where
        F: SinkFactory<Sink = S>,
    {
        let config = EncoderConfig::Video {
            subtype,
            format,
            stride,
            options,
        };
        Self::new(factory, config, metadata_size, callback)
    }

    /// Allocate a buffer of `size` bytes with its valid length set to `size`.
    pub fn create_buffer(size: usize) -> MediaBuffer {
        MediaBuffer::with_length(size)
    }

    /// Submit an encoded buffer with its timing and metadata to the sink.
    ///
    /// `metadata` must be exactly `metadata_size` bytes. Sink errors are
    /// returned as-is; nothing is retried.
    pub fn write_buffer(
        &mut self,
        buffer: MediaBuffer,
        timestamp: i64,
        duration: i64,
        metadata: &[u8],
    ) -> Result<(), HookError> {
        if metadata.len() != self.metadata_size {
            return Err(HookError::MetadataSizeMismatch {
                expected: self.metadata_size,
                actual: metadata.len(),
            });
        }

        let mut sample = Sample::new();
        sample.add_buffer(buffer);
        sample.set_sample_duration(duration);
        sample.set_sample_time(timestamp);
        sample.set_user_data(metadata);

        self.sink.write_sample(sample)?;
        self.shared.diagnostics.lock().samples_written += 1;
        Ok(())
    }

    /// Handle one completed sample. This is what the registered completion
    /// callback runs; sinks that cannot hold a callback may call it directly.
    pub fn process_sample(&self, sample: &dyn CompletedSample) -> Result<(), HookError> {
        self.shared.on_completion(sample)
    }

    /// Another handle to the completion callback registered with the sink.
    pub fn completion_callback(&self) -> SampleCallback {
        Self::completion_for(&self.shared)
    }

    /// Flush the sink. Later calls are no-ops.
    pub fn finalize(&mut self) -> Result<(), HookError> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;
        self.sink.finalize()
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn HookDelegate>) {
        *self.shared.delegate.write() = Some(delegate);
    }

    pub fn shift_mode(&self) -> bool {
        self.shared.shift
    }

    pub fn metadata_size(&self) -> usize {
        self.metadata_size
    }

    pub fn stream_kind(&self) -> StreamKind {
        self.config.stream_kind()
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> HookDiagnostics {
        self.shared.diagnostics.lock().clone()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// For backend controls the hook does not wrap. Samples written here
    /// bypass the metadata size check of `write_buffer`.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn completion_for(shared: &Arc<HookShared>) -> SampleCallback {
        let shared = Arc::clone(shared);
        Arc::new(move |sample: &dyn CompletedSample| shared.on_completion(sample))
    }
}

impl<S: EncodingSink> Drop for HookedEncoder<S> {
    fn drop(&mut self) {
        self.shared.state.lock().clear();
        log::debug!(
            "released {} hook after {} completions",
            self.config.stream_kind(),
            self.shared.sequence.load(Ordering::SeqCst)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::format::{AacProfile, H26xProfile};

    /// Sink that keeps submitted samples and never completes on its own.
    struct HoldingSink {
        submitted: Vec<Sample>,
        finalize_calls: u32,
        fail_writes: bool,
    }

    impl EncodingSink for HoldingSink {
        fn write_sample(&mut self, sample: Sample) -> Result<(), HookError> {
            if self.fail_writes {
                return Err(HookError::SubmissionFailed("sink closed".into()));
            }
            self.submitted.push(sample);
            Ok(())
        }

        fn finalize(&mut self) -> Result<(), HookError> {
            self.finalize_calls += 1;
            Ok(())
        }
    }

    struct HoldingFactory {
        fail: bool,
    }

    impl SinkFactory for HoldingFactory {
        type Sink = HoldingSink;

        fn create_for_audio(
            &self,
            _on_sample: SampleCallback,
            _subtype: AudioSubtype,
            _format: &AacFormat,
        ) -> Result<HoldingSink, HookError> {
            if self.fail {
                return Err(HookError::SinkCreationFailed("no audio encoder".into()));
            }
            Ok(HoldingSink {
                submitted: Vec::new(),
                finalize_calls: 0,
                fail_writes: false,
            })
        }

        fn create_for_video(
            &self,
            _on_sample: SampleCallback,
            _subtype: VideoSubtype,
            _format: &H26xFormat,
            _stride: u32,
            _options: &[u64],
        ) -> Result<HoldingSink, HookError> {
            if self.fail {
                return Err(HookError::SinkCreationFailed("no video encoder".into()));
            }
            Ok(HoldingSink {
                submitted: Vec::new(),
                finalize_calls: 0,
                fail_writes: false,
            })
        }
    }

    type Deliveries = Arc<Mutex<Vec<(Vec<u8>, i64, Vec<u8>)>>>;

    fn recording_callback() -> (HookCallback, Deliveries) {
        let seen: Deliveries = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: HookCallback = Arc::new(move |frame: &[u8], ts: i64, metadata: &[u8]| {
            sink.lock().push((frame.to_vec(), ts, metadata.to_vec()));
        });
        (callback, seen)
    }

    fn encoded(payload: &[u8], ts: i64, blob: Option<&[u8]>) -> Sample {
        let mut sample = Sample::new();
        sample.add_buffer(MediaBuffer::from_vec(payload.to_vec()));
        sample.set_sample_time(ts);
        if let Some(blob) = blob {
            sample.set_user_data(blob);
        }
        sample
    }

    fn audio_hook(metadata_size: usize, callback: HookCallback) -> HookedEncoder<HoldingSink> {
        HookedEncoder::new_audio(
            &HoldingFactory { fail: false },
            callback,
            metadata_size,
            AudioSubtype::S16,
            AacFormat::default(),
        )
        .unwrap()
    }

    fn video_hook(profile: H26xProfile, metadata_size: usize, callback: HookCallback) -> HookedEncoder<HoldingSink> {
        let format = H26xFormat {
            width: 320,
            height: 240,
            profile,
            ..Default::default()
        };
        HookedEncoder::new_video(
            &HoldingFactory { fail: false },
            callback,
            metadata_size,
            VideoSubtype::Nv12,
            format,
            320,
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn shift_mode_derivation() {
        let (cb, _) = recording_callback();
        assert!(!audio_hook(4, cb.clone()).shift_mode());
        assert!(video_hook(H26xProfile::H264Base, 4, cb.clone()).shift_mode());
        assert!(!video_hook(H26xProfile::None, 4, cb).shift_mode());
    }

    #[test]
    fn factory_failure_propagates() {
        let (cb, _) = recording_callback();
        let result = HookedEncoder::new_audio(
            &HoldingFactory { fail: true },
            cb,
            8,
            AudioSubtype::F32,
            AacFormat::default(),
        );
        assert!(matches!(result, Err(HookError::SinkCreationFailed(_))));
    }

    #[test]
    fn invalid_config_is_rejected_before_sink_creation() {
        let (cb, _) = recording_callback();
        let format = AacFormat {
            channels: 0,
            profile: AacProfile::None,
            ..Default::default()
        };
        let result = HookedEncoder::new_audio(&HoldingFactory { fail: false }, cb, 8, AudioSubtype::S16, format);
        assert!(matches!(result, Err(HookError::InvalidConfiguration(_))));
    }

    #[test]
    fn unshifted_delivery_uses_own_metadata() {
        let (cb, seen) = recording_callback();
        let hook = audio_hook(2, cb);

        hook.process_sample(&encoded(b"f0", 0, Some(&[1, 1]))).unwrap();
        hook.process_sample(&encoded(b"f1", 10, Some(&[2, 2]))).unwrap();

        let seen = seen.lock();
        assert_eq!(seen[0], (b"f0".to_vec(), 0, vec![1, 1]));
        assert_eq!(seen[1], (b"f1".to_vec(), 10, vec![2, 2]));
    }

    #[test]
    fn shifted_delivery_lags_one_sample() {
        let (cb, seen) = recording_callback();
        let hook = video_hook(H26xProfile::H265Main, 2, cb);

        hook.process_sample(&encoded(b"f0", 0, Some(&[1, 1]))).unwrap();
        hook.process_sample(&encoded(b"f1", 10, Some(&[2, 2]))).unwrap();

        let seen = seen.lock();
        assert_eq!(seen[0].2, vec![0, 0]);
        assert_eq!(seen[1].2, vec![1, 1]);
    }

    #[test]
    fn missing_timestamp_skips_callback_but_keeps_shift_alignment() {
        let (cb, seen) = recording_callback();
        let hook = video_hook(H26xProfile::H264Main, 1, cb);

        let mut untimed = Sample::new();
        untimed.add_buffer(MediaBuffer::from_vec(vec![0]));
        untimed.set_user_data(&[7]);

        assert_eq!(hook.process_sample(&untimed), Err(HookError::TimestampUnavailable));
        hook.process_sample(&encoded(b"f1", 10, Some(&[8]))).unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].2, vec![7]);

        let d = hook.diagnostics();
        assert_eq!(d.samples_dropped, 1);
        assert_eq!(d.samples_delivered, 1);
    }

    #[derive(Default)]
    struct EventLog(Mutex<Vec<String>>);

    impl HookDelegate for EventLog {
        fn on_sample_delivered(&self, sequence: u64, _timestamp: i64) {
            self.0.lock().push(format!("delivered {}", sequence));
        }

        fn on_sample_error(&self, sequence: u64, error: &HookError) {
            self.0.lock().push(format!("error {} {}", sequence, error));
        }
    }

    #[test]
    fn shifted_sample_without_blob_is_delivered_and_reported() {
        let (cb, seen) = recording_callback();
        let mut hook = video_hook(H26xProfile::H264Base, 2, cb);
        let events = Arc::new(EventLog::default());
        hook.set_delegate(events.clone());

        let result = hook.process_sample(&encoded(b"f0", 0, None));
        assert!(matches!(result, Err(HookError::MetadataUnavailable(_))));
        assert_eq!(seen.lock().len(), 1);

        let events = events.0.lock();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], "delivered 0");
        assert!(events[1].starts_with("error 0 metadata unavailable"));

        let d = hook.diagnostics();
        assert_eq!(d.samples_delivered, 1);
        assert_eq!(d.samples_dropped, 0);
        assert_eq!(d.metadata_captures, 0);
    }

    #[test]
    fn unshifted_missing_metadata_drops_sample() {
        let (cb, seen) = recording_callback();
        let hook = audio_hook(4, cb);

        let result = hook.process_sample(&encoded(b"f0", 0, None));
        assert!(matches!(result, Err(HookError::MetadataUnavailable(_))));
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn write_buffer_attaches_metadata() {
        let (cb, _) = recording_callback();
        let mut hook = audio_hook(3, cb);

        let mut buffer = HookedEncoder::<HoldingSink>::create_buffer(4);
        buffer.data_mut().copy_from_slice(b"aac!");
        hook.write_buffer(buffer, 1_000, 200, &[9, 8, 7]).unwrap();

        let submitted = &hook.sink().submitted;
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].time(), Some(1_000));
        assert_eq!(submitted[0].duration(), Some(200));
        assert_eq!(submitted[0].user_data(), Some(&[9u8, 8, 7][..]));
        assert_eq!(submitted[0].buffers()[0].data(), b"aac!");
        assert_eq!(hook.diagnostics().samples_written, 1);
    }

    #[test]
    fn write_buffer_rejects_wrong_metadata_size() {
        let (cb, _) = recording_callback();
        let mut hook = audio_hook(3, cb);

        let result = hook.write_buffer(MediaBuffer::with_length(1), 0, 0, &[1, 2]);
        assert_eq!(result, Err(HookError::MetadataSizeMismatch { expected: 3, actual: 2 }));
        assert!(hook.sink().submitted.is_empty());
    }

    #[test]
    fn write_buffer_propagates_submission_failure() {
        let (cb, _) = recording_callback();
        let mut hook = audio_hook(1, cb);
        hook.sink_mut().fail_writes = true;

        let result = hook.write_buffer(MediaBuffer::with_length(1), 0, 0, &[1]);
        assert!(matches!(result, Err(HookError::SubmissionFailed(_))));
        assert_eq!(hook.diagnostics().samples_written, 0);
    }

    #[test]
    fn finalize_runs_once() {
        let (cb, _) = recording_callback();
        let mut hook = audio_hook(1, cb);
        hook.finalize().unwrap();
        hook.finalize().unwrap();
        assert_eq!(hook.sink().finalize_calls, 1);
    }
}
