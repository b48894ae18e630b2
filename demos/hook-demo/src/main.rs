use std::path::{Path, PathBuf};
use std::process;
use std::sync::mpsc;
use std::sync::Arc;

use clap::{Arg, Command};
use parking_lot::Mutex;

use encoder_hook_core::models::timing::{self, TICKS_PER_SECOND};
use encoder_hook_core::{
    read_container, ContainerFactory, EncoderConfig, H26xFormat, H26xProfile, HookCallback, HookDelegate, HookError,
    HookedEncoder, LoopbackFactory, MediaBuffer, VideoSubtype,
};

/// AAC frames carry 1024 PCM samples per channel.
const AAC_FRAME_SAMPLES: i64 = 1024;

struct LoggingDelegate {
    stage: &'static str,
}

impl HookDelegate for LoggingDelegate {
    fn on_sample_delivered(&self, sequence: u64, timestamp: i64) {
        log::trace!("[{}] sample {} delivered at {}", self.stage, sequence, timestamp);
    }

    fn on_sample_error(&self, sequence: u64, error: &HookError) {
        log::warn!("[{}] sample {} failed: {}", self.stage, sequence, error);
    }
}

fn main() {
    env_logger::init();

    let matches = Command::new("hook-demo")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("JSON encoder configuration. Defaults to 640x480 H.264 main."),
        )
        .arg(
            Arg::new("frames")
                .short('n')
                .long("frames")
                .value_name("COUNT")
                .value_parser(clap::value_parser!(u32))
                .default_value("30"),
        )
        .arg(
            Arg::new("metadata-size")
                .short('m')
                .long("metadata-size")
                .value_name("BYTES")
                .value_parser(clap::value_parser!(usize))
                .default_value("16"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .get_matches();

    let config = match matches.get_one::<String>("config") {
        Some(path) => load_config(Path::new(path)),
        None => Ok(default_config()),
    };
    let frames = matches.get_one::<u32>("frames").copied().unwrap_or(30);
    let metadata_size = matches.get_one::<usize>("metadata-size").copied().unwrap_or(16);
    let output = matches
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| std::env::temp_dir().join("hook-demo"));

    if let Err(e) = config.and_then(|config| run(config, frames, metadata_size, &output)) {
        log::error!("demo failed: {}", e);
        process::exit(1);
    }
}

fn default_config() -> EncoderConfig {
    EncoderConfig::Video {
        subtype: VideoSubtype::Nv12,
        format: H26xFormat {
            width: 640,
            height: 480,
            profile: H26xProfile::H264Main,
            ..Default::default()
        },
        stride: 640,
        options: Vec::new(),
    }
}

fn load_config(path: &Path) -> Result<EncoderConfig, HookError> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| HookError::InvalidConfiguration(format!("failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&json).map_err(|e| HookError::InvalidConfiguration(format!("failed to parse config: {}", e)))
}

fn sample_duration(config: &EncoderConfig) -> i64 {
    match config {
        EncoderConfig::Audio { format, .. } if format.sample_rate > 0 => {
            AAC_FRAME_SAMPLES * TICKS_PER_SECOND / i64::from(format.sample_rate)
        }
        EncoderConfig::Audio { .. } => 0,
        EncoderConfig::Video { format, .. } => timing::frame_duration_ticks(format.frame_rate, format.divisor),
    }
}

/// Metadata for frame `index`: its index followed by zero padding.
fn frame_metadata(index: u32, size: usize) -> Vec<u8> {
    let mut blob = vec![0u8; size];
    let tag = u64::from(index).to_le_bytes();
    let n = tag.len().min(size);
    blob[..n].copy_from_slice(&tag[..n]);
    blob
}

/// Encode synthetic frames through a reordering loopback encoder, then
/// remux the delivered frames into a container with their metadata.
fn run(config: EncoderConfig, frames: u32, metadata_size: usize, output: &Path) -> Result<(), HookError> {
    let duration = sample_duration(&config);
    log::info!(
        "encoding {} {} samples ({}) with {} byte metadata",
        frames,
        config.stream_kind(),
        config.codec_description(),
        metadata_size
    );

    let (tx, rx) = mpsc::channel::<(Vec<u8>, i64, Vec<u8>)>();
    let tx = Mutex::new(tx);
    let on_frame: HookCallback = Arc::new(move |frame: &[u8], ts: i64, metadata: &[u8]| {
        if tx.lock().send((frame.to_vec(), ts, metadata.to_vec())).is_err() {
            log::warn!("remux stage is gone, dropping frame at {}", ts);
        }
    });

    let mut encoder = HookedEncoder::new(&LoopbackFactory::reordering(), config.clone(), metadata_size, on_frame)?;
    encoder.set_delegate(Arc::new(LoggingDelegate { stage: "encode" }));

    for index in 0..frames {
        let mut buffer = MediaBuffer::with_length(64);
        buffer.data_mut().fill(index as u8);
        let timestamp = i64::from(index) * duration;
        encoder.write_buffer(buffer, timestamp, duration, &frame_metadata(index, metadata_size))?;
    }
    encoder.finalize()?;
    let encoded = encoder.diagnostics();
    drop(encoder);

    let factory = ContainerFactory::new(output.to_path_buf(), metadata_size as u32);
    let noop: HookCallback = Arc::new(|_: &[u8], _: i64, _: &[u8]| {});
    let mut muxer = HookedEncoder::new(&factory, config, metadata_size, noop)?;
    muxer.set_delegate(Arc::new(LoggingDelegate { stage: "remux" }));

    for (frame, ts, metadata) in rx.try_iter() {
        muxer.write_buffer(MediaBuffer::from_vec(frame), ts, duration, &metadata)?;
    }
    muxer.finalize()?;

    let result = muxer
        .sink()
        .result()
        .cloned()
        .ok_or_else(|| HookError::StorageError("container was not finalized".into()))?;
    let (header, records) = read_container(&result.file_path)?;

    log::info!(
        "encode stage: {} delivered, {} dropped, {} metadata captures",
        encoded.samples_delivered,
        encoded.samples_dropped,
        encoded.metadata_captures
    );
    log::info!(
        "wrote {} ({} {} records, {:.3}s, sha256 {})",
        result.file_path.display(),
        records.len(),
        header.stream_kind,
        result.metadata.duration_secs,
        result.checksum
    );
    Ok(())
}
