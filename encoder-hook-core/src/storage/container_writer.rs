use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::config::{EncoderConfig, StreamKind};
use crate::models::container::{ContainerMetadata, ContainerResult};
use crate::models::error::HookError;
use crate::models::format::{AacFormat, AudioSubtype, H26xFormat, VideoSubtype};
use crate::models::sample::Sample;
use crate::models::timing;
use crate::storage::container_format::{self, ContainerHeader, ContainerRecord};
use crate::storage::metadata;
use crate::traits::encoding_sink::{EncodingSink, SampleCallback, SinkFactory};

/// Muxing sink that appends annotated samples to a hook container file.
///
/// Never produces completions: every submitted sample goes straight to
/// disk together with its metadata blob. `finalize` writes the SHA-256
/// checksum and a JSON sidecar next to the file.
///
/// ## File Format
/// See `container_format`.
pub struct ContainerSink {
    file_path: PathBuf,
    stream_kind: StreamKind,
    codec: String,
    metadata_size: u32,
    file: Option<File>,
    sample_count: u64,
    total_bytes_written: u64,
    first_time: Option<i64>,
    end_time: Option<i64>,
    result: Option<ContainerResult>,
}

impl ContainerSink {
    /// Create the file (and its directory) and write the header.
    pub fn create(
        file_path: PathBuf,
        stream_kind: StreamKind,
        codec: &str,
        metadata_size: u32,
    ) -> Result<Self, HookError> {
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| HookError::SinkCreationFailed(format!("failed to create directory: {}", e)))?;
        }

        let file = File::create(&file_path)
            .map_err(|e| HookError::SinkCreationFailed(format!("failed to create file: {}", e)))?;

        let mut sink = Self {
            file_path,
            stream_kind,
            codec: codec.to_string(),
            metadata_size,
            file: Some(file),
            sample_count: 0,
            total_bytes_written: 0,
            first_time: None,
            end_time: None,
            result: None,
        };
        let header = container_format::generate_header(stream_kind, metadata_size);
        sink.write_raw(&header)?;
        Ok(sink)
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Total bytes written so far, header included.
    pub fn bytes_written(&self) -> u64 {
        self.total_bytes_written
    }

    /// Available once `finalize` has succeeded.
    pub fn result(&self) -> Option<&ContainerResult> {
        self.result.as_ref()
    }

    fn duration_ticks(&self) -> i64 {
        match (self.first_time, self.end_time) {
            (Some(start), Some(end)) => end.saturating_sub(start),
            _ => 0,
        }
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), HookError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| HookError::StorageError("container is not open".into()))?;
        file.write_all(data)
            .map_err(|e| HookError::StorageError(format!("write failed: {}", e)))?;
        self.total_bytes_written += data.len() as u64;
        Ok(())
    }
}

impl EncodingSink for ContainerSink {
    fn write_sample(&mut self, sample: Sample) -> Result<(), HookError> {
        if self.file.is_none() {
            return Err(HookError::SubmissionFailed("container is already finalized".into()));
        }

        let time = sample.time().ok_or(HookError::TimestampUnavailable)?;
        let duration = sample.duration().unwrap_or(0);
        let blob = sample
            .user_data()
            .ok_or_else(|| HookError::MetadataUnavailable("sample carries no user data".into()))?;
        if blob.len() != self.metadata_size as usize {
            return Err(HookError::MetadataSizeMismatch {
                expected: self.metadata_size as usize,
                actual: blob.len(),
            });
        }
        let end = time.checked_add(duration).ok_or_else(|| {
            HookError::SubmissionFailed(format!("sample end overflows: time {} + duration {}", time, duration))
        })?;
        let payload = sample.contiguous()?;

        let record = container_format::encode_record(time, duration, blob, &payload)?;
        self.write_raw(&record)?;

        self.sample_count += 1;
        self.first_time = Some(self.first_time.map_or(time, |t| t.min(time)));
        self.end_time = Some(self.end_time.map_or(end, |t| t.max(end)));
        Ok(())
    }

    /// Flush the file, compute its checksum and write the JSON sidecar.
    fn finalize(&mut self) -> Result<(), HookError> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| HookError::StorageError("container is not open".into()))?;
        file.flush().map_err(|e| HookError::StorageError(e.to_string()))?;
        drop(file);

        let checksum = sha256_file(&self.file_path)?;
        let duration_secs = timing::ticks_to_secs(self.duration_ticks());

        let sidecar = ContainerMetadata::new(
            self.stream_kind,
            &self.codec,
            self.metadata_size,
            self.sample_count,
            duration_secs,
            &self.file_path.to_string_lossy(),
            &checksum,
        );
        metadata::write_metadata(&sidecar, &self.file_path)?;

        log::debug!(
            "finalized {} container {} ({} samples, {:.3}s)",
            self.stream_kind,
            self.file_path.display(),
            self.sample_count,
            duration_secs
        );

        self.result = Some(ContainerResult {
            file_path: self.file_path.clone(),
            metadata: sidecar,
            checksum,
        });
        Ok(())
    }
}

/// Creates `{kind}_{uuid}.hkc` container sinks in one output directory.
#[derive(Debug, Clone)]
pub struct ContainerFactory {
    output_directory: PathBuf,
    metadata_size: u32,
}

impl ContainerFactory {
    pub fn new(output_directory: PathBuf, metadata_size: u32) -> Self {
        Self {
            output_directory,
            metadata_size,
        }
    }

    fn create(&self, config: &EncoderConfig) -> Result<ContainerSink, HookError> {
        let kind = config.stream_kind();
        let file_name = format!("{}_{}.hkc", kind, uuid::Uuid::new_v4());
        ContainerSink::create(
            self.output_directory.join(file_name),
            kind,
            &config.codec_description(),
            self.metadata_size,
        )
    }
}

impl SinkFactory for ContainerFactory {
    type Sink = ContainerSink;

    fn expected_metadata_size(&self) -> Option<usize> {
        Some(self.metadata_size as usize)
    }

    fn create_for_audio(
        &self,
        _on_sample: SampleCallback,
        subtype: AudioSubtype,
        format: &AacFormat,
    ) -> Result<ContainerSink, HookError> {
        self.create(&EncoderConfig::Audio {
            subtype,
            format: *format,
        })
    }

    fn create_for_video(
        &self,
        _on_sample: SampleCallback,
        subtype: VideoSubtype,
        format: &H26xFormat,
        stride: u32,
        options: &[u64],
    ) -> Result<ContainerSink, HookError> {
        self.create(&EncoderConfig::Video {
            subtype,
            format: *format,
            stride,
            options: options.to_vec(),
        })
    }
}

/// Read a container file back into its header and records.
pub fn read_container(path: &Path) -> Result<(ContainerHeader, Vec<ContainerRecord>), HookError> {
    let data = fs::read(path).map_err(|e| HookError::StorageError(format!("failed to read container: {}", e)))?;
    let header = container_format::parse_header(&data)?;
    let records = container_format::parse_records(&data[container_format::CONTAINER_HEADER_SIZE..])?;
    Ok((header, records))
}

/// Compute SHA-256 hex digest of a file.
fn sha256_file(path: &Path) -> Result<String, HookError> {
    let data =
        fs::read(path).map_err(|e| HookError::StorageError(format!("failed to read file for checksum: {}", e)))?;
    let digest = Sha256::digest(&data);
    Ok(hex_encode(&digest))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
