use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::config::StreamKind;

/// Result returned when a container sink is finalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerResult {
    pub file_path: PathBuf,
    pub metadata: ContainerMetadata,
    pub checksum: String,
}

/// Metadata stored alongside a container file.
///
/// Serializable for the JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerMetadata {
    pub id: String,
    pub stream_kind: StreamKind,
    pub codec: String,
    pub metadata_size: u32,
    pub sample_count: u64,
    pub duration_secs: f64,
    pub file_path: String,
    pub checksum: String,
    pub created_at: String,
}

impl ContainerMetadata {
    pub fn new(
        stream_kind: StreamKind,
        codec: &str,
        metadata_size: u32,
        sample_count: u64,
        duration_secs: f64,
        file_path: &str,
        checksum: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            stream_kind,
            codec: codec.to_string(),
            metadata_size,
            sample_count,
            duration_secs,
            file_path: file_path.to_string(),
            checksum: checksum.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
