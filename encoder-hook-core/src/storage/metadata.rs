use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use crate::models::container::ContainerMetadata;
use crate::models::error::HookError;
use crate::storage::container_format::{self, CONTAINER_HEADER_SIZE};

/// Write container metadata as a JSON sidecar file.
///
/// Creates `{container_path}.metadata.json` alongside the container.
pub fn write_metadata(metadata: &ContainerMetadata, container_path: &Path) -> Result<(), HookError> {
    let metadata_path = container_path.with_extension("metadata.json");
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| HookError::StorageError(format!("failed to serialize metadata: {}", e)))?;
    fs::write(&metadata_path, json)
        .map_err(|e| HookError::StorageError(format!("failed to write metadata: {}", e)))?;
    Ok(())
}

/// Read the JSON sidecar of a container.
///
/// The sidecar must describe the container next to it: its stream kind and
/// metadata size have to match the container header.
pub fn read_metadata(container_path: &Path) -> Result<ContainerMetadata, HookError> {
    let metadata_path = container_path.with_extension("metadata.json");
    let json = fs::read_to_string(&metadata_path)
        .map_err(|e| HookError::StorageError(format!("failed to read metadata: {}", e)))?;
    let metadata: ContainerMetadata = serde_json::from_str(&json)
        .map_err(|e| HookError::StorageError(format!("failed to parse metadata: {}", e)))?;

    let mut bytes = [0u8; CONTAINER_HEADER_SIZE];
    File::open(container_path)
        .and_then(|mut file| file.read_exact(&mut bytes))
        .map_err(|e| HookError::StorageError(format!("failed to read container header: {}", e)))?;
    let header = container_format::parse_header(&bytes)?;

    if header.stream_kind != metadata.stream_kind || header.metadata_size != metadata.metadata_size {
        return Err(HookError::StorageError(format!(
            "sidecar describes {} with {} byte metadata, container holds {} with {}",
            metadata.stream_kind, metadata.metadata_size, header.stream_kind, header.metadata_size
        )));
    }
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::StreamKind;

    fn container_with_header(name: &str, kind: StreamKind, metadata_size: u32) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("encoder_hook_test_{}.hkc", name));
        fs::write(&path, container_format::generate_header(kind, metadata_size)).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        fs::remove_file(path).ok();
        fs::remove_file(path.with_extension("metadata.json")).ok();
    }

    #[test]
    fn sidecar_round_trip() {
        let path = container_with_header("sidecar", StreamKind::Audio, 16);
        let metadata = ContainerMetadata::new(StreamKind::Audio, "aac 2ch 48000Hz 24000B/s", 16, 3, 0.064, "x.hkc", "ab");

        write_metadata(&metadata, &path).unwrap();
        let loaded = read_metadata(&path).unwrap();
        assert_eq!(loaded, metadata);

        let json = fs::read_to_string(path.with_extension("metadata.json")).unwrap();
        assert!(json.contains("\"stream_kind\": \"audio\""));

        cleanup(&path);
    }

    #[test]
    fn sidecar_with_other_metadata_size_is_rejected() {
        let path = container_with_header("sidecar_size", StreamKind::Video, 8);
        let metadata = ContainerMetadata::new(StreamKind::Video, "h264 640x480 30/1fps", 4, 1, 0.033, "x.hkc", "ab");
        write_metadata(&metadata, &path).unwrap();

        let err = read_metadata(&path).unwrap_err();
        assert!(matches!(err, HookError::StorageError(ref m) if m.contains("4 byte metadata")));

        cleanup(&path);
    }

    #[test]
    fn sidecar_with_other_stream_kind_is_rejected() {
        let path = container_with_header("sidecar_kind", StreamKind::Audio, 4);
        let metadata = ContainerMetadata::new(StreamKind::Video, "h264 640x480 30/1fps", 4, 1, 0.033, "x.hkc", "ab");
        write_metadata(&metadata, &path).unwrap();

        assert!(matches!(read_metadata(&path), Err(HookError::StorageError(_))));

        cleanup(&path);
    }

    #[test]
    fn missing_sidecar_is_a_storage_error() {
        let path = std::env::temp_dir().join("encoder_hook_test_no_sidecar.hkc");
        assert!(matches!(read_metadata(&path), Err(HookError::StorageError(_))));
    }
}
