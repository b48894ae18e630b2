//! Hook container file layout.
//!
//! A container is a 16-byte header followed by one record per sample.
//! All integers are little-endian.
//!
//! Header:
//! ```text
//! [0-3]    "HKCF"
//! [4-5]    version (1)
//! [6]      stream kind (0 = audio, 1 = video)
//! [7]      reserved (0)
//! [8-11]   metadata size in bytes
//! [12-15]  reserved (0)
//! ```
//!
//! Record:
//! ```text
//! [i64 sample time] [i64 duration] [u32 metadata len] [metadata] [u32 payload len] [payload]
//! ```

use crate::models::config::StreamKind;
use crate::models::error::HookError;

/// Size of the container header in bytes.
pub const CONTAINER_HEADER_SIZE: usize = 16;

/// Fixed part of a record before the metadata bytes.
pub const RECORD_PREFIX_SIZE: usize = 8 + 8 + 4;

pub const CONTAINER_MAGIC: &[u8; 4] = b"HKCF";
pub const CONTAINER_VERSION: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub version: u16,
    pub stream_kind: StreamKind,
    pub metadata_size: u32,
}

/// One sample as stored in a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    pub sample_time: i64,
    pub duration: i64,
    pub metadata: Vec<u8>,
    pub payload: Vec<u8>,
}

pub fn generate_header(stream_kind: StreamKind, metadata_size: u32) -> [u8; CONTAINER_HEADER_SIZE] {
    let mut header = [0u8; CONTAINER_HEADER_SIZE];
    header[0..4].copy_from_slice(CONTAINER_MAGIC);
    header[4..6].copy_from_slice(&CONTAINER_VERSION.to_le_bytes());
    header[6] = match stream_kind {
        StreamKind::Audio => 0,
        StreamKind::Video => 1,
    };
    header[8..12].copy_from_slice(&metadata_size.to_le_bytes());
    header
}

pub fn parse_header(bytes: &[u8]) -> Result<ContainerHeader, HookError> {
    if bytes.len() < CONTAINER_HEADER_SIZE {
        return Err(HookError::StorageError(format!(
            "container header truncated: {} bytes",
            bytes.len()
        )));
    }
    if &bytes[0..4] != CONTAINER_MAGIC {
        return Err(HookError::StorageError("not a hook container".into()));
    }
    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != CONTAINER_VERSION {
        return Err(HookError::StorageError(format!("unsupported container version {}", version)));
    }
    let stream_kind = match bytes[6] {
        0 => StreamKind::Audio,
        1 => StreamKind::Video,
        other => return Err(HookError::StorageError(format!("unknown stream kind {}", other))),
    };
    let metadata_size = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    Ok(ContainerHeader {
        version,
        stream_kind,
        metadata_size,
    })
}

/// Serialize one record.
pub fn encode_record(sample_time: i64, duration: i64, metadata: &[u8], payload: &[u8]) -> Result<Vec<u8>, HookError> {
    let metadata_len = u32::try_from(metadata.len())
        .map_err(|_| HookError::StorageError(format!("metadata too large: {} bytes", metadata.len())))?;
    let payload_len = u32::try_from(payload.len())
        .map_err(|_| HookError::StorageError(format!("payload too large: {} bytes", payload.len())))?;

    let mut out = Vec::with_capacity(RECORD_PREFIX_SIZE + metadata.len() + 4 + payload.len());
    out.extend_from_slice(&sample_time.to_le_bytes());
    out.extend_from_slice(&duration.to_le_bytes());
    out.extend_from_slice(&metadata_len.to_le_bytes());
    out.extend_from_slice(metadata);
    out.extend_from_slice(&payload_len.to_le_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

/// Parse every record following the header.
pub fn parse_records(mut bytes: &[u8]) -> Result<Vec<ContainerRecord>, HookError> {
    let mut records = Vec::new();
    while !bytes.is_empty() {
        let sample_time = i64::from_le_bytes(take_array(&mut bytes)?);
        let duration = i64::from_le_bytes(take_array(&mut bytes)?);
        let metadata_len = u32::from_le_bytes(take_array(&mut bytes)?) as usize;
        let metadata = take(&mut bytes, metadata_len)?.to_vec();
        let payload_len = u32::from_le_bytes(take_array(&mut bytes)?) as usize;
        let payload = take(&mut bytes, payload_len)?.to_vec();
        records.push(ContainerRecord {
            sample_time,
            duration,
            metadata,
            payload,
        });
    }
    Ok(records)
}

fn take<'a>(bytes: &mut &'a [u8], count: usize) -> Result<&'a [u8], HookError> {
    if bytes.len() < count {
        return Err(HookError::StorageError(format!(
            "record truncated: wanted {} bytes, {} left",
            count,
            bytes.len()
        )));
    }
    let (head, tail) = bytes.split_at(count);
    *bytes = tail;
    Ok(head)
}

fn take_array<const N: usize>(bytes: &mut &[u8]) -> Result<[u8; N], HookError> {
    let mut out = [0u8; N];
    out.copy_from_slice(take(bytes, N)?);
    Ok(out)
}
