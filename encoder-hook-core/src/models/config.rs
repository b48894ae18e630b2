use std::fmt;

use serde::{Deserialize, Serialize};

use super::format::{AacFormat, AudioSubtype, H26xFormat, VideoSubtype};

/// Which kind of media a hook session carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Audio,
    Video,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoder configuration for one hook session.
///
/// Shift mode is derived from the variant rather than passed in: audio
/// frames are never reordered, video frames may be whenever the profile
/// allows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EncoderConfig {
    Audio {
        subtype: AudioSubtype,
        format: AacFormat,
    },
    Video {
        subtype: VideoSubtype,
        format: H26xFormat,
        /// Bytes per row of the raw input frames.
        stride: u32,
        /// Flattened `(property id, value)` pairs handed to the encoder.
        #[serde(default)]
        options: Vec<u64>,
    },
}

impl EncoderConfig {
    pub fn stream_kind(&self) -> StreamKind {
        match self {
            Self::Audio { .. } => StreamKind::Audio,
            Self::Video { .. } => StreamKind::Video,
        }
    }

    /// Whether metadata pairing must lag one completed sample behind.
    pub fn shift_mode(&self) -> bool {
        match self {
            Self::Audio { .. } => false,
            Self::Video { format, .. } => format.profile.permits_reordering(),
        }
    }

    /// Encoder options as `(property id, value)` pairs. Empty for audio.
    pub fn option_pairs(&self) -> Vec<(u64, u64)> {
        match self {
            Self::Audio { .. } => Vec::new(),
            Self::Video { options, .. } => options.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect(),
        }
    }

    /// Short codec description used in logs and container metadata.
    pub fn codec_description(&self) -> String {
        match self {
            Self::Audio { subtype, format } => match format.profile.bytes_per_second() {
                Some(rate) => format!("aac {}ch {}Hz {}B/s", format.channels, format.sample_rate, rate),
                None => format!("pcm {:?} {}ch {}Hz", subtype, format.channels, format.sample_rate),
            },
            Self::Video { format, .. } => format!(
                "{} {}x{} {}/{}fps",
                format.profile.codec_name(),
                format.width,
                format.height,
                format.frame_rate,
                format.divisor
            ),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Audio { format, .. } => format.validate(),
            Self::Video {
                format, stride, options, ..
            } => {
                format.validate()?;
                if *stride < u32::from(format.width) {
                    return Err(format!("stride {} is smaller than width {}", stride, format.width));
                }
                if options.len() % 2 != 0 {
                    return Err(format!(
                        "encoder options must be (id, value) pairs, got {} values",
                        options.len()
                    ));
                }
                Ok(())
            }
        }
    }
}
