use serde::{Deserialize, Serialize};

/// Layout of raw audio samples fed into the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioSubtype {
    S16,
    F32,
}

impl AudioSubtype {
    pub fn bytes_per_sample(&self) -> u32 {
        match self {
            Self::S16 => 2,
            Self::F32 => 4,
        }
    }
}

/// Layout of raw video frames fed into the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoSubtype {
    Nv12,
    Argb,
    L8,
    L16,
}

/// AAC target rate in bytes per second. `None` disables compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AacProfile {
    Rate12000,
    Rate16000,
    Rate20000,
    Rate24000,
    None,
}

impl AacProfile {
    pub fn bytes_per_second(&self) -> Option<u32> {
        match self {
            Self::Rate12000 => Some(12_000),
            Self::Rate16000 => Some(16_000),
            Self::Rate20000 => Some(20_000),
            Self::Rate24000 => Some(24_000),
            Self::None => None,
        }
    }
}

/// AAC payload type indication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AacLevel {
    Aac2,
    Aac4,
    Aac5,
    HeAac2,
    HeAac4,
    HeAac5,
}

impl AacLevel {
    /// Value written into the audio-specific config of the output type.
    pub fn indication(&self) -> u8 {
        match self {
            Self::Aac2 => 0x29,
            Self::Aac4 => 0x2A,
            Self::Aac5 => 0x2B,
            Self::HeAac2 => 0x2C,
            Self::HeAac4 => 0x2E,
            Self::HeAac5 => 0x2F,
        }
    }
}

/// Audio encoder output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AacFormat {
    pub channels: u32,
    pub sample_rate: u32,
    pub profile: AacProfile,
    pub level: AacLevel,
}

impl AacFormat {
    pub fn validate(&self) -> Result<(), String> {
        if ![1, 2].contains(&self.channels) {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.profile != AacProfile::None && ![44_100, 48_000].contains(&self.sample_rate) {
            return Err(format!("unsupported AAC sample rate: {}", self.sample_rate));
        }
        Ok(())
    }
}

impl Default for AacFormat {
    fn default() -> Self {
        Self {
            channels: 2,
            sample_rate: 48_000,
            profile: AacProfile::Rate24000,
            level: AacLevel::Aac2,
        }
    }
}

/// Video codec profile. Every profile other than `None` allows the encoder
/// to emit frames out of submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum H26xProfile {
    H264Base,
    H264Main,
    H264High,
    H265Main,
    None,
}

impl H26xProfile {
    pub fn permits_reordering(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn codec_name(&self) -> &'static str {
        match self {
            Self::H264Base | Self::H264Main | Self::H264High => "h264",
            Self::H265Main => "hevc",
            Self::None => "raw",
        }
    }
}

/// Video encoder output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct H26xFormat {
    pub width: u16,
    pub height: u16,
    pub frame_rate: u8,
    pub divisor: u8,
    pub profile: H26xProfile,
    pub level: i8,
    pub bitrate: u32,
}

impl H26xFormat {
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("invalid frame size: {}x{}", self.width, self.height));
        }
        if self.frame_rate == 0 {
            return Err("frame rate must be positive".into());
        }
        if self.divisor == 0 {
            return Err("frame rate divisor must be positive".into());
        }
        if self.profile != H26xProfile::None && self.bitrate == 0 {
            return Err("bitrate must be positive when encoding".into());
        }
        Ok(())
    }
}

impl Default for H26xFormat {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            frame_rate: 30,
            divisor: 1,
            profile: H26xProfile::H265Main,
            level: -1,
            bitrate: 5 * 1024 * 1024,
        }
    }
}
