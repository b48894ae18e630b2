//! # encoder-hook-core
//!
//! Platform-agnostic encoder hook library.
//!
//! Sits between a raw capture pipeline and a media encoder: every raw
//! sample carries a fixed-size metadata blob, and every compressed sample
//! the encoder produces is handed to a caller callback together with the
//! blob that describes it. Encoders that reorder frames (any H.26x profile)
//! emit outputs one step behind, so their blobs are paired one completion
//! late. Platform encoders implement `SinkFactory`/`EncodingSink` and plug
//! into the generic `HookedEncoder`.
//!
//! ## Architecture
//!
//! ```text
//! encoder-hook-core (this crate)
//! ├── traits/       ← EncodingSink, SinkFactory, CompletedSample, HookCallback, HookDelegate
//! ├── models/       ← HookError, EncoderConfig, formats, Sample/MediaBuffer, diagnostics
//! ├── processing/   ← MetadataBuffer
//! ├── session/      ← HookedEncoder (metadata pairing + write-back)
//! ├── sinks/        ← LoopbackSink (in-process completion)
//! └── storage/      ← ContainerSink, container format, JSON sidecar
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod sinks;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::{EncoderConfig, StreamKind};
pub use models::container::{ContainerMetadata, ContainerResult};
pub use models::diagnostics::HookDiagnostics;
pub use models::error::HookError;
pub use models::format::{AacFormat, AacLevel, AacProfile, AudioSubtype, H26xFormat, H26xProfile, VideoSubtype};
pub use models::sample::{MediaBuffer, Sample};
pub use processing::metadata_buffer::MetadataBuffer;
pub use session::hooked_encoder::HookedEncoder;
pub use sinks::loopback::{LoopbackFactory, LoopbackMode, LoopbackSink};
pub use storage::container_writer::{read_container, ContainerFactory, ContainerSink};
pub use traits::completed_sample::CompletedSample;
pub use traits::encoding_sink::{EncodingSink, SampleCallback, SinkFactory};
pub use traits::hook_callback::HookCallback;
pub use traits::hook_delegate::HookDelegate;
