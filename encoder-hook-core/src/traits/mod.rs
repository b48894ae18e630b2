pub mod completed_sample;
pub mod encoding_sink;
pub mod hook_callback;
pub mod hook_delegate;
