pub mod config;
pub mod container;
pub mod diagnostics;
pub mod error;
pub mod format;
pub mod sample;
pub mod timing;
