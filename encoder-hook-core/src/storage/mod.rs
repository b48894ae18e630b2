pub mod container_format;
pub mod container_writer;
pub mod metadata;
