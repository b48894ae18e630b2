pub mod metadata_buffer;
