pub mod hooked_encoder;
