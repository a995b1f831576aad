pub(crate) mod batch;
pub(crate) mod clip_texture;
pub(crate) mod fingerprint;
