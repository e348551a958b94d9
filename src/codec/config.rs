//! Decoder configuration, with environment overrides.

use log::warn;
use std::env;
use std::str::FromStr;

use crate::codec::consts::{DEFAULT_CHUNK_SIZE, MAX_BLOB_SIZE, MAX_HEADER_SIZE};

pub const ENV_CHUNK_SIZE: &str = "OSMPBF_CHUNK_SIZE";
pub const ENV_MAX_HEADER_SIZE: &str = "OSMPBF_MAX_HEADER_SIZE";
pub const ENV_MAX_BLOB_SIZE: &str = "OSMPBF_MAX_BLOB_SIZE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Number of bytes requested from the input per read.
    pub chunk_size: usize,
    /// Length prefixes above this are rejected as implausible.
    pub max_header_size: usize,
    /// `datasize` values above this are rejected as implausible.
    pub max_blob_size: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_header_size: MAX_HEADER_SIZE,
            max_blob_size: MAX_BLOB_SIZE,
        }
    }
}

impl DecoderConfig {
    /// Loads `.env` (when present) and applies the `OSMPBF_*` overrides
    /// on top of the defaults.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let mut config = DecoderConfig::default();
        override_from_env(ENV_CHUNK_SIZE, &mut config.chunk_size);
        override_from_env(ENV_MAX_HEADER_SIZE, &mut config.max_header_size);
        override_from_env(ENV_MAX_BLOB_SIZE, &mut config.max_blob_size);

        // A zero-sized read would look like EOF.
        config.chunk_size = config.chunk_size.max(1);
        config
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

fn override_from_env<F: FromStr>(key: &str, slot: &mut F) {
    let Ok(raw) = env::var(key) else {
        return;
    };

    match raw.trim().parse::<F>() {
        Ok(value) => *slot = value,
        Err(_) => warn!("Ignoring {key}={raw:?}, not a valid size"),
    }
}
