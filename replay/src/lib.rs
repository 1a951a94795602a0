//! Transport and playback for finished battles.
//!
//! A battle is simulated once, by the host. This crate moves the result
//! between peers and lets a presentation layer walk it turn by turn:
//!
//! ```text
//! host:   simulate() ─> encode_result() ─> { "version": 1, "result": {...} }
//!                                                       │
//! guest:                      receive_from_host() <─────┘  (sides swapped)
//!                                      │
//!                                      ▼
//!                                  Replay (read-only cursor)
//! ```

use thiserror::Error;

pub mod playback;
pub mod transport;

pub use playback::Replay;
pub use transport::{
    ENVELOPE_VERSION, decode_result, encode_result, from_json, receive_from_host, to_json,
};

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Invalid battle result: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing field in envelope: {0}")]
    MissingField(&'static str),

    #[error("Unsupported envelope version {found}, expected {expected}")]
    UnsupportedVersion { found: u64, expected: u64 },
}

pub type Result<T> = std::result::Result<T, ReplayError>;
