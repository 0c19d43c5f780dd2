//! Error types for DCTDM JPEG steganography.

use thiserror::Error;

/// Result type alias used throughout this crate.
pub type Result<T> = std::result::Result<T, DctdmError>;

/// Errors that can occur during JPEG decode/encode and DCTDM embed/extract.
#[derive(Error, Debug)]
pub enum DctdmError {
    /// Non-baseline JPEG, wrong sample precision, non-4:4:4 sampling,
    /// arithmetic coding, progressive scans, or restart markers.
    #[error("unsupported JPEG profile: {0}")]
    UnsupportedFormat(String),

    /// Truncated segment, invalid marker sequence, a Huffman decode that
    /// traversed a nonexistent child, or an invalid BITS table.
    #[error("malformed JPEG stream: {0}")]
    MalformedStream(String),

    /// The payload does not fit in the available coefficient pairs.
    #[error("capacity exceeded: need {required} coefficient pairs, cover provides {available}")]
    CapacityExceeded { required: usize, available: usize },

    /// The decoded length prefix was zero or implausibly large.
    #[error("invalid payload length: {0}")]
    InvalidPayloadLength(usize),

    /// Fewer bits were available than the framing required.
    #[error("truncated stego payload: expected {expected} bits, found {found}")]
    Truncated { expected: usize, found: usize },

    /// AEAD authentication failed: wrong password or tampered ciphertext.
    #[error("decryption failed (wrong password or corrupted data)")]
    DecryptionFailed,

    /// The sidecar marks the payload encrypted, but no password was given.
    #[error("this payload is encrypted; a password is required")]
    PasswordRequired,

    /// Filesystem failure at the I/O boundary.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
