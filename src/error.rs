//! Error types for the pastila client

use thiserror::Error;

/// Pastila client error
#[derive(Debug, Error)]
pub enum PastilaError {
    /// The locator string is malformed, or the backend broke the protocol
    #[error("invalid pastila url: {0}")]
    InvalidLocator(String),

    /// No paste stored under the given fingerprint and hash
    #[error("pastila not found: {0}")]
    NotFound(String),

    /// Stored content is encrypted and no key was supplied
    #[error("key is required for encrypted data")]
    KeyRequired,

    /// Key material could not be decoded or used
    #[error("invalid key, {0}")]
    InvalidKey(#[from] KeyError),

    /// Backend answered with a non-success status
    #[error("unexpected status code: {status}, response: {body}")]
    Status { status: u16, body: String },

    /// HTTP transport failed
    #[error("failed to execute ClickHouse request: {0}")]
    Http(#[from] reqwest::Error),

    /// Insert row could not be encoded
    #[error("failed to encode insert row: {0}")]
    Json(#[from] serde_json::Error),

    /// Local IO failed (input, temporary file)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Unencrypted content must travel as a JSON string
    #[error("plain content must be valid UTF-8: {0}")]
    PlainContent(#[from] std::string::FromUtf8Error),

    /// Editor process could not be started
    #[error("failed to start editor {program}: {source}")]
    Editor {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Reasons a key is rejected
#[derive(Debug, Error)]
pub enum KeyError {
    /// Key segment of a locator is not standard base64
    #[error("failed to base64 decode: {0}")]
    Encoding(#[source] base64::DecodeError),

    /// Encrypted content returned by the backend is not standard base64
    #[error("failed to decode base64 ciphertext: {0}")]
    Ciphertext(#[source] base64::DecodeError),

    /// Key length is not an AES key size
    #[error("failed to create AES cipher: invalid key size {0}")]
    Length(usize),
}

/// Result type for pastila operations
pub type Result<T> = std::result::Result<T, PastilaError>;
