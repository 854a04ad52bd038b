//! Client for the pastila.nl copy-paste service
//!
//! Pastes live in a ClickHouse table and are addressed by a 128-bit hash of
//! the stored content plus a fixed fingerprint. Content can be AES-CTR
//! encrypted with a key that only ever travels inside the paste URL, and a
//! paste can be chained to the one it replaces to keep an edit history.
//!
//! # Example
//!
//! ```rust,no_run
//! use pastila::{cipher, PasteService, ServiceConfig, WriteOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = PasteService::new(&ServiceConfig::from_env())?;
//!
//! // Write with a fresh key
//! let options = WriteOptions::new().with_key(Some(cipher::generate_key()));
//! let paste = service.write_bytes(b"Hello ClickHouse!".to_vec(), &options).await?;
//! println!("{}", paste.url());
//!
//! // Read it back
//! let copy = service.read(&paste.url()).await?;
//! assert_eq!(copy.content(), b"Hello ClickHouse!");
//! # Ok(())
//! # }
//! ```

pub mod cipher;
pub mod client;
pub mod config;
pub mod edit;
pub mod error;
pub mod hash;
pub mod locator;
pub mod output;
pub mod service;
pub mod transform;
pub mod types;

// Re-export main types
pub use client::StorageClient;
pub use config::{EditorConfig, KeySource, ServiceConfig};
pub use edit::EditSession;
pub use error::{KeyError, PastilaError, Result};
pub use locator::Locator;
pub use output::Output;
pub use service::PasteService;
pub use types::*;
