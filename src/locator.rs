//! Pastila URL codec
//!
//! A locator has the shape `<service url>?<fingerprint>/<hash>[#<key>]`:
//! - fingerprint: 4 bytes, 8 lowercase hex chars
//! - hash: 16 bytes, 32 lowercase hex chars
//! - key: raw AES key, standard base64, only present for encrypted pastes
//!
//! Parsing only looks at the end of the input, so anything before the
//! `<fingerprint>/<hash>` pair (scheme, host, query) is kept as the service URL.

use std::fmt;
use std::sync::OnceLock;

use base64::Engine;
use regex::Regex;

use crate::error::{KeyError, PastilaError, Result};

/// Fingerprint length in bytes
pub const FINGERPRINT_LEN: usize = 4;

/// Content hash length in bytes
pub const HASH_LEN: usize = 16;

/// Fingerprint attached to every record this client writes
pub const DEFAULT_FINGERPRINT: [u8; FINGERPRINT_LEN] = [0xff; FINGERPRINT_LEN];

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([a-f0-9]+)/([a-f0-9]+)(?:#(.+))?$").expect("locator pattern is valid")
    })
}

fn is_hex_digit(b: u8) -> bool {
    matches!(b, b'a'..=b'f' | b'0'..=b'9')
}

/// Offsets where a lowercase hex run starts, rightmost first
fn candidate_starts(input: &str) -> impl Iterator<Item = usize> + '_ {
    let bytes = input.as_bytes();
    (0..bytes.len())
        .rev()
        .filter(move |&i| is_hex_digit(bytes[i]) && (i == 0 || !is_hex_digit(bytes[i - 1])))
}

/// Public identifier of a paste
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    service_url: String,
    fingerprint: [u8; FINGERPRINT_LEN],
    hash: [u8; HASH_LEN],
    key: Option<Vec<u8>>,
}

impl Locator {
    pub fn new(
        service_url: impl Into<String>,
        fingerprint: [u8; FINGERPRINT_LEN],
        hash: [u8; HASH_LEN],
        key: Option<Vec<u8>>,
    ) -> Self {
        Self {
            service_url: service_url.into(),
            fingerprint,
            hash,
            key,
        }
    }

    /// Parse a locator out of a URL-shaped string
    ///
    /// Candidates are `<hex>/<hex>[#<base64>]` suffixes, tried from the
    /// rightmost one; the first whose fields decode to a 4-byte fingerprint
    /// and a 16-byte hash wins. Fails with [`PastilaError::InvalidLocator`]
    /// when no candidate qualifies, and with [`PastilaError::InvalidKey`] when
    /// the key segment is not standard base64.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let mut rejected = None;

        for start in candidate_starts(input) {
            let Some(captures) = pattern().captures(&input[start..]) else {
                continue;
            };
            let fingerprint_hex = &captures[1];
            let hash_hex = &captures[2];

            let mut fingerprint = [0u8; FINGERPRINT_LEN];
            if let Err(e) = hex::decode_to_slice(fingerprint_hex, &mut fingerprint) {
                rejected
                    .get_or_insert_with(|| format!("fingerprint {}: {}", fingerprint_hex, e));
                continue;
            }

            let mut hash = [0u8; HASH_LEN];
            if let Err(e) = hex::decode_to_slice(hash_hex, &mut hash) {
                rejected.get_or_insert_with(|| format!("hash {}: {}", hash_hex, e));
                continue;
            }

            let key = match captures.get(3) {
                Some(segment) => Some(
                    base64::engine::general_purpose::STANDARD
                        .decode(segment.as_str())
                        .map_err(KeyError::Encoding)?,
                ),
                None => None,
            };

            let prefix = &input[..start];
            let service_url = prefix.strip_suffix('?').unwrap_or(prefix);

            return Ok(Self {
                service_url: service_url.to_string(),
                fingerprint,
                hash,
                key,
            });
        }

        Err(PastilaError::InvalidLocator(
            rejected.unwrap_or_else(|| input.to_string()),
        ))
    }

    /// Render `<service url>?<fingerprint>/<hash>[#<key>]`
    pub fn build(
        service_url: &str,
        fingerprint: &[u8; FINGERPRINT_LEN],
        hash: &[u8; HASH_LEN],
        key: Option<&[u8]>,
    ) -> String {
        let mut url = format!(
            "{}?{}/{}",
            service_url,
            hex::encode(fingerprint),
            hex::encode(hash)
        );
        if let Some(key) = key {
            url.push('#');
            url.push_str(&base64::engine::general_purpose::STANDARD.encode(key));
        }
        url
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    pub fn fingerprint(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.fingerprint
    }

    pub fn hash(&self) -> &[u8; HASH_LEN] {
        &self.hash
    }

    pub fn key(&self) -> Option<&[u8]> {
        self.key.as_deref()
    }

    pub fn fingerprint_hex(&self) -> String {
        hex::encode(self.fingerprint)
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::build(
            &self.service_url,
            &self.fingerprint,
            &self.hash,
            self.key(),
        ))
    }
}
