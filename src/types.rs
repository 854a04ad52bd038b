//! Types shared by the service, transform and storage layers

use serde::{Deserialize, Serialize};

use crate::locator::{Locator, FINGERPRINT_LEN, HASH_LEN};

/// Identity of an earlier paste that a new one supersedes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasteLink {
    pub fingerprint: [u8; FINGERPRINT_LEN],
    pub hash: [u8; HASH_LEN],
}

/// A paste that was just read or written
///
/// `content` is always the plaintext: the decrypted bytes after a read, the
/// caller's bytes after a write.
#[derive(Debug, Clone)]
pub struct Paste {
    /// Where the paste lives, including its key when encrypted
    pub locator: Locator,
    /// The paste this one replaces, if it was written as an edit
    pub previous: Option<PasteLink>,
    /// Backend query id of the request that produced this paste
    pub request_id: String,
    content: Vec<u8>,
}

impl Paste {
    pub fn new(
        locator: Locator,
        previous: Option<PasteLink>,
        request_id: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        Self {
            locator,
            previous,
            request_id: request_id.into(),
            content,
        }
    }

    pub fn url(&self) -> String {
        self.locator.to_string()
    }

    pub fn key(&self) -> Option<&[u8]> {
        self.locator.key()
    }

    pub fn link(&self) -> PasteLink {
        PasteLink {
            fingerprint: *self.locator.fingerprint(),
            hash: *self.locator.hash(),
        }
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn into_content(self) -> Vec<u8> {
        self.content
    }
}

/// Settings for one write
///
/// Setters apply in call order; a later setter overwrites the fields an
/// earlier one set.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Encryption key; `None` stores the content as plain text
    pub key: Option<Vec<u8>>,
    /// Paste the new one supersedes
    pub previous: Option<PasteLink>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, key: Option<Vec<u8>>) -> Self {
        self.key = key;
        self
    }

    /// Chain to `paste`, reusing its key
    ///
    /// `None` leaves the options untouched.
    pub fn with_previous_paste(mut self, paste: Option<&Paste>) -> Self {
        if let Some(paste) = paste {
            self.previous = Some(paste.link());
            self.key = paste.key().map(<[u8]>::to_vec);
        }
        self
    }
}

/// Row returned by the select template
#[derive(Debug, Clone, Deserialize)]
pub struct SelectRow {
    pub is_encrypted: bool,
    /// Base64 ciphertext when encrypted, plain text otherwise
    pub content: String,
}

/// Row accepted by the insert template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertRow {
    pub hash_hex: String,
    pub fingerprint_hex: String,
    /// Empty when the paste has no predecessor
    pub prev_hash_hex: String,
    /// Empty when the paste has no predecessor
    pub prev_fingerprint_hex: String,
    pub is_encrypted: bool,
    pub content: String,
}

/// Successful select: the row plus the backend query id
#[derive(Debug, Clone)]
pub struct SelectResponse {
    pub row: SelectRow,
    pub request_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::DEFAULT_FINGERPRINT;

    fn paste_with_key(key: Option<Vec<u8>>) -> Paste {
        let locator = Locator::new("https://pastila.nl/", DEFAULT_FINGERPRINT, [7u8; HASH_LEN], key);
        Paste::new(locator, None, "q-1", b"body".to_vec())
    }

    #[test]
    fn test_previous_paste_sets_link_and_key() {
        let previous = paste_with_key(Some(vec![0x01; 16]));
        let options = WriteOptions::new().with_previous_paste(Some(&previous));

        assert_eq!(
            options.previous,
            Some(PasteLink {
                fingerprint: DEFAULT_FINGERPRINT,
                hash: [7u8; HASH_LEN],
            })
        );
        assert_eq!(options.key, Some(vec![0x01; 16]));
    }

    #[test]
    fn test_later_setter_wins() {
        let previous = paste_with_key(None);

        let options = WriteOptions::new()
            .with_key(Some(vec![0x02; 16]))
            .with_previous_paste(Some(&previous));
        assert_eq!(options.key, None);

        let options = WriteOptions::new()
            .with_previous_paste(Some(&previous))
            .with_key(Some(vec![0x02; 16]));
        assert_eq!(options.key, Some(vec![0x02; 16]));
    }

    #[test]
    fn test_absent_previous_paste_is_noop() {
        let options = WriteOptions::new()
            .with_key(Some(vec![0x03; 16]))
            .with_previous_paste(None);

        assert!(options.previous.is_none());
        assert_eq!(options.key, Some(vec![0x03; 16]));
    }

    #[test]
    fn test_insert_row_field_names() {
        let row = InsertRow {
            hash_hex: "aa".into(),
            fingerprint_hex: "ffffffff".into(),
            prev_hash_hex: String::new(),
            prev_fingerprint_hex: String::new(),
            is_encrypted: false,
            content: "hi".into(),
        };
        let value = serde_json::to_value(&row).unwrap();

        for field in [
            "hash_hex",
            "fingerprint_hex",
            "prev_hash_hex",
            "prev_fingerprint_hex",
            "is_encrypted",
            "content",
        ] {
            assert!(value.get(field).is_some(), "missing {}", field);
        }
    }
}
