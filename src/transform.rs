//! Content transform between caller bytes and stored rows
//!
//! Write side ([`seal`]): encrypt when a key is given, base64 the ciphertext,
//! hash exactly the stored string, frame the insert row.
//! Read side ([`open`]): pass plain rows through, decode and decrypt the rest.

use base64::Engine;

use crate::cipher;
use crate::error::{KeyError, PastilaError, Result};
use crate::hash::sip_hash128;
use crate::locator::{DEFAULT_FINGERPRINT, FINGERPRINT_LEN, HASH_LEN};
use crate::types::{InsertRow, PasteLink, SelectRow};

/// Record ready to be inserted, with its identity in raw form
#[derive(Debug, Clone)]
pub struct SealedRecord {
    pub fingerprint: [u8; FINGERPRINT_LEN],
    pub hash: [u8; HASH_LEN],
    pub row: InsertRow,
}

/// Shape `plaintext` into an insert row
pub fn seal(
    plaintext: &[u8],
    key: Option<&[u8]>,
    previous: Option<&PasteLink>,
) -> Result<SealedRecord> {
    let (content, is_encrypted) = match key {
        Some(key) => {
            let ciphertext = cipher::xor_keystream(key, plaintext)?;
            (
                base64::engine::general_purpose::STANDARD.encode(ciphertext),
                true,
            )
        }
        None => (String::from_utf8(plaintext.to_vec())?, false),
    };

    let hash = sip_hash128(content.as_bytes());
    let fingerprint = DEFAULT_FINGERPRINT;

    let row = InsertRow {
        hash_hex: hex::encode(hash),
        fingerprint_hex: hex::encode(fingerprint),
        prev_hash_hex: previous.map(|p| hex::encode(p.hash)).unwrap_or_default(),
        prev_fingerprint_hex: previous
            .map(|p| hex::encode(p.fingerprint))
            .unwrap_or_default(),
        is_encrypted,
        content,
    };

    Ok(SealedRecord {
        fingerprint,
        hash,
        row,
    })
}

/// Recover plaintext from a stored row
pub fn open(row: SelectRow, key: Option<&[u8]>) -> Result<Vec<u8>> {
    if !row.is_encrypted {
        return Ok(row.content.into_bytes());
    }

    let key = match key {
        Some(key) if !key.is_empty() => key,
        _ => return Err(PastilaError::KeyRequired),
    };

    let ciphertext = base64::engine::general_purpose::STANDARD
        .decode(row.content.as_bytes())
        .map_err(KeyError::Ciphertext)?;

    Ok(cipher::xor_keystream(key, &ciphertext)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_plain() {
        let sealed = seal(b"Hello ClickHouse!", None, None).unwrap();

        assert_eq!(sealed.row.hash_hex, "fa052372d3a8a5ee87eda55a42ac2338");
        assert_eq!(sealed.row.fingerprint_hex, "ffffffff");
        assert_eq!(sealed.row.prev_hash_hex, "");
        assert_eq!(sealed.row.prev_fingerprint_hex, "");
        assert!(!sealed.row.is_encrypted);
        assert_eq!(sealed.row.content, "Hello ClickHouse!");
        assert_eq!(hex::encode(sealed.hash), sealed.row.hash_hex);
    }

    #[test]
    fn test_seal_encrypted_hashes_stored_bytes() {
        let sealed = seal(b"Hello ClickHouse!", Some(&[0x01u8; 16][..]), None).unwrap();

        assert!(sealed.row.is_encrypted);
        assert_eq!(sealed.row.content, "/svDlhoNg+c4APx5GW+eZcU=");
        assert_eq!(sealed.row.hash_hex, "f7dfa9488fcbea210ff70e44d0566245");
        assert_eq!(sealed.hash, sip_hash128(sealed.row.content.as_bytes()));
    }

    #[test]
    fn test_seal_with_previous() {
        let previous = PasteLink {
            fingerprint: DEFAULT_FINGERPRINT,
            hash: [0xab; HASH_LEN],
        };
        let sealed = seal(b"v2", None, Some(&previous)).unwrap();

        assert_eq!(sealed.row.prev_fingerprint_hex, "ffffffff");
        assert_eq!(sealed.row.prev_hash_hex, "ab".repeat(HASH_LEN));
    }

    #[test]
    fn test_seal_rejects_bad_key() {
        let err = seal(b"data", Some(&[0u8; 10][..]), None).unwrap_err();
        assert!(matches!(err, PastilaError::InvalidKey(KeyError::Length(10))));
    }

    #[test]
    fn test_seal_plain_requires_utf8() {
        let err = seal(&[0xff, 0xfe, 0x00], None, None).unwrap_err();
        assert!(matches!(err, PastilaError::PlainContent(_)));

        // Encrypted content is base64 on the wire, so any bytes go
        assert!(seal(&[0xff, 0xfe, 0x00], Some(&[0x01u8; 16][..]), None).is_ok());
    }

    #[test]
    fn test_open_roundtrip() {
        let key = [0x42u8; 32];
        let sealed = seal(b"secret notes", Some(&key[..]), None).unwrap();
        let row = SelectRow {
            is_encrypted: sealed.row.is_encrypted,
            content: sealed.row.content,
        };

        assert_eq!(open(row, Some(&key[..])).unwrap(), b"secret notes");
    }

    #[test]
    fn test_open_plain_ignores_key() {
        let row = SelectRow {
            is_encrypted: false,
            content: "plain".into(),
        };
        assert_eq!(open(row, Some(&[0x01u8; 16][..])).unwrap(), b"plain");
    }

    #[test]
    fn test_open_encrypted_without_key() {
        let row = SelectRow {
            is_encrypted: true,
            content: "xzvlHnQBwduNA0kp5UlhpxI=".into(),
        };
        assert!(matches!(open(row.clone(), None), Err(PastilaError::KeyRequired)));
        assert!(matches!(open(row, Some(&[][..])), Err(PastilaError::KeyRequired)));
    }

    #[test]
    fn test_open_corrupt_ciphertext() {
        let row = SelectRow {
            is_encrypted: true,
            content: "not base64!".into(),
        };
        let err = open(row, Some(&[0x01u8; 16][..])).unwrap_err();
        assert!(matches!(err, PastilaError::InvalidKey(KeyError::Ciphertext(_))));
    }
}
