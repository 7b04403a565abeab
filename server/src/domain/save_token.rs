//! Save Token
//!
//! Single-writer lease on one recipe. Exactly one encoded token is stored
//! per recipe; a write needs the key of that token.
//!
//! Encoded form: `<base64url(json)>.<blake3 checksum>`. The checksum makes
//! corruption evident but is not keyed, so anyone who can read the stored
//! token can mint a valid one.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const KEY_BYTES: usize = 16;
const CHECKSUM_HEX_LEN: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is empty")]
    Empty,
    #[error("token is not in payload.checksum form")]
    Format,
    #[error("token payload is not base64url")]
    Base64,
    #[error("token checksum mismatch")]
    Checksum,
    #[error("token payload is malformed: {0}")]
    Payload(String),
}

/// Who holds edit rights and since when
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveToken {
    pub uid: i64,
    pub key: String,
    /// Unix time in milliseconds
    pub issued_at: i64,
}

impl SaveToken {
    /// Fresh token with a random key for `uid`
    pub fn issue(uid: i64) -> Self {
        let mut bytes = [0u8; KEY_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);

        Self {
            uid,
            key: URL_SAFE_NO_PAD.encode(bytes),
            issued_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn encode(&self) -> String {
        // serializing a plain struct of ints and strings cannot fail
        let json = serde_json::to_vec(self).unwrap_or_default();
        format!("{}.{}", URL_SAFE_NO_PAD.encode(&json), checksum(&json))
    }

    pub fn decode(encoded: &str) -> Result<Self, TokenError> {
        if encoded.is_empty() {
            return Err(TokenError::Empty);
        }

        let (payload, sum) = encoded.split_once('.').ok_or(TokenError::Format)?;
        let json = URL_SAFE_NO_PAD.decode(payload).map_err(|_| TokenError::Base64)?;

        if checksum(&json) != sum {
            return Err(TokenError::Checksum);
        }

        serde_json::from_slice(&json).map_err(|e| TokenError::Payload(e.to_string()))
    }
}

fn checksum(bytes: &[u8]) -> String {
    let hex = blake3::hash(bytes).to_hex();
    hex.as_str()[..CHECKSUM_HEX_LEN].to_string()
}

/// Try to take the edit lease.
///
/// Without `supplied_key` (entering edit mode) a new token for `uid` is
/// always issued, superseding any holder. With a key (saving) a new token is
/// issued only if the key equals the key of `current`; otherwise `None`.
pub fn try_reserve(uid: i64, current: &str, supplied_key: Option<&str>) -> Option<SaveToken> {
    match supplied_key {
        None => Some(SaveToken::issue(uid)),
        Some(key) => {
            let held = SaveToken::decode(current).ok()?;
            (held.key == key).then(|| SaveToken::issue(uid))
        }
    }
}

/// Holder of the stored token, if it decodes
pub fn holder(current: &str) -> Option<i64> {
    SaveToken::decode(current).ok().map(|t| t.uid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let token = SaveToken::issue(3);
        let decoded = SaveToken::decode(&token.encode()).unwrap();
        assert_eq!(decoded, token);
    }

    #[test]
    fn test_issue_uses_fresh_keys() {
        let a = SaveToken::issue(1);
        let b = SaveToken::issue(1);
        assert_ne!(a.key, b.key);
    }

    #[test]
    fn test_decode_rejects_tampering() {
        let encoded = SaveToken::issue(3).encode();
        let (payload, sum) = encoded.split_once('.').unwrap();

        let forged = SaveToken {
            uid: 4,
            key: "k".to_string(),
            issued_at: 0,
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());

        assert_eq!(
            SaveToken::decode(&format!("{}.{}", forged_payload, sum)),
            Err(TokenError::Checksum)
        );
        assert_eq!(SaveToken::decode(payload), Err(TokenError::Format));
        assert_eq!(SaveToken::decode("!!.abc"), Err(TokenError::Base64));
        assert_eq!(SaveToken::decode(""), Err(TokenError::Empty));
    }

    #[test]
    fn test_enter_edit_always_preempts() {
        let first = try_reserve(1, "", None).unwrap();
        let second = try_reserve(2, &first.encode(), None).unwrap();

        assert_eq!(second.uid, 2);
        assert!(try_reserve(1, &second.encode(), Some(&first.key)).is_none());
        assert!(try_reserve(2, &second.encode(), Some(&second.key)).is_some());
    }

    #[test]
    fn test_save_needs_current_key() {
        let current = SaveToken::issue(5);
        let next = try_reserve(5, &current.encode(), Some(&current.key)).unwrap();

        assert_ne!(next.key, current.key);
        // the old key is spent once the new token is stored
        assert!(try_reserve(5, &next.encode(), Some(&current.key)).is_none());
    }

    #[test]
    fn test_save_against_empty_or_corrupt_token_fails() {
        assert!(try_reserve(1, "", Some("anything")).is_none());
        assert!(try_reserve(1, "garbage", Some("anything")).is_none());
    }

    #[test]
    fn test_holder() {
        assert_eq!(holder(&SaveToken::issue(9).encode()), Some(9));
        assert_eq!(holder(""), None);
    }

    #[test]
    fn test_monotonic_sequence() {
        // a save succeeds iff it presents the key of the latest issued token
        let mut stored = String::new();
        let mut keys: Vec<String> = Vec::new();

        for step in 0..20 {
            let token = if step % 3 == 0 {
                try_reserve(step % 2, &stored, None).unwrap()
            } else {
                let latest = keys.last().cloned().unwrap();
                let stale = keys.first().cloned().unwrap();
                if keys.len() > 1 {
                    assert!(try_reserve(1, &stored, Some(stale.as_str())).is_none());
                }
                try_reserve(1, &stored, Some(latest.as_str())).unwrap()
            };
            stored = token.encode();
            keys.push(token.key);
        }
    }
}
