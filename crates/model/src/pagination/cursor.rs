use crate::pagination::ordering::Ordering;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Offsets above this are clamped. Bounds the cost of skipping rows that
/// share one position.
pub const OFFSET_CUTOFF: u64 = 1000;

// Upper bound for untrusted token input.
const MAX_CURSOR_TOKEN_LEN: usize = 8 * 1024;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CursorError {
    #[error("cursor token is empty")]
    Empty,

    #[error("cursor token exceeds max length: {len} chars (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("cursor token is not valid base64url")]
    Encoding,

    #[error("cursor payload is malformed: {0}")]
    Malformed(String),

    #[error("cursor was issued for a different ordering")]
    OrderingMismatch,

    #[error("cursor position has {found} values, ordering has {expected} fields")]
    ArityMismatch { expected: usize, found: usize },

    #[error("cursor value for '{field}' is invalid: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Decoded pagination cursor.
///
/// `position` is the stringified sort key of the row the page starts after
/// (or before, when `reverse` is set). `None` means the start of the
/// sequence. `offset` skips rows that share the position exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    pub offset: u64,
    pub reverse: bool,
    pub position: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize)]
struct CursorPayload {
    #[serde(rename = "o", default)]
    offset: u64,
    #[serde(rename = "r", default)]
    reverse: bool,
    #[serde(rename = "p", default)]
    position: Option<Vec<String>>,
    #[serde(rename = "k", default, skip_serializing_if = "Option::is_none")]
    fingerprint: Option<String>,
}

impl Cursor {
    pub fn new(offset: u64, reverse: bool, position: Option<Vec<String>>) -> Self {
        Cursor {
            offset: offset.min(OFFSET_CUTOFF),
            reverse,
            position,
        }
    }

    pub fn is_first_page(&self) -> bool {
        self.position.is_none() && self.offset == 0 && !self.reverse
    }

    /// Encodes the cursor without binding it to an ordering.
    pub fn encode(&self) -> String {
        self.encode_payload(None)
    }

    /// Encodes the cursor together with `ordering`'s fingerprint.
    pub fn encode_bound(&self, ordering: &Ordering) -> String {
        self.encode_payload(Some(ordering.fingerprint()))
    }

    fn encode_payload(&self, fingerprint: Option<String>) -> String {
        let payload = CursorPayload {
            offset: self.offset.min(OFFSET_CUTOFF),
            reverse: self.reverse,
            position: self.position.clone(),
            fingerprint,
        };
        // Serializing a struct of strings and integers cannot fail.
        let json = serde_json::to_vec(&payload).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(token: &str) -> Result<Self, CursorError> {
        Self::decode_payload(token).map(|(cursor, _)| cursor)
    }

    /// Decodes a token and checks it belongs to `ordering`: the fingerprint
    /// must match and the position arity must equal the ordering's length.
    pub fn decode_bound(token: &str, ordering: &Ordering) -> Result<Self, CursorError> {
        let (cursor, fingerprint) = Self::decode_payload(token)?;

        if fingerprint.as_deref() != Some(ordering.fingerprint().as_str()) {
            return Err(CursorError::OrderingMismatch);
        }

        if let Some(position) = &cursor.position {
            if position.len() != ordering.len() {
                return Err(CursorError::ArityMismatch {
                    expected: ordering.len(),
                    found: position.len(),
                });
            }
        }

        Ok(cursor)
    }

    fn decode_payload(token: &str) -> Result<(Self, Option<String>), CursorError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CursorError::Empty);
        }
        if token.len() > MAX_CURSOR_TOKEN_LEN {
            return Err(CursorError::TooLong {
                len: token.len(),
                max: MAX_CURSOR_TOKEN_LEN,
            });
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(token.as_bytes())
            .map_err(|_| CursorError::Encoding)?;
        let payload: CursorPayload = serde_json::from_slice(&bytes)
            .map_err(|e| CursorError::Malformed(e.to_string()))?;

        if matches!(&payload.position, Some(p) if p.is_empty()) {
            return Err(CursorError::Malformed("empty position".to_string()));
        }

        Ok((
            Cursor::new(payload.offset, payload.reverse, payload.position),
            payload.fingerprint,
        ))
    }
}
