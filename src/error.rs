use thiserror::Error;

/// Failures of a single round trip to the checking service.
///
/// These never escape the session: a failed check is reported as "no matches".
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("request to checking service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("checking service returned HTTP {status}")]
    Status { status: u16 },

    #[error("malformed checking service response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Contract violations in marker and match bookkeeping.
///
/// These indicate an offset-tracking bug and are surfaced to the caller
/// instead of being absorbed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OverlayError {
    #[error("no match at offset {offset} (length {length}, rule {rule_id})")]
    MarkerLookup {
        offset: usize,
        length: usize,
        rule_id: String,
    },

    #[error("range {offset}+{length} is out of bounds for a document of {len} characters")]
    OutOfBounds {
        offset: usize,
        length: usize,
        len: usize,
    },

    #[error("no suggestion popup is open")]
    PopupClosed,

    #[error("suggestion {index} does not exist ({available} available)")]
    NoSuchChoice { index: usize, available: usize },
}
