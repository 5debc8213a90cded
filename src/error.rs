use thiserror::Error;

// -------------------------------------------------------------------------------------------------
// Error
// -------------------------------------------------------------------------------------------------
/// Errors from building, signing, and verifying commit payloads
#[derive(Debug, Error)]
pub enum Error {
    /// An input field was malformed, e.g., an object ID of the wrong length
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// The signing key could not be loaded, decrypted, or used
    #[error("signing failed: {0}")]
    Signing(String),

    /// The signature does not validate against the payload and key
    #[error("signature verification failed: {0}")]
    Verification(String),
}

impl Error {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Error::Validation {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
