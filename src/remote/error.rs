/// Remote API error taxonomy
///
/// Callers branch on the category: connectivity failures abort a run before
/// any write, credential failures prompt for re-auth, and validation
/// rejections are reported per definition.

use thiserror::Error;

/// Errors returned by every remote client operation
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("cannot reach the automation service at {url}: {message} (check that the service is running and FLOWVAULT_URL points at it)")]
    Connectivity { url: String, message: String },

    #[error("the automation service rejected the credential (status {status}); check FLOWVAULT_API_KEY")]
    Auth { status: u16 },

    #[error("the automation service rejected the request (status {status}): {body}")]
    RemoteRejected { status: u16, body: String },

    #[error("unexpected response from the automation service (status {status}): {body}")]
    Unexpected { status: u16, body: String },

    #[error("failed to encode workflow JSON: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether this error means the service could not be reached at all
    ///
    /// Connectivity failures are fatal for a whole run; everything else is
    /// attributable to a single request.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ApiError::Connectivity { .. })
    }
}
