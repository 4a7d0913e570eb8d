//! Login and upload client for scribe-probe.
//!
//! The harness talks to its backend through the [`TranscribeTarget`] trait.
//! [`HttpTarget`] is the real implementation: a cookie-carrying login
//! followed by multipart uploads to the transcription endpoint.

mod http;
mod response;
mod session;

use async_trait::async_trait;
pub use bytes::Bytes;
pub use http::{HttpTarget, LOGIN_PATH, TRANSCRIBE_PATH, UPLOAD_FIELD};
use probe_core::TestResult;
pub use response::apply_body;
pub use session::{Session, SessionToken};
use thiserror::Error;

/// Errors that can occur while talking to the backend.
///
/// Upload failures are not errors: they are recorded in the returned
/// [`TestResult`]. Only login reports through this type.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Login rejected with status {status}: {body}")]
    Auth { status: u16, body: String },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// A backend that accepts logins and audio uploads.
#[async_trait]
pub trait TranscribeTarget: Send + Sync {
    /// Log in with the session's credentials. On success the session holds
    /// a token afterwards; on failure it is left untouched.
    async fn authenticate(&self, session: &mut Session) -> Result<()>;

    /// Upload one payload and describe the outcome.
    ///
    /// Without an authenticated session this returns a failed result and
    /// sends nothing.
    async fn submit(
        &self,
        session: &Session,
        payload: Bytes,
        filename: &str,
        test_name: &str,
    ) -> TestResult;

    /// Returns the name of this target for logging/debugging.
    fn name(&self) -> &str;
}
