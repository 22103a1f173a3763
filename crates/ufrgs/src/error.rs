//! Error types for portal operations.

use thiserror::Error;

/// Errors that can occur while talking to the UFRGS portal.
///
/// Missing HTML structure is deliberately *not* represented here: the portal's
/// markup is not ours, so extractors degrade to partial results with
/// diagnostics instead of failing (see [`crate::extract::Extracted`]).
#[derive(Debug, Error)]
pub enum UfrgsError {
    /// Network/HTTP request failed
    #[error("network error: {message}")]
    Network { message: String },

    /// Login POST came back with HTTP 200, i.e. the login page re-rendered
    #[error("login failed: invalid credentials")]
    InvalidCredentials,

    /// Login POST redirected somewhere other than the intranet portal
    #[error("login failed: unexpected redirect to {location}")]
    UnexpectedRedirect { location: String },

    /// Login POST returned a status that is neither a redirect nor 200
    #[error("login failed: unexpected response status {status}")]
    UnexpectedLoginStatus { status: u16 },

    /// No usable saved session and no credentials to create a fresh one
    #[error("no valid saved session and no credentials provided")]
    NoValidSession,

    /// Semester string did not match the `YYYY/1` or `YYYY/2` shape
    #[error("invalid semester format: {input:?} (expected YYYY/1 or YYYY/2)")]
    InvalidSemester { input: String },

    /// Session store I/O failed
    #[error("session store error: {message}")]
    Store { message: String },
}

impl UfrgsError {
    /// Returns true if this error means the portal was unreachable, as
    /// opposed to an authentication or input problem.
    pub fn is_network(&self) -> bool {
        matches!(self, UfrgsError::Network { .. })
    }
}

impl From<reqwest::Error> for UfrgsError {
    fn from(err: reqwest::Error) -> Self {
        UfrgsError::Network {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for UfrgsError {
    fn from(err: std::io::Error) -> Self {
        UfrgsError::Store {
            message: err.to_string(),
        }
    }
}
