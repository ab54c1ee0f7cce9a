//! Error types for the library layer.

use std::fmt;

use anishelf_model::ModelError;
use anishelf_prefs::PrefsError;
use anishelf_remote::RemoteError;
use anishelf_types::EntryId;
use thiserror::Error;

/// Result type for entry store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for sign-in, sign-up and sign-out.
pub type AuthResult<T> = Result<T, AuthError>;

/// Result type for library construction.
pub type LibraryResult<T> = Result<T, LibraryError>;

/// A write the store refuses to run twice at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Submission {
    Create,
    Update(EntryId),
    Delete(EntryId),
}

impl fmt::Display for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Submission::Create => f.write_str("create"),
            Submission::Update(id) => write!(f, "update of entry {id}"),
            Submission::Delete(id) => write!(f, "delete of entry {id}"),
        }
    }
}

/// Errors from entry writes. Local state is unchanged whenever one of these
/// is returned.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The remote call failed.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// The draft was rejected, or the remote answered with an unusable record.
    #[error("invalid entry: {0}")]
    Invalid(#[from] ModelError),

    /// Writes need a signed-in identity.
    #[error("not signed in")]
    NotSignedIn,

    /// The same write is already outstanding.
    #[error("{0} already in progress")]
    SubmissionInFlight(Submission),

    /// The entry does not exist for this identity.
    #[error("entry not found: {0}")]
    NotFound(EntryId),
}

/// Authentication failures, carrying messages fit to show the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidForm(String),

    #[error("no account found for username {0:?}")]
    UserNotFound(String),

    /// Sign-up worked but the account must be confirmed by email first.
    #[error("check your email to confirm the account, then sign in")]
    ConfirmationRequired,

    #[error("{0}")]
    Remote(String),
}

impl From<ModelError> for AuthError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(message) => AuthError::InvalidForm(message),
            other => AuthError::InvalidForm(other.to_string()),
        }
    }
}

impl From<RemoteError> for AuthError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::AuthFailed(message) => AuthError::Remote(message),
            RemoteError::RateLimited { retry_after_secs } => AuthError::Remote(format!(
                "too many attempts, try again in {retry_after_secs}s"
            )),
            other => AuthError::Remote(other.to_string()),
        }
    }
}

/// Errors raised while wiring a library together.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("preference storage error: {0}")]
    Prefs(#[from] PrefsError),
}
