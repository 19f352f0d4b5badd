//! use certtool::error::CertToolError;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CertToolError>;

/// Represents errors that can occur while resolving configuration, generating
/// certificate material, or writing it out.
///
/// Every expected failure of the crate is one of these variants, so a caller
/// can match on a single type; [`CertToolError::kind`] exposes the category.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CertToolError {
    /// Invalid or missing configuration, DN values, or mode selection.
    #[error("{0}")]
    Config(String),

    /// Failure during key, CSR or certificate generation, or serialization.
    #[error("{0}")]
    Generation(String),

    /// Filesystem failure while creating directories or writing files.
    #[error("{0}")]
    Output(String),

    /// One or more items of a batch failed. Each failure has already been
    /// reported individually.
    #[error("{failed} of {total} config file(s) failed; see error messages above.")]
    BatchFailed { failed: usize, total: usize },
}

/// Category of a [`CertToolError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Config,
    Generation,
    Output,
    Batch,
}

impl CertToolError {
    pub fn config(msg: impl Into<String>) -> Self {
        CertToolError::Config(msg.into())
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        CertToolError::Generation(msg.into())
    }

    pub fn output(msg: impl Into<String>) -> Self {
        CertToolError::Output(msg.into())
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CertToolError::Config(_) => ErrorKind::Config,
            CertToolError::Generation(_) => ErrorKind::Generation,
            CertToolError::Output(_) => ErrorKind::Output,
            CertToolError::BatchFailed { .. } => ErrorKind::Batch,
        }
    }

    pub fn is_config(&self) -> bool {
        self.kind() == ErrorKind::Config
    }
}

impl From<der::Error> for CertToolError {
    /// Converts a `der::Error` into a generation error.
    fn from(err: der::Error) -> Self {
        CertToolError::Generation(format!("DER encoding failed: {err}"))
    }
}

impl From<rsa::Error> for CertToolError {
    fn from(err: rsa::Error) -> Self {
        CertToolError::Generation(format!("RSA error: {err}"))
    }
}

impl From<pkcs8::Error> for CertToolError {
    fn from(err: pkcs8::Error) -> Self {
        CertToolError::Generation(format!("PKCS#8 error: {err}"))
    }
}

impl From<spki::Error> for CertToolError {
    fn from(err: spki::Error) -> Self {
        CertToolError::Generation(format!("public key encoding failed: {err}"))
    }
}

impl From<signature::Error> for CertToolError {
    fn from(err: signature::Error) -> Self {
        CertToolError::Generation(format!("signing failed: {err}"))
    }
}
