//! Error types shared by every component of the credential stack.

use std::fmt;

/// Result type for credential stack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing types, compiling circuits,
/// handling credentials or building circuit inputs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid type parameter: {0}")]
    InvalidTypeParameter(String),

    #[error("invalid claim name: {0}")]
    InvalidClaimName(String),

    #[error("duplicate claim name: {0}")]
    DuplicateClaimName(String),

    #[error("invalid pragma: {0}")]
    InvalidPragma(String),

    #[error("invalid claim value: {0}")]
    InvalidClaimValue(String),

    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("statement check failed: {0}")]
    InvalidStatementCheck(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("unsupportable type: {0}")]
    UnsupportableType(String),

    /// Circuit layout and circuit input disagree. Always a bug, never retryable.
    #[error("internal error: {0}")]
    InternalError(String),

    #[error("proving stack not prepared: {0}")]
    NotPrepared(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable tag of this error.
    pub fn kind(&self) -> ErrorKind {
        self.into()
    }

    /// Prefix the message with credential context, keeping the tag.
    pub(crate) fn context(self, ctx: &str) -> Self {
        match self {
            Error::InvalidTypeParameter(m) => Error::InvalidTypeParameter(format!("{ctx}: {m}")),
            Error::InvalidClaimName(m) => Error::InvalidClaimName(format!("{ctx}: {m}")),
            Error::DuplicateClaimName(m) => Error::DuplicateClaimName(format!("{ctx}: {m}")),
            Error::InvalidPragma(m) => Error::InvalidPragma(format!("{ctx}: {m}")),
            Error::InvalidClaimValue(m) => Error::InvalidClaimValue(format!("{ctx}: {m}")),
            Error::InvalidCredential(m) => Error::InvalidCredential(format!("{ctx}: {m}")),
            Error::InvalidStatementCheck(m) => Error::InvalidStatementCheck(format!("{ctx}: {m}")),
            Error::InvalidSignature(m) => Error::InvalidSignature(format!("{ctx}: {m}")),
            Error::InvalidQuery(m) => Error::InvalidQuery(format!("{ctx}: {m}")),
            Error::UnsupportableType(m) => Error::UnsupportableType(format!("{ctx}: {m}")),
            Error::InternalError(m) => Error::InternalError(format!("{ctx}: {m}")),
            Error::NotPrepared(m) => Error::NotPrepared(format!("{ctx}: {m}")),
            Error::Serialization(m) => Error::Serialization(format!("{ctx}: {m}")),
            Error::Io(e) => Error::Io(std::io::Error::new(e.kind(), format!("{ctx}: {e}"))),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Error variant tag, for callers that only branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    InvalidTypeParameter,
    InvalidClaimName,
    DuplicateClaimName,
    InvalidPragma,
    InvalidClaimValue,
    InvalidCredential,
    InvalidStatementCheck,
    InvalidSignature,
    InvalidQuery,
    UnsupportableType,
    InternalError,
    NotPrepared,
    Serialization,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<&Error> for ErrorKind {
    fn from(e: &Error) -> Self {
        match e {
            Error::InvalidTypeParameter(_) => Self::InvalidTypeParameter,
            Error::InvalidClaimName(_) => Self::InvalidClaimName,
            Error::DuplicateClaimName(_) => Self::DuplicateClaimName,
            Error::InvalidPragma(_) => Self::InvalidPragma,
            Error::InvalidClaimValue(_) => Self::InvalidClaimValue,
            Error::InvalidCredential(_) => Self::InvalidCredential,
            Error::InvalidStatementCheck(_) => Self::InvalidStatementCheck,
            Error::InvalidSignature(_) => Self::InvalidSignature,
            Error::InvalidQuery(_) => Self::InvalidQuery,
            Error::UnsupportableType(_) => Self::UnsupportableType,
            Error::InternalError(_) => Self::InternalError,
            Error::NotPrepared(_) => Self::NotPrepared,
            Error::Serialization(_) => Self::Serialization,
            Error::Io(_) => Self::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::InvalidPragma("revocable depth too large".into());
        assert_eq!(e.to_string(), "invalid pragma: revocable depth too large");
    }

    #[test]
    fn test_context_keeps_kind() {
        let e = Error::InvalidClaimValue("bad".into()).context("unmarshal credential");
        assert_eq!(e.kind(), ErrorKind::InvalidClaimValue);
        assert!(e.to_string().contains("unmarshal credential: bad"));
    }

    #[test]
    fn test_kind_display_and_serde() {
        assert_eq!(ErrorKind::UnsupportableType.to_string(), "UnsupportableType");
        let json = serde_json::to_string(&ErrorKind::InternalError).unwrap();
        let back: ErrorKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ErrorKind::InternalError);
    }
}
