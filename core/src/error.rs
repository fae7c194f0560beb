//! Error types for the core crate
//!
//! Every business-rule failure maps to one stable [`ErrorKind`]. Variants carry
//! a detail string naming the domain, account or field that failed; callers
//! compare on [`StarnameError::kind`] and ignore the detail.

use std::fmt;
use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StarnameError {
    /// Domain was not found
    #[error("domain does not exist: {0}")]
    DomainDoesNotExist(String),

    /// Domain name is already taken
    #[error("domain already exists: {0}")]
    DomainAlreadyExists(String),

    /// Domain validity has elapsed
    #[error("domain has expired: {0}")]
    DomainExpired(String),

    /// Domain is still valid
    #[error("domain has not expired: {0}")]
    DomainNotExpired(String),

    /// Domain grace period is still running
    #[error("domain grace period has not finished: {0}")]
    GracePeriodNotFinished(String),

    /// Domain name fails the configured pattern
    #[error("invalid domain name: {0}")]
    InvalidDomainName(String),

    /// Operation is not allowed for this domain type
    #[error("invalid domain type: {0}")]
    InvalidDomainType(String),

    /// Account was not found
    #[error("account does not exist: {0}")]
    AccountDoesNotExist(String),

    /// Account name is already taken in its domain
    #[error("account already exists: {0}")]
    AccountExists(String),

    /// Account validity has elapsed
    #[error("account has expired: {0}")]
    AccountExpired(String),

    /// Account name fails the configured pattern
    #[error("invalid account name: {0}")]
    InvalidAccountName(String),

    /// Signer is not allowed to perform the operation
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Owner address is not usable
    #[error("invalid owner: {0}")]
    InvalidOwner(String),

    /// Blockchain target failed validation
    #[error("invalid blockchain target: {0}")]
    InvalidBlockchainTarget(String),

    /// Certificate is already attached to the account
    #[error("certificate already exists: {0}")]
    CertificateExists(String),

    /// Certificate is not attached to the account
    #[error("certificate does not exist: {0}")]
    CertificateDoesNotExist(String),

    /// Malformed request
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Composite key could not be packed or unpacked
    #[error("key codec error: {0}")]
    Codec(String),

    /// Record or request could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration is unusable
    #[error("configuration error: {0}")]
    Config(String),

    /// Fee collection failed
    #[error("fee collection error: {0}")]
    Fee(String),
}

/// Stable, comparable classification of a [`StarnameError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// [`StarnameError::DomainDoesNotExist`]
    DomainDoesNotExist,
    /// [`StarnameError::DomainAlreadyExists`]
    DomainAlreadyExists,
    /// [`StarnameError::DomainExpired`]
    DomainExpired,
    /// [`StarnameError::DomainNotExpired`]
    DomainNotExpired,
    /// [`StarnameError::GracePeriodNotFinished`]
    GracePeriodNotFinished,
    /// [`StarnameError::InvalidDomainName`]
    InvalidDomainName,
    /// [`StarnameError::InvalidDomainType`]
    InvalidDomainType,
    /// [`StarnameError::AccountDoesNotExist`]
    AccountDoesNotExist,
    /// [`StarnameError::AccountExists`]
    AccountExists,
    /// [`StarnameError::AccountExpired`]
    AccountExpired,
    /// [`StarnameError::InvalidAccountName`]
    InvalidAccountName,
    /// [`StarnameError::Unauthorized`]
    Unauthorized,
    /// [`StarnameError::InvalidOwner`]
    InvalidOwner,
    /// [`StarnameError::InvalidBlockchainTarget`]
    InvalidBlockchainTarget,
    /// [`StarnameError::CertificateExists`]
    CertificateExists,
    /// [`StarnameError::CertificateDoesNotExist`]
    CertificateDoesNotExist,
    /// [`StarnameError::InvalidRequest`]
    InvalidRequest,
    /// [`StarnameError::Codec`]
    Codec,
    /// [`StarnameError::Serialization`]
    Serialization,
    /// [`StarnameError::Config`]
    Config,
    /// [`StarnameError::Fee`]
    Fee,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl StarnameError {
    /// Kind of the error, independent of its detail
    pub fn kind(&self) -> ErrorKind {
        match self {
            StarnameError::DomainDoesNotExist(_) => ErrorKind::DomainDoesNotExist,
            StarnameError::DomainAlreadyExists(_) => ErrorKind::DomainAlreadyExists,
            StarnameError::DomainExpired(_) => ErrorKind::DomainExpired,
            StarnameError::DomainNotExpired(_) => ErrorKind::DomainNotExpired,
            StarnameError::GracePeriodNotFinished(_) => ErrorKind::GracePeriodNotFinished,
            StarnameError::InvalidDomainName(_) => ErrorKind::InvalidDomainName,
            StarnameError::InvalidDomainType(_) => ErrorKind::InvalidDomainType,
            StarnameError::AccountDoesNotExist(_) => ErrorKind::AccountDoesNotExist,
            StarnameError::AccountExists(_) => ErrorKind::AccountExists,
            StarnameError::AccountExpired(_) => ErrorKind::AccountExpired,
            StarnameError::InvalidAccountName(_) => ErrorKind::InvalidAccountName,
            StarnameError::Unauthorized(_) => ErrorKind::Unauthorized,
            StarnameError::InvalidOwner(_) => ErrorKind::InvalidOwner,
            StarnameError::InvalidBlockchainTarget(_) => ErrorKind::InvalidBlockchainTarget,
            StarnameError::CertificateExists(_) => ErrorKind::CertificateExists,
            StarnameError::CertificateDoesNotExist(_) => ErrorKind::CertificateDoesNotExist,
            StarnameError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            StarnameError::Codec(_) => ErrorKind::Codec,
            StarnameError::Serialization(_) => ErrorKind::Serialization,
            StarnameError::Config(_) => ErrorKind::Config,
            StarnameError::Fee(_) => ErrorKind::Fee,
        }
    }

    /// Whether the error is of the given kind
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    /// Prepend context to the detail, keeping the kind
    pub fn context(self, context: impl fmt::Display) -> Self {
        let wrap = |detail: String| format!("{}: {}", context, detail);
        match self {
            StarnameError::DomainDoesNotExist(d) => StarnameError::DomainDoesNotExist(wrap(d)),
            StarnameError::DomainAlreadyExists(d) => StarnameError::DomainAlreadyExists(wrap(d)),
            StarnameError::DomainExpired(d) => StarnameError::DomainExpired(wrap(d)),
            StarnameError::DomainNotExpired(d) => StarnameError::DomainNotExpired(wrap(d)),
            StarnameError::GracePeriodNotFinished(d) => StarnameError::GracePeriodNotFinished(wrap(d)),
            StarnameError::InvalidDomainName(d) => StarnameError::InvalidDomainName(wrap(d)),
            StarnameError::InvalidDomainType(d) => StarnameError::InvalidDomainType(wrap(d)),
            StarnameError::AccountDoesNotExist(d) => StarnameError::AccountDoesNotExist(wrap(d)),
            StarnameError::AccountExists(d) => StarnameError::AccountExists(wrap(d)),
            StarnameError::AccountExpired(d) => StarnameError::AccountExpired(wrap(d)),
            StarnameError::InvalidAccountName(d) => StarnameError::InvalidAccountName(wrap(d)),
            StarnameError::Unauthorized(d) => StarnameError::Unauthorized(wrap(d)),
            StarnameError::InvalidOwner(d) => StarnameError::InvalidOwner(wrap(d)),
            StarnameError::InvalidBlockchainTarget(d) => StarnameError::InvalidBlockchainTarget(wrap(d)),
            StarnameError::CertificateExists(d) => StarnameError::CertificateExists(wrap(d)),
            StarnameError::CertificateDoesNotExist(d) => StarnameError::CertificateDoesNotExist(wrap(d)),
            StarnameError::InvalidRequest(d) => StarnameError::InvalidRequest(wrap(d)),
            StarnameError::Codec(d) => StarnameError::Codec(wrap(d)),
            StarnameError::Serialization(d) => StarnameError::Serialization(wrap(d)),
            StarnameError::Config(d) => StarnameError::Config(wrap(d)),
            StarnameError::Fee(d) => StarnameError::Fee(wrap(d)),
        }
    }
}

impl From<serde_json::Error> for StarnameError {
    fn from(err: serde_json::Error) -> Self {
        StarnameError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for StarnameError {
    fn from(err: bincode::Error) -> Self {
        StarnameError::Serialization(err.to_string())
    }
}

impl From<regex::Error> for StarnameError {
    fn from(err: regex::Error) -> Self {
        StarnameError::Config(err.to_string())
    }
}

/// Result type for the core crate
pub type Result<T> = std::result::Result<T, StarnameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_survives_context() {
        let err = StarnameError::Unauthorized("alice is not the admin".to_string());
        let wrapped = err.context("transfer domain iov");

        assert_eq!(wrapped.kind(), ErrorKind::Unauthorized);
        assert!(wrapped.is(ErrorKind::Unauthorized));
        assert_eq!(
            wrapped.to_string(),
            "unauthorized: transfer domain iov: alice is not the admin"
        );
    }

    #[test]
    fn test_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: StarnameError = json_err.into();
        assert_eq!(err.kind(), ErrorKind::Serialization);

        let regex_err = regex::Regex::new("(").unwrap_err();
        let err: StarnameError = regex_err.into();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_kinds_are_distinct() {
        let a = StarnameError::AccountExists("iov*bob".to_string());
        let b = StarnameError::DomainAlreadyExists("iov".to_string());
        assert_ne!(a.kind(), b.kind());
    }
}
