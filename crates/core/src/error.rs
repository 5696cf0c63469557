//! Error types for sc-core
//!
//! Provides a unified error type shared by the engine, the S3 adapter and
//! the command layer, convertible to process exit codes.

use thiserror::Error;

/// Result type alias for sc-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for sc-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (missing region, unreadable config file, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid bucket, key or destination
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Local filesystem or stdout failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Authentication or permission failure
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Bucket, object or version not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport failure or remote-reported error, message kept verbatim
    #[error("Remote error: {0}")]
    Network(String),

    /// Remote response violated the listing or streaming protocol
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Local destination conflicts with the requested operation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Process exit code for this error
    ///
    /// 2 usage or configuration, 3 network or protocol, 4 auth,
    /// 5 not found, 6 conflict, 1 anything else.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_)
            | Error::InvalidPath(_)
            | Error::InvalidUrl(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_) => 2,
            Error::Network(_) | Error::Protocol(_) => 3,
            Error::Auth(_) => 4,
            Error::NotFound(_) => 5,
            Error::Conflict(_) => 6,
            Error::Io(_) | Error::General(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::InvalidPath("test".into()).exit_code(), 2);
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::Network("test".into()).exit_code(), 3);
        assert_eq!(Error::Protocol("test".into()).exit_code(), 3);
        assert_eq!(Error::Auth("test".into()).exit_code(), 4);
        assert_eq!(Error::NotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::Conflict("test".into()).exit_code(), 6);
        assert_eq!(Error::General("test".into()).exit_code(), 1);
        assert_eq!(Error::Io(std::io::Error::other("disk")).exit_code(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = Error::Config("no region".into());
        assert_eq!(err.to_string(), "Configuration error: no region");

        let err = Error::Protocol("truncated page without token".into());
        assert_eq!(
            err.to_string(),
            "Protocol error: truncated page without token"
        );
    }
}
