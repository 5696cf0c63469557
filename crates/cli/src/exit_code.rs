//! Process exit codes
//!
//! Scripts branch on these values, so they never change meaning.

use sc_core::Error;

/// Exit status of an s3commander invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    /// Bad arguments, missing region, unreadable config file
    UsageError = 2,
    /// Transport failure, remote-reported error or protocol violation
    NetworkError = 3,
    AuthError = 4,
    /// Bucket, object or version does not exist
    NotFound = 5,
    /// Destination exists and overwriting was refused
    Conflict = 6,
}

impl ExitCode {
    const ALL: [ExitCode; 7] = [
        Self::Success,
        Self::GeneralError,
        Self::UsageError,
        Self::NetworkError,
        Self::AuthError,
        Self::NotFound,
        Self::Conflict,
    ];

    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Look up a known exit code
    pub fn from_i32(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_i32() == code)
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Success => "Operation completed successfully",
            Self::GeneralError => "General error",
            Self::UsageError => "Invalid arguments or configuration",
            Self::NetworkError => "Network or remote error",
            Self::AuthError => "Authentication or permission failure",
            Self::NotFound => "Resource not found",
            Self::Conflict => "Destination already exists",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        Self::from_i32(err.exit_code()).unwrap_or(Self::GeneralError)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}
