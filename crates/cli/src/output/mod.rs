//! Terminal output
//!
//! `Formatter` renders results as text or JSON; `TransferBar` draws
//! download progress.

mod formatter;
mod progress;

pub use formatter::Formatter;
pub use progress::TransferBar;

/// Output switches taken from the global flags
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    pub json: bool,
    pub no_color: bool,
    pub quiet: bool,
    /// Full records and unmasked secrets
    pub verbose: bool,
}
