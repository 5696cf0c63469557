//! Human and JSON output
//!
//! Data goes to stdout, diagnostics to stderr. JSON mode prints exactly one
//! document per command and no decorations.

use console::{Style, style};
use serde::Serialize;

use super::OutputConfig;

/// Formatter for CLI output
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn is_json(&self) -> bool {
        self.config.json
    }

    pub fn is_quiet(&self) -> bool {
        self.config.quiet
    }

    pub fn is_verbose(&self) -> bool {
        self.config.verbose
    }

    /// Colors are off with --no-color and always in JSON mode
    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// `symbol message`, the symbol colored when colors are enabled
    fn status_line(&self, symbol: &str, color: Style, message: &str) -> String {
        if self.colors_enabled() {
            format!("{} {message}", color.apply_to(symbol))
        } else {
            format!("{symbol} {message}")
        }
    }

    /// Confirmation on stdout; silent in quiet and JSON mode
    pub fn success(&self, message: &str) {
        if !(self.config.quiet || self.config.json) {
            println!("{}", self.status_line("✓", Style::new().green(), message));
        }
    }

    /// Errors always reach stderr, as a JSON object in JSON mode
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.render_error(message));
    }

    fn render_error(&self, message: &str) -> String {
        if !self.config.json {
            return self.status_line("✗", Style::new().red(), message);
        }
        serde_json::to_string_pretty(&serde_json::json!({ "error": message }))
            .unwrap_or_else(|_| message.to_string())
    }

    /// Warning on stderr; silent in quiet and JSON mode
    pub fn warning(&self, message: &str) {
        if !(self.config.quiet || self.config.json) {
            eprintln!("{}", self.status_line("⚠", Style::new().yellow(), message));
        }
    }

    /// Pretty-printed JSON document on stdout
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => self.error(&format!("Error serializing output: {e}")),
        }
    }

    /// Plain line on stdout unless quiet
    pub fn println(&self, message: &str) {
        if !self.config.quiet {
            println!("{message}");
        }
    }

    pub fn dim(&self, text: &str) -> String {
        if self.colors_enabled() {
            style(text).dim().to_string()
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> Formatter {
        Formatter::new(OutputConfig {
            no_color: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_formatter_default() {
        let formatter = Formatter::default();
        assert!(!formatter.is_json());
        assert!(!formatter.is_quiet());
        assert!(!formatter.is_verbose());
        assert!(formatter.colors_enabled());
    }

    #[test]
    fn test_json_mode_disables_colors() {
        let formatter = Formatter::new(OutputConfig {
            json: true,
            ..Default::default()
        });
        assert!(formatter.is_json());
        assert!(!formatter.colors_enabled());
    }

    #[test]
    fn test_plain_rendering() {
        let formatter = plain();
        assert!(!formatter.colors_enabled());
        assert_eq!(formatter.dim("---"), "---");
        assert_eq!(
            formatter.status_line("✓", Style::new().green(), "done"),
            "✓ done"
        );
        assert_eq!(formatter.render_error("Object not found"), "✗ Object not found");
    }

    #[test]
    fn test_json_error_object() {
        let formatter = Formatter::new(OutputConfig {
            json: true,
            ..Default::default()
        });
        let value: serde_json::Value =
            serde_json::from_str(&formatter.render_error("Object not found")).unwrap();
        assert_eq!(value, serde_json::json!({ "error": "Object not found" }));
    }
}
