//! Progress bar for downloads
//!
//! An indicatif bar driven by the download engine's progress updates.

use sc_core::{ProgressObserver, ProgressUpdate};

use super::OutputConfig;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {percent}% ({eta}) {msg}";

/// Download progress bar
///
/// Hidden in quiet or JSON mode.
#[derive(Debug)]
pub struct TransferBar {
    bar: Option<indicatif::ProgressBar>,
}

impl TransferBar {
    /// Create a bar labelled with the object being downloaded
    pub fn new(config: &OutputConfig, label: &str) -> Self {
        let bar = if config.quiet || config.json {
            None
        } else {
            let bar = indicatif::ProgressBar::new(0);
            let style = indicatif::ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
                .progress_chars("#>-");
            bar.set_style(style);
            bar.set_message(label.to_string());
            Some(bar)
        };

        Self { bar }
    }

    /// Check if progress bar is visible
    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }

    /// Current position, if visible
    pub fn position(&self) -> Option<u64> {
        self.bar.as_ref().map(indicatif::ProgressBar::position)
    }
}

impl ProgressObserver for TransferBar {
    fn on_start(&self, size: u64) {
        if let Some(bar) = &self.bar {
            bar.set_length(size);
        }
    }

    fn on_progress(&self, update: ProgressUpdate) {
        if let Some(bar) = &self.bar {
            bar.set_position(update.downloaded);
        }
    }

    fn on_finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

// A failed download never reaches `on_finish`; the bar must not linger above the error.
impl Drop for TransferBar {
    fn drop(&mut self) {
        if let Some(bar) = &self.bar
            && !bar.is_finished()
        {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_bar_quiet_mode() {
        let config = OutputConfig {
            quiet: true,
            ..Default::default()
        };
        assert!(!TransferBar::new(&config, "k").is_visible());
    }

    #[test]
    fn test_transfer_bar_json_mode() {
        let config = OutputConfig {
            json: true,
            ..Default::default()
        };
        assert!(!TransferBar::new(&config, "k").is_visible());
    }

    #[test]
    fn test_transfer_bar_tracks_updates() {
        let bar = TransferBar::new(&OutputConfig::default(), "k");
        assert!(bar.is_visible());

        bar.on_start(100);
        bar.on_progress(ProgressUpdate {
            size: 100,
            downloaded: 40,
        });
        assert_eq!(bar.position(), Some(40));
        bar.on_finish();
    }

    #[test]
    fn test_unfinished_bar_is_cleared_on_drop() {
        let bar = TransferBar::new(&OutputConfig::default(), "k");
        bar.on_start(100);
        bar.on_progress(ProgressUpdate {
            size: 100,
            downloaded: 10,
        });
        let handle = bar.bar.clone().unwrap();
        assert!(!handle.is_finished());

        drop(bar);
        assert!(handle.is_finished());
    }
}
