//! Spinners for long-running requests
//!
//! Spinners draw on stderr so they never mix with command output on stdout.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Create a spinner for indeterminate operations
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

fn finish_with(spinner: &ProgressBar, prefix: &'static str, template: &str, message: &str) {
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_prefix(prefix);
    spinner.finish_with_message(message.to_string());
}

/// Finish a spinner with a success message
pub fn finish_spinner_success(spinner: &ProgressBar, message: &str) {
    finish_with(spinner, "✓", "{prefix:.green} {msg}", message);
}

/// Finish a spinner with an error message
pub fn finish_spinner_error(spinner: &ProgressBar, message: &str) {
    finish_with(spinner, "✗", "{prefix:.red} {msg}", message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_spinner() {
        let spinner = create_spinner("Retrieving pages...");
        assert!(!spinner.is_finished());
        assert_eq!(spinner.message(), "Retrieving pages...");
        spinner.finish_and_clear();
        assert!(spinner.is_finished());
    }

    #[test]
    fn test_finish_helpers() {
        let spinner = create_spinner("Working...");
        finish_spinner_success(&spinner, "Done");
        assert!(spinner.is_finished());
        assert_eq!(spinner.message(), "Done");

        let spinner = create_spinner("Working...");
        finish_spinner_error(&spinner, "Failed");
        assert!(spinner.is_finished());
    }
}
