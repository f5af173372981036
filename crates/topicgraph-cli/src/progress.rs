//! Progress feedback for long-running maintenance commands
//!
//! All progress output goes to stderr and is suppressed by `--quiet`.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner with a message
pub fn spinner(message: &str, quiet: bool) -> Option<ProgressBar> {
    if quiet {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(styled("{spinner:.cyan} {msg}").tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Finish a spinner with a success message
pub fn finish_spinner(pb: Option<ProgressBar>, message: &str) {
    finish_with(pb, "{prefix:.green} {msg}", "✓", message);
}

/// Finish a spinner with a warning message
pub fn finish_spinner_warn(pb: Option<ProgressBar>, message: &str) {
    finish_with(pb, "{prefix:.yellow} {msg}", "!", message);
}

/// Finish a spinner with an error message
pub fn finish_spinner_error(pb: Option<ProgressBar>, message: &str) {
    finish_with(pb, "{prefix:.red} {msg}", "✗", message);
}

fn finish_with(pb: Option<ProgressBar>, template: &str, prefix: &'static str, message: &str) {
    if let Some(pb) = pb {
        pb.set_style(styled(template));
        pb.set_prefix(prefix);
        pb.finish_with_message(message.to_string());
    }
}

// Templates are constants; a bad one degrades to the plain spinner.
fn styled(template: &str) -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_quiet_returns_none() {
        let pb = spinner("test", true);
        assert!(pb.is_none());
    }

    #[test]
    fn test_spinner_not_quiet_returns_some() {
        let pb = spinner("test", false);
        assert!(pb.is_some());
        if let Some(pb) = pb {
            pb.finish();
        }
    }

    #[test]
    fn test_finish_spinner_handles_none() {
        // Should not panic
        finish_spinner(None, "done");
        finish_spinner_warn(None, "warning");
        finish_spinner_error(None, "error");
    }

    #[test]
    fn test_finish_spinner_sets_message() {
        let pb = ProgressBar::hidden();
        finish_spinner(Some(pb.clone()), "done");
        assert!(pb.is_finished());
        assert_eq!(pb.message(), "done");
    }
}
