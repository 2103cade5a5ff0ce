//! Terminal styling helpers

use owo_colors::OwoColorize;

/// Semantic styles for CLI output
pub trait Stylize {
    /// Highlighted value (ids, paths)
    fn accent(&self) -> String;
    /// De-emphasized detail
    fn muted(&self) -> String;
    /// Section headers
    fn emphasis(&self) -> String;
    /// Positive outcome
    fn success(&self) -> String;
    /// Negative outcome
    fn failure(&self) -> String;
}

impl<T: AsRef<str>> Stylize for T {
    fn accent(&self) -> String {
        self.as_ref().cyan().to_string()
    }

    fn muted(&self) -> String {
        self.as_ref().dimmed().to_string()
    }

    fn emphasis(&self) -> String {
        self.as_ref().bold().to_string()
    }

    fn success(&self) -> String {
        self.as_ref().green().to_string()
    }

    fn failure(&self) -> String {
        self.as_ref().red().to_string()
    }
}

/// Green check mark
pub fn check() -> String {
    "✓".success()
}

/// Red cross
pub fn cross() -> String {
    "✗".failure()
}
