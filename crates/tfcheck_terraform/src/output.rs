//! Success markers and output normalization.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

/// Printed by `terraform init` once the working directory is ready.
pub const INIT_SUCCESS_MARKER: &str = "Terraform has been successfully initialized";

/// Printed by `terraform validate` for a valid configuration.
pub const VALIDATE_SUCCESS_MARKER: &str = "Success! The configuration is valid";

fn ansi_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("ANSI escape pattern is valid")
    })
}

/// Remove ANSI escape sequences.
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    ansi_pattern().replace_all(text, "")
}

/// Whether `output` contains `marker`, ignoring any color codes.
pub fn contains_marker(output: &str, marker: &str) -> bool {
    strip_ansi(output).contains(marker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi() {
        let colored = "\x1b[0m\x1b[1m\x1b[32mTerraform has been successfully initialized!\x1b[0m";
        assert_eq!(strip_ansi(colored), "Terraform has been successfully initialized!");
        assert!(matches!(strip_ansi("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_contains_marker_plain_and_colored() {
        let plain = "\nInitializing the backend...\n\nTerraform has been successfully initialized!\n";
        assert!(contains_marker(plain, INIT_SUCCESS_MARKER));

        let colored = "\x1b[32m\x1b[1mSuccess!\x1b[0m The configuration is valid.\n";
        assert!(contains_marker(colored, VALIDATE_SUCCESS_MARKER));

        assert!(!contains_marker("Error: Unsupported block type", VALIDATE_SUCCESS_MARKER));
    }
}
