//! File path helpers

use std::path::PathBuf;

/// Expand a leading `~` to the home directory.
///
/// Relative paths stay relative to the working directory. If the home
/// directory cannot be determined the path is returned unchanged.
///
/// ```text
/// expand_tilde("~/.jogtrack/jogtrack.db") // -> /home/user/.jogtrack/jogtrack.db
/// expand_tilde("data/jogtrack.db")        // -> data/jogtrack.db
/// ```
pub fn expand_tilde(path: &str) -> PathBuf {
    let path = path.trim();

    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }

    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_path_unchanged() {
        assert_eq!(expand_tilde("/var/lib/jogtrack.db"), PathBuf::from("/var/lib/jogtrack.db"));
    }

    #[test]
    fn test_relative_path_unchanged() {
        assert_eq!(expand_tilde("data/jogtrack.db"), PathBuf::from("data/jogtrack.db"));
        assert_eq!(expand_tilde("  jogtrack.db "), PathBuf::from("jogtrack.db"));
    }

    #[test]
    fn test_tilde_expands_to_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~"), home);
            assert_eq!(expand_tilde("~/.jogtrack/x.json"), home.join(".jogtrack/x.json"));
        }
    }

    #[test]
    fn test_tilde_in_middle_not_expanded() {
        assert_eq!(expand_tilde("data/~/x"), PathBuf::from("data/~/x"));
    }
}
