//! Shared styling utilities for CLI output.

use console::Style;

/// Create a success-styled string (green with checkmark).
pub fn success(msg: &str) -> String {
    let style = Style::new().green();
    format!("{} {}", style.apply_to("✓"), msg)
}

/// Create a warning-styled string (yellow).
pub fn warn(msg: &str) -> String {
    let style = Style::new().yellow();
    format!("{} {}", style.apply_to("⚠"), msg)
}

/// Create a header-styled string (bold).
pub fn header(msg: &str) -> String {
    Style::new().bold().apply_to(msg).to_string()
}

/// Create a dim-styled string.
pub fn dim(msg: &str) -> String {
    Style::new().dim().apply_to(msg).to_string()
}

/// Heading for our side of a chunk (green).
pub fn ours(label: Option<&str>) -> String {
    let text = match label {
        Some(label) => format!("Ours ({})", label),
        None => "Ours".to_string(),
    };
    Style::new().green().bold().apply_to(text).to_string()
}

/// Heading for the incoming side of a chunk (blue).
pub fn theirs(label: Option<&str>) -> String {
    let text = match label {
        Some(label) => format!("Theirs ({})", label),
        None => "Theirs".to_string(),
    };
    Style::new().blue().bold().apply_to(text).to_string()
}

/// Heading for the diff3 base section (magenta).
pub fn base() -> String {
    Style::new().magenta().bold().apply_to("Base").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_headings_carry_labels() {
        console::set_colors_enabled(false);
        assert_eq!(ours(Some("HEAD")), "Ours (HEAD)");
        assert_eq!(theirs(None), "Theirs");
        assert_eq!(success("done"), "✓ done");
    }
}
