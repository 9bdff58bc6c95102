//! Safety checks for user-supplied CSS background values.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

const ALLOWED_PREFIXES: [&str; 8] = [
    "linear-gradient(",
    "radial-gradient(",
    "rgb(",
    "rgba(",
    "hsl(",
    "hsla(",
    "url(",
    "data:image/",
];

const BLOCKED_FRAGMENTS: [&str; 3] = ["javascript:", "expression(", "<script"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackgroundError {
    #[error("background is empty")]
    Empty,
    #[error("background contains blocked content `{0}`")]
    Blocked(String),
    #[error("background format is not supported")]
    Unsupported,
}

fn hex_color() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^#[0-9a-fA-F]{3,6}$").expect("hex color pattern"))
}

fn inline_handler() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"on\w+=").expect("inline handler pattern"))
}

/// Accepts gradients, hex/rgb/hsl colors, `url(...)` images, and `data:image/` URIs.
///
/// Blocked content is checked before the allow-list, so an allowed prefix never
/// smuggles a script through.
pub fn validate_background(value: &str) -> Result<(), BackgroundError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BackgroundError::Empty);
    }
    let lower = trimmed.to_lowercase();

    if let Some(fragment) = BLOCKED_FRAGMENTS.iter().find(|f| lower.contains(*f)) {
        return Err(BackgroundError::Blocked((*fragment).to_string()));
    }
    if let Some(found) = inline_handler().find(&lower) {
        return Err(BackgroundError::Blocked(found.as_str().to_string()));
    }
    if has_non_image_data_uri(&lower) {
        return Err(BackgroundError::Blocked("data:".to_string()));
    }

    if ALLOWED_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
        || hex_color().is_match(trimmed)
    {
        return Ok(());
    }
    Err(BackgroundError::Unsupported)
}

pub fn is_valid_background(value: &str) -> bool {
    validate_background(value).is_ok()
}

fn has_non_image_data_uri(lower: &str) -> bool {
    lower
        .match_indices("data:")
        .any(|(idx, m)| !lower[idx + m.len()..].starts_with("image/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_gradients_colors_and_images() {
        for value in [
            "linear-gradient(135deg,#000,#fff)",
            "radial-gradient(circle, red, blue)",
            "#fff",
            "#A1B2C3",
            "rgba(0, 0, 0, 0.5)",
            "hsl(120, 50%, 50%)",
            "url(https://example.com/bg.png)",
            "url(\"data:image/png;base64,AAAA\")",
            "data:image/jpeg;base64,AAAA",
        ] {
            assert_eq!(validate_background(value), Ok(()), "{value}");
        }
    }

    #[test]
    fn rejects_script_vectors() {
        assert_eq!(
            validate_background("javascript:alert(1)"),
            Err(BackgroundError::Blocked("javascript:".to_string()))
        );
        assert!(matches!(
            validate_background("url(x) onerror=alert(1)"),
            Err(BackgroundError::Blocked(_))
        ));
        assert!(matches!(
            validate_background("url(data:text/html,<b>hi</b>)"),
            Err(BackgroundError::Blocked(_))
        ));
        assert!(matches!(
            validate_background("expression(alert(1))"),
            Err(BackgroundError::Blocked(_))
        ));
    }

    #[test]
    fn rejects_unknown_formats_and_blank_values() {
        assert_eq!(validate_background("  "), Err(BackgroundError::Empty));
        assert_eq!(
            validate_background("red"),
            Err(BackgroundError::Unsupported)
        );
        assert_eq!(
            validate_background("#12345678"),
            Err(BackgroundError::Unsupported)
        );
    }
}
