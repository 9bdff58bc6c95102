use url::Url;

use crate::{Bookmark, BookmarkValidationError};

/// URL schemes a bookmark may point to.
pub const ALLOWED_SCHEMES: [&str; 4] = ["http", "https", "chrome", "chrome-extension"];

/// Checks the bookmark invariant: an id, a title, and a non-empty absolute URL with an
/// allowed scheme.
///
/// # Errors
///
/// Returns the first violated rule.
pub fn validate_bookmark(bookmark: &Bookmark) -> Result<(), BookmarkValidationError> {
    if bookmark.id.trim().is_empty() {
        return Err(BookmarkValidationError::MissingId);
    }
    if bookmark.title.is_empty() {
        return Err(BookmarkValidationError::MissingTitle);
    }
    check_url(&bookmark.url).map(|_| ())
}

pub(crate) fn check_url(raw: &str) -> Result<Url, BookmarkValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(BookmarkValidationError::EmptyUrl);
    }
    if trimmed.to_ascii_lowercase().starts_with("javascript:") {
        return Err(BookmarkValidationError::ForbiddenScheme(
            "javascript".to_string(),
        ));
    }
    let parsed = Url::parse(trimmed)
        .map_err(|err| BookmarkValidationError::Unparseable(err.to_string()))?;
    if !ALLOWED_SCHEMES.contains(&parsed.scheme()) {
        return Err(BookmarkValidationError::ForbiddenScheme(
            parsed.scheme().to_string(),
        ));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_url(url: &str) -> Bookmark {
        Bookmark::new("1", "Example", url, "Dev")
    }

    #[test]
    fn accepts_allowed_schemes() {
        for url in [
            "https://github.com",
            "http://localhost:8080/path",
            "chrome://extensions",
            "chrome-extension://abcdef/options.html",
        ] {
            assert_eq!(validate_bookmark(&with_url(url)), Ok(()), "{url}");
        }
    }

    #[test]
    fn rejects_script_blank_and_relative_urls() {
        assert_eq!(
            validate_bookmark(&with_url("javascript:alert(1)")),
            Err(BookmarkValidationError::ForbiddenScheme(
                "javascript".to_string()
            ))
        );
        assert_eq!(
            validate_bookmark(&with_url("   ")),
            Err(BookmarkValidationError::EmptyUrl)
        );
        assert!(matches!(
            validate_bookmark(&with_url("/relative/path")),
            Err(BookmarkValidationError::Unparseable(_))
        ));
        assert_eq!(
            validate_bookmark(&with_url("ftp://files.example.com")),
            Err(BookmarkValidationError::ForbiddenScheme("ftp".to_string()))
        );
    }

    #[test]
    fn rejects_missing_id_and_title() {
        assert_eq!(
            validate_bookmark(&Bookmark::new("", "A", "https://a.example", "F")),
            Err(BookmarkValidationError::MissingId)
        );
        assert_eq!(
            validate_bookmark(&Bookmark::new("1", "", "https://a.example", "F")),
            Err(BookmarkValidationError::MissingTitle)
        );
    }
}
