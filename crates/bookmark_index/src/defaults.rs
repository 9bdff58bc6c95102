use crate::Bookmark;

const DEFAULTS: [(&str, &str, &str, &str); 10] = [
    ("1", "Google", "https://www.google.com", "Favorites"),
    ("2", "YouTube", "https://www.youtube.com", "Favorites"),
    ("3", "GitHub", "https://github.com", "Development"),
    ("4", "Stack Overflow", "https://stackoverflow.com", "Development"),
    ("5", "MDN Web Docs", "https://developer.mozilla.org", "Development"),
    ("6", "Wikipedia", "https://www.wikipedia.org", "Reference"),
    ("7", "Amazon", "https://www.amazon.com", "Shopping"),
    ("8", "Netflix", "https://www.netflix.com", "Entertainment"),
    ("9", "Facebook", "https://www.facebook.com", "Social"),
    ("10", "Twitter", "https://www.twitter.com", "Social"),
];

/// Built-in bookmark set used when the host tree is unavailable or empty.
pub fn default_bookmarks() -> Vec<Bookmark> {
    DEFAULTS
        .iter()
        .map(|(id, title, url, folder)| Bookmark::new(*id, *title, *url, *folder))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate_bookmark;

    #[test]
    fn defaults_are_valid_and_non_empty() {
        let defaults = default_bookmarks();
        assert_eq!(defaults.len(), 10);
        assert!(defaults.iter().all(|b| validate_bookmark(b).is_ok()));
    }
}
