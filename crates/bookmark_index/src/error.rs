use thiserror::Error;

/// Reason a bookmark was refused during import.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookmarkValidationError {
    /// The entry has no identifier.
    #[error("bookmark has no id")]
    MissingId,
    /// The entry has no title.
    #[error("bookmark has no title")]
    MissingTitle,
    /// The address is blank.
    #[error("bookmark url is empty")]
    EmptyUrl,
    /// The address uses a scheme outside the allow-list.
    #[error("bookmark url scheme `{0}` is not allowed")]
    ForbiddenScheme(String),
    /// The address does not parse as an absolute URL.
    #[error("bookmark url is not a valid absolute url: {0}")]
    Unparseable(String),
}

/// Failure to read the bookmark tree from the host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// The host denied access to bookmarks.
    #[error("bookmark access denied: {0}")]
    PermissionDenied(String),
    /// The host did not answer in time.
    #[error("bookmark import timed out: {0}")]
    Timeout(String),
    /// A network-level failure occurred.
    #[error("network error during bookmark import: {0}")]
    Network(String),
    /// The bookmarks API does not exist in this context.
    #[error("bookmarks API unavailable: {0}")]
    Unavailable(String),
    /// Any other failure.
    #[error("bookmark import failed: {0}")]
    Other(String),
}

impl ImportError {
    /// Classifies a raw host error message.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("permission") || lower.contains("denied") {
            Self::PermissionDenied(message)
        } else if lower.contains("timeout") || lower.contains("timed out") {
            Self::Timeout(message)
        } else if lower.contains("network") || lower.contains("fetch") {
            Self::Network(message)
        } else if lower.contains("not available")
            || lower.contains("undefined")
            || lower.contains("not supported")
        {
            Self::Unavailable(message)
        } else {
            Self::Other(message)
        }
    }

    /// Short notice shown to the user while defaults are used instead.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied(_) => {
                "Bookmark access was denied. Showing default bookmarks."
            }
            Self::Timeout(_) => "Loading bookmarks took too long. Showing default bookmarks.",
            Self::Network(_) => "A network error interrupted bookmark loading.",
            Self::Unavailable(_) | Self::Other(_) => {
                "Bookmarks could not be loaded. Showing default bookmarks."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_maps_host_messages() {
        assert!(matches!(
            ImportError::classify("Permission denied by policy"),
            ImportError::PermissionDenied(_)
        ));
        assert!(matches!(
            ImportError::classify("request timeout"),
            ImportError::Timeout(_)
        ));
        assert!(matches!(
            ImportError::classify("Network changed"),
            ImportError::Network(_)
        ));
        assert!(matches!(
            ImportError::classify("chrome.bookmarks is undefined"),
            ImportError::Unavailable(_)
        ));
        assert!(matches!(
            ImportError::classify("boom"),
            ImportError::Other(_)
        ));
    }
}
