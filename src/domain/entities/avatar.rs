//! Domain types for avatar loading.

/// Cache key for a downloaded avatar.
/// Holds the percent-encoded form of the requested URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AvatarKey(String);

impl AvatarKey {
    /// Creates a new `AvatarKey` from any string-like input.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Creates an `AvatarKey` from an already validated URL, using its
    /// normalized serialization rather than the caller's original string.
    #[must_use]
    pub fn from_url(url: &url::Url) -> Self {
        Self(url.as_str().to_string())
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AvatarKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AvatarKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AvatarKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Status of the avatar shown on screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AvatarStatus {
    /// Nothing requested yet; the placeholder is shown.
    #[default]
    Idle,
    /// A download is running.
    Downloading {
        /// Fraction of the body received, in `0.0..=1.0`.
        progress: f32,
    },
    /// The avatar is displayed.
    Ready,
    /// The last request failed.
    Failed(String),
}

impl AvatarStatus {
    /// Returns true if a download is running.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Downloading { .. })
    }
}

impl std::fmt::Display for AvatarStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Downloading { progress } => write!(f, "downloading {:.0}%", progress * 100.0),
            Self::Ready => write!(f, "ready"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_url_uses_serialized_form() {
        let url = url::Url::parse("https://example.com/a b.png").unwrap();
        let key = AvatarKey::from_url(&url);
        assert_eq!(key.as_str(), "https://example.com/a%20b.png");
    }

    #[test]
    fn test_status_display() {
        assert_eq!(AvatarStatus::Downloading { progress: 0.5 }.to_string(), "downloading 50%");
        assert_eq!(AvatarStatus::Failed("bad data".into()).to_string(), "failed: bad data");
        assert!(AvatarStatus::default().to_string() == "idle");
    }
}
