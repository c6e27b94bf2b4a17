//! Request URL preparation.

use url::Url;

use crate::domain::errors::AvatarLoaderError;

/// Percent-encodes, normalizes and validates a caller supplied URL string.
///
/// Characters that are not allowed in a URL (spaces, non-ASCII letters) are
/// percent-encoded by the parser; existing escapes are preserved. The result
/// is the WHATWG-normalized form, not the input string: the scheme and host
/// are lowercased, an empty path becomes `/`, default ports are dropped and
/// any `#fragment` is kept. Cache keys are built from this form, so inputs
/// differing only in those respects share an entry.
///
/// Only absolute `http` and `https` URLs with a host are accepted.
///
/// # Errors
/// Returns [`AvatarLoaderError::BadUrl`] if the string is not a usable URL.
pub fn prepare_url(raw: &str) -> Result<Url, AvatarLoaderError> {
    let url = Url::parse(raw).map_err(|_| AvatarLoaderError::BadUrl)?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AvatarLoaderError::BadUrl);
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(AvatarLoaderError::BadUrl);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("" ; "empty")]
    #[test_case("not a url" ; "relative_text")]
    #[test_case("ftp://example.com/a.png" ; "unsupported_scheme")]
    #[test_case("http://" ; "missing_host")]
    #[test_case("https://exa mple.com/a.png" ; "space_in_host")]
    fn test_rejects_malformed(raw: &str) {
        assert_eq!(prepare_url(raw), Err(AvatarLoaderError::BadUrl));
    }

    #[test]
    fn test_encodes_non_ascii_path() {
        let url = prepare_url("https://example.com/uploads/Мона-Лиза.jpg").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/uploads/%D0%9C%D0%BE%D0%BD%D0%B0-%D0%9B%D0%B8%D0%B7%D0%B0.jpg"
        );
    }

    #[test]
    fn test_keeps_query_and_existing_escapes() {
        let raw = "https://images.example.com/photo?fit=crop&w=2647&q=80&name=a%20b";
        assert_eq!(prepare_url(raw).unwrap().as_str(), raw);
    }

    #[test_case("HTTPS://Example.COM", "https://example.com/" ; "case_and_empty_path")]
    #[test_case("https://example.com:443/a.png", "https://example.com/a.png" ; "default_port")]
    #[test_case("https://example.com/a.png#top", "https://example.com/a.png#top" ; "fragment_kept")]
    fn test_normalizes(raw: &str, expected: &str) {
        assert_eq!(prepare_url(raw).unwrap().as_str(), expected);
    }
}
