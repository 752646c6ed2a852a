use std::fmt;

use url::Url;

/// A normalized absolute URL identifying one document.
///
/// Values only come out of [`normalize`], so holding a `Link` means the URL
/// has a scheme, a host, and no fragment. Comparison and storage always see
/// the normalized string; two raw hrefs that normalize to different strings
/// are different links.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Link(String);

impl Link {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for Link {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize one raw href into an absolute [`Link`].
///
/// Relative references resolve against `base`. Fragments are dropped before
/// comparison. Returns `None` for empty hrefs, fragment/query-only hrefs,
/// `javascript:` pseudo-links and anything that is not http(s) after
/// resolution.
pub fn normalize(raw: &str, base: Option<&Url>) -> Option<Link> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with('?') || lower.starts_with("javascript:") {
        return None;
    }
    let mut url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(_) => base?.join(trimmed).ok()?,
    };
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.host_str()?;
    url.set_fragment(None);
    Some(Link(url.into()))
}
