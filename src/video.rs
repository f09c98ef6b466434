use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

static LINK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([^#&?]{11})")
        .expect("valid link pattern")
});

static BARE_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9_-]{11})$").expect("valid id pattern"));

/// An 11-character YouTube video identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pull a video id out of a watch/short/embed link or a bare id.
/// Anything else yields `None`.
pub fn resolve_video_id(reference: &str) -> Option<VideoId> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    LINK_PATTERN
        .captures(reference)
        .or_else(|| BARE_ID_PATTERN.captures(reference))
        .and_then(|caps| caps.get(1))
        .map(|m| VideoId(m.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "dQw4w9WgXcQ";

    fn resolved(reference: &str) -> Option<String> {
        resolve_video_id(reference).map(|id| id.as_str().to_string())
    }

    #[test]
    fn short_link() {
        assert_eq!(resolved("https://youtu.be/dQw4w9WgXcQ").as_deref(), Some(ID));
    }

    #[test]
    fn watch_link_with_extra_params() {
        assert_eq!(
            resolved("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=5").as_deref(),
            Some(ID)
        );
    }

    #[test]
    fn embed_link() {
        assert_eq!(
            resolved("https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1").as_deref(),
            Some(ID)
        );
    }

    #[test]
    fn bare_id_with_whitespace() {
        assert_eq!(resolved("  dQw4w9WgXcQ \n").as_deref(), Some(ID));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(resolved("not a url"), None);
        assert_eq!(resolved(""), None);
        assert_eq!(resolved("   "), None);
        assert_eq!(resolved("https://youtu.be/short"), None);
        assert_eq!(resolved("dQw4w9WgXcQx"), None);
        assert_eq!(resolved("https://example.com/watch?v=dQw4w9WgXcQ"), None);
    }

    #[test]
    fn watch_url_roundtrip() {
        let id = resolve_video_id(ID).unwrap();
        assert_eq!(id.watch_url(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(id.to_string(), ID);
    }
}
