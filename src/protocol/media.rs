//! Stream source payload and delivery classification.
//!
//! Dereferencing a transcoding URL through the redirect hop answers with a
//! one-field JSON object pointing at the actual media:
//!
//! ```json
//! {
//!     "url": "https://cf-media.sndcdn.com/abcdef.128.mp3?Policy=..."
//! }
//! ```
//!
//! Whether that final URL is a straight download or an HLS playlist is
//! decided by [`Delivery::of_url`].

use std::fmt;

use serde::Deserialize;
use url::Url;
use veil::Redact;

/// Stream source information.
///
/// Contains the final, signed location of the media content.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Deserialize, Redact, Hash)]
pub struct Source {
    /// Media URL (redacted in debug output).
    #[redact]
    pub url: Url,
}

/// How a final stream URL delivers its audio.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Delivery {
    /// One straight download.
    Progressive,
    /// An M3U8 playlist of segments.
    Hls,
}

impl Delivery {
    /// Marker substring of playlist URLs.
    const PLAYLIST_MARKER: &'static str = "playlist";

    #[must_use]
    pub fn of_url(url: &Url) -> Self {
        if url.as_str().contains(Self::PLAYLIST_MARKER) {
            Self::Hls
        } else {
            Self::Progressive
        }
    }
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Progressive => write!(f, "progressive"),
            Self::Hls => write!(f, "hls"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_source_payload() {
        let source: Source =
            serde_json::from_str(r#"{"url": "https://cf-media.sndcdn.com/abc.128.mp3"}"#).unwrap();
        assert_eq!(source.url.as_str(), "https://cf-media.sndcdn.com/abc.128.mp3");
    }

    #[test]
    fn source_urls_are_redacted_in_debug_output() {
        let source: Source =
            serde_json::from_str(r#"{"url": "https://cf-media.sndcdn.com/abc.128.mp3"}"#).unwrap();
        assert!(!format!("{source:?}").contains("cf-media"));
    }

    #[test]
    fn playlist_urls_classify_as_hls() {
        let url =
            Url::parse("https://cf-hls-media.sndcdn.com/playlist/abc.128.mp3/playlist.m3u8").unwrap();
        assert_eq!(Delivery::of_url(&url), Delivery::Hls);
    }

    #[test]
    fn media_urls_classify_as_progressive() {
        let url = Url::parse("https://cf-media.sndcdn.com/abc.128.mp3?Policy=xyz").unwrap();
        assert_eq!(Delivery::of_url(&url), Delivery::Progressive);
    }
}
