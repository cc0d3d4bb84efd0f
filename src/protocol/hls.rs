//! Minimal M3U8 media playlist handling.
//!
//! SoundCloud's HLS playlists are flat media playlists with one absolute
//! segment URL per line between the `#EXTINF` tags. Nothing more of the
//! format is needed here.

use url::Url;

/// Extracts segment URLs from a media playlist body.
///
/// Segment order is playback order, so the result preserves file order
/// exactly. Tag lines (`#`), blank lines and anything that is not an
/// absolute URL are skipped.
#[must_use]
pub fn segment_urls(playlist: &str) -> Vec<Url> {
    playlist
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| Url::parse(line).ok())
        .collect()
}
