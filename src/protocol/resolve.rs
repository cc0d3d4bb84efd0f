//! Resolved entity payloads from the `/resolve` endpoint.
//!
//! The endpoint answers with the full public representation of whatever the
//! URL points at. Only the fields the downloader acts on are modeled; serde
//! ignores the rest.
//!
//! # Wire Format
//!
//! Track:
//! ```json
//! {
//!     "kind": "track",
//!     "id": 293,
//!     "title": "Upload your first track",
//!     "user": { "username": "SoundCloud" },
//!     "artwork_url": "https://i1.sndcdn.com/artworks-000000000293-abcdef-large.jpg",
//!     "permalink_url": "https://soundcloud.com/soundcloud/upload-your-first-track",
//!     "media": {
//!         "transcodings": [{
//!             "url": "https://api-v2.soundcloud.com/media/soundcloud:tracks:293/stream/hls",
//!             "preset": "mp3_1_0",
//!             "format": { "protocol": "hls", "mime_type": "audio/mpeg" }
//!         }]
//!     }
//! }
//! ```
//!
//! Set (note the listing stubs past the first page, which only carry an id):
//! ```json
//! {
//!     "kind": "playlist",
//!     "title": "An album",
//!     "user": { "username": "Artist" },
//!     "permalink_url": "https://soundcloud.com/artist/sets/an-album",
//!     "tracks": [
//!         { "id": 1, "permalink_url": "https://soundcloud.com/artist/one", "...": "..." },
//!         { "id": 2, "kind": "track", "policy": "ALLOW" }
//!     ]
//! }
//! ```

use std::fmt;

use serde::Deserialize;
use serde_with::{serde_as, DefaultOnError};
use url::Url;
use veil::Redact;

/// The `kind` value of track payloads; everything else is set-shaped.
pub const KIND_TRACK: &str = "track";

/// Common read surface of resolved tracks and sets.
///
/// This is what the tagger and the display paths program against, so they
/// never care which concrete entity they were handed.
pub trait EntityData {
    fn kind(&self) -> &str;
    fn title(&self) -> &str;
    fn artist(&self) -> &str;
    fn artwork_url(&self) -> Option<&Url>;
    fn permalink_url(&self) -> &Url;

    fn is_track(&self) -> bool {
        self.kind() == KIND_TRACK
    }
}

/// Resolved track payload.
#[serde_as]
#[derive(Clone, Eq, PartialEq, Deserialize, Debug)]
pub struct TrackData {
    pub id: u64,
    pub kind: String,
    pub title: String,
    pub user: User,

    /// Lenient on purpose: a missing or malformed artwork URL must never
    /// fail a resolve, it only costs the cover art.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub artwork_url: Option<Url>,

    pub permalink_url: Url,

    /// Absent on some blocked or preview-only tracks.
    #[serde(default)]
    pub media: Media,
}

/// Uploader of a track or set.
#[derive(Clone, Eq, PartialEq, Deserialize, Debug)]
pub struct User {
    pub username: String,
}

/// Available stream encodings of a track.
#[derive(Clone, Default, Eq, PartialEq, Deserialize, Debug)]
pub struct Media {
    #[serde(default)]
    pub transcodings: Vec<Transcoding>,
}

/// One stream encoding offer.
///
/// The `url` is not a stream yet: it must be dereferenced through the
/// redirect hop with a client id attached.
#[derive(Clone, Eq, PartialEq, Deserialize, Redact)]
pub struct Transcoding {
    /// Redirect endpoint for this encoding (redacted in debug output).
    #[redact]
    pub url: Url,

    /// Encoder preset name, e.g. `mp3_1_0` or `opus_0_0`.
    #[serde(default)]
    pub preset: String,

    pub format: Format,

    #[serde(default)]
    pub quality: String,
}

/// Container format of a transcoding.
#[derive(Clone, Eq, PartialEq, Deserialize, Debug)]
pub struct Format {
    pub protocol: Protocol,

    #[serde(default)]
    pub mime_type: String,
}

/// Delivery protocol of a transcoding.
#[derive(Copy, Clone, Eq, PartialEq, Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Single straight download.
    Progressive,
    /// Segmented playlist delivery.
    Hls,
    /// Anything the API grows later.
    #[serde(other)]
    Other,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Progressive => write!(f, "progressive"),
            Self::Hls => write!(f, "hls"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Resolved set payload.
#[serde_as]
#[derive(Clone, Eq, PartialEq, Deserialize, Debug)]
pub struct SetData {
    pub kind: String,
    pub title: String,
    pub user: User,

    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub artwork_url: Option<Url>,

    pub permalink_url: Url,

    #[serde(default)]
    pub tracks: Vec<SetMember>,
}

/// One entry of a set's track listing, in playback order.
#[derive(Clone, Eq, PartialEq, Deserialize, Debug)]
#[serde(untagged)]
pub enum SetMember {
    /// Fully inlined track summary.
    Full { id: u64, permalink_url: Url },

    /// Listing stub that needs a secondary lookup by id.
    Stub { id: u64 },
}

impl SetMember {
    #[must_use]
    pub fn id(&self) -> u64 {
        match self {
            Self::Full { id, .. } | Self::Stub { id } => *id,
        }
    }
}

impl EntityData for TrackData {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn artist(&self) -> &str {
        &self.user.username
    }

    fn artwork_url(&self) -> Option<&Url> {
        self.artwork_url.as_ref()
    }

    fn permalink_url(&self) -> &Url {
        &self.permalink_url
    }
}

impl EntityData for SetData {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn artist(&self) -> &str {
        &self.user.username
    }

    fn artwork_url(&self) -> Option<&Url> {
        self.artwork_url.as_ref()
    }

    fn permalink_url(&self) -> &Url {
        &self.permalink_url
    }
}
