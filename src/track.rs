//! Track handle: resolve, pick a transport, download, tag.

use std::fmt;

use url::Url;

use crate::{
    download::{self, DownloadOptions, DownloadedTrack},
    entity::{Entity, Kind},
    error::{Error, Result},
    gateway::Gateway,
    protocol::resolve::{EntityData, Protocol, TrackData, Transcoding},
    tag,
};

/// A single SoundCloud track, resolved lazily on first use.
#[derive(Debug)]
pub struct Track {
    entity: Entity<TrackData>,
}

impl Track {
    /// File extension of the downloaded audio.
    const FILE_EXTENSION: &'static str = "mp3";

    /// Creates a handle for the track at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WrongEntityKind`] if `url` points to a set.
    pub fn new(gateway: &Gateway, url: Url) -> Result<Self> {
        match Kind::of_url(&url) {
            Kind::Track => Ok(Self {
                entity: Entity::new(gateway.clone(), url),
            }),
            actual => Err(Error::WrongEntityKind {
                url,
                expected: Kind::Track,
                actual,
            }),
        }
    }

    /// The URL this handle was created for.
    #[must_use]
    pub fn url(&self) -> &Url {
        self.entity.url()
    }

    /// Drops the memoized resolution, forcing the next call to hit the API.
    pub fn invalidate(&mut self) {
        self.entity.invalidate();
    }

    /// Resolves the track, memoizing the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WrongEntityKind`] if the API reports a set behind a
    /// track-shaped URL, or any resolution error from the gateway.
    pub async fn resolved(&mut self) -> Result<&TrackData> {
        let url = self.entity.url().clone();
        let data = self.entity.get().await?;
        if !data.is_track() {
            return Err(Error::WrongEntityKind {
                url,
                expected: Kind::Track,
                actual: Kind::Set,
            });
        }
        Ok(data)
    }

    /// Resolves the final stream URL for this track.
    ///
    /// Prefers a progressive transcoding and falls back to any MP3 preset.
    /// The transcoding URL is dereferenced through the API to obtain the
    /// actual CDN location.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoStreamableMedia`] if the track offers neither a
    /// progressive transcoding nor an MP3 preset.
    pub async fn stream_url(&mut self) -> Result<Url> {
        let plan = TransportPlan::from_transcodings(&self.resolved().await?.media.transcodings);
        match plan.preferred() {
            Some(candidate) => self.entity.gateway().stream_source(candidate).await,
            None => Err(Error::NoStreamableMedia(self.entity.url().clone())),
        }
    }

    /// Downloads the track and returns the tagged audio in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution, the media transfer, or tagging fails.
    /// A failed transfer aborts the whole download; no partial audio is
    /// returned.
    pub async fn download(&mut self, options: &DownloadOptions) -> Result<DownloadedTrack> {
        let stream_url = self.stream_url().await?;
        info!("downloading {self}");

        let http_client = self.entity.gateway().http_client().clone();
        let target = download::resolve_target(&http_client, stream_url).await?;
        let audio = download::assemble(&http_client, &target).await?;

        let data = self.resolved().await?;
        let audio = if options.metadata {
            tag::apply(&http_client, audio, data).await?
        } else {
            audio
        };

        Ok(DownloadedTrack::new(audio, Self::filename(data)))
    }

    /// Output filename: the trailing segment of the permalink URL plus the
    /// audio extension.
    fn filename(data: &TrackData) -> String {
        let slug = data
            .permalink_url
            .path_segments()
            .and_then(Iterator::last)
            .unwrap_or_default();
        format!("{slug}.{}", Self::FILE_EXTENSION)
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.entity.cached() {
            Some(data) => write!(f, "{} - {}", data.artist(), data.title()),
            None => write!(f, "{}", self.entity.url()),
        }
    }
}

/// Outcome of scanning a track's transcodings for something downloadable.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TransportPlan {
    progressive: Option<Url>,
    fallback: Option<Url>,
}

impl TransportPlan {
    /// Preset marker that qualifies a non-progressive transcoding as a
    /// fallback.
    const FALLBACK_PRESET_MARKER: &'static str = "mp3";

    /// Scans `transcodings` once, in order.
    ///
    /// The last progressive entry wins unconditionally. Independently, the
    /// last entry whose preset mentions MP3 becomes the fallback.
    #[must_use]
    pub fn from_transcodings(transcodings: &[Transcoding]) -> Self {
        let mut plan = Self::default();
        for transcoding in transcodings {
            if transcoding.format.protocol == Protocol::Progressive {
                plan.progressive = Some(transcoding.url.clone());
            }
            if transcoding.preset.contains(Self::FALLBACK_PRESET_MARKER) {
                plan.fallback = Some(transcoding.url.clone());
            }
        }
        plan
    }

    /// The transcoding URL to use, if any.
    #[must_use]
    pub fn preferred(&self) -> Option<&Url> {
        self.progressive.as_ref().or(self.fallback.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{client_id::ClientId, config::Config, protocol::resolve};

    fn gateway() -> Gateway {
        let client_id = "a1b2c3d4e5f6".parse::<ClientId>().unwrap();
        Gateway::new(&Config::new(), client_id).unwrap()
    }

    fn url(s: &str) -> Url {
        s.parse().unwrap()
    }

    fn transcoding(target: &str, protocol: Protocol, preset: &str) -> Transcoding {
        Transcoding {
            url: url(target),
            preset: preset.to_owned(),
            format: resolve::Format {
                protocol,
                mime_type: String::new(),
            },
            quality: "sq".to_owned(),
        }
    }

    fn track_data(kind: &str, permalink: &str) -> TrackData {
        serde_json::from_str(&format!(
            r#"{{
                "id": 42,
                "kind": "{kind}",
                "title": "Cool Song",
                "user": {{ "username": "Some Artist" }},
                "permalink_url": "{permalink}",
                "media": {{ "transcodings": [] }}
            }}"#
        ))
        .unwrap()
    }

    #[test]
    fn rejects_set_urls_at_construction() {
        let result = Track::new(&gateway(), url("https://soundcloud.com/artist/sets/album"));
        assert!(matches!(
            result,
            Err(Error::WrongEntityKind {
                expected: Kind::Track,
                actual: Kind::Set,
                ..
            })
        ));
    }

    #[test]
    fn accepts_track_urls_reached_through_a_set() {
        let result = Track::new(
            &gateway(),
            url("https://soundcloud.com/artist/song?in=artist/sets/album"),
        );
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn resolved_rejects_set_shaped_payloads() {
        let mut track = Track::new(&gateway(), url("https://soundcloud.com/artist/song")).unwrap();
        track.entity.prime(track_data(
            "playlist",
            "https://soundcloud.com/artist/sets/album",
        ));

        assert!(matches!(
            track.resolved().await,
            Err(Error::WrongEntityKind {
                expected: Kind::Track,
                actual: Kind::Set,
                ..
            })
        ));
    }

    #[test]
    fn progressive_wins_over_the_fallback() {
        let plan = TransportPlan::from_transcodings(&[
            transcoding("https://api.example.com/stream/hls", Protocol::Hls, "mp3_1_0"),
            transcoding(
                "https://api.example.com/stream/progressive",
                Protocol::Progressive,
                "mp3_1_0",
            ),
        ]);
        assert_eq!(
            plan.preferred(),
            Some(&url("https://api.example.com/stream/progressive"))
        );
    }

    #[test]
    fn last_progressive_entry_wins() {
        let plan = TransportPlan::from_transcodings(&[
            transcoding(
                "https://api.example.com/stream/first",
                Protocol::Progressive,
                "mp3_0_0",
            ),
            transcoding(
                "https://api.example.com/stream/second",
                Protocol::Progressive,
                "mp3_1_0",
            ),
        ]);
        assert_eq!(
            plan.preferred(),
            Some(&url("https://api.example.com/stream/second"))
        );
    }

    #[test]
    fn falls_back_to_the_last_mp3_preset() {
        let plan = TransportPlan::from_transcodings(&[
            transcoding("https://api.example.com/stream/aac", Protocol::Hls, "aac_1_0"),
            transcoding("https://api.example.com/stream/one", Protocol::Hls, "mp3_0_0"),
            transcoding("https://api.example.com/stream/two", Protocol::Hls, "mp3_1_0"),
        ]);
        assert_eq!(
            plan.preferred(),
            Some(&url("https://api.example.com/stream/two"))
        );
    }

    #[test]
    fn yields_nothing_without_progressive_or_mp3() {
        let plan = TransportPlan::from_transcodings(&[transcoding(
            "https://api.example.com/stream/aac",
            Protocol::Hls,
            "aac_1_0",
        )]);
        assert_eq!(plan.preferred(), None);

        let empty = TransportPlan::from_transcodings(&[]);
        assert_eq!(empty.preferred(), None);
    }

    #[tokio::test]
    async fn stream_url_fails_without_streamable_media() {
        let mut track = Track::new(&gateway(), url("https://soundcloud.com/artist/song")).unwrap();
        track
            .entity
            .prime(track_data("track", "https://soundcloud.com/artist/song"));

        assert!(matches!(
            track.stream_url().await,
            Err(Error::NoStreamableMedia(_))
        ));
    }

    #[test]
    fn filenames_use_the_permalink_slug() {
        let data = track_data("track", "https://soundcloud.com/artist/cool-song");
        assert_eq!(Track::filename(&data), "cool-song.mp3");
    }

    #[test]
    fn displays_the_url_until_resolved() {
        let track = Track::new(&gateway(), url("https://soundcloud.com/artist/song")).unwrap();
        assert_eq!(track.to_string(), "https://soundcloud.com/artist/song");
    }

    #[tokio::test]
    async fn displays_artist_and_title_once_resolved() {
        let mut track = Track::new(&gateway(), url("https://soundcloud.com/artist/song")).unwrap();
        track
            .entity
            .prime(track_data("track", "https://soundcloud.com/artist/cool-song"));

        let _ = track.resolved().await.unwrap();
        assert_eq!(track.to_string(), "Some Artist - Cool Song");
    }
}
