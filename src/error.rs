//! Error handling for downpour.
//!
//! One crate-wide error enum: the first five variants carry the domain
//! outcomes callers are expected to branch on, the rest are conversions
//! from the underlying libraries.

use thiserror::Error;
use url::Url;

use crate::{client_id::ClientId, entity::Kind};

#[derive(Error, Debug)]
pub enum Error {
    /// The API rejected the client id with HTTP 401.
    ///
    /// Carries the rejected credential; recover by scraping a fresh one.
    #[error("invalid client id: {0}")]
    InvalidClientId(ClientId),

    /// A URL was handed to the wrong handle constructor, or resolved to the
    /// other entity kind. Recover by re-dispatching to the other handle.
    #[error("{url} is a {actual}, not a {expected}")]
    WrongEntityKind {
        url: Url,
        expected: Kind,
        actual: Kind,
    },

    /// The track offers neither a progressive nor an mp3 transcoding.
    #[error("no progressive or mp3 transcoding available for {0}")]
    NoStreamableMedia(Url),

    /// Network failure while dereferencing or fetching stream media.
    #[error("stream fetch failed for {url}: {source}")]
    Transport { url: Url, source: reqwest::Error },

    /// Cover art could not be fetched; swallowed by the tagger.
    #[error("cover art unavailable: {0}")]
    ArtworkUnavailable(String),

    #[error("assertion failed: {0}")]
    Assertion(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("parsing JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("parsing URL failed: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tagging error: {0}")]
    Tag(#[from] lofty::error::LoftyError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_entity_kind_names_both_kinds() {
        let error = Error::WrongEntityKind {
            url: Url::parse("https://soundcloud.com/artist/sets/album").unwrap(),
            expected: Kind::Track,
            actual: Kind::Set,
        };
        assert_eq!(
            error.to_string(),
            "https://soundcloud.com/artist/sets/album is a set, not a track"
        );
    }

    #[test]
    fn no_streamable_media_names_the_track() {
        let error =
            Error::NoStreamableMedia(Url::parse("https://soundcloud.com/artist/title").unwrap());
        assert_eq!(
            error.to_string(),
            "no progressive or mp3 transcoding available for https://soundcloud.com/artist/title"
        );
    }

    #[test]
    fn invalid_client_id_shows_the_credential() {
        let error = Error::InvalidClientId("a1B2c3D4".parse().unwrap());
        assert_eq!(error.to_string(), "invalid client id: a1B2c3D4");
    }
}
