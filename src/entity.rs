//! URL classification and the shared resolve-and-cache capability that
//! [`Track`](crate::track::Track) and [`Set`](crate::set::Set) handles
//! are composed from.

use std::fmt;

use serde::Deserialize;
use url::Url;

use crate::{error::Result, gateway::Gateway};

/// Entity classification of a SoundCloud URL.
///
/// Decided from the URL alone, before anything is fetched: set pages carry
/// `/sets/` in their path, while track pages reached *through* a set carry
/// the set as an `in=` query parameter and still point at a single track.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
    Track,
    Set,
}

impl Kind {
    /// Path marker of set URLs.
    const SET_PATH_MARKER: &'static str = "/sets/";

    /// Query marker of track URLs that name their containing set.
    const SET_CONTEXT_MARKER: &'static str = "in=";

    #[must_use]
    pub fn of_url(url: &Url) -> Self {
        let url = url.as_str();
        if url.contains(Self::SET_PATH_MARKER) && !url.contains(Self::SET_CONTEXT_MARKER) {
            Self::Set
        } else {
            Self::Track
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Track => write!(f, "track"),
            Self::Set => write!(f, "set"),
        }
    }
}

/// One remote entity, resolved at most once.
///
/// The resolved payload is owned by the handle and cached on first use;
/// repeated reads never re-request. [`invalidate`](Self::invalidate) is the
/// only recompute boundary.
pub struct Entity<M> {
    gateway: Gateway,
    url: Url,
    data: Option<M>,
}

impl<M> Entity<M> {
    #[must_use]
    pub fn new(gateway: Gateway, url: Url) -> Self {
        Self {
            gateway,
            url,
            data: None,
        }
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// The resolved payload, if it has been fetched already.
    #[must_use]
    pub fn cached(&self) -> Option<&M> {
        self.data.as_ref()
    }

    /// Drops the cached payload so the next read resolves afresh.
    pub fn invalidate(&mut self) {
        self.data = None;
    }

    #[cfg(test)]
    pub(crate) fn prime(&mut self, data: M) {
        self.data = Some(data);
    }
}

impl<M> fmt::Debug for Entity<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("url", &self.url)
            .field("resolved", &self.data.is_some())
            .finish_non_exhaustive()
    }
}

impl<M> Entity<M>
where
    M: fmt::Debug + for<'de> Deserialize<'de>,
{
    /// The resolved payload, fetching it on first use.
    pub async fn get(&mut self) -> Result<&M> {
        let data = match self.data.take() {
            Some(data) => data,
            None => self.gateway.resolve(&self.url).await?,
        };

        Ok(self.data.insert(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{client_id::ClientId, config::Config};

    fn gateway() -> Gateway {
        let client_id = "a1b2c3d4e5f6".parse::<ClientId>().unwrap();
        Gateway::new(&Config::new(), client_id).unwrap()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn set_urls_classify_as_set() {
        assert_eq!(
            Kind::of_url(&url("https://soundcloud.com/artist/sets/album")),
            Kind::Set
        );
    }

    #[test]
    fn plain_track_urls_classify_as_track() {
        assert_eq!(
            Kind::of_url(&url("https://soundcloud.com/artist/title")),
            Kind::Track
        );
    }

    #[test]
    fn track_urls_with_set_context_classify_as_track() {
        // Opening a track from a set page keeps the set in the query string.
        assert_eq!(
            Kind::of_url(&url(
                "https://soundcloud.com/artist/title?in=artist/sets/album"
            )),
            Kind::Track
        );
    }

    #[test]
    fn set_urls_with_set_context_classify_as_track() {
        assert_eq!(
            Kind::of_url(&url(
                "https://soundcloud.com/artist/sets/album?in=artist/sets/other"
            )),
            Kind::Track
        );
    }

    #[test]
    fn kinds_display_as_lowercase_nouns() {
        assert_eq!(Kind::Track.to_string(), "track");
        assert_eq!(Kind::Set.to_string(), "set");
    }

    #[test]
    fn invalidate_drops_the_cached_payload() {
        let mut entity: Entity<u32> =
            Entity::new(gateway(), url("https://soundcloud.com/artist/title"));
        assert!(entity.cached().is_none());

        entity.prime(42);
        assert_eq!(entity.cached(), Some(&42));

        entity.invalidate();
        assert!(entity.cached().is_none());
    }
}
