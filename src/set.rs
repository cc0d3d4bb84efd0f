//! Set handle: resolve a playlist or album and expand it into tracks.

use std::fmt;

use url::Url;

use crate::{
    entity::{Entity, Kind},
    error::{Error, Result},
    gateway::Gateway,
    protocol::resolve::{EntityData, SetData, SetMember},
    track::Track,
};

/// A SoundCloud set (album or playlist), resolved lazily on first use.
#[derive(Debug)]
pub struct Set {
    entity: Entity<SetData>,
}

impl Set {
    /// Creates a handle for the set at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WrongEntityKind`] if `url` points to a single track.
    pub fn new(gateway: &Gateway, url: Url) -> Result<Self> {
        match Kind::of_url(&url) {
            Kind::Set => Ok(Self {
                entity: Entity::new(gateway.clone(), url),
            }),
            actual => Err(Error::WrongEntityKind {
                url,
                expected: Kind::Set,
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

    /// Resolves the set, memoizing the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WrongEntityKind`] if the API reports a track behind a
    /// set-shaped URL, or any resolution error from the gateway.
    pub async fn resolved(&mut self) -> Result<&SetData> {
        let url = self.entity.url().clone();
        let data = self.entity.get().await?;
        if data.is_track() {
            return Err(Error::WrongEntityKind {
                url,
                expected: Kind::Set,
                actual: Kind::Track,
            });
        }
        Ok(data)
    }

    /// Expands the set into its member track URLs, in listing order.
    ///
    /// Fully inlined members carry their permalink directly. Listing stubs
    /// need a secondary lookup by track id, performed one at a time so the
    /// output order matches the listing order.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution or any stub lookup fails.
    pub async fn expand(&mut self) -> Result<Vec<Url>> {
        let members = self.resolved().await?.tracks.clone();
        let gateway = self.entity.gateway().clone();

        let mut urls = Vec::with_capacity(members.len());
        for member in members {
            match member {
                SetMember::Full { permalink_url, .. } => urls.push(permalink_url),
                SetMember::Stub { id } => {
                    debug!("looking up listing stub {id}");
                    urls.push(gateway.track_by_id(id).await?.permalink_url);
                }
            }
        }

        Ok(urls)
    }

    /// Builds a [`Track`] handle for every member of the set, in listing
    /// order.
    ///
    /// # Errors
    ///
    /// Returns an error if expansion fails or a member URL turns out not to
    /// be a track URL.
    pub async fn tracks(&mut self) -> Result<Vec<Track>> {
        let gateway = self.entity.gateway().clone();
        self.expand()
            .await?
            .into_iter()
            .map(|url| Track::new(&gateway, url))
            .collect()
    }
}

impl fmt::Display for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.entity.cached() {
            Some(data) => write!(f, "{} ({} tracks)", data.title, data.tracks.len()),
            None => write!(f, "{}", self.entity.url()),
        }
    }
}
