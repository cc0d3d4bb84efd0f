//! SoundCloud v2 API access.
//!
//! The [`Gateway`] owns the HTTP client and the client id, and is the only
//! place that talks to `api-v2.soundcloud.com`. Every call attaches the
//! client id as a query parameter; a 401 anywhere surfaces as
//! [`Error::InvalidClientId`] carrying the rejected credential.

use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use crate::{
    client_id::ClientId,
    config::Config,
    error::{Error, Result},
    http::Client as HttpClient,
    protocol::{self, media, resolve::TrackData},
};

#[derive(Clone)]
pub struct Gateway {
    http_client: HttpClient,
    client_id: ClientId,
}

impl Gateway {
    /// The URL of the SoundCloud v2 API.
    const API_URL: &'static str = "https://api-v2.soundcloud.com";

    /// A public track page that is known to stay up.
    ///
    /// Resolving it is the cheapest way to find out whether a client id is
    /// still accepted, and its page is also a good source to scrape fresh
    /// ids from.
    const PROBE_URL: &'static str = "https://soundcloud.com/soundcloud/upload-your-first-track";

    pub fn new(config: &Config, client_id: ClientId) -> Result<Self> {
        let http_client = HttpClient::new(config)?;

        Ok(Self {
            http_client,
            client_id,
        })
    }

    #[must_use]
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    #[must_use]
    pub fn http_client(&self) -> &HttpClient {
        &self.http_client
    }

    /// The probe page as a typed [`Url`].
    ///
    /// # Panics
    ///
    /// Will panic if the hardcoded URL is invalid.
    #[must_use]
    pub fn probe_url() -> Url {
        Url::parse(Self::PROBE_URL).expect("invalid probe url")
    }

    /// Resolve endpoint URL for `sc_url` with the credential attached.
    fn resolve_url(&self, sc_url: &Url) -> Result<Url> {
        let url = Url::parse_with_params(
            &format!("{}/resolve", Self::API_URL),
            &[
                ("client_id", self.client_id.as_str()),
                ("url", sc_url.as_str()),
            ],
        )?;

        Ok(url)
    }

    /// Performs a GET and parses the JSON response.
    ///
    /// # Errors
    ///
    /// Will return `Err` if:
    /// - the API rejects the client id (HTTP 401)
    /// - the HTTP request fails or reports a non-success status
    /// - the response cannot be parsed as `T`
    async fn request<T>(&self, url: Url) -> Result<T>
    where
        T: std::fmt::Debug + for<'de> Deserialize<'de>,
    {
        let origin = url.path().to_owned();

        let request = self.http_client.get(url, "");
        let response = self.http_client.execute(request).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::InvalidClientId(self.client_id.clone()));
        }
        let response = response.error_for_status()?;

        let body = response.text().await?;
        protocol::json(&body, &origin)
    }

    /// Resolves a SoundCloud page URL into its entity payload.
    ///
    /// The shape of the payload is the caller's claim about what the URL is;
    /// classify first, then pick `T` accordingly.
    pub async fn resolve<T>(&self, sc_url: &Url) -> Result<T>
    where
        T: std::fmt::Debug + for<'de> Deserialize<'de>,
    {
        let url = self.resolve_url(sc_url)?;
        self.request(url).await
    }

    /// Looks up a track by its numeric id.
    ///
    /// Needed for set members past the first listing page, which come as
    /// stubs without a permalink.
    pub async fn track_by_id(&self, track_id: u64) -> Result<TrackData> {
        let url = Url::parse_with_params(
            &format!("{}/tracks/{track_id}", Self::API_URL),
            &[("client_id", self.client_id.as_str())],
        )?;

        self.request(url).await
    }

    /// Dereferences a transcoding URL into the final stream location.
    ///
    /// This second hop is mandatory: the transcoding URL itself does not
    /// serve audio, it answers with a one-field JSON payload pointing at it.
    pub async fn stream_source(&self, transcoding_url: &Url) -> Result<Url> {
        let mut url = transcoding_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", self.client_id.as_str());

        let source: media::Source = self.request(url).await.map_err(|e| match e {
            Error::HttpClient(source) => Error::Transport {
                url: transcoding_url.clone(),
                source,
            },
            other => other,
        })?;

        Ok(source.url)
    }

    /// Checks whether the client id is still accepted by the API.
    ///
    /// Probes the resolve endpoint with [`Gateway::probe_url`]. Returns
    /// `Ok(false)` if and only if the API answers 401; any other failure is
    /// an error, never coerced to `false`. No retries.
    pub async fn verify(&self) -> Result<bool> {
        self.verify_against(&Self::probe_url()).await
    }

    /// [`verify`](Self::verify) against a caller-chosen probe page.
    pub async fn verify_against(&self, probe_url: &Url) -> Result<bool> {
        let url = self.resolve_url(probe_url)?;

        let request = self.http_client.get(url, "");
        let response = self.http_client.execute(request).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("client id {:?} rejected", self.client_id);
            return Ok(false);
        }
        let response = response.error_for_status()?;

        Self::accepted(response.status())
    }

    /// Maps a non-401 probe status to a verdict.
    ///
    /// Only a success status counts as acceptance. Anything else, 1xx and
    /// 3xx included, is an error rather than a `false`.
    fn accepted(status: StatusCode) -> Result<bool> {
        if status.is_success() {
            Ok(true)
        } else {
            Err(Error::Assertion(format!(
                "unexpected status {status} from the verify probe"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> Gateway {
        let client_id = "aAbBcC123456".parse().unwrap();
        Gateway::new(&Config::new(), client_id).unwrap()
    }

    #[test]
    fn probe_url_is_valid() {
        assert_eq!(Gateway::probe_url().as_str(), Gateway::PROBE_URL);
    }

    #[test]
    fn only_success_statuses_count_as_accepted() {
        assert!(Gateway::accepted(StatusCode::OK).unwrap());
        assert!(Gateway::accepted(StatusCode::CONTINUE).is_err());
        assert!(Gateway::accepted(StatusCode::FOUND).is_err());
    }

    #[test]
    fn resolve_urls_carry_credential_and_target() {
        let sc_url = Url::parse("https://soundcloud.com/artist/title?in=artist/sets/a").unwrap();
        let url = gateway().resolve_url(&sc_url).unwrap();

        assert!(url.as_str().starts_with(
            "https://api-v2.soundcloud.com/resolve?client_id=aAbBcC123456&url="
        ));
        // The target URL must survive encoding, query string included.
        assert_eq!(
            url.query_pairs().find(|(key, _)| key == "url").unwrap().1,
            sc_url.as_str()
        );
    }
}
