//! Client id scraping from the public SoundCloud web app.

use regex_lite::Regex;
use url::Url;

use crate::{
    client_id::ClientId,
    error::{Error, Result},
    http,
};

/// Matches a `client_id=` query parameter inside app bundle code.
const CLIENT_ID_PATTERN: &str = r"client_id=([A-Za-z0-9]+)";

/// Matches the `src` attribute of a `<script>` tag.
const SCRIPT_SRC_PATTERN: &str = r#"<script[^>]*\ssrc="([^"]+)""#;

/// Scrapes a usable client id from the web app behind `page_url`.
///
/// Downloads the page, collects its script bundles and scans them for
/// `client_id=` parameters. The longest candidate wins; short matches
/// tend to be truncated template fragments.
///
/// # Errors
///
/// Returns an error if the page cannot be fetched or no candidate is
/// found in any bundle.
pub async fn scrape_client_id(http_client: &http::Client, page_url: &Url) -> Result<ClientId> {
    let page = fetch_text(http_client, page_url.clone()).await?;
    let scripts = script_urls(page_url, &page)?;
    debug!("scanning {} script bundles for a client id", scripts.len());

    let pattern = Regex::new(CLIENT_ID_PATTERN)
        .map_err(|err| Error::Assertion(format!("client id pattern: {err}")))?;

    let mut candidates = Vec::new();
    for script_url in scripts {
        match fetch_text(http_client, script_url.clone()).await {
            Ok(script) => candidates.extend(candidates_in(&pattern, &script)),
            // The id usually appears in several bundles; one failed fetch
            // is not fatal.
            Err(err) => debug!("skipping bundle {script_url}: {err}"),
        }
    }

    let best = candidates
        .into_iter()
        .max_by_key(String::len)
        .ok_or_else(|| Error::Assertion("no client id found in any script bundle".to_owned()))?;
    best.parse()
}

async fn fetch_text(http_client: &http::Client, url: Url) -> Result<String> {
    let request = http_client.get(url, "");
    let response = http_client.execute(request).await?;
    Ok(response.error_for_status()?.text().await?)
}

fn script_urls(page_url: &Url, page: &str) -> Result<Vec<Url>> {
    let pattern = Regex::new(SCRIPT_SRC_PATTERN)
        .map_err(|err| Error::Assertion(format!("script tag pattern: {err}")))?;

    let mut urls = Vec::new();
    for capture in pattern.captures_iter(page) {
        let src = &capture[1];
        match page_url.join(src) {
            Ok(url) => urls.push(url),
            Err(err) => trace!("skipping script source {src}: {err}"),
        }
    }
    Ok(urls)
}

fn candidates_in(pattern: &Regex, script: &str) -> Vec<String> {
    pattern
        .captures_iter(script)
        .map(|capture| capture[1].to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_and_joins_script_sources() {
        let page_url = Url::parse("https://soundcloud.com/discover").unwrap();
        let page = concat!(
            r#"<html><head>"#,
            r#"<script crossorigin src="https://a-v2.sndcdn.com/assets/0-abcdef.js"></script>"#,
            r#"<script src="/assets/relative-123.js"></script>"#,
            r#"<script>inline();</script>"#,
            r#"</head></html>"#,
        );

        let urls = script_urls(&page_url, page).unwrap();
        assert_eq!(
            urls,
            vec![
                Url::parse("https://a-v2.sndcdn.com/assets/0-abcdef.js").unwrap(),
                Url::parse("https://soundcloud.com/assets/relative-123.js").unwrap(),
            ]
        );
    }

    #[test]
    fn finds_client_id_candidates_in_bundle_code() {
        let pattern = Regex::new(CLIENT_ID_PATTERN).unwrap();
        let script = concat!(
            r#"t.get("https://api-v2.soundcloud.com/me?client_id=aAbBcC112233"),"#,
            r#"u="client_id=short""#,
        );

        assert_eq!(
            candidates_in(&pattern, script),
            vec!["aAbBcC112233", "short"]
        );
    }
}
