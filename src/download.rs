//! Media assembly: fetch progressive streams or HLS segments into memory.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use futures_util::StreamExt;
use url::Url;

use crate::{
    error::{Error, Result},
    http,
    protocol::{hls, media::Delivery},
};

/// Knobs for a track download.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DownloadOptions {
    /// Whether to write title, artist and cover art into the audio.
    pub metadata: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self { metadata: true }
    }
}

/// How the audio behind a stream URL is transferred.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StreamTarget {
    /// One continuous HTTP download.
    Direct(Url),

    /// A sequence of HLS segments, in playlist order.
    Segmented(Vec<Url>),
}

/// Determines how the audio behind `stream_url` is transferred.
///
/// Progressive URLs are downloaded as-is. HLS URLs point at an M3U8
/// playlist, which is fetched here and broken into its segment URLs.
///
/// # Errors
///
/// Returns [`Error::Transport`] if the playlist cannot be fetched.
pub async fn resolve_target(http_client: &http::Client, stream_url: Url) -> Result<StreamTarget> {
    match Delivery::of_url(&stream_url) {
        Delivery::Progressive => Ok(StreamTarget::Direct(stream_url)),
        Delivery::Hls => {
            let playlist = http_client
                .unlimited
                .get(stream_url.clone())
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|err| transport_error(&stream_url, err))?
                .text()
                .await
                .map_err(|err| transport_error(&stream_url, err))?;

            let segments = hls::segment_urls(&playlist);
            debug!("playlist has {} segments", segments.len());
            Ok(StreamTarget::Segmented(segments))
        }
    }
}

/// Downloads the audio for `target` into memory.
///
/// Segments are fetched one at a time so the audio lands in playlist
/// order. Any failure aborts the whole assembly; no partial audio is
/// returned.
///
/// # Errors
///
/// Returns [`Error::Transport`] if any transfer fails.
pub async fn assemble(http_client: &http::Client, target: &StreamTarget) -> Result<Vec<u8>> {
    match target {
        StreamTarget::Direct(url) => fetch_progressive(http_client, url).await,
        StreamTarget::Segmented(urls) => fetch_segments(http_client, urls).await,
    }
}

async fn fetch_progressive(http_client: &http::Client, url: &Url) -> Result<Vec<u8>> {
    let response = http_client
        .unlimited
        .get(url.clone())
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|err| transport_error(url, err))?;

    // A missing `Content-Length` only affects progress logging.
    let mut data = match response.content_length() {
        Some(size) => {
            debug!("downloading {size} bytes");
            Vec::with_capacity(usize::try_from(size).unwrap_or_default())
        }
        None => {
            debug!("downloading stream of unknown size");
            Vec::new()
        }
    };

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| transport_error(url, err))?;
        data.extend_from_slice(&chunk);
        trace!("received {} bytes ({} so far)", chunk.len(), data.len());
    }

    debug!("downloaded {} bytes in total", data.len());
    Ok(data)
}

async fn fetch_segments(http_client: &http::Client, urls: &[Url]) -> Result<Vec<u8>> {
    let count = urls.len();
    let mut data = Vec::new();

    // Strictly one at a time: the segments form one continuous MP3 stream
    // and must land in playlist order.
    for (index, url) in urls.iter().enumerate() {
        trace!("fetching segment {} of {count}", index + 1);
        let segment = http_client
            .unlimited
            .get(url.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| transport_error(url, err))?
            .bytes()
            .await
            .map_err(|err| transport_error(url, err))?;
        data.extend_from_slice(&segment);
    }

    debug!("assembled {count} segments into {} bytes", data.len());
    Ok(data)
}

fn transport_error(url: &Url, source: reqwest::Error) -> Error {
    Error::Transport {
        url: url.clone(),
        source,
    }
}

/// A fully assembled, optionally tagged download.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DownloadedTrack {
    data: Vec<u8>,
    filename: String,
}

impl DownloadedTrack {
    #[must_use]
    pub fn new(data: Vec<u8>, filename: String) -> Self {
        Self { data, filename }
    }

    /// The audio bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The suggested output filename, derived from the track permalink.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Size of the audio in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Consumes the download, returning the audio bytes.
    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Writes the audio into `directory`, creating it if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn write_to_file(&self, directory: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(directory)?;
        let path = directory.join(&self.filename);
        fs::write(&path, &self.data)?;
        Ok(path)
    }
}

impl fmt::Display for DownloadedTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2} MB)", self.filename, megabytes(self.size()))
    }
}

// `f64` not for precision, but to format fractional megabytes.
#[expect(clippy::cast_precision_loss)]
fn megabytes(size: usize) -> f64 {
    size as f64 / 1e6
}
