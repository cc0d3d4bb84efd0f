//! ID3 tagging: write title, artist and cover art into downloaded audio.

use std::io::{Cursor, Seek};

use lofty::{
    config::WriteOptions,
    file::TaggedFileExt,
    picture::{MimeType, Picture, PictureType},
    probe::Probe,
    tag::{Accessor, Tag, TagExt},
};
use url::Url;

use crate::{
    error::{Error, Result},
    http,
    protocol::resolve::{EntityData, TrackData},
};

/// PNG file signature.
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];

/// Tags `audio` with the title, artist and cover art of `data`.
///
/// A missing or unfetchable cover image is logged and skipped; the audio
/// is still tagged with title and artist.
///
/// # Errors
///
/// Returns an error if the audio cannot be parsed or the tag cannot be
/// written.
pub async fn apply(
    http_client: &http::Client,
    audio: Vec<u8>,
    data: &TrackData,
) -> Result<Vec<u8>> {
    let cover = match data.artwork_url() {
        Some(artwork_url) => match fetch_cover(http_client, artwork_url).await {
            Ok(cover) => Some(cover),
            Err(err) => {
                warn!("no cover image found: {err}");
                None
            }
        },
        None => {
            debug!("track has no artwork");
            None
        }
    };

    write_tags(audio, data.title(), data.artist(), cover)
}

/// Writes `title`, `artist` and an optional front cover into `audio`.
///
/// The audio is parsed from memory and written back to memory, leaving
/// the stream data itself untouched.
///
/// # Errors
///
/// Returns an error if the audio cannot be parsed or the tag cannot be
/// written.
pub fn write_tags(
    audio: Vec<u8>,
    title: &str,
    artist: &str,
    cover: Option<Picture>,
) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(audio);
    let tagged_file = Probe::new(&mut cursor).guess_file_type()?.read()?;

    let mut tag = Tag::new(tagged_file.primary_tag_type());
    tag.set_title(title.to_owned());
    tag.set_artist(artist.to_owned());
    if let Some(cover) = cover {
        tag.push_picture(cover);
    }

    cursor.rewind()?;
    tag.save_to(&mut cursor, WriteOptions::default())?;
    Ok(cursor.into_inner())
}

async fn fetch_cover(http_client: &http::Client, artwork_url: &Url) -> Result<Picture> {
    debug!("fetching cover image from {artwork_url}");
    let bytes = http_client
        .unlimited
        .get(artwork_url.clone())
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|err| Error::ArtworkUnavailable(err.to_string()))?
        .bytes()
        .await
        .map_err(|err| Error::ArtworkUnavailable(err.to_string()))?;

    let mime_type = sniff_mime(&bytes);
    Ok(Picture::new_unchecked(
        PictureType::CoverFront,
        Some(mime_type),
        None,
        bytes.to_vec(),
    ))
}

fn sniff_mime(data: &[u8]) -> MimeType {
    if data.starts_with(PNG_MAGIC) {
        MimeType::Png
    } else {
        MimeType::Jpeg
    }
}
