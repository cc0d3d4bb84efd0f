//! Wire formats for the SoundCloud v2 API.
//!
//! # Submodules
//!
//! * [`resolve`] - resolved track and set payloads
//! * [`media`] - stream source redirect payload and delivery classification
//! * [`hls`] - M3U8 media playlist handling
//!
//! The [`json`] helper parses response bodies with consistent trace logging,
//! so every API payload can be inspected at TRACE level.

pub mod hls;
pub mod media;
pub mod resolve;

use crate::error::Result;
use serde::Deserialize;
use std::fmt::Debug;

/// Parses and logs JSON responses from the API.
///
/// # Arguments
///
/// * `body` - Response body text to parse
/// * `origin` - Description of the API endpoint for logging
///
/// # Logging
///
/// * Success: logs the parsed structure at TRACE level
/// * Parse error: logs the raw JSON at TRACE level if valid JSON
/// * Invalid JSON: logs the error and raw text at ERROR level
pub fn json<T>(body: &str, origin: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de> + Debug,
{
    match serde_json::from_str(body) {
        Ok(result) => {
            trace!("{}: {result:#?}", origin);
            Ok(result)
        }
        Err(e) => {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
                trace!("{}: {json:#?}", origin);
            } else {
                error!("{}: failed parsing response ({e:?})", origin);
                trace!("{body}");
            }
            Err(e.into())
        }
    }
}
