//! Resolve SoundCloud track and set URLs, download the audio behind them,
//! and write ID3 tags into the result.
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
// TODO : add documentation
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[macro_use]
extern crate log;

pub mod client_id;
pub mod config;
pub mod download;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod http;
pub mod protocol;
pub mod scrape;
pub mod set;
pub mod tag;
pub mod track;
