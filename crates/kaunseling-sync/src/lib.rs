//! # kaunseling-sync
//!
//! Optional remote mirror for the program records and the guestbook.
//!
//! - [`HttpMirror`]: `POST {endpoint}/entries` and `GET {endpoint}/entries?module=`
//! - [`SyncConfig`]: endpoint, timeout and poll interval from the environment
//! - [`refresh_once`] / [`spawn_poller`]: pull remote snapshots into the dashboard

pub mod config;
pub mod error;
pub mod mirror;
pub mod poller;

pub use config::SyncConfig;
pub use error::SyncError;
pub use mirror::HttpMirror;
pub use poller::{refresh_once, spawn_poller, RefreshReport};
