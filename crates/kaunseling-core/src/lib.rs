//! # kaunseling-core
//!
//! Core types, traits, and abstractions for the kaunseling record keeper.
//!
//! This crate provides the data model shared by every other crate: the
//! attachment/interaction tree, the record types of each collection, the
//! generic collection CRUD, attachment ingestion, and the access gate.

pub mod access;
pub mod collection;
pub mod defaults;
pub mod error;
pub mod ingest;
pub mod interactions;
pub mod models;
pub mod profile;
pub mod records;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use access::{AccessGate, SessionState};
pub use collection::{Collection, CollectionKind, DynCollection, Record};
pub use error::{Error, Result};
pub use ingest::{decode_data_uri, encode_data_uri, ingest_batch, ingest_file, IngestLimits, IngestOutcome, SkippedFile};
pub use interactions::Interactions;
pub use models::*;
pub use profile::{KpiKind, Profile, ProfileList, UserEmotion};
pub use records::*;
pub use traits::{KeyValueStore, RemoteMirror};
pub use uuid_utils::{new_id, unique_id};
