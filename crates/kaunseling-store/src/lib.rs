//! # kaunseling-store
//!
//! Local persistence for kaunseling.
//!
//! This crate provides:
//! - Key-value store implementations (directory of JSON documents, in-memory)
//! - The [`Dashboard`] application state with one field per collection
//! - Persist-on-every-mutation and the remote mirroring hook

pub mod dashboard;
pub mod kv;

pub use dashboard::{Dashboard, DashboardStats, InteractionTarget};
pub use kv::{FilesystemStore, MemoryStore};
