//! Centralized default constants for kaunseling.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// STORAGE
// =============================================================================

/// Storage key of the single profile document.
pub const PROFILE_KEY: &str = "counseling_profile";

/// Default directory for the filesystem key-value store.
pub const DATA_DIR: &str = "./data";

/// File extension used for persisted documents.
pub const DOCUMENT_EXTENSION: &str = "json";

// =============================================================================
// REMOTE MIRROR
// =============================================================================

/// Path appended to the remote endpoint for both read and write.
pub const REMOTE_ENTRIES_PATH: &str = "/entries";

/// Remote module name of the program records collection.
pub const REMOTE_MODULE_RECORDS: &str = "records";

/// Remote module name of the guestbook collection.
pub const REMOTE_MODULE_FEEDBACKS: &str = "feedbacks";

/// Interval between remote polls (5 minutes).
pub const REMOTE_POLL_SECS: u64 = 300;

/// Timeout for a single remote request in seconds.
pub const REMOTE_TIMEOUT_SECS: u64 = 15;

// =============================================================================
// ATTACHMENTS
// =============================================================================

/// Maximum accepted upload size per file (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// MIME prefixes accepted by attachment ingestion.
pub const ALLOWED_MIME_PREFIXES: &[&str] = &["image/", "application/pdf"];

/// Fallback MIME type when nothing better is known.
pub const FALLBACK_MIME: &str = "application/octet-stream";

// =============================================================================
// ACCESS GATE
// =============================================================================

/// Administrator password used when none is configured.
pub const ADMIN_PASSWORD: &str = "lily2016";

/// Visitor access code for the client-session registry when none is configured.
pub const VISITOR_CODE: &str = "LILY_SESSIONS";

/// Header carrying the session token on HTTP requests.
pub const SESSION_HEADER: &str = "x-session-token";

// =============================================================================
// INTERACTIONS
// =============================================================================

/// Display name used for visitor comments submitted without a name.
pub const VISITOR_NAME: &str = "PELAWAT";

/// Lowest accepted guestbook rating.
pub const RATING_MIN: u8 = 1;

/// Highest accepted guestbook rating.
pub const RATING_MAX: u8 = 5;

// =============================================================================
// PROFILE
// =============================================================================

pub const PROFILE_NAME: &str = "CIKGU LILY";
pub const PROFILE_SINCE: &str = "2016";
pub const PROFILE_QUOTE: &str =
    "Education is the most powerful weapon which you can use to change the world.";
pub const PROFILE_SCHOOL_NAME: &str = "SMK SEMERAH PADI, KUCHING";
pub const PROFILE_EMOTION_EMOJI: &str = "💖";
pub const PROFILE_EMOTION_LABEL: &str = "AMAZING";

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Default bind host.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default CORS max-age in seconds (1 hour).
pub const CORS_MAX_AGE_SECS: u64 = 3600;

/// Maximum request body size in bytes; uploads are embedded as base64 so
/// this is larger than the per-file limit.
pub const MAX_BODY_SIZE_BYTES: usize = 64 * 1024 * 1024;
