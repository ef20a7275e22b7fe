//! # kaunseling-api
//!
//! HTTP surface over the kaunseling dashboard: session handling, record CRUD
//! for every collection, attachments with their comment threads and
//! reactions, the counselor profile, and dashboard statistics.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method},
    routing::{get, post, put},
    Router,
};
use kaunseling_core::defaults::{CORS_MAX_AGE_SECS, SESSION_HEADER};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

pub use config::ServerConfig;
pub use error::ApiError;
pub use state::{AppState, SessionRegistry};

use handlers::{attachments, collections, profile, session};

/// All routes, without CORS.
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Session
        .route("/api/session", get(session::current))
        .route("/api/session/login", post(session::login))
        .route("/api/session/unlock", post(session::unlock))
        .route("/api/session/logout", post(session::logout))
        // Overview
        .route("/api/collections", get(collections::list_kinds))
        .route("/api/stats", get(collections::stats))
        // Records
        .route(
            "/api/collections/:kind",
            get(collections::list_records).post(collections::create_record),
        )
        .route(
            "/api/collections/:kind/:id",
            get(collections::get_record)
                .patch(collections::update_record)
                .put(collections::replace_record)
                .delete(collections::delete_record),
        )
        .route(
            "/api/collections/:kind/:id/comments",
            post(collections::add_record_comment),
        )
        .route(
            "/api/collections/:kind/:id/comments/:comment_id",
            axum::routing::delete(collections::delete_record_comment),
        )
        .route(
            "/api/collections/:kind/:id/reactions",
            post(collections::add_record_reaction),
        )
        // Attachments
        .route(
            "/api/collections/:kind/:id/attachments/:slot",
            post(attachments::upload),
        )
        .route(
            "/api/collections/:kind/:id/attachments/:slot/:attachment_id",
            put(attachments::replace).delete(attachments::remove),
        )
        .route(
            "/api/collections/:kind/:id/attachments/:slot/:attachment_id/content",
            get(attachments::content),
        )
        .route(
            "/api/collections/:kind/:id/attachments/:slot/:attachment_id/dutyDetails",
            put(attachments::set_duty_details),
        )
        .route(
            "/api/collections/:kind/:id/attachments/:slot/:attachment_id/comments",
            post(attachments::add_comment),
        )
        .route(
            "/api/collections/:kind/:id/attachments/:slot/:attachment_id/comments/:comment_id",
            axum::routing::delete(attachments::delete_comment),
        )
        .route(
            "/api/collections/:kind/:id/attachments/:slot/:attachment_id/reactions",
            post(attachments::add_reaction),
        )
        // Profile
        .route(
            "/api/profile",
            get(profile::get_profile).patch(profile::update_profile),
        )
        .route("/api/profile/emotion", put(profile::set_emotion))
        .route("/api/profile/kpi", put(profile::update_kpi))
        .route("/api/profile/holland/:code", put(profile::set_holland_image))
        .route(
            "/api/profile/:list",
            get(profile::list_attachments).post(profile::upload),
        )
        .route(
            "/api/profile/:list/:attachment_id",
            axum::routing::delete(profile::remove),
        )
        .route(
            "/api/profile/:list/:attachment_id/comments",
            post(profile::add_comment),
        )
        .route(
            "/api/profile/:list/:attachment_id/comments/:comment_id",
            axum::routing::delete(profile::delete_comment),
        )
        .route(
            "/api/profile/:list/:attachment_id/reactions",
            post(profile::add_reaction),
        )
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

/// The full application: routes plus CORS for the configured origins.
pub fn app(state: AppState, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(config.cors_origins()))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(SESSION_HEADER),
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(CORS_MAX_AGE_SECS));

    router(state, config.max_body_bytes).layer(cors)
}
