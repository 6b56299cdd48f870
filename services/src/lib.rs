//! Demo backend for the Rollcall kiosk.
//!
//! Serves the four operations the kiosk front end calls: card scanning
//! (demo UID), face capture, student registration, and joint card+face
//! verification. State is in-memory only.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod handlers;
pub mod roster;
pub mod window;

use config::Config;
use roster::Roster;

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub roster: Arc<Roster>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            roster: Arc::new(Roster::new()),
        }
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/scan_rfid", post(handlers::scan_rfid))
        .route("/capture_face", post(handlers::capture_face))
        .route("/register_student", post(handlers::register_student))
        .route("/verify_both", post(handlers::verify_both))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
