//! Inbound API surface.
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | GET/POST | /locations | records |
//! | PATCH/DELETE | /locations/{id} | records |
//! | GET/POST | /food | records |
//! | PATCH/DELETE | /food/{id} | records |
//! | GET/POST | /attachments | attachments |
//! | POST | /analyzeImage | analysis |
//! | POST | /pantryChat | chat |
//! | GET | /health | liveness |
//!
//! All paths are mounted under the configured routing prefix.

pub mod analysis;
pub mod attachments;
pub mod chat;
pub mod records;

use axum::{
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;

use crate::http::server::AppState;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Routes relative to the routing prefix.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/locations",
            get(records::list_locations).post(records::create_location),
        )
        .route(
            "/locations/{id}",
            patch(records::update_location).delete(records::delete_location),
        )
        .route("/food", get(records::list_food).post(records::create_food))
        .route(
            "/food/{id}",
            patch(records::update_food).delete(records::delete_food),
        )
        .route(
            "/attachments",
            get(attachments::list_attachments).post(attachments::upload_attachment),
        )
        .route("/analyzeImage", post(analysis::analyze_image))
        .route("/pantryChat", post(chat::pantry_chat))
        .route("/health", get(health))
}
