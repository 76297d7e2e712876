//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, routing prefix)
//!     → request.rs (request ID assigned / propagated)
//!     → api handlers (record, attachment, AI relay)
//!     → response.rs (verbatim relay or JSON error)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{AppState, HttpServer, ServerError};
