//! AI microservice relay.
//!
//! # Data Flow
//! ```text
//! Image analysis:
//!     multipart image → payload.rs (stream:false, JSON schema)
//!     → client.rs complete() → analysis.rs (extract text, strip fence, parse)
//!     → AnalysisResult
//!
//! Pantry chat:
//!     {items, message} → chat.rs (context block, stream:true)
//!     → client.rs open_stream() → body relayed unmodified
//! ```

pub mod analysis;
pub mod chat;
pub mod client;
pub mod payload;

pub use analysis::{parse_analysis, AnalysisResult};
pub use chat::{PantryChatRequest, PantryItem};
pub use client::{AiClient, ImageUpload};
pub use payload::{ChatMessage, ChatPayload, Role};
