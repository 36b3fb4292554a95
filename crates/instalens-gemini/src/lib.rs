//! Gemini-backed image enrichment and audience demographics inference.
//!
//! Both calls go through `generateContent` and expect the model to answer with
//! a single JSON object, optionally wrapped in a markdown code fence.

pub mod client;
pub mod demographics;
pub mod error;
pub mod image;

mod response;
mod wire;

pub use client::{GeminiClient, GeminiClientConfig};
pub use demographics::AudienceSignals;
pub use error::GeminiError;
