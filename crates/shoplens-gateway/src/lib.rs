//! HTTP API server for ShopLens.
//!
//! This crate provides:
//! - The axum router for settings, API-key lookup, history and reports
//! - Structured JSON errors with stable codes
//! - The outbound collaborators: OpenAI advice, Slack notifications and
//!   the wkhtmltopdf renderer

pub mod advice;
pub mod error;
pub mod handlers;
pub mod notify;
pub mod report;
pub mod server;

pub use advice::{AdviceGenerator, OpenAiAdvisor, ADVICE_UNAVAILABLE};
pub use error::GatewayError;
pub use notify::{Notifier, NullNotifier, SlackNotifier};
pub use report::{PdfRenderer, WkhtmltopdfRenderer};
pub use server::{AppState, Gateway};

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
