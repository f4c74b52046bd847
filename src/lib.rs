//! Telegram connector for the expense-tracking backend service.
//!
//! Receives user text messages from Telegram, relays each one as a JSON
//! request to the backend, and replies with the categorized result.

/// HTTP client for the backend service
pub mod backend;
/// Telegram handlers
pub mod bot;
/// Configuration and settings management
pub mod config;
