//! Command and message handlers for the connector bot.
//!
//! The text handler is the core of the system: one inbound message becomes
//! exactly one backend call, and every outcome is logged and answered.

use crate::backend::{BackendClient, BackendError};
use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;
use tracing::{error, info};

/// Supported bot commands
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Greeting and short intro
    #[command(description = "Start tracking expenses.")]
    Start,
    /// Usage examples
    #[command(description = "Show usage examples.")]
    Help,
}

/// Reply sent when the backend call fails at the HTTP layer.
pub const CONNECT_ERROR_REPLY: &str = "Error connecting to the service. Please try again later.";

/// Fallback reply sent after every failed relay.
pub const GENERIC_ERROR_REPLY: &str = "An error occurred while processing your request.";

/// Sender id, or 0 when the update carries no sender.
#[must_use]
pub fn get_user_id_safe(msg: &Message) -> u64 {
    msg.from.as_ref().map_or(0, |u| u.id.0)
}

/// Sender first name, or a generic label when absent.
#[must_use]
pub fn get_user_name_safe(msg: &Message) -> String {
    msg.from
        .as_ref()
        .map_or_else(|| "User".to_string(), |u| u.first_name.clone())
}

#[must_use]
pub fn welcome_text(user_name: &str) -> String {
    format!(
        "👋 <b>Welcome, {user_name}!</b>\n\n\
         I can help you track your expenses. Just tell me what you spent and on what! 💰\n\n\
         📌 <b>Example:</b> <code>Spent 50 on groceries</code>\n\n\
         Type /help to see more options."
    )
}

#[must_use]
pub fn help_text() -> String {
    "🆘 <b>How to Use Me</b> 🆘\n\n\
     I can help you track your expenses. Just send me a message with the amount and category.\n\n\
     📌 <b>Examples:</b>\n\
     💰 <code>Spent 20 on food</code>\n\
     🚕 <code>Taxi 15</code>\n\
     🛍️ <code>Bought groceries for 50</code>\n\n\
     Give it a try!"
        .to_string()
}

#[must_use]
pub fn confirmation_text(category: &str) -> String {
    format!("{category} expense added ✅")
}

/// Handle `/start`: greet the user by first name.
///
/// # Errors
///
/// Returns an error if the reply fails to send.
pub async fn start(bot: Bot, msg: Message) -> Result<()> {
    let user_id = get_user_id_safe(&msg);
    let user_name = get_user_name_safe(&msg);

    info!("User {} ({}) started the bot", user_id, user_name);

    bot.send_message(msg.chat.id, welcome_text(&user_name))
        .parse_mode(ParseMode::Html)
        .await?;

    Ok(())
}

/// Handle `/help`: static usage message.
///
/// # Errors
///
/// Returns an error if the reply fails to send.
pub async fn help(bot: Bot, msg: Message) -> Result<()> {
    bot.send_message(msg.chat.id, help_text())
        .parse_mode(ParseMode::Html)
        .await?;

    Ok(())
}

/// Handle a plain text message: relay it to the backend and answer.
///
/// Transport failures produce two replies (the connectivity message, then
/// the generic one); the other failure kinds produce only the generic one.
/// A success without a category sends nothing.
///
/// # Errors
///
/// Returns an error only if a reply fails to send; backend failures are
/// handled here and never propagate.
pub async fn handle_text(bot: Bot, msg: Message, backend: Arc<BackendClient>) -> Result<()> {
    let user_id = get_user_id_safe(&msg);
    let text = msg.text().unwrap_or("").to_string();

    info!("Received message from {}: {}", user_id, text);

    let started = Instant::now();
    let outcome = backend.relay(user_id.to_string(), text).await;
    let duration_ms = started.elapsed().as_millis();

    match outcome {
        Ok(response) => {
            info!(
                "Response from service in {}ms (status: {}, message: {})",
                duration_ms,
                response.status_label(),
                response.message_label()
            );
            if let Some(category) = response.category() {
                bot.send_message(msg.chat.id, confirmation_text(category))
                    .await?;
            }
        }
        Err(err) => {
            match &err {
                BackendError::Network(_) | BackendError::Api { .. } => {
                    error!(
                        "Backend HTTP error after {}ms: {} (body: {:?})",
                        duration_ms,
                        err,
                        err.response_body()
                    );
                    bot.send_message(msg.chat.id, CONNECT_ERROR_REPLY).await?;
                }
                BackendError::Json(e) => {
                    error!("Error processing message after {}ms: {}", duration_ms, e);
                }
                BackendError::Unknown(e) => {
                    error!("An unknown error occurred after {}ms: {}", duration_ms, e);
                }
            }
            // Every failure kind ends with the generic reply, so a transport
            // failure sends two messages: connectivity first, then this one.
            bot.send_message(msg.chat.id, GENERIC_ERROR_REPLY).await?;
        }
    }

    Ok(())
}
