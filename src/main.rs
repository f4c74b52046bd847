use dotenvy::dotenv;
use expense_connector::backend::BackendClient;
use expense_connector::bot::handlers::{self, Command};
use expense_connector::config::Settings;
use std::io;
use std::sync::Arc;
use teloxide::dispatching::{ShutdownToken, UpdateHandler};
use teloxide::prelude::*;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Log file written next to the process, mirroring the console output as JSON.
const LOG_FILE: &str = "bot.log";

#[tokio::main]
async fn main() {
    // Load .env file
    dotenv().ok();

    // The guard flushes the file sink on drop, so it lives for all of main
    let _guard = init_logging();

    info!("Starting expense connector bot...");

    let settings = init_settings();

    let backend = Arc::new(BackendClient::new(&settings));
    let bot = Bot::new(settings.telegram_bot_token.clone());

    let mut dispatcher = Dispatcher::builder(bot, setup_handler())
        .dependencies(dptree::deps![backend])
        .build();

    tokio::spawn(shutdown_listener(dispatcher.shutdown_token()));

    info!("Bot is running...");

    dispatcher.dispatch().await;
}

fn init_logging() -> WorkerGuard {
    let file_appender = tracing_appender::rolling::never(".", LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    guard
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            Arc::new(s)
        }
        Err(e) => {
            error!(
                "Missing required configuration (TELEGRAM_BOT_TOKEN, BOT_SERVICE_URL): {}",
                e
            );
            std::process::exit(1);
        }
    }
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry().branch(
        Update::filter_message()
            .branch(
                dptree::entry()
                    .filter_command::<Command>()
                    .endpoint(handle_command),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| msg.text().is_some())
                    .endpoint(handle_text),
            ),
    )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
) -> Result<(), teloxide::RequestError> {
    let res = match cmd {
        Command::Start => handlers::start(bot, msg).await,
        Command::Help => handlers::help(bot, msg).await,
    };
    if let Err(e) = res {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_text(
    bot: Bot,
    msg: Message,
    backend: Arc<BackendClient>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_text(bot, msg, backend).await {
        error!("Text handler error: {}", e);
    }
    respond(())
}

/// Wait for SIGINT or SIGTERM, then stop the dispatcher gracefully.
/// In-flight updates finish; in-flight backend calls are not cancelled.
async fn shutdown_listener(token: ShutdownToken) {
    let streams = (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    );
    let (mut sigint, mut sigterm) = match streams {
        (Ok(i), Ok(t)) => (i, t),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to install signal handlers: {}", e);
            return;
        }
    };

    let name = tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    };

    warn!("Bot stopping ({})", name);

    match token.shutdown() {
        Ok(stopped) => stopped.await,
        Err(e) => error!("Dispatcher was not running: {}", e),
    }
}
