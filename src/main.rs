//! gsbot - chat-driven administration for hosted game servers.
//!
//! Runs the bot against the in-process chat client: stdin lines become
//! messages from the configured console sender, replies go to stdout.

use gsbot::bot::build_router;
use gsbot::chat::loopback::pump_lines;
use gsbot::chat::{ChatIdentity, ChatSession, LoopbackClient, PairingEvent, PairingStream};
use gsbot::commands::Registry;
use gsbot::config::{self, Config, LoggingConfig};
use gsbot::db::Database;
use gsbot::hosting::HttpHostingClient;
use gsbot::service::{AuthService, ChatAdminService, ServerSettingsService};
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = Config::load(&config_path)?;

    init_tracing(&config.logging);

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(path = %config_path, error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {config_path}", errors.len());
    }

    let self_identity = config.chat.self_identity();
    info!(identity = %self_identity, "Starting gsbot");

    gsbot::metrics::init();
    if config.metrics.port != 0 {
        tokio::spawn(gsbot::http::run_http_server(config.metrics.port));
    }

    // Storage and services
    let db = Database::new(&config.database.path).await?;
    if let Some(admin) = &config.admin
        && db.users().seed_admin(&admin.username, &admin.password).await?
    {
        info!(username = %admin.username, "Admin user created");
    }

    let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel();
    let client = Arc::new(
        LoopbackClient::paired(self_identity, config.chat.alternate_identity())
            .with_outbox(outbox_tx),
    );
    let session = Arc::new(ChatSession::new(client.clone()));

    let hosting = Arc::new(HttpHostingClient::new(
        &config.hosting.base_url,
        config.hosting.timeout(),
    )?);
    let settings = Arc::new(ServerSettingsService::new(
        db.clone(),
        hosting,
        config.poller.use_own_credits,
    ));
    let auth = Arc::new(AuthService::new(db.clone(), session.clone()));
    let chat_admin = ChatAdminService::new(db.clone(), session.clone());

    if let Some(api_key) = config.hosting.api_key.as_deref().filter(|k| !k.is_empty()) {
        settings.update_api_key(api_key).await?;
    }
    for entry in &config.allowlist {
        let chat: ChatIdentity = entry.chat.parse()?;
        chat_admin.allowlist(&chat).await?;
    }
    info!(count = config.allowlist.len(), "Allow-list seeded");

    // Router
    let registry = Arc::new(Registry::with_defaults(
        settings.clone(),
        config.poller.options(),
    ));
    let router = Arc::new(build_router(session.clone(), registry, settings, auth));
    router.run()?;

    if config.bot.auto_login {
        match session.login().await {
            Ok(None) => info!("Chat session resumed"),
            Ok(Some(stream)) => {
                tokio::spawn(log_pairing(stream));
            }
            Err(e) => warn!(error = %e, "Chat login failed"),
        }
        match chat_admin.groups(Some(true)).await {
            Ok(groups) => info!(count = groups.len(), "Allow-listed groups joined"),
            Err(e) => warn!(error = %e, "Failed to list joined groups"),
        }
    } else {
        warn!("auto_login is disabled; messages are ignored until the session is logged in");
    }

    // Console transport
    tokio::spawn(async move {
        while let Some(msg) = outbox_rx.recv().await {
            println!("[{}] {}", msg.to, msg.text);
        }
    });

    let sender = config.chat.console_sender()?;
    let chat = config.chat.console_chat()?;
    let console = {
        let client = client.clone();
        tokio::spawn(async move {
            pump_lines(&client, BufReader::new(tokio::io::stdin()), &sender, &chat).await
        })
    };

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
        }
        res = console => {
            match res {
                Ok(Ok(lines)) => info!(lines, "Console input closed"),
                Ok(Err(e)) => error!(error = %e, "Console input failed"),
                Err(e) => error!(error = %e, "Console task panicked"),
            }
        }
    }

    router.stop();
    session.disconnect();
    db.close().await;
    info!("gsbot stopped");

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn log_pairing(stream: PairingStream) {
    while let Some(event) = stream.recv().await {
        match event {
            PairingEvent::Code { code, timeout_secs } => {
                info!(%code, timeout_secs, "Scan this pairing code");
            }
            PairingEvent::Success => info!("Chat device paired"),
            PairingEvent::Failed(e) => warn!(error = %e, "Chat pairing failed"),
        }
    }
}
