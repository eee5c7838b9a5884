use std::sync::Arc;

use anyhow::Context;

use translate_bot::bot::Bot;
use translate_bot::channels::{ChatSession, MatrixChannel};
use translate_bot::config::BotConfig;
use translate_bot::llm::create_provider;
use translate_bot::pipeline::{MessageProcessor, Translator};
use translate_bot::store::{LibSqlStore, SyncStateStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the environment may already be populated.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    let config = BotConfig::from_env().context("Invalid configuration")?;

    eprintln!("🌐 Translate Bot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Homeserver: {}", config.matrix.homeserver);
    eprintln!("   User: {}", config.matrix.user_id);
    eprintln!("   Model: {}", config.translator.model);
    eprintln!("   Token budget: {}", config.translator.token_budget);
    eprintln!("   Database: {}", config.db_path.display());
    match &config.admin_user_id {
        Some(admin) => eprintln!("   Admin: {admin}"),
        None => eprintln!("   Admin: (none, filter commands disabled)"),
    }

    // ── Database (filter keywords + sync position) ───────────────────
    let db = Arc::new(
        LibSqlStore::new_local(&config.db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?,
    );

    // ── Translation provider ─────────────────────────────────────────
    let provider = create_provider(config.anthropic.clone())?;
    let translator = Translator::new(provider, config.translator.clone());

    // ── Chat session ─────────────────────────────────────────────────
    let sync_store: Arc<dyn SyncStateStore> = db.clone();
    let session: Arc<dyn ChatSession> =
        Arc::new(MatrixChannel::new(config.matrix.clone()).with_sync_store(sync_store));

    let processor = Arc::new(MessageProcessor::new(
        Arc::clone(&session),
        db,
        translator,
        config.processor_config(),
    ));

    Bot::new(session, processor).run().await?;
    Ok(())
}
