use std::sync::Arc;

use {
    clap::Parser,
    tracing::{error, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    deskrelay_bridge::{ChatApi, RelayEngine, RelayOptions},
    deskrelay_config::Config,
    deskrelay_directory::DirectoryStore,
    deskrelay_i18n::Catalog,
    deskrelay_telegram::{TelegramChatApi, build_bot, start_polling},
};

#[derive(Parser)]
#[command(name = "deskrelay", about = "deskrelay — user ↔ support-topic relay bot")]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Directory snapshot path (overrides STORAGE_FILE).
    #[arg(long)]
    storage_file: Option<std::path::PathBuf>,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let mut config = Config::from_env()?;
    if let Some(path) = cli.storage_file {
        config.storage_file = path;
    }
    info!(?config, "configuration loaded");

    let catalog = match &config.i18n_file {
        Some(path) => Catalog::from_file(path, &config.lang)?,
        None => Catalog::embedded(&config.lang),
    };

    let store = Arc::new(DirectoryStore::open(&config.storage_file).await);

    let bot = build_bot(&config)?;
    let api: Arc<dyn ChatApi> = Arc::new(TelegramChatApi::new(bot.clone()));

    // Topics can only be created in a forum; refuse to start against
    // anything else.
    match api.chat_supports_topics(config.support_chat_id).await {
        Ok(true) => {
            info!(chat_id = %config.support_chat_id, "support chat verified");
        },
        Ok(false) => anyhow::bail!(
            "support chat {} is not a forum; enable topics and restart",
            config.support_chat_id
        ),
        Err(e) => anyhow::bail!("cannot access support chat {}: {e}", config.support_chat_id),
    }

    let options = RelayOptions {
        start_command: config.enable_start_command,
        welcome_message: config.welcome_message.clone(),
    };
    let engine = Arc::new(RelayEngine::new(
        api,
        store,
        Arc::new(catalog),
        config.support_chat_id,
        options,
    ));

    let cancel = start_polling(bot, engine).await?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
        _ = cancel.cancelled() => error!("polling loop stopped"),
    }
    cancel.cancel();

    Ok(())
}
