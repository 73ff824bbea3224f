use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use hybridbot::cli::{Cli, Commands};
use hybridbot::core::{config, init_logger, log_settings_configuration, web_server};
use hybridbot::download::{download_link, extract_download_url, extract_media, MediaApiClient, MediaDocument, MediaKind};
use hybridbot::storage::{HerokuConfigProvider, JsonFilePersistence, SettingKey, SettingsStore};

/// Composition root: parses CLI arguments, builds the settings store and
/// dispatches to the requested subcommand.
#[tokio::main]
async fn main() -> Result<()> {
    // Environment first so Lazy config statics see it
    let _ = dotenvy::from_filename("config.env");
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Extract { file, single }) => run_extract(&file, single),
        Some(Commands::Download { url }) => run_download(&url).await,
        Some(Commands::Restore { backup }) => {
            let persistence = JsonFilePersistence::new(config::CONFIG_DIR.as_path());
            persistence.restore_backup(&backup).await?;
            Ok(())
        }
        Some(Commands::Backups) => {
            let persistence = JsonFilePersistence::new(config::CONFIG_DIR.as_path());
            for backup in persistence.list_backups().await? {
                println!("{}", backup.display());
            }
            Ok(())
        }
        command => {
            let store = Arc::new(build_store().await?);
            run_store_command(command.unwrap_or(Commands::Serve), store).await
        }
    }
}

async fn build_store() -> Result<SettingsStore> {
    let mut store = SettingsStore::open(config::CONFIG_DIR.as_path()).with_overrides(SettingKey::overrides_from_env());
    if let Some(remote) = HerokuConfigProvider::from_env() {
        store = store.with_remote(Arc::new(remote));
    }
    store.initialize().await?;
    log::info!("✅ Hybrid config manager initialized (session {})", store.session_id());
    Ok(store)
}

async fn run_store_command(command: Commands, store: Arc<SettingsStore>) -> Result<()> {
    match command {
        Commands::Get { key, fallback } => {
            println!("{}", store.get(&key, &fallback));
        }
        Commands::Set { key, value } => {
            store.set(&key, &value).await?;
            println!("{} = {}", key, value);
        }
        Commands::List => {
            println!("{}", serde_json::to_string_pretty(&store.get_all())?);
        }
        Commands::Sync => {
            let changed = store.sync_from_remote().await?;
            println!("{} setting(s) updated from remote", changed);
        }
        Commands::Restart => {
            let method = store.restart().await;
            println!("restart handled by: {}", method);
        }
        Commands::Serve => {
            log_settings_configuration();
            if let Err(e) = store.sync_from_remote().await {
                log::warn!("⚠️ Startup sync could not be saved: {}", e);
            }
            web_server::start_control_server(*config::PORT, store)
                .await
                .map_err(|e| anyhow::anyhow!("Control server failed: {}", e))?;
            log::info!("Control server stopped, exiting for supervisor restart");
        }
        Commands::Extract { .. } | Commands::Download { .. } | Commands::Backups | Commands::Restore { .. } => {}
    }
    Ok(())
}

fn run_extract(file: &Path, single: bool) -> Result<()> {
    let content = std::fs::read_to_string(file)?;
    let document: MediaDocument = serde_json::from_str(&content)?;

    if single {
        let resolved = extract_download_url(&document);
        match download_link(&resolved) {
            Some(url) => println!("{}\t{}", MediaKind::from_url(&url), url),
            None => {
                println!("{}", serde_json::to_string_pretty(&resolved)?);
                anyhow::bail!("No download link found in {}", file.display());
            }
        }
        return Ok(());
    }

    let media = extract_media(&document);
    if media.is_empty() {
        anyhow::bail!("No video or audio found in {}", file.display());
    }
    println!("{}", serde_json::to_string_pretty(&media)?);
    Ok(())
}

/// Detect, query the platform endpoint, extract, then print each URL with
/// the kind it would be sent as (videos first, then audios).
async fn run_download(link: &str) -> Result<()> {
    let client = MediaApiClient::new()?;
    let (platform, media) = client
        .resolve_link(
            &config::download_api::BASE_URL,
            config::download_api::API_KEY.as_deref(),
            link,
        )
        .await?;

    log::info!("Downloaded from {}: {} video(s), {} audio(s)", platform, media.videos.len(), media.audios.len());
    for url in &media.videos {
        println!("{}\t{}", MediaKind::from_url_or(url, MediaKind::Video), url);
    }
    for url in &media.audios {
        println!("{}\t{}", MediaKind::from_url_or(url, MediaKind::Audio), url);
    }
    Ok(())
}
