use dotenvy::dotenv;
use marketplace_keeper::{
    bot,
    config,
    core::{Marketplace, publish::GitCli},
    errors::{Error, Result},
    web,
};
use std::{env, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Build the configuration once and share it
    let app_config = Arc::new(config::load_app_configuration()?);

    // 4. Make sure the asset directory exists before serving it
    std::fs::create_dir_all(app_config.site.assets_dir())
        .inspect_err(|e| error!("Failed to create asset directory: {}", e))?;

    // 5. Wire the publish workflow
    let publisher = Arc::new(GitCli::new(app_config.site.root(), &app_config.git));
    let marketplace = Arc::new(Marketplace::new(
        app_config.site.clone(),
        reqwest::Client::new(),
        publisher,
    ));

    // 6. Serve the page and images alongside the bot
    let port = app_config.server.port;
    let site = app_config.site.clone();
    tokio::spawn(async move {
        if let Err(e) = web::serve(port, site).await {
            error!("Static file server stopped: {}", e);
        }
    });

    // 7. Run the bot; the token is read here, directly before use, not stored in AppConfig
    let token = env::var("BOT_TOKEN")
        .or_else(|_| env::var("DISCORD_BOT_TOKEN"))
        .inspect_err(|e| error!("BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, Arc::clone(&app_config), marketplace).await?;

    Ok(())
}
