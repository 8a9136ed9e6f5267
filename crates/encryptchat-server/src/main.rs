use std::sync::Arc;

use tracing::info;

use encryptchat_api::ChatRoom;
use encryptchat_db::Database;
use encryptchat_gateway::Dispatcher;
use encryptchat_server::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "encryptchat=debug,encryptchat_server=debug,encryptchat_api=debug,encryptchat_gateway=debug,tower_http=debug".into()
            }),
        )
        .init();

    let config = ServerConfig::from_env()?;

    // Init database
    let db = Database::open(&config.db_path)?;

    info!("Message text shift offset is {}", config.key.offset());
    let room = Arc::new(ChatRoom::new(db, config.key, Dispatcher::new()));

    let app = encryptchat_server::app(room, config.connection_settings());

    let addr = config.addr()?;
    info!("EncryptChat server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
