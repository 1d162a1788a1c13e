use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use survey_backend::{
    config::{get_config, init_config, LogFormat, StoreBackend},
    database::{
        catalog::Repository, memory::MemoryCatalogStore, pool::create_pool,
        postgres::PgCatalogStore,
    },
    middleware::auth::JwtKeys,
    routes, AppState,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn open_store() -> anyhow::Result<Arc<dyn Repository>> {
    let config = get_config();
    match config.store_backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres backend")?;
            let pool = create_pool(url).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("connected to postgres, migrations applied");
            Ok(Arc::new(PgCatalogStore::new(pool)))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; data is lost on shutdown");
            Ok(Arc::new(MemoryCatalogStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config();
    init_tracing(config.log_format);

    let store = open_store().await?;
    let keys = JwtKeys::new(&config.jwt_secret);
    let app = routes::api_router(AppState::new(store, keys), config.api_rps);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
