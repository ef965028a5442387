//! Blog server: loads settings, opens the pool, registers models and serves the API.
//!
//! Configure through the environment or a `.env` file (`DB_DRIVER`, `DB_HOST`, `DB_USER`, ...).

use blog_core::{app, AppState, Models, PoolCell, SchemaRegistry, Settings};
use tokio::net::TcpListener;

static POOL: PoolCell = PoolCell::const_new();

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("blog_core=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let db = POOL.initialize(&settings.pool).await?.clone();
    let registry = SchemaRegistry::new(db.dialect());
    let models = Models::register(&registry)?;
    let state = AppState::new(db.clone(), models, &settings.session_secret);

    let router = app(state, None)?;
    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("server started at http://{}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    db.close().await;
    Ok(())
}
