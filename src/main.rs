//! Folio - Portfolio and blog backend

use anyhow::Result;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio::{
    api::{self, AppState},
    cache::create_cache,
    config::Config,
    db::{self, migrations},
    services::{
        blog::{BlogRepositories, BlogService},
        content::ContentStore,
        markdown::MarkdownRenderer,
    },
};

/// Upper bound on a single migration attempt
const MIGRATION_TIMEOUT: Duration = Duration::from_secs(15);

const MIGRATION_RETRY_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Folio...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database; without one the blog is served from content files.
    // A database that fails to migrate is kept: reads fall back per query
    // while migrations are retried in the background.
    let pool = match db::create_pool(&config.database).await {
        Ok(Some(pool)) => {
            match migrations::run_migrations_within(&pool, MIGRATION_TIMEOUT).await {
                Ok(applied) => tracing::info!(
                    "Database connected: {:?} ({} migrations applied)",
                    config.database.driver,
                    applied
                ),
                Err(e) => {
                    tracing::error!(
                        "Database migrations failed, retrying every {:?}: {:#}",
                        MIGRATION_RETRY_INTERVAL,
                        e
                    );
                    tokio::spawn(migrations::retry_migrations(
                        pool.clone(),
                        MIGRATION_RETRY_INTERVAL,
                        MIGRATION_TIMEOUT,
                    ));
                }
            }
            Some(pool)
        }
        Ok(None) => {
            tracing::info!("No database configured, using content files only");
            None
        }
        Err(e) => {
            tracing::error!("Database unavailable, using content files only: {:#}", e);
            None
        }
    };

    // Initialize cache
    let cache = create_cache(&config.cache);
    tracing::info!("Cache initialized");

    let content = ContentStore::new(&config.blog.content_dir);
    if !content.is_present() {
        tracing::warn!("Content directory {:?} does not exist", content.root());
    }

    let repos = pool.clone().map(BlogRepositories::from_pool);
    let blog = Arc::new(BlogService::new(repos, content, cache, &config.blog));

    if config.server.admin_token.is_none() {
        tracing::info!("No admin token configured, admin API disabled");
    }

    // Build application state
    let state = AppState {
        pool,
        blog,
        renderer: Arc::new(MarkdownRenderer::new()),
        tools: Arc::new(config.tools.clone()),
        admin_token: config.server.admin_token.as_deref().map(Arc::from),
    };

    // Build router
    let app = api::build_router(state, &config.server);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
