mod config;
mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use config::ServiceConfig;
use palisade_authz::{AuthzEngine, CheckCache, MemoryAuthzEngine};
use palisade_domain::system::ResourceGroupConfig;
use palisade_domain::{
    ActionRepository, NamespaceRepository, NamespaceService, OutboxRepository, PolicyFilter,
    PolicyRepository, RelationRepository, RoleRepository,
};
use palisade_postgres::{
    PostgresActionRepository, PostgresClient, PostgresConfig, PostgresNamespaceRepository,
    PostgresOutboxRepository, PostgresPolicyRepository, PostgresRelationRepository,
    PostgresRoleRepository,
};
use palisade_schema::SchemaRegistry;
use palisade_store::MemoryStore;
use palisade_sync::{RetryConfig, SyncConfig, SyncProcess};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    telemetry::init_telemetry(&config.log_level);

    info!(storage = %config.storage, "Starting palisade-all-in-one service");

    if let Err(e) = run(config).await {
        error!("Service failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: ServiceConfig) -> anyhow::Result<()> {
    let repos = build_repositories(&config).await?;

    // Seed the predefined namespaces, roles, actions and policies
    let namespace_service = NamespaceService::new(
        repos.namespaces.clone(),
        repos.roles.clone(),
        repos.actions.clone(),
        repos.policies.clone(),
        ResourceGroupConfig::default(),
    );
    namespace_service.ensure_system_defaults().await?;

    // Compile the stored configuration and push it to the backend
    let registry = Arc::new(SchemaRegistry::new());
    let snapshot = registry
        .reload(
            &repos.namespaces.list_namespaces().await?,
            &repos.roles.list_roles().await?,
            &repos.actions.list_actions().await?,
            &repos.policies.list_policies(PolicyFilter::default()).await?,
        )
        .await?;

    let engine: Arc<dyn AuthzEngine> = Arc::new(MemoryAuthzEngine::new());
    engine.push_schema(&snapshot.document).await?;
    info!(
        generation = snapshot.generation,
        "Schema pushed to permission backend"
    );

    let cache = Arc::new(CheckCache::new(Duration::from_secs(
        config.check_cache_ttl_secs,
    )));

    let shutdown_token = CancellationToken::new();
    let sync = SyncProcess::new(
        repos.outbox.clone(),
        repos.relations.clone(),
        engine,
        cache,
        SyncConfig {
            poll_interval: Duration::from_millis(config.sync_poll_interval_ms),
            batch_size: config.sync_batch_size,
            lanes: config.sync_lanes,
            retry: RetryConfig {
                max_attempts: 0,
                initial_delay: Duration::from_millis(config.sync_retry_initial_delay_ms),
                max_delay: Duration::from_millis(config.sync_retry_max_delay_ms),
                backoff_multiplier: 2.0,
            },
        },
        shutdown_token.clone(),
    );
    let sync_handle = tokio::spawn(sync.run());

    wait_for_shutdown().await?;
    info!("Shutdown signal received, stopping");

    shutdown_token.cancel();
    sync_handle.await??;

    info!("Shutdown complete");
    Ok(())
}

struct Repositories {
    relations: Arc<dyn RelationRepository>,
    outbox: Arc<dyn OutboxRepository>,
    namespaces: Arc<dyn NamespaceRepository>,
    roles: Arc<dyn RoleRepository>,
    actions: Arc<dyn ActionRepository>,
    policies: Arc<dyn PolicyRepository>,
}

async fn build_repositories(config: &ServiceConfig) -> anyhow::Result<Repositories> {
    match config.storage.as_str() {
        "postgres" => {
            info!("Initializing PostgreSQL...");
            let pg_config = PostgresConfig {
                host: config.postgres_host.clone(),
                port: config.postgres_port,
                database: config.postgres_database.clone(),
                username: config.postgres_username.clone(),
                password: config.postgres_password.clone(),
                max_pool_size: config.postgres_max_pool_size,
            };
            let client = PostgresClient::new(&pg_config)?;
            client.ping().await?;
            client.run_migrations().await?;

            Ok(Repositories {
                relations: Arc::new(PostgresRelationRepository::new(client.clone())),
                outbox: Arc::new(PostgresOutboxRepository::new(client.clone())),
                namespaces: Arc::new(PostgresNamespaceRepository::new(client.clone())),
                roles: Arc::new(PostgresRoleRepository::new(client.clone())),
                actions: Arc::new(PostgresActionRepository::new(client.clone())),
                policies: Arc::new(PostgresPolicyRepository::new(client)),
            })
        }
        _ => {
            info!("Using in-memory storage");
            let store = Arc::new(MemoryStore::new());
            Ok(Repositories {
                relations: store.clone(),
                outbox: store.clone(),
                namespaces: store.clone(),
                roles: store.clone(),
                actions: store.clone(),
                policies: store,
            })
        }
    }
}

async fn wait_for_shutdown() -> anyhow::Result<()> {
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = sigterm.recv() => {}
    }
    Ok(())
}
