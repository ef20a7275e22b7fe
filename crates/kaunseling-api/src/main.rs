use std::net::SocketAddr;
use std::sync::Arc;

use kaunseling_api::{app, AppState, ServerConfig};
use kaunseling_core::{KeyValueStore, RemoteMirror};
use kaunseling_store::{Dashboard, FilesystemStore};
use kaunseling_sync::{spawn_poller, HttpMirror};
use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: kaunseling crates at debug, tower_http at info)
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "kaunseling_api=debug,kaunseling_core=debug,kaunseling_store=debug,kaunseling_sync=debug,tower_http=info"
            .into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("kaunseling-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry.with(tracing_subscriber::fmt::layer().json()).init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = ServerConfig::from_env();
    let gate = config.gate();
    if gate.uses_default_secrets() {
        warn!(
            subsystem = "access",
            "Built-in administrator password or visitor code in use; set KAUNSELING_ADMIN_PASSWORD and KAUNSELING_VISITOR_CODE"
        );
    }

    // Local storage
    let store = FilesystemStore::new(&config.data_dir);
    store.validate().await.map_err(anyhow::Error::msg)?;
    info!(subsystem = "store", data_dir = %config.data_dir, "Local storage ready");
    let store: Arc<dyn KeyValueStore> = Arc::new(store);

    let mut dashboard = Dashboard::load(store).await;

    // Optional remote mirror
    let mirror = HttpMirror::from_env()?;
    let poll_interval = mirror.as_ref().map(|m| m.config().poll_interval());
    let mirror: Option<Arc<dyn RemoteMirror>> = mirror.map(|m| Arc::new(m) as Arc<dyn RemoteMirror>);
    if let Some(ref mirror) = mirror {
        dashboard = dashboard.with_mirror(Arc::clone(mirror));
    } else {
        info!(subsystem = "sync", "Remote mirror disabled");
    }

    let dashboard = Arc::new(Mutex::new(dashboard));
    let _poller = match (mirror, poll_interval) {
        (Some(mirror), Some(interval)) => Some(spawn_poller(Arc::clone(&dashboard), mirror, interval)),
        _ => None,
    };

    let state = AppState::with_shared(dashboard, gate, config.ingest_limits());
    let app = app(state, &config);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
