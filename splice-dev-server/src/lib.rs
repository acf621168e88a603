use anyhow::{Context, Result};
use axum::{
    Router,
    extract::State,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tower_http::services::ServeDir;
use tracing::{debug, error, info};

mod reload;

pub use reload::{RELOAD_ALL, Reload, inject_livereload_script, reloads_for};

pub const LIVERELOAD_PATH: &str = "/__livereload";

const DEBOUNCE: Duration = Duration::from_millis(300);

/// Configuration for the live development server
#[derive(Debug, Clone)]
pub struct LiveServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to serve on
    pub port: u16,
    /// Directory to serve and watch
    pub root: PathBuf,
    /// Auto-open browser
    pub open: bool,
}

impl Default for LiveServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            root: PathBuf::from("."),
            open: false,
        }
    }
}

/// Serves a built site and tells open pages when their files change.
pub struct LiveServer {
    config: LiveServerConfig,
}

impl LiveServer {
    pub fn new(config: LiveServerConfig) -> Self {
        Self { config }
    }

    pub async fn run(self) -> Result<()> {
        let root = self.config.root.canonicalize().with_context(|| {
            format!("Root directory does not exist: {}", self.config.root.display())
        })?;

        let (reload_tx, _) = broadcast::channel::<String>(64);
        // Watching stops when the debouncer is dropped.
        let _debouncer = watch_root(&root, reload_tx.clone())?;

        let app = Router::new()
            .route(LIVERELOAD_PATH, get(websocket_handler))
            .fallback_service(ServeDir::new(&root))
            .with_state(reload_tx);

        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .with_context(|| format!("Invalid address {}:{}", self.config.host, self.config.port))?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        info!("Serving {} at http://{}", root.display(), addr);

        if self.config.open {
            if let Err(e) = open::that(format!("http://{}", addr)) {
                error!("Failed to open browser: {}", e);
            }
        }

        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Broadcast the reloads for every debounced batch of changes under `root`.
fn watch_root(
    root: &Path,
    reload_tx: broadcast::Sender<String>,
) -> Result<Debouncer<RecommendedWatcher>> {
    let watched = root.to_path_buf();

    let mut debouncer = new_debouncer(DEBOUNCE, move |res: DebounceEventResult| match res {
        Ok(events) => {
            for reload in reloads_for(&watched, events.iter().map(|e| e.path.as_path())) {
                debug!("Reloading {}", reload.message());
                // Fails only while no browser is connected.
                let _ = reload_tx.send(reload.message().to_string());
            }
        }
        Err(e) => error!("Watch error: {:?}", e),
    })?;

    debouncer.watcher().watch(root, RecursiveMode::Recursive)?;
    debug!("Watching {} for reloads", root.display());

    Ok(debouncer)
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(reload_tx): State<broadcast::Sender<String>>,
) -> impl IntoResponse {
    let reloads = reload_tx.subscribe();
    ws.on_upgrade(move |socket| forward_reloads(socket, reloads))
}

async fn forward_reloads(mut socket: WebSocket, mut reloads: broadcast::Receiver<String>) {
    loop {
        tokio::select! {
            reload = reloads.recv() => {
                let message = match reload {
                    Ok(message) => message,
                    // The page this client shows may be among the missed ones.
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("Client lagged by {} reload(s)", skipped);
                        RELOAD_ALL.to_string()
                    }
                    Err(RecvError::Closed) => break,
                };
                if socket.send(Message::Text(message.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                Some(Ok(_)) => {}
            },
        }
    }
}
