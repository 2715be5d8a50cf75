//! HTTP server implementation

use crate::handler::{RequestHandler, Router};
use crate::shutdown::ShutdownSignal;
use crate::RuntimeState;
use courier_config::Config;
use courier_core::{Error, Result};
use courier_session::{InMemorySessionStore, SessionAccessor};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::RwLock;

/// HTTP server
pub struct Server {
    config: Config,
    handler: RequestHandler,
    state: Arc<RwLock<RuntimeState>>,
    shutdown: ShutdownSignal,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("handler", &self.handler)
            .finish()
    }
}

impl Server {
    /// Create a new server builder
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Get the current state
    pub async fn state(&self) -> RuntimeState {
        *self.state.read().await
    }

    /// Get listen address
    pub fn listen_addr(&self) -> SocketAddr {
        self.config.server.listen
    }

    /// Get request count
    pub fn request_count(&self) -> usize {
        self.handler.request_count()
    }

    /// Get the request handler
    pub fn handler(&self) -> &RequestHandler {
        &self.handler
    }

    /// Get shutdown signal
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Bind the configured address and serve until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.listen_addr()).await.map_err(|e| {
            Error::Runtime(format!("Failed to bind to {}: {}", self.listen_addr(), e))
        })?;

        self.serve(listener).await
    }

    /// Serve connections from `listener` until shutdown
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        *self.state.write().await = RuntimeState::Running;

        let local_addr = listener.local_addr()?;
        tracing::info!(
            listen = %local_addr,
            compression = self.config.compression.enabled,
            threshold = self.config.compression.threshold,
            algorithm = %self.config.compression.algorithm,
            "Server listening"
        );

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            tracing::trace!("Accepted connection from {}", addr);
                            self.spawn_connection(stream);
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {}", e);
                        }
                    }
                }

                _ = self.shutdown.wait() => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
            }
        }

        *self.state.write().await = RuntimeState::ShuttingDown;
        self.drain().await;
        *self.state.write().await = RuntimeState::Stopped;

        Ok(())
    }

    fn spawn_connection(&self, stream: tokio::net::TcpStream) {
        let handler = self.handler.clone();

        tokio::spawn(async move {
            let service = hyper::service::service_fn(move |req| {
                let handler = handler.clone();
                async move {
                    handler.handle(req).await.or_else(|e| {
                        tracing::error!("Request handler error: {}", e);
                        http::Response::builder()
                            .status(e.to_status_code())
                            .body(courier_core::Body::from(format!("Error: {e}")))
                    })
                }
            });

            let io = hyper_util::rt::TokioIo::new(stream);
            if let Err(e) = hyper::server::conn::http1::Builder::new()
                .serve_connection(io, service)
                .await
            {
                tracing::error!("HTTP connection error: {}", e);
            }
        });
    }

    /// Wait for in-flight requests, up to the shutdown timeout
    async fn drain(&self) {
        let shutdown_timeout = self.config.server.shutdown_timeout;
        let start = std::time::Instant::now();

        tracing::info!(
            timeout_secs = shutdown_timeout.as_secs(),
            "Waiting for in-flight requests to complete"
        );

        loop {
            let active = self.handler.in_flight();

            if active == 0 {
                tracing::info!("All requests completed, shutting down cleanly");
                break;
            }

            if start.elapsed() >= shutdown_timeout {
                tracing::warn!(
                    active_requests = active,
                    "Shutdown timeout reached, forcing shutdown"
                );
                break;
            }

            tracing::debug!(
                active_requests = active,
                elapsed_ms = start.elapsed().as_millis(),
                "Waiting for active requests to complete"
            );

            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        tracing::info!(
            shutdown_duration_ms = start.elapsed().as_millis(),
            "Server stopped"
        );
    }
}

/// Server builder
#[derive(Default)]
pub struct ServerBuilder {
    config: Option<Config>,
    router: Router,
    sessions: Option<Arc<dyn SessionAccessor>>,
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("config", &self.config)
            .field("router", &self.router)
            .field("custom_sessions", &self.sessions.is_some())
            .finish()
    }
}

impl ServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set configuration
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the request router
    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// Set the session backend (in-memory by default)
    pub fn sessions(mut self, sessions: Arc<dyn SessionAccessor>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Build the server
    pub fn build(self) -> Result<Server> {
        let config = self
            .config
            .ok_or_else(|| Error::Config("config is required".to_string()))?;
        courier_config::validate_config(&config)?;

        let sessions = self.sessions.unwrap_or_else(|| {
            tracing::info!("Using in-memory session store");
            Arc::new(InMemorySessionStore::new())
        });

        tracing::info!(routes = self.router.len(), "Server components initialized");

        let handler = RequestHandler::new(
            Arc::new(self.router),
            sessions,
            config.compression.clone(),
            config.session.clone(),
        );

        Ok(Server {
            config,
            handler,
            state: Arc::new(RwLock::new(RuntimeState::Initializing)),
            shutdown: ShutdownSignal::new(),
        })
    }
}
