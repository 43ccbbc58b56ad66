use crate::config::Config;
use crate::connection::serve_connection;
use crate::registry::ConnectionRegistry;
use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use mysqlx_core::backend::Driver;
use mysqlx_core::error::{codes, XError};
use mysqlx_protocol::{BackendMessage, PacketIo};
use mysqlx_sql::{MemoryDriver, MemoryEngine};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{error, info, warn};

/// State shared by the listener and every connection task.
pub struct ServerContext {
    pub config: Config,
    pub registry: Arc<ConnectionRegistry>,
    pub driver: Arc<dyn Driver>,
    stop: Notify,
    stopped: AtomicBool,
}

impl ServerContext {
    pub fn new(config: Config, driver: Arc<dyn Driver>) -> Self {
        Self {
            config,
            registry: Arc::new(ConnectionRegistry::new()),
            driver,
            stop: Notify::new(),
            stopped: AtomicBool::new(false),
        }
    }

    /// Asks the accept loop to stop taking new connections.
    pub fn stop_listener(&self) {
        self.stopped.store(true, Ordering::Release);
        self.stop.notify_waiters();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub async fn stopped(&self) {
        let notified = self.stop.notified();
        if self.is_stopped() {
            return;
        }
        notified.await;
    }
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    if config.metrics.enabled {
        let metrics_handle = PrometheusBuilder::new().install_recorder()?;
        let metrics_addr = config.metrics.listen_addr.clone();
        tokio::spawn(async move {
            let app = axum::Router::new()
                .route(
                    "/metrics",
                    axum::routing::get(move || {
                        let handle = metrics_handle.clone();
                        async move { handle.render() }
                    }),
                )
                .route("/health", axum::routing::get(|| async { "ok" }))
                .route("/ready", axum::routing::get(|| async { "ok" }));
            match TcpListener::bind(&metrics_addr).await {
                Ok(listener) => {
                    info!("metrics listening on {metrics_addr}");
                    if let Err(err) = axum::serve(listener, app).await {
                        error!("metrics endpoint failed: {err}");
                    }
                }
                Err(err) => error!("metrics bind {metrics_addr} failed: {err}"),
            }
        });
    }

    let engine = Arc::new(MemoryEngine::new(config.credential_store()?));
    let driver: Arc<dyn Driver> = Arc::new(MemoryDriver::new(engine));
    let listener = TcpListener::bind(&config.server.listen_addr).await?;
    info!("X Protocol listening on {}", config.server.listen_addr);
    let ctx = Arc::new(ServerContext::new(config, driver));

    tokio::select! {
        served = serve(listener, Arc::clone(&ctx)) => served?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("shutdown requested");
            ctx.stop_listener();
        }
    }
    Ok(())
}

/// Accepts connections until the listener is stopped.
pub async fn serve(listener: TcpListener, ctx: Arc<ServerContext>) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = tokio::select! {
            _ = ctx.stopped() => {
                warn!("listener stopped, no longer accepting connections");
                return Ok(());
            }
            accepted = listener.accept() => accepted?,
        };
        let admitted = ctx
            .registry
            .admit(Some(peer.ip().to_string()), ctx.config.server.max_connections);
        let Some(registration) = admitted else {
            counter!("mysqlx_connections_rejected_total").increment(1);
            warn!(%peer, "connection limit reached");
            tokio::spawn(reject_connection(socket, ctx.config.server.max_packet_size));
            continue;
        };
        counter!("mysqlx_connections_accepted_total").increment(1);
        let ctx = Arc::clone(&ctx);
        tokio::spawn(serve_connection(ctx, socket, registration));
    }
}

async fn reject_connection<S: AsyncRead + AsyncWrite + Unpin>(stream: S, max_packet_size: usize) {
    let mut io = PacketIo::new(stream, max_packet_size);
    let err = XError::sql(codes::ER_CON_COUNT, "08004", "Too many connections");
    io.write_message(BackendMessage::Error {
        error: err.to_sql_error(),
        fatal: true,
    });
    if let Err(err) = io.flush().await {
        warn!("failed to notify rejected client: {err}");
    }
}
