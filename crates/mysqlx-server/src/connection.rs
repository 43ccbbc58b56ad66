use crate::auth::AuthHandler;
use crate::capability::negotiate;
use crate::registry::{ConnectionHandle, RegistrationGuard};
use crate::server::ServerContext;
use crate::session::{SessionState, StateRecord};
use mysqlx_core::backend::QueryContext;
use mysqlx_core::error::XError;
use mysqlx_core::types::COLLATION_UTF8MB4_GENERAL_CI;
use mysqlx_protocol::frontend::decode_message;
use mysqlx_protocol::{BackendMessage, PacketIo};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info, warn};

/// Collation requested for every backend session.
pub const SESSION_COLLATION: u8 = COLLATION_UTF8MB4_GENERAL_CI as u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoticeSettings {
    pub warnings: bool,
}

impl Default for NoticeSettings {
    fn default() -> Self {
        Self { warnings: true }
    }
}

/// One client connection after a successful capability handshake.
pub struct Connection<S> {
    pub(crate) ctx: Arc<ServerContext>,
    pub(crate) handle: Arc<ConnectionHandle>,
    pub(crate) io: PacketIo<S>,
    pub(crate) state: StateRecord,
    pub(crate) handler: Option<AuthHandler>,
    pub(crate) failed_attempts: u32,
    pub(crate) notices: NoticeSettings,
    pub(crate) backend: Box<dyn QueryContext>,
}

enum Flow {
    Continue,
    Close,
}

/// Drives an admitted connection to completion. The registry slot is held
/// until this returns.
pub async fn serve_connection<S>(ctx: Arc<ServerContext>, stream: S, registration: RegistrationGuard)
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let handle = Arc::clone(registration.handle());
    let id = handle.id;
    info!(client_id = id, peer = ?handle.peer_host, "client connected");

    let mut io = PacketIo::new(stream, ctx.config.server.max_packet_size);
    match negotiate(&mut io).await {
        Ok(true) => {}
        Ok(false) => {
            debug!(client_id = id, "client left during capability negotiation");
            return;
        }
        Err(err) => {
            warn!(client_id = id, error = %err, "capability negotiation aborted");
            return;
        }
    }

    let backend = match ctx.driver.open(id, 0, SESSION_COLLATION, None).await {
        Ok(backend) => backend,
        Err(err) => {
            error!(client_id = id, error = %err, "failed to open backend session");
            io.write_message(BackendMessage::Error {
                error: err.to_sql_error(),
                fatal: true,
            });
            let _ = io.flush().await;
            return;
        }
    };

    let mut conn = Connection {
        ctx,
        handle,
        io,
        state: StateRecord::new(),
        handler: None,
        failed_attempts: 0,
        notices: NoticeSettings::default(),
        backend,
    };
    conn.run().await;
    conn.teardown().await;
    info!(client_id = id, "client disconnected");
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub(crate) fn id(&self) -> u32 {
        self.handle.id
    }

    pub(crate) fn send_error(&mut self, err: &XError, fatal: bool) {
        self.io.write_message(BackendMessage::Error {
            error: err.to_sql_error(),
            fatal,
        });
    }

    async fn run(&mut self) {
        loop {
            if self.handle.is_killed() {
                info!(client_id = self.id(), "connection killed");
                break;
            }
            let read = tokio::select! {
                biased;
                _ = self.handle.wait_killed() => continue,
                read = self.io.read_packet() => read,
            };
            let packet = match read {
                Ok(Some(packet)) => packet,
                Ok(None) => {
                    debug!(client_id = self.id(), "client closed the connection");
                    break;
                }
                Err(err) => {
                    self.on_error(err);
                    let _ = self.io.flush().await;
                    break;
                }
            };
            let handled = match decode_message(&packet) {
                Ok(msg) => self.handle_message(msg).await,
                Err(err) => Err(err),
            };
            let flow = match handled {
                Ok(()) => Flow::Continue,
                Err(err) => self.on_error(err),
            };
            if let Err(err) = self.io.flush().await {
                warn!(client_id = self.id(), error = %err, "write failed");
                break;
            }
            if matches!(flow, Flow::Close) || self.state.current() == SessionState::Closing {
                break;
            }
        }
    }

    /// Reports `err` to the client and decides whether the connection survives.
    fn on_error(&mut self, err: XError) -> Flow {
        let id = self.id();
        if let XError::Io(io_err) = &err {
            debug!(client_id = id, error = %io_err, "transport error");
            return Flow::Close;
        }
        if err.is_result_undetermined() {
            error!(client_id = id, error = %err, "statement result undetermined, closing");
            self.send_error(&err, true);
            return Flow::Close;
        }
        if err.is_critical() {
            error!(client_id = id, error = %err, "critical error, stopping listener");
            self.ctx.stop_listener();
            self.send_error(&err, true);
            return Flow::Close;
        }
        let unexpected_before_auth = self.state.current() == SessionState::Authenticating
            && matches!(err, XError::BadMessage(_));
        if err.is_fatal() || unexpected_before_auth {
            warn!(client_id = id, error = %err, "fatal protocol error");
            self.send_error(&err, true);
            self.state.transition(SessionState::Closing);
            return Flow::Close;
        }
        warn!(client_id = id, code = err.code(), error = %err, "request failed");
        self.send_error(&err, false);
        Flow::Continue
    }

    async fn teardown(&mut self) {
        debug!(
            client_id = self.id(),
            state = ?self.state.current(),
            closed_from = ?self.state.previous_before_close(),
            "tearing down connection"
        );
        self.handler = None;
        if let Err(err) = self.backend.close().await {
            warn!(client_id = self.id(), error = %err, "backend close failed");
        }
    }
}
