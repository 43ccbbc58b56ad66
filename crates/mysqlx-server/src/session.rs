use crate::admin::quote_identifier;
use crate::auth::{AuthContext, AuthHandler, AuthResponse, AuthStatus};
use crate::connection::{Connection, NoticeSettings, SESSION_COLLATION};
use metrics::counter;
use mysqlx_core::backend::collect_rows;
use mysqlx_core::error::XError;
use mysqlx_protocol::notice::client_id_assigned;
use mysqlx_protocol::{BackendMessage, FrontendMessage};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Authenticating,
    Ready,
    Closing,
}

/// Current session state plus the state that was left when closing began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateRecord {
    current: SessionState,
    previous_before_close: Option<SessionState>,
}

impl Default for StateRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl StateRecord {
    pub fn new() -> Self {
        Self {
            current: SessionState::Authenticating,
            previous_before_close: None,
        }
    }

    pub fn current(&self) -> SessionState {
        self.current
    }

    pub fn previous_before_close(&self) -> Option<SessionState> {
        self.previous_before_close
    }

    /// `Closing` is terminal; later transitions are ignored.
    pub fn transition(&mut self, next: SessionState) {
        match (self.current, next) {
            (SessionState::Closing, _) => {}
            (current, SessionState::Closing) => {
                self.previous_before_close = Some(current);
                self.current = SessionState::Closing;
            }
            (_, next) => self.current = next,
        }
    }
}

const BYE: &str = "bye!";

enum AuthStep {
    Start,
    Continue,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub(crate) async fn handle_message(&mut self, msg: FrontendMessage) -> Result<(), XError> {
        debug!(
            client_id = self.id(),
            state = ?self.state.current(),
            message = msg.name(),
            "message received"
        );
        match self.state.current() {
            SessionState::Authenticating => self.handle_authenticating(msg).await,
            SessionState::Ready => self.handle_ready(msg).await,
            SessionState::Closing => Ok(()),
        }
    }

    async fn handle_authenticating(&mut self, msg: FrontendMessage) -> Result<(), XError> {
        match msg {
            FrontendMessage::AuthenticateStart(start) => {
                if self.handler.is_none() {
                    match AuthHandler::for_mechanism(&start.mech_name) {
                        Ok(handler) => {
                            debug!(client_id = self.id(), mechanism = handler.name(), "authentication started");
                            self.handler = Some(handler);
                        }
                        Err(err) => {
                            warn!(client_id = self.id(), error = %err, "authentication rejected");
                            self.send_error(&err, false);
                            return Ok(());
                        }
                    }
                }
                let data = start.auth_data.unwrap_or_default();
                let response = self.step_handler(AuthStep::Start, &data).await;
                self.apply_auth_response(response).await
            }
            FrontendMessage::AuthenticateContinue { auth_data } => {
                if self.handler.is_none() {
                    self.send_error(&XError::PacketsOutOfOrder, false);
                    return Ok(());
                }
                let response = self.step_handler(AuthStep::Continue, &auth_data).await;
                self.apply_auth_response(response).await
            }
            FrontendMessage::ConnectionClose => {
                self.say_goodbye();
                Ok(())
            }
            other => Err(XError::BadMessage(format!(
                "Invalid message {} received during authentication",
                other.name()
            ))),
        }
    }

    async fn step_handler(&mut self, step: AuthStep, data: &[u8]) -> AuthResponse {
        let Some(handler) = self.handler.as_mut() else {
            return AuthResponse::error(XError::PacketsOutOfOrder);
        };
        let ctx = AuthContext {
            backend: self.backend.as_mut(),
            peer_host: self.handle.peer_host.as_deref(),
            skip_auth: self.ctx.config.auth.skip_auth,
        };
        match step {
            AuthStep::Start => handler.handle_start(ctx, data).await,
            AuthStep::Continue => handler.handle_continue(ctx, data).await,
        }
    }

    async fn apply_auth_response(&mut self, response: AuthResponse) -> Result<(), XError> {
        match (response.status, response.identity) {
            (AuthStatus::Ongoing, _) => {
                self.io.write_message(BackendMessage::AuthenticateContinue {
                    auth_data: response.data,
                });
                Ok(())
            }
            (AuthStatus::Succeeded, Some(identity)) => {
                self.handler = None;
                if let Some(schema) = &identity.schema {
                    let sql = format!("USE {}", quote_identifier(schema));
                    let selected = match self.backend.execute(&sql).await {
                        Ok(results) => collect_rows(results).await.map(|_| ()),
                        Err(err) => Err(err),
                    };
                    if let Err(err) = selected {
                        debug!(client_id = self.id(), schema = %schema, error = %err, "default schema rejected");
                        return self.auth_failed(err);
                    }
                }
                self.io
                    .write_message(BackendMessage::Notice(client_id_assigned(u64::from(self.id()))));
                self.handle.set_user(&identity.user);
                self.failed_attempts = 0;
                self.state.transition(SessionState::Ready);
                self.io.write_message(BackendMessage::AuthenticateOk {
                    auth_data: response.data,
                });
                counter!("mysqlx_auth_success_total").increment(1);
                info!(client_id = self.id(), user = %identity.user, "authenticated");
                Ok(())
            }
            (AuthStatus::Succeeded, None) | (AuthStatus::Failed, _) => {
                let err = response.error.unwrap_or(XError::AccessDenied);
                self.auth_failed(err)
            }
            (AuthStatus::Error, _) => {
                self.handler = None;
                let err = response.error.unwrap_or(XError::PacketsOutOfOrder);
                warn!(client_id = self.id(), error = %err, "authentication error");
                self.send_error(&err, false);
                Ok(())
            }
        }
    }

    /// Counts a failed attempt; the last allowed attempt closes the connection.
    fn auth_failed(&mut self, err: XError) -> Result<(), XError> {
        self.handler = None;
        self.failed_attempts += 1;
        counter!("mysqlx_auth_failure_total").increment(1);
        let max_attempts = self.ctx.config.auth.max_attempts;
        if self.failed_attempts >= max_attempts {
            warn!(
                client_id = self.id(),
                attempts = self.failed_attempts,
                "too many failed authentication attempts"
            );
            self.send_error(&err, true);
            self.state.transition(SessionState::Closing);
        } else {
            info!(
                client_id = self.id(),
                attempts = self.failed_attempts,
                error = %err,
                "authentication failed"
            );
            self.send_error(&err, false);
        }
        Ok(())
    }

    async fn handle_ready(&mut self, msg: FrontendMessage) -> Result<(), XError> {
        match msg {
            FrontendMessage::SessionClose | FrontendMessage::ConnectionClose => {
                self.say_goodbye();
                Ok(())
            }
            FrontendMessage::SessionReset => self.reset_session().await,
            other => self.dispatch(other).await,
        }
    }

    fn say_goodbye(&mut self) {
        self.io.write_message(BackendMessage::Ok {
            msg: Some(BYE.to_string()),
        });
        self.state.transition(SessionState::Closing);
    }

    /// Swaps in a fresh backend session and re-arms authentication.
    async fn reset_session(&mut self) -> Result<(), XError> {
        if let Err(err) = self.backend.close().await {
            warn!(client_id = self.id(), error = %err, "backend close failed during reset");
        }
        self.backend = self
            .ctx
            .driver
            .open(self.id(), 0, SESSION_COLLATION, None)
            .await
            .map_err(|err| XError::ResultUndetermined(format!("session reset failed: {err}")))?;
        self.handler = None;
        self.failed_attempts = 0;
        self.notices = NoticeSettings::default();
        self.handle.clear_user();
        self.state.transition(SessionState::Authenticating);
        self.io.write_message(BackendMessage::Ok { msg: None });
        debug!(client_id = self.id(), "session reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionState, StateRecord};

    #[test]
    fn closing_is_terminal_and_remembers_previous_state() {
        let mut state = StateRecord::new();
        assert_eq!(state.current(), SessionState::Authenticating);
        state.transition(SessionState::Ready);
        state.transition(SessionState::Closing);
        assert_eq!(state.current(), SessionState::Closing);
        assert_eq!(state.previous_before_close(), Some(SessionState::Ready));
        state.transition(SessionState::Authenticating);
        assert_eq!(state.current(), SessionState::Closing);
    }
}
