use super::{extract_null_terminated_element, AuthContext, AuthIdentity, AuthResponse};
use mysqlx_core::auth::{decode_proof, generate_salt};
use mysqlx_core::backend::UserIdentity;
use mysqlx_core::error::XError;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mysql41State {
    Starting,
    WaitingResponse,
    Done,
    Error,
}

/// Challenge/response exchange of `mysql_native_password`.
#[derive(Debug)]
pub struct Mysql41Auth {
    state: Mysql41State,
    salt: Vec<u8>,
}

impl Default for Mysql41Auth {
    fn default() -> Self {
        Self::new()
    }
}

impl Mysql41Auth {
    pub fn new() -> Self {
        Self {
            state: Mysql41State::Starting,
            salt: Vec::new(),
        }
    }

    pub fn state(&self) -> Mysql41State {
        self.state
    }

    fn out_of_order(&mut self) -> AuthResponse {
        self.state = Mysql41State::Error;
        AuthResponse::error(XError::PacketsOutOfOrder)
    }

    pub fn handle_start(&mut self) -> AuthResponse {
        if self.state != Mysql41State::Starting {
            return self.out_of_order();
        }
        self.salt = generate_salt();
        self.state = Mysql41State::WaitingResponse;
        AuthResponse::ongoing(self.salt.clone())
    }

    pub async fn handle_continue(&mut self, ctx: AuthContext<'_>, data: &[u8]) -> AuthResponse {
        if self.state != Mysql41State::WaitingResponse {
            return self.out_of_order();
        }
        let (schema, user, proof) = match extract_null_terminated_element(data) {
            Ok(parts) => parts,
            Err(err) => {
                self.state = Mysql41State::Error;
                return AuthResponse::error(err);
            }
        };
        self.state = Mysql41State::Done;
        let identity = AuthIdentity {
            user: user.clone(),
            schema: (!schema.is_empty()).then_some(schema),
        };
        if ctx.skip_auth {
            return AuthResponse::succeeded(identity);
        }
        let Some(host) = ctx.peer_host else {
            debug!(user = %user, "MYSQL41 rejected: peer host unknown");
            return AuthResponse::failed(XError::AccessDenied);
        };
        let scramble = match decode_proof(&proof) {
            Ok(scramble) => scramble,
            Err(err) => return AuthResponse::failed(err),
        };
        let account = UserIdentity {
            username: user,
            hostname: host.to_string(),
        };
        if ctx.backend.auth(&account, &scramble, &self.salt).await {
            AuthResponse::succeeded(identity)
        } else {
            debug!(user = %account.username, host, "MYSQL41 proof rejected");
            AuthResponse::failed(XError::AccessDenied)
        }
    }
}
