use super::{extract_null_terminated_element, AuthContext, AuthIdentity, AuthResponse};
use mysqlx_core::auth::{generate_salt, scramble_password};
use mysqlx_core::backend::UserIdentity;
use mysqlx_core::error::XError;
use tracing::debug;

/// Cleartext credentials in the start message, checked in one round trip.
#[derive(Debug, Default)]
pub struct PlainAuth {
    done: bool,
}

impl PlainAuth {
    pub fn new() -> Self {
        Self { done: false }
    }

    pub async fn handle_start(&mut self, ctx: AuthContext<'_>, data: &[u8]) -> AuthResponse {
        if self.done {
            return AuthResponse::error(XError::PacketsOutOfOrder);
        }
        self.done = true;
        let (schema, user, password) = match extract_null_terminated_element(data) {
            Ok(parts) => parts,
            Err(err) => return AuthResponse::error(err),
        };
        let identity = AuthIdentity {
            user: user.clone(),
            schema: (!schema.is_empty()).then_some(schema),
        };
        if ctx.skip_auth {
            return AuthResponse::succeeded(identity);
        }
        let Some(host) = ctx.peer_host else {
            return AuthResponse::failed(XError::AccessDenied);
        };
        // The store only keeps native hashes, so the password is scrambled
        // against a local salt and checked like a MYSQL41 proof.
        let salt = generate_salt();
        let proof = scramble_password(&password, &salt);
        let account = UserIdentity {
            username: user,
            hostname: host.to_string(),
        };
        if ctx.backend.auth(&account, &proof, &salt).await {
            AuthResponse::succeeded(identity)
        } else {
            debug!(user = %account.username, host, "PLAIN credentials rejected");
            AuthResponse::failed(XError::AccessDenied)
        }
    }

    pub fn handle_continue(&mut self) -> AuthResponse {
        self.done = true;
        AuthResponse::error(XError::PacketsOutOfOrder)
    }
}

#[cfg(test)]
mod tests {
    use super::PlainAuth;
    use crate::auth::{AuthContext, AuthStatus};
    use mysqlx_core::backend::{Driver, QueryContext};
    use mysqlx_sql::{CredentialStore, MemoryDriver, MemoryEngine, UserAccount};
    use std::sync::Arc;

    async fn backend() -> Box<dyn QueryContext> {
        let store = CredentialStore::new(vec![
            UserAccount::with_password("root", "localhost", "secret"),
            UserAccount::with_password("guest", "%", ""),
        ]);
        let driver = MemoryDriver::new(Arc::new(MemoryEngine::new(store)));
        driver.open(1, 0, 45, None).await.expect("open")
    }

    async fn attempt(backend: &mut Box<dyn QueryContext>, host: &str, data: &[u8]) -> AuthStatus {
        let ctx = AuthContext {
            backend: backend.as_mut(),
            peer_host: Some(host),
            skip_auth: false,
        };
        PlainAuth::new().handle_start(ctx, data).await.status
    }

    #[tokio::test]
    async fn checks_password_and_host() {
        let mut backend = backend().await;
        assert_eq!(
            attempt(&mut backend, "127.0.0.1", b"\0root\0secret").await,
            AuthStatus::Succeeded
        );
        assert_eq!(
            attempt(&mut backend, "127.0.0.1", b"\0root\0wrong").await,
            AuthStatus::Failed
        );
        assert_eq!(
            attempt(&mut backend, "10.1.1.1", b"\0root\0secret").await,
            AuthStatus::Failed
        );
        assert_eq!(
            attempt(&mut backend, "10.1.1.1", b"\0guest\0").await,
            AuthStatus::Succeeded
        );
    }

    #[tokio::test]
    async fn continue_is_out_of_order() {
        let mut auth = PlainAuth::new();
        let resp = auth.handle_continue();
        assert_eq!(resp.status, AuthStatus::Error);
        assert_eq!(resp.error.map(|e| e.code()), Some(1156));
    }
}
