mod mysql41;
mod plain;

pub use mysql41::Mysql41Auth;
pub use plain::PlainAuth;

use mysqlx_core::backend::QueryContext;
use mysqlx_core::error::XError;

/// Mechanism names advertised in `authentication.mechanisms`.
pub const MECHANISMS: &[&str] = &["MYSQL41", "PLAIN"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Ongoing,
    Succeeded,
    Failed,
    Error,
}

/// Account and default schema of a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    pub user: String,
    pub schema: Option<String>,
}

#[derive(Debug)]
pub struct AuthResponse {
    pub status: AuthStatus,
    pub data: Vec<u8>,
    pub error: Option<XError>,
    pub identity: Option<AuthIdentity>,
}

impl AuthResponse {
    pub fn ongoing(data: Vec<u8>) -> Self {
        Self {
            status: AuthStatus::Ongoing,
            data,
            error: None,
            identity: None,
        }
    }

    pub fn succeeded(identity: AuthIdentity) -> Self {
        Self {
            status: AuthStatus::Succeeded,
            data: Vec::new(),
            error: None,
            identity: Some(identity),
        }
    }

    pub fn failed(error: XError) -> Self {
        Self {
            status: AuthStatus::Failed,
            data: Vec::new(),
            error: Some(error),
            identity: None,
        }
    }

    pub fn error(error: XError) -> Self {
        Self {
            status: AuthStatus::Error,
            data: Vec::new(),
            error: Some(error),
            identity: None,
        }
    }
}

/// What a mechanism may touch while verifying credentials.
pub struct AuthContext<'a> {
    pub backend: &'a mut dyn QueryContext,
    pub peer_host: Option<&'a str>,
    pub skip_auth: bool,
}

#[derive(Debug)]
pub enum AuthHandler {
    Mysql41(Mysql41Auth),
    Plain(PlainAuth),
}

impl AuthHandler {
    pub fn for_mechanism(name: &str) -> Result<Self, XError> {
        match name {
            "MYSQL41" => Ok(AuthHandler::Mysql41(Mysql41Auth::new())),
            "PLAIN" => Ok(AuthHandler::Plain(PlainAuth::new())),
            other => Err(XError::NotSupportedAuthMode(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AuthHandler::Mysql41(_) => "MYSQL41",
            AuthHandler::Plain(_) => "PLAIN",
        }
    }

    pub async fn handle_start(&mut self, ctx: AuthContext<'_>, auth_data: &[u8]) -> AuthResponse {
        match self {
            AuthHandler::Mysql41(auth) => auth.handle_start(),
            AuthHandler::Plain(auth) => auth.handle_start(ctx, auth_data).await,
        }
    }

    pub async fn handle_continue(
        &mut self,
        ctx: AuthContext<'_>,
        auth_data: &[u8],
    ) -> AuthResponse {
        match self {
            AuthHandler::Mysql41(auth) => auth.handle_continue(ctx, auth_data).await,
            AuthHandler::Plain(auth) => auth.handle_continue(),
        }
    }
}

/// Splits `schema\0user\0secret`. Everything after the second NUL belongs
/// to the secret.
pub fn extract_null_terminated_element(data: &[u8]) -> Result<(String, String, Vec<u8>), XError> {
    let mut parts = data.splitn(3, |b| *b == 0);
    let (Some(schema), Some(user), Some(secret)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(XError::BadMessage(
            "authentication data must hold schema, user and secret".into(),
        ));
    };
    let text = |bytes: &[u8]| {
        String::from_utf8(bytes.to_vec())
            .map_err(|_| XError::BadMessage("authentication data is not valid UTF-8".into()))
    };
    let secret = secret.strip_suffix(&[0]).unwrap_or(secret);
    Ok((text(schema)?, text(user)?, secret.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::{extract_null_terminated_element, AuthHandler};

    #[test]
    fn splits_schema_user_and_proof() {
        let (schema, user, proof) =
            extract_null_terminated_element(b"mysql\0root\0*C6382C4").expect("split");
        assert_eq!(schema, "mysql");
        assert_eq!(user, "root");
        assert_eq!(proof, b"*C6382C4");
    }

    #[test]
    fn empty_segments_are_kept() {
        let (schema, user, proof) = extract_null_terminated_element(b"\0root\0").expect("split");
        assert_eq!(schema, "");
        assert_eq!(user, "root");
        assert!(proof.is_empty());
    }

    #[test]
    fn too_few_segments_is_bad_message() {
        let err = extract_null_terminated_element(b"mysql\0root").expect_err("two segments");
        assert_eq!(err.code(), 5000);
        assert!(extract_null_terminated_element(b"").is_err());
    }

    #[test]
    fn unknown_mechanism_is_rejected() {
        let err = AuthHandler::for_mechanism("SHA256_MEMORY").expect_err("unknown");
        assert_eq!(err.code(), 1251);
        assert_eq!(AuthHandler::for_mechanism("PLAIN").expect("plain").name(), "PLAIN");
    }
}
