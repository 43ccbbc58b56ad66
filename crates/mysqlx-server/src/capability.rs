//! Two-phase capability handshake run before any session exists.
//!
//! The client first acknowledges password expiry handling, then reads the
//! server capabilities, then requests TLS. Each step is answered before the
//! next frame is read; any deviation ends the connection.

use crate::auth::MECHANISMS;
use mysqlx_core::error::XError;
use mysqlx_protocol::frontend::decode_message;
use mysqlx_protocol::proto::connection::{Capabilities, CapabilitiesSet, Capability};
use mysqlx_protocol::proto::datatypes::{scalar, Any, Scalar};
use mysqlx_protocol::{BackendMessage, FrontendMessage, PacketIo};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

pub const PWD_EXPIRE_OK: &str = "client.pwd_expire_ok";
pub const TLS: &str = "tls";

pub fn server_capabilities() -> Capabilities {
    let mechanisms = MECHANISMS
        .iter()
        .map(|name| Any::scalar(Scalar::string(*name)))
        .collect();
    let capability = |name: &str, value: Any| Capability {
        name: name.to_string(),
        value: Some(value),
    };
    Capabilities {
        capabilities: vec![
            capability("authentication.mechanisms", Any::array(mechanisms)),
            capability("doc.formats", Any::scalar(Scalar::string("text"))),
            capability("node_type", Any::scalar(Scalar::string("mysql"))),
            capability(PWD_EXPIRE_OK, Any::scalar(Scalar::bool(true))),
        ],
    }
}

/// The first capability of the set, when it is `name` = `V_BOOL true`.
fn expect_true_flag(set: &CapabilitiesSet, name: &str) -> Result<(), String> {
    let first = set
        .capabilities
        .as_ref()
        .and_then(|caps| caps.capabilities.first())
        .ok_or("no capabilities")?;
    if first.name != name {
        return Err(format!("expected {name}, got {}", first.name));
    }
    let value = first
        .value
        .as_ref()
        .and_then(Any::as_scalar)
        .ok_or_else(|| format!("{name} is not a scalar"))?;
    if value.kind() != Some(scalar::Type::VBool) {
        return Err(format!("{name} must be V_BOOL, got {}", value.type_name()));
    }
    if value.v_bool != Some(true) {
        return Err(format!("{name} must be true"));
    }
    Ok(())
}

pub fn check_pwd_expire_ok(msg: &FrontendMessage) -> Result<(), XError> {
    match msg {
        FrontendMessage::CapabilitiesSet(set) => {
            expect_true_flag(set, PWD_EXPIRE_OK).map_err(XError::BadCapabilities)
        }
        other => Err(XError::BadCapabilities(format!(
            "expected CON_CAPABILITIES_SET, got {}",
            other.name()
        ))),
    }
}

pub fn check_capabilities_get(msg: &FrontendMessage) -> Result<(), XError> {
    match msg {
        FrontendMessage::CapabilitiesGet => Ok(()),
        other => Err(XError::BadCapabilities(format!(
            "expected CON_CAPABILITIES_GET, got {}",
            other.name()
        ))),
    }
}

pub fn check_tls(msg: &FrontendMessage) -> Result<(), XError> {
    match msg {
        FrontendMessage::CapabilitiesSet(set) => expect_true_flag(set, TLS).map_err(|reason| {
            debug!(reason, "tls capability rejected");
            XError::CapabilityPrepareFailed(TLS.to_string())
        }),
        _ => Err(XError::CapabilityPrepareFailed(TLS.to_string())),
    }
}

enum Step {
    PwdExpireOk,
    Get,
    Tls,
}

/// Runs the handshake. `Ok(false)` means the client hung up before finishing.
pub async fn negotiate<S>(io: &mut PacketIo<S>) -> Result<bool, XError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    for step in [Step::PwdExpireOk, Step::Get, Step::Tls] {
        let Some(packet) = io.read_packet().await? else {
            return Ok(false);
        };
        let checked = match (decode_message(&packet), &step) {
            (Ok(msg), Step::PwdExpireOk) => check_pwd_expire_ok(&msg),
            (Ok(msg), Step::Get) => check_capabilities_get(&msg),
            (Ok(msg), Step::Tls) => check_tls(&msg),
            (Err(_), Step::Tls) => Err(XError::CapabilityPrepareFailed(TLS.to_string())),
            (Err(err), _) => Err(XError::BadCapabilities(err.to_string())),
        };
        if let Err(err) = checked {
            warn!(error = %err, "capability negotiation failed");
            io.write_message(BackendMessage::Error {
                error: err.to_sql_error(),
                fatal: true,
            });
            io.flush().await?;
            return Err(err);
        }
        let reply = match step {
            Step::Get => BackendMessage::Capabilities(server_capabilities()),
            Step::PwdExpireOk | Step::Tls => BackendMessage::Ok { msg: None },
        };
        io.write_message(reply);
        io.flush().await?;
    }
    debug!("capabilities negotiated");
    Ok(true)
}
