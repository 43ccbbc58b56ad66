use crate::messages::{client, FrontendMessage, Packet};
use crate::proto::connection::CapabilitiesSet;
use crate::proto::session::{AuthenticateContinue, AuthenticateStart};
use crate::proto::sql::StmtExecute;
use bytes::{Buf, BytesMut};
use mysqlx_core::error::XError;
use prost::Message;

pub const HEADER_LEN: usize = 4;

/// Upper bound on how much read buffer one partial frame may reserve ahead
/// of the bytes actually received.
pub const MAX_READ_RESERVE: usize = 64 * 1024;

/// Splits one complete frame off the front of `buf`, if buffered.
///
/// The length prefix counts the type byte, so zero is malformed.
pub fn parse_frame(buf: &mut BytesMut, max_packet_size: usize) -> Result<Option<Packet>, XError> {
    if buf.len() < HEADER_LEN {
        return Ok(None);
    }
    let len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if len == 0 {
        return Err(XError::Framing("zero-length frame".into()));
    }
    if len > max_packet_size {
        return Err(XError::Framing(format!(
            "frame of {len} bytes exceeds the {max_packet_size} byte limit"
        )));
    }
    if buf.len() < HEADER_LEN + len {
        buf.reserve((HEADER_LEN + len - buf.len()).min(MAX_READ_RESERVE));
        return Ok(None);
    }
    buf.advance(HEADER_LEN);
    let msg_type = buf.get_u8();
    let payload = buf.split_to(len - 1).freeze();
    Ok(Some(Packet { msg_type, payload }))
}

fn bad_payload(what: &str, err: prost::DecodeError) -> XError {
    XError::BadMessage(format!("invalid {what} payload: {err}"))
}

pub fn decode_message(packet: &Packet) -> Result<FrontendMessage, XError> {
    let payload = &packet.payload[..];
    let msg = match packet.msg_type {
        client::CON_CAPABILITIES_GET => FrontendMessage::CapabilitiesGet,
        client::CON_CAPABILITIES_SET => FrontendMessage::CapabilitiesSet(
            CapabilitiesSet::decode(payload).map_err(|e| bad_payload("capabilities set", e))?,
        ),
        client::CON_CLOSE => FrontendMessage::ConnectionClose,
        client::SESS_AUTHENTICATE_START => FrontendMessage::AuthenticateStart(
            AuthenticateStart::decode(payload)
                .map_err(|e| bad_payload("authenticate start", e))?,
        ),
        client::SESS_AUTHENTICATE_CONTINUE => {
            let cont = AuthenticateContinue::decode(payload)
                .map_err(|e| bad_payload("authenticate continue", e))?;
            FrontendMessage::AuthenticateContinue {
                auth_data: cont.auth_data,
            }
        }
        client::SESS_RESET => FrontendMessage::SessionReset,
        client::SESS_CLOSE => FrontendMessage::SessionClose,
        client::SQL_STMT_EXECUTE => FrontendMessage::StmtExecute(
            StmtExecute::decode(payload).map_err(|e| bad_payload("statement", e))?,
        ),
        code @ (client::CRUD_FIND
        | client::CRUD_INSERT
        | client::CRUD_UPDATE
        | client::CRUD_DELETE
        | client::EXPECT_OPEN
        | client::EXPECT_CLOSE
        | client::CRUD_CREATE_VIEW
        | client::CRUD_MODIFY_VIEW
        | client::CRUD_DROP_VIEW) => FrontendMessage::Crud { code },
        code => FrontendMessage::Unsupported { code },
    };
    Ok(msg)
}
