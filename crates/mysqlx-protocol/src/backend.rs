use crate::messages::{server, BackendMessage};
use crate::proto::resultset::{FetchDone, Row};
use crate::proto::server_error::Severity;
use crate::proto::session::{AuthenticateContinue, AuthenticateOk};
use crate::proto::sql::StmtExecuteOk;
use crate::proto::{ServerError, ServerOk};
use bytes::{BufMut, BytesMut};
use prost::Message;

/// Appends one frame: little-endian length (type byte included), type, payload.
pub fn put_frame(buf: &mut BytesMut, msg_type: u8, payload: &[u8]) {
    buf.reserve(5 + payload.len());
    buf.put_u32_le((payload.len() + 1) as u32);
    buf.put_u8(msg_type);
    buf.extend_from_slice(payload);
}

fn put_message<M: Message>(buf: &mut BytesMut, msg_type: u8, msg: &M) {
    put_frame(buf, msg_type, &msg.encode_to_vec());
}

pub fn encode_message(buf: &mut BytesMut, msg: BackendMessage) {
    match msg {
        BackendMessage::Ok { msg } => put_message(buf, server::OK, &ServerOk { msg }),
        BackendMessage::Error { error, fatal } => {
            let severity = if fatal { Severity::Fatal } else { Severity::Error };
            let err = ServerError {
                severity: Some(severity as i32),
                code: u32::from(error.code),
                sql_state: error.sql_state,
                msg: error.message,
            };
            put_message(buf, server::ERROR, &err);
        }
        BackendMessage::Capabilities(caps) => {
            put_message(buf, server::CONN_CAPABILITIES, &caps)
        }
        BackendMessage::AuthenticateContinue { auth_data } => put_message(
            buf,
            server::SESS_AUTHENTICATE_CONTINUE,
            &AuthenticateContinue { auth_data },
        ),
        BackendMessage::AuthenticateOk { auth_data } => put_message(
            buf,
            server::SESS_AUTHENTICATE_OK,
            &AuthenticateOk {
                auth_data: Some(auth_data),
            },
        ),
        BackendMessage::Notice(frame) => put_message(buf, server::NOTICE, &frame),
        BackendMessage::ColumnMetaData(meta) => {
            put_message(buf, server::RESULTSET_COLUMN_META_DATA, &meta)
        }
        BackendMessage::Row { fields } => {
            put_message(buf, server::RESULTSET_ROW, &Row { field: fields })
        }
        BackendMessage::FetchDone => put_message(buf, server::RESULTSET_FETCH_DONE, &FetchDone {}),
        BackendMessage::StmtExecuteOk => {
            put_message(buf, server::SQL_STMT_EXECUTE_OK, &StmtExecuteOk {})
        }
    }
}
