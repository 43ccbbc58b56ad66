use crate::proto::connection::{Capabilities, CapabilitiesSet};
use crate::proto::notice::Frame;
use crate::proto::resultset::ColumnMetaData;
use crate::proto::session::AuthenticateStart;
use crate::proto::sql::StmtExecute;
use bytes::Bytes;
use mysqlx_core::error::SqlError;

/// Client message type tags.
pub mod client {
    pub const CON_CAPABILITIES_GET: u8 = 1;
    pub const CON_CAPABILITIES_SET: u8 = 2;
    pub const CON_CLOSE: u8 = 3;
    pub const SESS_AUTHENTICATE_START: u8 = 4;
    pub const SESS_AUTHENTICATE_CONTINUE: u8 = 5;
    pub const SESS_RESET: u8 = 6;
    pub const SESS_CLOSE: u8 = 7;
    pub const SQL_STMT_EXECUTE: u8 = 12;
    pub const CRUD_FIND: u8 = 17;
    pub const CRUD_INSERT: u8 = 18;
    pub const CRUD_UPDATE: u8 = 19;
    pub const CRUD_DELETE: u8 = 20;
    pub const EXPECT_OPEN: u8 = 24;
    pub const EXPECT_CLOSE: u8 = 25;
    pub const CRUD_CREATE_VIEW: u8 = 30;
    pub const CRUD_MODIFY_VIEW: u8 = 31;
    pub const CRUD_DROP_VIEW: u8 = 32;
}

/// Server message type tags.
pub mod server {
    pub const OK: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const CONN_CAPABILITIES: u8 = 2;
    pub const SESS_AUTHENTICATE_CONTINUE: u8 = 3;
    pub const SESS_AUTHENTICATE_OK: u8 = 4;
    pub const NOTICE: u8 = 11;
    pub const RESULTSET_COLUMN_META_DATA: u8 = 12;
    pub const RESULTSET_ROW: u8 = 13;
    pub const RESULTSET_FETCH_DONE: u8 = 14;
    pub const RESULTSET_FETCH_SUSPENDED: u8 = 15;
    pub const RESULTSET_FETCH_DONE_MORE_RESULTSETS: u8 = 16;
    pub const SQL_STMT_EXECUTE_OK: u8 = 17;
    pub const RESULTSET_FETCH_DONE_MORE_OUT_PARAMS: u8 = 18;
}

/// One raw frame: type tag plus undecoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub msg_type: u8,
    pub payload: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrontendMessage {
    CapabilitiesGet,
    CapabilitiesSet(CapabilitiesSet),
    ConnectionClose,
    AuthenticateStart(AuthenticateStart),
    AuthenticateContinue { auth_data: Vec<u8> },
    SessionReset,
    SessionClose,
    StmtExecute(StmtExecute),
    /// CRUD and expectation blocks; recognised but not served.
    Crud { code: u8 },
    Unsupported { code: u8 },
}

impl FrontendMessage {
    pub fn name(&self) -> &'static str {
        match self {
            FrontendMessage::CapabilitiesGet => "CON_CAPABILITIES_GET",
            FrontendMessage::CapabilitiesSet(_) => "CON_CAPABILITIES_SET",
            FrontendMessage::ConnectionClose => "CON_CLOSE",
            FrontendMessage::AuthenticateStart(_) => "SESS_AUTHENTICATE_START",
            FrontendMessage::AuthenticateContinue { .. } => "SESS_AUTHENTICATE_CONTINUE",
            FrontendMessage::SessionReset => "SESS_RESET",
            FrontendMessage::SessionClose => "SESS_CLOSE",
            FrontendMessage::StmtExecute(_) => "SQL_STMT_EXECUTE",
            FrontendMessage::Crud { .. } => "CRUD",
            FrontendMessage::Unsupported { .. } => "UNSUPPORTED",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendMessage {
    Ok { msg: Option<String> },
    Error { error: SqlError, fatal: bool },
    Capabilities(Capabilities),
    AuthenticateContinue { auth_data: Vec<u8> },
    AuthenticateOk { auth_data: Vec<u8> },
    Notice(Frame),
    ColumnMetaData(ColumnMetaData),
    Row { fields: Vec<Vec<u8>> },
    FetchDone,
    StmtExecuteOk,
}
