use thiserror::Error;

pub const DEFAULT_SQL_STATE: &str = "HY000";

pub mod codes {
    pub const ER_ACCESS_DENIED: u16 = 1045;
    pub const ER_NO_DB: u16 = 1046;
    pub const ER_BAD_DB: u16 = 1049;
    pub const ER_TABLE_EXISTS: u16 = 1050;
    pub const ER_BAD_TABLE: u16 = 1051;
    pub const ER_BAD_FIELD: u16 = 1054;
    pub const ER_PARSE: u16 = 1064;
    pub const ER_NO_SUCH_THREAD: u16 = 1094;
    pub const ER_UNKNOWN: u16 = 1105;
    pub const ER_NO_SUCH_TABLE: u16 = 1146;
    pub const ER_NET_PACKETS_OUT_OF_ORDER: u16 = 1156;
    pub const ER_DB_CREATE_EXISTS: u16 = 1007;
    pub const ER_NOT_SUPPORTED_YET: u16 = 1235;
    pub const ER_NOT_SUPPORTED_AUTH_MODE: u16 = 1251;
    pub const ER_CON_COUNT: u16 = 1040;
    pub const ER_JSON_USED_AS_KEY: u16 = 3152;
    pub const ER_X_BAD_MESSAGE: u16 = 5000;
    pub const ER_X_CAPABILITIES_PREPARE_FAILED: u16 = 5001;
    pub const ER_X_CMD_NUM_ARGUMENTS: u16 = 5015;
    pub const ER_X_CMD_ARGUMENT_TYPE: u16 = 5016;
    pub const ER_X_BAD_SCHEMA: u16 = 5112;
    pub const ER_X_BAD_TABLE: u16 = 5113;
    pub const ER_X_INVALID_COLLECTION: u16 = 5156;
    pub const ER_X_INVALID_ADMIN_COMMAND: u16 = 5157;
    pub const ER_X_INVALID_NAMESPACE: u16 = 5162;
    pub const ER_X_BAD_NOTICE: u16 = 5163;
    pub const ER_X_CANNOT_DISABLE_NOTICE: u16 = 5164;
}

/// Client-facing error triple carried by an ERROR frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlError {
    pub code: u16,
    pub sql_state: String,
    pub message: String,
}

impl SqlError {
    pub fn new(code: u16, sql_state: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            sql_state: sql_state.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum XError {
    #[error("framing error: {0}")]
    Framing(String),
    #[error("bad capabilities set: {0}")]
    BadCapabilities(String),
    #[error("Capability prepare failed for '{0}'")]
    CapabilityPrepareFailed(String),
    #[error("{0}")]
    BadMessage(String),
    #[error("Invalid authentication method {0}")]
    NotSupportedAuthMode(String),
    #[error("Invalid user or password")]
    AccessDenied,
    #[error("Got packets out of order")]
    PacketsOutOfOrder,
    #[error("Invalid number of arguments, expected {expected} but got {actual}")]
    CmdNumArguments { expected: usize, actual: usize },
    #[error("Invalid type for argument '{name}' at #{position} (should be {expected})")]
    CmdArgumentType {
        name: String,
        position: usize,
        expected: String,
    },
    #[error("Invalid {namespace} command {command}")]
    InvalidAdminCommand { namespace: String, command: String },
    #[error("Unknown namespace {0}")]
    UnknownNamespace(String),
    #[error("Invalid schema")]
    BadSchema,
    #[error("Invalid collection name")]
    BadTable,
    #[error("Table '{0}' already exists")]
    TableExists(String),
    #[error("Invalid collection")]
    InvalidCollection,
    #[error("JSON column '{0}' supports indexing only via generated columns on a specified JSON path.")]
    JsonUsedAsKey(String),
    #[error("Invalid notice name {0}")]
    BadNotice(String),
    #[error("Cannot disable notice {0}")]
    CannotDisableNotice(String),
    #[error("Unknown thread id: {0}")]
    NoSuchThread(u64),
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("{message}")]
    Sql {
        code: u16,
        sql_state: String,
        message: String,
    },
    #[error("result undetermined: {0}")]
    ResultUndetermined(String),
    #[error("critical error: {0}")]
    Critical(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl XError {
    pub fn sql(code: u16, sql_state: &str, message: impl Into<String>) -> Self {
        XError::Sql {
            code,
            sql_state: sql_state.to_string(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> u16 {
        use codes::*;
        match self {
            XError::Framing(_) | XError::BadCapabilities(_) | XError::BadMessage(_) => {
                ER_X_BAD_MESSAGE
            }
            XError::CapabilityPrepareFailed(_) => ER_X_CAPABILITIES_PREPARE_FAILED,
            XError::NotSupportedAuthMode(_) => ER_NOT_SUPPORTED_AUTH_MODE,
            XError::AccessDenied => ER_ACCESS_DENIED,
            XError::PacketsOutOfOrder => ER_NET_PACKETS_OUT_OF_ORDER,
            XError::CmdNumArguments { .. } => ER_X_CMD_NUM_ARGUMENTS,
            XError::CmdArgumentType { .. } => ER_X_CMD_ARGUMENT_TYPE,
            XError::InvalidAdminCommand { .. } => ER_X_INVALID_ADMIN_COMMAND,
            XError::UnknownNamespace(_) => ER_X_INVALID_NAMESPACE,
            XError::BadSchema => ER_X_BAD_SCHEMA,
            XError::BadTable => ER_X_BAD_TABLE,
            XError::TableExists(_) => ER_TABLE_EXISTS,
            XError::InvalidCollection => ER_X_INVALID_COLLECTION,
            XError::JsonUsedAsKey(_) => ER_JSON_USED_AS_KEY,
            XError::BadNotice(_) => ER_X_BAD_NOTICE,
            XError::CannotDisableNotice(_) => ER_X_CANNOT_DISABLE_NOTICE,
            XError::NoSuchThread(_) => ER_NO_SUCH_THREAD,
            XError::NotSupported(_) => ER_NOT_SUPPORTED_YET,
            XError::Sql { code, .. } => *code,
            XError::ResultUndetermined(_) | XError::Critical(_) | XError::Io(_) => ER_UNKNOWN,
        }
    }

    pub fn sql_state(&self) -> &str {
        match self {
            XError::AccessDenied => "28000",
            XError::NotSupportedAuthMode(_) => "08004",
            XError::PacketsOutOfOrder => "08S01",
            XError::TableExists(_) => "42S01",
            XError::JsonUsedAsKey(_) | XError::NotSupported(_) => "42000",
            XError::Sql { sql_state, .. } => sql_state,
            _ => DEFAULT_SQL_STATE,
        }
    }

    pub fn to_sql_error(&self) -> SqlError {
        SqlError::new(self.code(), self.sql_state(), self.to_string())
    }

    /// The connection cannot continue once one of these is raised.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            XError::Framing(_)
                | XError::BadCapabilities(_)
                | XError::CapabilityPrepareFailed(_)
                | XError::ResultUndetermined(_)
                | XError::Critical(_)
                | XError::Io(_)
        )
    }

    pub fn is_result_undetermined(&self) -> bool {
        matches!(self, XError::ResultUndetermined(_))
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, XError::Critical(_))
    }

    pub fn is_table_exists(&self) -> bool {
        self.code() == codes::ER_TABLE_EXISTS
    }
}
