use crate::proto::datatypes::Scalar;
use crate::proto::notice::frame::Scope;
use crate::proto::notice::session_state_changed::Parameter;
use crate::proto::notice::warning::Level;
use crate::proto::notice::{Frame, SessionStateChanged, Warning};
use mysqlx_core::backend::{SqlWarning, WarningLevel};
use prost::Message;

pub const FRAME_WARNING: u32 = 1;
pub const FRAME_SESSION_STATE_CHANGED: u32 = 3;

fn local_frame(frame_type: u32, payload: Vec<u8>) -> Frame {
    Frame {
        r#type: frame_type,
        scope: Some(Scope::Local as i32),
        payload: Some(payload),
    }
}

pub fn session_state_changed(param: Parameter, value: Scalar) -> Frame {
    let change = SessionStateChanged {
        param: param as i32,
        value: Some(value),
    };
    local_frame(FRAME_SESSION_STATE_CHANGED, change.encode_to_vec())
}

pub fn client_id_assigned(id: u64) -> Frame {
    session_state_changed(Parameter::ClientIdAssigned, Scalar::uint(id))
}

pub fn generated_insert_id(id: u64) -> Frame {
    session_state_changed(Parameter::GeneratedInsertId, Scalar::uint(id))
}

pub fn rows_affected(rows: u64) -> Frame {
    session_state_changed(Parameter::RowsAffected, Scalar::uint(rows))
}

pub fn warning(warning: &SqlWarning) -> Frame {
    let level = match warning.level {
        WarningLevel::Note => Level::Note,
        WarningLevel::Warning => Level::Warning,
        WarningLevel::Error => Level::Error,
    };
    let payload = Warning {
        level: Some(level as i32),
        code: u32::from(warning.code),
        msg: warning.message.clone(),
    };
    local_frame(FRAME_WARNING, payload.encode_to_vec())
}
