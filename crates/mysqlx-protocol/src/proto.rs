//! Protobuf payloads of the X Protocol, field-for-field with the mysqlx
//! `.proto` files (proto2 tags and labels).

pub mod datatypes {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Scalar {
        #[prost(enumeration = "scalar::Type", required, tag = "1")]
        pub r#type: i32,
        #[prost(sint64, optional, tag = "2")]
        pub v_signed_int: Option<i64>,
        #[prost(uint64, optional, tag = "3")]
        pub v_unsigned_int: Option<u64>,
        #[prost(message, optional, tag = "5")]
        pub v_octets: Option<scalar::Octets>,
        #[prost(double, optional, tag = "6")]
        pub v_double: Option<f64>,
        #[prost(float, optional, tag = "7")]
        pub v_float: Option<f32>,
        #[prost(bool, optional, tag = "8")]
        pub v_bool: Option<bool>,
        #[prost(message, optional, tag = "9")]
        pub v_string: Option<scalar::String>,
    }

    pub mod scalar {
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct String {
            #[prost(bytes = "vec", required, tag = "1")]
            pub value: Vec<u8>,
            #[prost(uint64, optional, tag = "2")]
            pub collation: Option<u64>,
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Octets {
            #[prost(bytes = "vec", required, tag = "1")]
            pub value: Vec<u8>,
            #[prost(uint32, optional, tag = "2")]
            pub content_type: Option<u32>,
        }

        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
        #[repr(i32)]
        pub enum Type {
            VSint = 1,
            VUint = 2,
            VNull = 3,
            VOctets = 4,
            VDouble = 5,
            VFloat = 6,
            VBool = 7,
            VString = 8,
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Object {
        #[prost(message, repeated, tag = "1")]
        pub fld: Vec<object::ObjectField>,
    }

    pub mod object {
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct ObjectField {
            #[prost(string, required, tag = "1")]
            pub key: String,
            #[prost(message, optional, tag = "2")]
            pub value: Option<super::Any>,
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Array {
        #[prost(message, repeated, tag = "1")]
        pub value: Vec<Any>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Any {
        #[prost(enumeration = "any::Type", required, tag = "1")]
        pub r#type: i32,
        #[prost(message, optional, tag = "2")]
        pub scalar: Option<Scalar>,
        #[prost(message, optional, tag = "3")]
        pub obj: Option<Object>,
        #[prost(message, optional, tag = "4")]
        pub array: Option<Array>,
    }

    pub mod any {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
        #[repr(i32)]
        pub enum Type {
            Scalar = 1,
            Object = 2,
            Array = 3,
        }
    }

    impl Scalar {
        fn empty(kind: scalar::Type) -> Self {
            Self {
                r#type: kind as i32,
                ..Default::default()
            }
        }

        pub fn bool(value: bool) -> Self {
            Self {
                v_bool: Some(value),
                ..Self::empty(scalar::Type::VBool)
            }
        }

        pub fn uint(value: u64) -> Self {
            Self {
                v_unsigned_int: Some(value),
                ..Self::empty(scalar::Type::VUint)
            }
        }

        pub fn sint(value: i64) -> Self {
            Self {
                v_signed_int: Some(value),
                ..Self::empty(scalar::Type::VSint)
            }
        }

        pub fn string(value: impl Into<std::string::String>) -> Self {
            Self {
                v_string: Some(scalar::String {
                    value: value.into().into_bytes(),
                    collation: None,
                }),
                ..Self::empty(scalar::Type::VString)
            }
        }

        pub fn octets(value: Vec<u8>) -> Self {
            Self {
                v_octets: Some(scalar::Octets {
                    value,
                    content_type: None,
                }),
                ..Self::empty(scalar::Type::VOctets)
            }
        }

        pub fn kind(&self) -> Option<scalar::Type> {
            scalar::Type::try_from(self.r#type).ok()
        }

        /// Protocol name of the scalar type, as used in argument errors.
        pub fn type_name(&self) -> &'static str {
            match self.kind() {
                Some(scalar::Type::VSint) => "V_SINT",
                Some(scalar::Type::VUint) => "V_UINT",
                Some(scalar::Type::VNull) => "V_NULL",
                Some(scalar::Type::VOctets) => "V_OCTETS",
                Some(scalar::Type::VDouble) => "V_DOUBLE",
                Some(scalar::Type::VFloat) => "V_FLOAT",
                Some(scalar::Type::VBool) => "V_BOOL",
                Some(scalar::Type::VString) => "V_STRING",
                None => "UNKNOWN",
            }
        }

        /// Renders the value for diagnostics.
        pub fn display_value(&self) -> std::string::String {
            match self.kind() {
                Some(scalar::Type::VSint) => self.v_signed_int.unwrap_or_default().to_string(),
                Some(scalar::Type::VUint) => self.v_unsigned_int.unwrap_or_default().to_string(),
                Some(scalar::Type::VDouble) => self.v_double.unwrap_or_default().to_string(),
                Some(scalar::Type::VFloat) => self.v_float.unwrap_or_default().to_string(),
                Some(scalar::Type::VBool) => self.v_bool.unwrap_or_default().to_string(),
                Some(scalar::Type::VString) => self
                    .v_string
                    .as_ref()
                    .map(|s| std::string::String::from_utf8_lossy(&s.value).into_owned())
                    .unwrap_or_default(),
                Some(scalar::Type::VOctets) => self
                    .v_octets
                    .as_ref()
                    .map(|s| std::string::String::from_utf8_lossy(&s.value).into_owned())
                    .unwrap_or_default(),
                Some(scalar::Type::VNull) => "NULL".into(),
                None => std::string::String::new(),
            }
        }
    }

    impl Any {
        pub fn scalar(value: Scalar) -> Self {
            Self {
                r#type: any::Type::Scalar as i32,
                scalar: Some(value),
                obj: None,
                array: None,
            }
        }

        pub fn array(values: Vec<Any>) -> Self {
            Self {
                r#type: any::Type::Array as i32,
                scalar: None,
                obj: None,
                array: Some(Array { value: values }),
            }
        }

        pub fn kind(&self) -> Option<any::Type> {
            any::Type::try_from(self.r#type).ok()
        }

        /// The scalar payload when this value is a scalar.
        pub fn as_scalar(&self) -> Option<&Scalar> {
            match self.kind() {
                Some(any::Type::Scalar) => self.scalar.as_ref(),
                _ => None,
            }
        }
    }
}

pub mod connection {
    use super::datatypes::Any;

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Capability {
        #[prost(string, required, tag = "1")]
        pub name: String,
        #[prost(message, optional, tag = "2")]
        pub value: Option<Any>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Capabilities {
        #[prost(message, repeated, tag = "1")]
        pub capabilities: Vec<Capability>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct CapabilitiesGet {}

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct CapabilitiesSet {
        #[prost(message, optional, tag = "1")]
        pub capabilities: Option<Capabilities>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Close {}
}

pub mod session {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct AuthenticateStart {
        #[prost(string, required, tag = "1")]
        pub mech_name: String,
        #[prost(bytes = "vec", optional, tag = "2")]
        pub auth_data: Option<Vec<u8>>,
        #[prost(bytes = "vec", optional, tag = "3")]
        pub initial_response: Option<Vec<u8>>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct AuthenticateContinue {
        #[prost(bytes = "vec", required, tag = "1")]
        pub auth_data: Vec<u8>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct AuthenticateOk {
        #[prost(bytes = "vec", optional, tag = "1")]
        pub auth_data: Option<Vec<u8>>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Reset {}

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Close {}
}

pub mod sql {
    use super::datatypes::Any;

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct StmtExecute {
        #[prost(string, optional, tag = "3", default = "sql")]
        pub namespace: Option<String>,
        #[prost(bytes = "vec", required, tag = "1")]
        pub stmt: Vec<u8>,
        #[prost(message, repeated, tag = "2")]
        pub args: Vec<Any>,
        #[prost(bool, optional, tag = "4", default = "false")]
        pub compact_metadata: Option<bool>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct StmtExecuteOk {}
}

pub mod resultset {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct FetchDone {}

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ColumnMetaData {
        #[prost(enumeration = "column_meta_data::FieldType", required, tag = "1")]
        pub r#type: i32,
        #[prost(bytes = "vec", optional, tag = "2")]
        pub name: Option<Vec<u8>>,
        #[prost(bytes = "vec", optional, tag = "3")]
        pub original_name: Option<Vec<u8>>,
        #[prost(bytes = "vec", optional, tag = "4")]
        pub table: Option<Vec<u8>>,
        #[prost(bytes = "vec", optional, tag = "5")]
        pub original_table: Option<Vec<u8>>,
        #[prost(bytes = "vec", optional, tag = "6")]
        pub schema: Option<Vec<u8>>,
        #[prost(bytes = "vec", optional, tag = "7")]
        pub catalog: Option<Vec<u8>>,
        #[prost(uint64, optional, tag = "8")]
        pub collation: Option<u64>,
        #[prost(uint32, optional, tag = "9")]
        pub fractional_digits: Option<u32>,
        #[prost(uint32, optional, tag = "10")]
        pub length: Option<u32>,
        #[prost(uint32, optional, tag = "11")]
        pub flags: Option<u32>,
        #[prost(uint32, optional, tag = "12")]
        pub content_type: Option<u32>,
    }

    pub mod column_meta_data {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
        #[repr(i32)]
        pub enum FieldType {
            Sint = 1,
            Uint = 2,
            Double = 5,
            Float = 6,
            Bytes = 7,
            Time = 10,
            Datetime = 12,
            Set = 15,
            Enum = 16,
            Bit = 17,
            Decimal = 18,
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Row {
        #[prost(bytes = "vec", repeated, tag = "1")]
        pub field: Vec<Vec<u8>>,
    }
}

pub mod notice {
    use super::datatypes::Scalar;

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Frame {
        #[prost(uint32, required, tag = "1")]
        pub r#type: u32,
        #[prost(enumeration = "frame::Scope", optional, tag = "2")]
        pub scope: Option<i32>,
        #[prost(bytes = "vec", optional, tag = "3")]
        pub payload: Option<Vec<u8>>,
    }

    pub mod frame {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
        #[repr(i32)]
        pub enum Scope {
            Global = 1,
            Local = 2,
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Warning {
        #[prost(enumeration = "warning::Level", optional, tag = "1")]
        pub level: Option<i32>,
        #[prost(uint32, required, tag = "2")]
        pub code: u32,
        #[prost(string, required, tag = "3")]
        pub msg: String,
    }

    pub mod warning {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
        #[repr(i32)]
        pub enum Level {
            Note = 1,
            Warning = 2,
            Error = 3,
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct SessionVariableChanged {
        #[prost(string, required, tag = "1")]
        pub param: String,
        #[prost(message, optional, tag = "2")]
        pub value: Option<Scalar>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct SessionStateChanged {
        #[prost(enumeration = "session_state_changed::Parameter", required, tag = "1")]
        pub param: i32,
        #[prost(message, optional, tag = "2")]
        pub value: Option<Scalar>,
    }

    pub mod session_state_changed {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
        #[repr(i32)]
        pub enum Parameter {
            CurrentSchema = 1,
            AccountExpired = 2,
            GeneratedInsertId = 3,
            RowsAffected = 4,
            RowsFound = 5,
            RowsMatched = 6,
            TrxCommitted = 7,
            TrxRolledback = 9,
            ProducedMessage = 10,
            ClientIdAssigned = 11,
        }
    }
}

/// `Mysqlx.Ok`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ServerOk {
    #[prost(string, optional, tag = "1")]
    pub msg: Option<String>,
}

/// `Mysqlx.Error`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ServerError {
    #[prost(enumeration = "server_error::Severity", optional, tag = "1")]
    pub severity: Option<i32>,
    #[prost(uint32, required, tag = "2")]
    pub code: u32,
    #[prost(string, required, tag = "4")]
    pub sql_state: String,
    #[prost(string, required, tag = "3")]
    pub msg: String,
}

pub mod server_error {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Severity {
        Error = 0,
        Fatal = 1,
    }
}
