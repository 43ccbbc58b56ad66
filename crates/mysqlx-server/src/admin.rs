//! Commands of the `mysqlx` statement namespace.

use crate::connection::Connection;
use crate::registry::ClientInfo;
use mysqlx_core::backend::{collect_rows, ResultSet, VecResultSet};
use mysqlx_core::catalog::{classify_table, CatalogColumn, ObjectKind};
use mysqlx_core::error::XError;
use mysqlx_core::types::{flags, ColumnInfo, ColumnType, DataRow, DataValue};
use mysqlx_protocol::proto::datatypes::{scalar, Any, Scalar};
use mysqlx_protocol::proto::sql::StmtExecute;
use std::collections::HashMap;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

/// Notices that are always on.
const FIXED_NOTICES: [&str; 4] = [
    "account_expired",
    "generated_insert_id",
    "rows_affected",
    "produced_message",
];
const WARNINGS_NOTICE: &str = "warnings";

pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

pub fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

/// Checks argument count, then that every argument is a scalar of the
/// expected type. Positions in errors are zero based.
pub fn check_args<'a>(args: &'a [Any], expected: &[scalar::Type]) -> Result<Vec<&'a Scalar>, XError> {
    if args.len() != expected.len() {
        return Err(XError::CmdNumArguments {
            expected: expected.len(),
            actual: args.len(),
        });
    }
    args.iter()
        .zip(expected)
        .enumerate()
        .map(|(position, (arg, want))| check_scalar_arg(arg, position, *want))
        .collect()
}

fn check_scalar_arg(arg: &Any, position: usize, want: scalar::Type) -> Result<&Scalar, XError> {
    let mismatch = |name: String| XError::CmdArgumentType {
        name,
        position,
        expected: type_name(want).to_string(),
    };
    let value = arg
        .as_scalar()
        .ok_or_else(|| mismatch(format!("{arg:?}")))?;
    if value.kind() != Some(want) {
        return Err(mismatch(value.display_value()));
    }
    Ok(value)
}

fn type_name(kind: scalar::Type) -> &'static str {
    Scalar {
        r#type: kind as i32,
        ..Default::default()
    }
    .type_name()
}

fn string_arg(value: &Scalar) -> String {
    value
        .v_string
        .as_ref()
        .map(|s| String::from_utf8_lossy(&s.value).into_owned())
        .unwrap_or_default()
}

fn text_column(name: &str) -> ColumnInfo {
    ColumnInfo::computed(name, ColumnType::VarString)
}

fn uint_column(name: &str) -> ColumnInfo {
    ColumnInfo {
        flags: flags::UNSIGNED,
        ..ColumnInfo::computed(name, ColumnType::LongLong)
    }
}

fn text(value: impl Into<String>) -> DataValue {
    DataValue::String(value.into())
}

fn two_strings(args: &[Any]) -> Result<(String, String), XError> {
    let values = check_args(args, &[scalar::Type::VString, scalar::Type::VString])?;
    Ok((string_arg(values[0]), string_arg(values[1])))
}

pub fn list_clients_result(clients: &[ClientInfo]) -> VecResultSet {
    let columns = vec![
        uint_column("client_id"),
        text_column("user"),
        text_column("host"),
        uint_column("sql_session"),
    ];
    let rows = clients
        .iter()
        .map(|client| DataRow {
            values: vec![
                DataValue::UInt64(u64::from(client.id)),
                text(client.user.as_str()),
                text(client.host.as_str()),
                DataValue::UInt64(client.sql_session),
            ],
        })
        .collect();
    VecResultSet::new(columns, rows)
}

fn collection_sql(schema: &str, name: &str) -> String {
    let target = if schema.is_empty() {
        quote_identifier(name)
    } else {
        format!("{}.{}", quote_identifier(schema), quote_identifier(name))
    };
    format!(
        "CREATE TABLE {target} (doc JSON, \
         _id VARCHAR(32) GENERATED ALWAYS AS (JSON_UNQUOTE(JSON_EXTRACT(doc, '$._id'))) STORED PRIMARY KEY) \
         ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"
    )
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub(crate) async fn execute_admin(
        &mut self,
        namespace: &str,
        stmt: &StmtExecute,
    ) -> Result<(), XError> {
        let command = String::from_utf8_lossy(&stmt.stmt).into_owned();
        let args = stmt.args.as_slice();
        debug!(client_id = self.id(), command = %command, args = args.len(), "admin command");
        let ran_sql = match command.as_str() {
            "ping" => {
                check_args(args, &[])?;
                false
            }
            "list_clients" => {
                check_args(args, &[])?;
                let clients = self.ctx.registry.list();
                let rs: Box<dyn ResultSet> = Box::new(list_clients_result(&clients));
                self.write_results(vec![rs]).await?;
                false
            }
            "kill_client" => {
                let values = check_args(args, &[scalar::Type::VUint])?;
                let id = values[0].v_unsigned_int.unwrap_or_default();
                info!(client_id = self.id(), target_id = id, "kill_client");
                self.ctx.registry.kill(id, false)?;
                false
            }
            "create_collection" => {
                let (schema, name) = two_strings(args)?;
                self.run_sql(&collection_sql(&schema, &name)).await?;
                true
            }
            "ensure_collection" => {
                let (schema, name) = two_strings(args)?;
                match self.run_sql(&collection_sql(&schema, &name)).await {
                    Err(err) if !err.is_table_exists() => return Err(err),
                    _ => {}
                }
                let filter = format!("= {}", quote_string(&name));
                let objects = self.classify_objects(&schema, Some(&filter)).await?;
                if !matches!(objects.as_slice(), [(_, ObjectKind::Collection)]) {
                    return Err(XError::InvalidCollection);
                }
                true
            }
            "drop_collection" => {
                let (schema, name) = two_strings(args)?;
                if schema.is_empty() {
                    return Err(XError::BadSchema);
                }
                if name.is_empty() {
                    return Err(XError::BadTable);
                }
                let sql = format!(
                    "DROP TABLE {}.{}",
                    quote_identifier(&schema),
                    quote_identifier(&name)
                );
                self.run_sql(&sql).await?;
                true
            }
            "create_collection_index" | "drop_collection_index" => {
                return Err(XError::JsonUsedAsKey("doc".into()));
            }
            "list_objects" => {
                let (schema, pattern) = two_strings(args)?;
                self.list_objects(&schema, &pattern).await?;
                true
            }
            "enable_notices" => {
                for name in self.notice_names(args)? {
                    if name.eq_ignore_ascii_case(WARNINGS_NOTICE) {
                        self.notices.warnings = true;
                    }
                }
                false
            }
            "disable_notices" => {
                for name in self.notice_names(args)? {
                    if name.eq_ignore_ascii_case(WARNINGS_NOTICE) {
                        self.notices.warnings = false;
                    } else {
                        return Err(XError::CannotDisableNotice(name));
                    }
                }
                false
            }
            "list_notices" => {
                check_args(args, &[])?;
                let rs: Box<dyn ResultSet> = Box::new(self.list_notices_result());
                self.write_results(vec![rs]).await?;
                false
            }
            _ => {
                return Err(XError::InvalidAdminCommand {
                    namespace: namespace.to_string(),
                    command,
                })
            }
        };
        self.finish_statement(ran_sql);
        Ok(())
    }

    /// String arguments naming known notices.
    fn notice_names(&self, args: &[Any]) -> Result<Vec<String>, XError> {
        args.iter()
            .enumerate()
            .map(|(position, arg)| {
                let name = string_arg(check_scalar_arg(arg, position, scalar::Type::VString)?);
                let known = name.eq_ignore_ascii_case(WARNINGS_NOTICE)
                    || FIXED_NOTICES.iter().any(|n| n.eq_ignore_ascii_case(&name));
                if known {
                    Ok(name)
                } else {
                    Err(XError::BadNotice(name))
                }
            })
            .collect()
    }

    fn list_notices_result(&self) -> VecResultSet {
        let columns = vec![
            text_column("notice"),
            ColumnInfo::computed("enabled", ColumnType::LongLong),
        ];
        let mut rows = vec![DataRow {
            values: vec![
                text(WARNINGS_NOTICE),
                DataValue::Int64(i64::from(self.notices.warnings)),
            ],
        }];
        rows.extend(FIXED_NOTICES.iter().map(|name| DataRow {
            values: vec![text(*name), DataValue::Int64(1)],
        }));
        VecResultSet::new(columns, rows)
    }

    /// Executes SQL on behalf of a command and drains its results.
    async fn run_sql(&mut self, sql: &str) -> Result<Vec<Vec<DataRow>>, XError> {
        debug!(client_id = self.id(), sql, "admin sql");
        let results = self.backend.execute(sql).await?;
        collect_rows(results).await
    }

    async fn query_rows(&mut self, sql: &str) -> Result<Vec<DataRow>, XError> {
        Ok(self.run_sql(sql).await?.into_iter().next().unwrap_or_default())
    }

    /// Names and kinds of the tables in `schema` (the current schema when
    /// empty), optionally narrowed by a `table_name` condition.
    async fn classify_objects(
        &mut self,
        schema: &str,
        name_filter: Option<&str>,
    ) -> Result<Vec<(String, ObjectKind)>, XError> {
        let schema_expr = if schema.is_empty() {
            "SCHEMA()".to_string()
        } else {
            quote_string(schema)
        };
        let name_cond = name_filter
            .map(|f| format!(" AND table_name {f}"))
            .unwrap_or_default();
        let tables = self
            .query_rows(&format!(
                "SELECT table_name, table_type FROM information_schema.tables \
                 WHERE table_schema = {schema_expr}{name_cond} ORDER BY table_name"
            ))
            .await?;
        let column_rows = self
            .query_rows(&format!(
                "SELECT table_name, column_name, data_type, generation_expression \
                 FROM information_schema.columns \
                 WHERE table_schema = {schema_expr}{name_cond} ORDER BY table_name, ordinal_position"
            ))
            .await?;

        let field = |row: &DataRow, idx: usize| {
            row.values
                .get(idx)
                .and_then(DataValue::to_text)
                .unwrap_or_default()
        };
        let mut columns: HashMap<String, Vec<CatalogColumn>> = HashMap::new();
        for row in &column_rows {
            columns.entry(field(row, 0)).or_default().push(CatalogColumn {
                name: field(row, 1),
                data_type: field(row, 2),
                generation_expression: field(row, 3),
            });
        }
        Ok(tables
            .iter()
            .map(|row| {
                let name = field(row, 0);
                let table_columns = columns.get(&name).map(Vec::as_slice).unwrap_or_default();
                let kind = classify_table(&field(row, 1), table_columns);
                (name, kind)
            })
            .collect())
    }

    async fn list_objects(&mut self, schema: &str, pattern: &str) -> Result<(), XError> {
        let show = if schema.is_empty() {
            "SHOW TABLES".to_string()
        } else {
            format!("SHOW TABLES FROM {}", quote_identifier(schema))
        };
        self.run_sql(&show).await?;
        let filter = (!pattern.is_empty()).then(|| format!("LIKE {}", quote_string(pattern)));
        let objects = self.classify_objects(schema, filter.as_deref()).await?;
        let rows = objects
            .into_iter()
            .map(|(name, kind)| DataRow {
                values: vec![text(name), text(kind.as_str())],
            })
            .collect();
        let rs: Box<dyn ResultSet> = Box::new(VecResultSet::new(
            vec![text_column("name"), text_column("type")],
            rows,
        ));
        self.write_results(vec![rs]).await
    }
}
