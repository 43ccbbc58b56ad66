use crate::connection::Connection;
use metrics::counter;
use mysqlx_core::backend::{ResultSet, SqlWarning, WarningLevel};
use mysqlx_core::error::XError;
use mysqlx_protocol::notice;
use mysqlx_protocol::proto::sql::StmtExecute;
use mysqlx_protocol::resultset::write_result_set;
use mysqlx_protocol::{BackendMessage, FrontendMessage};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

pub const NAMESPACE_SQL: &str = "sql";
pub const NAMESPACE_MYSQLX: &str = "mysqlx";
pub const NAMESPACE_XPLUGIN: &str = "xplugin";

const ER_WARN_DEPRECATED_SYNTAX: u16 = 1287;

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Routes a message received once the session is ready.
    pub(crate) async fn dispatch(&mut self, msg: FrontendMessage) -> Result<(), XError> {
        match msg {
            FrontendMessage::StmtExecute(stmt) => self.stmt_execute(stmt).await,
            FrontendMessage::Crud { code } => Err(XError::NotSupported(format!(
                "X Protocol message type {code}"
            ))),
            FrontendMessage::Unsupported { code } => Err(XError::BadMessage(format!(
                "Unexpected message type {code} received"
            ))),
            other => Err(XError::BadMessage(format!(
                "Unexpected message {} received",
                other.name()
            ))),
        }
    }

    async fn stmt_execute(&mut self, stmt: StmtExecute) -> Result<(), XError> {
        let namespace = stmt.namespace().to_string();
        counter!("mysqlx_stmt_execute_total", "namespace" => namespace.clone()).increment(1);
        let executed = match namespace.as_str() {
            "" | NAMESPACE_SQL => self.execute_sql(&stmt.stmt).await,
            NAMESPACE_MYSQLX => self.execute_admin(&namespace, &stmt).await,
            NAMESPACE_XPLUGIN => {
                self.warn_deprecated_namespace();
                self.execute_admin(&namespace, &stmt).await
            }
            other => Err(XError::UnknownNamespace(other.to_string())),
        };
        if executed.is_err() {
            counter!("mysqlx_stmt_error_total").increment(1);
            self.backend.take_warnings();
        }
        executed
    }

    fn warn_deprecated_namespace(&mut self) {
        if !self.notices.warnings {
            return;
        }
        let warning = SqlWarning {
            level: WarningLevel::Warning,
            code: ER_WARN_DEPRECATED_SYNTAX,
            message: format!(
                "Namespace '{NAMESPACE_XPLUGIN}' is deprecated, please use '{NAMESPACE_MYSQLX}' instead"
            ),
        };
        self.io
            .write_message(BackendMessage::Notice(notice::warning(&warning)));
    }

    async fn execute_sql(&mut self, stmt: &[u8]) -> Result<(), XError> {
        let sql = std::str::from_utf8(stmt)
            .map_err(|_| XError::BadMessage("statement is not valid UTF-8".into()))?;
        if self.ctx.config.server.audit {
            info!(
                target: "audit",
                client_id = self.id(),
                user = %self.handle.user().unwrap_or_default(),
                sql = sql
            );
        }
        debug!(client_id = self.id(), sql, "executing statement");
        let results = self.backend.execute(sql).await?;
        self.write_results(results).await?;
        self.finish_statement(true);
        Ok(())
    }

    /// Streams every result set; on failure the remaining ones are closed
    /// unread.
    pub(crate) async fn write_results(
        &mut self,
        results: Vec<Box<dyn ResultSet>>,
    ) -> Result<(), XError> {
        let mut pending = results.into_iter();
        while let Some(mut rs) = pending.next() {
            if let Err(err) = write_result_set(&mut self.io, rs.as_mut()).await {
                for mut rest in pending {
                    if let Err(close_err) = rest.close().await {
                        warn!(client_id = self.id(), error = %close_err, "result set close failed");
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Session-state notices for the statement, then `SQL_STMT_EXECUTE_OK`.
    ///
    /// The backend counters describe its last `execute`, so they are only
    /// reported when this statement reached the backend.
    pub(crate) fn finish_statement(&mut self, ran_sql: bool) {
        if ran_sql {
            let insert_id = self.backend.last_insert_id();
            if insert_id > 0 {
                self.io
                    .write_message(BackendMessage::Notice(notice::generated_insert_id(insert_id)));
            }
            let affected = self.backend.affected_rows();
            if affected > 0 {
                self.io
                    .write_message(BackendMessage::Notice(notice::rows_affected(affected)));
            }
        }
        let warnings = self.backend.take_warnings();
        if self.notices.warnings {
            for warning in &warnings {
                self.io
                    .write_message(BackendMessage::Notice(notice::warning(warning)));
            }
        }
        self.io.write_message(BackendMessage::StmtExecuteOk);
    }
}
