#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::connection::serve_connection;
    use crate::server::{serve, ServerContext};
    use mysqlx_core::auth::{encode_proof, scramble_password};
    use mysqlx_core::backend::Driver;
    use mysqlx_protocol::messages::{client, server};
    use mysqlx_protocol::proto::connection::{Capabilities, CapabilitiesSet, Capability};
    use mysqlx_protocol::proto::datatypes::{Any, Scalar};
    use mysqlx_protocol::proto::notice::session_state_changed::Parameter;
    use mysqlx_protocol::proto::notice::{Frame, SessionStateChanged, Warning};
    use mysqlx_protocol::proto::resultset::column_meta_data::FieldType;
    use mysqlx_protocol::proto::resultset::{ColumnMetaData, Row};
    use mysqlx_protocol::proto::server_error::Severity;
    use mysqlx_protocol::proto::session::{AuthenticateContinue, AuthenticateStart};
    use mysqlx_protocol::proto::sql::StmtExecute;
    use mysqlx_protocol::proto::{ServerError, ServerOk};
    use mysqlx_protocol::row::encode_sint;
    use mysqlx_sql::{MemoryDriver, MemoryEngine};
    use prost::Message;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream};
    use tokio::task::JoinHandle;

    const TIMEOUT: Duration = Duration::from_secs(5);

    const BASE_CONFIG: &str = r#"
[server]
listen_addr = "127.0.0.1:0"

[auth]
max_attempts = 3

[[auth.users]]
username = "root"
password_plain = "secret"

[[auth.users]]
username = "local"
host = "localhost"
auth_string = "*2470C0C06DEE42FD1618BB99005ADCA2EC9D1E19"
"#;

    type Received = (u8, Vec<u8>);

    fn config(extra_server: &str) -> Config {
        let toml = BASE_CONFIG.replace(
            "listen_addr = \"127.0.0.1:0\"",
            &format!("listen_addr = \"127.0.0.1:0\"\n{extra_server}"),
        );
        Config::from_toml(&toml).expect("config")
    }

    fn context(config: Config) -> Arc<ServerContext> {
        let store = config.credential_store().expect("credentials");
        let driver: Arc<dyn Driver> = Arc::new(MemoryDriver::new(Arc::new(MemoryEngine::new(store))));
        Arc::new(ServerContext::new(config, driver))
    }


    struct TestClient<S> {
        stream: S,
    }

    impl<S: AsyncRead + AsyncWrite + Unpin> TestClient<S> {
        async fn send_raw(&mut self, msg_type: u8, payload: &[u8]) {
            let mut buf = Vec::with_capacity(payload.len() + 5);
            buf.extend_from_slice(&((payload.len() + 1) as u32).to_le_bytes());
            buf.push(msg_type);
            buf.extend_from_slice(payload);
            self.stream.write_all(&buf).await.expect("send");
        }

        async fn send<M: Message>(&mut self, msg_type: u8, msg: &M) {
            self.send_raw(msg_type, &msg.encode_to_vec()).await;
        }

        async fn recv(&mut self) -> Received {
            tokio::time::timeout(TIMEOUT, async {
                let mut header = [0u8; 5];
                self.stream.read_exact(&mut header).await.expect("frame header");
                let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
                let mut payload = vec![0u8; len - 1];
                self.stream.read_exact(&mut payload).await.expect("frame payload");
                (header[4], payload)
            })
            .await
            .expect("frame within timeout")
        }

        async fn expect_closed(&mut self) {
            let mut byte = [0u8; 1];
            let read = tokio::time::timeout(TIMEOUT, self.stream.read(&mut byte))
                .await
                .expect("close within timeout");
            assert!(matches!(read, Ok(0) | Err(_)), "connection should be closed");
        }

        async fn handshake(&mut self) {
            self.send(
                client::CON_CAPABILITIES_SET,
                &caps_set("client.pwd_expire_ok", Any::scalar(Scalar::bool(true))),
            )
            .await;
            assert_eq!(self.recv().await.0, server::OK);
            self.send_raw(client::CON_CAPABILITIES_GET, &[]).await;
            assert_eq!(self.recv().await.0, server::CONN_CAPABILITIES);
            self.send(client::CON_CAPABILITIES_SET, &caps_set("tls", Any::scalar(Scalar::bool(true))))
                .await;
            assert_eq!(self.recv().await.0, server::OK);
        }

        async fn start(&mut self, mechanism: &str, auth_data: Option<Vec<u8>>) {
            let start = AuthenticateStart {
                mech_name: mechanism.to_string(),
                auth_data,
                initial_response: None,
            };
            self.send(client::SESS_AUTHENTICATE_START, &start).await;
        }

        /// Runs a MYSQL41 exchange and returns the frame that answered the proof.
        async fn mysql41(&mut self, schema: &str, user: &str, password: &str) -> Received {
            self.start("MYSQL41", None).await;
            let (tag, payload) = self.recv().await;
            assert_eq!(tag, server::SESS_AUTHENTICATE_CONTINUE);
            let salt = AuthenticateContinue::decode(&payload[..]).expect("salt").auth_data;
            let mut data = format!("{schema}\0{user}\0").into_bytes();
            data.extend(encode_proof(&scramble_password(password.as_bytes(), &salt)));
            self.send(
                client::SESS_AUTHENTICATE_CONTINUE,
                &AuthenticateContinue { auth_data: data },
            )
            .await;
            self.recv().await
        }

        /// Authenticates as root and returns the assigned client id.
        async fn login(&mut self) -> u64 {
            let notice = self.mysql41("", "root", "secret").await;
            let id = client_id(&notice);
            assert_eq!(self.recv().await.0, server::SESS_AUTHENTICATE_OK);
            id
        }

        async fn execute(&mut self, namespace: &str, stmt: &str, args: Vec<Any>) -> Vec<Received> {
            let msg = StmtExecute {
                namespace: Some(namespace.to_string()),
                stmt: stmt.as_bytes().to_vec(),
                args,
                compact_metadata: None,
            };
            self.send(client::SQL_STMT_EXECUTE, &msg).await;
            let mut frames = Vec::new();
            loop {
                let frame = self.recv().await;
                let done = matches!(frame.0, server::SQL_STMT_EXECUTE_OK | server::ERROR);
                frames.push(frame);
                if done {
                    return frames;
                }
            }
        }

        async fn sql(&mut self, stmt: &str) -> Vec<Received> {
            let frames = self.execute("sql", stmt, Vec::new()).await;
            assert_eq!(
                frames.last().map(|f| f.0),
                Some(server::SQL_STMT_EXECUTE_OK),
                "{stmt} failed: {:?}",
                frames.last().map(error_of)
            );
            frames
        }
    }

    fn connect(ctx: &Arc<ServerContext>) -> (TestClient<DuplexStream>, JoinHandle<()>) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let registration = ctx
            .registry
            .admit(Some("127.0.0.1".to_string()), usize::MAX)
            .expect("admitted");
        let task = tokio::spawn(serve_connection(Arc::clone(ctx), server, registration));
        (TestClient { stream: client }, task)
    }

    async fn ready_client(ctx: &Arc<ServerContext>) -> (TestClient<DuplexStream>, u64) {
        let (mut client, _task) = connect(ctx);
        client.handshake().await;
        let id = client.login().await;
        (client, id)
    }

    fn caps_set(name: &str, value: Any) -> CapabilitiesSet {
        CapabilitiesSet {
            capabilities: Some(Capabilities {
                capabilities: vec![Capability {
                    name: name.to_string(),
                    value: Some(value),
                }],
            }),
        }
    }

    fn error_of(frame: &Received) -> ServerError {
        assert_eq!(frame.0, server::ERROR, "expected an ERROR frame");
        ServerError::decode(&frame.1[..]).expect("server error")
    }

    fn is_fatal(err: &ServerError) -> bool {
        err.severity == Some(Severity::Fatal as i32)
    }

    fn state_change(frame: &Received) -> SessionStateChanged {
        assert_eq!(frame.0, server::NOTICE);
        let notice = Frame::decode(&frame.1[..]).expect("notice");
        assert_eq!(notice.r#type, 3);
        SessionStateChanged::decode(notice.payload.as_deref().unwrap_or_default())
            .expect("state change")
    }

    fn client_id(frame: &Received) -> u64 {
        let change = state_change(frame);
        assert_eq!(change.param, Parameter::ClientIdAssigned as i32);
        change
            .value
            .and_then(|v| v.v_unsigned_int)
            .expect("client id")
    }

    fn text_field(field: &[u8]) -> String {
        String::from_utf8_lossy(field.strip_suffix(&[0]).unwrap_or(field)).into_owned()
    }

    fn rows(frames: &[Received]) -> Vec<Vec<Vec<u8>>> {
        frames
            .iter()
            .filter(|f| f.0 == server::RESULTSET_ROW)
            .map(|f| Row::decode(&f.1[..]).expect("row").field)
            .collect()
    }

    fn tags(frames: &[Received]) -> Vec<u8> {
        frames.iter().map(|f| f.0).collect()
    }

    #[tokio::test]
    async fn handshake_replies_ok_capabilities_ok() {
        let ctx = context(config(""));
        let (mut client, _task) = connect(&ctx);
        client
            .send(
                client::CON_CAPABILITIES_SET,
                &caps_set("client.pwd_expire_ok", Any::scalar(Scalar::bool(true))),
            )
            .await;
        let ok = client.recv().await;
        assert_eq!(ok.0, server::OK);
        assert!(ServerOk::decode(&ok.1[..]).is_ok());

        client.send_raw(client::CON_CAPABILITIES_GET, &[]).await;
        let (tag, payload) = client.recv().await;
        assert_eq!(tag, server::CONN_CAPABILITIES);
        let caps = Capabilities::decode(&payload[..]).expect("capabilities");
        let names: Vec<_> = caps.capabilities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["authentication.mechanisms", "doc.formats", "node_type", "client.pwd_expire_ok"]
        );
        let mechanisms: Vec<String> = caps.capabilities[0]
            .value
            .as_ref()
            .and_then(|v| v.array.as_ref())
            .map(|a| a.value.iter().filter_map(|v| v.as_scalar()).map(|s| s.display_value()).collect())
            .unwrap_or_default();
        assert_eq!(mechanisms, vec!["MYSQL41", "PLAIN"]);

        client
            .send(client::CON_CAPABILITIES_SET, &caps_set("tls", Any::scalar(Scalar::bool(true))))
            .await;
        assert_eq!(client.recv().await.0, server::OK);
    }

    #[tokio::test]
    async fn malformed_first_capability_set_aborts_without_ok() {
        let ctx = context(config(""));
        let bad_sets = vec![
            caps_set("client.pwd_expire", Any::scalar(Scalar::bool(true))),
            caps_set("client.pwd_expire_ok", Any::scalar(Scalar::uint(1))),
            caps_set("client.pwd_expire_ok", Any::scalar(Scalar::bool(false))),
            caps_set("client.pwd_expire_ok", Any::array(vec![])),
            CapabilitiesSet { capabilities: None },
        ];
        for set in bad_sets {
            let (mut client, task) = connect(&ctx);
            client.send(client::CON_CAPABILITIES_SET, &set).await;
            let err = error_of(&client.recv().await);
            assert_eq!(err.code, 5000);
            assert!(is_fatal(&err));
            client.expect_closed().await;
            task.await.expect("connection task");
        }

        let (mut client, _task) = connect(&ctx);
        client.send_raw(client::CON_CAPABILITIES_GET, &[]).await;
        assert_eq!(error_of(&client.recv().await).code, 5000);
        client.expect_closed().await;
    }

    #[tokio::test]
    async fn authentication_before_handshake_is_rejected() {
        let ctx = context(config(""));
        let (mut client, task) = connect(&ctx);
        client.start("MYSQL41", None).await;
        let err = error_of(&client.recv().await);
        assert_eq!(err.code, 5000);
        assert!(is_fatal(&err));
        client.expect_closed().await;
        task.await.expect("connection task");
        assert_eq!(ctx.registry.len(), 0);
    }

    #[tokio::test]
    async fn out_of_order_phase_after_pwd_expire_ok_is_rejected() {
        let ctx = context(config(""));
        let pwd_expire_ok = caps_set("client.pwd_expire_ok", Any::scalar(Scalar::bool(true)));

        let (mut client, _task) = connect(&ctx);
        client.send(client::CON_CAPABILITIES_SET, &pwd_expire_ok).await;
        assert_eq!(client.recv().await.0, server::OK);
        client.start("MYSQL41", None).await;
        let err = error_of(&client.recv().await);
        assert_eq!(err.code, 5000);
        assert!(is_fatal(&err));
        client.expect_closed().await;

        let (mut client, _task) = connect(&ctx);
        client.send(client::CON_CAPABILITIES_SET, &pwd_expire_ok).await;
        assert_eq!(client.recv().await.0, server::OK);
        client.send(client::CON_CAPABILITIES_SET, &pwd_expire_ok).await;
        let err = error_of(&client.recv().await);
        assert_eq!(err.code, 5000);
        assert!(is_fatal(&err));
        client.expect_closed().await;
    }

    #[tokio::test]
    async fn rejected_tls_phase_reports_prepare_failure() {
        let ctx = context(config(""));
        let (mut client, _task) = connect(&ctx);
        client
            .send(
                client::CON_CAPABILITIES_SET,
                &caps_set("client.pwd_expire_ok", Any::scalar(Scalar::bool(true))),
            )
            .await;
        assert_eq!(client.recv().await.0, server::OK);
        client.send_raw(client::CON_CAPABILITIES_GET, &[]).await;
        assert_eq!(client.recv().await.0, server::CONN_CAPABILITIES);
        client
            .send(client::CON_CAPABILITIES_SET, &caps_set("tls", Any::scalar(Scalar::string("yes"))))
            .await;
        let err = error_of(&client.recv().await);
        assert_eq!(err.code, 5001);
        assert_eq!(err.msg, "Capability prepare failed for 'tls'");
        client.expect_closed().await;
    }

    #[tokio::test]
    async fn select_one_end_to_end() {
        let ctx = context(config(""));
        let (mut client, _task) = connect(&ctx);
        client.handshake().await;

        let notice = client.mysql41("", "root", "secret").await;
        assert_eq!(client_id(&notice), 1);
        assert_eq!(client.recv().await.0, server::SESS_AUTHENTICATE_OK);

        let frames = client.sql("SELECT 1").await;
        assert_eq!(
            tags(&frames),
            vec![
                server::RESULTSET_COLUMN_META_DATA,
                server::RESULTSET_ROW,
                server::RESULTSET_FETCH_DONE,
                server::SQL_STMT_EXECUTE_OK,
            ]
        );
        let meta = ColumnMetaData::decode(&frames[0].1[..]).expect("meta");
        assert_eq!(meta.r#type, FieldType::Sint as i32);
        assert_eq!(rows(&frames), vec![vec![encode_sint(1)]]);
    }

    #[tokio::test]
    async fn mysql41_second_start_is_out_of_order() {
        let ctx = context(config(""));
        let (mut client, _task) = connect(&ctx);
        client.handshake().await;
        client.start("MYSQL41", None).await;
        assert_eq!(client.recv().await.0, server::SESS_AUTHENTICATE_CONTINUE);
        client.start("MYSQL41", None).await;
        let err = error_of(&client.recv().await);
        assert_eq!(err.code, 1156);
        assert!(!is_fatal(&err));

        client
            .send(
                client::SESS_AUTHENTICATE_CONTINUE,
                &AuthenticateContinue {
                    auth_data: b"\0root\0".to_vec(),
                },
            )
            .await;
        assert_eq!(error_of(&client.recv().await).code, 1156);

        client.login().await;
    }

    #[tokio::test]
    async fn failed_authentication_can_be_retried() {
        let ctx = context(config(""));
        let (mut client, _task) = connect(&ctx);
        client.handshake().await;
        let err = error_of(&client.mysql41("", "root", "wrong").await);
        assert_eq!(err.code, 1045);
        assert_eq!(err.sql_state, "28000");
        assert!(!is_fatal(&err));

        let id = client.login().await;
        assert_eq!(id, 1);
        client.sql("SELECT 1").await;
    }

    #[tokio::test]
    async fn exhausting_attempts_closes_the_connection() {
        let ctx = context(config(""));
        let (mut client, task) = connect(&ctx);
        client.handshake().await;
        for attempt in 1..=3 {
            let err = error_of(&client.mysql41("", "root", "wrong").await);
            assert_eq!(err.code, 1045);
            assert_eq!(is_fatal(&err), attempt == 3);
        }
        client.expect_closed().await;
        task.await.expect("connection task");
        assert_eq!(ctx.registry.len(), 0);
    }

    #[tokio::test]
    async fn host_restricted_account_and_auth_string() {
        let ctx = context(config(""));
        let (mut client, _task) = connect(&ctx);
        client.handshake().await;
        // "local" is limited to localhost, which covers 127.0.0.1.
        let notice = client.mysql41("", "local", "password").await;
        assert_eq!(notice.0, server::NOTICE);
        assert_eq!(client.recv().await.0, server::SESS_AUTHENTICATE_OK);
    }

    #[tokio::test]
    async fn unknown_mechanism_keeps_the_connection() {
        let ctx = context(config(""));
        let (mut client, _task) = connect(&ctx);
        client.handshake().await;
        client.start("SHA256_MEMORY", None).await;
        let err = error_of(&client.recv().await);
        assert_eq!(err.code, 1251);
        assert!(!is_fatal(&err));
        client.login().await;
    }

    #[tokio::test]
    async fn plain_authentication_selects_schema() {
        let ctx = context(config(""));
        let (mut setup, _) = ready_client(&ctx).await;
        setup.sql("CREATE SCHEMA app").await;

        let (mut client, _task) = connect(&ctx);
        client.handshake().await;
        client.start("PLAIN", Some(b"app\0root\0secret".to_vec())).await;
        assert_eq!(client.recv().await.0, server::NOTICE);
        assert_eq!(client.recv().await.0, server::SESS_AUTHENTICATE_OK);
        let frames = client.sql("SELECT DATABASE()").await;
        assert_eq!(text_field(&rows(&frames)[0][0]), "app");
    }

    #[tokio::test]
    async fn unknown_default_schema_fails_authentication() {
        let ctx = context(config(""));
        let (mut client, _task) = connect(&ctx);
        client.handshake().await;
        let err = error_of(&client.mysql41("missing", "root", "secret").await);
        assert_eq!(err.code, 1049);
        client.login().await;
    }

    #[tokio::test]
    async fn statement_before_authentication_is_fatal() {
        let ctx = context(config(""));
        let (mut client, _task) = connect(&ctx);
        client.handshake().await;
        let frames = client.execute("sql", "SELECT 1", Vec::new()).await;
        let err = error_of(&frames[0]);
        assert_eq!(err.code, 5000);
        assert!(is_fatal(&err));
        client.expect_closed().await;
    }

    #[tokio::test]
    async fn continue_without_start_is_out_of_order() {
        let ctx = context(config(""));
        let (mut client, _task) = connect(&ctx);
        client.handshake().await;
        client
            .send(
                client::SESS_AUTHENTICATE_CONTINUE,
                &AuthenticateContinue {
                    auth_data: b"\0root\0".to_vec(),
                },
            )
            .await;
        assert_eq!(error_of(&client.recv().await).code, 1156);
        client.login().await;
    }

    #[tokio::test]
    async fn kill_client_checks_arguments_and_closes_target() {
        let ctx = context(config(""));
        let (mut admin, _) = ready_client(&ctx).await;
        let (mut victim, victim_id) = ready_client(&ctx).await;

        let frames = admin.execute("mysqlx", "kill_client", Vec::new()).await;
        let err = error_of(&frames[0]);
        assert_eq!(err.code, 5015);
        assert_eq!(err.msg, "Invalid number of arguments, expected 1 but got 0");

        let frames = admin
            .execute("mysqlx", "kill_client", vec![Any::scalar(Scalar::string("2"))])
            .await;
        let err = error_of(&frames[0]);
        assert_eq!(err.code, 5016);
        assert_eq!(err.msg, "Invalid type for argument '2' at #0 (should be V_UINT)");

        let frames = admin
            .execute("mysqlx", "kill_client", vec![Any::scalar(Scalar::uint(999))])
            .await;
        assert_eq!(error_of(&frames[0]).code, 1094);

        let frames = admin
            .execute("mysqlx", "kill_client", vec![Any::scalar(Scalar::uint(victim_id))])
            .await;
        assert_eq!(tags(&frames), vec![server::SQL_STMT_EXECUTE_OK]);

        victim.expect_closed().await;
        let victim_id = u32::try_from(victim_id).expect("id");
        tokio::time::timeout(TIMEOUT, async {
            while ctx.registry.get(victim_id).is_some() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("victim deregistered");
        let frames = admin.execute("mysqlx", "list_clients", Vec::new()).await;
        assert_eq!(rows(&frames).len(), 1);
    }

    #[tokio::test]
    async fn list_clients_reports_authenticated_users() {
        let ctx = context(config(""));
        let (mut client, id) = ready_client(&ctx).await;
        let (mut pending, _task) = connect(&ctx);
        pending.handshake().await;
        let frames = client.execute("mysqlx", "list_clients", Vec::new()).await;
        let listed = rows(&frames);
        assert_eq!(listed.len(), 2);
        let me = listed
            .iter()
            .find(|r| r[0] == mysqlx_protocol::row::encode_uint(id))
            .expect("own row");
        assert_eq!(text_field(&me[1]), "root");
        assert_eq!(text_field(&me[2]), "127.0.0.1");
    }

    #[tokio::test]
    async fn list_objects_distinguishes_tables_and_collections() {
        let ctx = context(config(""));
        let (mut client, _) = ready_client(&ctx).await;
        client.sql("CREATE SCHEMA app").await;
        client.sql("CREATE TABLE app.plain (id INT PRIMARY KEY, name VARCHAR(20))").await;
        let string = |s: &str| Any::scalar(Scalar::string(s));
        let frames = client
            .execute("mysqlx", "create_collection", vec![string("app"), string("docs")])
            .await;
        assert_eq!(frames.last().map(|f| f.0), Some(server::SQL_STMT_EXECUTE_OK));

        let frames = client
            .execute("mysqlx", "list_objects", vec![string("app"), string("")])
            .await;
        let listed: Vec<(String, String)> = rows(&frames)
            .iter()
            .map(|r| (text_field(&r[0]), text_field(&r[1])))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("docs".to_string(), "COLLECTION".to_string()),
                ("plain".to_string(), "TABLE".to_string()),
            ]
        );

        let frames = client
            .execute("mysqlx", "list_objects", vec![string("app"), string("pl%")])
            .await;
        assert_eq!(rows(&frames).len(), 1);

        let frames = client
            .execute("mysqlx", "list_objects", vec![string("nope"), string("")])
            .await;
        assert_eq!(error_of(frames.last().expect("frame")).code, 1049);
    }

    #[tokio::test]
    async fn collection_commands() {
        let ctx = context(config(""));
        let (mut client, _) = ready_client(&ctx).await;
        client.sql("CREATE SCHEMA app").await;
        client.sql("CREATE TABLE app.plain (id INT)").await;
        let string = |s: &str| Any::scalar(Scalar::string(s));

        let ok = client
            .execute("mysqlx", "ensure_collection", vec![string("app"), string("docs")])
            .await;
        assert_eq!(ok.last().map(|f| f.0), Some(server::SQL_STMT_EXECUTE_OK));
        let again = client
            .execute("mysqlx", "ensure_collection", vec![string("app"), string("docs")])
            .await;
        assert_eq!(again.last().map(|f| f.0), Some(server::SQL_STMT_EXECUTE_OK));

        let frames = client
            .execute("mysqlx", "ensure_collection", vec![string("app"), string("plain")])
            .await;
        assert_eq!(error_of(&frames[0]).code, 5156);

        let frames = client
            .execute("mysqlx", "drop_collection", vec![string(""), string("docs")])
            .await;
        assert_eq!(error_of(&frames[0]).code, 5112);
        let frames = client
            .execute("mysqlx", "drop_collection", vec![string("app"), string("")])
            .await;
        assert_eq!(error_of(&frames[0]).code, 5113);
        let frames = client
            .execute("mysqlx", "drop_collection", vec![string("app"), string("docs")])
            .await;
        assert_eq!(frames.last().map(|f| f.0), Some(server::SQL_STMT_EXECUTE_OK));

        let frames = client
            .execute("mysqlx", "create_collection_index", vec![string("app")])
            .await;
        assert_eq!(error_of(&frames[0]).code, 3152);
    }

    #[tokio::test]
    async fn namespaces_are_routed() {
        let ctx = context(config(""));
        let (mut client, _) = ready_client(&ctx).await;

        let frames = client.execute("mysqlx", "ping", Vec::new()).await;
        assert_eq!(tags(&frames), vec![server::SQL_STMT_EXECUTE_OK]);

        let frames = client.execute("xplugin", "ping", Vec::new()).await;
        assert_eq!(tags(&frames), vec![server::NOTICE, server::SQL_STMT_EXECUTE_OK]);
        let notice = Frame::decode(&frames[0].1[..]).expect("notice");
        let warning = Warning::decode(notice.payload.as_deref().unwrap_or_default()).expect("warning");
        assert_eq!(warning.code, 1287);

        let frames = client.execute("mysqlx", "bogus", Vec::new()).await;
        let err = error_of(&frames[0]);
        assert_eq!(err.code, 5157);
        assert_eq!(err.msg, "Invalid mysqlx command bogus");

        let frames = client.execute("nosql", "SELECT 1", Vec::new()).await;
        let err = error_of(&frames[0]);
        assert_eq!(err.code, 5162);
        assert!(!is_fatal(&err));

        client.sql("SELECT 1").await;
    }

    #[tokio::test]
    async fn crud_and_unknown_messages_are_not_fatal() {
        let ctx = context(config(""));
        let (mut client, _) = ready_client(&ctx).await;
        client.send_raw(client::CRUD_FIND, &[]).await;
        assert_eq!(error_of(&client.recv().await).code, 1235);
        client.send_raw(99, &[]).await;
        let err = error_of(&client.recv().await);
        assert_eq!(err.code, 5000);
        assert!(!is_fatal(&err));
        client.sql("SELECT 1").await;
    }

    #[tokio::test]
    async fn insert_reports_id_and_affected_rows() {
        let ctx = context(config(""));
        let (mut client, _) = ready_client(&ctx).await;
        client.sql("CREATE SCHEMA app").await;
        client
            .sql("CREATE TABLE app.t (id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY, v INT)")
            .await;
        let frames = client.sql("INSERT INTO app.t (v) VALUES (1), (2)").await;
        assert_eq!(
            tags(&frames),
            vec![server::NOTICE, server::NOTICE, server::SQL_STMT_EXECUTE_OK]
        );
        let insert_id = state_change(&frames[0]);
        assert_eq!(insert_id.param, Parameter::GeneratedInsertId as i32);
        assert_eq!(insert_id.value.and_then(|v| v.v_unsigned_int), Some(1));
        let affected = state_change(&frames[1]);
        assert_eq!(affected.param, Parameter::RowsAffected as i32);
        assert_eq!(affected.value.and_then(|v| v.v_unsigned_int), Some(2));

        // Commands that never reach the backend must not repeat the counters.
        let frames = client.execute("mysqlx", "ping", Vec::new()).await;
        assert_eq!(tags(&frames), vec![server::SQL_STMT_EXECUTE_OK]);
        let frames = client.execute("mysqlx", "list_notices", Vec::new()).await;
        assert!(!tags(&frames).contains(&server::NOTICE));
        let frames = client.sql("SELECT 1").await;
        assert!(!tags(&frames).contains(&server::NOTICE));
    }

    #[tokio::test]
    async fn notices_can_be_toggled_and_listed() {
        let ctx = context(config(""));
        let (mut client, _) = ready_client(&ctx).await;
        let string = |s: &str| Any::scalar(Scalar::string(s));

        client.sql("CREATE SCHEMA s").await;
        let frames = client.sql("CREATE SCHEMA IF NOT EXISTS s").await;
        assert_eq!(tags(&frames), vec![server::NOTICE, server::SQL_STMT_EXECUTE_OK]);

        let frames = client
            .execute("mysqlx", "disable_notices", vec![string("warnings")])
            .await;
        assert_eq!(tags(&frames), vec![server::SQL_STMT_EXECUTE_OK]);
        let frames = client.sql("CREATE SCHEMA IF NOT EXISTS s").await;
        assert_eq!(tags(&frames), vec![server::SQL_STMT_EXECUTE_OK]);

        let frames = client.execute("mysqlx", "list_notices", Vec::new()).await;
        let listed = rows(&frames);
        assert_eq!(text_field(&listed[0][0]), "warnings");
        assert_eq!(listed[0][1], encode_sint(0));
        assert_eq!(listed.len(), 5);

        let frames = client
            .execute("mysqlx", "disable_notices", vec![string("rows_affected")])
            .await;
        assert_eq!(error_of(&frames[0]).code, 5164);
        let frames = client
            .execute("mysqlx", "enable_notices", vec![string("bogus")])
            .await;
        assert_eq!(error_of(&frames[0]).code, 5163);
        let frames = client
            .execute("mysqlx", "enable_notices", vec![string("warnings"), string("rows_affected")])
            .await;
        assert_eq!(tags(&frames), vec![server::SQL_STMT_EXECUTE_OK]);
    }

    #[tokio::test]
    async fn session_reset_requires_new_authentication() {
        let ctx = context(config(""));
        let (mut client, _) = ready_client(&ctx).await;
        client.send_raw(client::SESS_RESET, &[]).await;
        assert_eq!(client.recv().await.0, server::OK);
        client.login().await;
        client.sql("SELECT 1").await;
    }

    #[tokio::test]
    async fn session_close_says_goodbye() {
        let ctx = context(config(""));
        let (mut client, _) = ready_client(&ctx).await;
        client.send_raw(client::SESS_CLOSE, &[]).await;
        let (tag, payload) = client.recv().await;
        assert_eq!(tag, server::OK);
        assert_eq!(
            ServerOk::decode(&payload[..]).expect("ok").msg.as_deref(),
            Some("bye!")
        );
        client.expect_closed().await;
    }

    #[tokio::test]
    async fn oversized_frame_is_fatal() {
        let ctx = context(config("max_packet_size = 64"));
        let (mut client, _) = ready_client(&ctx).await;
        client.send_raw(client::SQL_STMT_EXECUTE, &[0u8; 128]).await;
        let err = error_of(&client.recv().await);
        assert!(is_fatal(&err));
        client.expect_closed().await;
    }

    #[tokio::test]
    async fn connection_limit_rejects_extra_clients() {
        let ctx = context(config("max_connections = 1"));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = tokio::spawn(serve(listener, Arc::clone(&ctx)));

        let first = tokio::net::TcpStream::connect(addr).await.expect("connect");
        let mut first = TestClient { stream: first };
        first.handshake().await;

        let second = tokio::net::TcpStream::connect(addr).await.expect("connect");
        let mut second = TestClient { stream: second };
        let err = error_of(&second.recv().await);
        assert_eq!(err.code, 1040);
        assert!(is_fatal(&err));

        ctx.stop_listener();
        tokio::time::timeout(TIMEOUT, server)
            .await
            .expect("listener stops")
            .expect("join")
            .expect("serve");
    }

    #[tokio::test]
    async fn queued_connections_respect_the_limit() {
        let ctx = context(config("max_connections = 1"));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let mut clients = Vec::new();
        for _ in 0..5 {
            let stream = tokio::net::TcpStream::connect(addr).await.expect("connect");
            clients.push(TestClient { stream });
        }
        let server = tokio::spawn(serve(listener, Arc::clone(&ctx)));

        let mut rejected = 0;
        for client in &mut clients {
            let mut header = [0u8; 5];
            let read = tokio::time::timeout(
                Duration::from_millis(500),
                client.stream.read_exact(&mut header),
            )
            .await;
            if let Ok(Ok(_)) = read {
                let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
                let mut payload = vec![0u8; len - 1];
                client.stream.read_exact(&mut payload).await.expect("payload");
                assert_eq!(error_of(&(header[4], payload)).code, 1040);
                rejected += 1;
            }
        }
        assert_eq!(rejected, 4);
        assert_eq!(ctx.registry.len(), 1);

        ctx.stop_listener();
        tokio::time::timeout(TIMEOUT, server)
            .await
            .expect("listener stops")
            .expect("join")
            .expect("serve");
    }

    #[test]
    fn config_defaults_and_validation() {
        let cfg = config("");
        assert_eq!(cfg.server.max_connections, 1024);
        assert_eq!(cfg.server.max_packet_size, 64 * 1024 * 1024);
        assert_eq!(cfg.auth.max_attempts, 3);
        assert_eq!(cfg.auth.users[0].host, "%");
        assert!(!cfg.metrics.enabled);
        assert_eq!(cfg.metrics.listen_addr, "127.0.0.1:9898");

        let no_users = "[server]\nlisten_addr = \"127.0.0.1:33060\"\n";
        assert!(Config::from_toml(no_users).is_err());
        let skip = format!("{no_users}[auth]\nskip_auth = true\n");
        assert!(Config::from_toml(&skip).is_ok());

        let both = format!(
            "{no_users}[[auth.users]]\nusername = \"u\"\npassword_plain = \"p\"\nauth_string = \"*14E65567ABDB5135D0CFD9A70B3032C179A49EE7\"\n"
        );
        assert!(Config::from_toml(&both).is_err());
        let malformed = format!("{no_users}[[auth.users]]\nusername = \"u\"\nauth_string = \"abc\"\n");
        assert!(Config::from_toml(&malformed).is_err());
        let tiny = "[server]\nlisten_addr = \"x\"\nmax_packet_size = 8\n[auth]\nskip_auth = true\n";
        assert!(Config::from_toml(tiny).is_err());
    }

    #[tokio::test]
    async fn skip_auth_accepts_any_credentials() {
        let cfg = Config::from_toml(
            "[server]\nlisten_addr = \"127.0.0.1:0\"\n[auth]\nskip_auth = true\n",
        )
        .expect("config");
        let ctx = context(cfg);
        let (mut client, _task) = connect(&ctx);
        client.handshake().await;
        let notice = client.mysql41("", "anyone", "whatever").await;
        assert_eq!(notice.0, server::NOTICE);
        assert_eq!(client.recv().await.0, server::SESS_AUTHENTICATE_OK);
    }
}
