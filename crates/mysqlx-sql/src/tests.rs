#[cfg(test)]
mod tests {
    use crate::executor::like_match;
    use crate::parser::parse_sql;
    use crate::planner::{plan_statement, Plan};
    use crate::users::host_matches;
    use crate::{CredentialStore, MemoryDriver, MemoryEngine, UserAccount};
    use mysqlx_core::auth::{native_password_hash, scramble_password, SALT_LEN};
    use mysqlx_core::backend::{collect_rows, Driver, QueryContext, UserIdentity};
    use mysqlx_core::catalog::{classify_table, CatalogColumn, ObjectKind};
    use mysqlx_core::types::{flags, ColumnInfo, ColumnType, DataRow, DataValue};
    use std::sync::Arc;

    fn engine() -> Arc<MemoryEngine> {
        Arc::new(MemoryEngine::new(CredentialStore::default()))
    }

    async fn open(engine: &Arc<MemoryEngine>, db: Option<&str>) -> Box<dyn QueryContext> {
        MemoryDriver::new(engine.clone())
            .open(7, 0, 45, db)
            .await
            .expect("open")
    }

    async fn query(ctx: &mut Box<dyn QueryContext>, sql: &str) -> (Vec<ColumnInfo>, Vec<DataRow>) {
        let mut results = ctx.execute(sql).await.expect("execute");
        assert_eq!(results.len(), 1, "expected one result set for {sql}");
        let rs = results.remove(0);
        let columns = rs.columns().to_vec();
        let rows = collect_rows(vec![rs]).await.expect("rows").remove(0);
        (columns, rows)
    }

    #[tokio::test]
    async fn create_insert_select_flow() {
        let engine = engine();
        let mut ctx = open(&engine, None).await;

        ctx.execute("CREATE SCHEMA app").await.expect("schema");
        ctx.execute("USE app").await.expect("use");
        assert_eq!(ctx.current_db().as_deref(), Some("app"));

        let results = ctx
            .execute("CREATE TABLE users (id INT, name VARCHAR(20))")
            .await
            .expect("create");
        assert!(results.is_empty());
        ctx.execute("INSERT INTO users (id, name) VALUES (1, 'alice'), (2, 'bob')")
            .await
            .expect("insert");
        assert_eq!(ctx.affected_rows(), 2);

        let (columns, rows) = query(&mut ctx, "SELECT * FROM users").await;
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].name, "id");
        assert_eq!(columns[0].schema, "app");
        assert_eq!(columns[0].table, "users");
        assert_eq!(columns[1].column_type, ColumnType::VarString);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].values[1], DataValue::String("bob".into()));
    }

    #[tokio::test]
    async fn where_order_and_limit() {
        let engine = engine();
        let mut ctx = open(&engine, None).await;
        ctx.execute("CREATE DATABASE shop").await.expect("db");
        ctx.execute("CREATE TABLE shop.items (id INT, label TEXT, price DOUBLE)")
            .await
            .expect("create");
        ctx.execute(
            "INSERT INTO shop.items VALUES (1, 'apple', 1.5), (2, 'banana', 0.5), (3, 'cherry', 3), (4, NULL, 2)",
        )
        .await
        .expect("insert");

        let (columns, rows) = query(
            &mut ctx,
            "SELECT label AS l, id FROM shop.items WHERE price > 1 ORDER BY id DESC LIMIT 2",
        )
        .await;
        assert_eq!(columns[0].name, "l");
        assert_eq!(columns[0].org_name, "label");
        let ids: Vec<_> = rows.iter().map(|r| r.values[1].clone()).collect();
        assert_eq!(ids, vec![DataValue::Int64(4), DataValue::Int64(3)]);

        let (_, rows) = query(
            &mut ctx,
            "SELECT id FROM shop.items WHERE label LIKE 'b%' OR label IS NULL ORDER BY 1",
        )
        .await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values[0], DataValue::Int64(2));

        let (_, rows) = query(&mut ctx, "SELECT id FROM shop.items WHERE label != 'apple' AND id < 3").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values[0], DataValue::Int64(2));
    }

    #[tokio::test]
    async fn explicit_max_auto_increment_value_is_accepted() {
        let engine = engine();
        let mut ctx = open(&engine, None).await;
        ctx.execute("CREATE SCHEMA app").await.expect("schema");
        ctx.execute("CREATE TABLE app.t (id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY)")
            .await
            .expect("create");
        ctx.execute("INSERT INTO app.t (id) VALUES (18446744073709551615)")
            .await
            .expect("insert max id");
        assert_eq!(ctx.last_insert_id(), 0);
        assert_eq!(ctx.affected_rows(), 1);
        let (_, rows) = query(&mut ctx, "SELECT id FROM app.t").await;
        assert_eq!(rows[0].values[0], DataValue::UInt64(u64::MAX));
    }

    #[tokio::test]
    async fn auto_increment_sets_last_insert_id() {
        let engine = engine();
        let mut ctx = open(&engine, None).await;
        ctx.execute("CREATE SCHEMA app").await.expect("schema");
        ctx.execute(
            "CREATE TABLE app.t (id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY, name VARCHAR(10))",
        )
        .await
        .expect("create");
        ctx.execute("INSERT INTO app.t (name) VALUES ('a'), ('b')")
            .await
            .expect("insert");
        assert_eq!(ctx.last_insert_id(), 1);
        assert_eq!(ctx.affected_rows(), 2);

        ctx.execute("INSERT INTO app.t (id, name) VALUES (10, 'c')")
            .await
            .expect("explicit id");
        assert_eq!(ctx.last_insert_id(), 0);
        ctx.execute("INSERT INTO app.t (name) VALUES ('d')")
            .await
            .expect("insert");
        assert_eq!(ctx.last_insert_id(), 11);

        let (columns, rows) = query(&mut ctx, "SELECT id FROM app.t ORDER BY id").await;
        assert!(columns[0].is_unsigned());
        assert_ne!(columns[0].flags & flags::PRI_KEY, 0);
        assert_ne!(columns[0].flags & flags::AUTO_INCREMENT, 0);
        assert_eq!(rows[0].values[0], DataValue::UInt64(1));
        assert_eq!(rows[3].values[0], DataValue::UInt64(11));
    }

    #[tokio::test]
    async fn generated_columns_describe_a_collection() {
        let engine = engine();
        let mut ctx = open(&engine, None).await;
        ctx.execute("CREATE SCHEMA docs").await.expect("schema");
        ctx.execute(
            "CREATE TABLE `docs`.`people` (doc JSON, _id VARCHAR(32) GENERATED ALWAYS AS (JSON_UNQUOTE(JSON_EXTRACT(doc, '$._id'))) STORED PRIMARY KEY) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
        )
        .await
        .expect("create collection");
        ctx.execute("INSERT INTO docs.people (doc) VALUES ('{\"_id\": \"1\"}')")
            .await
            .expect("insert");

        let (_, rows) = query(&mut ctx, "SELECT _id, doc FROM docs.people").await;
        assert_eq!(rows[0].values[0], DataValue::Null);

        let (_, rows) = query(
            &mut ctx,
            "SELECT table_name, column_name, data_type, generation_expression FROM information_schema.columns WHERE table_schema = 'docs' ORDER BY table_name, ordinal_position",
        )
        .await;
        let columns: Vec<CatalogColumn> = rows
            .iter()
            .map(|row| CatalogColumn {
                name: row.values[1].to_text().unwrap_or_default(),
                data_type: row.values[2].to_text().unwrap_or_default(),
                generation_expression: row.values[3].to_text().unwrap_or_default(),
            })
            .collect();
        assert_eq!(columns.len(), 2);
        assert_eq!(classify_table("BASE TABLE", &columns), ObjectKind::Collection);
    }

    #[tokio::test]
    async fn information_schema_lists_tables() {
        let engine = engine();
        let mut ctx = open(&engine, None).await;
        ctx.execute("CREATE SCHEMA a").await.expect("schema");
        ctx.execute("CREATE SCHEMA b").await.expect("schema");
        ctx.execute("CREATE TABLE a.cities (name TEXT)").await.expect("t1");
        ctx.execute("CREATE TABLE a.countries (name TEXT)").await.expect("t2");
        ctx.execute("CREATE TABLE b.cars (name TEXT)").await.expect("t3");

        let (columns, rows) = query(
            &mut ctx,
            "SELECT table_name, table_type FROM information_schema.tables WHERE table_schema = 'a' AND table_name LIKE 'c%' ORDER BY table_name",
        )
        .await;
        assert_eq!(columns[0].name, "table_name");
        let names: Vec<_> = rows.iter().filter_map(|r| r.values[0].to_text()).collect();
        assert_eq!(names, vec!["cities", "countries"]);
        assert_eq!(rows[0].values[1], DataValue::String("BASE TABLE".into()));

        let (_, rows) = query(&mut ctx, "SELECT schema_name FROM information_schema.schemata").await;
        assert_eq!(rows.len(), 2);

        let (columns, rows) = query(&mut ctx, "SHOW TABLES FROM a").await;
        assert_eq!(columns[0].name, "Tables_in_a");
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn if_exists_variants_emit_notes() {
        let engine = engine();
        let mut ctx = open(&engine, None).await;
        ctx.execute("CREATE SCHEMA s").await.expect("schema");
        ctx.execute("CREATE SCHEMA IF NOT EXISTS s").await.expect("again");
        ctx.execute("CREATE TABLE s.t (a INT)").await.expect("table");
        ctx.execute("CREATE TABLE IF NOT EXISTS s.t (a INT)").await.expect("again");
        ctx.execute("DROP TABLE IF EXISTS s.missing").await.expect("drop");

        let warnings = ctx.take_warnings();
        let codes: Vec<u16> = warnings.iter().map(|w| w.code).collect();
        assert_eq!(codes, vec![1007, 1050, 1051]);
        assert!(ctx.take_warnings().is_empty());

        let err = match ctx.execute("CREATE TABLE s.t (a INT)").await {
            Err(err) => err,
            Ok(_) => panic!("duplicate table accepted"),
        };
        assert!(err.is_table_exists());

        ctx.execute("DROP TABLE s.t").await.expect("drop");
        let err = match ctx.execute("DROP TABLE s.t").await {
            Err(err) => err,
            Ok(_) => panic!("drop of missing table accepted"),
        };
        assert_eq!(err.code(), 1051);
    }

    #[tokio::test]
    async fn session_functions_and_literals() {
        let engine = engine();
        let mut ctx = open(&engine, None).await;
        let (columns, rows) = query(&mut ctx, "SELECT 1, 'x' AS s, -2.50, DATABASE(), CONNECTION_ID()").await;
        assert_eq!(columns[0].name, "1");
        assert_eq!(columns[0].column_type, ColumnType::LongLong);
        assert_eq!(columns[1].name, "s");
        assert_eq!(columns[2].column_type, ColumnType::NewDecimal);
        assert_eq!(columns[2].decimals, 2);
        assert_eq!(columns[3].name, "DATABASE()");
        assert!(columns[4].is_unsigned());
        assert_eq!(
            rows[0].values,
            vec![
                DataValue::Int64(1),
                DataValue::String("x".into()),
                DataValue::Decimal("-2.50".into()),
                DataValue::Null,
                DataValue::UInt64(7),
            ]
        );

        ctx.execute("CREATE SCHEMA app").await.expect("schema");
        let mut ctx = open(&engine, Some("app")).await;
        let (_, rows) = query(&mut ctx, "SELECT DATABASE()").await;
        assert_eq!(rows[0].values[0], DataValue::String("app".into()));
    }

    #[tokio::test]
    async fn errors_carry_mysql_codes() {
        let engine = engine();
        let mut ctx = open(&engine, None).await;
        let code = |r: Result<Vec<Box<dyn mysqlx_core::backend::ResultSet>>, _>| match r {
            Err(err) => mysqlx_core::error::XError::code(&err),
            Ok(_) => 0,
        };
        assert_eq!(code(ctx.execute("CREATE TABLE t (a INT)").await), 1046);
        assert_eq!(code(ctx.execute("SELEC 1").await), 1064);
        assert_eq!(code(ctx.execute("USE nowhere").await), 1049);
        ctx.execute("CREATE SCHEMA s").await.expect("schema");
        ctx.execute("CREATE TABLE s.t (a INT NOT NULL)").await.expect("table");
        assert_eq!(code(ctx.execute("SELECT b FROM s.t").await), 1054);
        assert_eq!(code(ctx.execute("SELECT a FROM s.missing").await), 1146);
        assert_eq!(code(ctx.execute("DELETE FROM s.t").await), 1235);
        assert_eq!(code(ctx.execute("INSERT INTO s.t VALUES (1, 2)").await), 1136);
        assert_eq!(code(ctx.execute("INSERT INTO s.t VALUES (NULL)").await), 1048);
        assert_eq!(code(ctx.execute("SET NAMES utf8mb4").await), 0);

        match MemoryDriver::new(engine.clone()).open(1, 0, 45, Some("nowhere")).await {
            Err(err) => assert_eq!(err.code(), 1049),
            Ok(_) => panic!("unknown schema accepted"),
        }
    }

    #[test]
    fn planner_marks_table_level_primary_key() {
        let stmts = parse_sql("CREATE TABLE t (a INT, b INT, PRIMARY KEY (b))").expect("parse");
        match plan_statement(&stmts[0]).expect("plan") {
            Plan::CreateTable(plan) => {
                assert!(!plan.columns[0].primary);
                assert!(plan.columns[1].primary);
                assert!(!plan.columns[1].nullable);
            }
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn like_patterns() {
        assert!(like_match("people", "%"));
        assert!(like_match("People", "peo%"));
        assert!(like_match("abc", "a_c"));
        assert!(!like_match("abc", "a_"));
        assert!(like_match("a%b", "a\\%b"));
        assert!(!like_match("axb", "a\\%b"));
        assert!(like_match("mississippi", "%iss%ppi"));
        assert!(!like_match("", "_"));
    }

    #[tokio::test]
    async fn credential_store_checks_scramble_and_host() {
        let store = CredentialStore::new(vec![
            UserAccount::with_password("app", "%", "secret"),
            UserAccount::with_auth_string("admin", "localhost", native_password_hash(b"root")),
            UserAccount::with_password("guest", "10.0.%", ""),
        ]);
        let salt = vec![b'a'; SALT_LEN];
        let identity = |user: &str, host: &str| UserIdentity {
            username: user.to_string(),
            hostname: host.to_string(),
        };

        let proof = scramble_password(b"secret", &salt);
        assert!(store.verify(&identity("app", "192.168.1.4"), &proof, &salt));
        let wrong = scramble_password(b"nope", &salt);
        assert!(!store.verify(&identity("app", "192.168.1.4"), &wrong, &salt));

        let proof = scramble_password(b"root", &salt);
        assert!(store.verify(&identity("admin", "127.0.0.1"), &proof, &salt));
        assert!(!store.verify(&identity("admin", "10.1.1.1"), &proof, &salt));

        assert!(store.verify(&identity("guest", "10.0.3.3"), &[], &salt));
        assert!(!store.verify(&identity("guest", "10.0.3.3"), &proof, &salt));
        assert!(!store.verify(&identity("nobody", "10.0.3.3"), &[], &salt));

        let engine = Arc::new(MemoryEngine::new(store));
        let mut ctx = open(&engine, None).await;
        let proof = scramble_password(b"secret", &salt);
        assert!(ctx.auth(&identity("app", "h"), &proof, &salt).await);
    }

    #[test]
    fn host_patterns() {
        assert!(host_matches("%", "anything"));
        assert!(host_matches("LocalHost", "localhost"));
        assert!(host_matches("localhost", "::1"));
        assert!(host_matches("192.168.%", "192.168.0.9"));
        assert!(!host_matches("192.168.%", "10.0.0.1"));
        assert!(!host_matches("db1", "db2"));
    }
}
