use criterion::{criterion_group, criterion_main, Criterion};
use mysqlx_core::backend::{collect_rows, Driver};
use mysqlx_sql::{parse_sql, CredentialStore, MemoryDriver, MemoryEngine};
use std::sync::Arc;
use tokio::runtime::Runtime;

fn sql_parse_bench(c: &mut Criterion) {
    c.bench_function("sql_parse", |b| {
        b.iter(|| {
            let _ = parse_sql("SELECT table_name FROM information_schema.tables WHERE table_schema = 'app';");
        })
    });
}

fn sql_end_to_end_bench(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    c.bench_function("sql_end_to_end", |b| {
        b.iter(|| {
            rt.block_on(async {
                let engine = Arc::new(MemoryEngine::new(CredentialStore::default()));
                let driver = MemoryDriver::new(engine);
                let mut ctx = driver.open(1, 0, 45, None).await.expect("open");
                ctx.execute("CREATE SCHEMA bench").await.expect("schema");
                ctx.execute("CREATE TABLE bench.users (id INT, name TEXT)")
                    .await
                    .expect("create");
                ctx.execute("INSERT INTO bench.users (id, name) VALUES (1, 'alice'), (2, 'bob')")
                    .await
                    .expect("insert");
                let results = ctx
                    .execute("SELECT * FROM bench.users WHERE id > 1")
                    .await
                    .expect("select");
                let _ = collect_rows(results).await.expect("rows");
            })
        })
    });
}

criterion_group!(sql_benches, sql_parse_bench, sql_end_to_end_bench);
criterion_main!(sql_benches);
