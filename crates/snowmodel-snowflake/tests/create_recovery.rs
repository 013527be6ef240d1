mod common;

use asupersync::runtime::RuntimeBuilder;
use snowmodel_core::{Cx, Outcome, SchemaErrorKind, Value};
use snowmodel_snowflake::{
    ConflictSpec, Downgrade, Recovery, SnowflakeConfig, SnowflakeDialect, WritePath,
    WriteStrategy,
};

use common::{Document, Event, Order, ScriptedConnection, Setting, rows_of, unwrap_outcome};

const INSERT_CHANGES: &str =
    "SELECT ID FROM orders CHANGES(INFORMATION => DEFAULT) BEFORE(statement=>LAST_QUERY_ID());";
const MERGE_CHANGES: &str =
    "SELECT ID FROM orders CHANGES(INFORMATION => APPEND_ONLY) BEFORE(statement=>LAST_QUERY_ID());";

fn ids(orders: &[Order]) -> Vec<i64> {
    orders.iter().map(|o| o.id).collect()
}

#[test]
fn insert_without_generated_columns_skips_recovery() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let mut conn = ScriptedConnection::new();
        conn.script().rows_affected = 1;
        let mut setting = Setting {
            name: "theme".to_string(),
            value: "dark".to_string(),
        };

        let report = unwrap_outcome(
            SnowflakeDialect::default()
                .create_strategy()
                .create(&cx, &mut conn, &mut setting, None)
                .await,
        );

        assert_eq!(report.rows_affected, 1);
        assert_eq!(report.path, WritePath::PlainInsert);
        assert!(matches!(report.recovery, Recovery::NotRequired));
        assert_eq!(
            conn.statements(),
            vec!["INSERT INTO settings (NAME,VALUE) VALUES (?,?);".to_string()]
        );
    });
}

#[test]
fn single_insert_binds_identity_from_change_log() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let mut conn = ScriptedConnection::new();
        {
            let mut script = conn.script();
            script.rows_affected = 1;
            script.cursor_rows = rows_of("ID", &[Value::BigInt(42)]);
        }
        let mut order = Order::new(0, "ada");

        let report = unwrap_outcome(
            SnowflakeDialect::default()
                .create_strategy()
                .create(&cx, &mut conn, &mut order, None)
                .await,
        );

        assert_eq!(order.id, 42);
        assert_eq!(report.recovery.rows(), 1);
        assert!(report.recovery.is_complete());
        assert_eq!(
            conn.statements(),
            vec![
                "INSERT INTO orders (CUSTOMER) VALUES (?);".to_string(),
                INSERT_CHANGES.to_string(),
            ]
        );
        assert_eq!(conn.script().cursor_closes, 1);
    });
}

#[test]
fn collection_insert_binds_in_order_until_rows_run_out() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let mut conn = ScriptedConnection::new();
        {
            let mut script = conn.script();
            script.rows_affected = 3;
            script.cursor_rows = rows_of("ID", &[Value::BigInt(1), Value::BigInt(2)]);
        }
        let mut orders = vec![Order::new(0, "a"), Order::new(0, "b"), Order::new(0, "c")];

        let report = unwrap_outcome(
            SnowflakeDialect::default()
                .create_strategy()
                .create_many(&cx, &mut conn, &mut orders, None)
                .await,
        );

        assert_eq!(report.rows_affected, 3);
        assert_eq!(report.recovery.rows(), 2);
        assert_eq!(ids(&orders), vec![1, 2, 0]);
        assert_eq!(
            conn.statements()[0],
            "INSERT INTO orders (CUSTOMER) VALUES (?),(?),(?);"
        );
        assert_eq!(conn.script().cursor_closes, 1);
    });
}

#[test]
fn upsert_without_written_key_falls_back_to_insert() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let mut conn = ScriptedConnection::new();
        {
            let mut script = conn.script();
            script.rows_affected = 2;
            script.cursor_rows = rows_of("ID", &[Value::BigInt(10), Value::BigInt(11)]);
        }
        let mut orders = vec![Order::new(0, "a"), Order::new(0, "b")];

        let report = unwrap_outcome(
            SnowflakeDialect::default()
                .create_strategy()
                .create_many(&cx, &mut conn, &mut orders, Some(&ConflictSpec::update_all()))
                .await,
        );

        assert_eq!(report.path, WritePath::PlainInsert);
        assert!(matches!(
            report.downgrade,
            Some(Downgrade::PrimaryKeyNotWritten { .. })
        ));
        assert!(conn.statements().iter().all(|sql| !sql.contains("MERGE")));
        assert_eq!(conn.statements()[1], INSERT_CHANGES);
        assert_eq!(ids(&orders), vec![10, 11]);
    });
}

#[test]
fn strict_upsert_accepts_new_rows_with_generated_key() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let mut conn = ScriptedConnection::new();
        {
            let mut script = conn.script();
            script.rows_affected = 2;
            script.cursor_rows = rows_of("ID", &[Value::BigInt(30), Value::BigInt(31)]);
        }
        let mut orders = vec![Order::new(0, "a"), Order::new(0, "b")];
        let dialect = SnowflakeDialect::new(SnowflakeConfig::new("dsn").strict_upsert(true));

        let report = unwrap_outcome(
            dialect
                .create_strategy()
                .create_many(&cx, &mut conn, &mut orders, Some(&ConflictSpec::do_nothing()))
                .await,
        );

        assert_eq!(report.path, WritePath::PlainInsert);
        assert!(matches!(
            report.downgrade,
            Some(Downgrade::PrimaryKeyNotWritten { .. })
        ));
        assert_eq!(conn.statements()[0], "INSERT INTO orders (CUSTOMER) VALUES (?),(?);");
        assert_eq!(ids(&orders), vec![30, 31]);
    });
}

#[test]
fn strict_upsert_rejects_keyless_table_before_writing() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let mut conn = ScriptedConnection::new();
        let mut events = vec![Event {
            kind: "login".to_string(),
        }];
        let dialect = SnowflakeDialect::new(SnowflakeConfig::new("dsn").strict_upsert(true));

        let outcome = dialect
            .create_strategy()
            .create_many(&cx, &mut conn, &mut events, Some(&ConflictSpec::do_nothing()))
            .await;

        match outcome {
            Outcome::Err(e) => assert_eq!(e.schema_kind(), Some(SchemaErrorKind::ConflictTarget)),
            other => panic!("expected conflict target error, got {other:?}"),
        }
        assert!(conn.statements().is_empty());
    });
}

#[test]
fn update_all_merge_keeps_defaulted_columns_of_matched_rows() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let mut conn = ScriptedConnection::new();
        conn.script().rows_affected = 2;
        let mut docs = vec![Document::new(5, "a", 1), Document::new(6, "b", 0)];

        let report = unwrap_outcome(
            SnowflakeDialect::default()
                .create_strategy()
                .create_many(&cx, &mut conn, &mut docs, Some(&ConflictSpec::update_all()))
                .await,
        );

        assert_eq!(report.path, WritePath::MergeUpsert);
        assert_eq!(report.recovery.rows(), 0);
        let statements = conn.statements();
        assert_eq!(
            statements[0],
            "MERGE INTO documents USING (VALUES (?,?,?),(?,?,?)) AS excluded (ID,TITLE,CREATED_AT) \
             ON documents.ID = excluded.ID \
             WHEN MATCHED THEN UPDATE SET TITLE = excluded.TITLE \
             WHEN NOT MATCHED THEN INSERT (TITLE,CREATED_AT) VALUES (excluded.TITLE,excluded.CREATED_AT);"
        );
        assert_eq!(conn.script().params[0][5], Value::Null);
        assert_eq!(docs[1], Document::new(6, "b", 0));
    });
}

#[test]
fn do_nothing_merge_binds_only_new_targets() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let mut conn = ScriptedConnection::new();
        {
            let mut script = conn.script();
            script.rows_affected = 2;
            script.cursor_rows = rows_of("ID", &[Value::BigInt(100), Value::BigInt(101)]);
        }
        let mut orders = vec![Order::new(0, "a"), Order::new(7, "b"), Order::new(0, "c")];

        let report = unwrap_outcome(
            SnowflakeDialect::default()
                .create_strategy()
                .create_many(&cx, &mut conn, &mut orders, Some(&ConflictSpec::do_nothing()))
                .await,
        );

        assert_eq!(report.path, WritePath::MergeUpsert);
        assert!(report.downgrade.is_none());
        assert_eq!(report.rows_affected, 2);
        assert_eq!(report.recovery.rows(), 2);
        assert_eq!(ids(&orders), vec![100, 7, 101]);

        let statements = conn.statements();
        assert_eq!(
            statements[0],
            "MERGE INTO orders USING (VALUES (?,?),(?,?),(?,?)) AS excluded (ID,CUSTOMER) \
             ON orders.ID = excluded.ID \
             WHEN NOT MATCHED THEN INSERT (CUSTOMER) VALUES (excluded.CUSTOMER);"
        );
        assert_eq!(statements[1], MERGE_CHANGES);
        assert_eq!(
            conn.script().params[0],
            vec![
                Value::Null,
                Value::Text("a".to_string()),
                Value::BigInt(7),
                Value::Text("b".to_string()),
                Value::Null,
                Value::Text("c".to_string()),
            ]
        );
    });
}

#[test]
fn failed_write_is_an_error_without_recovery() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let mut conn = ScriptedConnection::new();
        conn.script().execute_error = Some("duplicate key".to_string());
        let mut order = Order::new(0, "a");

        let outcome = SnowflakeDialect::default()
            .create_strategy()
            .create(&cx, &mut conn, &mut order, None)
            .await;

        assert!(matches!(outcome, Outcome::Err(_)));
        assert_eq!(conn.statements().len(), 1);
        assert_eq!(conn.script().cursors_opened, 0);
        assert_eq!(order.id, 0);
    });
}

#[test]
fn failed_change_log_read_keeps_the_write() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let mut conn = ScriptedConnection::new();
        {
            let mut script = conn.script();
            script.rows_affected = 2;
            script.open_error = Some("change tracking is not enabled".to_string());
        }
        let mut orders = vec![Order::new(0, "a"), Order::new(0, "b")];

        let report = unwrap_outcome(
            SnowflakeDialect::default()
                .create_strategy()
                .create_many(&cx, &mut conn, &mut orders, None)
                .await,
        );

        assert_eq!(report.rows_affected, 2);
        assert!(matches!(report.recovery, Recovery::Failed { rows: 0, .. }));
        assert_eq!(ids(&orders), vec![0, 0]);
    });
}

#[test]
fn cursor_is_closed_when_fetch_fails_midway() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let mut conn = ScriptedConnection::new();
        {
            let mut script = conn.script();
            script.rows_affected = 3;
            script.cursor_rows =
                rows_of("ID", &[Value::BigInt(1), Value::BigInt(2), Value::BigInt(3)]);
            script.fetch_error_at = Some(1);
        }
        let mut orders = vec![Order::new(0, "a"), Order::new(0, "b"), Order::new(0, "c")];

        let report = unwrap_outcome(
            SnowflakeDialect::default()
                .create_strategy()
                .create_many(&cx, &mut conn, &mut orders, None)
                .await,
        );

        assert!(matches!(report.recovery, Recovery::Failed { rows: 1, .. }));
        assert_eq!(ids(&orders), vec![1, 0, 0]);
        assert_eq!(conn.script().cursor_closes, 1);
    });
}

#[test]
fn cursor_is_closed_after_scan_errors_and_early_stop() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let mut conn = ScriptedConnection::new();
        {
            let mut script = conn.script();
            script.rows_affected = 2;
            script.cursor_rows = rows_of(
                "ID",
                &[Value::Text("oops".to_string()), Value::BigInt(5)],
            );
        }
        let mut orders = vec![Order::new(0, "a"), Order::new(0, "b")];
        let strategy = SnowflakeDialect::default().create_strategy();

        let report = unwrap_outcome(strategy.create_many(&cx, &mut conn, &mut orders, None).await);
        let Recovery::Recovered { rows, scan_errors } = &report.recovery else {
            panic!("expected recovered, got {:?}", report.recovery);
        };
        assert_eq!(*rows, 1);
        assert_eq!(scan_errors[0].target, 0);
        assert_eq!(ids(&orders), vec![0, 5]);
        assert_eq!(conn.script().cursor_closes, 1);

        // A single object stops after one row even when more are buffered.
        conn.script().cursor_rows = rows_of("ID", &[Value::BigInt(8), Value::BigInt(9)]);
        let mut order = Order::new(0, "c");
        let report = unwrap_outcome(strategy.create(&cx, &mut conn, &mut order, None).await);
        assert_eq!(report.recovery.rows(), 1);
        assert_eq!(order.id, 8);
        assert_eq!(conn.script().cursor_closes, 2);
    });
}

#[test]
fn cancellation_after_write_interrupts_recovery() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let mut conn = ScriptedConnection::new();
        {
            let mut script = conn.script();
            script.rows_affected = 2;
            script.cancel_on_write = true;
            script.cursor_rows = rows_of("ID", &[Value::BigInt(1), Value::BigInt(2)]);
        }
        let mut orders = vec![Order::new(0, "a"), Order::new(0, "b")];

        let report = unwrap_outcome(
            SnowflakeDialect::default()
                .create_strategy()
                .create_many(&cx, &mut conn, &mut orders, None)
                .await,
        );

        assert_eq!(report.rows_affected, 2);
        assert!(matches!(report.recovery, Recovery::Interrupted { rows: 0 }));
        assert_eq!(ids(&orders), vec![0, 0]);
        assert_eq!(conn.statements().len(), 1);
    });
}

#[test]
fn disabled_recovery_and_empty_collections() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let mut conn = ScriptedConnection::new();
        conn.script().rows_affected = 1;
        let strategy =
            SnowflakeDialect::new(SnowflakeConfig::new("dsn").recover_generated(false))
                .create_strategy();

        let mut empty: Vec<Order> = Vec::new();
        let report = unwrap_outcome(strategy.create_many(&cx, &mut conn, &mut empty, None).await);
        assert_eq!(report.rows_affected, 0);
        assert!(conn.statements().is_empty());

        let mut order = Order::new(0, "a");
        let report = unwrap_outcome(strategy.create(&cx, &mut conn, &mut order, None).await);
        assert_eq!(report.rows_affected, 1);
        assert!(matches!(report.recovery, Recovery::NotRequired));
        assert_eq!(conn.statements().len(), 1);
        assert_eq!(order.id, 0);
    });
}
