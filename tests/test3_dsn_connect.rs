#![cfg(feature = "sqlite")]

use sql_recordset::prelude::*;
use tempfile::tempdir;

#[test]
fn file_dsn_persists_batches() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("orders.db");
    let dsn = Dsn::builder().name(path.to_string_lossy()).finish();

    {
        let mut conn = dsn.connect(Driver::Sqlite)?;
        conn.execute_batch("CREATE TABLE orders (id INTEGER PRIMARY KEY, sku TEXT, qty INTEGER)")?;
        let rows: Vec<Record> = vec![
            [("id", "1"), ("sku", "A-1"), ("qty", "3")].into_iter().collect(),
            [("id", "2"), ("sku", "B-7"), ("qty", "1")].into_iter().collect(),
        ];
        assert_eq!(insert_rows(&mut conn, "orders", &rows)?, 2);
    }

    let conn = dsn.connect(Driver::Sqlite)?;
    let back = query_records(&conn, "SELECT sku, qty FROM orders ORDER BY id", &[])?;
    assert_eq!(back.len(), 2);
    assert_eq!(back[0].str("sku"), "A-1");
    assert_eq!(back[1].int64("qty"), 1);
    Ok(())
}

#[test]
fn uri_args_are_honoured() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("ro.db");
    let writable = Dsn::builder().name(path.to_string_lossy()).finish();
    writable
        .connect(Driver::Sqlite)?
        .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY)")?;

    let read_only = Dsn::builder()
        .name(path.to_string_lossy())
        .arg("mode", "ro")
        .finish();
    assert!(
        read_only
            .connection_string(Driver::Sqlite)?
            .ends_with("?mode=ro")
    );
    let mut conn = read_only.connect(Driver::Sqlite)?;
    let rows: Vec<Record> = vec![[("id", "1")].into_iter().collect()];
    let err = insert_rows(&mut conn, "t", &rows).unwrap_err();
    assert!(matches!(err, RecordSetError::StatementError { .. }));
    Ok(())
}

#[test]
fn json_config_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let dsn = Dsn::from_json_str(r#"{"host":"db1","user":"app","pass":"pw","name":"shop"}"#)?;
    assert_eq!(
        dsn.connection_string(Driver::Postgres)?,
        "host=db1 port=5432 user=app password=pw dbname=shop sslmode=disable"
    );
    let encoded = serde_json::to_string(&dsn)?;
    assert_eq!(Dsn::from_json_str(&encoded)?, dsn);
    Ok(())
}
