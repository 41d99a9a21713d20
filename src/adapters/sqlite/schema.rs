//! Existence checks and guarded DDL for `SQLite`.
//!
//! Revisions call these instead of issuing bare `ALTER TABLE` so that a
//! forward step can run again on a schema it already produced.

use sqlx::SqliteConnection;

pub async fn table_exists(conn: &mut SqliteConnection, table: &str) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_one(&mut *conn)
            .await?;
    Ok(count > 0)
}

pub async fn column_exists(
    conn: &mut SqliteConnection,
    table: &str,
    column: &str,
) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
        .bind(table)
        .bind(column)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count > 0)
}

pub async fn index_exists(conn: &mut SqliteConnection, index: &str) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?")
            .bind(index)
            .fetch_one(&mut *conn)
            .await?;
    Ok(count > 0)
}

/// Add `column` unless present. Returns whether the column was added.
///
/// Adding to a missing table is a no-op.
pub async fn add_column_if_missing(
    conn: &mut SqliteConnection,
    table: &str,
    column: &str,
    definition: &str,
) -> Result<bool, sqlx::Error> {
    if !table_exists(conn, table).await? || column_exists(conn, table, column).await? {
        return Ok(false);
    }
    sqlx::query(&format!(r#"ALTER TABLE "{table}" ADD COLUMN "{column}" {definition}"#))
        .execute(&mut *conn)
        .await?;
    Ok(true)
}

/// Drop `column` if present. Indexes covering it must be dropped first.
pub async fn drop_column_if_exists(
    conn: &mut SqliteConnection,
    table: &str,
    column: &str,
) -> Result<bool, sqlx::Error> {
    if !table_exists(conn, table).await? || !column_exists(conn, table, column).await? {
        return Ok(false);
    }
    sqlx::query(&format!(r#"ALTER TABLE "{table}" DROP COLUMN "{column}""#))
        .execute(&mut *conn)
        .await?;
    Ok(true)
}

pub async fn drop_table_if_exists(conn: &mut SqliteConnection, table: &str) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(r#"DROP TABLE IF EXISTS "{table}""#))
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn drop_index_if_exists(conn: &mut SqliteConnection, index: &str) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(r#"DROP INDEX IF EXISTS "{index}""#))
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Run each statement in order on `conn`.
pub async fn execute_all(conn: &mut SqliteConnection, statements: &[&str]) -> Result<(), sqlx::Error> {
    for statement in statements {
        sqlx::query(statement).execute(&mut *conn).await?;
    }
    Ok(())
}

/// Column names of `table` in declaration order.
pub async fn table_columns(conn: &mut SqliteConnection, table: &str) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT name FROM pragma_table_info(?) ORDER BY cid")
        .bind(table)
        .fetch_all(&mut *conn)
        .await
}
