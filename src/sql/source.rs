//! 数据源：表结构读取与 SQL 执行
//!
//! SqliteSource 每次操作打开独立连接（只读写已存在的文件，不创建），在 spawn_blocking 中执行，
//! 操作结束（成功、失败或超时）后连接随闭包一起释放；超时时通过 InterruptHandle 中断语句。
//! 结果行是按列顺序排列的 column -> value 映射（serde_json preserve_order）。

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection, OpenFlags};
use serde_json::Value;
use thiserror::Error;
use tokio::time::timeout;

/// 一行结果：列名 -> 值，保持列顺序
pub type SqlRow = serde_json::Map<String, Value>;

/// 默认 SQL 执行超时（秒）
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Error, Debug)]
pub enum SqlError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("query timed out after {0}s")]
    Timeout(u64),

    #[error("database task failed: {0}")]
    Task(String),
}

/// 可查询的关系型数据源
#[async_trait]
pub trait DataSource: Send + Sync {
    /// 全部表及其列，按数据源返回的顺序
    async fn tables(&self) -> Result<Vec<TableSchema>, SqlError>;

    /// 执行单条 SQL 并返回全部结果行
    async fn query(&self, sql: &str) -> Result<Vec<SqlRow>, SqlError>;
}

/// 磁盘上的 SQLite 文件
#[derive(Debug, Clone)]
pub struct SqliteSource {
    path: PathBuf,
    timeout_secs: u64,
}

impl SqliteSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<Connection, SqlError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }

    /// 在阻塞线程上用一条新连接执行 f；超时则中断语句
    async fn with_connection<T, F>(&self, f: F) -> Result<T, SqlError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = self.open()?;
        let interrupt = conn.get_interrupt_handle();
        let task = tokio::task::spawn_blocking(move || f(&conn));

        match timeout(Duration::from_secs(self.timeout_secs), task).await {
            Ok(Ok(result)) => Ok(result?),
            Ok(Err(e)) => Err(SqlError::Task(e.to_string())),
            Err(_) => {
                interrupt.interrupt();
                Err(SqlError::Timeout(self.timeout_secs))
            }
        }
    }
}

#[async_trait]
impl DataSource for SqliteSource {
    async fn tables(&self) -> Result<Vec<TableSchema>, SqlError> {
        self.with_connection(read_tables).await
    }

    async fn query(&self, sql: &str) -> Result<Vec<SqlRow>, SqlError> {
        let sql = sql.to_string();
        self.with_connection(move |conn| run_query(conn, &sql)).await
    }
}

fn read_tables(conn: &Connection) -> rusqlite::Result<Vec<TableSchema>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut col_stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1)")?;
    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let columns = col_stmt
            .query_map([&name], |row| {
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    data_type: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        tables.push(TableSchema { name, columns });
    }
    Ok(tables)
}

/// 只执行单条语句；含多条语句时整体拒绝，不执行任何一条
fn ensure_single_statement(conn: &Connection, sql: &str) -> rusqlite::Result<()> {
    let mut batch = Batch::new(conn, sql);
    let mut count = 0;
    while batch.next()?.is_some() {
        count += 1;
        if count > 1 {
            return Err(rusqlite::Error::MultipleStatement);
        }
    }
    Ok(())
}

fn run_query(conn: &Connection, sql: &str) -> rusqlite::Result<Vec<SqlRow>> {
    ensure_single_statement(conn, sql)?;
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query([])?;

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = SqlRow::new();
        for (i, col) in columns.iter().enumerate() {
            record.insert(col.clone(), to_json(row.get_ref(i)?));
        }
        out.push(record);
    }
    Ok(out)
}

/// BLOB 以十六进制字符串表示；非有限浮点数记为 null
fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(b.iter().map(|x| format!("{:02x}", x)).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded_db(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("shop.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE products (id INTEGER PRIMARY KEY, title TEXT, price REAL, image BLOB);
             INSERT INTO products (title, price, image) VALUES ('Lamp', 19.5, x'CAFE');
             INSERT INTO products (title, price, image) VALUES ('Desk', NULL, NULL);",
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn test_rows_keep_column_order_and_types() {
        let dir = tempfile::tempdir().unwrap();
        let source = SqliteSource::new(seeded_db(&dir));

        let rows = source
            .query("SELECT price, title, id, image FROM products ORDER BY id")
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["price", "title", "id", "image"]);
        assert_eq!(rows[0]["price"], json!(19.5));
        assert_eq!(rows[0]["id"], json!(1));
        assert_eq!(rows[0]["image"], json!("cafe"));
        assert_eq!(rows[1]["price"], Value::Null);
    }

    #[tokio::test]
    async fn test_tables_lists_columns_with_types() {
        let dir = tempfile::tempdir().unwrap();
        let source = SqliteSource::new(seeded_db(&dir));
        let tables = source.tables().await.unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "products");
        let cols: Vec<(&str, &str)> = tables[0]
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.data_type.as_str()))
            .collect();
        assert_eq!(
            cols,
            vec![("id", "INTEGER"), ("title", "TEXT"), ("price", "REAL"), ("image", "BLOB")]
        );
    }

    #[tokio::test]
    async fn test_multiple_statements_rejected_without_running() {
        let dir = tempfile::tempdir().unwrap();
        let source = SqliteSource::new(seeded_db(&dir));

        let err = source
            .query("SELECT title FROM products; DROP TABLE products")
            .await
            .unwrap_err();
        assert!(matches!(err, SqlError::Sqlite(rusqlite::Error::MultipleStatement)));

        let tables = source.tables().await.unwrap();
        assert_eq!(tables[0].name, "products");
    }

    #[tokio::test]
    async fn test_trailing_semicolon_is_single_statement() {
        let dir = tempfile::tempdir().unwrap();
        let source = SqliteSource::new(seeded_db(&dir));
        let rows = source.query("SELECT id FROM products;  \n").await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_runaway_query_is_interrupted() {
        let dir = tempfile::tempdir().unwrap();
        let source = SqliteSource::new(seeded_db(&dir)).with_timeout(1);

        let started = std::time::Instant::now();
        let err = source
            .query("WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) SELECT count(*) FROM c")
            .await
            .unwrap_err();
        assert!(matches!(err, SqlError::Timeout(1)));
        assert_eq!(err.to_string(), "query timed out after 1s");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db");
        let source = SqliteSource::new(&path);
        assert!(source.tables().await.is_err());
        assert!(!path.exists());
    }
}
