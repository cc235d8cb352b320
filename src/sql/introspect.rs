//! 表结构描述：把数据源的表与列渲染成模型上下文文本
//!
//! 每次查询都重新读取（不缓存）；表按数据源返回顺序、列按声明顺序输出，
//! 同一数据源未变化时两次输出逐字节一致。读取失败时不报错，返回内嵌失败原因的降级描述。

use crate::sql::source::{DataSource, TableSchema};

/// 表结构描述文本；degraded 表示读取失败，text 中是失败原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescription {
    pub text: String,
    pub degraded: bool,
}

pub async fn describe(source: &dyn DataSource) -> SchemaDescription {
    match source.tables().await {
        Ok(tables) => SchemaDescription {
            text: render(&tables),
            degraded: false,
        },
        Err(e) => {
            tracing::warn!(error = %e, "schema introspection failed, continuing with degraded schema");
            SchemaDescription {
                text: format!("Schema unavailable: {}", e),
                degraded: true,
            }
        }
    }
}

/// 每张表两行：`Table: name` 与 `Columns: col (TYPE), ...`，表之间空一行
pub fn render(tables: &[TableSchema]) -> String {
    if tables.is_empty() {
        return "(no tables)".to_string();
    }
    tables
        .iter()
        .map(|t| {
            let columns = t
                .columns
                .iter()
                .map(|c| format!("{} ({})", c.name, c.data_type))
                .collect::<Vec<_>>()
                .join(", ");
            format!("Table: {}\nColumns: {}", t.name, columns)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::source::{ColumnInfo, SqliteSource};

    #[test]
    fn test_render_format() {
        let tables = vec![
            TableSchema {
                name: "employees".into(),
                columns: vec![
                    ColumnInfo { name: "id".into(), data_type: "INTEGER".into() },
                    ColumnInfo { name: "name".into(), data_type: "TEXT".into() },
                ],
            },
            TableSchema { name: "empty".into(), columns: vec![] },
        ];
        assert_eq!(
            render(&tables),
            "Table: employees\nColumns: id (INTEGER), name (TEXT)\n\nTable: empty\nColumns: "
        );
    }

    #[tokio::test]
    async fn test_describe_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hr.db");
        rusqlite::Connection::open(&path)
            .unwrap()
            .execute_batch(
                "CREATE TABLE departments (id INTEGER, name TEXT);
                 CREATE TABLE employees (id INTEGER, name TEXT, department TEXT, salary INTEGER, hire_date TEXT);",
            )
            .unwrap();
        let source = SqliteSource::new(&path);

        let first = describe(&source).await;
        let second = describe(&source).await;
        assert!(!first.degraded);
        assert_eq!(first.text.as_bytes(), second.text.as_bytes());
        assert!(first.text.contains(
            "Table: employees\nColumns: id (INTEGER), name (TEXT), department (TEXT), salary (INTEGER), hire_date (TEXT)"
        ));
    }

    #[tokio::test]
    async fn test_describe_degrades_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = SqliteSource::new(dir.path().join("absent.db"));
        let schema = describe(&source).await;
        assert!(schema.degraded);
        assert!(schema.text.starts_with("Schema unavailable: "));
    }
}
