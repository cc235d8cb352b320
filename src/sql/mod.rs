//! 自然语言转 SQL：数据源、表结构描述、prompt 构建与问答管线

pub mod introspect;
pub mod pipeline;
pub mod prompt;
pub mod source;

pub use introspect::{describe, SchemaDescription};
pub use pipeline::{QueryPipeline, QueryResponse, DEFAULT_GENERATE_TIMEOUT_SECS};
pub use prompt::{build_sql_prompt, clean_generated_sql, SQL_INSTRUCTION};
pub use source::{
    ColumnInfo, DataSource, SqlError, SqlRow, SqliteSource, TableSchema,
    DEFAULT_QUERY_TIMEOUT_SECS,
};
