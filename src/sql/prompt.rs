//! SQL 生成 prompt
//!
//! 固定指令 + 表结构描述 + 原样的问题，输出确定；生成结果只去掉外层的 markdown 代码块围栏。

use crate::sql::SchemaDescription;

/// 固定指令：只输出一条合法 SQL，不带解释与格式
pub const SQL_INSTRUCTION: &str = "You are an expert SQLite assistant. \
Translate the user's question into exactly one valid SQLite SQL statement that answers it, \
using only the tables and columns in the schema below. \
Return only the SQL statement with no explanation, no comments and no formatting.";

pub fn build_sql_prompt(schema: &SchemaDescription, question: &str) -> String {
    format!(
        "{}\n\nSchema:\n{}\n\nQuestion: {}\n\nSQL:",
        SQL_INSTRUCTION, schema.text, question
    )
}

/// 去掉首尾空白与包裹整段输出的 ``` / ```sql 围栏
pub fn clean_generated_sql(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // 跳过围栏后的语言标记（如 sql）
    let body = match rest.find('\n') {
        Some(i) => &rest[i + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_schema_and_question() {
        let schema = SchemaDescription {
            text: "Table: employees\nColumns: id (INTEGER)".to_string(),
            degraded: false,
        };
        let prompt = build_sql_prompt(&schema, "How many employees?");
        assert!(prompt.starts_with(SQL_INSTRUCTION));
        assert!(prompt.contains("Schema:\nTable: employees\nColumns: id (INTEGER)"));
        assert!(prompt.ends_with("Question: How many employees?\n\nSQL:"));
        assert_eq!(prompt, build_sql_prompt(&schema, "How many employees?"));
    }

    #[test]
    fn test_clean_plain_sql() {
        assert_eq!(clean_generated_sql("  SELECT 1;\n"), "SELECT 1;");
    }

    #[test]
    fn test_clean_fenced_sql() {
        assert_eq!(
            clean_generated_sql("```sql\nSELECT avg(salary) FROM employees\n```"),
            "SELECT avg(salary) FROM employees"
        );
        assert_eq!(clean_generated_sql("```SELECT 1```"), "SELECT 1");
    }

    #[test]
    fn test_clean_empty_fence_is_empty() {
        assert_eq!(clean_generated_sql("```sql\n```"), "");
        assert_eq!(clean_generated_sql("   "), "");
    }
}
