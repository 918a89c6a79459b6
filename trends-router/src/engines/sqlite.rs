//! Structured engine over the trending-videos SQLite table
//!
//! A language model drafts one read-only `SELECT` from the question and the
//! live table schema. The statement is checked and executed on a read-only
//! connection. The model then phrases the answer from the rows, with a
//! markdown rendering of the rows as fallback.

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use trends_router_sdk::async_trait;

use super::{EngineCapabilities, EngineError, EngineKind, StructuredAnswer, StructuredQueryEngine};
use crate::config::StructuredSettings;
use crate::llm::{LanguageModel, ModelRequest};
use crate::utils::extract_fenced;

const AGENT_NAME: &str = "SQL Drafter";

const ANALYST_SYSTEM_PROMPT: &str = "You are an expert YouTube trends analyst. \
You answer questions from SQL query results, clearly and concisely, with the key numbers.";

/// Column name and declared type, read with `PRAGMA table_info`
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub decl_type: String,
}

/// Rows returned by one statement
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// More rows existed than were fetched
    pub truncated: bool,
}

pub struct SqliteEngine {
    db_path: PathBuf,
    table_name: String,
    max_rows: usize,
    columns: Vec<ColumnInfo>,
    model: Arc<dyn LanguageModel>,
}

impl SqliteEngine {
    /// Open the database and read the table schema
    ///
    /// Fails when the file or the table is missing, since the engine could
    /// not answer anything.
    pub fn open(
        settings: &StructuredSettings,
        model: Arc<dyn LanguageModel>,
    ) -> anyhow::Result<Self> {
        if !settings.db_path.is_file() {
            anyhow::bail!(
                "Database file not found: {}. Run the data processing pipeline first.",
                settings.db_path.display()
            );
        }

        let conn = open_read_only(&settings.db_path)?;
        let columns = read_columns(&conn, &settings.table_name)?;
        if columns.is_empty() {
            anyhow::bail!(
                "Table '{}' not found in {}",
                settings.table_name,
                settings.db_path.display()
            );
        }

        Ok(Self {
            db_path: settings.db_path.clone(),
            table_name: settings.table_name.clone(),
            max_rows: settings.max_rows,
            columns,
            model,
        })
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    fn system_prompt(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("- {} ({})", c.name, c.decl_type))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You are an expert YouTube trends analyst writing SQLite queries.

Table: {table}
Columns (use these names exactly):
{columns}

Rules:
- Write exactly ONE read-only SELECT statement (WITH ... SELECT is allowed)
- Never modify data
- Use LIMIT for "top N" questions
- Alias aggregate columns with readable names (e.g. COUNT(*) AS total_videos)

Reply with the statement in a ```sql block and nothing else."#,
            table = self.table_name,
            columns = columns
        )
    }

    async fn draft_sql(&self, query: &str) -> Result<String, EngineError> {
        let request = ModelRequest::new(
            "structured",
            AGENT_NAME,
            "Drafting SQL for structured query",
            self.system_prompt(),
            format!("Question: {}", query),
        );

        let reply = self
            .model
            .complete(request)
            .await
            .map_err(EngineError::model)?;

        let sql = extract_fenced(&reply, "sql").unwrap_or_else(|| reply.trim().to_string());
        ensure_read_only(&sql)
    }

    /// Natural-language answer from the result rows
    ///
    /// Falls back to the markdown rows when the model fails or says nothing.
    async fn phrase_answer(&self, query: &str, sql: &str, rows: &QueryRows) -> String {
        let rendered = render_rows(rows);
        let prompt = format!(
            "Question: {}\n\nSQL executed:\n{}\n\nResult rows:\n{}\n\n\
             Answer the question from these rows. Do not invent numbers.",
            query, sql, rendered
        );
        let request = ModelRequest::new(
            "structured",
            "Structured Analyst",
            "Phrasing structured answer",
            ANALYST_SYSTEM_PROMPT,
            prompt,
        );

        match self.model.complete(request).await {
            Ok(answer) if !answer.trim().is_empty() => answer.trim().to_string(),
            _ => rendered,
        }
    }
}

#[async_trait]
impl StructuredQueryEngine for SqliteEngine {
    async fn process_query(&self, query: &str) -> Result<StructuredAnswer, EngineError> {
        if query.trim().is_empty() {
            return Err(EngineError::InvalidQuery("Query cannot be empty".to_string()));
        }

        let sql = self.draft_sql(query).await?;

        let db_path = self.db_path.clone();
        let max_rows = self.max_rows;
        let statement = sql.clone();
        let rows = tokio::task::spawn_blocking(move || run_select(&db_path, &statement, max_rows))
            .await
            .map_err(|e| EngineError::Backend(format!("SQL worker failed: {}", e)))??;

        let answer = self.phrase_answer(query, &sql, &rows).await;
        Ok(StructuredAnswer {
            answer,
            sql: Some(sql),
        })
    }

    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities {
            name: "SqliteEngine".to_string(),
            kind: EngineKind::Structured,
            description: format!(
                "Answers analytical questions over the '{}' table",
                self.table_name
            ),
            capabilities: vec![
                "Aggregations (count, sum, average, max, min)".to_string(),
                "Filtering by category, channel, country and dates".to_string(),
                "Top-N rankings".to_string(),
                "Group comparisons".to_string(),
            ],
        }
    }
}

fn open_read_only(path: &Path) -> Result<Connection, rusqlite::Error> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
}

fn read_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get(1)?,
                decl_type: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// Accept a single SELECT (or WITH ... SELECT) statement
///
/// Returns the statement without its trailing semicolon.
pub fn ensure_read_only(sql: &str) -> Result<String, EngineError> {
    let statement = sql.trim().trim_end_matches(';').trim();
    if statement.is_empty() {
        return Err(EngineError::Backend("Model did not produce a SQL statement".to_string()));
    }
    if has_unquoted_semicolon(statement) {
        return Err(EngineError::Backend(
            "Only a single SQL statement is allowed".to_string(),
        ));
    }

    let first_word = statement
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    if first_word != "SELECT" && first_word != "WITH" {
        return Err(EngineError::Backend(format!(
            "Refusing to run non-SELECT statement: {}",
            first_word
        )));
    }

    Ok(statement.to_string())
}

/// True when `;` appears outside a string literal or quoted identifier
fn has_unquoted_semicolon(sql: &str) -> bool {
    let mut quote: Option<char> = None;
    for ch in sql.chars() {
        match quote {
            // A doubled quote inside a literal closes and reopens it
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '\'' || ch == '"' || ch == '`' => quote = Some(ch),
            None if ch == ';' => return true,
            None => {}
        }
    }
    false
}

/// Execute `sql` on a read-only connection, fetching at most `max_rows`
pub fn run_select(db_path: &Path, sql: &str, max_rows: usize) -> Result<QueryRows, EngineError> {
    let conn = open_read_only(db_path)?;
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let mut rows = Vec::new();
    let mut truncated = false;
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        if rows.len() == max_rows {
            truncated = true;
            break;
        }
        let mut values = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            values.push(render_value(row.get_ref(idx)?));
        }
        rows.push(values);
    }

    Ok(QueryRows {
        columns,
        rows,
        truncated,
    })
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) if f.fract() == 0.0 => format!("{:.0}", f),
        ValueRef::Real(f) => format!("{:.2}", f),
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        ValueRef::Blob(bytes) => format!("<blob {} bytes>", bytes.len()),
    }
}

/// Markdown rendering of result rows
pub fn render_rows(rows: &QueryRows) -> String {
    if rows.rows.is_empty() {
        return "The query returned no rows.".to_string();
    }

    let mut lines: Vec<String> = rows
        .rows
        .iter()
        .map(|values| {
            let fields = rows
                .columns
                .iter()
                .zip(values)
                .map(|(column, value)| format!("**{}**: {}", column, value))
                .collect::<Vec<_>>()
                .join(", ");
            format!("- {}", fields)
        })
        .collect();

    if rows.truncated {
        lines.push(format!("(showing the first {} rows)", rows.rows.len()));
    }
    lines.join("\n")
}
