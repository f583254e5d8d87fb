// database connection and query execution
// only ever runs statements that passed the safety gate

use crate::Error;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::types::Decimal;
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tracing::debug;

use super::safety::SafeSelect;

#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Where validated statements get run.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &SafeSelect) -> Result<QueryResult, Error>;
}

pub struct Db {
    pool: MySqlPool,
}

impl Db {
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl QueryExecutor for Db {
    // run the sql and return results as json
    async fn execute(&self, sql: &SafeSelect) -> Result<QueryResult, Error> {
        let rows = sqlx::query(sql.as_str()).fetch_all(&self.pool).await?;
        debug!(rows = rows.len(), "query executed");

        if rows.is_empty() {
            return Ok(QueryResult::default());
        }

        let columns: Vec<String> = rows[0]
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let json_rows: Vec<Vec<serde_json::Value>> = rows
            .iter()
            .map(|row| {
                (0..columns.len())
                    .map(|i| row_value_to_json(row, i))
                    .collect()
            })
            .collect();

        Ok(QueryResult::new(columns, json_rows))
    }
}

// convert mysql values to json, picking the decoder from the column type
fn row_value_to_json(row: &MySqlRow, index: usize) -> serde_json::Value {
    use serde_json::Value;

    let Ok(raw) = row.try_get_raw(index) else {
        return Value::Null;
    };
    if raw.is_null() {
        return Value::Null;
    }
    let type_name = raw.type_info().name().to_string();

    let typed = match type_name.as_str() {
        // TINYINT(1)
        "BOOLEAN" => row.try_get::<bool, _>(index).ok().map(Value::Bool),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get::<i64, _>(index).ok().map(Value::from)
        }
        t if t.ends_with("UNSIGNED") => row.try_get::<u64, _>(index).ok().map(Value::from),
        "FLOAT" | "DOUBLE" => row
            .try_get::<f64, _>(index)
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        // kept as text so SUM()/AVG() results stay exact
        "DECIMAL" => row
            .try_get::<Decimal, _>(index)
            .ok()
            .map(|d| Value::String(d.to_string())),
        "DATE" => row
            .try_get::<NaiveDate, _>(index)
            .ok()
            .map(|d| Value::String(d.to_string())),
        "DATETIME" => row
            .try_get::<NaiveDateTime, _>(index)
            .ok()
            .map(|d| Value::String(d.to_string())),
        "TIMESTAMP" => row
            .try_get::<DateTime<Utc>, _>(index)
            .ok()
            .map(|d| Value::String(d.naive_utc().to_string())),
        "TIME" => row
            .try_get::<NaiveTime, _>(index)
            .ok()
            .map(|d| Value::String(d.to_string())),
        t if t.contains("BLOB") || t.contains("BINARY") => row
            .try_get::<Vec<u8>, _>(index)
            .ok()
            .map(|v| Value::String(format!("<{} bytes>", v.len()))),
        _ => None,
    };

    if let Some(value) = typed {
        return value;
    }

    // text, enums, json and anything the match above missed
    if let Ok(v) = row.try_get::<String, _>(index) {
        return Value::String(v);
    }

    debug!(%type_name, "no decoder for column type");
    Value::String(format!("<{}>", type_name.to_lowercase()))
}
