// PostgreSQL catalog implementation, including stored procedure execution
use crate::application::catalog_repository::ProcedureExecutor;
use crate::application::error::{CatalogError, CatalogResult};
use crate::domain::tabular::{CellValue, ProcedureParams, Record};
use crate::infrastructure::catalog_schema::{sql_catalog_repositories, CREATE_DASHBOARDS, CREATE_DATASETS};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Either, Executor, Row, Statement, TypeInfo, ValueRef};

#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub async fn connect(url: &str, max_connections: u32) -> CatalogResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        sqlx::query(CREATE_DATASETS).execute(&pool).await?;
        sqlx::query(CREATE_DASHBOARDS).execute(&pool).await?;

        Ok(Self { pool })
    }
}

sql_catalog_repositories!(PgCatalog);

#[async_trait]
impl ProcedureExecutor for PgCatalog {
    /// The call is prepared first so the server reports the argument types it
    /// resolved and the result columns. Arguments are then sent as text and
    /// cast to those types, and each column is projected to the form its
    /// `ColumnKind` decodes.
    async fn execute(&self, procedure: &str, params: &ProcedureParams) -> CatalogResult<Vec<Record>> {
        let describe_call = build_call(procedure, params, &[])?;
        let (param_types, columns) = {
            let statement = self
                .pool
                .prepare(&describe_call)
                .await
                .map_err(|e| procedure_error(procedure, e))?;

            let param_types: Vec<String> = match statement.parameters() {
                Some(Either::Left(types)) => types.iter().map(|t| t.name().to_string()).collect(),
                _ => Vec::new(),
            };
            let columns: Vec<(String, ColumnKind)> = statement
                .columns()
                .iter()
                .map(|c| (c.name().to_string(), column_kind(c.type_info().name())))
                .collect();
            (param_types, columns)
        };

        let call = build_call(procedure, params, &param_types)?;
        let sql = project_columns(&call, &columns);
        tracing::debug!("Executing stored procedure: {}", sql);

        let mut query = sqlx::query(&sql);
        for value in params.values() {
            query = query.bind(param_text(value));
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| procedure_error(procedure, e))?;

        let records = rows
            .iter()
            .map(|row| row_to_record(row, &columns))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| procedure_error(procedure, e))?;
        tracing::info!(
            "Stored procedure {} executed successfully, returned {} rows",
            procedure,
            records.len()
        );
        Ok(records)
    }
}

fn procedure_error(procedure: &str, e: sqlx::Error) -> CatalogError {
    tracing::error!("Error executing stored procedure {}: {}", procedure, e);
    CatalogError::SourceRead(format!("stored procedure {procedure} failed: {e}"))
}

/// Build `SELECT * FROM proc(a => $1, b => $2::INT4)` with every argument
/// bound by name. Known argument types become casts on the placeholder.
fn build_call(procedure: &str, params: &ProcedureParams, param_types: &[String]) -> CatalogResult<String> {
    if !is_qualified_identifier(procedure) {
        return Err(CatalogError::Validation(format!(
            "invalid stored procedure name: {procedure:?}"
        )));
    }

    let mut args = Vec::with_capacity(params.len());
    for (i, name) in params.keys().enumerate() {
        let name = name.trim_start_matches('@');
        if !is_identifier(name) {
            return Err(CatalogError::Validation(format!("invalid parameter name: {name:?}")));
        }
        match param_types.get(i).filter(|t| is_type_name(t)) {
            Some(ty) => args.push(format!("{} => ${}::{}", name, i + 1, ty)),
            None => args.push(format!("{} => ${}", name, i + 1)),
        }
    }

    Ok(format!("SELECT * FROM {}({})", procedure, args.join(", ")))
}

/// Arguments travel as text; the placeholder cast does the conversion server side.
fn param_text(value: &CellValue) -> Option<String> {
    match value {
        CellValue::Null => None,
        CellValue::Number(n) => Some(n.to_string()),
        CellValue::Boolean(b) => Some(b.to_string()),
        CellValue::Timestamp(ts) => Some(ts.to_string()),
        CellValue::Text(s) => Some(s.clone()),
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_qualified_identifier(s: &str) -> bool {
    match s.split_once('.') {
        Some((schema, name)) => is_identifier(schema) && is_identifier(name),
        None => is_identifier(s),
    }
}

fn is_type_name(s: &str) -> bool {
    is_qualified_identifier(s.strip_suffix("[]").unwrap_or(s))
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Result-set column inference: how a column is decoded, keyed on its SQL
/// type name. Anything not listed is read through its text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Timestamp,
    TimestampTz,
    Date,
    Void,
    Text,
}

fn column_kind(type_name: &str) -> ColumnKind {
    match type_name {
        "INT2" | "INT4" | "INT8" | "OID" => ColumnKind::Integer,
        "FLOAT4" | "FLOAT8" | "NUMERIC" => ColumnKind::Float,
        "BOOL" => ColumnKind::Boolean,
        "TIMESTAMP" => ColumnKind::Timestamp,
        "TIMESTAMPTZ" => ColumnKind::TimestampTz,
        "DATE" => ColumnKind::Date,
        "VOID" => ColumnKind::Void,
        _ => ColumnKind::Text,
    }
}

/// Wrap the call so integers arrive as INT8, other numbers as FLOAT8 and
/// every text-kind column as TEXT.
fn project_columns(call: &str, columns: &[(String, ColumnKind)]) -> String {
    if columns.is_empty() {
        return call.to_string();
    }

    let projection: Vec<String> = columns
        .iter()
        .map(|(name, kind)| {
            let column = quote_identifier(name);
            match kind {
                ColumnKind::Integer => format!("proc_result.{column}::INT8 AS {column}"),
                ColumnKind::Float => format!("proc_result.{column}::FLOAT8 AS {column}"),
                ColumnKind::Text => format!("proc_result.{column}::TEXT AS {column}"),
                ColumnKind::Void => format!("NULL::TEXT AS {column}"),
                ColumnKind::Boolean | ColumnKind::Timestamp | ColumnKind::TimestampTz | ColumnKind::Date => {
                    format!("proc_result.{column}")
                }
            }
        })
        .collect();

    format!("SELECT {} FROM ({}) AS proc_result", projection.join(", "), call)
}

fn row_to_record(row: &PgRow, columns: &[(String, ColumnKind)]) -> Result<Record, sqlx::Error> {
    let mut record = Record::with_capacity(columns.len());
    for (index, (name, kind)) in columns.iter().enumerate() {
        record.insert(name.clone(), result_set_cell(row, index, *kind)?);
    }
    Ok(record)
}

fn result_set_cell(row: &PgRow, index: usize, kind: ColumnKind) -> Result<CellValue, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(CellValue::Null);
    }

    let value = match kind {
        ColumnKind::Integer => CellValue::Number(row.try_get::<i64, _>(index)? as f64),
        ColumnKind::Float => CellValue::Number(row.try_get::<f64, _>(index)?),
        ColumnKind::Boolean => CellValue::Boolean(row.try_get(index)?),
        ColumnKind::Timestamp => CellValue::Timestamp(row.try_get::<NaiveDateTime, _>(index)?),
        ColumnKind::TimestampTz => CellValue::Timestamp(row.try_get::<DateTime<Utc>, _>(index)?.naive_utc()),
        ColumnKind::Date => CellValue::Timestamp(row.try_get::<NaiveDate, _>(index)?.and_time(NaiveTime::MIN)),
        ColumnKind::Void => CellValue::Null,
        ColumnKind::Text => CellValue::Text(row.try_get::<String, _>(index)?),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_call_without_params() {
        let sql = build_call("get_orders", &ProcedureParams::new(), &[]).unwrap();
        assert_eq!(sql, "SELECT * FROM get_orders()");
    }

    #[test]
    fn test_build_call_binds_named_params_in_order() {
        let mut params = ProcedureParams::new();
        params.insert("@region".to_string(), CellValue::from("north"));
        params.insert("year".to_string(), CellValue::Number(2024.0));

        let sql = build_call("reporting.sales_by_region", &params, &[]).unwrap();
        assert_eq!(sql, "SELECT * FROM reporting.sales_by_region(region => $1, year => $2)");
    }

    #[test]
    fn test_build_call_casts_to_resolved_types() {
        let mut params = ProcedureParams::new();
        params.insert("region".to_string(), CellValue::from("north"));
        params.insert("year".to_string(), CellValue::Number(2024.0));
        params.insert("tags".to_string(), CellValue::Null);
        let types = vec!["TEXT".to_string(), "INT4".to_string(), "TEXT[]".to_string()];

        let sql = build_call("sales", &params, &types).unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM sales(region => $1::TEXT, year => $2::INT4, tags => $3::TEXT[])"
        );
    }

    #[test]
    fn test_build_call_skips_unusable_type_names() {
        let mut params = ProcedureParams::new();
        params.insert("flag".to_string(), CellValue::Boolean(true));
        let types = vec!["\"CHAR\"".to_string()];

        let sql = build_call("sales", &params, &types).unwrap();
        assert_eq!(sql, "SELECT * FROM sales(flag => $1)");
    }

    #[test]
    fn test_build_call_rejects_injection() {
        let err = build_call("orders(); DROP TABLE datasets; --", &ProcedureParams::new(), &[]).unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));

        let mut params = ProcedureParams::new();
        params.insert("x => 1) --".to_string(), CellValue::Null);
        assert!(build_call("get_orders", &params, &[]).is_err());
    }

    #[test]
    fn test_identifier_rules() {
        assert!(is_identifier("_private1"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier(""));
        assert!(is_qualified_identifier("dbo.get_orders"));
        assert!(!is_qualified_identifier("a.b.c"));
        assert!(is_type_name("INT4[]"));
        assert!(!is_type_name("INT4; DROP"));
    }

    #[test]
    fn test_param_text() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(12, 0, 0).unwrap();

        assert_eq!(param_text(&CellValue::Number(2024.0)).as_deref(), Some("2024"));
        assert_eq!(param_text(&CellValue::Number(1.5)).as_deref(), Some("1.5"));
        assert_eq!(param_text(&CellValue::Boolean(false)).as_deref(), Some("false"));
        assert_eq!(param_text(&CellValue::Timestamp(ts)).as_deref(), Some("2024-01-15 12:00:00"));
        assert_eq!(param_text(&CellValue::Null), None);
    }

    #[test]
    fn test_result_set_column_inference() {
        for (type_name, kind) in [
            ("INT2", ColumnKind::Integer),
            ("INT4", ColumnKind::Integer),
            ("INT8", ColumnKind::Integer),
            ("FLOAT4", ColumnKind::Float),
            ("FLOAT8", ColumnKind::Float),
            ("NUMERIC", ColumnKind::Float),
            ("BOOL", ColumnKind::Boolean),
            ("TIMESTAMP", ColumnKind::Timestamp),
            ("TIMESTAMPTZ", ColumnKind::TimestampTz),
            ("DATE", ColumnKind::Date),
            ("VOID", ColumnKind::Void),
            ("UUID", ColumnKind::Text),
            ("TIME", ColumnKind::Text),
            ("INTERVAL", ColumnKind::Text),
            ("MONEY", ColumnKind::Text),
            ("BYTEA", ColumnKind::Text),
            ("JSONB", ColumnKind::Text),
            ("VARCHAR", ColumnKind::Text),
        ] {
            assert_eq!(column_kind(type_name), kind, "{type_name}");
        }
    }

    #[test]
    fn test_projection_casts_by_kind() {
        let columns = vec![
            ("id".to_string(), ColumnKind::Integer),
            ("amount".to_string(), ColumnKind::Float),
            ("ref".to_string(), ColumnKind::Text),
            ("active".to_string(), ColumnKind::Boolean),
            ("say \"hi\"".to_string(), ColumnKind::Text),
        ];

        let sql = project_columns("SELECT * FROM f()", &columns);
        assert_eq!(
            sql,
            "SELECT proc_result.\"id\"::INT8 AS \"id\", proc_result.\"amount\"::FLOAT8 AS \"amount\", \
             proc_result.\"ref\"::TEXT AS \"ref\", proc_result.\"active\", \
             proc_result.\"say \"\"hi\"\"\"::TEXT AS \"say \"\"hi\"\"\" FROM (SELECT * FROM f()) AS proc_result"
        );
        assert_eq!(project_columns("SELECT * FROM f()", &[]), "SELECT * FROM f()");
    }

    /// Needs a reachable server: `CATALOG_TEST_POSTGRES_URL=postgres://... cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn test_execute_types_result_columns() {
        let Ok(url) = std::env::var("CATALOG_TEST_POSTGRES_URL") else {
            return;
        };
        let catalog = PgCatalog::connect(&url, 1).await.unwrap();
        sqlx::query(
            r#"CREATE OR REPLACE FUNCTION catalog_test_mixed(n INT)
               RETURNS TABLE (id INT, amount NUMERIC, active BOOLEAN, created TIMESTAMP, day DATE,
                              ref UUID, at_time TIME, note TEXT)
               LANGUAGE sql AS $$
                 SELECT n, 12.50::numeric, true, TIMESTAMP '2024-01-15 12:00:00', DATE '2024-01-15',
                        'a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11'::uuid, TIME '08:30:00', NULL::text
               $$"#,
        )
        .execute(&catalog.pool)
        .await
        .unwrap();

        let mut params = ProcedureParams::new();
        params.insert("n".to_string(), CellValue::Number(7.0));
        let rows = catalog.execute("catalog_test_mixed", &params).await.unwrap();

        let noon = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(12, 0, 0).unwrap();
        let midnight = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_time(NaiveTime::MIN);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        let keys: Vec<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "amount", "active", "created", "day", "ref", "at_time", "note"]);
        assert_eq!(row["id"], CellValue::Number(7.0));
        assert_eq!(row["amount"], CellValue::Number(12.5));
        assert_eq!(row["active"], CellValue::Boolean(true));
        assert_eq!(row["created"], CellValue::Timestamp(noon));
        assert_eq!(row["day"], CellValue::Timestamp(midnight));
        assert_eq!(row["ref"], CellValue::from("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11"));
        assert_eq!(row["at_time"], CellValue::from("08:30:00"));
        assert_eq!(row["note"], CellValue::Null);
    }
}
