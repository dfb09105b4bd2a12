//! Live executor backed by Supabase's PostgREST API.
//!
//! Structured plans become table requests (`select`/filter/order/limit, and
//! `Prefer: count=exact` for counts). Raw statements go through the optional
//! `exec_sql` RPC; when that is unavailable the executor degrades to a fixed
//! diagnostic row rather than failing the request.

use crate::exec::classify::{classify, Filter, QueryPlan, SortDirection, TableQuery};
use crate::exec::{row, ExecError, QueryExecutor, Row};
use async_trait::async_trait;
use chrono::Local;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct SupabaseExecutor {
    client: reqwest::Client,
    base_url: String,
    service_role_key: String,
}

impl SupabaseExecutor {
    pub fn new(url: String, service_role_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            service_role_key,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }

    async fn count(&self, table: &str) -> Result<Vec<Row>, ExecError> {
        let response = self
            .authed(self.client.head(self.table_url(table)))
            .query(&[("select", "*")])
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(|e| ExecError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ExecError::QueryError(format!(
                "count on {} failed with status {}",
                table,
                response.status()
            )));
        }

        let content_range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok());
        let count = count_from_content_range(content_range).ok_or_else(|| {
            ExecError::QueryError(format!("missing exact count for {}", table))
        })?;

        Ok(vec![row(&[("count", json!(count))])])
    }

    async fn fetch(
        &self,
        table: &str,
        query: &TableQuery,
        limit: usize,
    ) -> Result<Vec<Row>, ExecError> {
        let params = fetch_params(query, limit);

        let response = self
            .authed(self.client.get(self.table_url(table)))
            .query(&params)
            .send()
            .await
            .map_err(|e| ExecError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ExecError::QueryError(format!(
                "fetch from {} failed with status {}: {}",
                table, status, body
            )));
        }

        let rows: Vec<Row> = response
            .json()
            .await
            .map_err(|e| ExecError::QueryError(e.to_string()))?;

        if rows.is_empty() {
            return Ok(vec![row(&[
                ("message", json!(format!("No {} found", table))),
                (
                    "note",
                    json!(format!("The {} table exists but is empty", table)),
                ),
            ])]);
        }

        info!("Retrieved {} rows from {}", rows.len(), table);
        Ok(rows)
    }

    /// Generic raw-SQL path via the `exec_sql` RPC. The RPC is optional on a
    /// given project, so any failure here degrades to a canned diagnostic.
    async fn raw(&self, sql: &str, limit: usize) -> Vec<Row> {
        let url = format!("{}/rest/v1/rpc/exec_sql", self.base_url);

        let result = self
            .authed(self.client.post(&url))
            .json(&json!({ "sql": sql }))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                match response.json::<serde_json::Value>().await {
                    Ok(serde_json::Value::Array(values)) => {
                        let mut rows: Vec<Row> = values
                            .into_iter()
                            .filter_map(|v| match v {
                                serde_json::Value::Object(map) => Some(map),
                                _ => None,
                            })
                            .collect();
                        rows.truncate(limit);
                        return rows;
                    }
                    Ok(serde_json::Value::Object(map)) => return vec![map],
                    _ => {}
                }
                unsupported_query_diagnostic(sql)
            }
            Ok(response) => {
                warn!(
                    "exec_sql RPC rejected the statement (status {})",
                    response.status()
                );
                unsupported_query_diagnostic(sql)
            }
            Err(e) => {
                warn!("exec_sql RPC unavailable: {}", e);
                unsupported_query_diagnostic(sql)
            }
        }
    }
}

/// Builds the PostgREST query string for a structured row fetch.
fn fetch_params(query: &TableQuery, limit: usize) -> Vec<(String, String)> {
    let mut params = vec![
        ("select".to_string(), "*".to_string()),
        ("limit".to_string(), limit.to_string()),
    ];

    match &query.filter {
        Some(Filter::RevenueAbove(threshold)) => {
            params.push(("revenue".to_string(), format!("gt.{}", threshold)));
        }
        Some(Filter::StateEquals(state)) => {
            params.push(("state".to_string(), format!("eq.{}", state)));
        }
        Some(Filter::OrderDateFrom(from)) => {
            params.push((
                "order_date".to_string(),
                format!("gte.{}", from.format("%Y-%m-%d")),
            ));
        }
        None => {}
    }

    match query.order_by_revenue {
        Some(SortDirection::Descending) => {
            params.push(("order".to_string(), "revenue.desc".to_string()));
        }
        Some(SortDirection::Ascending) => {
            params.push(("order".to_string(), "revenue.asc".to_string()));
        }
        None => {}
    }

    params
}

/// Extracts the exact total from a PostgREST `Content-Range` header, which
/// looks like `0-9/3573` or `*/3573` when `Prefer: count=exact` is set.
fn count_from_content_range(header: Option<&str>) -> Option<i64> {
    header?.rsplit('/').next()?.parse().ok()
}

fn unsupported_query_diagnostic(sql: &str) -> Vec<Row> {
    vec![row(&[
        ("message", json!("Complex queries are not supported yet")),
        ("sql", json!(sql)),
        (
            "suggestion",
            json!("Try simpler questions like 'show customers' or 'count orders'"),
        ),
    ])]
}

#[async_trait]
impl QueryExecutor for SupabaseExecutor {
    async fn execute(&self, sql: &str, limit: usize) -> Result<Vec<Row>, ExecError> {
        let sql_clean = sql.trim().trim_end_matches(';');
        debug!("Executing against Supabase: {}", sql_clean);

        let today = Local::now().date_naive();
        match classify(sql_clean, today) {
            QueryPlan::Customers(q) if q.count => self.count("customers").await,
            QueryPlan::Customers(q) => self.fetch("customers", &q, limit).await,
            QueryPlan::Orders(q) if q.count => self.count("orders").await,
            QueryPlan::Orders(q) => self.fetch("orders", &q, limit).await,
            QueryPlan::Raw => Ok(self.raw(sql_clean, limit).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn fetch_params_cover_filter_and_ordering() {
        let query = TableQuery {
            count: false,
            filter: Some(Filter::RevenueAbove(10000)),
            order_by_revenue: Some(SortDirection::Descending),
        };

        let params = fetch_params(&query, 10);
        assert!(params.contains(&("revenue".to_string(), "gt.10000".to_string())));
        assert!(params.contains(&("order".to_string(), "revenue.desc".to_string())));
        assert!(params.contains(&("limit".to_string(), "10".to_string())));
    }

    #[test]
    fn date_filter_renders_as_gte_iso_date() {
        let from = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let query = TableQuery {
            count: false,
            filter: Some(Filter::OrderDateFrom(from)),
            order_by_revenue: None,
        };

        let params = fetch_params(&query, 5);
        assert!(params.contains(&("order_date".to_string(), "gte.2024-06-01".to_string())));
    }

    #[test]
    fn zero_limit_is_passed_through() {
        let params = fetch_params(&TableQuery::default(), 0);
        assert!(params.contains(&("limit".to_string(), "0".to_string())));
    }

    #[test]
    fn exact_count_is_read_from_the_content_range_header() {
        assert_eq!(count_from_content_range(Some("0-9/3573")), Some(3573));
        assert_eq!(count_from_content_range(Some("*/42")), Some(42));
        assert_eq!(count_from_content_range(Some("0-41/42")), Some(42));
    }

    #[test]
    fn missing_or_inexact_counts_are_rejected() {
        assert_eq!(count_from_content_range(None), None);
        // Without count=exact PostgREST reports an unknown total.
        assert_eq!(count_from_content_range(Some("0-9/*")), None);
        assert_eq!(count_from_content_range(Some("garbage")), None);
    }
}
