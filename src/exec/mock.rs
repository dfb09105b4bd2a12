//! Deterministic canned datasets, used when Supabase credentials are absent.
//! Keyed by the same keyword classification as the live executor so the
//! service is fully functional on a first run with no configuration.

use crate::exec::classify::{classify, QueryPlan};
use crate::exec::{row, ExecError, QueryExecutor, Row};
use async_trait::async_trait;
use chrono::Local;
use serde_json::json;
use tracing::debug;

pub struct MockExecutor;

impl MockExecutor {
    pub fn new() -> Self {
        Self
    }

    fn mock_note(sql: &str) -> Row {
        row(&[
            (
                "note",
                json!(
                    "Using mock data. Configure SUPABASE_URL and \
                     SUPABASE_SERVICE_ROLE_KEY to query real data"
                ),
            ),
            ("sql_generated", json!(sql)),
        ])
    }

    fn customer_rows() -> Vec<Row> {
        vec![
            row(&[
                ("id", json!("cust_001")),
                ("name", json!("John Smith")),
                ("email", json!("john@techcorp.com")),
                ("company", json!("TechCorp Inc")),
                ("city", json!("San Francisco")),
                ("state", json!("CA")),
                ("revenue", json!(15000.0)),
                ("created_at", json!("2023-01-15")),
            ]),
            row(&[
                ("id", json!("cust_002")),
                ("name", json!("Sarah Johnson")),
                ("email", json!("sarah@innovate.io")),
                ("company", json!("Innovate Solutions")),
                ("city", json!("Austin")),
                ("state", json!("TX")),
                ("revenue", json!(8500.0)),
                ("created_at", json!("2023-02-20")),
            ]),
        ]
    }

    fn order_rows() -> Vec<Row> {
        vec![
            row(&[
                ("id", json!("ord_001")),
                ("customer_id", json!("cust_001")),
                ("product_name", json!("Premium Plan")),
                ("amount", json!(299.99)),
                ("status", json!("completed")),
                ("order_date", json!("2024-01-15")),
            ]),
            row(&[
                ("id", json!("ord_002")),
                ("customer_id", json!("cust_002")),
                ("product_name", json!("Basic Plan")),
                ("amount", json!(99.99)),
                ("status", json!("pending")),
                ("order_date", json!("2024-01-20")),
            ]),
        ]
    }
}

#[async_trait]
impl QueryExecutor for MockExecutor {
    async fn execute(&self, sql: &str, limit: usize) -> Result<Vec<Row>, ExecError> {
        debug!("Mock executor handling: {}", sql);

        let today = Local::now().date_naive();
        let mut rows = match classify(sql, today) {
            QueryPlan::Customers(q) if q.count => vec![row(&[("count", json!(150))])],
            QueryPlan::Customers(_) => Self::customer_rows(),
            QueryPlan::Orders(q) if q.count => vec![row(&[("count", json!(75))])],
            QueryPlan::Orders(_) => Self::order_rows(),
            QueryPlan::Raw => vec![row(&[
                ("message", json!("Mock data from the query executor")),
                ("query", json!(sql)),
            ])],
        };

        rows.truncate(limit);
        rows.push(Self::mock_note(sql));

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn show_customers_returns_two_rows_plus_the_mock_note() {
        let exec = MockExecutor::new();
        let rows = exec
            .execute("SELECT * FROM customers LIMIT 10", 10)
            .await
            .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["name"], json!("John Smith"));
        assert_eq!(rows[1]["name"], json!("Sarah Johnson"));
        assert!(rows[2].contains_key("note"));
    }

    #[tokio::test]
    async fn mock_results_are_idempotent() {
        let exec = MockExecutor::new();
        let sql = "SELECT * FROM orders LIMIT 10";

        let first = exec.execute(sql, 10).await.unwrap();
        let second = exec.execute(sql, 10).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn counts_return_a_single_count_row_plus_note() {
        let exec = MockExecutor::new();

        let rows = exec
            .execute("SELECT COUNT(*) AS count FROM customers", 10)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["count"], json!(150));

        let rows = exec
            .execute("SELECT COUNT(*) AS count FROM orders", 10)
            .await
            .unwrap();
        assert_eq!(rows[0]["count"], json!(75));
    }

    #[tokio::test]
    async fn zero_limit_leaves_only_the_note_row() {
        let exec = MockExecutor::new();
        let rows = exec
            .execute("SELECT * FROM customers LIMIT 10", 0)
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains_key("note"));
    }

    #[tokio::test]
    async fn unclassified_sql_gets_a_generic_message_row() {
        let exec = MockExecutor::new();
        let rows = exec.execute("SELECT 1", 10).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains_key("message"));
    }
}
