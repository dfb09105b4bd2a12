use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDescription {
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingExample {
    pub question: String,
    pub sql: String,
    pub explanation: Option<String>,
}

/// Static prompt context: schema, business notes and example queries.
/// Built once at startup and shared read-only across requests.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub schema: SchemaDescription,
    pub business_notes: Vec<String>,
    pub examples: Vec<TrainingExample>,
}

impl QueryContext {
    pub fn seed() -> Self {
        let schema = SchemaDescription {
            tables: vec![
                Table {
                    name: "customers".to_string(),
                    columns: columns(&[
                        ("id", "TEXT PRIMARY KEY"),
                        ("name", "TEXT"),
                        ("email", "TEXT"),
                        ("company", "TEXT"),
                        ("city", "TEXT"),
                        ("state", "TEXT"),
                        ("revenue", "REAL"),
                        ("created_at", "TEXT"),
                    ]),
                },
                Table {
                    name: "orders".to_string(),
                    columns: columns(&[
                        ("id", "TEXT PRIMARY KEY"),
                        ("customer_id", "TEXT"),
                        ("product_name", "TEXT"),
                        ("amount", "REAL"),
                        ("status", "TEXT"),
                        ("order_date", "TEXT"),
                    ]),
                },
            ],
        };

        let business_notes = vec![
            "Customers are small businesses using our AI platform".to_string(),
            "Orders represent subscription payments or service purchases".to_string(),
            "High-value customers have revenue > $10,000".to_string(),
            "Status can be: 'pending', 'completed', 'cancelled', 'refunded'".to_string(),
            "Revenue is monthly recurring revenue (MRR)".to_string(),
        ];

        let examples = vec![
            example(
                "Who are my top 5 customers?",
                "SELECT name, company, revenue FROM customers ORDER BY revenue DESC LIMIT 5",
                Some("Ranks customers by monthly recurring revenue"),
            ),
            example(
                "How many customers do we have?",
                "SELECT COUNT(*) AS count FROM customers",
                None,
            ),
            example(
                "Show me high-value customers",
                "SELECT * FROM customers WHERE revenue > 10000 ORDER BY revenue DESC LIMIT 10",
                Some("High-value means more than $10,000 MRR"),
            ),
            example(
                "What customers are from California?",
                "SELECT * FROM customers WHERE state = 'CA'",
                None,
            ),
            example(
                "Show me orders from this month",
                "SELECT * FROM orders WHERE order_date >= date_trunc('month', CURRENT_DATE)",
                Some("Filters orders placed since the first day of the current month"),
            ),
        ];

        Self {
            schema,
            business_notes,
            examples,
        }
    }
}

fn columns(defs: &[(&str, &str)]) -> Vec<Column> {
    defs.iter()
        .map(|(name, ty)| Column {
            name: name.to_string(),
            ty: ty.to_string(),
        })
        .collect()
}

fn example(question: &str, sql: &str, explanation: Option<&str>) -> TrainingExample {
    TrainingExample {
        question: question.to_string(),
        sql: sql.to_string(),
        explanation: explanation.map(|e| e.to_string()),
    }
}
