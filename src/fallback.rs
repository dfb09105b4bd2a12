//! Deterministic keyword fallback used when the model cannot produce SQL.
//!
//! The rules form an ordered table and the order is load-bearing: several
//! rules overlap ("show all customers" must hit the show rule, not the
//! bare-customer rule), so first match wins.

pub struct FallbackRule {
    /// Every substring here must appear in the lower-cased question.
    all: &'static [&'static str],
    /// At least one of these must appear. Empty means no extra constraint.
    any: &'static [&'static str],
    sql: &'static str,
}

pub const FALLBACK_RULES: &[FallbackRule] = &[
    FallbackRule {
        all: &["customer"],
        any: &["show", "list"],
        sql: "SELECT * FROM customers LIMIT 10",
    },
    FallbackRule {
        all: &["customer", "count"],
        any: &[],
        sql: "SELECT COUNT(*) AS count FROM customers",
    },
    FallbackRule {
        all: &["all customer"],
        any: &[],
        sql: "SELECT * FROM customers",
    },
    FallbackRule {
        all: &["customer"],
        any: &["high", "revenue"],
        sql: "SELECT * FROM customers WHERE revenue > 10000 ORDER BY revenue DESC LIMIT 10",
    },
    FallbackRule {
        all: &["customer"],
        any: &[],
        sql: "SELECT * FROM customers LIMIT 10",
    },
    FallbackRule {
        all: &["order"],
        any: &["show", "list"],
        sql: "SELECT * FROM orders LIMIT 10",
    },
    FallbackRule {
        all: &["order", "count"],
        any: &[],
        sql: "SELECT COUNT(*) AS count FROM orders",
    },
    FallbackRule {
        all: &["all order"],
        any: &[],
        sql: "SELECT * FROM orders",
    },
    FallbackRule {
        all: &["order"],
        any: &[],
        sql: "SELECT * FROM orders LIMIT 10",
    },
    FallbackRule {
        all: &["show"],
        any: &[],
        sql: "SELECT * FROM customers LIMIT 5",
    },
    FallbackRule {
        all: &["count"],
        any: &[],
        sql: "SELECT COUNT(*) AS count FROM customers",
    },
    FallbackRule {
        all: &["list"],
        any: &[],
        sql: "SELECT * FROM customers LIMIT 5",
    },
];

/// Returns the canned SQL for the first matching rule, or None if the
/// question matches nothing.
pub fn match_fallback(question: &str) -> Option<&'static str> {
    let q = question.to_lowercase();

    FALLBACK_RULES
        .iter()
        .find(|rule| {
            rule.all.iter().all(|kw| q.contains(kw))
                && (rule.any.is_empty() || rule.any.iter().any(|kw| q.contains(kw)))
        })
        .map(|rule| rule.sql)
}
