//! Keyword classification of a SQL statement.
//!
//! The service never parses SQL: it routes a statement to a known table by
//! substring inspection, recognizing at most one filter and one sort. The
//! checks run in a fixed order (customers before orders, structured before
//! raw) so overlapping statements resolve deterministically.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq)]
pub enum QueryPlan {
    Customers(TableQuery),
    Orders(TableQuery),
    Raw,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableQuery {
    pub count: bool,
    pub filter: Option<Filter>,
    pub order_by_revenue: Option<SortDirection>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `revenue > <n>` becomes a numeric greater-than.
    RevenueAbove(i64),
    /// `state = '<v>'` becomes an equality on the upper-cased value.
    StateEquals(String),
    /// "this month" becomes `order_date >= first day of the current month`.
    OrderDateFrom(NaiveDate),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

fn revenue_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"revenue\s*>\s*(\d+)").unwrap())
}

fn state_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"state\s*=\s*['"]([^'"]+)['"]"#).unwrap())
}

/// Classifies a statement by keyword presence. `today` anchors the
/// "this month" date filter so the decision is testable.
pub fn classify(sql: &str, today: NaiveDate) -> QueryPlan {
    let sql_lower = sql.trim().trim_end_matches(';').to_lowercase();

    if sql_lower.contains("customers")
        && (sql_lower.contains("select") || sql_lower.contains("count"))
    {
        return QueryPlan::Customers(customers_query(&sql_lower));
    }

    if sql_lower.contains("orders") && (sql_lower.contains("select") || sql_lower.contains("count"))
    {
        return QueryPlan::Orders(orders_query(&sql_lower, today));
    }

    QueryPlan::Raw
}

fn customers_query(sql_lower: &str) -> TableQuery {
    if sql_lower.contains("count") {
        return TableQuery {
            count: true,
            ..TableQuery::default()
        };
    }

    let mut filter = None;
    if sql_lower.contains("where") {
        if let Some(caps) = revenue_re().captures(sql_lower) {
            if let Ok(threshold) = caps[1].parse::<i64>() {
                filter = Some(Filter::RevenueAbove(threshold));
            }
        } else if let Some(caps) = state_re().captures(sql_lower) {
            filter = Some(Filter::StateEquals(caps[1].to_uppercase()));
        }
    }

    let order_by_revenue = if sql_lower.contains("order by") && sql_lower.contains("revenue") {
        if sql_lower.contains("desc") {
            Some(SortDirection::Descending)
        } else {
            Some(SortDirection::Ascending)
        }
    } else {
        None
    };

    TableQuery {
        count: false,
        filter,
        order_by_revenue,
    }
}

fn orders_query(sql_lower: &str, today: NaiveDate) -> TableQuery {
    if sql_lower.contains("count") {
        return TableQuery {
            count: true,
            ..TableQuery::default()
        };
    }

    let this_month = sql_lower.contains("this month")
        || (sql_lower.contains("month") && sql_lower.contains("current"));

    let filter = if this_month {
        NaiveDate::from_ymd_opt(today.year(), today.month(), 1).map(Filter::OrderDateFrom)
    } else {
        None
    };

    TableQuery {
        count: false,
        filter,
        order_by_revenue: None,
    }
}
