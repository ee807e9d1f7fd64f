//! Tests for the filter expression model
//!
//! Covers negation, in-memory evaluation over rows, normalization, the
//! where/having split and field access verification.

#[path = "testutils/mod.rs"]
mod testutils;

use querycache::filter::{
    normalize, split_where_having, AccessVerdict, FieldAccessVisitor, FieldPermissions,
    FilterExpression, InMemoryFilter, Operator, PermissionCheck,
};
use querycache::query::Row;
use querycache::{TypeName, Value};
use testutils::player_stats::{player_rows, PlayerStatsSchema};

fn matches(row: &Row, expr: &FilterExpression) -> bool {
    InMemoryFilter::new(row).matches(expr)
}

fn sample_expressions(schema: &PlayerStatsSchema) -> Vec<FilterExpression> {
    let name = schema.path("playerName");
    let country = schema.path("countryNickName");
    let score = schema.path("highScore");
    vec![
        FilterExpression::eq(name.clone(), "Han"),
        FilterExpression::prefix(name.clone(), "Sa"),
        FilterExpression::infix(country.clone(), "Sam"),
        FilterExpression::in_values(country.clone(), vec!["Uncle Sam".into(), "Mother Russia".into()])
            .unwrap(),
        FilterExpression::and(
            FilterExpression::eq(country.clone(), "Uncle Sam"),
            FilterExpression::ge(score.clone(), 1100i64),
        ),
        FilterExpression::or(
            FilterExpression::not(FilterExpression::postfix(name, "hn")),
            FilterExpression::between(score, 0i64, 500i64),
        ),
        FilterExpression::not(FilterExpression::is_null(schema.path("lowScore"))),
    ]
}

#[test]
fn test_negation_round_trip() {
    testutils::init_logging();
    let schema = PlayerStatsSchema::new();
    for expr in sample_expressions(&schema) {
        assert_eq!(normalize(&expr.negate().negate()), normalize(&expr));
    }
    for operator in Operator::ALL {
        assert_eq!(operator.negate().negate(), operator);
    }
}

#[test]
fn test_negation_is_complement_on_rows() {
    let schema = PlayerStatsSchema::new();
    for expr in sample_expressions(&schema) {
        for row in player_rows() {
            assert_ne!(
                matches(&row, &expr),
                matches(&row, &expr.negate()),
                "{:?} on {:?}",
                expr,
                row
            );
        }
    }
}

#[test]
fn test_evaluation_on_rows() {
    let schema = PlayerStatsSchema::new();
    let rich_americans = FilterExpression::and(
        FilterExpression::eq(schema.path("countryNickName"), "Uncle Sam"),
        FilterExpression::gt(schema.path("highScore"), 1100i64),
    );
    let names: Vec<_> = player_rows()
        .into_iter()
        .filter(|row| matches(row, &rich_americans))
        .filter_map(|row| row.get("playerName").cloned())
        .collect();
    assert_eq!(names, vec![Value::from("SaintJohn")]);

    let missing_low_score = FilterExpression::is_null(schema.path("lowScore"));
    let count = player_rows()
        .iter()
        .filter(|row| matches(row, &missing_low_score))
        .count();
    assert_eq!(count, 1);
}

#[test]
fn test_normalize_removes_not() {
    let schema = PlayerStatsSchema::new();
    for expr in sample_expressions(&schema) {
        let normalized = normalize(&FilterExpression::not(expr.clone()));
        assert!(!normalized.contains_not(), "{:?}", normalized);
        for row in player_rows() {
            assert_eq!(matches(&row, &normalized), !matches(&row, &expr));
        }
    }
}

#[test]
fn test_where_having_split_table() {
    let schema = PlayerStatsSchema::new();
    let w1 = FilterExpression::eq(schema.path("countryNickName"), "Uncle Sam");
    let w2 = FilterExpression::prefix(schema.path("playerName"), "S");
    let h1 = FilterExpression::gt(schema.path("highScore"), 300i64);
    let h2 = FilterExpression::lt(schema.path("lowScore"), 50i64);
    let is_metric = |path: &querycache::Path| schema.is_metric(path);

    // (input, expected where, expected having)
    let cases = vec![
        (w1.clone(), Some(w1.clone()), None),
        (h1.clone(), None, Some(h1.clone())),
        (
            FilterExpression::and(w1.clone(), h1.clone()),
            Some(w1.clone()),
            Some(h1.clone()),
        ),
        (
            FilterExpression::or(w1.clone(), w2.clone()),
            Some(FilterExpression::or(w1.clone(), w2.clone())),
            None,
        ),
        (
            FilterExpression::or(h1.clone(), h2.clone()),
            None,
            Some(FilterExpression::or(h1.clone(), h2.clone())),
        ),
        (
            FilterExpression::or(w1.clone(), h1.clone()),
            None,
            Some(FilterExpression::or(w1.clone(), h1.clone())),
        ),
        (
            FilterExpression::and(FilterExpression::or(w1.clone(), w2.clone()), h2.clone()),
            Some(FilterExpression::or(w1.clone(), w2.clone())),
            Some(h2.clone()),
        ),
    ];

    for (input, expected_where, expected_having) in cases {
        let split = split_where_having(&input, is_metric);
        assert_eq!(split.where_expr, expected_where, "where of {:?}", input);
        assert_eq!(split.having_expr, expected_having, "having of {:?}", input);
    }
}

#[test]
fn test_split_preserves_semantics() {
    let schema = PlayerStatsSchema::new();
    let expr = FilterExpression::not(FilterExpression::or(
        FilterExpression::eq(schema.path("countryNickName"), "Mother Russia"),
        FilterExpression::lt(schema.path("highScore"), 1100i64),
    ));
    let split = split_where_having(&expr, |path| schema.is_metric(path));
    assert!(split.where_expr.is_some());
    assert!(split.having_expr.is_some());

    for row in player_rows() {
        let both = split.where_expr.iter().all(|w| matches(&row, w))
            && split.having_expr.iter().all(|h| matches(&row, h));
        assert_eq!(both, matches(&row, &expr));
    }
}

struct SalaryHidden;

impl FieldPermissions for SalaryHidden {
    fn check_read(&self, _: &TypeName, field: &str) -> PermissionCheck {
        match field {
            "lowScore" => PermissionCheck::Fail,
            "country" => PermissionCheck::Deferred,
            _ => PermissionCheck::Pass,
        }
    }
}

#[test]
fn test_field_access_verdicts() {
    let schema = PlayerStatsSchema::new();
    let policy = SalaryHidden;
    let mut visitor = FieldAccessVisitor::new(&policy);

    let open = FilterExpression::eq(schema.path("playerName"), "Han");
    let through_country = FilterExpression::eq(schema.path("country.nickName"), "Uncle Sam");
    let hidden = FilterExpression::not(FilterExpression::is_null(schema.path("lowScore")));

    assert_eq!(visitor.verify(&open), AccessVerdict::Allowed);
    assert_eq!(visitor.verify(&through_country), AccessVerdict::Deferred);
    assert_eq!(visitor.verify(&hidden), AccessVerdict::Denied);
    assert_eq!(
        visitor.verify(&FilterExpression::or(through_country, hidden)),
        AccessVerdict::Denied
    );
}
