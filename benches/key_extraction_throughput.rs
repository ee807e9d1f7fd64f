/// Benchmark for cache key extraction
///
/// Measures how many keys per second the extractor produces for a minimal
/// query and for a query using every section, and how much larger IN lists
/// cost.

use querycache::filter::FilterExpression;
use querycache::query::{
    DimensionProjection, MetricProjection, Pagination, Query, QueryKeyExtractor, SortOrder,
    Sorting, Table, TimeDimensionProjection, TimeGrain,
};
use querycache::{TypeName, TypeRegistry, Value};
use std::time::Instant;

const ITERATIONS: usize = 100_000;

fn full_query(registry: &TypeRegistry, player: &TypeName, in_size: usize) -> Query {
    let path = |field: &str| {
        registry
            .resolve_path(player, field)
            .expect("Failed to resolve path")
    };
    let names: Vec<Value> = (0..in_size).map(|i| Value::from(format!("name {}", i))).collect();

    Query::new(Table::new("playerStats").with_version("bench"))
        .metric(MetricProjection::new("playerStats.highScore"))
        .metric(MetricProjection::new("playerStats.overallRating"))
        .dimension(DimensionProjection::new("countryNickName"))
        .dimension(DimensionProjection::new("playerName"))
        .time_dimension(TimeDimensionProjection::new("recordedDate", TimeGrain::Day))
        .where_filter(
            FilterExpression::in_values(path("playerName"), names).expect("Failed to build IN"),
        )
        .having_filter(FilterExpression::gt(path("highScore"), 300i64))
        .sorting(Sorting::new(player.clone()).by(path("playerName"), SortOrder::Asc))
        .pagination(Pagination::new(0, 100).with_totals())
}

fn measure(label: &str, query: &Query) -> f64 {
    let start = Instant::now();
    let mut total_len = 0usize;
    for _ in 0..ITERATIONS {
        total_len += QueryKeyExtractor::extract_key(query).len();
    }
    let duration = start.elapsed();
    let ops_per_sec = ITERATIONS as f64 / duration.as_secs_f64();
    println!("  {}", label);
    println!("    Key length: {} bytes", total_len / ITERATIONS);
    println!("    Time: {:?}", duration);
    println!("    Throughput: {:.0} keys/sec", ops_per_sec);
    ops_per_sec
}

fn main() {
    println!("=== Key Extraction Throughput Benchmark ===\n");

    let mut registry = TypeRegistry::new();
    let player = registry
        .bind_entity("example.PlayerStats")
        .expect("Failed to bind entity");
    for (field, ty) in [
        ("playerName", TypeName::STRING),
        ("highScore", TypeName::LONG),
    ] {
        registry
            .bind_attribute(&player, field, ty)
            .expect("Failed to bind attribute");
    }

    println!("📊 Minimal query:");
    let minimal = Query::new(Table::new("playerStats"))
        .metric(MetricProjection::new("playerStats.highScore"));
    let minimal_ops = measure("one metric", &minimal);
    println!();

    println!("📊 Full query by IN list size:");
    let mut full_ops = Vec::new();
    for in_size in [1, 10, 100] {
        let query = full_query(&registry, &player, in_size);
        full_ops.push((in_size, measure(&format!("{} IN values", in_size), &query)));
    }
    println!();

    println!("=== Summary ===");
    println!("  Minimal query: {:.0} keys/sec", minimal_ops);
    for (in_size, ops) in full_ops {
        println!("  Full query, {:>3} IN values: {:.0} keys/sec", in_size, ops);
    }
}
