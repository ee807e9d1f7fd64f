//! Player statistics fixture
//!
//! `example.PlayerStats` has attributes and a to-one `country` plus a to-many
//! `teams` relationship, enough to exercise paths, sorting and filters.

use querycache::filter::FilterExpression;
use querycache::query::{
    DimensionProjection, MetricProjection, Pagination, Query, QueryResult, Row, SortOrder,
    Sorting, Table, TimeDimensionProjection, TimeGrain,
};
use querycache::{Path, TypeName, TypeRegistry};

pub const PLAYER_STATS: &str = "example.PlayerStats";

/// Key of [`full_query`]
pub const FULL_QUERY_KEY: &str = concat!(
    "playerStats;",
    "{playerStats.highScore;playerStats.overallRating;}",
    "{countryNickName;{}}",
    "{recordedDate;DAY;{}}",
    "{P;{{example.PlayerStats;string;countryNickName;}}IN;S;9;Uncle Sam;}",
    "{P;{{example.PlayerStats;long;highScore;}}GT;I;3;300;}",
    "{example.PlayerStats;{{example.PlayerStats;string;playerName;}}asc;}",
    "{0;2;1;}",
);

pub struct PlayerStatsSchema {
    pub registry: TypeRegistry,
    pub player: TypeName,
    pub country: TypeName,
}

impl PlayerStatsSchema {
    pub fn new() -> Self {
        let mut registry = TypeRegistry::new();
        let country = registry.bind_entity("example.Country").unwrap();
        let team = registry.bind_entity("example.Team").unwrap();
        let player = registry.bind_entity(PLAYER_STATS).unwrap();

        registry
            .bind_attribute(&country, "isoCode", TypeName::STRING)
            .unwrap();
        registry
            .bind_attribute(&country, "nickName", TypeName::STRING)
            .unwrap();
        registry
            .bind_attribute(&team, "name", TypeName::STRING)
            .unwrap();

        for (field, ty) in [
            ("playerName", TypeName::STRING),
            ("countryNickName", TypeName::STRING),
            ("overallRating", TypeName::STRING),
            ("highScore", TypeName::LONG),
            ("lowScore", TypeName::LONG),
            ("recordedDate", TypeName::DATE),
        ] {
            registry.bind_attribute(&player, field, ty).unwrap();
        }
        registry
            .bind_relationship(&player, "country", &country, false)
            .unwrap();
        registry
            .bind_relationship(&player, "teams", &team, true)
            .unwrap();

        Self {
            registry,
            player,
            country,
        }
    }

    /// Path rooted at `example.PlayerStats`
    pub fn path(&self, dotted: &str) -> Path {
        self.registry.resolve_path(&self.player, dotted).unwrap()
    }

    /// Metric columns of the player stats table
    pub fn is_metric(&self, path: &Path) -> bool {
        matches!(
            path.last_element().field_name(),
            "highScore" | "lowScore"
        )
    }

    /// Query producing [`FULL_QUERY_KEY`]
    pub fn full_query(&self) -> Query {
        Query::new(Table::new("playerStats"))
            .metric(MetricProjection::new("playerStats.highScore"))
            .metric(MetricProjection::new("playerStats.overallRating"))
            .dimension(DimensionProjection::new("countryNickName"))
            .time_dimension(TimeDimensionProjection::new("recordedDate", TimeGrain::Day))
            .where_filter(FilterExpression::eq(
                self.path("countryNickName"),
                "Uncle Sam",
            ))
            .having_filter(FilterExpression::gt(self.path("highScore"), 300i64))
            .sorting(
                Sorting::new(self.player.clone())
                    .by(self.path("playerName"), SortOrder::Asc),
            )
            .pagination(Pagination::new(0, 2).with_totals())
    }
}

/// Query with one metric and nothing else
pub fn minimal_query() -> Query {
    Query::new(Table::new("playerStats")).metric(MetricProjection::new("playerStats.highScore"))
}

pub fn player_rows() -> Vec<Row> {
    vec![
        Row::new()
            .with("playerName", "SaintJohn")
            .with("countryNickName", "Uncle Sam")
            .with("highScore", 1234i64)
            .with("lowScore", 35i64),
        Row::new()
            .with("playerName", "Han")
            .with("countryNickName", "Uncle Sam")
            .with("highScore", 1000i64)
            .with("lowScore", 72i64),
        Row::new()
            .with("playerName", "Bob")
            .with("countryNickName", "Mother Russia")
            .with("highScore", 250i64),
    ]
}

pub fn sample_result() -> QueryResult {
    QueryResult::new(player_rows()).with_page_totals(3)
}
