//! Dataset summary formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::migration::DataStats;

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Collection")]
    collection: &'static str,
    #[tabled(rename = "Rows")]
    rows: usize,
}

/// Format per-collection counts plus the total
pub fn format_data_stats(stats: &DataStats) -> String {
    let rows = [
        StatRow {
            collection: "API Keys",
            rows: stats.api_keys,
        },
        StatRow {
            collection: "Service Notes",
            rows: stats.service_notes,
        },
        StatRow {
            collection: "Resource Categories",
            rows: stats.categories,
        },
        StatRow {
            collection: "Resources",
            rows: stats.resources,
        },
        StatRow {
            collection: "Total",
            rows: stats.total,
        },
    ];

    Table::new(rows).with(Style::psql()).to_string()
}
