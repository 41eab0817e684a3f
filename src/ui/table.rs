use crate::backend::ServiceHealth;
use crate::watchlist::{WatchlistGroup, WatchlistItem};
use std::collections::BTreeMap;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct WatchlistRow {
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Tags")]
    tags: String,
    #[tabled(rename = "Notes")]
    notes: String,
    #[tabled(rename = "Added")]
    added: String,
}

/// Render tracked items as a table
pub fn watchlist_table(items: &[&WatchlistItem]) -> String {
    let rows: Vec<WatchlistRow> = items
        .iter()
        .map(|item| WatchlistRow {
            symbol: item.symbol.clone(),
            tags: item.tags.join(", "),
            notes: item.notes.clone().unwrap_or_default(),
            added: item.added_at.format("%Y-%m-%d").to_string(),
        })
        .collect();

    if rows.is_empty() {
        return String::new();
    }
    Table::new(&rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Color")]
    color: String,
    #[tabled(rename = "Symbols")]
    symbols: String,
}

/// Render groups as a table
pub fn groups_table(groups: &[WatchlistGroup]) -> String {
    let rows: Vec<GroupRow> = groups
        .iter()
        .map(|group| GroupRow {
            id: group.id.clone(),
            name: group.name.clone(),
            color: group.color.clone(),
            symbols: group.symbols.join(", "),
        })
        .collect();

    if rows.is_empty() {
        return String::new();
    }
    Table::new(&rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Health")]
    health: String,
}

/// Render composed service health as a table
pub fn services_table(services: &BTreeMap<String, ServiceHealth>) -> String {
    let rows: Vec<ServiceRow> = services
        .values()
        .map(|svc| ServiceRow {
            service: svc.name.clone(),
            state: if svc.running { "running" } else { "stopped" }.to_string(),
            health: if svc.healthy { "healthy" } else { "unhealthy" }.to_string(),
        })
        .collect();

    if rows.is_empty() {
        return String::new();
    }
    Table::new(&rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tables_render_nothing() {
        assert!(watchlist_table(&[]).is_empty());
        assert!(groups_table(&[]).is_empty());
        assert!(services_table(&BTreeMap::new()).is_empty());
    }

    #[test]
    fn test_watchlist_table_includes_symbols() {
        let item = WatchlistItem::new("AAPL", vec!["tech".into()]);
        let rendered = watchlist_table(&[&item]);
        assert!(rendered.contains("AAPL"));
        assert!(rendered.contains("tech"));
    }
}
