//! Detection of search terms that convert in more than one placement.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::core::aggregate::AggregatedRow;

/// Converting placements that compete for the same search term.
/// Always holds at least two members, each with orders > 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CannibalGroup
{
    pub search_term: String,
    pub members: Vec<AggregatedRow>,
}

/// Group converting rows by search term and keep the terms with more than one
/// member. Groups follow the first-seen order of their term; members keep
/// the aggregated row order. Zero-order rows never take part.
#[instrument(level = "debug", skip_all, fields(rows = rows.len()))]
pub fn detect(rows: &[AggregatedRow]) -> Vec<CannibalGroup>
{
    let mut by_term: IndexMap<&str, Vec<&AggregatedRow>> = IndexMap::new();

    for row in rows
        .iter()
        .filter(|r| r.orders() > 0.0)
    {
        by_term
            .entry(row.search_term())
            .or_default()
            .push(row);
    }

    let groups: Vec<CannibalGroup> = by_term
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(term, members)| CannibalGroup {
            search_term: term.to_string(),
            members: members
                .into_iter()
                .cloned()
                .collect(),
        })
        .collect();

    debug!(groups = groups.len(), "detected cannibalized terms");
    groups
}
