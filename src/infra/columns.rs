//! Header discovery for search term reports.
//!
//! Report exports name their columns differently depending on the ad type
//! and the export date ("Customer Search Term" vs "Matched product",
//! "7 Day Total Sales" vs "Sales"). Each canonical field owns a list of
//! header substrings; the first header containing any of them wins. The
//! resolved `ColumnMap` is all the core ever sees.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::core::error::SchemaError;

/// Header substrings per canonical field, matched case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColumnPatterns
{
    pub search_term: Vec<String>,
    pub campaign: Vec<String>,
    pub ad_group: Vec<String>,
    pub match_type: Vec<String>,
    pub orders: Vec<String>,
    pub sales: Vec<String>,
    pub spend: Vec<String>,
    pub clicks: Vec<String>,
}

impl Default for ColumnPatterns
{
    fn default() -> Self
    {
        fn owned(items: &[&str]) -> Vec<String>
        {
            items
                .iter()
                .map(|s| s.to_string())
                .collect()
        }

        Self {
            search_term: owned(&["Matched product", "Customer Search Term", "Search Term"]),
            campaign: owned(&["Campaign Name"]),
            ad_group: owned(&["Ad Group Name"]),
            match_type: owned(&["Match Type"]),
            orders: owned(&["Orders", "Units"]),
            sales: owned(&["Sales"]),
            spend: owned(&["Spend"]),
            clicks: owned(&["Clicks"]),
        }
    }
}

/// Resolved header indices. Required fields are plain indices; optional
/// metrics read as zero (and match type as `UNKNOWN`) when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap
{
    pub search_term: usize,
    pub campaign: usize,
    pub ad_group: usize,
    pub sales: usize,
    pub match_type: Option<usize>,
    pub orders: Option<usize>,
    pub spend: Option<usize>,
    pub clicks: Option<usize>,
}

impl ColumnMap
{
    /// Resolve every canonical field against `headers`.
    pub fn resolve<S: AsRef<str>>(
        headers: &[S],
        patterns: &ColumnPatterns,
    ) -> Result<Self, SchemaError>
    {
        let search_term = find_column(headers, &patterns.search_term);
        let campaign = find_column(headers, &patterns.campaign);
        let ad_group = find_column(headers, &patterns.ad_group);
        let sales = find_column(headers, &patterns.sales);

        match (search_term, campaign, ad_group, sales)
        {
            (Some(search_term), Some(campaign), Some(ad_group), Some(sales)) => Ok(Self {
                search_term,
                campaign,
                ad_group,
                sales,
                match_type: find_column(headers, &patterns.match_type),
                orders: find_column(headers, &patterns.orders),
                spend: find_column(headers, &patterns.spend),
                clicks: find_column(headers, &patterns.clicks),
            }),
            _ =>
            {
                let missing = [
                    ("search term", search_term),
                    ("campaign", campaign),
                    ("ad group", ad_group),
                    ("sales", sales),
                ]
                .into_iter()
                .filter(|(_, idx)| idx.is_none())
                .map(|(name, _)| name)
                .collect();

                let available = headers
                    .iter()
                    .map(|h| h.as_ref())
                    .join(", ");

                Err(SchemaError::MissingColumns {
                    missing,
                    help: format!(
                        "available headers: {available}\nadd patterns under [columns] in cannibal.toml if your report names them differently"
                    ),
                })
            }
        }
    }

    /// Canonical field name paired with its resolved index, in display order.
    pub fn fields(&self) -> [(&'static str, Option<usize>); 8]
    {
        [
            ("search term", Some(self.search_term)),
            ("campaign", Some(self.campaign)),
            ("ad group", Some(self.ad_group)),
            ("match type", self.match_type),
            ("orders", self.orders),
            ("sales", Some(self.sales)),
            ("spend", self.spend),
            ("clicks", self.clicks),
        ]
    }
}

/// Index of the first header containing any of `patterns`.
fn find_column<S: AsRef<str>>(
    headers: &[S],
    patterns: &[String],
) -> Option<usize>
{
    let needles: Vec<String> = patterns
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| p.to_lowercase())
        .collect();

    headers
        .iter()
        .position(|h| {
            let hay = h
                .as_ref()
                .to_lowercase();
            needles
                .iter()
                .any(|n| hay.contains(n.as_str()))
        })
}
