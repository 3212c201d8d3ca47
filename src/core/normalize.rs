//! Row normalization: metric coercion and match type classification.
//!
//! Nothing in here fails. A cell that does not parse as a finite number is a
//! zero, so that summing normalized records never loses a row. Every metric
//! is non-negative: negative cells clamp to zero.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::infra::columns::ColumnMap;

/// Keyword match mode that triggered an ad for a search term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatchType
{
    #[serde(rename = "EXACT")]
    Exact,
    #[serde(rename = "PHRASE")]
    Phrase,
    #[serde(rename = "BROAD")]
    Broad,
    #[serde(rename = "AUTO/OTHER")]
    AutoOther,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl MatchType
{
    /// Classify raw match type text. Substrings are checked in the order
    /// EXACT, PHRASE, BROAD; anything else present is AUTO/OTHER, an absent
    /// or blank cell is UNKNOWN.
    pub fn classify(raw: Option<&str>) -> Self
    {
        let Some(raw) = raw
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else
        {
            return MatchType::Unknown;
        };

        let upper = raw.to_uppercase();
        if upper.contains("EXACT")
        {
            MatchType::Exact
        }
        else if upper.contains("PHRASE")
        {
            MatchType::Phrase
        }
        else if upper.contains("BROAD")
        {
            MatchType::Broad
        }
        else
        {
            MatchType::AutoOther
        }
    }

    pub fn as_str(&self) -> &'static str
    {
        match self
        {
            MatchType::Exact => "EXACT",
            MatchType::Phrase => "PHRASE",
            MatchType::Broad => "BROAD",
            MatchType::AutoOther => "AUTO/OTHER",
            MatchType::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for MatchType
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result
    {
        f.write_str(self.as_str())
    }
}

/// Parse a metric cell; absent, blank, unparsable or non-finite is 0.0 and
/// negatives clamp to 0.0.
pub fn parse_metric(raw: Option<&str>) -> f64
{
    raw.map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map_or(0.0, |v| v.max(0.0))
}

/// Parse a count cell. Same coercion as [`parse_metric`], then rounded;
/// values past `u64::MAX` saturate.
pub fn parse_count(raw: Option<&str>) -> u64
{
    // float-to-int `as` saturates
    parse_metric(raw).round() as u64
}

/// One cleaned row of a search term report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord
{
    pub search_term: String,
    pub campaign: String,
    pub ad_group: String,
    pub match_type: MatchType,
    pub orders: f64,
    pub sales: f64,
    pub spend: f64,
    pub clicks: u64,
}

impl PerformanceRecord
{
    /// Build a record from one raw report row using resolved column indices.
    /// Short rows read missing cells as absent.
    pub fn from_row(
        row: &csv::StringRecord,
        columns: &ColumnMap,
    ) -> Self
    {
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i));
        let text = |idx: usize| {
            row.get(idx)
                .unwrap_or_default()
                .trim()
                .to_string()
        };

        Self {
            search_term: text(columns.search_term),
            campaign: text(columns.campaign),
            ad_group: text(columns.ad_group),
            match_type: MatchType::classify(cell(columns.match_type)),
            orders: parse_metric(cell(columns.orders)),
            sales: parse_metric(cell(Some(columns.sales))),
            spend: parse_metric(cell(columns.spend)),
            clicks: parse_count(cell(columns.clicks)),
        }
    }
}

/// Normalize every raw row. Rows without a search term, campaign or ad group
/// cannot be attributed to a placement and are dropped.
pub fn normalize_rows(
    rows: &[csv::StringRecord],
    columns: &ColumnMap,
) -> Vec<PerformanceRecord>
{
    let records: Vec<PerformanceRecord> = rows
        .iter()
        .map(|row| PerformanceRecord::from_row(row, columns))
        .filter(|r| !r.search_term.is_empty() && !r.campaign.is_empty() && !r.ad_group.is_empty())
        .collect();

    let dropped = rows.len() - records.len();
    if dropped > 0
    {
        debug!(dropped, "skipped rows without term, campaign or ad group");
    }
    records
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn normalize_rows_drops_unattributable_rows()
    {
        let columns = ColumnMap {
            search_term: 0,
            campaign: 1,
            ad_group: 2,
            sales: 3,
            match_type: None,
            orders: None,
            spend: None,
            clicks: None,
        };
        let rows = vec![
            csv::StringRecord::from(vec!["shoes", "A", "1", "10"]),
            csv::StringRecord::from(vec!["", "A", "1", "10"]),
            csv::StringRecord::from(vec!["shoes", "A", " ", "10"]),
        ];

        let records = normalize_rows(&rows, &columns);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].match_type, MatchType::Unknown);
    }

    #[test]
    fn classify_follows_priority_order()
    {
        assert_eq!(MatchType::classify(Some("exact")), MatchType::Exact);
        assert_eq!(MatchType::classify(Some("Phrase")), MatchType::Phrase);
        assert_eq!(MatchType::classify(Some("BROAD")), MatchType::Broad);
        // EXACT wins over anything later in the priority list
        assert_eq!(MatchType::classify(Some("broad-exact")), MatchType::Exact);
        assert_eq!(MatchType::classify(Some("phrase broad")), MatchType::Phrase);
    }

    #[test]
    fn classify_fallbacks()
    {
        assert_eq!(MatchType::classify(Some("-")), MatchType::AutoOther);
        assert_eq!(MatchType::classify(Some("TARGETING_EXPRESSION")), MatchType::AutoOther);
        assert_eq!(MatchType::classify(None), MatchType::Unknown);
        assert_eq!(MatchType::classify(Some("   ")), MatchType::Unknown);
    }

    #[test]
    fn parse_metric_coerces_to_zero()
    {
        assert_eq!(parse_metric(Some("12.5")), 12.5);
        assert_eq!(parse_metric(Some(" 3 ")), 3.0);
        assert_eq!(parse_metric(Some("")), 0.0);
        assert_eq!(parse_metric(Some("n/a")), 0.0);
        assert_eq!(parse_metric(Some("$1,200")), 0.0);
        assert_eq!(parse_metric(Some("NaN")), 0.0);
        assert_eq!(parse_metric(Some("inf")), 0.0);
        assert_eq!(parse_metric(None), 0.0);
    }

    #[test]
    fn negative_metrics_clamp_to_zero()
    {
        assert_eq!(parse_metric(Some("-12.5")), 0.0);
        assert_eq!(parse_metric(Some("-0")), 0.0);
        assert_eq!(parse_count(Some("-4")), 0);
    }

    #[test]
    fn parse_count_rounds_and_clamps()
    {
        assert_eq!(parse_count(Some("7")), 7);
        assert_eq!(parse_count(Some("7.6")), 8);
        assert_eq!(parse_count(Some("x")), 0);
        assert_eq!(parse_count(Some("1e20")), u64::MAX);
    }

    #[test]
    fn from_row_uses_column_map()
    {
        let columns = ColumnMap {
            search_term: 0,
            campaign: 1,
            ad_group: 2,
            sales: 3,
            match_type: Some(4),
            orders: Some(5),
            spend: None,
            clicks: Some(9),
        };
        let row = csv::StringRecord::from(vec![" red shoes ", "Camp A", "AG 1", "49.90", "Exact", "abc"]);

        let rec = PerformanceRecord::from_row(&row, &columns);

        assert_eq!(rec.search_term, "red shoes");
        assert_eq!(rec.campaign, "Camp A");
        assert_eq!(rec.match_type, MatchType::Exact);
        assert_eq!(rec.sales, 49.90);
        assert_eq!(rec.orders, 0.0);
        assert_eq!(rec.spend, 0.0);
        assert_eq!(rec.clicks, 0);
    }
}
