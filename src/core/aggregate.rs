//! Aggregation of normalized records into per-placement performance rows.
//!
//! A placement is one (search term, campaign, ad group, match type) key.
//! Metrics are summed first and ratios derived once afterwards, so a
//! placement's ROAS is total sales over total spend rather than a mean of
//! per-day ratios.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::core::normalize::{MatchType, PerformanceRecord};

/// Zero-guarded division: a non-positive denominator yields 0.
pub fn ratio(
    num: f64,
    den: f64,
) -> f64
{
    if den > 0.0 { num / den } else { 0.0 }
}

/// Summed metrics over any set of records or rows. Click sums saturate at
/// `u64::MAX`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals
{
    pub orders: f64,
    pub sales: f64,
    pub spend: f64,
    pub clicks: u64,
}

impl Totals
{
    fn add(
        &mut self,
        orders: f64,
        sales: f64,
        spend: f64,
        clicks: u64,
    )
    {
        self.orders += orders;
        self.sales += sales;
        self.spend += spend;
        self.clicks = self.clicks.saturating_add(clicks);
    }

    /// Totals across aggregated rows, zero-order rows included.
    pub fn of_rows<'a>(rows: impl IntoIterator<Item = &'a AggregatedRow>) -> Self
    {
        let mut t = Totals::default();
        for r in rows
        {
            t.add(r.orders, r.sales, r.spend, r.clicks);
        }
        t
    }

    pub fn roas(&self) -> f64
    {
        ratio(self.sales, self.spend)
    }
}

/// Performance of one search term in one campaign / ad group / match type.
/// Built once by [`aggregate`]; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedRow
{
    search_term: String,
    campaign: String,
    ad_group: String,
    match_type: MatchType,
    orders: f64,
    sales: f64,
    spend: f64,
    clicks: u64,
    record_count: usize,
    roas: f64,
    cpc: f64,
    acos: f64,
}

impl AggregatedRow
{
    /// Assemble a row from summed metrics, deriving ROAS, CPC and ACOS.
    pub fn new(
        search_term: impl Into<String>,
        campaign: impl Into<String>,
        ad_group: impl Into<String>,
        match_type: MatchType,
        totals: Totals,
        record_count: usize,
    ) -> Self
    {
        Self {
            search_term: search_term.into(),
            campaign: campaign.into(),
            ad_group: ad_group.into(),
            match_type,
            orders: totals.orders,
            sales: totals.sales,
            spend: totals.spend,
            clicks: totals.clicks,
            record_count,
            roas: ratio(totals.sales, totals.spend),
            cpc: ratio(totals.spend, totals.clicks as f64),
            acos: ratio(totals.spend, totals.sales) * 100.0,
        }
    }

    pub fn search_term(&self) -> &str
    {
        &self.search_term
    }

    pub fn campaign(&self) -> &str
    {
        &self.campaign
    }

    pub fn ad_group(&self) -> &str
    {
        &self.ad_group
    }

    pub fn match_type(&self) -> MatchType
    {
        self.match_type
    }

    pub fn orders(&self) -> f64
    {
        self.orders
    }

    pub fn sales(&self) -> f64
    {
        self.sales
    }

    pub fn spend(&self) -> f64
    {
        self.spend
    }

    pub fn clicks(&self) -> u64
    {
        self.clicks
    }

    /// Number of input records folded into this row.
    pub fn record_count(&self) -> usize
    {
        self.record_count
    }

    /// Sales / spend, 0 without spend.
    pub fn roas(&self) -> f64
    {
        self.roas
    }

    /// Spend / clicks, 0 without clicks.
    pub fn cpc(&self) -> f64
    {
        self.cpc
    }

    /// Spend / sales as a percentage, 0 without sales.
    pub fn acos(&self) -> f64
    {
        self.acos
    }
}

type PlacementKey = (String, String, String, MatchType);

/// Group records by placement and sum their metrics. Rows come out in the
/// order their key was first seen.
#[instrument(level = "debug", skip_all, fields(records = records.len()))]
pub fn aggregate(records: &[PerformanceRecord]) -> Vec<AggregatedRow>
{
    let mut groups: IndexMap<PlacementKey, (Totals, usize)> = IndexMap::new();

    for rec in records
    {
        let key = (
            rec.search_term
                .clone(),
            rec.campaign
                .clone(),
            rec.ad_group
                .clone(),
            rec.match_type,
        );
        let (totals, count) = groups
            .entry(key)
            .or_default();
        totals.add(rec.orders, rec.sales, rec.spend, rec.clicks);
        *count += 1;
    }

    debug!(placements = groups.len(), "aggregated records");

    groups
        .into_iter()
        .map(|((term, campaign, ad_group, match_type), (totals, count))| {
            AggregatedRow::new(term, campaign, ad_group, match_type, totals, count)
        })
        .collect()
}
