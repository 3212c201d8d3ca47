//! Winner selection for cannibalized search terms.
//!
//! Within a group the sales leader keeps the term by default. The ROAS leader
//! takes it over only when its ROAS beats the sales leader's by at least the
//! configured improvement AND it has enough orders for that ROAS to mean
//! something. Every other member is marked for negation.

use rayon::prelude::*;
use serde::{Deserialize, Serialize, Serializer};

use crate::core::aggregate::AggregatedRow;
use crate::core::detect::CannibalGroup;
use crate::core::error::ParamError;

/// Accepted range for the improvement threshold, in percent.
pub const THRESHOLD_RANGE: std::ops::RangeInclusive<u32> = 30..=200;
/// Accepted range for the minimum orders a ROAS leader needs.
pub const MIN_ORDERS_RANGE: std::ops::RangeInclusive<u32> = 1..=10;

/// Order in which members are scanned when looking for the first maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak
{
    /// Campaign, then ad group, then match type, ascending
    #[default]
    Name,
    /// Report order (first placement seen wins a tie)
    FirstSeen,
}

/// Knobs of the decision rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionParams
{
    /// ROAS improvement (percent) the ROAS leader needs over the sales leader
    pub improvement_threshold_percent: u32,

    /// Orders the ROAS leader needs before its ROAS is trusted
    pub min_orders: u32,

    pub tie_break: TieBreak,
}

impl Default for SelectionParams
{
    fn default() -> Self
    {
        Self { improvement_threshold_percent: 100, min_orders: 2, tie_break: TieBreak::Name }
    }
}

impl SelectionParams
{
    pub fn validate(&self) -> Result<(), ParamError>
    {
        if !THRESHOLD_RANGE.contains(&self.improvement_threshold_percent)
        {
            return Err(ParamError::Threshold(self.improvement_threshold_percent));
        }
        if !MIN_ORDERS_RANGE.contains(&self.min_orders)
        {
            return Err(ParamError::MinOrders(self.min_orders));
        }
        Ok(())
    }
}

/// Relative ROAS gain of the ROAS leader over the sales leader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Improvement
{
    Ratio(f64),
    /// Sales leader has zero ROAS; no ratio exists and any gain counts
    Unbounded,
}

impl Improvement
{
    fn between(
        challenger_roas: f64,
        leader_roas: f64,
    ) -> Self
    {
        if leader_roas > 0.0
        {
            Improvement::Ratio((challenger_roas - leader_roas) / leader_roas)
        }
        else
        {
            Improvement::Unbounded
        }
    }

    fn reaches(
        &self,
        threshold: f64,
    ) -> bool
    {
        match self
        {
            Improvement::Ratio(r) => *r >= threshold,
            Improvement::Unbounded => true,
        }
    }
}

/// Why a member keeps the search term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reason
{
    BestSalesAndRoas,
    Efficient(Improvement),
    VolumeLeader,
}

impl std::fmt::Display for Reason
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result
    {
        match self
        {
            Reason::BestSalesAndRoas => f.write_str("Best Sales & ROAS"),
            Reason::Efficient(Improvement::Ratio(r)) => write!(f, "Efficient (ROAS +{:.0}%)", r * 100.0),
            Reason::Efficient(Improvement::Unbounded) => f.write_str("Efficient (ROAS +∞%)"),
            Reason::VolumeLeader => f.write_str("Volume Leader"),
        }
    }
}

impl Serialize for Reason
{
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action
{
    Keep,
    Negate,
}

impl std::fmt::Display for Action
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result
    {
        match self
        {
            Action::Keep => f.write_str("KEEP"),
            Action::Negate => f.write_str("NEGATE"),
        }
    }
}

/// Verdict for one member of a cannibal group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision
{
    #[serde(flatten)]
    pub row: AggregatedRow,
    pub action: Action,
    /// Set for KEEP only
    pub reason: Option<Reason>,
}

/// Member indices in the order they are scanned for maxima. Name order
/// compares match types by their label text.
fn scan_order(
    members: &[AggregatedRow],
    tie_break: TieBreak,
) -> Vec<usize>
{
    let mut order: Vec<usize> = (0..members.len()).collect();
    if tie_break == TieBreak::Name
    {
        order.sort_by(|&a, &b| {
            let (a, b) = (&members[a], &members[b]);
            (a.campaign(), a.ad_group(), a.match_type().as_str()).cmp(&(
                b.campaign(),
                b.ad_group(),
                b.match_type().as_str(),
            ))
        });
    }
    order
}

/// First index in `order` holding the maximum of `key`.
fn first_max(
    order: &[usize],
    members: &[AggregatedRow],
    key: impl Fn(&AggregatedRow) -> f64,
) -> usize
{
    let mut best = order[0];
    for &i in &order[1..]
    {
        if key(&members[i]) > key(&members[best])
        {
            best = i;
        }
    }
    best
}

/// Pick the member that keeps the search term. Returns its index into
/// `group.members` with the reason it won.
///
/// `group` must hold at least two members, which every group produced by
/// [`detect`](crate::core::detect::detect) does.
pub fn select_winner(
    group: &CannibalGroup,
    params: &SelectionParams,
) -> (usize, Reason)
{
    debug_assert!(group.members.len() >= 2, "cannibal group {:?} needs at least two members", group.search_term);

    let members = &group.members;
    let order = scan_order(members, params.tie_break);

    let sales_idx = first_max(&order, members, AggregatedRow::sales);
    let roas_idx = first_max(&order, members, AggregatedRow::roas);

    if sales_idx == roas_idx
    {
        return (sales_idx, Reason::BestSalesAndRoas);
    }

    let sales_leader = &members[sales_idx];
    let roas_leader = &members[roas_idx];
    let improvement = Improvement::between(roas_leader.roas(), sales_leader.roas());
    let threshold = f64::from(params.improvement_threshold_percent) / 100.0;

    if improvement.reaches(threshold) && roas_leader.orders() >= f64::from(params.min_orders)
    {
        (roas_idx, Reason::Efficient(improvement))
    }
    else
    {
        (sales_idx, Reason::VolumeLeader)
    }
}

/// Label every member of `group`: KEEP for the winner, NEGATE for the rest.
pub fn decide_group(
    group: &CannibalGroup,
    params: &SelectionParams,
) -> Vec<Decision>
{
    let (winner, reason) = select_winner(group, params);

    group
        .members
        .iter()
        .enumerate()
        .map(|(i, row)| {
            if i == winner
            {
                Decision { row: row.clone(), action: Action::Keep, reason: Some(reason) }
            }
            else
            {
                Decision { row: row.clone(), action: Action::Negate, reason: None }
            }
        })
        .collect()
}

/// Decide every group. Groups are independent and evaluated in parallel;
/// the output keeps group order.
pub fn decide_all(
    groups: &[CannibalGroup],
    params: &SelectionParams,
) -> Vec<Decision>
{
    let per_group: Vec<Vec<Decision>> = groups
        .par_iter()
        .map(|g| decide_group(g, params))
        .collect();

    per_group
        .into_iter()
        .flatten()
        .collect()
}
