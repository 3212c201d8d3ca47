//! End-to-end cannibalization analysis: normalize → aggregate → detect → decide.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::cli::{AnalyzeArgs, AppContext};
use crate::core::aggregate::{AggregatedRow, Totals, aggregate};
use crate::core::detect::{CannibalGroup, detect};
use crate::core::normalize::{PerformanceRecord, normalize_rows};
use crate::core::winner::{Action, Decision, SelectionParams, decide_all};
use crate::infra::columns::ColumnMap;
use crate::infra::config::{Config, load_config};
use crate::infra::io::{read_report, write_output};
use crate::infra::render::{RenderOptions, render};

/// Account-level figures for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary
{
    /// Normalized input records
    pub records: usize,
    /// Distinct (term, campaign, ad group, match type) rows
    pub placements: usize,
    /// Totals over every placement, zero-order ones included
    pub account: Totals,
    pub account_roas: f64,
    pub cannibalized_terms: usize,
    pub kept: usize,
    pub negated: usize,
    /// Spend and sales currently attributed to rows marked NEGATE
    pub negated_spend: f64,
    pub negated_sales: f64,
}

/// Result of one run over a report.
#[derive(Debug, Clone)]
pub struct Analysis
{
    pub params: SelectionParams,
    pub rows: Vec<AggregatedRow>,
    pub groups: Vec<CannibalGroup>,
    pub decisions: Vec<Decision>,
    pub summary: AnalysisSummary,
}

impl Analysis
{
    /// Run the pipeline over already-normalized records.
    #[instrument(level = "debug", skip_all, fields(records = records.len()))]
    pub fn run(
        records: &[PerformanceRecord],
        params: &SelectionParams,
    ) -> Self
    {
        let rows = aggregate(records);
        let groups = detect(&rows);
        let decisions = decide_all(&groups, params);

        let account = Totals::of_rows(&rows);
        let negated: Vec<&Decision> = decisions
            .iter()
            .filter(|d| d.action == Action::Negate)
            .collect();

        let summary = AnalysisSummary {
            records: records.len(),
            placements: rows.len(),
            account_roas: account.roas(),
            account,
            cannibalized_terms: groups.len(),
            kept: decisions.len() - negated.len(),
            negated: negated.len(),
            negated_spend: negated
                .iter()
                .map(|d| d.row.spend())
                .sum(),
            negated_sales: negated
                .iter()
                .map(|d| d.row.sales())
                .sum(),
        };

        Self { params: *params, rows, groups, decisions, summary }
    }
}

/// Merge CLI overrides over configured selection parameters and validate.
fn selection_params(
    args: &AnalyzeArgs,
    config: &Config,
) -> Result<SelectionParams>
{
    let params = SelectionParams {
        improvement_threshold_percent: args
            .threshold
            .unwrap_or(config.analysis.improvement_threshold_percent),
        min_orders: args
            .min_orders
            .unwrap_or(config.analysis.min_orders),
        tie_break: args
            .tie_break
            .unwrap_or(config.analysis.tie_break),
    };
    params.validate()?;
    Ok(params)
}

pub fn run(
    args: AnalyzeArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config = load_config(args.config.as_deref())?;
    let params = selection_params(&args, &config)?;
    let format = args
        .format
        .unwrap_or(config.output.format);

    let report = read_report(&args.report)
        .with_context(|| format!("Failed to load report {}", args.report.display()))?;
    let columns = ColumnMap::resolve(report.headers.as_slice(), &config.columns)?;

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("{}", "DRY RUN: Would analyze:".yellow());
            println!("  Report: {} ({} rows)", args.report.display(), report.rows.len());
            for (field, idx) in columns.fields()
            {
                let header = idx
                    .and_then(|i| report.headers.get(i))
                    .map(String::as_str)
                    .unwrap_or("(not found, reads as zero)");
                println!("  {field:<12} <- {header}");
            }
            println!(
                "  Threshold: {}%  Min orders: {}  Tie-break: {:?}",
                params.improvement_threshold_percent, params.min_orders, params.tie_break
            );
        }
        return Ok(());
    }

    if columns.orders.is_none()
    {
        warn!(
            report = %args.report.display(),
            "no orders or units column found; every placement reads 0 orders and none can be cannibalized"
        );
    }

    let records = normalize_rows(&report.rows, &columns);
    let analysis = Analysis::run(&records, &params);

    info!(
        records = analysis.summary.records,
        placements = analysis.summary.placements,
        terms = analysis.summary.cannibalized_terms,
        negated = analysis.summary.negated,
        "analysis complete"
    );

    let opts = RenderOptions { color: !ctx.no_color && args.output.is_none(), all_rows: args.all_rows };
    let rendered = render(&analysis, format, &opts)?;

    match args.output
    {
        Some(path) =>
        {
            let path = match &config.output.output_dir
            {
                Some(dir) if path.is_relative() => dir.join(path),
                _ => path,
            };
            write_output(&path, &rendered)?;
            if !ctx.quiet
            {
                let check = if ctx.no_color { "✓".to_string() } else { "✓".green().to_string() };
                println!(
                    "{} Wrote {} decisions for {} terms to {}",
                    check,
                    analysis.decisions.len(),
                    analysis.summary.cannibalized_terms,
                    path.display()
                );
            }
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::normalize::MatchType;

    fn rec(
        term: &str,
        campaign: &str,
        orders: f64,
        sales: f64,
        spend: f64,
    ) -> PerformanceRecord
    {
        PerformanceRecord {
            search_term: term.to_string(),
            campaign: campaign.to_string(),
            ad_group: "AG".to_string(),
            match_type: MatchType::Exact,
            orders,
            sales,
            spend,
            clicks: 10,
        }
    }

    #[test]
    fn run_builds_decisions_and_summary()
    {
        let records = vec![
            rec("shoes", "A", 3.0, 60.0, 30.0),
            rec("shoes", "B", 3.0, 40.0, 10.0),
            rec("shoes", "A", 2.0, 40.0, 20.0),
            rec("socks", "A", 1.0, 10.0, 5.0),
            rec("socks", "B", 0.0, 0.0, 7.0),
        ];

        let analysis = Analysis::run(&records, &SelectionParams::default());

        assert_eq!(analysis.rows.len(), 4);
        assert_eq!(analysis.groups.len(), 1);
        // A: 100 sales / 50 spend = 2.0, B: 40 / 10 = 4.0 → +100% with 3 orders
        let keep = analysis
            .decisions
            .iter()
            .find(|d| d.action == Action::Keep)
            .unwrap();
        assert_eq!(keep.row.campaign(), "B");
        assert_eq!(keep.reason.unwrap().to_string(), "Efficient (ROAS +100%)");

        let s = &analysis.summary;
        assert_eq!(s.records, 5);
        assert_eq!(s.placements, 4);
        assert_eq!(s.account.spend, 72.0);
        assert_eq!(s.account.orders, 9.0);
        assert_eq!((s.kept, s.negated), (1, 1));
        assert_eq!(s.negated_spend, 50.0);
        assert_eq!(s.negated_sales, 100.0);
    }

    #[test]
    fn run_without_duplicates_is_empty()
    {
        let records = vec![rec("shoes", "A", 1.0, 10.0, 5.0), rec("socks", "B", 1.0, 10.0, 5.0)];

        let analysis = Analysis::run(&records, &SelectionParams::default());

        assert!(analysis.groups.is_empty());
        assert!(analysis.decisions.is_empty());
        assert_eq!(analysis.summary.account.sales, 20.0);
    }
}
