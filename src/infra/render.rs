//! Output renderers for analysis results: text, table, JSON and CSV.

use anyhow::{Context, Result};
use chrono::Utc;
use itertools::Itertools;
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;
use crate::core::aggregate::AggregatedRow;
use crate::core::analyze::{Analysis, AnalysisSummary};
use crate::core::winner::{Action, Decision, SelectionParams};

/// Bump when the JSON layout changes
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions
{
    /// ANSI colors in text output
    pub color: bool,
    /// Include every aggregated row in JSON output
    pub all_rows: bool,
}

pub fn render(
    analysis: &Analysis,
    format: OutputFormat,
    opts: &RenderOptions,
) -> Result<String>
{
    match format
    {
        OutputFormat::Text => Ok(render_text(analysis, opts)),
        OutputFormat::Table => Ok(render_table(analysis)),
        OutputFormat::Json => render_json(analysis, opts),
        OutputFormat::Csv => render_csv(&analysis.decisions),
    }
}

/// Counts print without decimals when whole.
fn fmt_count(v: f64) -> String
{
    if v.fract() == 0.0 { format!("{v:.0}") } else { format!("{v:.2}") }
}

fn reason_text(d: &Decision) -> String
{
    d.reason
        .map(|r| r.to_string())
        .unwrap_or_default()
}

fn placement(row: &AggregatedRow) -> String
{
    format!("{} / {} [{}]", row.campaign(), row.ad_group(), row.match_type())
}

fn render_text(
    analysis: &Analysis,
    opts: &RenderOptions,
) -> String
{
    let paint = |s: &str, action: Action| -> String {
        match (opts.color, action)
        {
            (false, _) => s.to_string(),
            (true, Action::Keep) => s
                .green()
                .bold()
                .to_string(),
            (true, Action::Negate) => s
                .red()
                .to_string(),
        }
    };

    let mut out = String::new();
    let s = &analysis.summary;

    if analysis
        .decisions
        .is_empty()
    {
        out.push_str("No cannibalization detected! Each search term is isolated to a single ad group.\n");
    }
    else
    {
        out.push_str(&format!(
            "Found {} search terms appearing in multiple ad groups.\n",
            s.cannibalized_terms
        ));

        for (term, decisions) in &analysis
            .decisions
            .iter()
            .chunk_by(|d| {
                d.row
                    .search_term()
                    .to_string()
            })
        {
            out.push('\n');
            if opts.color
            {
                out.push_str(&format!("{}\n", term.bold()));
            }
            else
            {
                out.push_str(&format!("{term}\n"));
            }

            for d in decisions
            {
                let label = format!("{:<6}", d.action.to_string());
                out.push_str(&format!(
                    "  {}  {}  orders {}  sales {:.2}  spend {:.2}  ROAS {:.2}",
                    paint(&label, d.action),
                    placement(&d.row),
                    fmt_count(d.row.orders()),
                    d.row.sales(),
                    d.row.spend(),
                    d.row.roas(),
                ));
                if let Some(reason) = d.reason
                {
                    out.push_str(&format!("  ({reason})"));
                }
                out.push('\n');
            }
        }
    }

    out.push('\n');
    out.push_str(&render_summary_text(s));
    out
}

fn render_summary_text(s: &AnalysisSummary) -> String
{
    format!(
        "Records: {}  Placements: {}  Account sales {:.2}  spend {:.2}  ROAS {:.2}\n\
         Terms: {}  Keep: {}  Negate: {}  Negated spend {:.2}  sales {:.2}\n",
        s.records,
        s.placements,
        s.account
            .sales,
        s.account
            .spend,
        s.account_roas,
        s.cannibalized_terms,
        s.kept,
        s.negated,
        s.negated_spend,
        s.negated_sales,
    )
}

#[derive(Tabled)]
struct DecisionView
{
    #[tabled(rename = "Search Term")]
    term: String,
    #[tabled(rename = "Campaign")]
    campaign: String,
    #[tabled(rename = "Ad Group")]
    ad_group: String,
    #[tabled(rename = "Match")]
    match_type: String,
    #[tabled(rename = "Orders")]
    orders: String,
    #[tabled(rename = "Sales")]
    sales: String,
    #[tabled(rename = "ROAS")]
    roas: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Winning Reason")]
    reason: String,
}

fn render_table(analysis: &Analysis) -> String
{
    if analysis
        .decisions
        .is_empty()
    {
        return "No cannibalization detected! Each search term is isolated to a single ad group.\n".to_string();
    }

    let views = analysis
        .decisions
        .iter()
        .map(|d| DecisionView {
            term: d
                .row
                .search_term()
                .to_string(),
            campaign: d
                .row
                .campaign()
                .to_string(),
            ad_group: d
                .row
                .ad_group()
                .to_string(),
            match_type: d
                .row
                .match_type()
                .to_string(),
            orders: fmt_count(d.row.orders()),
            sales: format!("{:.2}", d.row.sales()),
            roas: format!("{:.2}", d.row.roas()),
            action: d
                .action
                .to_string(),
            reason: reason_text(d),
        });

    let mut table = Table::new(views);
    table.with(Style::modern());
    format!("{table}\n")
}

#[derive(Serialize)]
struct JsonReport<'a>
{
    schema_version: u32,
    generated_at: chrono::DateTime<Utc>,
    params: &'a SelectionParams,
    summary: &'a AnalysisSummary,
    decisions: &'a [Decision],
    #[serde(skip_serializing_if = "Option::is_none")]
    rows: Option<&'a [AggregatedRow]>,
}

fn render_json(
    analysis: &Analysis,
    opts: &RenderOptions,
) -> Result<String>
{
    let report = JsonReport {
        schema_version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        params: &analysis.params,
        summary: &analysis.summary,
        decisions: &analysis.decisions,
        rows: opts
            .all_rows
            .then_some(analysis.rows.as_slice()),
    };

    let mut json = serde_json::to_string_pretty(&report).context("Failed to serialize JSON report")?;
    json.push('\n');
    Ok(json)
}

/// One spreadsheet-friendly line per decision.
#[derive(Serialize)]
struct CsvRow<'a>
{
    #[serde(rename = "Search Term")]
    term: &'a str,
    #[serde(rename = "Campaign")]
    campaign: &'a str,
    #[serde(rename = "Ad Group")]
    ad_group: &'a str,
    #[serde(rename = "Match Type")]
    match_type: &'static str,
    #[serde(rename = "Orders")]
    orders: String,
    #[serde(rename = "Sales")]
    sales: String,
    #[serde(rename = "Spend")]
    spend: String,
    #[serde(rename = "ROAS")]
    roas: String,
    #[serde(rename = "ACOS")]
    acos: String,
    #[serde(rename = "CPC")]
    cpc: String,
    #[serde(rename = "Action")]
    action: String,
    #[serde(rename = "Winning Reason")]
    reason: String,
}

fn render_csv(decisions: &[Decision]) -> Result<String>
{
    let mut writer = csv::Writer::from_writer(Vec::new());

    if decisions.is_empty()
    {
        writer.write_record([
            "Search Term",
            "Campaign",
            "Ad Group",
            "Match Type",
            "Orders",
            "Sales",
            "Spend",
            "ROAS",
            "ACOS",
            "CPC",
            "Action",
            "Winning Reason",
        ])?;
    }

    for d in decisions
    {
        let row = &d.row;
        writer
            .serialize(CsvRow {
                term: row.search_term(),
                campaign: row.campaign(),
                ad_group: row.ad_group(),
                match_type: row
                    .match_type()
                    .as_str(),
                orders: fmt_count(row.orders()),
                sales: format!("{:.2}", row.sales()),
                spend: format!("{:.2}", row.spend()),
                roas: format!("{:.2}", row.roas()),
                acos: format!("{:.2}", row.acos()),
                cpc: format!("{:.2}", row.cpc()),
                action: d
                    .action
                    .to_string(),
                reason: reason_text(d),
            })
            .context("Failed to write CSV row")?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}
