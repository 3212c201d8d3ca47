//! Error taxonomy for report analysis.
//!
//! Schema problems abort the run before any output is produced. Bad metric
//! cells and zero denominators never surface here; they are absorbed as zero
//! by the normalizer and the aggregator.

use miette::Diagnostic;

/// Input report does not have the shape the analysis needs.
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum SchemaError
{
    #[error("missing required column(s): {}", .missing.join(", "))]
    #[diagnostic(code(cannibal::schema::missing_columns))]
    MissingColumns
    {
        missing: Vec<&'static str>,

        /// Lists the headers that were found
        #[help]
        help: String,
    },

    #[error("report {path} has no header row")]
    #[diagnostic(code(cannibal::schema::empty_report))]
    EmptyReport
    {
        path: String,
    },
}

/// Selection parameters outside their accepted ranges.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError
{
    #[error("improvement threshold {0}% is outside 30..=200")]
    Threshold(u32),

    #[error("min orders {0} is outside 1..=10")]
    MinOrders(u32),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn missing_columns_message_lists_fields()
    {
        let err = SchemaError::MissingColumns {
            missing: vec!["campaign", "ad group"],
            help: "available headers: Date, Clicks".to_string(),
        };

        assert_eq!(err.to_string(), "missing required column(s): campaign, ad group");
    }

    #[test]
    fn param_error_messages()
    {
        assert_eq!(ParamError::Threshold(250).to_string(), "improvement threshold 250% is outside 30..=200");
        assert_eq!(ParamError::MinOrders(0).to_string(), "min orders 0 is outside 1..=10");
    }
}
