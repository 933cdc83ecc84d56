//! User message template for a single-stock analysis

use minijinja::Environment;
use serde::Serialize;

use crate::error::Result;

const ANALYSIS_TEMPLATE: &str = r"Based on the following financial data for {{ ticker }}:
{{ financial_data }}
{%- if sentiment %}

{{ sentiment }}
{%- endif %}

Is the user holding the stock? {{ 'y' if holding else 'n' }}

*y = yes, n = no*

Use this information to provide a comprehensive financial analysis and investment recommendation.

Not just the ticker, but also state the company name, and the industry it is in.

Please provide a comprehensive financial analysis including:
1. Investment recommendation (Buy, Sell, Hold, etc)
2. Key financial metrics analysis
3. Risk assessments
4. Short-term and long-term outlook
5. Important factors influencing the stock
6. Potential price targets

Always finish with a short conclusion that states the recommendation again.

Present the analysis in a clear, structured format using plain text only. Do not use markdown.";

/// Variables for the analysis template
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisContext {
    pub ticker: String,
    /// Pre-rendered `label: value` lines of the quote snapshot
    pub financial_data: String,
    pub holding: bool,
    /// `Market Sentiment: ...` line, omitted when absent
    pub sentiment: Option<String>,
}

/// Render the analysis request
pub fn analysis_prompt(context: &AnalysisContext) -> Result<String> {
    let env = Environment::new();
    Ok(env.render_str(ANALYSIS_TEMPLATE, context)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(sentiment: Option<&str>) -> AnalysisContext {
        AnalysisContext {
            ticker: "AAPL".to_string(),
            financial_data: "Symbol: AAPL\nCurrent Price: 189.50".to_string(),
            holding: true,
            sentiment: sentiment.map(str::to_string),
        }
    }

    #[test]
    fn test_prompt_embeds_snapshot_and_holding() {
        let prompt = analysis_prompt(&context(None)).unwrap();
        assert!(prompt.starts_with("Based on the following financial data for AAPL:\nSymbol: AAPL"));
        assert!(prompt.contains("Is the user holding the stock? y"));
        assert!(prompt.contains("6. Potential price targets"));
        assert!(prompt.contains("conclusion"));
        assert!(prompt.contains("plain text only"));
    }

    #[test]
    fn test_sentiment_line_only_when_present() {
        let without = analysis_prompt(&context(None)).unwrap();
        assert!(!without.contains("Market Sentiment"));

        let line = "Market Sentiment: Bullish (Score: 0.41)";
        let with = analysis_prompt(&context(Some(line))).unwrap();
        assert!(with.contains("Current Price: 189.50\n\nMarket Sentiment: Bullish (Score: 0.41)\n"));
    }

    #[test]
    fn test_not_holding() {
        let mut ctx = context(None);
        ctx.holding = false;
        let prompt = analysis_prompt(&ctx).unwrap();
        assert!(prompt.contains("Is the user holding the stock? n"));
    }
}
