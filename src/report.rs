//! 実行レポート（標準出力向けの固定フォーマット）。
use std::fmt::{self, Write as _};

use serde_json::Value;

use crate::model::ResultRecord;
use crate::pipeline::MappingMetrics;
use crate::util::text::ellipsize;

/// レポートに表示する reasoning の最大文字数。
pub const REASONING_PREVIEW_CHARS: usize = 150;

const RULE_WIDTH: usize = 70;

pub struct ExecutionReport<'a> {
    records: &'a [ResultRecord],
    metrics: &'a MappingMetrics,
    cost_per_million_tokens: f64,
    log_path: &'a str,
}

impl<'a> ExecutionReport<'a> {
    #[must_use]
    pub fn new(
        records: &'a [ResultRecord],
        metrics: &'a MappingMetrics,
        cost_per_million_tokens: f64,
        log_path: &'a str,
    ) -> Self {
        Self {
            records,
            metrics,
            cost_per_million_tokens,
            log_path,
        }
    }

    #[must_use]
    pub fn mapped_count(&self) -> usize {
        self.records.iter().filter(|r| !r.is_unmapped()).count()
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        self.mapped_count() as f64 / self.records.len() as f64 * 100.0
    }

    fn render(&self, out: &mut String) -> fmt::Result {
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);
        let total = self.records.len();
        let mapped = self.mapped_count();

        writeln!(out)?;
        writeln!(out, "{heavy}")?;
        writeln!(out, "AI TAXONOMY MAPPER - EXECUTION REPORT")?;
        writeln!(out, "{heavy}")?;
        writeln!(out)?;
        writeln!(out, "[OK] PROCESSING SUMMARY")?;
        writeln!(out, "   Total Cases: {total}")?;
        writeln!(out, "   Successfully Mapped: {mapped}")?;
        writeln!(out, "   Unmapped: {}", total - mapped)?;
        writeln!(out, "   Success Rate: {:.1}%", self.success_rate())?;
        writeln!(out)?;
        writeln!(out, "[OK] AI METRICS")?;
        writeln!(out, "   Total LLM Calls: {}", self.metrics.llm_call_count)?;
        writeln!(out, "   Total Tokens: {}", self.metrics.total_tokens)?;
        writeln!(
            out,
            "   Avg Tokens/Case: {:.1}",
            self.metrics.avg_tokens_per_call()
        )?;
        writeln!(
            out,
            "   Estimated Cost: ${:.4}",
            self.metrics.estimated_cost(self.cost_per_million_tokens)
        )?;
        writeln!(out)?;
        writeln!(out, "[OK] VALIDATION & SAFETY")?;
        writeln!(
            out,
            "   Validation Triggers: {}",
            self.metrics.validation_triggers
        )?;
        writeln!(
            out,
            "   Hallucinations Caught: {}",
            self.metrics.hallucinations_caught
        )?;
        writeln!(out)?;
        writeln!(out, "[OK] DETAILED RESULTS")?;
        writeln!(out, "{light}")?;
        writeln!(out)?;

        for record in self.records {
            writeln!(
                out,
                "[>] Case {}: {}",
                record.test_case_id,
                render_tags(&record.user_tags)
            )?;
            writeln!(out, "   Classification: {}", record.mapped_category)?;
            writeln!(out, "   Confidence: {}", record.confidence)?;
            writeln!(
                out,
                "   Validated: {}",
                if record.validated { "Yes" } else { "No" }
            )?;
            writeln!(
                out,
                "   Reasoning: {}",
                ellipsize(&record.reasoning, REASONING_PREVIEW_CHARS)
            )?;
            writeln!(out)?;
        }

        writeln!(out, "{heavy}")?;
        writeln!(
            out,
            "[OK] Analysis Complete! Check '{}' for full details.",
            self.log_path
        )?;
        writeln!(out, "{heavy}")
    }
}

impl fmt::Display for ExecutionReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.render(&mut out)?;
        f.write_str(&out)
    }
}

fn render_tags(tags: &Value) -> String {
    match tags {
        Value::String(tag) => tag.clone(),
        Value::Null => "[]".to_string(),
        other => other.to_string(),
    }
}
