//! 1回の実行を通した分類メトリクスの累積器。
//!
//! パイプラインは状態を持たず、呼び出し側がこの値を `&mut` で渡す。
use crate::util::text::word_count;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappingMetrics {
    pub llm_call_count: u64,
    /// 送信プロンプトの語数合計（コスト見積もり用の概算）。
    pub total_tokens: u64,
    pub validation_triggers: u64,
    pub hallucinations_caught: u64,
}

impl MappingMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// LLM呼び出し1回分を記録する。
    pub fn record_llm_call(&mut self, prompt: &str) {
        self.llm_call_count += 1;
        self.total_tokens += word_count(prompt) as u64;
    }

    pub fn record_hallucination(&mut self) {
        self.hallucinations_caught += 1;
    }

    pub fn record_validation_trigger(&mut self) {
        self.validation_triggers += 1;
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_tokens_per_call(&self) -> f64 {
        if self.llm_call_count == 0 {
            return 0.0;
        }
        self.total_tokens as f64 / self.llm_call_count as f64
    }

    /// 100万トークンあたりの単価からコストを見積もる。
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn estimated_cost(&self, cost_per_million_tokens: f64) -> f64 {
        self.total_tokens as f64 / 1_000_000.0 * cost_per_million_tokens
    }
}
