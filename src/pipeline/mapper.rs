//! 分類パイプライン本体。
//!
//! 候補抽出 → (候補なしなら短絡) → プロンプト生成 → LLM呼び出し → 検証 の順に処理する。
use std::sync::Arc;

use aho_corasick::BuildError;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::clients::CompletionBackend;
use crate::model::{ClassificationCase, ClassificationResult, MAX_MATCHED_PATTERNS};
use crate::schema::model_output::{ModelResponseError, parse_model_output};
use crate::taxonomy::{KeywordSignals, Taxonomy};

use super::candidates::{CandidateExtractor, CandidateSet};
use super::metrics::MappingMetrics;
use super::prompt::build_prompt;
use super::validator::CategoryValidator;

/// ケース単位のシステムエラー。バッチ側で縮退結果に変換される。
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("completion request failed: {0:#}")]
    Completion(#[source] anyhow::Error),
    #[error(transparent)]
    MalformedResponse(#[from] ModelResponseError),
    #[error("invalid case record: {0}")]
    InvalidCase(#[source] serde_json::Error),
}

pub struct TaxonomyMapper {
    extractor: CandidateExtractor,
    validator: CategoryValidator,
    backend: Arc<dyn CompletionBackend>,
}

impl TaxonomyMapper {
    /// タクソノミーとキーワード表からパイプラインを構築する。
    ///
    /// キーワード表の被覆漏れは警告ログに出すだけで補正しない。
    ///
    /// # Errors
    /// キーワード照合器の構築に失敗した場合はエラーを返す。
    pub fn new(
        taxonomy: Arc<Taxonomy>,
        signals: &KeywordSignals,
        backend: Arc<dyn CompletionBackend>,
    ) -> Result<Self, BuildError> {
        signals.warn_on_coverage_gaps(&taxonomy);
        let extractor = CandidateExtractor::new(&taxonomy, signals)?;
        let validator = CategoryValidator::new(taxonomy);
        Ok(Self {
            extractor,
            validator,
            backend,
        })
    }

    /// 1件のケースを分類する。
    ///
    /// # Errors
    /// LLM呼び出しの失敗、または応答が解釈できない場合は [`ClassifyError`] を返す。
    #[instrument(skip_all, fields(case_id = %case.id))]
    pub async fn classify(
        &self,
        case: &ClassificationCase,
        metrics: &mut MappingMetrics,
    ) -> Result<ClassificationResult, ClassifyError> {
        self.map_story(&case.user_tags, &case.story_snippet, metrics)
            .await
    }

    /// # Errors
    /// LLM呼び出しの失敗、または応答が解釈できない場合は [`ClassifyError`] を返す。
    pub async fn map_story(
        &self,
        user_tags: &Value,
        story_snippet: &str,
        metrics: &mut MappingMetrics,
    ) -> Result<ClassificationResult, ClassifyError> {
        let CandidateSet {
            candidates,
            mut matched_patterns,
        } = self.extractor.extract(story_snippet);

        if candidates.is_empty() {
            debug!("no keyword signals matched; skipping model call");
            return Ok(ClassificationResult::no_signal());
        }

        debug!(
            candidates = ?candidates,
            matched_patterns = ?matched_patterns,
            "candidate subgenres extracted"
        );

        let prompt = build_prompt(&candidates, user_tags, story_snippet);
        metrics.record_llm_call(&prompt);

        let content = self
            .backend
            .complete(&prompt)
            .await
            .map_err(ClassifyError::Completion)?;
        let verdict = parse_model_output(&content)?;

        let (mapped_category, validated) = self
            .validator
            .validate(&verdict.mapped_category, metrics);
        if validated {
            metrics.record_validation_trigger();
        }

        matched_patterns.truncate(MAX_MATCHED_PATTERNS);

        Ok(ClassificationResult {
            mapped_category,
            confidence: verdict.confidence,
            reasoning: verdict.reasoning,
            validated,
            matched_patterns,
        })
    }
}
