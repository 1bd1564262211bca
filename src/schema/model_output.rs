//! LLM分類応答のJSON Schemaと寛容パーサ。
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use super::validate_json;

/// `confidence` が省略された場合の既定値。
pub(crate) const DEFAULT_CONFIDENCE: f64 = 0.85;

const CODE_FENCE: &str = "```";

/// 分類応答のJSON Schema。
pub(crate) static MODEL_OUTPUT_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://alt.dev/schemas/taxonomy-mapper/model-output.json",
        "title": "Taxonomy Mapper Model Output",
        "description": "Classification verdict returned by the completion endpoint",
        "type": "object",
        "properties": {
            "mapped_category": {
                "type": "string",
                "description": "Genre/Sub-genre or [UNMAPPED]"
            },
            "confidence": {
                "type": ["number", "null"],
                "description": "Model confidence, expected in [0, 1]"
            },
            "reasoning": {
                "type": "string",
                "description": "Brief justification based on story context"
            }
        },
        "required": ["mapped_category", "reasoning"]
    })
});

/// モデル応答が解釈できなかった場合のエラー。
#[derive(Debug, Error)]
pub enum ModelResponseError {
    #[error("model response was empty")]
    Empty,
    #[error("malformed model response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("model response violated output schema: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),
}

/// 検証前のモデル判定。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelVerdict {
    pub mapped_category: String,
    #[serde(
        default = "default_confidence",
        deserialize_with = "confidence_or_default"
    )]
    pub confidence: f64,
    pub reasoning: String,
}

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

// null は省略と同じ扱い
fn confidence_or_default<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(DEFAULT_CONFIDENCE))
}

/// 応答テキストをコードフェンス除去・スキーマ検証のうえ構造体に変換する。
///
/// # Errors
/// JSONとして解釈できない場合、必須フィールドが欠けている場合は [`ModelResponseError`] を返す。
pub fn parse_model_output(content: &str) -> Result<ModelVerdict, ModelResponseError> {
    let body = strip_code_fence(content);
    if body.is_empty() {
        return Err(ModelResponseError::Empty);
    }

    let value: Value = serde_json::from_str(body)?;
    let validation = validate_json(&MODEL_OUTPUT_SCHEMA, &value);
    if !validation.valid {
        return Err(ModelResponseError::SchemaViolation(validation.errors));
    }

    let mut verdict: ModelVerdict = serde_json::from_value(value)?;
    if !(0.0..=1.0).contains(&verdict.confidence) {
        debug!(
            confidence = verdict.confidence,
            "clamping out-of-range model confidence"
        );
        verdict.confidence = verdict.confidence.clamp(0.0, 1.0);
    }
    Ok(verdict)
}

/// 前後のMarkdownコードフェンスと言語タグを取り除く。
///
/// フェンスがなければ前後の空白のみ除去する。
pub(crate) fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(open) = trimmed.find(CODE_FENCE) else {
        return trimmed;
    };

    let after_open = &trimmed[open + CODE_FENCE.len()..];
    let inner = after_open
        .find(CODE_FENCE)
        .map_or(after_open, |close| &after_open[..close]);

    // 開始フェンス直後の言語タグ（```json 等）
    let inner = match inner.find('\n') {
        Some(newline) if is_language_tag(&inner[..newline]) => &inner[newline + 1..],
        _ => inner
            .trim_start()
            .strip_prefix("json")
            .filter(|rest| rest.trim_start().starts_with('{'))
            .unwrap_or(inner),
    };
    inner.trim()
}

fn is_language_tag(line: &str) -> bool {
    let tag = line.trim();
    !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
