//! 分類ケースと分類結果のデータモデル。
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// どのサブジャンルにも該当しないことを示すセンチネル。
pub const UNMAPPED: &str = "[UNMAPPED]";

/// 結果ログに残すマッチパターンの上限。
pub const MAX_MATCHED_PATTERNS: usize = 5;

/// テストケースの識別子。数値・文字列のどちらも受け付ける。
///
/// 読み取れない場合は `Missing`（ログ上は `null`）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CaseId {
    Number(i64),
    Text(String),
    Missing,
}

impl CaseId {
    /// 生レコードの `id` を可能な範囲で読む。
    #[must_use]
    pub fn from_record(record: &Value) -> Self {
        record
            .get("id")
            .and_then(|id| Self::deserialize(id).ok())
            .unwrap_or(Self::Missing)
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Missing => f.write_str("null"),
        }
    }
}

/// 1件の分類リクエスト。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassificationCase {
    pub id: CaseId,
    /// ユーザーが付与したタグ。構造は任意。
    #[serde(default)]
    pub user_tags: Value,
    pub story_snippet: String,
    #[serde(default)]
    pub expected_logic: Option<String>,
}

impl ClassificationCase {
    /// バッチファイルの1レコードを変換する。
    ///
    /// # Errors
    /// 必須フィールドの欠落や型違いの場合は [`serde_json::Error`] を返す。
    pub fn from_record(record: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(record)
    }
}

/// パイプラインの出力。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub mapped_category: String,
    pub confidence: f64,
    pub reasoning: String,
    /// モデルの回答が棄却されセンチネルに置き換えられた場合に true。
    pub validated: bool,
    pub matched_patterns: Vec<String>,
}

impl ClassificationResult {
    /// 候補が一つも抽出できなかったケースの結果。
    #[must_use]
    pub fn no_signal() -> Self {
        Self {
            mapped_category: UNMAPPED.to_string(),
            confidence: 0.99,
            reasoning: "No deterministic semantic signals matched taxonomy.".to_string(),
            validated: false,
            matched_patterns: Vec::new(),
        }
    }

    /// パイプラインがエラーを返したケースの縮退結果。
    #[must_use]
    pub fn system_error(error: &dyn fmt::Display) -> Self {
        Self {
            mapped_category: UNMAPPED.to_string(),
            confidence: 0.0,
            reasoning: format!("System error: {error}"),
            validated: false,
            matched_patterns: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_unmapped(&self) -> bool {
        self.mapped_category == UNMAPPED
    }
}

/// 結果ログ（reasoning_log.json）の1レコード。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub test_case_id: CaseId,
    pub mapped_category: String,
    pub confidence: f64,
    pub validated: bool,
    pub reasoning: String,
    pub expected_logic: String,
    /// レポート表示用。ログには出力しない。
    #[serde(skip)]
    pub user_tags: Value,
}

impl ResultRecord {
    #[must_use]
    pub fn new(case: &ClassificationCase, result: ClassificationResult) -> Self {
        Self {
            test_case_id: case.id.clone(),
            mapped_category: result.mapped_category,
            confidence: result.confidence,
            validated: result.validated,
            reasoning: result.reasoning,
            expected_logic: case.expected_logic.clone().unwrap_or_default(),
            user_tags: case.user_tags.clone(),
        }
    }

    /// ケースとして解釈できなかったレコードの結果。読み取れるフィールドだけを引き継ぐ。
    #[must_use]
    pub fn unreadable(record: &Value, result: ClassificationResult) -> Self {
        Self {
            test_case_id: CaseId::from_record(record),
            mapped_category: result.mapped_category,
            confidence: result.confidence,
            validated: result.validated,
            reasoning: result.reasoning,
            expected_logic: record
                .get("expected_logic")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            user_tags: record.get("user_tags").cloned().unwrap_or(Value::Null),
        }
    }

    #[must_use]
    pub fn is_unmapped(&self) -> bool {
        self.mapped_category == UNMAPPED
    }
}
