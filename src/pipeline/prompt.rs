//! 候補限定の分類プロンプト生成。副作用のない文字列整形のみを行う。
use serde_json::Value;

use crate::model::UNMAPPED;

/// 分類プロンプトを組み立てる。
///
/// 候補リストを唯一の回答集合として埋め込み、該当なしの場合はセンチネルを返すよう指示する。
#[must_use]
pub fn build_prompt(candidates: &[String], user_tags: &Value, story_snippet: &str) -> String {
    let allowed = render_candidates(candidates);
    let tags = render_user_tags(user_tags);

    format!(
        r#"
You are assisting a taxonomy classification system.

ALLOWED SUB-GENRES (STRICT):
{allowed}

RULES:
1. Choose ONLY from the list above.
2. If none apply, respond with "{UNMAPPED}".
3. Story context overrides user tags.
4. Do NOT invent category names.

User Tags: {tags}
Story Snippet: "{story_snippet}"

Respond ONLY in valid JSON with exactly these fields:
{{
  "mapped_category": "Genre/Sub-genre or {UNMAPPED}",
  "confidence": 0.95,
  "reasoning": "Brief justification based on story context"
}}
"#
    )
}

fn render_candidates(candidates: &[String]) -> String {
    serde_json::to_string(candidates).unwrap_or_else(|_| format!("{candidates:?}"))
}

/// タグは構造を問わないため、文字列はそのまま、それ以外はJSONとして埋め込む。
fn render_user_tags(user_tags: &Value) -> String {
    match user_tags {
        Value::String(tag) => tag.clone(),
        Value::Null => "[]".to_string(),
        other => other.to_string(),
    }
}
