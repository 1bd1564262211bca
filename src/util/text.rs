//! 文字数ベースの切り詰めユーティリティ。

/// エラーメッセージの最大長
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 500;

/// エラーメッセージを要約して切り詰める。
#[must_use]
pub fn truncate_error_message(msg: &str) -> String {
    let char_count = msg.chars().count();
    if char_count <= MAX_ERROR_MESSAGE_LENGTH {
        return msg.to_string();
    }
    let truncated: String = msg.chars().take(MAX_ERROR_MESSAGE_LENGTH).collect();
    format!("{truncated}... (truncated, {char_count} chars)")
}

/// `max_chars` 文字を超える場合は切り詰めて `...` を付ける。
#[must_use]
pub fn ellipsize(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{head}...")
}

/// 空白区切りの語数。トークン数の概算に使う。
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
