/// 認証情報をログ・Debug出力用に伏せ字にする。
#[must_use]
pub fn redact(input: &str) -> String {
    if input.chars().count() <= 4 {
        "****".to_string()
    } else {
        let head: String = input.chars().take(4).collect();
        format!("{head}***")
    }
}
