//! サブジャンル別のトリガーキーワード表。
//!
//! 手作業でメンテナンスされる静的な表で、タクソノミーからは導出しない。
//! タクソノミーに存在しないサブジャンルのエントリは参照されない。
use std::collections::HashMap;

use tracing::warn;

use super::Taxonomy;

#[derive(Debug, Clone, Default)]
pub struct KeywordSignals {
    keywords: HashMap<String, Vec<String>>,
}

/// キーワード表とタクソノミーの突き合わせ結果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordCoverage {
    /// キーワードが一つもなく、決定的マッチングでは到達できないサブジャンル。
    pub unreachable: Vec<String>,
    /// タクソノミーに存在しないサブジャンルのエントリ。
    pub inert: Vec<String>,
}

impl KeywordCoverage {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unreachable.is_empty() && self.inert.is_empty()
    }
}

impl KeywordSignals {
    /// デフォルトのキーワード表を構築する。
    #[must_use]
    pub fn default_signals() -> Self {
        Self::from_entries([
            (
                "Enemies-to-Lovers",
                &["enemy", "enemies", "rival", "hate", "tension"][..],
            ),
            ("Slow-burn", &["slow", "gradual", "years", "patience"][..]),
            (
                "Second Chance",
                &["again", "reunite", "years later", "return", "ex-"][..],
            ),
            (
                "Espionage",
                &["spy", "agent", "intelligence", "covert", "cia", "mi6"][..],
            ),
            (
                "Psychological",
                &["mind", "obsession", "paranoia", "sanity"][..],
            ),
            (
                "Legal Thriller",
                &["lawyer", "court", "trial", "judge", "verdict"][..],
            ),
            (
                "Hard Sci-Fi",
                &["physics", "quantum", "engineering", "stasis"][..],
            ),
            (
                "Space Opera",
                &["galaxy", "empire", "fleet", "interstellar"][..],
            ),
            (
                "Cyberpunk",
                &["cyber", "neon", "hacker", "dystopia", "ai"][..],
            ),
            (
                "Psychological Horror",
                &["terror", "madness", "fear", "nightmare"][..],
            ),
            (
                "Gothic",
                &["mansion", "haunted", "fog", "castle", "shadows"][..],
            ),
            (
                "Slasher",
                &["killer", "murder", "blood", "stalks", "masked"][..],
            ),
        ])
    }

    /// 任意のエントリから表を構築する。キーワードは小文字に正規化され、
    /// 同一サブジャンル内の重複は除かれる。
    pub fn from_entries<'a, I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, K)>,
        K: IntoIterator<Item = &'a &'a str>,
    {
        let mut keywords: HashMap<String, Vec<String>> = HashMap::new();
        for (subgenre, words) in entries {
            let slot = keywords.entry(subgenre.to_string()).or_default();
            for word in words {
                let normalized = word.trim().to_lowercase();
                if !normalized.is_empty() && !slot.contains(&normalized) {
                    slot.push(normalized);
                }
            }
        }
        Self { keywords }
    }

    /// サブジャンルに紐づくキーワードを定義順で返す。
    #[must_use]
    pub fn keywords_for(&self, subgenre: &str) -> &[String] {
        self.keywords.get(subgenre).map_or(&[], Vec::as_slice)
    }

    pub fn subgenres(&self) -> impl Iterator<Item = &str> {
        self.keywords.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// タクソノミーとの被覆状況を調べる。
    #[must_use]
    pub fn coverage(&self, taxonomy: &Taxonomy) -> KeywordCoverage {
        let mut unreachable: Vec<String> = taxonomy
            .subgenres()
            .filter(|(_, subgenre)| self.keywords_for(subgenre).is_empty())
            .map(|(genre, subgenre)| super::category_label(genre, subgenre))
            .collect();
        unreachable.dedup();

        let mut inert: Vec<String> = self
            .subgenres()
            .filter(|subgenre| !taxonomy.has_subgenre(subgenre))
            .map(str::to_string)
            .collect();
        inert.sort();

        KeywordCoverage { unreachable, inert }
    }

    /// 被覆の欠落を警告ログに出す。修正はしない。
    pub fn warn_on_coverage_gaps(&self, taxonomy: &Taxonomy) -> KeywordCoverage {
        let coverage = self.coverage(taxonomy);
        if !coverage.unreachable.is_empty() {
            warn!(
                subgenres = ?coverage.unreachable,
                "taxonomy subgenres have no keyword signals and can never become candidates"
            );
        }
        if !coverage.inert.is_empty() {
            warn!(
                subgenres = ?coverage.inert,
                "keyword signals reference subgenres absent from the taxonomy"
            );
        }
        coverage
    }
}
