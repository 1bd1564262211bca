//! キーワードシグナルによる決定的な候補抽出。
//!
//! 語境界は見ず、小文字化した本文に対する部分文字列一致で判定する。
//! 結果は候補集合を広げるだけで、最終判定には使わない。
use std::collections::HashSet;

use aho_corasick::{AhoCorasick, BuildError};

use crate::taxonomy::{KeywordSignals, Taxonomy, category_label};

/// 抽出結果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    /// 重複なしの "Genre/Sub-genre" 候補（タクソノミー定義順）。
    pub candidates: Vec<String>,
    /// マッチしたトリガー語（発見順、サブジャンル間の重複あり）。
    pub matched_patterns: Vec<String>,
}

impl CandidateSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[derive(Debug)]
struct SubgenreTarget {
    label: String,
    pattern_ids: Vec<usize>,
}

/// タクソノミーに存在するサブジャンルだけを対象にしたキーワード照合器。
#[derive(Debug)]
pub struct CandidateExtractor {
    matcher: AhoCorasick,
    patterns: Vec<String>,
    targets: Vec<SubgenreTarget>,
}

impl CandidateExtractor {
    /// # Errors
    /// Aho-Corasick オートマトンの構築に失敗した場合はエラーを返す。
    pub fn new(taxonomy: &Taxonomy, signals: &KeywordSignals) -> Result<Self, BuildError> {
        let mut patterns: Vec<String> = Vec::new();
        let mut targets = Vec::new();
        let mut seen_labels = HashSet::new();

        for (genre, subgenre) in taxonomy.subgenres() {
            let keywords = signals.keywords_for(subgenre);
            if keywords.is_empty() {
                continue;
            }
            let label = category_label(genre, subgenre);
            if !seen_labels.insert(label.clone()) {
                continue;
            }

            let pattern_ids = keywords
                .iter()
                .map(|keyword| {
                    patterns
                        .iter()
                        .position(|existing| existing == keyword)
                        .unwrap_or_else(|| {
                            patterns.push(keyword.clone());
                            patterns.len() - 1
                        })
                })
                .collect();
            targets.push(SubgenreTarget { label, pattern_ids });
        }

        let matcher = AhoCorasick::new(&patterns)?;

        Ok(Self {
            matcher,
            patterns,
            targets,
        })
    }

    /// 本文から候補サブジャンルとマッチ語を抽出する。
    #[must_use]
    pub fn extract(&self, text: &str) -> CandidateSet {
        let lowered = text.to_lowercase();

        // 重なり検索: "years later" と "years" のような包含関係も両方拾う
        let mut hit = vec![false; self.patterns.len()];
        for found in self.matcher.find_overlapping_iter(&lowered) {
            hit[found.pattern().as_usize()] = true;
        }

        let mut result = CandidateSet::default();
        for target in &self.targets {
            let mut matched = target
                .pattern_ids
                .iter()
                .filter(|id| hit[**id])
                .map(|id| self.patterns[*id].clone())
                .peekable();
            if matched.peek().is_none() {
                continue;
            }
            result.matched_patterns.extend(matched);
            result.candidates.push(target.label.clone());
        }
        result
    }
}
