//! 幻覚防止の検証レイヤー。
//!
//! モデルが返したカテゴリはタクソノミーの完全一致メンバーかセンチネルのときだけ通し、
//! それ以外はセンチネルに差し替える。パイプラインから出る全ての応答はここを通る。
use std::sync::Arc;

use tracing::warn;

use crate::model::UNMAPPED;
use crate::taxonomy::Taxonomy;

use super::metrics::MappingMetrics;

#[derive(Debug, Clone)]
pub struct CategoryValidator {
    taxonomy: Arc<Taxonomy>,
}

impl CategoryValidator {
    #[must_use]
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self { taxonomy }
    }

    /// `(最終カテゴリ, 差し替えたか)` を返す。差し替え時は幻覚カウンタを加算する。
    pub fn validate(&self, mapped_category: &str, metrics: &mut MappingMetrics) -> (String, bool) {
        if mapped_category == UNMAPPED || self.taxonomy.contains(mapped_category) {
            return (mapped_category.to_string(), false);
        }

        metrics.record_hallucination();
        warn!(
            rejected = %mapped_category,
            "model returned a category outside the taxonomy; forcing unmapped"
        );
        (UNMAPPED.to_string(), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::tests::sample_taxonomy;
    use rstest::rstest;

    fn validator() -> CategoryValidator {
        CategoryValidator::new(Arc::new(sample_taxonomy()))
    }

    #[test]
    fn every_taxonomy_member_passes_through() {
        let validator = validator();
        let mut metrics = MappingMetrics::new();
        let members: Vec<String> = validator.taxonomy.valid_categories().iter().cloned().collect();

        for member in members {
            assert_eq!(
                validator.validate(&member, &mut metrics),
                (member.clone(), false)
            );
        }
        assert_eq!(metrics.hallucinations_caught, 0);
    }

    #[test]
    fn sentinel_passes_through() {
        let mut metrics = MappingMetrics::new();
        assert_eq!(
            validator().validate(UNMAPPED, &mut metrics),
            (UNMAPPED.to_string(), false)
        );
        assert_eq!(metrics.hallucinations_caught, 0);
    }

    #[rstest]
    #[case("Thriller/SuperSpy")]
    #[case("thriller/espionage")]
    #[case("Espionage")]
    #[case(" Thriller/Espionage")]
    #[case("")]
    fn non_members_are_forced_to_sentinel(#[case] raw: &str) {
        let validator = validator();
        let mut metrics = MappingMetrics::new();

        assert_eq!(
            validator.validate(raw, &mut metrics),
            (UNMAPPED.to_string(), true)
        );
        assert_eq!(metrics.hallucinations_caught, 1);

        validator.validate(raw, &mut metrics);
        assert_eq!(metrics.hallucinations_caught, 2);
    }
}
