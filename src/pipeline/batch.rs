//! テストケースの逐次バッチ実行。
use std::time::Duration;

use serde_json::Value;
use tracing::{error, info};

use crate::model::{CaseId, ClassificationCase, ClassificationResult, ResultRecord};

use super::mapper::{ClassifyError, TaxonomyMapper};
use super::metrics::MappingMetrics;

/// ケースを1件ずつ処理し、ケース間に固定の待ち時間を挟む。
///
/// 待ち時間はレート制限への配慮で、バックプレッシャーではない。
pub struct BatchRunner<'a> {
    mapper: &'a TaxonomyMapper,
    call_delay: Duration,
}

impl<'a> BatchRunner<'a> {
    #[must_use]
    pub fn new(mapper: &'a TaxonomyMapper, call_delay: Duration) -> Self {
        Self { mapper, call_delay }
    }

    /// 全レコードを処理する。
    ///
    /// ケースへの変換失敗も含め、ケース単位のエラーは縮退結果に変換し、バッチは継続する。
    pub async fn run(&self, cases: &[Value], metrics: &mut MappingMetrics) -> Vec<ResultRecord> {
        let mut records = Vec::with_capacity(cases.len());

        for (index, raw) in cases.iter().enumerate() {
            if index > 0 && !self.call_delay.is_zero() {
                tokio::time::sleep(self.call_delay).await;
            }

            let record = match ClassificationCase::from_record(raw) {
                Ok(case) => {
                    let result = match self.mapper.classify(&case, metrics).await {
                        Ok(result) => result,
                        Err(err) => {
                            error!(case_id = %case.id, error = %err, "case classification failed");
                            ClassificationResult::system_error(&err)
                        }
                    };
                    ResultRecord::new(&case, result)
                }
                Err(source) => {
                    let err = ClassifyError::InvalidCase(source);
                    error!(
                        case_id = %CaseId::from_record(raw),
                        error = %err,
                        "case record could not be read"
                    );
                    ResultRecord::unreadable(raw, ClassificationResult::system_error(&err))
                }
            };
            records.push(record);
        }

        info!(
            cases = records.len(),
            llm_calls = metrics.llm_call_count,
            hallucinations_caught = metrics.hallucinations_caught,
            "batch finished"
        );
        records
    }
}
