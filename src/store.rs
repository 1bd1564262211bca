//! テストケースファイルの読み込みと結果ログの書き出し。
use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::model::ResultRecord;

#[derive(Debug, Error)]
pub enum CaseFileError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// テストケース（JSON配列）を読み込む。
///
/// 各要素は生のまま返し、ケースへの変換はバッチ側でケース単位に行う。
///
/// # Errors
/// ファイルが読めない、またはJSON配列として解釈できない場合は [`CaseFileError`] を返す。
pub async fn load_cases(path: impl AsRef<Path>) -> Result<Vec<Value>, CaseFileError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CaseFileError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let cases: Vec<Value> =
        serde_json::from_str(&raw).map_err(|source| CaseFileError::Json {
            path: path.display().to_string(),
            source,
        })?;
    info!(path = %path.display(), cases = cases.len(), "test cases loaded");
    Ok(cases)
}

/// 結果ログを整形済みJSON配列として書き出す。
///
/// # Errors
/// シリアライズまたは書き込みに失敗した場合は [`CaseFileError`] を返す。
pub async fn save_results(
    path: impl AsRef<Path>,
    records: &[ResultRecord],
) -> Result<(), CaseFileError> {
    let path = path.as_ref();
    let body = serde_json::to_string_pretty(records).map_err(|source| CaseFileError::Json {
        path: path.display().to_string(),
        source,
    })?;
    tokio::fs::write(path, body)
        .await
        .map_err(|source| CaseFileError::Io {
            path: path.display().to_string(),
            source,
        })?;
    info!(path = %path.display(), records = records.len(), "reasoning log written");
    Ok(())
}
