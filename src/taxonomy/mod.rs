//! ジャンルタクソノミー（Category → Genre → Sub-genre）の読み込みと索引。
pub mod keywords;

use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

pub use keywords::{KeywordCoverage, KeywordSignals};

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("failed to read taxonomy file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("taxonomy is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid taxonomy format: {0}")]
    InvalidShape(String),
}

/// ジャンルとその配下のサブジャンル（定義順）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreEntry {
    pub name: String,
    pub subgenres: Vec<String>,
}

/// 最上位カテゴリ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryEntry {
    pub name: String,
    pub genres: Vec<GenreEntry>,
}

/// 読み込み後は不変のタクソノミー。
#[derive(Debug, Clone)]
pub struct Taxonomy {
    categories: Vec<CategoryEntry>,
    valid_categories: HashSet<String>,
}

impl Taxonomy {
    /// JSONファイルからタクソノミーを読み込む。
    ///
    /// # Errors
    /// ファイルが読めない場合、JSONとして不正な場合、構造が想定と異なる場合は [`TaxonomyError`] を返す。
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TaxonomyError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| TaxonomyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let taxonomy = Self::from_json_str(&raw)?;
        info!(
            path = %path.display(),
            categories = taxonomy.categories.len(),
            valid_categories = taxonomy.valid_categories.len(),
            "taxonomy loaded"
        );
        Ok(taxonomy)
    }

    /// # Errors
    /// JSONとして不正な場合、または構造が想定と異なる場合はエラーを返す。
    pub fn from_json_str(raw: &str) -> Result<Self, TaxonomyError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(&value)
    }

    /// ネストしたJSONマッピングからタクソノミーを構築する。
    ///
    /// # Errors
    /// ジャンルの値が配列でない、サブジャンルが文字列でない等の場合は
    /// [`TaxonomyError::InvalidShape`] を返す。
    pub fn from_value(value: &Value) -> Result<Self, TaxonomyError> {
        let root = value.as_object().ok_or_else(|| {
            TaxonomyError::InvalidShape("expected a mapping of categories at the root".to_string())
        })?;

        let mut categories = Vec::with_capacity(root.len());
        for (category, genres) in root {
            let genres = genres.as_object().ok_or_else(|| {
                TaxonomyError::InvalidShape(format!(
                    "expected a mapping of genres under category '{category}'"
                ))
            })?;

            let mut genre_entries = Vec::with_capacity(genres.len());
            for (genre, subgenres) in genres {
                let list = subgenres.as_array().ok_or_else(|| {
                    TaxonomyError::InvalidShape(format!(
                        "expected list of subgenres for genre '{genre}'"
                    ))
                })?;
                let subgenres = list
                    .iter()
                    .map(|item| {
                        item.as_str().map(str::to_string).ok_or_else(|| {
                            TaxonomyError::InvalidShape(format!(
                                "subgenre under genre '{genre}' must be a string"
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                genre_entries.push(GenreEntry {
                    name: genre.clone(),
                    subgenres,
                });
            }

            categories.push(CategoryEntry {
                name: category.clone(),
                genres: genre_entries,
            });
        }

        Ok(Self::from_categories(categories))
    }

    /// 構築済みのカテゴリ列から検証用集合を作る。
    #[must_use]
    pub fn from_categories(categories: Vec<CategoryEntry>) -> Self {
        let mut taxonomy = Self {
            categories,
            valid_categories: HashSet::new(),
        };
        taxonomy.valid_categories = taxonomy.build_valid_category_set();
        taxonomy
    }

    fn build_valid_category_set(&self) -> HashSet<String> {
        let mut valid = HashSet::new();
        for (genre, subgenre) in self.subgenres() {
            let label = category_label(genre, subgenre);
            if !valid.insert(label.clone()) {
                warn!(category = %label, "duplicate Genre/Sub-genre pair in taxonomy");
            }
        }
        valid
    }

    /// 全ての (genre, subgenre) ペアを定義順に列挙する。
    pub fn subgenres(&self) -> impl Iterator<Item = (&str, &str)> {
        self.categories.iter().flat_map(|category| {
            category.genres.iter().flat_map(|genre| {
                genre
                    .subgenres
                    .iter()
                    .map(move |subgenre| (genre.name.as_str(), subgenre.as_str()))
            })
        })
    }

    #[must_use]
    pub fn valid_categories(&self) -> &HashSet<String> {
        &self.valid_categories
    }

    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.valid_categories.contains(label)
    }

    #[must_use]
    pub fn has_subgenre(&self, name: &str) -> bool {
        self.subgenres().any(|(_, subgenre)| subgenre == name)
    }
}

/// "Genre/Sub-genre" 形式のラベルを組み立てる。
#[must_use]
pub fn category_label(genre: &str, subgenre: &str) -> String {
    format!("{genre}/{subgenre}")
}
