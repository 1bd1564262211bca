use std::path::PathBuf;

use clap::Parser;

/// Story genre taxonomy mapper
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Taxonomy JSON (Category -> Genre -> [Sub-genre])
    #[arg(long, env = "TAXONOMY_PATH", default_value = "taxonomy.json")]
    pub taxonomy: PathBuf,

    /// Test case batch JSON
    #[arg(long, env = "TEST_CASES_PATH", default_value = "test_cases.json")]
    pub cases: PathBuf,

    /// Where to write the reasoning log
    #[arg(long, env = "REASONING_LOG_PATH", default_value = "reasoning_log.json")]
    pub output: PathBuf,
}
