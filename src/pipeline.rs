pub mod batch;
pub mod candidates;
pub mod mapper;
pub mod metrics;
pub mod prompt;
pub mod validator;

pub use crate::schema::model_output::{ModelResponseError, ModelVerdict, parse_model_output};
pub use batch::BatchRunner;
pub use candidates::{CandidateExtractor, CandidateSet};
pub use mapper::{ClassifyError, TaxonomyMapper};
pub use metrics::MappingMetrics;
pub use validator::CategoryValidator;
