pub mod config;
pub mod decode;
pub mod error;
pub mod extractor;
pub mod prompts;
pub mod risk;
pub mod schema;
pub mod sink;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::{DecodeError, ExtractError, PersistError, ProjectionError, SchemaError};
pub use extractor::{
    backfill_labels, ExtractOptions, Extraction, GraphExtractor, OutputOptions, RiskOptions,
    DEFAULT_MODEL, DEFAULT_OUTPUT_PATH,
};
pub use risk::{ProjectionParams, RiskCoverageProjector};
pub use sink::{DocumentSink, JsonFileSink};
