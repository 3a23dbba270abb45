pub mod classifier;
pub mod counter;
pub mod error;
pub mod etl;
pub mod extractor;
pub mod groups;
pub mod normalizers;
pub mod pipeline;
pub mod processor;
pub mod writer;

pub use crate::domain::model::{
    GroupKey, OutputGroup, ParsedRecord, RawRecord, ResponseType, SkippedRecord, TransformResult,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
