use crate::domain::model::{RawRecord, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn output_path(&self) -> &str;
    fn file_prefix(&self) -> &str;
    fn max_samples_per_record(&self) -> usize;
    fn max_units_per_sample(&self) -> usize;
    fn include_json(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<RawRecord>>;
    async fn transform(&self, data: Vec<RawRecord>) -> Result<TransformResult>;
    async fn load(&self, result: &TransformResult) -> Result<Vec<String>>;
}
