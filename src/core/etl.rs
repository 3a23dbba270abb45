use crate::core::Pipeline;
use crate::utils::error::Result;

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtlSummary {
    pub total_records: usize,
    pub written_records: usize,
    pub skipped_records: usize,
    pub output_files: Vec<String>,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<EtlSummary> {
        tracing::info!("Starting ETL process...");

        tracing::debug!("Extracting data...");
        let raw_data = self.pipeline.extract().await?;

        tracing::debug!("Transforming {} records...", raw_data.len());
        let transformed = self.pipeline.transform(raw_data).await?;

        tracing::debug!("Loading {} output groups...", transformed.groups.len());
        let output_files = self.pipeline.load(&transformed).await?;

        Ok(EtlSummary {
            total_records: transformed.total_records,
            written_records: transformed.written_records(),
            skipped_records: transformed.skipped.len(),
            output_files,
        })
    }
}
